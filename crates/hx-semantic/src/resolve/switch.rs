//! Names inside `case` patterns.
//!
//! A pattern is an expression read in reverse: `A(x)` matches the
//! constructor `A` and binds `x`. Which names are constructors and which are
//! captures depends on the type being matched, threaded down from the
//! switch subject through constructor arguments, array elements, structure
//! fields and extractors.

use hx_parser::ast::expr::{BinaryExpr, BinaryOp, SwitchExpr};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::{call_of_callee, starts_uppercase, Ctx, LocalBinding, LocalKind, Resolution, Target};
use crate::error::Fault;
use crate::eval::members::{enum_member, member_type};
use crate::eval::patterns::pattern_expected;
use crate::eval::evaluate;
use crate::generics::{unwrap_null, GenericResolver};
use crate::model::MemberKind;
use crate::session::Session;
use crate::ty::TypeRef;

pub(crate) fn binary_op(node: &SyntaxNode) -> Option<BinaryOp> {
    BinaryExpr::cast(node.clone()).and_then(|b| b.op())
}

pub(crate) fn is_first_expr_child(node: &SyntaxNode, parent: &SyntaxNode) -> bool {
    parent
        .children()
        .find(|c| hx_parser::ast::expr::Expr::cast(c.clone()).is_some())
        .is_some_and(|first| &first == node)
}

/// The `SWITCH_CASE` whose pattern list `node` sits in, following only
/// the positions a pattern can be nested through.
pub(crate) fn pattern_root(node: &SyntaxNode) -> Option<SyntaxNode> {
    let mut current = node.clone();
    loop {
        let parent = current.parent()?;
        match parent.kind() {
            SyntaxKind::SWITCH_CASE => return Some(parent),
            SyntaxKind::PAREN_EXPR | SyntaxKind::ARRAY_LITERAL | SyntaxKind::OBJECT_FIELD => {}
            SyntaxKind::OBJECT_LITERAL => {}
            SyntaxKind::BINARY_EXPR => match binary_op(&parent)? {
                BinaryOp::BitOr | BinaryOp::Assign => {}
                // Only the right side of an extractor is a pattern.
                BinaryOp::Extractor if !is_first_expr_child(&current, &parent) => {}
                _ => return None,
            },
            SyntaxKind::ARG_LIST => {
                let call = parent.parent()?;
                if call.kind() != SyntaxKind::CALL_EXPR {
                    return None;
                }
                current = call;
                continue;
            }
            _ => return None,
        }
        current = parent;
    }
}

/// The case a node belongs to when it sits anywhere inside a pattern,
/// extractor left-hand sides included.
pub(crate) fn enclosing_pattern_case(node: &SyntaxNode) -> Option<SyntaxNode> {
    let mut child = node.clone();
    for ancestor in node.ancestors().skip(1) {
        match ancestor.kind() {
            SyntaxKind::SWITCH_CASE => {
                return hx_parser::ast::expr::Expr::cast(child).map(|_| ancestor);
            }
            k if k.is_function_like() || k == SyntaxKind::BLOCK => return None,
            _ => {}
        }
        child = ancestor;
    }
    None
}

/// The extractor `f(_) => p` whose left-hand side contains `node`.
pub(crate) fn extractor_of_lhs(node: &SyntaxNode) -> Option<SyntaxNode> {
    let mut child = node.clone();
    for ancestor in node.ancestors().skip(1) {
        if ancestor.kind() == SyntaxKind::SWITCH_CASE {
            return None;
        }
        if binary_op(&ancestor) == Some(BinaryOp::Extractor)
            && is_first_expr_child(&child, &ancestor)
            && pattern_root(&ancestor).is_some()
        {
            return Some(ancestor);
        }
        child = ancestor;
    }
    None
}

/// Whether a `NAME_REF` in a pattern binds a variable: it stands where a
/// value is matched (not as a constructor callee or a qualifier) and is
/// not written like a type or constructor.
pub(crate) fn is_capture(node: &SyntaxNode) -> bool {
    if node.kind() != SyntaxKind::NAME_REF || pattern_root(node).is_none() {
        return false;
    }
    let text = node.text().to_string();
    text != "_" && !starts_uppercase(&text)
}

/// Capture names bound by a case, in source order.
pub(crate) fn case_captures(case: &SyntaxNode) -> Vec<SyntaxNode> {
    case.children()
        .filter(|c| hx_parser::ast::expr::Expr::cast(c.clone()).is_some())
        .flat_map(|pattern| pattern.descendants().collect::<Vec<_>>())
        .filter(|n| is_capture(n) && pattern_root(n).as_ref() == Some(case))
        .collect()
}

/// The switch subject type for a case.
pub(crate) fn subject_type(
    s: &mut Session,
    case: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<(TypeRef, bool), Fault> {
    let Some(subject) = case
        .parent()
        .and_then(SwitchExpr::cast)
        .and_then(|sw| sw.subject())
    else {
        return Ok((TypeRef::Unknown, true));
    };
    let typed = evaluate(s, subject.syntax(), generics)?;
    Ok((unwrap_null(s, &typed.ty), typed.cacheable))
}

// ── Strategies ───────────────────────────────────────────────────────────

/// Constructors named by a pattern, then captures.
pub(crate) fn switch_case_pattern(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if ctx.node.kind() != SyntaxKind::NAME_REF || extractor_of_lhs(ctx.node).is_some() {
        return Ok(None);
    }
    let position = call_of_callee(ctx.node).unwrap_or_else(|| ctx.node.clone());
    if pattern_root(&position).is_none() {
        return Ok(None);
    }
    if ctx.name == "_" {
        return Ok(Some(Resolution::empty()));
    }
    if let Some(expected) = pattern_expected(s, &position, ctx.generics)? {
        if let Some(member) = enum_member(s, &expected, &ctx.name) {
            return Ok(Some(Resolution::one(Target::Member(member))));
        }
    }
    if is_capture(ctx.node) {
        let Some(ptr) = s.ptr(ctx.node) else {
            return Ok(Some(Resolution::empty()));
        };
        return Ok(Some(Resolution::one(Target::Local(LocalBinding {
            kind: LocalKind::PatternCapture,
            name: ctx.name.clone(),
            name_ptr: ptr,
            owner_ptr: ptr,
        }))));
    }
    Ok(None)
}

/// `_` on the left of an extractor stands for the matched value.
pub(crate) fn capture_in_extractor(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if ctx.name != "_" {
        return Ok(None);
    }
    let Some(extractor) = extractor_of_lhs(ctx.node) else {
        return Ok(None);
    };
    let (Some(name_ptr), Some(owner_ptr)) = (s.ptr(ctx.node), s.ptr(&extractor)) else {
        return Ok(Some(Resolution::empty()));
    };
    Ok(Some(Resolution::one(Target::Local(LocalBinding {
        kind: LocalKind::PatternCapture,
        name: ctx.name.clone(),
        name_ptr,
        owner_ptr,
    }))))
}

/// Any name inside a pattern that is a constructor of the subject's enum.
pub(crate) fn switch_on_enum_member(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    let Some(case) = enclosing_pattern_case(ctx.node) else {
        return Ok(None);
    };
    let (subject, _) = subject_type(s, &case, ctx.generics)?;
    Ok(enum_member(s, &subject, &ctx.name).map(|m| Resolution::one(Target::Member(m))))
}

/// A constructor of an enum that appears as an argument type of the
/// subject's constructors: `Inner` in `case Outer(Inner(x))`.
pub(crate) fn enum_argument_extractor(
    s: &mut Session,
    ctx: &Ctx,
) -> Result<Option<Resolution>, Fault> {
    if call_of_callee(ctx.node).is_none() {
        return Ok(None);
    }
    let Some(case) = enclosing_pattern_case(ctx.node) else {
        return Ok(None);
    };
    let (subject, _) = subject_type(s, &case, ctx.generics)?;
    let Some(ct) = subject.as_class().cloned().or_else(|| subject.enum_class().cloned()) else {
        return Ok(None);
    };
    let catalog = s.catalog;
    let generics = GenericResolver::for_class(catalog, &ct);
    for ctor in catalog.members_of(ct.decl) {
        if ctor.kind != MemberKind::EnumCtor || ctor.params.is_empty() {
            continue;
        }
        let TypeRef::Function(f) = member_type(s, ctor.id, &generics)?.ty else {
            continue;
        };
        for arg in &f.args {
            let arg_ty = unwrap_null(s, &arg.ty);
            if let Some(member) = enum_member(s, &arg_ty, &ctx.name) {
                return Ok(Some(Resolution::one(Target::Member(member))));
            }
        }
    }
    Ok(None)
}
