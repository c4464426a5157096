//! Typing a variable from how it is used.
//!
//! `var xs = []; xs.push(1);` makes `xs` an `Array<Int>`. A local is
//! searched for in the statements after it in the same block, an untyped
//! parameter in the body of its function, and a field in the other
//! members of its class. The first use that gives a usable type wins.

use hx_parser::ast::expr::{BinaryExpr, BinaryOp, CallExpr, Expr, FieldAccess, IndexExpr, VarDecl};
use hx_parser::ast::item::{FieldDef, Param};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};
use rowan::Direction;

use super::evaluate;
use super::literals::is_open_array;
use super::typeref::builtin_type;
use crate::error::Fault;
use crate::generics::GenericResolver;
use crate::model::NodePtr;
use crate::resolve::{resolve, Target};
use crate::session::{GuardKey, Session, Typed};
use crate::ty::{Primitive, TypeRef};

/// Whether a type says too little to type a variable.
pub(crate) fn is_vague(s: &mut Session, ty: &TypeRef) -> bool {
    ty.is_unknown() || ty.is_null_constant() || is_open_array(s, ty)
}

/// A type for the variable declared by `decl` (a `VAR_DECL`, `PARAM` or
/// `FIELD_DEF`), read off its uses, or `None` when they say nothing.
pub(crate) fn type_from_usage(
    s: &mut Session,
    decl: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Option<Typed>, Fault> {
    if !s.config.usage_search {
        return Ok(None);
    }
    let Some(ptr) = s.ptr(decl) else {
        return Ok(None);
    };
    s.guarded(GuardKey::Usage(ptr), None, |s| scan(s, decl, ptr, generics))
}

/// The declared name and the nodes its uses may appear in.
fn search_area(decl: &SyntaxNode) -> Option<(String, Vec<SyntaxNode>)> {
    match decl.kind() {
        SyntaxKind::VAR_DECL => {
            let name = VarDecl::cast(decl.clone())?.name()?.text();
            Some((name, decl.siblings(Direction::Next).skip(1).collect()))
        }
        SyntaxKind::PARAM => {
            let name = Param::cast(decl.clone())?.name()?.text();
            let list = decl.parent()?;
            let function = list.parent()?;
            let body = function.children().filter(|c| c != &list).collect();
            Some((name, body))
        }
        SyntaxKind::FIELD_DEF => {
            let name = FieldDef::cast(decl.clone())?.name()?.text();
            let members = decl.parent()?.children().filter(|c| c != decl).collect();
            Some((name, members))
        }
        _ => None,
    }
}

/// Whether a resolved use denotes the variable declared at `ptr`.
fn denotes(s: &Session, target: Option<&Target>, ptr: NodePtr) -> bool {
    match target {
        Some(Target::Local(binding)) => binding.owner_ptr == ptr,
        Some(Target::Member(id)) => s.catalog.member(*id).is_some_and(|m| m.ptr == ptr),
        _ => false,
    }
}

/// The node a use stands at: `this.x` for a field named through `this`.
fn use_site(name_ref: &SyntaxNode) -> SyntaxNode {
    match name_ref.parent() {
        Some(access)
            if access.kind() == SyntaxKind::FIELD_ACCESS
                && !is_first_expr_child(name_ref, &access)
                && access.children().any(|c| c.kind() == SyntaxKind::THIS_EXPR) =>
        {
            access
        }
        _ => name_ref.clone(),
    }
}

fn scan(
    s: &mut Session,
    decl: &SyntaxNode,
    ptr: NodePtr,
    generics: &GenericResolver,
) -> Result<Option<Typed>, Fault> {
    let Some((name, area)) = search_area(decl) else {
        return Ok(None);
    };
    let uses: Vec<SyntaxNode> = area
        .iter()
        .flat_map(|node| node.descendants().collect::<Vec<_>>())
        .filter(|n| n.kind() == SyntaxKind::NAME_REF && n.text() == name.as_str())
        .collect();
    for name_ref in uses {
        s.step()?;
        let resolution = resolve(s, &name_ref, generics)?;
        if !denotes(s, resolution.targets.first(), ptr) {
            continue;
        }
        let Some(found) = use_type(s, &use_site(&name_ref), generics)? else {
            continue;
        };
        let ty = found.ty.without_constant();
        if is_vague(s, &ty) {
            continue;
        }
        log::trace!("`{name}` typed from a use as {ty}");
        return Ok(Some(found.map(|_| ty)));
    }
    Ok(None)
}

fn is_first_expr_child(node: &SyntaxNode, parent: &SyntaxNode) -> bool {
    parent
        .children()
        .find(|c| Expr::cast(c.clone()).is_some())
        .is_some_and(|c| &c == node)
}

fn assigned_value(node: &SyntaxNode) -> Option<Expr> {
    let parent = node.parent()?;
    let bin = BinaryExpr::cast(parent.clone())?;
    if bin.op() != Some(BinaryOp::Assign) || !is_first_expr_child(node, &parent) {
        return None;
    }
    bin.rhs()
}

/// What a single use says about the variable's type.
fn use_type(
    s: &mut Session,
    site: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Option<Typed>, Fault> {
    // `x = e`
    if let Some(value) = assigned_value(site) {
        return Ok(Some(evaluate(s, value.syntax(), generics)?));
    }
    let Some(parent) = site.parent() else {
        return Ok(None);
    };
    match parent.kind() {
        // `x.push(e)`, `x.set(k, v)`
        SyntaxKind::FIELD_ACCESS if is_first_expr_child(site, &parent) => {
            let Some(method) = FieldAccess::cast(parent.clone())
                .and_then(|fa| fa.field())
                .map(|f| f.text())
            else {
                return Ok(None);
            };
            let Some(call) = parent.parent().and_then(CallExpr::cast) else {
                return Ok(None);
            };
            let args = call.args();
            let arg = |i: usize| args.get(i).cloned();
            let (first, last) = (arg(0), args.last().cloned());
            match method.as_str() {
                "push" | "unshift" => collection(s, "Array", &[first], generics),
                "insert" => collection(s, "Array", &[last], generics),
                "set" => collection(s, "Map", &[first, arg(1)], generics),
                _ => Ok(None),
            }
        }
        // `x[i] = e`
        SyntaxKind::INDEX_EXPR if is_first_expr_child(site, &parent) => {
            let Some(value) = assigned_value(&parent) else {
                return Ok(None);
            };
            let Some(index) = IndexExpr::cast(parent.clone()).and_then(|ix| ix.index()) else {
                return Ok(None);
            };
            let key = evaluate(s, index.syntax(), generics)?;
            if matches!(key.ty, TypeRef::Primitive(Primitive::Int, _)) {
                collection(s, "Array", &[Some(value)], generics)
            } else {
                collection(s, "Map", &[Some(index), Some(value)], generics)
            }
        }
        _ => Ok(None),
    }
}

/// `Array<..>` or `Map<..>` over the types of `exprs`.
fn collection(
    s: &mut Session,
    class: &'static str,
    exprs: &[Option<Expr>],
    generics: &GenericResolver,
) -> Result<Option<Typed>, Fault> {
    let mut typed = Typed::unknown();
    let mut args = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let Some(expr) = expr else {
            return Ok(None);
        };
        let t = evaluate(s, expr.syntax(), generics)?;
        typed.absorb(&t);
        args.push(t.ty.without_constant());
    }
    typed.ty = builtin_type(s, class, args);
    Ok(Some(typed))
}
