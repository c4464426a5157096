//! The type a `case` pattern position matches against.

use hx_parser::ast::expr::{BinaryOp, Expr, ObjectField, SwitchExpr};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::evaluate;
use super::members::{enum_member, find_member, member_type};
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::resolve::switch::{binary_op, is_first_expr_child, subject_type};
use crate::session::Session;
use crate::ty::TypeRef;

/// What the value at pattern position `node` has to be: the subject for a
/// whole pattern, a constructor's argument type inside `A(...)`, the
/// element type inside `[...]`, a field type inside `{...}`.
pub fn pattern_expected(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Option<TypeRef>, Fault> {
    s.step()?;
    let Some(parent) = node.parent() else {
        return Ok(None);
    };
    let ty = match parent.kind() {
        SyntaxKind::SWITCH_CASE => subject_type(s, &parent, generics)?.0,
        SyntaxKind::PAREN_EXPR => return pattern_expected(s, &parent, generics),
        SyntaxKind::BINARY_EXPR => match binary_op(&parent) {
            Some(BinaryOp::BitOr | BinaryOp::Assign) => {
                return pattern_expected(s, &parent, generics);
            }
            // `f(_) => p`: the left side sees the matched value, the right
            // side whatever `f` returns.
            Some(BinaryOp::Extractor) if is_first_expr_child(node, &parent) => {
                return pattern_expected(s, &parent, generics);
            }
            Some(BinaryOp::Extractor) => {
                let lhs = parent.children().find_map(Expr::cast);
                match lhs {
                    Some(lhs) => evaluate(s, lhs.syntax(), generics)?.ty,
                    None => TypeRef::Unknown,
                }
            }
            _ => return Ok(None),
        },
        SyntaxKind::ARRAY_LITERAL => array_element(s, node, &parent, generics)?,
        SyntaxKind::OBJECT_FIELD => {
            let Some(field) = ObjectField::cast(parent.clone()) else {
                return Ok(None);
            };
            let Some(object) = parent.parent() else {
                return Ok(None);
            };
            let Some(expected) = pattern_expected(s, &object, generics)? else {
                return Ok(None);
            };
            match find_member(s, &expected, &field.name_text())? {
                Some(found) => member_type(s, found.member, &found.generics)?.ty,
                None => TypeRef::Unknown,
            }
        }
        SyntaxKind::ARG_LIST => constructor_argument(s, node, &parent, generics)?,
        _ => return Ok(None),
    };
    let ty = unwrap_null(s, &ty);
    Ok((!ty.is_unknown()).then_some(ty))
}

fn expr_index(node: &SyntaxNode, parent: &SyntaxNode) -> Option<usize> {
    parent
        .children()
        .filter(|c| Expr::cast(c.clone()).is_some())
        .position(|c| &c == node)
}

/// `case [a, b]`: element `i` of an array literal subject is matched on
/// its own; otherwise every element matches the array's element type.
fn array_element(
    s: &mut Session,
    node: &SyntaxNode,
    array: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    let Some(index) = expr_index(node, array) else {
        return Ok(TypeRef::Unknown);
    };
    if let Some(case) = array.parent().filter(|p| p.kind() == SyntaxKind::SWITCH_CASE) {
        let subject = case.parent().and_then(SwitchExpr::cast).and_then(|sw| sw.subject());
        if let Some(Expr::ArrayLiteral(tuple)) = subject {
            return match tuple.elements().nth(index) {
                Some(element) => Ok(evaluate(s, element.syntax(), generics)?.ty.without_constant()),
                None => Ok(TypeRef::Unknown),
            };
        }
    }
    let Some(expected) = pattern_expected(s, array, generics)? else {
        return Ok(TypeRef::Unknown);
    };
    Ok(match &expected {
        TypeRef::Class(ct) if s.is_builtin(ct.decl, "Array") => {
            ct.args.first().cloned().unwrap_or(TypeRef::Unknown)
        }
        _ => TypeRef::Unknown,
    })
}

/// Argument `i` of `Ctor(...)`, with the enum's parameters bound from the
/// matched type.
fn constructor_argument(
    s: &mut Session,
    node: &SyntaxNode,
    arg_list: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    let Some(call) = arg_list.parent().filter(|c| c.kind() == SyntaxKind::CALL_EXPR) else {
        return Ok(TypeRef::Unknown);
    };
    let Some(index) = expr_index(node, arg_list) else {
        return Ok(TypeRef::Unknown);
    };
    let name = match call.children().find_map(Expr::cast) {
        Some(Expr::NameRef(n)) => n.text(),
        Some(Expr::FieldAccess(fa)) => match fa.field() {
            Some(field) => field.text(),
            None => return Ok(TypeRef::Unknown),
        },
        _ => return Ok(TypeRef::Unknown),
    };
    let Some(expected) = pattern_expected(s, &call, generics)? else {
        return Ok(TypeRef::Unknown);
    };
    let Some(ctor) = enum_member(s, &expected, &name) else {
        return Ok(TypeRef::Unknown);
    };
    let Some(ct) = expected.as_class().or_else(|| expected.enum_class()) else {
        return Ok(TypeRef::Unknown);
    };
    let bindings = GenericResolver::for_class(s.catalog, ct);
    let ctor_ty = member_type(s, ctor, &bindings)?.ty;
    Ok(ctor_ty
        .as_function()
        .and_then(|f| f.args.get(index))
        .map(|a| a.ty.clone())
        .unwrap_or(TypeRef::Unknown))
}
