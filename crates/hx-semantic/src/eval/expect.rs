//! The type an expression's position asks for.
//!
//! Used where an expression says too little about itself: an empty array
//! literal, an untyped lambda parameter, `null`.

use hx_parser::ast::expr::{AnyFunction, BinaryExpr, BinaryOp, CheckTypeExpr, Expr, ObjectField};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::calls::expected_arg_type;
use super::evaluate;
use super::members::{find_member, member_type};
use super::patterns::pattern_expected;
use super::typeref::type_from_syntax;
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::resolve::scope::enclosing_function;
use crate::session::{Session, Typed};
use crate::ty::TypeRef;

fn expr_children(parent: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> {
    parent.children().filter(|c| Expr::cast(c.clone()).is_some())
}

fn expr_index(node: &SyntaxNode, parent: &SyntaxNode) -> Option<usize> {
    expr_children(parent).position(|c| &c == node)
}

/// The annotation directly under a `VAR_DECL`, `FIELD_DEF` or `PARAM`.
fn own_tag(
    s: &mut Session,
    owner: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    match owner.children().find(|c| c.kind() == SyntaxKind::TYPE_TAG) {
        Some(tag) => Ok(type_from_syntax(s, &tag, generics)?.ty),
        None => Ok(TypeRef::Unknown),
    }
}

fn class_arg(s: &mut Session, ty: &TypeRef, class: &'static str, index: usize) -> TypeRef {
    match ty {
        TypeRef::Class(ct) if s.is_builtin(ct.decl, class) => {
            ct.args.get(index).cloned().unwrap_or(TypeRef::Unknown)
        }
        _ => TypeRef::Unknown,
    }
}

/// The type the surroundings of `node` expect it to have, if they say.
pub fn expected_type(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Option<TypeRef>, Fault> {
    s.step()?;
    if let Some(hint) = s.ptr(node).and_then(|p| s.hint_for(&p)) {
        return Ok(Some(hint.clone()));
    }
    let Some(parent) = node.parent() else {
        return Ok(None);
    };
    let ty = match parent.kind() {
        SyntaxKind::INITIALIZER => match parent.parent() {
            Some(owner) => own_tag(s, &owner, generics)?,
            None => TypeRef::Unknown,
        },
        SyntaxKind::DEFAULT_VALUE => match parent.parent() {
            Some(param) => own_tag(s, &param, generics)?,
            None => TypeRef::Unknown,
        },
        SyntaxKind::BINARY_EXPR => {
            let Some(bin) = BinaryExpr::cast(parent.clone()) else {
                return Ok(None);
            };
            let is_rhs = expr_index(node, &parent) == Some(1);
            match (bin.op(), is_rhs) {
                (Some(BinaryOp::Assign | BinaryOp::CompoundAssign), true) => match bin.lhs() {
                    Some(lhs) => evaluate(s, lhs.syntax(), generics)?.ty.without_constant(),
                    None => TypeRef::Unknown,
                },
                (Some(BinaryOp::Eq | BinaryOp::NotEq), _) => {
                    let other = if is_rhs { bin.lhs() } else { bin.rhs() };
                    match other {
                        Some(other) => evaluate(s, other.syntax(), generics)?.ty.without_constant(),
                        None => TypeRef::Unknown,
                    }
                }
                (Some(BinaryOp::NullCoalesce), true) => match bin.lhs() {
                    Some(lhs) => {
                        let lhs = evaluate(s, lhs.syntax(), generics)?.ty;
                        unwrap_null(s, &lhs).without_constant()
                    }
                    None => TypeRef::Unknown,
                },
                _ => TypeRef::Unknown,
            }
        }
        SyntaxKind::ARG_LIST => {
            let (Some(call), Some(index)) = (parent.parent(), expr_index(node, &parent)) else {
                return Ok(None);
            };
            expected_arg_type(s, &call, index, generics)?.unwrap_or(TypeRef::Unknown)
        }
        SyntaxKind::RETURN_EXPR => return_type(s, &parent, generics)?,
        SyntaxKind::PAREN_EXPR => return expected_type(s, &parent, generics),
        SyntaxKind::ELSE_BRANCH => match parent.parent() {
            Some(if_expr) => return expected_type(s, &if_expr, generics),
            None => TypeRef::Unknown,
        },
        SyntaxKind::TERNARY_EXPR | SyntaxKind::IF_EXPR => {
            if expr_index(node, &parent) == Some(0) {
                TypeRef::bool()
            } else {
                return expected_type(s, &parent, generics);
            }
        }
        SyntaxKind::ARRAY_LITERAL => match expected_type(s, &parent, generics)? {
            Some(array) => class_arg(s, &array, "Array", 0),
            None => TypeRef::Unknown,
        },
        SyntaxKind::MAP_ENTRY => {
            let Some(map) = parent.parent() else {
                return Ok(None);
            };
            let is_key = expr_index(node, &parent) == Some(0);
            match expected_type(s, &map, generics)? {
                Some(map_ty) => class_arg(s, &map_ty, "Map", if is_key { 0 } else { 1 }),
                None => TypeRef::Unknown,
            }
        }
        SyntaxKind::OBJECT_FIELD => {
            let (Some(field), Some(object)) = (ObjectField::cast(parent.clone()), parent.parent())
            else {
                return Ok(None);
            };
            match expected_type(s, &object, generics)? {
                Some(structure) => match find_member(s, &structure, &field.name_text())? {
                    Some(found) => member_type(s, found.member, &found.generics)?.ty,
                    None => TypeRef::Unknown,
                },
                None => TypeRef::Unknown,
            }
        }
        SyntaxKind::CHECK_TYPE_EXPR => match CheckTypeExpr::cast(parent.clone()).and_then(|c| c.ty()) {
            Some(ty) => type_from_syntax(s, ty.syntax(), generics)?.ty,
            None => TypeRef::Unknown,
        },
        SyntaxKind::SWITCH_CASE => return pattern_expected(s, node, generics),
        _ => TypeRef::Unknown,
    };
    Ok((!ty.is_unknown()).then_some(ty))
}

/// What a `return` inside a function should produce: the declared return
/// type, else for a function literal, the return type its own position
/// expects.
fn return_type(
    s: &mut Session,
    ret: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    let Some(func) = enclosing_function(ret).and_then(AnyFunction::cast) else {
        return Ok(TypeRef::Unknown);
    };
    if let Some(tag) = func.return_tag() {
        return Ok(type_from_syntax(s, tag.syntax(), generics)?.ty);
    }
    if matches!(func, AnyFunction::Method(_)) {
        return Ok(TypeRef::Unknown);
    }
    let expected = expected_type(s, func.syntax(), generics)?;
    Ok(expected
        .as_ref()
        .and_then(TypeRef::as_function)
        .map(|f| (*f.ret).clone())
        .unwrap_or(TypeRef::Unknown))
}

/// The type of an unannotated parameter of a function literal, taken from
/// the function type its position expects.
pub(crate) fn lambda_param_type(
    s: &mut Session,
    param: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let Some(list) = param.parent() else {
        return Ok(Typed::unknown());
    };
    let Some(func) = list
        .parent()
        .filter(|f| matches!(f.kind(), SyntaxKind::LAMBDA_EXPR | SyntaxKind::FUNCTION_EXPR))
    else {
        return Ok(Typed::unknown());
    };
    let Some(index) = list
        .children()
        .filter(|c| c.kind() == SyntaxKind::PARAM)
        .position(|c| &c == param)
    else {
        return Ok(Typed::unknown());
    };
    let Some(expected) = expected_type(s, &func, generics)? else {
        return Ok(Typed::unknown());
    };
    let expected = unwrap_null(s, &expected);
    Ok(Typed::new(
        expected
            .as_function()
            .and_then(|f| f.args.get(index))
            .map(|a| a.ty.clone())
            .unwrap_or(TypeRef::Unknown),
    ))
}
