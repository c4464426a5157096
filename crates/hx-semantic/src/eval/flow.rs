//! Blocks, branches, loops, function literals and return type inference.

use hx_parser::ast::expr::{
    AnyFunction, BinaryOp, BlockExpr, Expr, ForHead, IfExpr, SwitchExpr, TernaryExpr, TryExpr,
    WhileExpr,
};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};
use rowan::WalkEvent;

use super::expect::lambda_param_type;
use super::members::{find_member, member_type};
use super::typeref::type_from_syntax;
use super::{evaluate, evaluate_opt};
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::model::NodePtr;
use crate::session::{Session, Typed};
use crate::ty::{Constant, FnArg, TypeRef};
use crate::unify::{unify, unify_all, UnifyRule};

// ── Branches ─────────────────────────────────────────────────────────────

/// A block has the value of its last statement.
pub(crate) fn block(s: &mut Session, block: &BlockExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    match block.tail() {
        Some(tail) => evaluate(s, tail.syntax(), generics),
        None => Ok(Typed::new(TypeRef::Void)),
    }
}

/// The constant truth value of a condition, if it has one.
fn constant_condition(
    s: &mut Session,
    cond: Option<Expr>,
    generics: &GenericResolver,
) -> Result<(Option<bool>, bool), Fault> {
    let typed = evaluate_opt(s, cond, generics)?;
    Ok((
        typed.ty.constant().and_then(Constant::as_bool),
        typed.cacheable,
    ))
}

fn branches(
    s: &mut Session,
    cond: Option<Expr>,
    then_branch: Option<Expr>,
    else_branch: Option<Expr>,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let (constant, cacheable) = constant_condition(s, cond, generics)?;
    let mut typed = match constant {
        Some(true) => evaluate_opt(s, then_branch, generics)?,
        Some(false) if else_branch.is_some() => evaluate_opt(s, else_branch, generics)?,
        Some(false) => Typed::new(TypeRef::Void),
        None => {
            let Some(else_branch) = else_branch else {
                return Ok(Typed {
                    ty: TypeRef::Void,
                    cacheable,
                });
            };
            let a = evaluate_opt(s, then_branch, generics)?;
            let b = evaluate(s, else_branch.syntax(), generics)?;
            let mut typed = Typed::new(unify(s, &a.ty, &b.ty, UnifyRule::Default)?);
            typed.absorb(&a);
            typed.absorb(&b);
            typed
        }
    };
    typed.cacheable &= cacheable;
    Ok(typed)
}

pub(crate) fn if_expr(s: &mut Session, expr: &IfExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    branches(
        s,
        expr.condition(),
        expr.then_branch(),
        expr.else_branch(),
        generics,
    )
}

pub(crate) fn ternary(s: &mut Session, expr: &TernaryExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    branches(
        s,
        expr.condition(),
        expr.then_branch(),
        expr.else_branch(),
        generics,
    )
}

/// Each case yields its last statement; the switch yields their union.
pub(crate) fn switch_expr(
    s: &mut Session,
    switch: &SwitchExpr,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let mut typed = Typed::new(TypeRef::Void);
    let mut results = Vec::new();
    for case in switch.cases() {
        let last = case.body().and_then(|body| body.statements().last());
        let t = match last {
            Some(stmt) => evaluate(s, stmt.syntax(), generics)?,
            None => Typed::new(TypeRef::Void),
        };
        typed.absorb(&t);
        results.push(t.ty);
    }
    if let Some(ty) = unify_all(s, &results, UnifyRule::Default)? {
        typed.ty = ty;
    }
    Ok(typed)
}

pub(crate) fn try_expr(s: &mut Session, expr: &TryExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let body = evaluate_opt(s, expr.body(), generics)?;
    let mut typed = body.clone();
    let mut results = vec![body.ty];
    for catch in expr.catches() {
        let t = evaluate_opt(s, catch.body(), generics)?;
        typed.absorb(&t);
        results.push(t.ty);
    }
    typed.ty = unify_all(s, &results, UnifyRule::Default)?.unwrap_or(TypeRef::Unknown);
    Ok(typed)
}

// ── Functions ────────────────────────────────────────────────────────────

/// The function type of a function literal, arrow lambda or local
/// function.
pub fn function_literal(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let Some(func) = AnyFunction::cast(node.clone()) else {
        return Ok(Typed::unknown());
    };
    let mut typed = Typed::unknown();
    let mut args = Vec::new();
    for param in func.param_list().iter().flat_map(|list| list.params()) {
        let t = if let Some(tag) = param.type_tag() {
            type_from_syntax(s, tag.syntax(), generics)?
        } else if let Some(default) = param.default_value() {
            evaluate(s, default.syntax(), generics)?.map(|ty| ty.without_constant())
        } else {
            lambda_param_type(s, param.syntax(), generics)?
        };
        typed.absorb(&t);
        args.push(FnArg {
            name: param.name().map(|n| n.text()),
            optional: param.is_optional() || param.default_value().is_some(),
            rest: param.is_rest(),
            ty: t.ty,
        });
    }
    let ret = match func.return_tag() {
        Some(tag) => type_from_syntax(s, tag.syntax(), generics)?,
        None => infer_return(s, node, generics)?,
    };
    typed.absorb(&ret);
    typed.ty = TypeRef::function(args, ret.ty);
    Ok(typed)
}

/// An arrow lambda whose body is a single expression yields that
/// expression.
fn expression_body(func: &AnyFunction) -> Option<Expr> {
    match func {
        AnyFunction::Lambda(l) => l.body().filter(|b| b.syntax().kind() != SyntaxKind::BLOCK),
        _ => None,
    }
}

/// The return type of a function without an annotation: the union of its
/// `return` expressions, `Void` when it has none.
pub fn infer_return(
    s: &mut Session,
    fn_node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let Some(func) = AnyFunction::cast(fn_node.clone()) else {
        return Ok(Typed::unknown());
    };
    let Some(body) = func.body() else {
        return Ok(Typed::new(TypeRef::Void));
    };
    if let Some(expr) = expression_body(&func) {
        return Ok(evaluate(s, expr.syntax(), generics)?.map(|ty| ty.without_constant()));
    }

    let mut returns = Vec::new();
    let mut walk = body.syntax().preorder();
    while let Some(event) = walk.next() {
        let WalkEvent::Enter(node) = event else {
            continue;
        };
        // Returns of nested functions belong to them.
        if node.kind().is_function_like() && &node != body.syntax() {
            walk.skip_subtree();
            continue;
        }
        if node.kind() == SyntaxKind::RETURN_EXPR {
            returns.push(node);
        }
    }
    if returns.is_empty() {
        return Ok(Typed::new(TypeRef::Void));
    }

    let mut typed = Typed::unknown();
    let mut types = Vec::with_capacity(returns.len());
    for ret in &returns {
        let value = ret.children().find_map(Expr::cast);
        let t = match value {
            Some(v) => evaluate(s, v.syntax(), generics)?,
            None => Typed::new(TypeRef::Void),
        };
        typed.absorb(&t);
        // A return that came back through a cycle says nothing; the
        // others decide.
        if t.cacheable || !t.ty.is_unknown() {
            types.push(t.ty);
        }
    }
    typed.ty = unify_all(s, &types, UnifyRule::PreferVoid)?.unwrap_or(TypeRef::Unknown);
    Ok(typed)
}

// ── Loops ────────────────────────────────────────────────────────────────

fn is_builtin_class(s: &mut Session, ty: &TypeRef, name: &'static str) -> bool {
    match ty {
        TypeRef::Class(ct) => s.is_builtin(ct.decl, name),
        _ => false,
    }
}

fn arg(ty: &TypeRef, index: usize) -> TypeRef {
    ty.as_class()
        .and_then(|ct| ct.args.get(index).cloned())
        .unwrap_or(TypeRef::Unknown)
}

/// The return type of calling `name` with no arguments on `receiver`.
fn method_return(s: &mut Session, receiver: &TypeRef, name: &str) -> Result<Option<TypeRef>, Fault> {
    let Some(found) = find_member(s, receiver, name)? else {
        return Ok(None);
    };
    let t = member_type(s, found.member, &found.generics)?;
    Ok(t.ty.as_function().map(|f| (*f.ret).clone()))
}

fn field_type(s: &mut Session, receiver: &TypeRef, name: &str) -> Result<TypeRef, Fault> {
    match find_member(s, receiver, name)? {
        Some(found) => Ok(member_type(s, found.member, &found.generics)?.ty),
        None => Ok(TypeRef::Unknown),
    }
}

/// The type of a loop variable. `is_key` selects `k` in
/// `for (k => v in e)`.
pub fn for_var_type(
    s: &mut Session,
    head: &SyntaxNode,
    is_key: bool,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let Some(head) = ForHead::cast(head.clone()) else {
        return Ok(Typed::unknown());
    };
    let Some(iterable) = head.iterable() else {
        return Ok(Typed::unknown());
    };
    if let Expr::Binary(bin) = &iterable {
        if bin.op() == Some(BinaryOp::Interval) {
            return Ok(Typed::new(TypeRef::int()));
        }
    }
    let key_value = head.key().is_some();
    let typed = evaluate(s, iterable.syntax(), generics)?;
    let ty = unwrap_null(s, &typed.ty);
    let element = if is_builtin_class(s, &ty, "Array") {
        if is_key {
            TypeRef::int()
        } else {
            arg(&ty, 0)
        }
    } else if is_builtin_class(s, &ty, "Map") {
        arg(&ty, if is_key { 0 } else { 1 })
    } else if is_builtin_class(s, &ty, "IntIterator") {
        TypeRef::int()
    } else if ty.is_dynamic() {
        TypeRef::dynamic()
    } else if ty.is_unknown() {
        TypeRef::Unknown
    } else if key_value {
        key_value_element(s, &ty, is_key)?
    } else {
        iterated_element(s, &ty)?
    };
    Ok(typed.map(|_| element.without_constant()))
}

/// Through `iterator()`, or `next()` on an iterator itself.
fn iterated_element(s: &mut Session, ty: &TypeRef) -> Result<TypeRef, Fault> {
    if let Some(iterator) = method_return(s, ty, "iterator")? {
        if let Some(next) = method_return(s, &iterator, "next")? {
            return Ok(next);
        }
    }
    Ok(method_return(s, ty, "next")?.unwrap_or(TypeRef::Unknown))
}

/// Through `keyValueIterator()`, whose items have `key` and `value`.
fn key_value_element(s: &mut Session, ty: &TypeRef, is_key: bool) -> Result<TypeRef, Fault> {
    let item = match method_return(s, ty, "keyValueIterator")? {
        Some(iterator) => method_return(s, &iterator, "next")?,
        None => method_return(s, ty, "next")?,
    };
    match item {
        Some(item) => field_type(s, &item, if is_key { "key" } else { "value" }),
        None => Ok(TypeRef::Unknown),
    }
}

// ── Reachability ─────────────────────────────────────────────────────────

fn exits(node: &SyntaxNode) -> bool {
    matches!(
        node.kind(),
        SyntaxKind::RETURN_EXPR
            | SyntaxKind::THROW_EXPR
            | SyntaxKind::BREAK_EXPR
            | SyntaxKind::CONTINUE_EXPR
    )
}

/// Statements under `root` that can never run: anything after an exit in
/// the same block, and branches a constant condition rules out.
pub fn unreachable(
    s: &mut Session,
    root: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Vec<NodePtr>, Fault> {
    let mut dead: Vec<SyntaxNode> = Vec::new();
    let mut walk = root.preorder();
    while let Some(event) = walk.next() {
        let WalkEvent::Enter(node) = event else {
            continue;
        };
        s.step()?;
        if dead.contains(&node) {
            walk.skip_subtree();
            continue;
        }
        match node.kind() {
            SyntaxKind::BLOCK | SyntaxKind::CASE_BODY => {
                let mut exited = false;
                for stmt in node.children().filter(|c| Expr::cast(c.clone()).is_some()) {
                    if exited {
                        dead.push(stmt);
                    } else if exits(&stmt) {
                        exited = true;
                    }
                }
            }
            SyntaxKind::IF_EXPR => {
                let Some(if_expr) = IfExpr::cast(node.clone()) else {
                    continue;
                };
                match constant_condition(s, if_expr.condition(), generics)?.0 {
                    Some(true) => dead.extend(if_expr.else_branch().map(|e| e.syntax().clone())),
                    Some(false) => dead.extend(if_expr.then_branch().map(|e| e.syntax().clone())),
                    None => {}
                }
            }
            SyntaxKind::WHILE_EXPR => {
                let Some(while_expr) = WhileExpr::cast(node.clone()) else {
                    continue;
                };
                if constant_condition(s, while_expr.condition(), generics)?.0 == Some(false) {
                    dead.extend(while_expr.body().map(|b| b.syntax().clone()));
                }
            }
            _ => {}
        }
    }
    Ok(dead.iter().filter_map(|n| s.ptr(n)).collect())
}

