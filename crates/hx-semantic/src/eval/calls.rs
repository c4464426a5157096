//! Calls, `new`, field access and indexing.
//!
//! Generic parameters of the called method are bound from the argument
//! types. While a call's arguments are evaluated the call is marked in
//! flight, so a lambda argument asking for its expected type does not
//! evaluate the same arguments again.

use hx_parser::ast::expr::{CallExpr, Expr, FieldAccess, IndexExpr, NewExpr};
use hx_parser::ast::ty::TypeRef as AstType;
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::evaluate;
use super::locals::type_of_target;
use super::members::{find_member, lookup_field, member_type};
use super::typeref::{decl_value_type, self_type, type_from_syntax};
use crate::error::Fault;
use crate::generics::{bind, infer_from_args, unwrap_null, GenericResolver, Provenance};
use crate::model::{DeclId, GenericParam, MemberKind};
use crate::resolve::{resolve, Target};
use crate::session::{Session, Typed};
use crate::ty::{FunctionType, TypeRef};

/// The declared type at argument position `index`, spreading a trailing
/// rest parameter over every remaining argument.
fn param_at(f: &FunctionType, index: usize) -> Option<TypeRef> {
    match f.args.get(index) {
        Some(arg) => Some(arg.ty.clone()),
        None => f.args.last().filter(|a| a.rest).map(|a| a.ty.clone()),
    }
}

/// Evaluate argument expressions with `call` marked in flight.
fn eval_args(
    s: &mut Session,
    call: &SyntaxNode,
    args: &[Expr],
    skip: Option<usize>,
    generics: &GenericResolver,
) -> Result<Vec<Option<Typed>>, Fault> {
    let ptr = s.ptr(call);
    let inserted = ptr.is_some_and(|p| s.in_flight_calls.insert(p));
    let mut result = Ok(Vec::with_capacity(args.len()));
    for (i, arg) in args.iter().enumerate() {
        if skip == Some(i) || (skip.is_some() && is_function_literal(arg)) {
            if let Ok(types) = &mut result {
                types.push(None);
            }
            continue;
        }
        match evaluate(s, arg.syntax(), generics) {
            Ok(t) => {
                if let Ok(types) = &mut result {
                    types.push(Some(t));
                }
            }
            Err(fault) => {
                result = Err(fault);
                break;
            }
        }
    }
    if let (true, Some(p)) = (inserted, ptr) {
        s.in_flight_calls.remove(&p);
    }
    result
}

fn is_function_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Function(_) | Expr::Lambda(_))
}

fn is_in_flight(s: &Session, node: &SyntaxNode) -> bool {
    s.ptr(node)
        .is_some_and(|p| s.in_flight_calls.contains(&p))
}

/// The generic parameters a call must bind: the method's own, or the
/// enum's for a constructor.
fn callee_generics(s: &mut Session, callee: &Expr, generics: &GenericResolver) -> Result<Vec<GenericParam>, Fault> {
    let name_ref = match callee {
        Expr::NameRef(n) => Some(n.syntax().clone()),
        Expr::FieldAccess(fa) => fa.field().map(|f| f.syntax().clone()),
        _ => None,
    };
    let Some(name_ref) = name_ref else {
        return Ok(Vec::new());
    };
    let resolution = resolve(s, &name_ref, generics)?;
    let catalog = s.catalog;
    let Some(Target::Member(id)) = resolution.targets.first() else {
        return Ok(Vec::new());
    };
    let Some(member) = catalog.member(*id) else {
        return Ok(Vec::new());
    };
    if member.kind == MemberKind::EnumCtor {
        return Ok(catalog
            .declaration(member.owner)
            .map(|d| d.generics.clone())
            .unwrap_or_default());
    }
    Ok(member.generics.clone())
}

pub(crate) fn call(s: &mut Session, call: &CallExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(callee) = call.callee() else {
        return Ok(Typed::unknown());
    };
    // `super(...)` runs the parent constructor.
    if matches!(callee, Expr::Super(_)) {
        return Ok(Typed::new(TypeRef::Void));
    }
    let callee_typed = evaluate(s, callee.syntax(), generics)?;
    let mut typed = Typed {
        ty: TypeRef::Unknown,
        cacheable: callee_typed.cacheable,
    };
    let callee_ty = unwrap_null(s, &callee_typed.ty);
    let f = match callee_ty {
        TypeRef::Function(f) => f,
        TypeRef::Dynamic(_) => {
            typed.ty = TypeRef::dynamic();
            return Ok(typed);
        }
        _ => return Ok(typed),
    };

    let args = call.args();
    let arg_types = eval_args(s, call.syntax(), &args, None, generics)?;
    let mut params = Vec::with_capacity(arg_types.len());
    let mut actuals = Vec::with_capacity(arg_types.len());
    for (i, t) in arg_types.into_iter().enumerate() {
        let Some(t) = t else { continue };
        typed.absorb(&t);
        params.push(param_at(&f, i).unwrap_or(TypeRef::Unknown));
        actuals.push(t.ty);
    }

    let mut resolver = GenericResolver::new();
    infer_from_args(s, &params, &actuals, &mut resolver)?;
    let mut ret = resolver.apply(&f.ret);

    // Method parameters nothing bound say nothing about the result.
    let method_params = callee_generics(s, &callee, generics)?;
    if !method_params.is_empty() {
        let mut unbound = GenericResolver::new();
        for p in &method_params {
            if !resolver.contains(&p.name) {
                unbound.add(&p.name, TypeRef::Unknown, Provenance::Method);
            }
        }
        ret = unbound.apply(&ret);
    }
    typed.ty = ret;
    Ok(typed)
}

pub(crate) fn field_access(
    s: &mut Session,
    access: &FieldAccess,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let lookup = lookup_field(s, access.syntax(), generics)?;
    let mut typed = Typed {
        ty: TypeRef::Unknown,
        cacheable: lookup.cacheable,
    };
    match &lookup.target {
        Some(Target::Member(id)) => {
            let t = member_type(s, *id, &lookup.generics)?;
            typed.absorb(&t);
            typed.ty = match (&t.ty, &lookup.receiver) {
                // `x.ext()` for `static function ext(self:T)`: the receiver
                // is the first argument.
                (TypeRef::Function(f), Some(receiver)) if lookup.extension => {
                    let mut bindings = GenericResolver::new();
                    if let Some(first) = f.args.first() {
                        bind(s, &first.ty, receiver, &mut bindings)?;
                    }
                    let rest = TypeRef::Function(FunctionType {
                        args: f.args.iter().skip(1).cloned().collect(),
                        ret: f.ret.clone(),
                    });
                    bindings.apply(&rest)
                }
                _ => t.ty.clone(),
            };
        }
        Some(Target::Decl(decl)) => typed.ty = decl_value_type(s, *decl),
        Some(Target::Package(_)) => {}
        Some(other) => {
            let t = type_of_target(s, access.syntax(), other, generics)?;
            typed.absorb(&t);
            typed.ty = t.ty;
        }
        None => {
            if lookup.receiver.as_ref().is_some_and(TypeRef::is_dynamic) {
                typed.ty = TypeRef::dynamic();
            }
        }
    }
    Ok(typed)
}

pub(crate) fn index(s: &mut Session, expr: &IndexExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(base) = expr.base() else {
        return Ok(Typed::unknown());
    };
    let base = evaluate(s, base.syntax(), generics)?;
    let ty = unwrap_null(s, &base.ty);
    let element = match &ty {
        TypeRef::Class(ct) if s.is_builtin(ct.decl, "Array") => {
            ct.args.first().cloned().unwrap_or(TypeRef::Unknown)
        }
        TypeRef::Class(ct) if s.is_builtin(ct.decl, "Map") => {
            ct.args.get(1).cloned().unwrap_or(TypeRef::Unknown)
        }
        TypeRef::Class(ct) => {
            let catalog = s.catalog;
            let accessor = catalog
                .members_of(ct.decl)
                .into_iter()
                .find(|m| m.is_method() && m.has_meta("arrayAccess"))
                .map(|m| m.id);
            match accessor {
                Some(id) => {
                    let bindings = GenericResolver::for_class(catalog, ct);
                    let t = member_type(s, id, &bindings)?;
                    t.ty.as_function()
                        .map(|f| (*f.ret).clone())
                        .unwrap_or(TypeRef::Unknown)
                }
                None => TypeRef::Unknown,
            }
        }
        TypeRef::Dynamic(_) => TypeRef::dynamic(),
        _ => TypeRef::Unknown,
    };
    Ok(base.map(|_| element.without_constant()))
}

/// The constructor function type of `ct`, with its class parameters
/// still unbound.
fn constructor(s: &mut Session, decl: DeclId) -> Result<Option<FunctionType>, Fault> {
    let own = TypeRef::Class(self_type(s, decl));
    let Some(found) = find_member(s, &own, "new")? else {
        return Ok(None);
    };
    let t = member_type(s, found.member, &found.generics)?;
    Ok(t.ty.as_function().cloned())
}

pub(crate) fn new_expr(s: &mut Session, expr: &NewExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(ty_node) = expr.ty() else {
        return Ok(Typed::unknown());
    };
    let mut typed = type_from_syntax(s, ty_node.syntax(), generics)?;
    let TypeRef::Class(ct) = &typed.ty else {
        return Ok(typed);
    };
    let written = match &ty_node {
        AstType::Path(path) => path.generic_args().next().is_some(),
        _ => true,
    };
    let catalog = s.catalog;
    let params = catalog
        .declaration(ct.decl)
        .map(|d| d.generics.clone())
        .unwrap_or_default();
    if written || params.is_empty() {
        return Ok(typed);
    }
    // `new Box(1)` infers `Box<Int>` from the constructor arguments.
    let mut inferred = ct.clone();
    let mut resolver = GenericResolver::new();
    if let Some(ctor) = constructor(s, ct.decl)? {
        let args = expr.args();
        let arg_types = eval_args(s, expr.syntax(), &args, None, generics)?;
        let mut declared = Vec::new();
        let mut actuals = Vec::new();
        for (i, t) in arg_types.into_iter().enumerate() {
            let Some(t) = t else { continue };
            typed.absorb(&t);
            declared.push(param_at(&ctor, i).unwrap_or(TypeRef::Unknown));
            actuals.push(t.ty);
        }
        infer_from_args(s, &declared, &actuals, &mut resolver)?;
    }
    inferred.args = params.iter().map(|p| resolver.resolve(&p.name)).collect();
    typed.ty = TypeRef::Class(inferred);
    Ok(typed)
}

/// The type argument `index` of a call or `new` expects. Generic
/// parameters are bound from the other arguments first, except function
/// literals, whose own types may depend on this answer.
pub(crate) fn expected_arg_type(
    s: &mut Session,
    call_or_new: &SyntaxNode,
    index: usize,
    generics: &GenericResolver,
) -> Result<Option<TypeRef>, Fault> {
    let (f, args) = match call_or_new.kind() {
        SyntaxKind::CALL_EXPR => {
            let Some(call) = CallExpr::cast(call_or_new.clone()) else {
                return Ok(None);
            };
            let Some(callee) = call.callee() else {
                return Ok(None);
            };
            let callee_ty = evaluate(s, callee.syntax(), generics)?.ty;
            match unwrap_null(s, &callee_ty) {
                TypeRef::Function(f) => (f, call.args()),
                _ => return Ok(None),
            }
        }
        SyntaxKind::NEW_EXPR => {
            let Some(new) = NewExpr::cast(call_or_new.clone()) else {
                return Ok(None);
            };
            let Some(ty_node) = new.ty() else {
                return Ok(None);
            };
            let ty = type_from_syntax(s, ty_node.syntax(), generics)?.ty;
            let Some(ct) = ty.as_class() else {
                return Ok(None);
            };
            let bindings = GenericResolver::for_class(s.catalog, ct).without_unknowns();
            match constructor(s, ct.decl)? {
                Some(ctor) => {
                    let applied = bindings.apply(&TypeRef::Function(ctor));
                    match applied {
                        TypeRef::Function(f) => (f, new.args()),
                        _ => return Ok(None),
                    }
                }
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    let Some(param) = param_at(&f, index) else {
        return Ok(None);
    };
    if !param.has_type_parameters() || is_in_flight(s, call_or_new) {
        return Ok(Some(param));
    }
    let arg_types = eval_args(s, call_or_new, &args, Some(index), generics)?;
    let mut resolver = GenericResolver::new();
    for (i, t) in arg_types.into_iter().enumerate() {
        let (Some(t), Some(declared)) = (t, param_at(&f, i)) else {
            continue;
        };
        bind(s, &declared, &t.ty, &mut resolver)?;
    }
    Ok(Some(resolver.apply(&param)))
}
