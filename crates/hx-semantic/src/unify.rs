//! Combining two types into one that describes both.
//!
//! Unification here is not Hindley-Milner: there are no type variables to
//! solve. It answers "what single type can stand for a value that is either
//! `a` or `b`", as needed for branches, returns and collection literals.

use crate::compat::{can_assign, compatible_types};
use crate::error::Fault;
use crate::session::Session;
use crate::ty::{ClassType, FnArg, FunctionType, TypeRef};

/// How `Void` takes part in a unification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnifyRule {
    /// `Void` yields to the other side.
    #[default]
    Default,
    /// `Void` wins. Used for return type inference.
    PreferVoid,
    /// `Void` is ignored. Used for collection literals.
    IgnoreVoid,
}

/// Unify two types under `rule`.
pub fn unify(s: &mut Session, a: &TypeRef, b: &TypeRef, rule: UnifyRule) -> Result<TypeRef, Fault> {
    s.step()?;
    if a.same_type(b) {
        return Ok(a.without_constant());
    }
    match (a, b) {
        (TypeRef::Dynamic(None), _) | (_, TypeRef::Dynamic(None)) => {
            return Ok(TypeRef::dynamic());
        }
        // `null` takes the type of whatever it is combined with.
        (TypeRef::Dynamic(Some(_)), other) | (other, TypeRef::Dynamic(Some(_)))
            if !other.is_unknown() =>
        {
            return Ok(other.without_constant());
        }
        (TypeRef::Unknown, _) | (_, TypeRef::Unknown) => return Ok(TypeRef::Unknown),
        (TypeRef::Invalid, _) | (_, TypeRef::Invalid) => return Ok(TypeRef::Invalid),
        (TypeRef::Void, other) | (other, TypeRef::Void) => {
            return Ok(match rule {
                UnifyRule::PreferVoid => TypeRef::Void,
                UnifyRule::Default | UnifyRule::IgnoreVoid => other.without_constant(),
            });
        }
        (TypeRef::Function(fa), TypeRef::Function(fb)) => return unify_functions(s, fa, fb),
        _ => {}
    }

    // A structure that accepts the other side describes both.
    let mut structures = Vec::new();
    for (structure, other) in [(a, b), (b, a)] {
        if is_structure(s, structure) && can_assign(s, structure, other)? {
            structures.push(structure);
        }
    }
    if let Some(structure) = structures.into_iter().min_by_key(|t| head_order(t)) {
        return Ok(structure.without_constant());
    }

    // The common supertype nearest to both sides. Ranks are summed so the
    // choice does not depend on which side came first.
    let a_set = compatible_types(s, a)?;
    let b_set = compatible_types(s, b)?;
    let mut best: Option<((usize, usize, (u32, String)), &TypeRef, &TypeRef)> = None;
    for (i, candidate) in a_set.iter().enumerate() {
        let Some((j, partner)) = b_set.iter().enumerate().find(|(_, t)| same_head(t, candidate)) else {
            continue;
        };
        let key = (i + j, i.max(j), head_order(candidate));
        if best.as_ref().map_or(true, |(k, _, _)| key < *k) {
            best = Some((key, candidate, partner));
        }
    }
    if let Some((_, candidate, partner)) = best {
        return match (candidate, partner) {
            (TypeRef::Class(x), TypeRef::Class(y)) => Ok(TypeRef::Class(unify_args(s, x, y)?)),
            _ => Ok(candidate.without_constant()),
        };
    }
    log::trace!("no common type for {a} and {b}");
    Ok(TypeRef::Unknown)
}

/// Unify a list of types left to right.
pub fn unify_all<'t>(
    s: &mut Session,
    types: impl IntoIterator<Item = &'t TypeRef>,
    rule: UnifyRule,
) -> Result<Option<TypeRef>, Fault> {
    let mut result: Option<TypeRef> = None;
    for ty in types {
        result = Some(match result {
            None => ty.without_constant(),
            Some(acc) => unify(s, &acc, ty, rule)?,
        });
    }
    Ok(result)
}

fn is_structure(s: &Session, ty: &TypeRef) -> bool {
    ty.as_class()
        .and_then(|ct| s.catalog.declaration(ct.decl))
        .is_some_and(|d| d.is_structure())
}

/// Order-independent tie-break: declaration order, then rendering.
fn head_order(ty: &TypeRef) -> (u32, String) {
    match ty {
        TypeRef::Class(ct) => (ct.decl.0, String::new()),
        other => (u32::MAX, other.to_string()),
    }
}

/// Same declaration or same primitive, arguments aside.
fn same_head(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Class(x), TypeRef::Class(y)) => x.decl == y.decl,
        (TypeRef::Primitive(x, _), TypeRef::Primitive(y, _)) => x == y,
        _ => a.same_type(b),
    }
}

fn unify_args(s: &mut Session, a: &ClassType, b: &ClassType) -> Result<ClassType, Fault> {
    let mut args = Vec::with_capacity(a.args.len());
    for (i, x) in a.args.iter().enumerate() {
        let y = b.args.get(i).unwrap_or(&TypeRef::Unknown);
        let arg = match (x, y) {
            (TypeRef::Unknown, known) | (known, TypeRef::Unknown) => known.without_constant(),
            _ => match unify(s, x, y, UnifyRule::Default)? {
                TypeRef::Unknown => TypeRef::dynamic(),
                unified => unified,
            },
        };
        args.push(arg);
    }
    Ok(ClassType {
        args,
        ..a.without_constant()
    })
}

fn unify_functions(s: &mut Session, a: &FunctionType, b: &FunctionType) -> Result<TypeRef, Fault> {
    if a.args.len() != b.args.len() {
        return Ok(TypeRef::Invalid);
    }
    let mut args = Vec::with_capacity(a.args.len());
    for (x, y) in a.args.iter().zip(&b.args) {
        if x.optional != y.optional {
            return Ok(TypeRef::Invalid);
        }
        let ty = unify(s, &x.ty, &y.ty, UnifyRule::Default)?;
        if ty.is_invalid() {
            return Ok(TypeRef::Invalid);
        }
        args.push(FnArg { ty, ..x.clone() });
    }
    let ret = unify(s, &a.ret, &b.ret, UnifyRule::PreferVoid)?;
    Ok(TypeRef::Function(FunctionType {
        args,
        ret: Box::new(ret),
    }))
}
