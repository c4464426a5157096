//! Assignability and compatible-type sets.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::error::Fault;
use crate::eval::members::{find_member, member_type};
use crate::eval::typeref::type_of_tag;
use crate::generics::{unwrap_null, GenericResolver};
use crate::model::{DeclId, DeclShape, MemberKind};
use crate::session::{GuardKey, Session};
use crate::ty::{ClassType, Constant, Primitive, TypeRef};

// ── Compatible sets ──────────────────────────────────────────────────────

/// The direct supertypes of a class type, with its generic arguments
/// substituted: superclass first, then interfaces, then structure
/// extensions.
pub fn direct_supertypes(s: &mut Session, ct: &ClassType) -> Result<Vec<ClassType>, Fault> {
    let catalog = s.catalog;
    let generics = GenericResolver::for_class(catalog, ct);
    let mut out = Vec::new();
    for tag in catalog.supertypes_of(ct.decl) {
        if let TypeRef::Class(sup) = type_of_tag(s, &tag, &generics)?.ty {
            out.push(sup);
        }
    }
    Ok(out)
}

/// Every type a value of `ty` can be treated as, in preference order:
/// the type itself, its superclasses breadth-first, its interfaces, then
/// the targets of an abstract's implicit casts.
pub fn compatible_types(s: &mut Session, ty: &TypeRef) -> Result<Vec<TypeRef>, Fault> {
    s.step()?;
    let ct = match ty {
        TypeRef::Primitive(Primitive::Int, _) => return Ok(vec![TypeRef::int(), TypeRef::float()]),
        TypeRef::Class(ct) => ct.without_constant(),
        TypeRef::EnumValue { enum_type, .. } => enum_type.without_constant(),
        other => return Ok(vec![other.without_constant()]),
    };
    let catalog = s.catalog;
    let mut classes = vec![ct.clone()];
    let mut interfaces: Vec<ClassType> = Vec::new();
    let mut seen: FxHashSet<DeclId> = FxHashSet::default();
    seen.insert(ct.decl);

    let mut queue = VecDeque::from([ct.clone()]);
    while let Some(current) = queue.pop_front() {
        s.step()?;
        let is_interface = catalog
            .declaration(current.decl)
            .is_some_and(|d| matches!(d.shape, DeclShape::Interface { .. }));
        let supers = s.guarded(
            GuardKey::Supertypes(current.decl),
            Vec::new(),
            |s| direct_supertypes(s, &current),
        )?;
        for sup in supers {
            if !seen.insert(sup.decl) {
                continue;
            }
            let sup_is_interface = catalog
                .declaration(sup.decl)
                .is_some_and(|d| matches!(d.shape, DeclShape::Interface { .. }));
            if sup_is_interface && !is_interface {
                interfaces.push(sup.clone());
            } else {
                classes.push(sup.clone());
            }
            queue.push_back(sup);
        }
    }

    let mut out: Vec<TypeRef> = classes.into_iter().map(TypeRef::Class).collect();
    out.extend(interfaces.into_iter().map(TypeRef::Class));

    // Abstract casts of the type itself.
    if let Some(decl) = catalog.declaration(ct.decl) {
        if matches!(decl.shape, DeclShape::Abstract { .. }) {
            let generics = GenericResolver::for_class(catalog, &ct);
            for tag in decl.to_casts().iter().chain(decl.from_casts()) {
                let cast = type_of_tag(s, tag, &generics)?.ty;
                if !cast.is_unknown()
                    && !cast.has_type_parameters()
                    && !out.iter().any(|t| t.same_type(&cast))
                {
                    out.push(cast);
                }
            }
        }
    }
    Ok(out)
}

// ── Assignability ────────────────────────────────────────────────────────

fn is_any(s: &mut Session, ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Class(ct) if s.is_builtin(ct.decl, "Any"))
}

/// Generic arguments that accept anything.
fn is_lenient_arg(s: &mut Session, ty: &TypeRef) -> bool {
    matches!(
        ty,
        TypeRef::Unknown | TypeRef::Dynamic(_) | TypeRef::TypeParameter { .. }
    ) || is_any(s, ty)
}

/// Whether a value of type `value` may be stored where `target` is
/// expected.
pub fn can_assign(s: &mut Session, target: &TypeRef, value: &TypeRef) -> Result<bool, Fault> {
    s.step()?;
    if target.is_dynamic() || value.is_dynamic() || target.is_unknown() || value.is_unknown() {
        return Ok(true);
    }
    if is_any(s, target) || is_any(s, value) {
        return Ok(true);
    }
    if target.is_invalid() || value.is_invalid() {
        return Ok(false);
    }
    if target.is_void() || value.is_void() {
        return Ok(target.is_void() && value.is_void());
    }
    if let TypeRef::TypeParameter { constraint, .. } = target {
        return match constraint {
            Some(c) => can_assign(s, c, value),
            None => Ok(true),
        };
    }
    if let TypeRef::TypeParameter { constraint, .. } = value {
        return match constraint {
            Some(c) => can_assign(s, target, c),
            None => Ok(true),
        };
    }
    if target.same_type(value) {
        return Ok(true);
    }

    // `Null<T>` and `T` are interchangeable.
    let unwrapped_target = unwrap_null(s, target);
    let unwrapped_value = unwrap_null(s, value);
    if !unwrapped_target.same_type(target) || !unwrapped_value.same_type(value) {
        return can_assign(s, &unwrapped_target, &unwrapped_value);
    }

    match (target, value) {
        (TypeRef::Primitive(Primitive::Float, _), TypeRef::Primitive(Primitive::Int, _)) => {
            return Ok(true)
        }
        (TypeRef::Function(t), TypeRef::Function(v)) => {
            if t.args.len() != v.args.len() {
                return Ok(false);
            }
            for (ta, va) in t.args.iter().zip(&v.args) {
                if ta.optional != va.optional {
                    return Ok(false);
                }
                // Arguments flow the other way.
                if !can_assign(s, &va.ty, &ta.ty)? {
                    return Ok(false);
                }
            }
            if t.ret.is_void() {
                return Ok(true);
            }
            return can_assign(s, &t.ret, &v.ret);
        }
        _ => {}
    }

    // An empty array literal can stand in for any map.
    if let (TypeRef::Class(t), TypeRef::Class(v)) = (target, value) {
        if s.is_builtin(t.decl, "Map")
            && s.is_builtin(v.decl, "Array")
            && matches!(&v.constant, Some(Constant::Array(items)) if items.is_empty())
        {
            return Ok(true);
        }
    }

    if nominal(s, target, value)? {
        return Ok(true);
    }
    if through_casts(s, target, value)? {
        return Ok(true);
    }
    match target {
        // Recursive structures are assumed compatible on the second visit.
        TypeRef::Class(t) => s.guarded(GuardKey::Structure(t.decl), true, |s| {
            structural(s, target, value)
        }),
        _ => Ok(false),
    }
}

/// The value's compatible set contains the target.
fn nominal(s: &mut Session, target: &TypeRef, value: &TypeRef) -> Result<bool, Fault> {
    let candidates = compatible_types(s, value)?;
    for candidate in candidates {
        match (target, &candidate) {
            (TypeRef::Class(t), TypeRef::Class(c)) if t.decl == c.decl => {
                if args_accept(s, &t.args, &c.args)? {
                    return Ok(true);
                }
            }
            (TypeRef::Primitive(a, _), TypeRef::Primitive(b, _)) if a == b => return Ok(true),
            _ => {}
        }
    }
    Ok(false)
}

fn args_accept(s: &mut Session, target: &[TypeRef], value: &[TypeRef]) -> Result<bool, Fault> {
    for (t, v) in target.iter().zip(value) {
        if is_lenient_arg(s, t) || matches!(v, TypeRef::Unknown | TypeRef::Dynamic(_)) {
            continue;
        }
        if t.same_type(v) {
            continue;
        }
        // Nested literal collections (`Array<Array<Int>>` into
        // `Array<Array<Any>>`) are checked per level.
        match (t, v) {
            (TypeRef::Class(tc), TypeRef::Class(vc)) if tc.decl == vc.decl => {
                if !args_accept(s, &tc.args, &vc.args)? {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
    }
    Ok(true)
}

fn abstract_decl(s: &Session, ty: &TypeRef) -> Option<ClassType> {
    let ct = ty.as_class()?;
    let decl = s.catalog.declaration(ct.decl)?;
    matches!(decl.shape, DeclShape::Abstract { .. }).then(|| ct.clone())
}

/// Implicit casts: `from`/`to` clauses and `@:from`/`@:to` methods.
fn through_casts(s: &mut Session, target: &TypeRef, value: &TypeRef) -> Result<bool, Fault> {
    if let Some(t) = abstract_decl(s, target) {
        let accepted = s.guarded(GuardKey::Cast(t.decl), false, |s| {
            accepts_from(s, &t, value)
        })?;
        if accepted {
            return Ok(true);
        }
    }
    if let Some(v) = abstract_decl(s, value) {
        let converted = s.guarded(GuardKey::Cast(v.decl), false, |s| {
            converts_to(s, &v, target)
        })?;
        if converted {
            return Ok(true);
        }
    }
    Ok(false)
}

fn accepts_from(s: &mut Session, target: &ClassType, value: &TypeRef) -> Result<bool, Fault> {
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(target.decl) else {
        return Ok(false);
    };
    let generics = GenericResolver::for_class(catalog, target);
    for tag in decl.from_casts() {
        let from = type_of_tag(s, tag, &generics)?.ty;
        if !from.is_unknown() && can_assign(s, &from, value)? {
            return Ok(true);
        }
    }
    for member in catalog.members_of(target.decl) {
        if member.kind != MemberKind::Method || !member.is_static() || !member.has_meta("from") {
            continue;
        }
        let ty = member_type(s, member.id, &generics)?.ty;
        if let TypeRef::Function(f) = ty {
            if let Some(first) = f.args.first() {
                if can_assign(s, &first.ty, value)? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn converts_to(s: &mut Session, value: &ClassType, target: &TypeRef) -> Result<bool, Fault> {
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(value.decl) else {
        return Ok(false);
    };
    let generics = GenericResolver::for_class(catalog, value);
    for tag in decl.to_casts() {
        let to = type_of_tag(s, tag, &generics)?.ty;
        if !to.is_unknown() && can_assign(s, target, &to)? {
            return Ok(true);
        }
    }
    for member in catalog.members_of(value.decl) {
        if member.kind != MemberKind::Method || !member.has_meta("to") {
            continue;
        }
        let ty = member_type(s, member.id, &generics)?.ty;
        if let TypeRef::Function(f) = ty {
            if can_assign(s, target, &f.ret)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Duck typing: every required field of a structure target exists on the
/// value with an assignable type.
fn structural(s: &mut Session, target: &TypeRef, value: &TypeRef) -> Result<bool, Fault> {
    let Some(t) = target.as_class() else {
        return Ok(false);
    };
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(t.decl) else {
        return Ok(false);
    };
    if !decl.is_structure() {
        return Ok(false);
    }
    if matches!(value, TypeRef::Function(_)) {
        return Ok(false);
    }
    // Fields brought in by `> Base` extensions are required too.
    let mut required = Vec::new();
    let mut owners = vec![t.clone()];
    owners.extend(direct_supertypes(s, t)?);
    for owner in &owners {
        let generics = GenericResolver::for_class(catalog, owner);
        for member in catalog.members_of(owner.decl) {
            if !member.optional {
                required.push((member, generics.clone()));
            }
        }
    }
    for (member, generics) in required {
        let Some(found) = find_member(s, value, &member.name)? else {
            return Ok(false);
        };
        let expected = member_type(s, member.id, &generics)?.ty;
        let actual = member_type(s, found.member, &found.generics)?.ty;
        if !can_assign(s, &expected, &actual)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSection;
    use crate::index::ProjectIndex;
    use crate::model::DeclarationCatalog;
    use crate::session::CancellationToken;

    #[test]
    fn typedef_cycles_met_while_comparing_are_recorded() {
        let mut index = ProjectIndex::new();
        index.add_file("Main.hx", "typedef A = B;\ntypedef B = A;\nclass C extends A {}\n");
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        let c = index.find_by_qualified_name("C").unwrap();
        let ty = TypeRef::Class(ClassType::new(c, "C", Vec::new()));
        assert_eq!(s.cycles(), 0);
        let set = compatible_types(&mut s, &ty).unwrap();
        assert_eq!(set, vec![ty.clone()]);
        assert!(s.cycles() > 0);
    }

    #[test]
    fn int_is_compatible_with_float() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        assert_eq!(
            compatible_types(&mut s, &TypeRef::int()).unwrap(),
            vec![TypeRef::int(), TypeRef::float()]
        );
    }
}
