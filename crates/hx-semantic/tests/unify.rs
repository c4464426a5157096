//! Integration tests for unification and assignability through the
//! public `Analyzer` entry points.

use hx_semantic::ty::ClassType;
use hx_semantic::{Analyzer, CancellationToken, DeclarationCatalog, ProjectIndex, TypeRef, UnifyRule};

fn analyzer() -> Analyzer<ProjectIndex> {
    Analyzer::new(ProjectIndex::with_prelude())
}

const HIERARCHY: &str = "interface I {}\ninterface J {}\nclass C implements I implements J {}\nclass D implements J implements I {}\nclass E extends C {}\n";

/// An analyzer over `HIERARCHY` and the class types it declares, by name.
fn hierarchy() -> (Analyzer<ProjectIndex>, Vec<(String, TypeRef)>) {
    let mut index = ProjectIndex::with_prelude();
    let file = index.add_file("Types.hx", HIERARCHY);
    let classes = index
        .declarations_in_file(file)
        .into_iter()
        .filter_map(|id| index.declaration(id))
        .map(|d| (d.name.clone(), TypeRef::Class(ClassType::new(d.id, d.name.clone(), Vec::new()))))
        .collect();
    (Analyzer::new(index), classes)
}

fn class<'c>(classes: &'c [(String, TypeRef)], name: &str) -> &'c TypeRef {
    classes
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, t)| t)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn samples() -> Vec<TypeRef> {
    vec![
        TypeRef::int(),
        TypeRef::float(),
        TypeRef::string(),
        TypeRef::bool(),
        TypeRef::Void,
        TypeRef::Unknown,
    ]
}

// ── can_assign ─────────────────────────────────────────────────────────

#[test]
fn dynamic_accepts_and_is_accepted_by_everything() {
    let a = analyzer();
    let token = CancellationToken::new();
    let dynamic = TypeRef::dynamic();
    for ty in samples() {
        assert_eq!(a.can_assign(&dynamic, &ty, &token), Ok(true), "Dynamic <- {ty}");
        assert_eq!(a.can_assign(&ty, &dynamic, &token), Ok(true), "{ty} <- Dynamic");
    }
}

#[test]
fn int_widens_to_float_but_not_back() {
    let a = analyzer();
    let token = CancellationToken::new();
    assert_eq!(a.can_assign(&TypeRef::float(), &TypeRef::int(), &token), Ok(true));
    assert_eq!(a.can_assign(&TypeRef::int(), &TypeRef::float(), &token), Ok(false));
    assert_eq!(a.can_assign(&TypeRef::string(), &TypeRef::int(), &token), Ok(false));
}

#[test]
fn void_only_takes_void() {
    let a = analyzer();
    let token = CancellationToken::new();
    assert_eq!(a.can_assign(&TypeRef::Void, &TypeRef::Void, &token), Ok(true));
    assert_eq!(a.can_assign(&TypeRef::Void, &TypeRef::int(), &token), Ok(false));
}

// ── unify ──────────────────────────────────────────────────────────────

#[test]
fn unify_is_reflexive() {
    let a = analyzer();
    let token = CancellationToken::new();
    for ty in samples() {
        assert_eq!(a.unify(&ty, &ty, UnifyRule::Default, &token), Ok(ty.without_constant()));
    }
}

#[test]
fn unify_is_symmetric_under_the_default_rule() {
    let a = analyzer();
    let token = CancellationToken::new();
    let types = samples();
    for x in &types {
        for y in &types {
            let xy = a.unify(x, y, UnifyRule::Default, &token).unwrap();
            let yx = a.unify(y, x, UnifyRule::Default, &token).unwrap();
            assert_eq!(xy, yx, "unify({x}, {y})");
        }
    }
}

#[test]
fn unify_of_class_types_is_symmetric() {
    let (a, classes) = hierarchy();
    let token = CancellationToken::new();
    let mut types: Vec<TypeRef> = classes.iter().map(|(_, t)| t.clone()).collect();
    types.extend(samples());
    for x in &types {
        for y in &types {
            let xy = a.unify(x, y, UnifyRule::Default, &token).unwrap();
            let yx = a.unify(y, x, UnifyRule::Default, &token).unwrap();
            assert_eq!(xy, yx, "unify({x}, {y})");
        }
    }
}

#[test]
fn equally_near_interfaces_pick_the_first_declared() {
    let (a, classes) = hierarchy();
    let token = CancellationToken::new();
    let (c, d) = (class(&classes, "C"), class(&classes, "D"));
    let cd = a.unify(c, d, UnifyRule::Default, &token).unwrap();
    assert_eq!(cd.to_string(), "I");
    let e = class(&classes, "E");
    assert_eq!(a.unify(e, c, UnifyRule::Default, &token).unwrap().to_string(), "C");
}

#[test]
fn numeric_types_meet_at_float() {
    let a = analyzer();
    let token = CancellationToken::new();
    assert_eq!(
        a.unify(&TypeRef::int(), &TypeRef::float(), UnifyRule::Default, &token),
        Ok(TypeRef::float())
    );
}

#[test]
fn void_rules_differ() {
    let a = analyzer();
    let token = CancellationToken::new();
    let int = TypeRef::int();
    assert_eq!(a.unify(&int, &TypeRef::Void, UnifyRule::Default, &token), Ok(int.clone()));
    assert_eq!(a.unify(&int, &TypeRef::Void, UnifyRule::IgnoreVoid, &token), Ok(int.clone()));
    assert_eq!(
        a.unify(&int, &TypeRef::Void, UnifyRule::PreferVoid, &token),
        Ok(TypeRef::Void)
    );
}

#[test]
fn unrelated_types_have_no_common_type() {
    let a = analyzer();
    let token = CancellationToken::new();
    assert_eq!(
        a.unify(&TypeRef::string(), &TypeRef::bool(), UnifyRule::Default, &token),
        Ok(TypeRef::Unknown)
    );
}
