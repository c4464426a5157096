//! Generic parameter bindings.
//!
//! A [`GenericResolver`] maps generic parameter names to types for one
//! scope. Values are never mutated in place by the combinators; each returns
//! a new resolver, so a parent scope's bindings stay valid while a child
//! scope adds its own.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::compat;
use crate::error::Fault;
use crate::model::{DeclarationCatalog, HasGenerics};
use crate::session::Session;
use crate::ty::{ClassType, FnArg, FunctionType, TypeRef};

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// The generic arguments of a class type (`Box<Int>` binds `T`).
    Class,
    /// Declared on a method.
    Method,
    /// Bound from the arguments of a call.
    Inferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericEntry {
    pub name: String,
    pub ty: TypeRef,
    pub constraint: Option<TypeRef>,
    pub provenance: Provenance,
}

/// Ordered name-to-type bindings for one scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericResolver {
    entries: Vec<GenericEntry>,
}

impl GenericResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[GenericEntry] {
        &self.entries
    }

    /// Bindings for a class type: its declaration's parameters zipped with
    /// the type's arguments. Missing arguments bind to `Unknown`.
    pub fn for_class(catalog: &dyn DeclarationCatalog, ct: &ClassType) -> Self {
        let mut resolver = Self::new();
        let Some(decl) = catalog.declaration(ct.decl) else {
            return resolver;
        };
        for param in decl.generic_params() {
            let ty = ct.args.get(param.index).cloned().unwrap_or(TypeRef::Unknown);
            resolver.add(&param.name, ty, Provenance::Class);
        }
        resolver
    }

    /// The binding for `name`, `Unknown` when there is none.
    pub fn resolve(&self, name: &str) -> TypeRef {
        self.lookup(name).cloned().unwrap_or(TypeRef::Unknown)
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn resolve_constraint(&self, name: &str) -> Option<&TypeRef> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.constraint.as_ref())
    }

    /// Bind `name`, replacing any earlier binding of it.
    pub fn add(&mut self, name: &str, ty: TypeRef, provenance: Provenance) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.ty = ty;
            entry.provenance = provenance;
            return;
        }
        self.entries.push(GenericEntry {
            name: name.to_string(),
            ty,
            constraint: None,
            provenance,
        });
    }

    pub fn set_constraint(&mut self, name: &str, constraint: TypeRef) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.constraint = Some(constraint);
        } else {
            self.entries.push(GenericEntry {
                name: name.to_string(),
                ty: TypeRef::Unknown,
                constraint: Some(constraint),
                provenance: Provenance::Method,
            });
        }
    }

    /// Merge `other` into a copy of `self`. Entries already here win, the
    /// way an inner scope shadows an outer one.
    pub fn add_all(&self, other: &GenericResolver) -> GenericResolver {
        let mut merged = self.clone();
        for entry in &other.entries {
            if !merged.contains(&entry.name) {
                merged.entries.push(entry.clone());
            }
        }
        merged
    }

    pub fn without_unknowns(&self) -> GenericResolver {
        GenericResolver {
            entries: self
                .entries
                .iter()
                .filter(|e| !e.ty.is_unknown())
                .cloned()
                .collect(),
        }
    }

    pub fn without(&self, name: &str) -> GenericResolver {
        GenericResolver {
            entries: self
                .entries
                .iter()
                .filter(|e| e.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Substitute every bound type parameter in `ty`. Unbound parameters
    /// stay as they are; parameters bound to `Unknown` become `Unknown`.
    pub fn apply(&self, ty: &TypeRef) -> TypeRef {
        if self.entries.is_empty() || !ty.has_type_parameters() {
            return ty.clone();
        }
        match ty {
            TypeRef::TypeParameter { name, .. } => match self.lookup(name) {
                Some(bound) => bound.clone(),
                None => ty.clone(),
            },
            TypeRef::Class(ct) => TypeRef::Class(self.apply_class(ct)),
            TypeRef::Function(f) => TypeRef::Function(FunctionType {
                args: f
                    .args
                    .iter()
                    .map(|a| FnArg {
                        ty: self.apply(&a.ty),
                        ..a.clone()
                    })
                    .collect(),
                ret: Box::new(self.apply(&f.ret)),
            }),
            TypeRef::EnumValue {
                enum_type,
                ctor,
                args,
            } => TypeRef::EnumValue {
                enum_type: self.apply_class(enum_type),
                ctor: ctor.clone(),
                args: args.iter().map(|a| self.apply(a)).collect(),
            },
            other => other.clone(),
        }
    }

    pub fn apply_class(&self, ct: &ClassType) -> ClassType {
        ClassType {
            args: ct.args.iter().map(|a| self.apply(a)).collect(),
            ..ct.clone()
        }
    }

    /// Stable key for memo tables.
    pub fn fingerprint(&self) -> u64 {
        if self.entries.is_empty() {
            return 0;
        }
        let mut hasher = FxHasher::default();
        for entry in &self.entries {
            entry.name.hash(&mut hasher);
            entry.ty.hash(&mut hasher);
        }
        hasher.finish()
    }
}

// ── Call-site inference ──────────────────────────────────────────────────

/// Bind generic parameters by walking declared parameter types and actual
/// argument types in lock-step.
pub fn infer_from_args(
    s: &mut Session,
    params: &[TypeRef],
    args: &[TypeRef],
    resolver: &mut GenericResolver,
) -> Result<(), Fault> {
    for (param, arg) in params.iter().zip(args) {
        bind(s, param, arg, resolver)?;
    }
    Ok(())
}

/// Match one declared type against one actual type.
pub fn bind(
    s: &mut Session,
    declared: &TypeRef,
    actual: &TypeRef,
    resolver: &mut GenericResolver,
) -> Result<(), Fault> {
    s.step()?;
    if actual.is_unknown() || !declared.has_type_parameters() {
        return Ok(());
    }
    match declared {
        TypeRef::TypeParameter { name, constraint } => {
            bind_name(s, name, constraint.as_deref(), actual, resolver)?;
        }
        TypeRef::Class(dc) => {
            let actual = unwrap_null(s, actual);
            // `Null<T>` against a plain value binds `T` to the value.
            if let Some(inner) = null_inner(s, declared) {
                if !matches!(&actual, TypeRef::Class(ac) if s.is_builtin(ac.decl, "Null")) {
                    return bind(s, &inner, &actual, resolver);
                }
            }
            let actual_class = match &actual {
                TypeRef::Class(ac) => Some(ac.clone()),
                TypeRef::EnumValue { enum_type, .. } => Some(enum_type.clone()),
                _ => None,
            };
            let Some(ac) = actual_class else {
                return Ok(());
            };
            if ac.decl == dc.decl {
                for (d, a) in dc.args.iter().zip(&ac.args) {
                    bind(s, d, a, resolver)?;
                }
                return Ok(());
            }
            // A subtype of the declared class: find the matching supertype.
            let supers = compat::compatible_types(s, &TypeRef::Class(ac.clone()))?;
            if let Some(TypeRef::Class(sup)) = supers
                .iter()
                .find(|t| matches!(t, TypeRef::Class(c) if c.decl == dc.decl))
            {
                for (d, a) in dc.args.iter().zip(&sup.args) {
                    bind(s, d, a, resolver)?;
                }
                return Ok(());
            }
            // Structural: match fields of a structure type by name.
            bind_structure(s, dc, &ac, resolver)?;
        }
        TypeRef::Function(df) => {
            if let TypeRef::Function(af) = actual {
                for (d, a) in df.args.iter().zip(&af.args) {
                    bind(s, &d.ty, &a.ty, resolver)?;
                }
                bind(s, &df.ret, &af.ret, resolver)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn bind_name(
    s: &mut Session,
    name: &str,
    declared_constraint: Option<&TypeRef>,
    actual: &TypeRef,
    resolver: &mut GenericResolver,
) -> Result<(), Fault> {
    let candidate = actual.without_constant();
    let constraint = resolver
        .resolve_constraint(name)
        .cloned()
        .or_else(|| declared_constraint.cloned());
    if let Some(constraint) = constraint {
        let constraint = resolver.without(name).apply(&constraint);
        if !constraint.has_type_parameters()
            && !compat::can_assign(s, &constraint, &candidate)?
        {
            log::trace!("{candidate} rejected by constraint {constraint} of {name}");
            return Ok(());
        }
    }
    match resolver.lookup(name).cloned() {
        None => resolver.add(name, candidate, Provenance::Inferred),
        Some(old) if old.is_unknown() || old.has_type_parameters() => {
            resolver.add(name, candidate, Provenance::Inferred)
        }
        Some(old) => {
            // Narrow only: the new candidate must fit the old binding.
            if !old.same_type(&candidate) && compat::can_assign(s, &old, &candidate)? {
                resolver.add(name, candidate, Provenance::Inferred);
            }
        }
    }
    Ok(())
}

fn bind_structure(
    s: &mut Session,
    declared: &ClassType,
    actual: &ClassType,
    resolver: &mut GenericResolver,
) -> Result<(), Fault> {
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(declared.decl) else {
        return Ok(());
    };
    if !decl.is_structure() {
        return Ok(());
    }
    let declared_generics = GenericResolver::for_class(catalog, declared);
    for member in catalog.members_of(declared.decl) {
        let expected =
            crate::eval::members::member_type(s, member.id, &GenericResolver::new())?.ty;
        let expected = declared_generics.apply(&expected);
        let Some(found) =
            crate::eval::members::find_member(s, &TypeRef::Class(actual.clone()), &member.name)?
        else {
            continue;
        };
        let found_ty = crate::eval::members::member_type(s, found.member, &found.generics)?.ty;
        bind(s, &expected, &found_ty, resolver)?;
    }
    Ok(())
}

/// `T` for `Null<T>`.
pub fn null_inner(s: &mut Session, ty: &TypeRef) -> Option<TypeRef> {
    match ty {
        TypeRef::Class(ct) if s.is_builtin(ct.decl, "Null") => {
            Some(ct.args.first().cloned().unwrap_or(TypeRef::Unknown))
        }
        _ => None,
    }
}

/// Strip any number of `Null<...>` wrappers.
pub fn unwrap_null(s: &mut Session, ty: &TypeRef) -> TypeRef {
    let mut current = ty.clone();
    while let Some(inner) = null_inner(s, &current) {
        current = inner;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSection;
    use crate::index::ProjectIndex;
    use crate::model::DeclId;
    use crate::session::CancellationToken;

    fn boxed(arg: TypeRef) -> TypeRef {
        TypeRef::Class(ClassType::new(DeclId(0), "Box", vec![arg]))
    }

    #[test]
    fn absent_names_resolve_to_unknown() {
        let resolver = GenericResolver::new();
        assert_eq!(resolver.resolve("T"), TypeRef::Unknown);
        assert!(resolver.lookup("T").is_none());
    }

    #[test]
    fn add_all_keeps_existing_entries() {
        let mut inner = GenericResolver::new();
        inner.add("T", TypeRef::int(), Provenance::Method);
        let mut outer = GenericResolver::new();
        outer.add("T", TypeRef::string(), Provenance::Class);
        outer.add("U", TypeRef::bool(), Provenance::Class);
        let merged = inner.add_all(&outer);
        assert_eq!(merged.resolve("T"), TypeRef::int());
        assert_eq!(merged.resolve("U"), TypeRef::bool());
        // The inputs are untouched.
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn without_and_without_unknowns() {
        let mut r = GenericResolver::new();
        r.add("T", TypeRef::Unknown, Provenance::Inferred);
        r.add("U", TypeRef::int(), Provenance::Inferred);
        assert!(!r.without_unknowns().contains("T"));
        assert!(r.without_unknowns().contains("U"));
        assert!(!r.without("U").contains("U"));
    }

    #[test]
    fn apply_substitutes_nested_parameters() {
        let mut r = GenericResolver::new();
        r.add("T", TypeRef::int(), Provenance::Class);
        let f = TypeRef::function(
            vec![FnArg::positional(TypeRef::param("T"))],
            boxed(TypeRef::param("T")),
        );
        assert_eq!(r.apply(&f).to_string(), "(Int) -> Box<Int>");
        assert_eq!(r.apply(&TypeRef::param("U")), TypeRef::param("U"));
    }

    #[test]
    fn constraints_are_kept_per_name() {
        let mut r = GenericResolver::new();
        r.set_constraint("T", TypeRef::string());
        assert_eq!(r.resolve_constraint("T"), Some(&TypeRef::string()));
        assert_eq!(r.resolve("T"), TypeRef::Unknown);
    }

    #[test]
    fn fingerprint_tracks_bindings() {
        let mut a = GenericResolver::new();
        assert_eq!(a.fingerprint(), 0);
        a.add("T", TypeRef::int(), Provenance::Class);
        let mut b = GenericResolver::new();
        b.add("T", TypeRef::string(), Provenance::Class);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn fingerprint_tells_same_named_declarations_apart() {
        let foo = |decl| TypeRef::Class(ClassType::new(DeclId(decl), "Foo", Vec::new()));
        let mut a = GenericResolver::new();
        a.add("T", foo(1), Provenance::Class);
        let mut b = GenericResolver::new();
        b.add("T", foo(2), Provenance::Class);
        assert_eq!(a.resolve("T").to_string(), b.resolve("T").to_string());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn bindings_narrow_but_never_widen() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        let mut r = GenericResolver::new();
        let t = TypeRef::param("T");
        bind(&mut s, &t, &TypeRef::float(), &mut r).unwrap();
        assert_eq!(r.resolve("T"), TypeRef::float());
        bind(&mut s, &t, &TypeRef::int(), &mut r).unwrap();
        assert_eq!(r.resolve("T"), TypeRef::int());
        bind(&mut s, &t, &TypeRef::string(), &mut r).unwrap();
        assert_eq!(r.resolve("T"), TypeRef::int());
        assert_eq!(r.entries()[0].provenance, Provenance::Inferred);
    }

    #[test]
    fn constraints_reject_unfit_candidates() {
        let index = ProjectIndex::new();
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        let constrained = TypeRef::TypeParameter {
            name: "T".into(),
            constraint: Some(Box::new(TypeRef::float())),
        };
        let mut r = GenericResolver::new();
        bind(&mut s, &constrained, &TypeRef::string(), &mut r).unwrap();
        assert!(r.lookup("T").is_none());
        bind(&mut s, &constrained, &TypeRef::int(), &mut r).unwrap();
        assert_eq!(r.resolve("T"), TypeRef::int());

        // A constraint recorded on the resolver applies too.
        let mut r = GenericResolver::new();
        r.set_constraint("U", TypeRef::string());
        bind(&mut s, &TypeRef::param("U"), &TypeRef::bool(), &mut r).unwrap();
        assert_eq!(r.resolve("U"), TypeRef::Unknown);
        bind(&mut s, &TypeRef::param("U"), &TypeRef::string(), &mut r).unwrap();
        assert_eq!(r.resolve("U"), TypeRef::string());
    }
}
