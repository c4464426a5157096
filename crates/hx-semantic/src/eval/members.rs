//! Member lookup and member types.

use std::collections::VecDeque;

use hx_parser::ast::expr::FieldAccess;
use hx_parser::ast::AstNode;
use hx_parser::SyntaxNode;
use rustc_hash::FxHashSet;

use super::evaluate;
use super::flow::infer_return;
use super::typeref::{decl_type, self_type, type_of_tag};
use super::usage::{is_vague, type_from_usage};
use crate::compat::{can_assign, direct_supertypes};
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::model::{DeclId, MemberId, MemberKind, Param};
use crate::resolve::{resolve, Target};
use crate::session::{GuardKey, Session, Typed};
use crate::ty::{ClassType, FnArg, TypeRef};

/// A member found on a type, with the bindings of the class that declares
/// it as seen from the receiver (`T = Int` for `get` on `Box<Int>`).
#[derive(Debug, Clone, PartialEq)]
pub struct FoundMember {
    pub member: MemberId,
    pub owner: ClassType,
    pub generics: GenericResolver,
}

/// The class a value's members come from: primitives map to their prelude
/// declarations, enum values to their enum.
pub(crate) fn class_of(s: &mut Session, ty: &TypeRef) -> Option<ClassType> {
    match ty {
        TypeRef::Primitive(p, _) => {
            let name = p.name();
            s.builtin(name).map(|id| ClassType::new(id, name, Vec::new()))
        }
        TypeRef::Class(ct) => Some(ct.without_constant()),
        TypeRef::EnumValue { enum_type, .. } => Some(enum_type.clone()),
        _ => None,
    }
}

/// Find `name` on `receiver`, walking superclasses and interfaces
/// breadth-first and following `@:forward` into an abstract's underlying
/// type.
pub fn find_member(
    s: &mut Session,
    receiver: &TypeRef,
    name: &str,
) -> Result<Option<FoundMember>, Fault> {
    let receiver = unwrap_null(s, receiver);
    let Some(start) = class_of(s, &receiver) else {
        return Ok(None);
    };
    let catalog = s.catalog;
    let mut seen: FxHashSet<DeclId> = FxHashSet::default();
    seen.insert(start.decl);
    let mut queue = VecDeque::from([start]);
    while let Some(ct) = queue.pop_front() {
        s.step()?;
        if let Some(member) = catalog
            .members_of(ct.decl)
            .into_iter()
            .find(|m| m.name == name)
        {
            let generics = GenericResolver::for_class(catalog, &ct);
            return Ok(Some(FoundMember {
                member: member.id,
                owner: ct,
                generics,
            }));
        }
        let supers = s.guarded(GuardKey::Supertypes(ct.decl), Vec::new(), |s| {
            direct_supertypes(s, &ct)
        })?;
        for sup in supers {
            if seen.insert(sup.decl) {
                queue.push_back(sup);
            }
        }
        let Some(decl) = catalog.declaration(ct.decl) else {
            continue;
        };
        if let (true, Some(tag)) = (decl.forwards(name), decl.underlying()) {
            let generics = GenericResolver::for_class(catalog, &ct);
            let underlying = type_of_tag(s, tag, &generics)?.ty;
            let underlying = unwrap_null(s, &underlying);
            if let Some(uc) = class_of(s, &underlying) {
                if seen.insert(uc.decl) {
                    queue.push_back(uc);
                }
            }
        }
    }
    Ok(None)
}

/// A member declared directly on `decl`, statics first.
pub(crate) fn find_static(s: &Session, decl: DeclId, name: &str) -> Option<MemberId> {
    let members = s.catalog.members_of(decl);
    members
        .iter()
        .find(|m| m.name == name && m.is_static())
        .or_else(|| members.iter().find(|m| m.name == name))
        .map(|m| m.id)
}

/// A constructor of an enum, or a value of an enum abstract.
pub(crate) fn enum_member(s: &Session, ty: &TypeRef, name: &str) -> Option<MemberId> {
    let ct = ty.as_class().or_else(|| ty.enum_class())?;
    let catalog = s.catalog;
    let decl = catalog.declaration(ct.decl)?;
    if !decl.is_enum() && !decl.is_enum_abstract() {
        return None;
    }
    catalog
        .members_of(ct.decl)
        .into_iter()
        .find(|m| {
            m.name == name
                && (m.kind == MemberKind::EnumCtor || (m.kind == MemberKind::Field && m.is_static()))
        })
        .map(|m| m.id)
}

// ── Member types ─────────────────────────────────────────────────────────

/// The type of a member under `generics`: a field's type, a method's
/// function type, or an enum constructor's function type (a plain enum
/// value when it takes no arguments).
pub fn member_type(
    s: &mut Session,
    id: MemberId,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    s.guarded(
        GuardKey::Member(id),
        Typed::uncached(TypeRef::Unknown),
        |s| compute_member_type(s, id, generics),
    )
}

fn compute_member_type(
    s: &mut Session,
    id: MemberId,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let catalog = s.catalog;
    let Some(member) = catalog.member(id) else {
        return Ok(Typed::unknown());
    };
    let owner = catalog.declaration(member.owner);
    match member.kind {
        MemberKind::Field => {
            if let Some(tag) = &member.type_tag {
                return type_of_tag(s, tag, generics);
            }
            if member.is_static() && owner.is_some_and(|d| d.is_enum_abstract()) {
                let own = TypeRef::Class(self_type(s, member.owner));
                return Ok(Typed::new(generics.apply(&own)));
            }
            let typed = match member.body {
                Some(body) => {
                    let node = s.node(&body)?;
                    evaluate(s, &node, generics)?
                }
                None => Typed::unknown(),
            };
            let keep_constant = member.modifiers.is_final || member.modifiers.is_inline;
            let typed = typed.map(|ty| if keep_constant { ty } else { ty.without_constant() });
            if is_vague(s, &typed.ty) {
                let field = s.node(&member.ptr)?;
                if let Some(found) = type_from_usage(s, &field, generics)? {
                    return Ok(found);
                }
            }
            Ok(typed)
        }
        MemberKind::Method => {
            let mut typed = Typed::unknown();
            let mut args = Vec::with_capacity(member.params.len());
            for param in &member.params {
                let (arg, arg_cacheable) = param_arg(s, param, generics)?;
                typed.cacheable &= arg_cacheable;
                args.push(arg);
            }
            let ret = if member.is_constructor() {
                Typed::new(TypeRef::Void)
            } else if let Some(tag) = &member.type_tag {
                type_of_tag(s, tag, generics)?
            } else {
                let node = s.node(&member.ptr)?;
                infer_return(s, &node, generics)?
            };
            typed.absorb(&ret);
            typed.ty = TypeRef::function(args, ret.ty);
            Ok(typed)
        }
        MemberKind::EnumCtor => {
            let TypeRef::Class(enum_type) = generics.apply(&TypeRef::Class(self_type(s, member.owner)))
            else {
                return Ok(Typed::unknown());
            };
            if member.params.is_empty() {
                return Ok(Typed::new(TypeRef::EnumValue {
                    enum_type,
                    ctor: member.name.clone(),
                    args: Vec::new(),
                }));
            }
            let mut typed = Typed::unknown();
            let mut args = Vec::with_capacity(member.params.len());
            for param in &member.params {
                let (arg, arg_cacheable) = param_arg(s, param, generics)?;
                typed.cacheable &= arg_cacheable;
                args.push(arg);
            }
            typed.ty = TypeRef::function(args, TypeRef::Class(enum_type));
            Ok(typed)
        }
    }
}

/// A declared parameter as a function argument: its annotation, else the
/// type of its default value, else what its uses in the body say.
pub(crate) fn param_arg(
    s: &mut Session,
    param: &Param,
    generics: &GenericResolver,
) -> Result<(FnArg, bool), Fault> {
    let typed = if let Some(tag) = &param.type_tag {
        type_of_tag(s, tag, generics)?
    } else if let Some(default) = param.default {
        let node = s.node(&default)?;
        evaluate(s, &node, generics)?.map(|ty| ty.without_constant())
    } else if param.rest {
        Typed::unknown()
    } else {
        let node = s.node(&param.ptr)?;
        type_from_usage(s, &node, generics)?.unwrap_or_else(Typed::unknown)
    };
    Ok((
        FnArg {
            name: Some(param.name.clone()),
            optional: param.optional,
            rest: param.rest,
            ty: typed.ty,
        },
        typed.cacheable,
    ))
}

// ── Static extensions ────────────────────────────────────────────────────

/// A static method brought in by `using` (or `@:using` on the receiver's
/// type) whose first parameter accepts `receiver`. Later `using`
/// declarations shadow earlier ones.
pub(crate) fn find_extension(
    s: &mut Session,
    context: &SyntaxNode,
    receiver: &TypeRef,
    name: &str,
) -> Result<Option<MemberId>, Fault> {
    let catalog = s.catalog;
    let mut sources: Vec<DeclId> = Vec::new();
    let unwrapped = unwrap_null(s, receiver);
    if let Some(ct) = class_of(s, &unwrapped) {
        if let Some(meta) = catalog.declaration(ct.decl).and_then(|d| d.meta("using")) {
            sources.extend(meta.args.iter().filter_map(|a| catalog.find_by_qualified_name(a)));
        }
    }
    if let Some(file) = s.file_of(context).and_then(|f| catalog.file(f)) {
        for path in file.usings.iter().rev() {
            let Some(decl) = catalog.find_by_qualified_name(path) else {
                continue;
            };
            sources.push(decl);
            // A module brings all of its types.
            if let Some(module_file) = catalog.declaration(decl).map(|d| d.file) {
                sources.extend(
                    catalog
                        .declarations_in_file(module_file)
                        .into_iter()
                        .filter(|d| *d != decl),
                );
            }
        }
    }
    for source in sources {
        for member in catalog.members_of(source) {
            if member.name != name || !member.is_static() || member.kind != MemberKind::Method {
                continue;
            }
            let Some(first) = member.params.first() else {
                continue;
            };
            let (arg, _) = param_arg(s, first, &GenericResolver::new())?;
            if can_assign(s, &arg.ty, receiver)? {
                return Ok(Some(member.id));
            }
        }
    }
    Ok(None)
}

// ── Field access ─────────────────────────────────────────────────────────

/// What `receiver.name` refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLookup {
    pub target: Option<Target>,
    /// Bindings to type the target with.
    pub generics: GenericResolver,
    /// Type of the receiver expression; `None` when it names a type or
    /// package.
    pub receiver: Option<TypeRef>,
    /// Set when the target is a static extension called on the receiver.
    pub extension: bool,
    pub cacheable: bool,
}

impl FieldLookup {
    fn found(target: Target) -> Self {
        Self {
            target: Some(target),
            generics: GenericResolver::new(),
            receiver: None,
            extension: false,
            cacheable: true,
        }
    }

    fn nothing(cacheable: bool) -> Self {
        Self {
            target: None,
            generics: GenericResolver::new(),
            receiver: None,
            extension: false,
            cacheable,
        }
    }
}

/// A static member of a type used by name, or a type of the same module.
fn static_of(s: &mut Session, decl: DeclId, name: &str) -> Result<Option<Target>, Fault> {
    let catalog = s.catalog;
    // `typedef Alias = Real` gives access to the statics of `Real`.
    let decl = match decl_type(s, decl, Vec::new())?.ty {
        TypeRef::Class(ct) => ct.decl,
        _ => decl,
    };
    if let Some(member) = find_static(s, decl, name) {
        return Ok(Some(Target::Member(member)));
    }
    let Some(owner) = catalog.declaration(decl) else {
        return Ok(None);
    };
    if owner.module == owner.name {
        let sub = catalog
            .declarations_in_file(owner.file)
            .into_iter()
            .find(|d| catalog.declaration(*d).is_some_and(|d| d.name == name));
        return Ok(sub.map(Target::Decl));
    }
    Ok(None)
}

/// Resolve the field of a `FIELD_ACCESS` node.
pub fn lookup_field(
    s: &mut Session,
    access: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<FieldLookup, Fault> {
    let Some(fa) = FieldAccess::cast(access.clone()) else {
        return Ok(FieldLookup::nothing(true));
    };
    let (Some(receiver), Some(field)) = (fa.receiver(), fa.field()) else {
        return Ok(FieldLookup::nothing(true));
    };
    let name = field.text();
    let receiver = receiver.syntax().clone();
    let catalog = s.catalog;

    if matches!(
        receiver.kind(),
        hx_parser::SyntaxKind::NAME_REF | hx_parser::SyntaxKind::FIELD_ACCESS
    ) {
        let named = if receiver.kind() == hx_parser::SyntaxKind::NAME_REF {
            resolve(s, &receiver, generics)?.targets.into_iter().next()
        } else {
            lookup_field(s, &receiver, generics)?
                .target
                .filter(|t| matches!(t, Target::Decl(_) | Target::Package(_)))
        };
        match named {
            Some(Target::Decl(decl)) => {
                return Ok(match static_of(s, decl, &name)? {
                    Some(target) => FieldLookup::found(target),
                    None => FieldLookup::nothing(true),
                });
            }
            Some(Target::Package(package)) => {
                let qualified = format!("{package}.{name}");
                if let Some(decl) = catalog.find_by_qualified_name(&qualified) {
                    return Ok(FieldLookup::found(Target::Decl(decl)));
                }
                if catalog.is_package(&qualified) {
                    return Ok(FieldLookup::found(Target::Package(qualified)));
                }
                return Ok(FieldLookup::nothing(true));
            }
            _ => {}
        }
    }

    let typed = evaluate(s, &receiver, generics)?;
    let ty = unwrap_null(s, &typed.ty);

    // A `Class<T>` or `Enum<T>` value gives access to the statics of `T`.
    if let TypeRef::Class(ct) = &ty {
        if s.is_builtin(ct.decl, "Class") || s.is_builtin(ct.decl, "Enum") {
            if let Some(TypeRef::Class(inner)) = ct.args.first() {
                if let Some(member) = find_static(s, inner.decl, &name) {
                    let mut lookup = FieldLookup::found(Target::Member(member));
                    lookup.cacheable = typed.cacheable;
                    return Ok(lookup);
                }
            }
        }
    }

    if let Some(found) = find_member(s, &ty, &name)? {
        return Ok(FieldLookup {
            target: Some(Target::Member(found.member)),
            generics: found.generics,
            receiver: Some(ty),
            extension: false,
            cacheable: typed.cacheable,
        });
    }
    if !ty.is_unknown() && !ty.is_dynamic() {
        if let Some(member) = find_extension(s, access, &ty, &name)? {
            return Ok(FieldLookup {
                target: Some(Target::Member(member)),
                generics: GenericResolver::new(),
                receiver: Some(ty),
                extension: true,
                cacheable: typed.cacheable,
            });
        }
    }
    let mut nothing = FieldLookup::nothing(typed.cacheable);
    nothing.receiver = Some(ty);
    Ok(nothing)
}
