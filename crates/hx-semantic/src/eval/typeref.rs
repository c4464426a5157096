//! Types written in source: tags, `new` targets, casts, supertypes.

use hx_parser::ast::ty::{FunctionType as AstFunctionType, PathType, TypeRef as AstType};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use crate::error::Fault;
use crate::generics::{GenericResolver, Provenance};
use crate::model::{DeclId, DeclShape, HasGenerics, TypeTag};
use crate::resolve::imports::find_type;
use crate::resolve::scope::generic_param_in_scope;
use crate::session::{GuardKey, Session, Typed};
use crate::ty::{ClassType, FnArg, Primitive, TypeRef};

/// The type an annotation denotes.
pub fn type_of_tag(s: &mut Session, tag: &TypeTag, generics: &GenericResolver) -> Result<Typed, Fault> {
    let node = s.node(&tag.ptr)?;
    type_from_syntax(s, &node, generics)
}

/// Evaluate a type node (`PATH_TYPE`, `ANON_TYPE`, `FUNCTION_TYPE`,
/// `PAREN_TYPE` or a `TYPE_TAG` around one).
pub fn type_from_syntax(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    s.step()?;
    if node.kind() == SyntaxKind::TYPE_TAG {
        return match node.children().find(|c| c.kind().is_type()) {
            Some(inner) => type_from_syntax(s, &inner, generics),
            None => Ok(Typed::unknown()),
        };
    }
    let Some(ty) = AstType::cast(node.clone()) else {
        return Ok(Typed::unknown());
    };
    match ty {
        AstType::Path(path) => path_type(s, &path, generics),
        AstType::Paren(paren) => match paren.inner() {
            Some(inner) => type_from_syntax(s, inner.syntax(), generics),
            None => Ok(Typed::unknown()),
        },
        AstType::Function(func) => function_type(s, &func, generics),
        AstType::Anon(anon) => {
            let Some(ptr) = s.ptr(anon.syntax()) else {
                return Ok(Typed::unknown());
            };
            let Some(decl_id) = s.catalog.declaration_at(&ptr) else {
                return Ok(Typed::unknown());
            };
            Ok(Typed::new(TypeRef::Class(structure_type(s, decl_id, generics))))
        }
    }
}

/// The class type of a structure declaration as seen under `generics`.
fn structure_type(s: &mut Session, decl_id: DeclId, generics: &GenericResolver) -> ClassType {
    let catalog = s.catalog;
    let (name, args) = match catalog.declaration(decl_id) {
        Some(decl) => (
            decl.name.clone(),
            decl.generic_params()
                .iter()
                .map(|p| {
                    generics
                        .lookup(&p.name)
                        .cloned()
                        .unwrap_or_else(|| TypeRef::param(p.name.clone()))
                })
                .collect(),
        ),
        None => (String::from("{ }"), Vec::new()),
    };
    ClassType::new(decl_id, name, args)
}

fn function_type(
    s: &mut Session,
    func: &AstFunctionType,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let mut cacheable = true;
    let mut args = Vec::new();
    if !func.is_nullary() {
        for arg in func.args() {
            let ty = match arg.ty() {
                Some(t) => type_from_syntax(s, t.syntax(), generics)?,
                None => Typed::unknown(),
            };
            cacheable &= ty.cacheable;
            args.push(FnArg {
                name: arg.name().map(|n| n.text()),
                optional: arg.is_optional(),
                rest: arg.is_rest(),
                ty: ty.ty,
            });
        }
    }
    let ret = match func.return_type() {
        Some(t) => type_from_syntax(s, t.syntax(), generics)?,
        None => Typed::unknown(),
    };
    cacheable &= ret.cacheable;
    Ok(Typed {
        ty: TypeRef::function(args, ret.ty),
        cacheable,
    })
}

fn path_type(s: &mut Session, path: &PathType, generics: &GenericResolver) -> Result<Typed, Fault> {
    let name = path.name();
    let mut cacheable = true;
    let mut args = Vec::new();
    for arg in path.generic_args() {
        let ty = type_from_syntax(s, arg.syntax(), generics)?;
        cacheable &= ty.cacheable;
        args.push(ty.ty);
    }

    if !name.contains('.') {
        if let Some(bound) = generics.lookup(&name) {
            return Ok(Typed {
                ty: bound.clone(),
                cacheable,
            });
        }
        if let Some(param) = generic_param_in_scope(path.syntax(), &name) {
            return Ok(Typed {
                ty: type_parameter(s, &param, &name, generics)?,
                cacheable,
            });
        }
        match name.as_str() {
            "Void" => return Ok(Typed::new(TypeRef::Void)),
            "Dynamic" => return Ok(Typed::new(TypeRef::dynamic())),
            _ => {}
        }
        if let Some(p) = Primitive::from_name(&name) {
            return Ok(Typed::new(TypeRef::Primitive(p, None)));
        }
    }

    let Some(decl_id) = find_type(s, path.syntax(), &name)? else {
        log::trace!("unresolved type name {name}");
        return Ok(Typed {
            ty: TypeRef::Unknown,
            cacheable,
        });
    };
    let mut typed = decl_type(s, decl_id, args)?;
    typed.cacheable &= cacheable;
    Ok(typed)
}

/// An unbound generic parameter, with its first constraint.
fn type_parameter(
    s: &mut Session,
    param: &SyntaxNode,
    name: &str,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    let constraint_node = param.children().find(|c| c.kind().is_type());
    let constraint = match constraint_node {
        Some(node) => {
            // `T:Comparable<T>` must not expand `T` again.
            let mut inner = generics.clone();
            inner.add(name, TypeRef::param(name), Provenance::Method);
            let ty = type_from_syntax(s, &node, &inner)?.ty;
            (!ty.is_unknown()).then(|| Box::new(ty))
        }
        None => None,
    };
    Ok(TypeRef::TypeParameter {
        name: name.to_string(),
        constraint,
    })
}

/// The type a declaration denotes with the given arguments. Typedefs are
/// expanded; a cycle of typedefs gives `Unknown`.
pub fn decl_type(s: &mut Session, decl_id: DeclId, mut args: Vec<TypeRef>) -> Result<Typed, Fault> {
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(decl_id) else {
        return Ok(Typed::unknown());
    };
    let params = decl.generic_params();
    if args.len() < params.len() {
        args.resize(params.len(), TypeRef::Unknown);
    }
    let DeclShape::Typedef { target } = &decl.shape else {
        return Ok(Typed::new(TypeRef::Class(ClassType::new(
            decl_id,
            decl.name.clone(),
            args,
        ))));
    };
    let Some(target) = target.clone() else {
        return Ok(Typed::unknown());
    };
    let mut bindings = GenericResolver::new();
    for param in params {
        let arg = args.get(param.index).cloned().unwrap_or(TypeRef::Unknown);
        bindings.add(&param.name, arg, Provenance::Class);
    }
    let alias = decl.name.clone();
    s.guarded(
        GuardKey::Typedef(decl_id),
        Typed::uncached(TypeRef::Unknown),
        move |s| {
            let expanded = type_of_tag(s, &target, &bindings)?;
            Ok(expanded.map(|ty| match ty {
                // Structures keep the alias name for display.
                TypeRef::Class(mut ct)
                    if s.catalog.declaration(ct.decl).is_some_and(|d| d.is_structure()) =>
                {
                    ct.name = alias;
                    TypeRef::Class(ct)
                }
                other => other,
            }))
        },
    )
}

/// A declaration seen from inside itself: every generic parameter
/// unbound.
pub fn self_type(s: &Session, decl_id: DeclId) -> ClassType {
    match s.catalog.declaration(decl_id) {
        Some(decl) => ClassType::new(
            decl_id,
            decl.name.clone(),
            decl.generic_params()
                .iter()
                .map(|p| TypeRef::param(p.name.clone()))
                .collect(),
        ),
        None => ClassType::new(decl_id, "Unknown", Vec::new()),
    }
}

/// `Class<T>` / `Enum<T>` for a type name used as a value. Without the
/// prelude there is nothing to express it with.
pub fn decl_value_type(s: &mut Session, decl_id: DeclId) -> TypeRef {
    let catalog = s.catalog;
    let Some(decl) = catalog.declaration(decl_id) else {
        return TypeRef::Unknown;
    };
    let wrapper = if decl.is_enum() { "Enum" } else { "Class" };
    let Some(wrapper_id) = s.builtin(wrapper) else {
        return TypeRef::Unknown;
    };
    let inner = ClassType::new(decl_id, decl.name.clone(), Vec::new());
    TypeRef::Class(ClassType::new(
        wrapper_id,
        wrapper,
        vec![TypeRef::Class(inner)],
    ))
}

/// A prelude class instantiated with `args`, or `Unknown` without the
/// prelude.
pub fn builtin_type(s: &mut Session, name: &'static str, args: Vec<TypeRef>) -> TypeRef {
    match s.builtin(name) {
        Some(id) => TypeRef::Class(ClassType::new(id, name, args)),
        None => TypeRef::Unknown,
    }
}
