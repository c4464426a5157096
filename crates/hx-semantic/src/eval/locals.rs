//! Names in expressions and the types of what they resolve to.

use hx_parser::ast::expr::{CatchClause, VarDecl};
use hx_parser::ast::item::Param as AstParam;
use hx_parser::ast::AstNode;
use hx_parser::SyntaxNode;

use super::expect::lambda_param_type;
use super::flow::{for_var_type, function_literal};
use super::members::{find_member, member_type};
use super::patterns::pattern_expected;
use super::typeref::{builtin_type, decl_value_type, type_from_syntax};
use super::usage::{is_vague, type_from_usage};
use super::{evaluate, evaluate_opt};
use crate::error::Fault;
use crate::generics::GenericResolver;
use crate::model::MemberKind;
use crate::resolve::{is_field_of, resolve, scope, LocalBinding, LocalKind, Target};
use crate::session::{Session, Typed};
use crate::ty::TypeRef;

/// A `NAME_REF` in expression position.
pub(crate) fn name_ref(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    // The field name of `a.b` has the type of the whole access.
    if let Some(access) = node.parent().filter(|p| is_field_of(node, p)) {
        return evaluate(s, &access, generics);
    }
    let resolution = resolve(s, node, generics)?;
    let Some(target) = resolution.targets.first() else {
        return Ok(Typed {
            ty: TypeRef::Unknown,
            cacheable: resolution.cacheable,
        });
    };
    let mut typed = type_of_target(s, node, target, generics)?;
    typed.cacheable &= resolution.cacheable;
    Ok(typed)
}

/// A declaring `NAME`: the type of what it declares.
pub(crate) fn declared_name(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let resolution = resolve(s, node, generics)?;
    match resolution.targets.first() {
        Some(Target::Decl(_)) => Ok(Typed::unknown()),
        Some(target) => type_of_target(s, node, target, generics),
        None => Ok(Typed::unknown()),
    }
}

/// The type of a resolved target, seen from `context`.
pub fn type_of_target(
    s: &mut Session,
    context: &SyntaxNode,
    target: &Target,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    match target {
        Target::Decl(decl) => Ok(Typed::new(decl_value_type(s, *decl))),
        Target::Member(id) => member_in_context(s, context, *id, generics),
        Target::Local(binding) => local_type(s, binding, generics),
        Target::GenericParam { name, .. } => Ok(Typed::new(generics.apply(&TypeRef::param(name.clone())))),
        Target::Package(_) => Ok(Typed::unknown()),
    }
}

/// A member named without a receiver. Inherited members see the bindings
/// the enclosing class gives its supertypes.
fn member_in_context(
    s: &mut Session,
    context: &SyntaxNode,
    id: crate::model::MemberId,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let catalog = s.catalog;
    let Some(member) = catalog.member(id) else {
        return Ok(Typed::unknown());
    };
    if member.is_static() || member.kind == MemberKind::EnumCtor {
        return member_type(s, id, &GenericResolver::new());
    }
    match scope::enclosing_decl(s, context) {
        Some(decl) if decl == member.owner => member_type(s, id, generics),
        Some(_) => {
            let this = scope::this_type(s, context, generics)?;
            match find_member(s, &this, &member.name)? {
                Some(found) if found.member == id => {
                    let bindings = found.generics.add_all(generics);
                    member_type(s, id, &bindings)
                }
                _ => member_type(s, id, generics),
            }
        }
        None => member_type(s, id, generics),
    }
}

/// The type of a local binding.
pub fn local_type(
    s: &mut Session,
    binding: &LocalBinding,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let owner = s.node(&binding.owner_ptr)?;
    match binding.kind {
        LocalKind::Var => var_type(s, &owner, generics),
        LocalKind::Param => param_type(s, &owner, generics),
        LocalKind::Function => function_literal(s, &owner, generics),
        LocalKind::PatternCapture => Ok(match pattern_expected(s, &owner, generics)? {
            Some(ty) => Typed::new(ty),
            None => Typed::unknown(),
        }),
        LocalKind::ForVar => {
            let name = s.node(&binding.name_ptr)?;
            let is_key = hx_parser::ast::expr::ForHead::cast(owner.clone())
                .and_then(|head| head.key())
                .is_some_and(|key| key.syntax() == &name);
            for_var_type(s, &owner, is_key, generics)
        }
        LocalKind::CatchVar => {
            let tag = CatchClause::cast(owner).and_then(|c| c.type_tag());
            match tag {
                Some(tag) => type_from_syntax(s, tag.syntax(), generics),
                None => Ok(Typed::new(TypeRef::dynamic())),
            }
        }
    }
}

/// A `var`: its annotation, else its initializer, else what later uses
/// say about it.
fn var_type(s: &mut Session, decl: &SyntaxNode, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(var) = VarDecl::cast(decl.clone()) else {
        return Ok(Typed::unknown());
    };
    if let Some(tag) = var.type_tag() {
        return type_from_syntax(s, tag.syntax(), generics);
    }
    let init = evaluate_opt(s, var.initializer(), generics)?;
    // Only `final` keeps a literal's value.
    let init = if var.is_final() {
        init
    } else {
        init.map(|ty| ty.without_constant())
    };
    if is_vague(s, &init.ty) {
        if let Some(found) = type_from_usage(s, decl, generics)? {
            return Ok(found);
        }
    }
    Ok(init)
}

/// A parameter: its annotation, else its default value, else the type the
/// surrounding call gives a lambda at that position, else what its uses in
/// the body say.
fn param_type(s: &mut Session, param: &SyntaxNode, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(p) = AstParam::cast(param.clone()) else {
        return Ok(Typed::unknown());
    };
    let typed = if let Some(tag) = p.type_tag() {
        type_from_syntax(s, tag.syntax(), generics)?
    } else if let Some(default) = p.default_value() {
        evaluate(s, default.syntax(), generics)?.map(|ty| ty.without_constant())
    } else {
        let expected = lambda_param_type(s, param, generics)?;
        if expected.ty.is_unknown() && !p.is_rest() {
            if let Some(found) = type_from_usage(s, param, generics)? {
                return Ok(found);
            }
        }
        expected
    };
    // `...rest:T` is an array of `T` inside the body.
    if p.is_rest() && !typed.ty.is_unknown() {
        let array = builtin_type(s, "Array", vec![typed.ty.clone()]);
        if !array.is_unknown() {
            return Ok(typed.map(|_| array));
        }
    }
    Ok(typed)
}
