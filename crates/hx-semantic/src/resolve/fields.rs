//! Fields reached through a receiver, property accessors, and constructor
//! names implied by the expected type.

use hx_parser::{SyntaxKind, SyntaxNode};

use super::{call_of_callee, is_bare, is_field_of, starts_uppercase, switch, Ctx, Resolution, Target};
use crate::error::Fault;
use crate::eval::expect::expected_type;
use crate::eval::members::{enum_member, find_member, lookup_field};
use crate::eval::typeref::self_type;
use crate::generics::unwrap_null;
use crate::session::Session;
use crate::ty::TypeRef;

/// `Red` where a `Color` is expected means `Color.Red`.
pub(crate) fn enum_member_type_hint(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) || !starts_uppercase(&ctx.name) {
        return Ok(None);
    }
    if switch::enclosing_pattern_case(ctx.node).is_some() {
        return Ok(None);
    }
    let position = call_of_callee(ctx.node).unwrap_or_else(|| ctx.node.clone());
    let Some(expected) = expected_type(s, &position, ctx.generics)? else {
        return Ok(None);
    };
    let expected = unwrap_null(s, &expected);
    // Depends on the surroundings rather than the name: never cached.
    Ok(enum_member(s, &expected, &ctx.name).map(|m| Resolution::uncached(vec![Target::Member(m)])))
}

/// `a.b`: a static of a type, a type of a package or module, a member of
/// the receiver's type, or a static extension.
pub(crate) fn reference_chain(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    let Some(access) = ctx.node.parent().filter(|p| is_field_of(ctx.node, p)) else {
        return Ok(None);
    };
    let lookup = lookup_field(s, &access, ctx.generics)?;
    Ok(Some(Resolution {
        targets: lookup.target.into_iter().collect(),
        cacheable: lookup.cacheable,
    }))
}

fn owning_field(accessor: &SyntaxNode) -> Option<SyntaxNode> {
    accessor
        .parent()
        .filter(|list| list.kind() == SyntaxKind::ACCESSOR_LIST)?
        .parent()
        .filter(|field| field.kind() == SyntaxKind::FIELD_DEF)
}

/// `get`/`set` in `var x(get, set)` name `get_x`/`set_x`.
pub(crate) fn property_accessor(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if ctx.node.kind() != SyntaxKind::ACCESSOR {
        return Ok(None);
    }
    let Some(field) = owning_field(ctx.node) else {
        return Ok(Some(Resolution::empty()));
    };
    let prefix = match ctx.name.as_str() {
        "get" => "get_",
        "set" => "set_",
        _ => return Ok(Some(Resolution::empty())),
    };
    let catalog = s.catalog;
    let Some(member) = s
        .ptr(&field)
        .and_then(|ptr| catalog.member_at(&ptr))
        .and_then(|id| catalog.member(id))
    else {
        return Ok(Some(Resolution::empty()));
    };
    let method = format!("{prefix}{}", member.name);
    let own = TypeRef::Class(self_type(s, member.owner));
    Ok(Some(match find_member(s, &own, &method)? {
        Some(found) => Resolution::one(Target::Member(found.member)),
        None => Resolution::empty(),
    }))
}
