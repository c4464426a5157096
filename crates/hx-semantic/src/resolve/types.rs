//! Names in type positions, import paths and package prefixes.

use hx_parser::ast::expr::Expr;
use hx_parser::ast::item::{Metadata, NameRef};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::imports::{find_type, import_path_target};
use super::{is_bare, is_field_of, scope, Ctx, Resolution, Target};
use crate::error::Fault;
use crate::eval::members::find_member;
use crate::eval::typeref::type_of_tag;
use crate::session::Session;

/// The segments of a `PATH` up to and including `segment`, and whether
/// `segment` is the last one.
fn path_prefix(segment: &SyntaxNode) -> Option<(String, bool)> {
    let path = segment.parent()?;
    let mut parts = Vec::new();
    let mut last = true;
    let mut reached = false;
    for seg in path.children().filter_map(NameRef::cast) {
        if reached {
            last = false;
            break;
        }
        parts.push(seg.text());
        reached = seg.syntax() == segment;
    }
    Some((parts.join("."), last))
}

/// `T` inside a declaration, method or function that declares `T`.
pub(crate) fn generic_param_in_scope(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    let in_type = ctx
        .node
        .parent()
        .filter(|p| p.kind() == SyntaxKind::PATH)
        .and_then(|p| p.parent())
        .is_some_and(|owner| owner.kind() == SyntaxKind::PATH_TYPE);
    if !in_type {
        return Ok(None);
    }
    let Some((_, last)) = path_prefix(ctx.node) else {
        return Ok(None);
    };
    let single = ctx.node.parent().is_some_and(|p| p.children().count() == 1);
    if !last || !single {
        return Ok(None);
    }
    let Some(param) = scope::generic_param_in_scope(ctx.node, &ctx.name) else {
        return Ok(None);
    };
    Ok(s.ptr(&param).map(|ptr| {
        Resolution::one(Target::GenericParam {
            name: ctx.name.clone(),
            ptr,
        })
    }))
}

/// Segments of type paths, `import`, `using` and `package` declarations.
pub(crate) fn syntactic_type_position(
    s: &mut Session,
    ctx: &Ctx,
) -> Result<Option<Resolution>, Fault> {
    let Some(path) = ctx.node.parent().filter(|p| p.kind() == SyntaxKind::PATH) else {
        return Ok(None);
    };
    let Some(owner) = path.parent() else {
        return Ok(None);
    };
    let Some((prefix, last)) = path_prefix(ctx.node) else {
        return Ok(None);
    };
    let catalog = s.catalog;
    let resolution = match owner.kind() {
        SyntaxKind::PATH_TYPE => {
            if last {
                let full = super::imports::path_text(&path);
                find_type(s, ctx.node, &full)?
                    .map(|d| Resolution::one(Target::Decl(d)))
                    .unwrap_or_else(Resolution::empty)
            } else if let Some(d) = catalog.find_by_qualified_name(&prefix) {
                Resolution::one(Target::Decl(d))
            } else if catalog.is_package(&prefix) {
                Resolution::one(Target::Package(prefix))
            } else if !prefix.contains('.') {
                find_type(s, ctx.node, &prefix)?
                    .map(|d| Resolution::one(Target::Decl(d)))
                    .unwrap_or_else(Resolution::empty)
            } else {
                Resolution::empty()
            }
        }
        SyntaxKind::IMPORT_DECL | SyntaxKind::USING_DECL => {
            if let Some(target) = import_path_target(s, &prefix) {
                Resolution::one(target)
            } else if catalog.is_package(&prefix) {
                Resolution::one(Target::Package(prefix))
            } else {
                Resolution::empty()
            }
        }
        SyntaxKind::PACKAGE_DECL => Resolution::one(Target::Package(prefix)),
        _ => return Ok(None),
    };
    Ok(Some(resolution))
}

/// The dotted text of a chain of plain names (`a.b.c`), if that is all it
/// is.
fn dotted(expr: &SyntaxNode) -> Option<String> {
    match Expr::cast(expr.clone())? {
        Expr::NameRef(n) => Some(n.text()),
        Expr::FieldAccess(fa) => {
            let receiver = dotted(fa.receiver()?.syntax())?;
            Some(format!("{receiver}.{}", fa.field()?.text()))
        }
        _ => None,
    }
}

fn leftmost(expr: &SyntaxNode) -> Option<SyntaxNode> {
    match Expr::cast(expr.clone())? {
        Expr::NameRef(n) => Some(n.syntax().clone()),
        Expr::FieldAccess(fa) => leftmost(fa.receiver()?.syntax()),
        _ => None,
    }
}

/// `pack.sub.Type` written as an expression.
pub(crate) fn qualified_package_path(
    s: &mut Session,
    ctx: &Ctx,
) -> Result<Option<Resolution>, Fault> {
    let prefix = if is_bare(ctx.node) {
        ctx.name.clone()
    } else {
        let Some(access) = ctx.node.parent().filter(|p| is_field_of(ctx.node, p)) else {
            return Ok(None);
        };
        let Some(text) = dotted(&access) else {
            return Ok(None);
        };
        text
    };
    let catalog = s.catalog;
    let first = prefix.split('.').next().unwrap_or_default();
    if !catalog.is_package(first) {
        return Ok(None);
    }
    // A local or member named like the package shadows it.
    let Some(head) = (if is_bare(ctx.node) {
        Some(ctx.node.clone())
    } else {
        ctx.node.parent().and_then(|p| leftmost(&p))
    }) else {
        return Ok(None);
    };
    if scope::find_local(s, &head, first).is_some() {
        return Ok(None);
    }
    if let Some(decl) = scope::enclosing_decl(s, &head) {
        let own = crate::ty::TypeRef::Class(crate::eval::typeref::self_type(s, decl));
        if find_member(s, &own, first)?.is_some() {
            return Ok(None);
        }
    }
    if let Some(decl) = catalog.find_by_qualified_name(&prefix) {
        return Ok(Some(Resolution::one(Target::Decl(decl))));
    }
    if catalog.is_package(&prefix) {
        return Ok(Some(Resolution::one(Target::Package(prefix))));
    }
    Ok(None)
}

/// Names listed in `@:forward(a, b)` on an abstract are fields of the
/// underlying type.
pub(crate) fn forwarded_name(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    let Some(meta) = ctx
        .node
        .ancestors()
        .find(|n| n.kind() == SyntaxKind::METADATA)
        .and_then(Metadata::cast)
    else {
        return Ok(None);
    };
    if meta.name() != "forward" {
        return Ok(None);
    }
    let Some(owner) = meta.syntax().parent() else {
        return Ok(Some(Resolution::empty()));
    };
    let catalog = s.catalog;
    let underlying = s
        .ptr(&owner)
        .and_then(|ptr| catalog.declaration_at(&ptr))
        .and_then(|d| catalog.declaration(d))
        .and_then(|d| d.underlying().cloned());
    let Some(underlying) = underlying else {
        return Ok(Some(Resolution::empty()));
    };
    let ty = type_of_tag(s, &underlying, ctx.generics)?.ty;
    Ok(Some(match find_member(s, &ty, &ctx.name)? {
        Some(found) => Resolution::one(Target::Member(found.member)),
        None => Resolution::empty(),
    }))
}
