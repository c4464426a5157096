//! Lexical scopes inside bodies, and the strategies that use them.

use hx_parser::ast::expr::{CatchClause, ForHead, FunctionExpr, VarDecl};
use hx_parser::ast::item::{Name, NameRef, Param, ParamList};
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};

use super::{is_bare, switch, Ctx, LocalBinding, LocalKind, Resolution, Target};
use crate::error::Fault;
use crate::eval::members::find_member;
use crate::eval::typeref::{self_type, type_of_tag};
use crate::generics::GenericResolver;
use crate::model::{DeclId, DeclShape};
use crate::session::Session;
use crate::ty::TypeRef;

// ── Walking up ───────────────────────────────────────────────────────────

/// The `GENERIC_PARAM` declaring `name` in an enclosing declaration,
/// method or function.
pub(crate) fn generic_param_in_scope(node: &SyntaxNode, name: &str) -> Option<SyntaxNode> {
    for ancestor in node.ancestors() {
        let Some(list) = ancestor
            .children()
            .find(|c| c.kind() == SyntaxKind::GENERIC_PARAM_LIST)
        else {
            continue;
        };
        let found = list.children().find(|param| {
            param.kind() == SyntaxKind::GENERIC_PARAM
                && param
                    .children()
                    .find_map(Name::cast)
                    .is_some_and(|n| n.text() == name)
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// The innermost type declaration around `node`.
pub(crate) fn enclosing_type_def(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors().find(|n| n.kind().is_type_def())
}

pub(crate) fn enclosing_decl(s: &Session, node: &SyntaxNode) -> Option<DeclId> {
    let def = enclosing_type_def(node)?;
    let ptr = s.ptr(&def)?;
    s.catalog.declaration_at(&ptr)
}

/// The innermost method, function literal or lambda around `node`.
pub(crate) fn enclosing_function(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors()
        .skip(1)
        .take_while(|n| !n.kind().is_type_def())
        .find(|n| n.kind().is_function_like())
}

fn name_of(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|c| c.kind() == SyntaxKind::NAME)
}

fn binding(
    s: &Session,
    kind: LocalKind,
    name: &SyntaxNode,
    owner: &SyntaxNode,
) -> Option<LocalBinding> {
    Some(LocalBinding {
        kind,
        name: name.text().to_string(),
        name_ptr: s.ptr(name)?,
        owner_ptr: s.ptr(owner)?,
    })
}

/// The local variable, parameter or capture called `name` that is visible
/// at `node`. Variables are visible after their declaration, inner
/// declarations shadow outer ones.
pub(crate) fn find_local(s: &Session, node: &SyntaxNode, name: &str) -> Option<LocalBinding> {
    let mut child = node.clone();
    for scope in node.ancestors().skip(1) {
        if scope.kind().is_type_def() || scope.kind() == SyntaxKind::ANON_TYPE {
            break;
        }
        if let Some(found) = in_scope(s, &scope, &child, name) {
            return Some(found);
        }
        child = scope;
    }
    None
}

fn in_scope(
    s: &Session,
    scope: &SyntaxNode,
    child: &SyntaxNode,
    name: &str,
) -> Option<LocalBinding> {
    match scope.kind() {
        SyntaxKind::BLOCK | SyntaxKind::CASE_BODY => {
            let before: Vec<SyntaxNode> =
                scope.children().take_while(|c| c != child).collect();
            for stmt in before.iter().rev() {
                match stmt.kind() {
                    SyntaxKind::VAR_DECL => {
                        let decl = VarDecl::cast(stmt.clone())?;
                        if let Some(n) = decl.name().filter(|n| n.text() == name) {
                            return binding(s, LocalKind::Var, n.syntax(), stmt);
                        }
                    }
                    SyntaxKind::FUNCTION_EXPR => {
                        let func = FunctionExpr::cast(stmt.clone())?;
                        if let Some(n) = func.name().filter(|n| n.text() == name) {
                            return binding(s, LocalKind::Function, n.syntax(), stmt);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        SyntaxKind::FOR_EXPR if child.kind() != SyntaxKind::FOR_HEAD => {
            let head = scope.children().find_map(ForHead::cast)?;
            [head.key(), head.value()]
                .into_iter()
                .flatten()
                .find(|n| n.text() == name)
                .and_then(|n| binding(s, LocalKind::ForVar, n.syntax(), head.syntax()))
        }
        SyntaxKind::CATCH_CLAUSE
            if !matches!(child.kind(), SyntaxKind::NAME | SyntaxKind::TYPE_TAG) =>
        {
            let clause = CatchClause::cast(scope.clone())?;
            let n = clause.name().filter(|n| n.text() == name)?;
            binding(s, LocalKind::CatchVar, n.syntax(), scope)
        }
        SyntaxKind::SWITCH_CASE
            if matches!(child.kind(), SyntaxKind::CASE_BODY | SyntaxKind::GUARD) =>
        {
            let capture = switch::case_captures(scope)
                .into_iter()
                .find(|c| c.text() == name)?;
            binding(s, LocalKind::PatternCapture, &capture, &capture)
        }
        kind if kind.is_function_like() => {
            if child.kind() != SyntaxKind::PARAM_LIST {
                let params = scope.children().find_map(ParamList::cast);
                let param = params
                    .iter()
                    .flat_map(|list| list.params().collect::<Vec<Param>>())
                    .find(|p| p.name().is_some_and(|n| n.text() == name));
                if let Some(param) = param {
                    let n = param.name()?;
                    return binding(s, LocalKind::Param, n.syntax(), param.syntax());
                }
            }
            // A named local function sees itself.
            if kind == SyntaxKind::FUNCTION_EXPR {
                let n = name_of(scope).filter(|n| n.text() == name)?;
                return binding(s, LocalKind::Function, &n, scope);
            }
            None
        }
        _ => None,
    }
}

/// The type `this` has at `node`: the enclosing declaration with its own
/// parameters, or the underlying type inside an abstract.
pub(crate) fn this_type(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<TypeRef, Fault> {
    let Some(decl_id) = enclosing_decl(s, node) else {
        return Ok(TypeRef::Unknown);
    };
    let catalog = s.catalog;
    if let Some(underlying) = catalog.declaration(decl_id).and_then(|d| d.underlying()) {
        return Ok(type_of_tag(s, underlying, generics)?.ty);
    }
    Ok(generics.apply(&TypeRef::Class(self_type(s, decl_id))))
}

// ── Strategies ───────────────────────────────────────────────────────────

/// `super` names the superclass; `super(...)` names its constructor.
pub(crate) fn super_expr(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if ctx.node.kind() != SyntaxKind::SUPER_EXPR {
        return Ok(None);
    }
    let Some(decl_id) = enclosing_decl(s, ctx.node) else {
        return Ok(Some(Resolution::empty()));
    };
    let catalog = s.catalog;
    let extends = match catalog.declaration(decl_id).map(|d| &d.shape) {
        Some(DeclShape::Class {
            extends: Some(tag), ..
        }) => tag.clone(),
        _ => return Ok(Some(Resolution::empty())),
    };
    let TypeRef::Class(parent) = type_of_tag(s, &extends, ctx.generics)?.ty else {
        return Ok(Some(Resolution::empty()));
    };
    if super::call_of_callee(ctx.node).is_some() {
        if let Some(found) = find_member(s, &TypeRef::Class(parent.clone()), "new")? {
            return Ok(Some(Resolution::one(Target::Member(found.member))));
        }
    }
    Ok(Some(Resolution::one(Target::Decl(parent.decl))))
}

/// `$name` inside macro reification refers to the local `name`.
pub(crate) fn macro_ident_escape(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    let is_macro_ident = NameRef::cast(ctx.node.clone())
        .and_then(|n| n.token())
        .is_some_and(|t| t.kind() == SyntaxKind::MACRO_IDENT);
    if !is_macro_ident {
        return Ok(None);
    }
    let stripped = ctx.name.trim_start_matches('$');
    Ok(Some(match find_local(s, ctx.node, stripped) {
        Some(local) => Resolution::one(Target::Local(local)),
        None => Resolution::empty(),
    }))
}

/// Locals, parameters and captures, then members of the enclosing type
/// and its supertypes.
pub(crate) fn lexical_tree_walk(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) {
        return Ok(None);
    }
    if let Some(local) = find_local(s, ctx.node, &ctx.name) {
        return Ok(Some(Resolution::one(Target::Local(local))));
    }
    let Some(decl_id) = enclosing_decl(s, ctx.node) else {
        return Ok(None);
    };
    let own = TypeRef::Class(self_type(s, decl_id));
    if let Some(found) = find_member(s, &own, &ctx.name)? {
        return Ok(Some(Resolution::one(Target::Member(found.member))));
    }
    Ok(None)
}

/// A type declared earlier or later in the same file.
pub(crate) fn same_file_declaration(
    s: &mut Session,
    ctx: &Ctx,
) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) {
        return Ok(None);
    }
    let Some(file) = s.file_of(ctx.node) else {
        return Ok(None);
    };
    let catalog = s.catalog;
    let found = catalog
        .declarations_in_file(file)
        .into_iter()
        .find(|id| catalog.declaration(*id).is_some_and(|d| d.name == ctx.name));
    Ok(found.map(|id| Resolution::one(Target::Decl(id))))
}
