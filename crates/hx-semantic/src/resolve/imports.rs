//! Type names through imports, packages and the prelude.

use hx_parser::ast::item::Path;
use hx_parser::ast::AstNode;
use hx_parser::SyntaxNode;

use super::{call_of_callee, is_bare, Ctx, Resolution, Target};
use crate::error::Fault;
use crate::eval::expect::expected_type;
use crate::generics::unwrap_null;
use crate::model::{DeclId, DeclarationCatalog, FileInfo, MemberKind};
use crate::session::Session;

pub(crate) fn path_text(path: &SyntaxNode) -> String {
    Path::cast(path.clone()).map(|p| p.text()).unwrap_or_default()
}

fn named_in_file(catalog: &dyn DeclarationCatalog, file: crate::model::FileId, name: &str) -> Option<DeclId> {
    catalog
        .declarations_in_file(file)
        .into_iter()
        .find(|id| catalog.declaration(*id).is_some_and(|d| d.name == name))
}

/// What an import path names: a type, or a static member of one
/// (`import pack.Tools.helper`).
pub(crate) fn import_path_target(s: &Session, path: &str) -> Option<Target> {
    let catalog = s.catalog;
    if let Some(decl) = catalog.find_by_qualified_name(path) {
        return Some(Target::Decl(decl));
    }
    let (owner, field) = path.rsplit_once('.')?;
    let owner = catalog.find_by_qualified_name(owner)?;
    catalog
        .members_of(owner)
        .into_iter()
        .find(|m| m.name == field && m.is_static())
        .map(|m| Target::Member(m.id))
}

/// Resolve a type name as written at `context`: dotted names are looked
/// up as qualified names, simple names through explicit imports, the same
/// file, modules of explicit imports, wildcard imports, the same package
/// and finally the root package (where the prelude lives).
pub fn find_type(s: &mut Session, context: &SyntaxNode, name: &str) -> Result<Option<DeclId>, Fault> {
    s.step()?;
    let catalog = s.catalog;
    let file = s.file_of(context).and_then(|id| catalog.file(id));

    if let Some((head, rest)) = name.split_once('.') {
        if let Some(found) = catalog.find_by_qualified_name(name) {
            return Ok(Some(found));
        }
        // `Module.Sub` or an imported `Alias.Sub`.
        if !head.is_empty() && !rest.contains('.') {
            if let Some(module) = find_type(s, context, head)? {
                let module_file = catalog.declaration(module).map(|d| d.file);
                return Ok(module_file.and_then(|f| named_in_file(catalog, f, rest)));
            }
        }
        return Ok(None);
    }

    let Some(file) = file else {
        return Ok(catalog.find_by_qualified_name(name));
    };
    Ok(find_simple(catalog, file, name))
}

fn find_simple(catalog: &dyn DeclarationCatalog, file: &FileInfo, name: &str) -> Option<DeclId> {
    for import in &file.imports {
        if import.visible_name() == Some(name) {
            if let Some(found) = catalog.find_by_qualified_name(&import.path) {
                return Some(found);
            }
        }
    }
    for using in &file.usings {
        if using.rsplit('.').next() == Some(name) {
            if let Some(found) = catalog.find_by_qualified_name(using) {
                return Some(found);
            }
        }
    }
    if let Some(found) = named_in_file(catalog, file.id, name) {
        return Some(found);
    }
    // Importing a module makes every type in it visible.
    let explicit = file
        .imports
        .iter()
        .filter(|i| !i.wildcard)
        .map(|i| i.path.as_str())
        .chain(file.usings.iter().map(String::as_str));
    for path in explicit {
        let module_file = catalog
            .find_by_qualified_name(path)
            .and_then(|d| catalog.declaration(d))
            .map(|d| d.file);
        if let Some(found) = module_file.and_then(|f| named_in_file(catalog, f, name)) {
            return Some(found);
        }
    }
    for import in file.imports.iter().filter(|i| i.wildcard) {
        if let Some(found) = catalog.find_by_qualified_name(&format!("{}.{name}", import.path)) {
            return Some(found);
        }
    }
    let same_package = catalog.declarations_in_package(&file.package);
    let in_package = |id: &DeclId| catalog.declaration(*id).is_some_and(|d| d.name == name);
    let preferred = same_package.iter().find(|id| {
        catalog
            .declaration(**id)
            .is_some_and(|d| d.name == name && d.module == name)
    });
    if let Some(found) = preferred.or_else(|| same_package.iter().find(|id| in_package(id))) {
        return Some(*found);
    }
    catalog.find_by_qualified_name(name)
}

// ── Strategies ───────────────────────────────────────────────────────────

/// `import a.b.C as D` makes `D` mean `a.b.C`.
pub(crate) fn import_alias(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) {
        return Ok(None);
    }
    let catalog = s.catalog;
    let Some(file) = s.file_of(ctx.node).and_then(|id| catalog.file(id)) else {
        return Ok(None);
    };
    let Some(import) = file
        .imports
        .iter()
        .find(|i| i.alias.as_deref() == Some(ctx.name.as_str()))
    else {
        return Ok(None);
    };
    Ok(Some(match import_path_target(s, &import.path) {
        Some(target) => Resolution::one(target),
        None => Resolution::empty(),
    }))
}

/// A type visible by its simple name, or a static member imported by name.
pub(crate) fn qualified_class_name(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) {
        return Ok(None);
    }
    if let Some(decl) = find_type(s, ctx.node, &ctx.name)? {
        return Ok(Some(Resolution::one(Target::Decl(decl))));
    }
    let catalog = s.catalog;
    let Some(file) = s.file_of(ctx.node).and_then(|id| catalog.file(id)) else {
        return Ok(None);
    };
    for import in &file.imports {
        if import.visible_name() != Some(ctx.name.as_str()) {
            continue;
        }
        if let Some(target @ Target::Member(_)) = import_path_target(s, &import.path) {
            return Ok(Some(Resolution::one(target)));
        }
    }
    Ok(None)
}

/// `trace` is `haxe.Log.trace` everywhere.
pub(crate) fn global_builtin_alias(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if ctx.name != "trace" || !is_bare(ctx.node) {
        return Ok(None);
    }
    let catalog = s.catalog;
    let found = catalog.find_by_qualified_name("haxe.Log").and_then(|log| {
        catalog
            .members_of(log)
            .into_iter()
            .find(|m| m.name == "trace")
            .map(|m| m.id)
    });
    Ok(found.map(|m| Resolution::one(Target::Member(m))))
}

/// Last resort for a bare constructor name: constructors of imported
/// enums, then of enums in the same file. Ties go to the enum the context
/// expects, then to a matching argument count, then to import order.
pub(crate) fn import_list_heuristic(s: &mut Session, ctx: &Ctx) -> Result<Option<Resolution>, Fault> {
    if !is_bare(ctx.node) {
        return Ok(None);
    }
    let catalog = s.catalog;
    let Some(file_id) = s.file_of(ctx.node) else {
        return Ok(None);
    };
    let Some(file) = catalog.file(file_id) else {
        return Ok(None);
    };

    let mut enums: Vec<DeclId> = Vec::new();
    for import in &file.imports {
        let decls = if import.wildcard {
            catalog.declarations_in_package(&import.path)
        } else {
            match catalog.find_by_qualified_name(&import.path) {
                Some(d) => {
                    // The whole module comes with an import.
                    let module_file = catalog.declaration(d).map(|decl| decl.file);
                    let mut decls = vec![d];
                    if let Some(f) = module_file {
                        decls.extend(catalog.declarations_in_file(f));
                    }
                    decls
                }
                None => Vec::new(),
            }
        };
        enums.extend(decls);
    }
    enums.extend(catalog.declarations_in_file(file_id));

    let mut candidates = Vec::new();
    for decl_id in enums {
        let Some(decl) = catalog.declaration(decl_id) else {
            continue;
        };
        if !decl.is_enum() {
            continue;
        }
        let ctor = catalog
            .members_of(decl_id)
            .into_iter()
            .find(|m| m.kind == MemberKind::EnumCtor && m.name == ctx.name);
        if let Some(ctor) = ctor {
            if !candidates.iter().any(|(_, c)| *c == ctor.id) {
                candidates.push((decl_id, ctor.id));
            }
        }
    }
    match candidates.len() {
        0 => return Ok(None),
        1 => return Ok(Some(Resolution::one(Target::Member(candidates[0].1)))),
        _ => {}
    }

    let call = call_of_callee(ctx.node);
    let position = call.clone().unwrap_or_else(|| ctx.node.clone());
    if let Some(expected) = expected_type(s, &position, ctx.generics)? {
        let expected = unwrap_null(s, &expected);
        let wanted = expected
            .as_class()
            .or_else(|| expected.enum_class())
            .map(|ct| ct.decl);
        if let Some((_, ctor)) = candidates.iter().find(|(d, _)| Some(*d) == wanted) {
            return Ok(Some(Resolution::uncached(vec![Target::Member(*ctor)])));
        }
    }
    let arg_count = call
        .and_then(hx_parser::ast::expr::CallExpr::cast)
        .map(|c| c.args().len())
        .unwrap_or(0);
    let by_arity = candidates.iter().find(|(_, ctor)| {
        catalog
            .member(*ctor)
            .is_some_and(|m| m.params.len() == arg_count)
    });
    let chosen = by_arity.unwrap_or(&candidates[0]);
    Ok(Some(Resolution::one(Target::Member(chosen.1))))
}
