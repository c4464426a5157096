//! Name resolution: what declaration a reference denotes.
//!
//! A reference is resolved by running an ordered chain of strategies. Each
//! strategy looks at the syntactic position of the reference and either
//! decides (possibly with an empty result, which stops the chain) or passes.
//! The order is significant: earlier strategies shadow later ones, so a
//! local variable named like a class wins, and a constructor named in a
//! `case` wins over a capture variable of the same name.
//!
//! Results are memoized per node and generic fingerprint, and shared across
//! sessions through [`SharedCache`](crate::session::SharedCache) until the
//! catalog's modification stamp changes.

pub(crate) mod fields;
pub(crate) mod imports;
pub(crate) mod scope;
pub(crate) mod switch;
pub(crate) mod types;

use hx_parser::ast::item::NameRef;
use hx_parser::ast::AstNode;
use hx_parser::{SyntaxKind, SyntaxNode};
use serde::Serialize;

use crate::error::Fault;
use crate::generics::GenericResolver;
use crate::model::{DeclId, MemberId, NodePtr};
use crate::session::{GuardKey, Session};

/// What a local binding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LocalKind {
    Var,
    Param,
    /// A named local function.
    Function,
    /// A variable bound by a `case` pattern.
    PatternCapture,
    ForVar,
    CatchVar,
}

/// A name declared inside a body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalBinding {
    pub kind: LocalKind,
    pub name: String,
    /// The declaring identifier.
    pub name_ptr: NodePtr,
    /// The node that gives the binding its type: `VAR_DECL`, `PARAM`,
    /// `FUNCTION_EXPR`, `FOR_HEAD`, `CATCH_CLAUSE`, or the pattern node for
    /// captures.
    pub owner_ptr: NodePtr,
}

/// A declaration a reference can resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Decl(DeclId),
    Member(MemberId),
    Local(LocalBinding),
    GenericParam { name: String, ptr: NodePtr },
    /// A package prefix such as `haxe` in `haxe.Log.trace`.
    Package(String),
}

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub targets: Vec<Target>,
    pub cacheable: bool,
}

impl Resolution {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            cacheable: true,
        }
    }

    pub fn one(target: Target) -> Self {
        Self::new(vec![target])
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn uncached(targets: Vec<Target>) -> Self {
        Self {
            targets,
            cacheable: false,
        }
    }
}

/// What a strategy sees.
pub(crate) struct Ctx<'n> {
    pub node: &'n SyntaxNode,
    /// The referenced name as written (`$x` keeps its dollar).
    pub name: String,
    pub generics: &'n GenericResolver,
}

/// `Ok(None)` passes to the next strategy; `Ok(Some(_))` decides.
type Strategy = fn(&mut Session, &Ctx) -> Result<Option<Resolution>, Fault>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("generic parameter", types::generic_param_in_scope),
    ("import alias", imports::import_alias),
    ("enum member from expected type", fields::enum_member_type_hint),
    ("type position", types::syntactic_type_position),
    ("package path", types::qualified_package_path),
    ("super", scope::super_expr),
    ("macro identifier", scope::macro_ident_escape),
    ("field of receiver", fields::reference_chain),
    ("property accessor", fields::property_accessor),
    ("case pattern", switch::switch_case_pattern),
    ("lexical scope", scope::lexical_tree_walk),
    ("same file", scope::same_file_declaration),
    ("qualified class name", imports::qualified_class_name),
    ("extractor capture", switch::capture_in_extractor),
    ("enum member of switch subject", switch::switch_on_enum_member),
    ("nested enum argument", switch::enum_argument_extractor),
    ("forwarded field", types::forwarded_name),
    ("global alias", imports::global_builtin_alias),
    ("imported enum constructor", imports::import_list_heuristic),
];

/// Resolve a `NAME_REF`, `THIS_EXPR`, `SUPER_EXPR`, `ACCESSOR` or
/// declaring `NAME` node.
pub fn resolve(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Resolution, Fault> {
    s.step()?;
    let Some(ptr) = s.ptr(node) else {
        return Ok(Resolution::empty());
    };
    let key = (ptr, generics.fingerprint());
    if let Some(targets) = s.resolved_get(&key) {
        return Ok(Resolution::new(targets));
    }
    let cycles = s.cycles();
    let mut resolution = s.guarded(GuardKey::Resolve(ptr), Resolution::uncached(Vec::new()), |s| {
        run_chain(s, node, generics)
    })?;
    resolution.cacheable &= s.cycles() == cycles;
    if resolution.cacheable {
        s.resolved_put(key, resolution.targets.clone());
    }
    Ok(resolution)
}

fn run_chain(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Resolution, Fault> {
    let name = match node.kind() {
        SyntaxKind::NAME => return declared(s, node),
        SyntaxKind::THIS_EXPR => {
            return Ok(scope::enclosing_decl(s, node)
                .map(|d| Resolution::one(Target::Decl(d)))
                .unwrap_or_else(Resolution::empty));
        }
        SyntaxKind::NAME_REF => match NameRef::cast(node.clone()) {
            Some(name_ref) => name_ref.text(),
            None => return Ok(Resolution::empty()),
        },
        SyntaxKind::SUPER_EXPR => "super".to_string(),
        SyntaxKind::ACCESSOR => node.text().to_string(),
        _ => return Ok(Resolution::empty()),
    };
    if name.is_empty() {
        return Ok(Resolution::empty());
    }
    let ctx = Ctx {
        node,
        name,
        generics,
    };
    for (label, strategy) in STRATEGIES {
        s.step()?;
        if let Some(mut resolution) = strategy(s, &ctx)? {
            log::trace!(
                "`{}` at {:?} decided by {label}: {} target(s)",
                ctx.name,
                node.text_range(),
                resolution.targets.len()
            );
            dedup(&mut resolution.targets);
            return Ok(resolution);
        }
    }
    Ok(Resolution::empty())
}

fn dedup(targets: &mut Vec<Target>) {
    let mut seen = Vec::with_capacity(targets.len());
    targets.retain(|t| {
        if seen.contains(t) {
            false
        } else {
            seen.push(t.clone());
            true
        }
    });
}

/// A declaring identifier resolves to what it declares.
fn declared(s: &mut Session, name: &SyntaxNode) -> Result<Resolution, Fault> {
    let Some(parent) = name.parent() else {
        return Ok(Resolution::empty());
    };
    let Some(parent_ptr) = s.ptr(&parent) else {
        return Ok(Resolution::empty());
    };
    let Some(name_ptr) = s.ptr(name) else {
        return Ok(Resolution::empty());
    };
    let text = name.text().to_string();
    let catalog = s.catalog;
    let local = |kind| {
        Resolution::one(Target::Local(LocalBinding {
            kind,
            name: text.clone(),
            name_ptr,
            owner_ptr: parent_ptr,
        }))
    };
    let resolution = match parent.kind() {
        k if k.is_type_def() => catalog
            .declaration_at(&parent_ptr)
            .map(|d| Resolution::one(Target::Decl(d)))
            .unwrap_or_else(Resolution::empty),
        SyntaxKind::FIELD_DEF
        | SyntaxKind::METHOD_DEF
        | SyntaxKind::ENUM_CTOR
        | SyntaxKind::ANON_FIELD
        | SyntaxKind::OBJECT_FIELD => catalog
            .member_at(&parent_ptr)
            .map(|m| Resolution::one(Target::Member(m)))
            .unwrap_or_else(Resolution::empty),
        SyntaxKind::VAR_DECL => local(LocalKind::Var),
        SyntaxKind::PARAM => match parent.parent().and_then(|list| list.parent()) {
            // Enum constructor arguments are not locals of any body.
            Some(owner) if owner.kind() == SyntaxKind::ENUM_CTOR => Resolution::empty(),
            _ => local(LocalKind::Param),
        },
        SyntaxKind::FUNCTION_EXPR => local(LocalKind::Function),
        SyntaxKind::FOR_HEAD => local(LocalKind::ForVar),
        SyntaxKind::CATCH_CLAUSE => local(LocalKind::CatchVar),
        SyntaxKind::GENERIC_PARAM => Resolution::one(Target::GenericParam {
            name: text.clone(),
            ptr: parent_ptr,
        }),
        SyntaxKind::IMPORT_ALIAS => {
            let path = parent
                .parent()
                .and_then(|import| import.children().find(|c| c.kind() == SyntaxKind::PATH))
                .map(|p| imports::path_text(&p))
                .unwrap_or_default();
            imports::import_path_target(s, &path)
                .map(Resolution::one)
                .unwrap_or_else(Resolution::empty)
        }
        _ => Resolution::empty(),
    };
    Ok(resolution)
}

// ── Positions ────────────────────────────────────────────────────────────

/// A `NAME_REF` in expression position that is not the field of a member
/// access: `x` in `x + 1`, but not `x` in `a.x` or in a type path.
pub(crate) fn is_bare(node: &SyntaxNode) -> bool {
    if node.kind() != SyntaxKind::NAME_REF {
        return false;
    }
    match node.parent() {
        Some(parent) => match parent.kind() {
            SyntaxKind::PATH => false,
            SyntaxKind::FIELD_ACCESS => !is_field_of(node, &parent),
            _ => true,
        },
        None => false,
    }
}

/// Whether `node` is the name after the dot of `access`.
pub(crate) fn is_field_of(node: &SyntaxNode, access: &SyntaxNode) -> bool {
    access.kind() == SyntaxKind::FIELD_ACCESS
        && hx_parser::ast::expr::FieldAccess::cast(access.clone())
            .and_then(|fa| fa.field())
            .is_some_and(|f| f.syntax() == node)
}

/// The call a node is the callee of.
pub(crate) fn call_of_callee(node: &SyntaxNode) -> Option<SyntaxNode> {
    let parent = node.parent()?;
    if parent.kind() != SyntaxKind::CALL_EXPR {
        return None;
    }
    let callee = parent.children().find(|c| hx_parser::ast::expr::Expr::cast(c.clone()).is_some())?;
    (&callee == node).then_some(parent)
}

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.trim_start_matches('_')
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}
