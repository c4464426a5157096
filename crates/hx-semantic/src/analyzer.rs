//! The public entry points of the semantic core.
//!
//! [`Analyzer`] owns a catalog, the analysis settings and the cross-call
//! resolve cache. Each query opens a fresh [`Session`], runs, and drops it.
//! Internal faults are logged and answered with an empty or unknown result;
//! only cancellation reaches the caller.

use hx_parser::ast::expr::Expr;
use hx_parser::{SyntaxKind, SyntaxNode};

use crate::config::AnalysisSection;
use crate::error::{Cancelled, Fault};
use crate::eval::{evaluate, flow};
use crate::generics::GenericResolver;
use crate::model::{token_at, DeclarationCatalog, FileId, NodePtr};
use crate::report::{DeclaredName, FileReport, Located, UnresolvedRef};
use crate::resolve::{self, Target};
use crate::session::{CancellationToken, Session, SharedCache};
use crate::ty::TypeRef;
use crate::unify::UnifyRule;

/// Query façade over a [`DeclarationCatalog`].
pub struct Analyzer<C: DeclarationCatalog> {
    catalog: C,
    config: AnalysisSection,
    shared: SharedCache,
}

/// Turn a session outcome into a public one.
fn settle<T>(what: &str, result: Result<T, Fault>, fallback: T) -> Result<T, Cancelled> {
    match result {
        Ok(value) => Ok(value),
        Err(Fault::Cancelled) => Err(Cancelled),
        Err(fault) => {
            log::warn!("{what}: {fault}");
            Ok(fallback)
        }
    }
}

impl<C: DeclarationCatalog> Analyzer<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, AnalysisSection::default())
    }

    pub fn with_config(catalog: C, config: AnalysisSection) -> Self {
        Self {
            catalog,
            config,
            shared: SharedCache::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Mutable access for edits. Drops everything cached so far.
    pub fn catalog_mut(&mut self) -> &mut C {
        self.shared.clear();
        &mut self.catalog
    }

    pub fn config(&self) -> &AnalysisSection {
        &self.config
    }

    /// The sources changed: forget every cross-call result.
    pub fn invalidate(&self) {
        log::debug!("dropping {} shared resolve results", self.shared.len());
        self.shared.clear();
    }

    fn session(&self, token: &CancellationToken) -> Session<'_> {
        Session::new(&self.catalog, &self.config, token.clone(), Some(&self.shared))
    }

    fn run<T>(
        &self,
        what: &str,
        token: &CancellationToken,
        fallback: T,
        f: impl FnOnce(&mut Session) -> Result<T, Fault>,
    ) -> Result<T, Cancelled> {
        token.check()?;
        let mut s = self.session(token);
        let result = f(&mut s);
        settle(what, result, fallback)
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// The declarations the reference at `offset` denotes.
    pub fn resolve_at(
        &self,
        file: FileId,
        offset: u32,
        token: &CancellationToken,
    ) -> Result<Vec<Target>, Cancelled> {
        token.check()?;
        match self.catalog.node_at(file, offset) {
            Some(ptr) => self.resolve(ptr, &GenericResolver::new(), token),
            None => Ok(Vec::new()),
        }
    }

    pub fn resolve(
        &self,
        reference: NodePtr,
        generics: &GenericResolver,
        token: &CancellationToken,
    ) -> Result<Vec<Target>, Cancelled> {
        self.run("resolve", token, Vec::new(), |s| {
            let node = s.node(&reference)?;
            Ok(resolve::resolve(s, &node, generics)?.targets)
        })
    }

    // ── Types ───────────────────────────────────────────────────────────

    /// The type of the innermost expression or declared name at `offset`.
    pub fn type_at(
        &self,
        file: FileId,
        offset: u32,
        token: &CancellationToken,
    ) -> Result<TypeRef, Cancelled> {
        self.run("type_at", token, TypeRef::Unknown, |s| {
            let Some(root) = s.root(file) else {
                return Ok(TypeRef::Unknown);
            };
            let Some(node) = innermost_typed_node(&root, offset) else {
                return Ok(TypeRef::Unknown);
            };
            Ok(evaluate(s, &node, &GenericResolver::new())?.ty)
        })
    }

    /// The type of `node` under `generics`. `hint` is taken as the type the
    /// node's position expects, and nothing computed under it is cached.
    pub fn evaluate_type(
        &self,
        node: NodePtr,
        generics: &GenericResolver,
        hint: Option<TypeRef>,
        token: &CancellationToken,
    ) -> Result<TypeRef, Cancelled> {
        self.run("evaluate_type", token, TypeRef::Unknown, |s| {
            if let Some(hint) = hint {
                s.set_hint(node, hint);
            }
            let syntax = s.node(&node)?;
            Ok(evaluate(s, &syntax, generics)?.ty)
        })
    }

    pub fn can_assign(
        &self,
        target: &TypeRef,
        value: &TypeRef,
        token: &CancellationToken,
    ) -> Result<bool, Cancelled> {
        self.run("can_assign", token, false, |s| {
            crate::compat::can_assign(s, target, value)
        })
    }

    pub fn unify(
        &self,
        a: &TypeRef,
        b: &TypeRef,
        rule: UnifyRule,
        token: &CancellationToken,
    ) -> Result<TypeRef, Cancelled> {
        self.run("unify", token, TypeRef::Unknown, |s| {
            crate::unify::unify(s, a, b, rule)
        })
    }

    // ── Whole-file check ────────────────────────────────────────────────

    /// Declared-name types, unresolved references and unreachable code of
    /// one file. A fault on one item drops only that item.
    pub fn check_file(
        &self,
        file: FileId,
        token: &CancellationToken,
    ) -> Result<FileReport, Cancelled> {
        token.check()?;
        let Some(info) = self.catalog.file(file) else {
            return Ok(FileReport::default());
        };
        let mut report = FileReport {
            path: info.path.clone(),
            parse_errors: info.parse_errors.iter().map(ToString::to_string).collect(),
            ..FileReport::default()
        };
        let mut s = self.session(token);
        let Some(root) = s.root(file) else {
            return Ok(report);
        };
        let generics = GenericResolver::new();
        let catalog: &dyn DeclarationCatalog = &self.catalog;

        for node in root.descendants() {
            token.check()?;
            let ptr = NodePtr::new(file, &node);
            match node.kind() {
                SyntaxKind::NAME => {
                    let Some(kind) = declared_kind(&node) else {
                        continue;
                    };
                    let result = evaluate(&mut s, &node, &generics).map(|t| t.ty);
                    let ty = settle("check_file", result, TypeRef::Unknown)?;
                    s.in_flight_calls.clear();
                    if let Some(at) = Located::new(catalog, &ptr) {
                        report.declarations.push(DeclaredName {
                            name: node.text().to_string(),
                            kind,
                            at,
                            ty: ty.to_string(),
                        });
                    }
                }
                SyntaxKind::NAME_REF if should_report(&node) => {
                    let result = is_unresolved(&mut s, &node, &generics);
                    let unresolved = settle("check_file", result, false)?;
                    s.in_flight_calls.clear();
                    if !unresolved {
                        continue;
                    }
                    log::debug!("unresolved `{}` in {}", node.text(), report.path.display());
                    if let Some(at) = Located::new(catalog, &ptr) {
                        report.unresolved.push(UnresolvedRef {
                            name: node.text().to_string(),
                            at,
                        });
                    }
                }
                _ => {}
            }
        }

        let dead = settle(
            "check_file",
            flow::unreachable(&mut s, &root, &generics),
            Vec::new(),
        )?;
        report.unreachable = dead
            .iter()
            .filter_map(|ptr| Located::new(catalog, ptr))
            .collect();
        Ok(report)
    }
}

/// What a declaring `NAME` declares, for the kinds a report lists.
fn declared_kind(name: &SyntaxNode) -> Option<&'static str> {
    let kind = match name.parent()?.kind() {
        SyntaxKind::VAR_DECL => "var",
        SyntaxKind::PARAM => "param",
        SyntaxKind::FUNCTION_EXPR => "local function",
        SyntaxKind::FIELD_DEF => "field",
        SyntaxKind::METHOD_DEF => "method",
        SyntaxKind::FOR_HEAD => "for variable",
        SyntaxKind::CATCH_CLAUSE => "catch variable",
        _ => return None,
    };
    Some(kind)
}

/// References inside declarations headers, metadata and untyped code are
/// not checked.
fn should_report(name_ref: &SyntaxNode) -> bool {
    if name_ref.text() == "_" {
        return false;
    }
    !name_ref.ancestors().any(|a| {
        matches!(
            a.kind(),
            SyntaxKind::PACKAGE_DECL
                | SyntaxKind::IMPORT_DECL
                | SyntaxKind::USING_DECL
                | SyntaxKind::METADATA
                | SyntaxKind::UNTYPED_EXPR
        )
    })
}

/// A name with no target. Fields of a `Dynamic` or unknown receiver are
/// never unresolved.
fn is_unresolved(
    s: &mut Session,
    name_ref: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<bool, Fault> {
    if !resolve::resolve(s, name_ref, generics)?.targets.is_empty() {
        return Ok(false);
    }
    let Some(parent) = name_ref.parent() else {
        return Ok(true);
    };
    if parent.kind() == SyntaxKind::FIELD_ACCESS && !resolve::switch::is_first_expr_child(name_ref, &parent) {
        let receiver = parent.children().find(|c| Expr::cast(c.clone()).is_some());
        if let Some(receiver) = receiver {
            let ty = evaluate(s, &receiver, generics)?.ty;
            if ty.is_dynamic() || ty.is_unknown() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// The node `type_at` evaluates: the innermost expression or declaring
/// name around `offset`. A field name stands for its whole access.
fn innermost_typed_node(root: &SyntaxNode, offset: u32) -> Option<SyntaxNode> {
    let token = token_at(root, offset)?;
    let node = token
        .parent_ancestors()
        .find(|n| n.kind() == SyntaxKind::NAME || Expr::cast(n.clone()).is_some())?;
    match node.parent() {
        Some(parent)
            if node.kind() == SyntaxKind::NAME_REF
                && parent.kind() == SyntaxKind::FIELD_ACCESS
                && !resolve::switch::is_first_expr_child(&node, &parent) =>
        {
            Some(parent)
        }
        _ => Some(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ProjectIndex;

    fn analyzer(src: &str) -> (Analyzer<ProjectIndex>, FileId) {
        let mut index = ProjectIndex::with_prelude();
        let file = index.add_file("Main.hx", src);
        (Analyzer::new(index), file)
    }

    fn offset_of(src: &str, needle: &str) -> u32 {
        src.find(needle).map(|o| o as u32).unwrap_or_else(|| panic!("{needle} not in source"))
    }

    #[test]
    fn cancelled_token_stops_every_entry_point() {
        let src = "class Main { static function main() { var x = 1; } }";
        let (analyzer, file) = analyzer(src);
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(analyzer.resolve_at(file, 0, &token), Err(Cancelled));
        assert_eq!(analyzer.type_at(file, 0, &token), Err(Cancelled));
        assert_eq!(analyzer.check_file(file, &token), Err(Cancelled));
        assert_eq!(
            analyzer.unify(&TypeRef::int(), &TypeRef::int(), UnifyRule::Default, &token),
            Err(Cancelled)
        );
    }

    #[test]
    fn offsets_outside_references_resolve_to_nothing() {
        let src = "class Main {}";
        let (analyzer, file) = analyzer(src);
        let token = CancellationToken::new();
        assert_eq!(analyzer.resolve_at(file, 0, &token), Ok(Vec::new()));
        assert_eq!(analyzer.resolve_at(file, 10_000, &token), Ok(Vec::new()));
    }

    #[test]
    fn type_at_a_field_name_types_the_access() {
        let src = "class Main {\n  static function main() {\n    var s = \"abc\";\n    var n = s.length;\n  }\n}\n";
        let (analyzer, file) = analyzer(src);
        let token = CancellationToken::new();
        let at = offset_of(src, "length") + 2;
        assert_eq!(analyzer.type_at(file, at, &token).map(|t| t.to_string()), Ok("Int".to_string()));
    }

    #[test]
    fn hinted_evaluation_is_not_remembered() {
        let src = "class Main {\n  static function main() {\n    var xs = [];\n  }\n}\n";
        let (analyzer, file) = analyzer(src);
        let token = CancellationToken::new();
        let literal = analyzer
            .catalog()
            .file(file)
            .map(|f| f.syntax())
            .and_then(|root| root.descendants().find(|n| n.kind() == SyntaxKind::ARRAY_LITERAL))
            .map(|n| NodePtr::new(file, &n))
            .unwrap();
        let strings = {
            let mut s = analyzer.session(&token);
            crate::eval::typeref::builtin_type(&mut s, "Array", vec![TypeRef::string()])
        };
        let hinted = analyzer
            .evaluate_type(literal, &GenericResolver::new(), Some(strings), &token)
            .unwrap();
        assert_eq!(hinted.to_string(), "Array<String>");
        let plain = analyzer
            .evaluate_type(literal, &GenericResolver::new(), None, &token)
            .unwrap();
        assert_ne!(plain.to_string(), "Array<String>");
    }

    #[test]
    fn report_skips_dynamic_receivers_and_flags_unknown_names() {
        let src = "class Main {\n  static function main() {\n    var d:Dynamic = null;\n    d.anything;\n    missing;\n  }\n}\n";
        let (analyzer, file) = analyzer(src);
        let report = analyzer.check_file(file, &CancellationToken::new()).unwrap();
        let names: Vec<&str> = report.unresolved.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["missing"]);
        assert_eq!(report.unresolved[0].at.line, 5);
    }
}
