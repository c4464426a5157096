//! Serializable views of analysis results.
//!
//! The analysis types carry node pointers and ids that only mean something
//! next to a catalog. These views resolve them to paths, names and
//! line/column positions so a tool can print or emit them as JSON.

use std::path::PathBuf;

use hx_common::span::Span;
use serde::Serialize;

use crate::model::{DeclKind, DeclarationCatalog, MemberKind, NodePtr};
use crate::resolve::{LocalKind, Target};

/// A span together with its 1-based start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Located {
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl Located {
    pub fn new(catalog: &dyn DeclarationCatalog, ptr: &NodePtr) -> Option<Self> {
        let file = catalog.file(ptr.file)?;
        let span = ptr.span();
        let (line, column) = file.line_index.line_col(span.start);
        Some(Self { span, line, column })
    }
}

/// One resolved target, as a tool shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetView {
    pub kind: &'static str,
    pub name: String,
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub location: Option<Located>,
}

fn decl_kind_name(kind: DeclKind) -> &'static str {
    match kind {
        DeclKind::Class => "class",
        DeclKind::Interface => "interface",
        DeclKind::Enum => "enum",
        DeclKind::Abstract => "abstract",
        DeclKind::Typedef => "typedef",
        DeclKind::Anonymous => "structure",
        DeclKind::ObjectLiteral => "object literal",
    }
}

fn member_kind_name(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Field => "field",
        MemberKind::Method => "method",
        MemberKind::EnumCtor => "enum constructor",
    }
}

pub(crate) fn local_kind_name(kind: LocalKind) -> &'static str {
    match kind {
        LocalKind::Var => "var",
        LocalKind::Param => "param",
        LocalKind::Function => "local function",
        LocalKind::PatternCapture => "capture",
        LocalKind::ForVar => "for variable",
        LocalKind::CatchVar => "catch variable",
    }
}

impl TargetView {
    pub fn new(catalog: &dyn DeclarationCatalog, target: &Target) -> Self {
        let (kind, name, ptr) = match target {
            Target::Decl(id) => match catalog.declaration(*id) {
                Some(decl) => (
                    decl_kind_name(decl.kind()),
                    decl.qualified_name(),
                    Some(decl.name_ptr.unwrap_or(decl.ptr)),
                ),
                None => ("declaration", String::new(), None),
            },
            Target::Member(id) => match catalog.member(*id) {
                Some(member) => {
                    let owner = catalog
                        .declaration(member.owner)
                        .map(|d| d.name.clone())
                        .unwrap_or_default();
                    (
                        member_kind_name(member.kind),
                        format!("{owner}.{}", member.name),
                        Some(member.name_ptr.unwrap_or(member.ptr)),
                    )
                }
                None => ("member", String::new(), None),
            },
            Target::Local(binding) => (
                local_kind_name(binding.kind),
                binding.name.clone(),
                Some(binding.name_ptr),
            ),
            Target::GenericParam { name, ptr } => ("type parameter", name.clone(), Some(*ptr)),
            Target::Package(name) => ("package", name.clone(), None),
        };
        let path = ptr
            .and_then(|p| catalog.file(p.file))
            .map(|f| f.path.clone());
        let location = ptr.and_then(|p| Located::new(catalog, &p));
        Self {
            kind,
            name,
            path,
            location,
        }
    }
}

/// A name declared in a file, with its evaluated type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredName {
    pub name: String,
    pub kind: &'static str,
    #[serde(flatten)]
    pub at: Located,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A reference nothing could be found for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    pub name: String,
    #[serde(flatten)]
    pub at: Located,
}

/// Everything `check_file` found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub parse_errors: Vec<String>,
    pub declarations: Vec<DeclaredName>,
    pub unresolved: Vec<UnresolvedRef>,
    pub unreachable: Vec<Located>,
}

impl FileReport {
    /// Whether the file has anything worth flagging.
    pub fn has_findings(&self) -> bool {
        !self.parse_errors.is_empty() || !self.unresolved.is_empty() || !self.unreachable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ProjectIndex;

    #[test]
    fn decl_target_points_at_its_name() {
        let mut index = ProjectIndex::new();
        let file = index.add_file("src/Main.hx", "class Main {\n  var x:Int;\n}\n");
        let decl = index.declarations_in_file(file)[0];
        let view = TargetView::new(&index, &Target::Decl(decl));
        assert_eq!(view.kind, "class");
        assert_eq!(view.name, "Main");
        assert_eq!(view.path, Some(PathBuf::from("src/Main.hx")));
        let at = view.location.unwrap();
        assert_eq!((at.line, at.column), (1, 7));
    }

    #[test]
    fn member_target_is_qualified_by_owner() {
        let mut index = ProjectIndex::new();
        let file = index.add_file("Main.hx", "class Main {\n  var count:Int;\n}\n");
        let decl = index.declarations_in_file(file)[0];
        let member = index.members_of(decl)[0].id;
        let view = TargetView::new(&index, &Target::Member(member));
        assert_eq!(view.kind, "field");
        assert_eq!(view.name, "Main.count");
        let at = view.location.unwrap();
        assert_eq!((at.line, at.column), (2, 7));
    }

    #[test]
    fn packages_have_no_location() {
        let index = ProjectIndex::new();
        let view = TargetView::new(&index, &Target::Package("haxe".into()));
        assert_eq!(view.kind, "package");
        assert!(view.path.is_none());
        assert!(view.location.is_none());
    }

    #[test]
    fn empty_report_has_no_findings() {
        assert!(!FileReport::default().has_findings());
    }
}
