//! The project catalog: parsed files and the declarations they contain.
//!
//! [`ProjectIndex`] owns every source file, parses it, collects its
//! declarations and answers [`DeclarationCatalog`] queries from flat tables.
//! Editing a file rebuilds the tables and bumps the modification stamp, which
//! is what invalidates cached evaluation results.

mod collect;
mod prelude;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hx_common::span::LineIndex;
use hx_parser::ast::AstNode;
use rustc_hash::FxHashMap;

use crate::config::AnalysisConfig;
use crate::model::{
    DeclId, Declaration, DeclarationCatalog, FileId, FileInfo, Import, Member, MemberId, NodePtr,
};

/// A source file as handed to the index.
#[derive(Debug, Clone)]
struct Source {
    path: PathBuf,
    text: String,
    is_prelude: bool,
}

/// Lookup tables rebuilt from the sources.
#[derive(Debug, Default)]
struct IndexData {
    files: Vec<FileInfo>,
    decls: Vec<Declaration>,
    members: Vec<Member>,
    by_qname: FxHashMap<String, DeclId>,
    by_package: FxHashMap<String, Vec<DeclId>>,
    by_file: FxHashMap<FileId, Vec<DeclId>>,
    decl_at: FxHashMap<NodePtr, DeclId>,
    member_at: FxHashMap<NodePtr, MemberId>,
}

/// In-memory catalog of a project.
#[derive(Debug)]
pub struct ProjectIndex {
    sources: Vec<Source>,
    data: IndexData,
    indexing: AtomicBool,
    stamp: AtomicU64,
}

impl Default for ProjectIndex {
    fn default() -> Self {
        Self::with_prelude()
    }
}

impl ProjectIndex {
    /// An empty index without builtin declarations.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            data: IndexData::default(),
            indexing: AtomicBool::new(false),
            stamp: AtomicU64::new(0),
        }
    }

    /// An index that starts out with the builtin prelude.
    pub fn with_prelude() -> Self {
        let mut index = Self::new();
        for (path, text) in prelude::PRELUDE_FILES {
            index.push_source(Source {
                path: PathBuf::from(path),
                text: (*text).to_string(),
                is_prelude: true,
            });
        }
        index
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        if config.project.prelude {
            Self::with_prelude()
        } else {
            Self::new()
        }
    }

    /// Add a file and index it. Adding a path twice replaces its text.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> FileId {
        let path = path.into();
        let text = text.into();
        if let Some(id) = self.file_id(&path) {
            self.update_file(id, text);
            return id;
        }
        let id = self.push_source(Source {
            path,
            text,
            is_prelude: false,
        });
        self.bump();
        id
    }

    /// Replace a file's text. Every table is rebuilt and the stamp bumped.
    pub fn update_file(&mut self, id: FileId, text: impl Into<String>) -> bool {
        let Some(source) = self.sources.get_mut(id.0 as usize) else {
            return false;
        };
        source.text = text.into();
        log::debug!("reindexing after change to {}", source.path.display());
        self.rebuild();
        self.bump();
        true
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.sources
            .iter()
            .position(|s| s.path == path)
            .map(|i| FileId(i as u32))
    }

    pub fn text(&self, id: FileId) -> Option<&str> {
        self.sources.get(id.0 as usize).map(|s| s.text.as_str())
    }

    /// Mark the index as being filled. Results computed meanwhile are not
    /// cached.
    pub fn set_indexing(&self, in_progress: bool) {
        self.indexing.store(in_progress, Ordering::SeqCst);
    }

    /// Number of non-prelude files.
    pub fn project_file_count(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_prelude).count()
    }

    fn bump(&self) {
        self.stamp.fetch_add(1, Ordering::SeqCst);
    }

    fn push_source(&mut self, source: Source) -> FileId {
        let id = FileId(self.sources.len() as u32);
        self.index_source(id, &source);
        self.sources.push(source);
        id
    }

    fn rebuild(&mut self) {
        self.data = IndexData::default();
        let sources = std::mem::take(&mut self.sources);
        for (i, source) in sources.iter().enumerate() {
            self.index_source(FileId(i as u32), source);
        }
        self.sources = sources;
    }

    fn index_source(&mut self, id: FileId, source: &Source) {
        let parse = hx_parser::parse(&source.text);
        let tree = parse.tree();
        let package = tree.package_name();
        let module = source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let imports = tree
            .imports()
            .filter_map(|import| {
                Some(Import {
                    path: import.path()?.text(),
                    wildcard: import.is_wildcard(),
                    alias: import.alias().map(|a| a.text()),
                    ptr: NodePtr::new(id, import.syntax()),
                })
            })
            .collect();
        let usings = tree
            .usings()
            .filter_map(|u| u.path().map(|p| p.text()))
            .collect();

        let collected = collect::Collector::new(
            id,
            package.clone(),
            module.clone(),
            self.data.decls.len() as u32,
            self.data.members.len() as u32,
        )
        .collect(&tree);

        for decl in &collected.decls {
            self.data.decl_at.insert(decl.ptr, decl.id);
        }
        for member in &collected.members {
            self.data.member_at.insert(member.ptr, member.id);
        }
        for decl_id in &collected.top_level {
            let Some(decl) = collected
                .decls
                .iter()
                .find(|d| d.id == *decl_id)
            else {
                continue;
            };
            // Full path first; the short `pack.Name` form only if free.
            self.data
                .by_qname
                .entry(decl.qualified_name())
                .or_insert(decl.id);
            let short = if package.is_empty() {
                decl.name.clone()
            } else {
                format!("{package}.{}", decl.name)
            };
            self.data.by_qname.entry(short).or_insert(decl.id);
            self.data
                .by_package
                .entry(package.clone())
                .or_default()
                .push(decl.id);
        }
        self.data.by_file.insert(id, collected.top_level.clone());

        let mut decls = collected.decls;
        decls.sort_by_key(|d| d.id);
        self.data.decls.extend(decls);
        let mut members = collected.members;
        members.sort_by_key(|m| m.id);
        self.data.members.extend(members);

        if !parse.ok() {
            log::debug!(
                "{}: {} parse error(s)",
                source.path.display(),
                parse.errors().len()
            );
        }
        self.data.files.push(FileInfo {
            id,
            path: source.path.clone(),
            package,
            module,
            green: parse.green().clone(),
            line_index: LineIndex::new(&source.text),
            imports,
            usings,
            parse_errors: parse.errors().to_vec(),
            is_prelude: source.is_prelude,
        });
    }
}

impl DeclarationCatalog for ProjectIndex {
    fn find_by_qualified_name(&self, name: &str) -> Option<DeclId> {
        self.data.by_qname.get(name).copied()
    }

    fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.data.decls.get(id.0 as usize)
    }

    fn member(&self, id: MemberId) -> Option<&Member> {
        self.data.members.get(id.0 as usize)
    }

    fn file(&self, id: FileId) -> Option<&FileInfo> {
        self.data.files.get(id.0 as usize)
    }

    fn files(&self) -> Vec<FileId> {
        self.data.files.iter().map(|f| f.id).collect()
    }

    fn declarations_in_package(&self, package: &str) -> Vec<DeclId> {
        self.data.by_package.get(package).cloned().unwrap_or_default()
    }

    fn declarations_in_file(&self, file: FileId) -> Vec<DeclId> {
        self.data.by_file.get(&file).cloned().unwrap_or_default()
    }

    fn declaration_at(&self, ptr: &NodePtr) -> Option<DeclId> {
        self.data.decl_at.get(ptr).copied()
    }

    fn member_at(&self, ptr: &NodePtr) -> Option<MemberId> {
        self.data.member_at.get(ptr).copied()
    }

    fn is_package(&self, name: &str) -> bool {
        self.data.files.iter().any(|f| {
            f.package == name
                || f.package
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    fn is_indexing_in_progress(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    fn modification_stamp(&self) -> u64 {
        self.stamp.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclKind, HasMembers};

    #[test]
    fn prelude_is_indexed() {
        let index = ProjectIndex::with_prelude();
        let int = index.find_by_qualified_name("Int").unwrap();
        assert_eq!(index.declaration(int).unwrap().kind(), DeclKind::Abstract);
        assert!(index.find_by_qualified_name("haxe.Log").is_some());
        assert!(index.is_package("haxe"));
        assert_eq!(index.project_file_count(), 0);
    }

    #[test]
    fn qualified_names_cover_module_subtypes() {
        let mut index = ProjectIndex::new();
        index.add_file(
            "src/pack/Shapes.hx",
            "package pack; class Shapes {} enum Color { Red; }",
        );
        assert!(index.find_by_qualified_name("pack.Shapes").is_some());
        assert!(index.find_by_qualified_name("pack.Shapes.Color").is_some());
        assert!(index.find_by_qualified_name("pack.Color").is_some());
        assert_eq!(index.declarations_in_package("pack").len(), 2);
        assert!(index.is_package("pack"));
        assert!(!index.is_package("pac"));
    }

    #[test]
    fn lookups_by_node() {
        let mut index = ProjectIndex::new();
        let file = index.add_file("A.hx", "class A { var x:Int; }");
        let decl_id = index.declarations_in_file(file)[0];
        let decl = index.declaration(decl_id).unwrap();
        assert_eq!(index.declaration_at(&decl.ptr), Some(decl_id));
        let member = index.member(decl.member_ids()[0]).unwrap();
        assert_eq!(index.member_at(&member.ptr), Some(member.id));
        assert_eq!(index.members_of(decl_id).len(), 1);
    }

    #[test]
    fn updates_rebuild_and_bump_the_stamp() {
        let mut index = ProjectIndex::new();
        let file = index.add_file("A.hx", "class A {}");
        let before = index.modification_stamp();
        assert!(index.update_file(file, "class B {}"));
        assert!(index.modification_stamp() > before);
        assert!(index.find_by_qualified_name("A").is_none());
        assert!(index.find_by_qualified_name("A.B").is_some());
        assert_eq!(index.text(file), Some("class B {}"));
        assert!(!index.update_file(FileId(99), ""));
    }

    #[test]
    fn re_adding_a_path_replaces_it() {
        let mut index = ProjectIndex::new();
        let first = index.add_file("A.hx", "class A {}");
        let second = index.add_file("A.hx", "class A { var y:Int; }");
        assert_eq!(first, second);
        assert_eq!(index.files().len(), 1);
    }

    #[test]
    fn indexing_flag() {
        let index = ProjectIndex::new();
        assert!(!index.is_indexing_in_progress());
        index.set_indexing(true);
        assert!(index.is_indexing_in_progress());
    }
}
