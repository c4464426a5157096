//! Declaration model: the read-only view the core has of declared types.
//!
//! Declarations, members and generic parameters are owned by a
//! [`DeclarationCatalog`]. The core refers to them by id and never mutates
//! them. Everything that points into source (bodies, type annotations) is a
//! [`NodePtr`]: a file id plus node kind and range. Pointers are `Send` and
//! stay valid until the catalog replaces the file they point into.
//!
//! There is one [`Declaration`] type for every kind of declaration; the
//! kind-specific parts live in [`DeclShape`]. Code that only needs one
//! capability goes through [`HasMembers`], [`HasGenerics`] or
//! [`HasSupertypes`].

use std::path::PathBuf;

use hx_common::span::{LineIndex, Span};
use hx_parser::{ParseError, SyntaxKind, SyntaxNode};
use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId(pub u32);

// ── Node pointers ────────────────────────────────────────────────────────

/// A thread-safe handle to a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePtr {
    pub file: FileId,
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl NodePtr {
    pub fn new(file: FileId, node: &SyntaxNode) -> Self {
        Self {
            file,
            kind: node.kind(),
            range: node.text_range(),
        }
    }

    /// Find the node again in a tree built from the same file.
    pub fn to_node(&self, root: &SyntaxNode) -> Option<SyntaxNode> {
        if !root.text_range().contains_range(self.range) {
            return None;
        }
        let start = match root.covering_element(self.range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent()?,
        };
        start
            .ancestors()
            .find(|n| n.kind() == self.kind && n.text_range() == self.range)
    }

    pub fn span(&self) -> Span {
        Span::new(self.range.start().into(), self.range.end().into())
    }

    pub fn start(&self) -> TextSize {
        self.range.start()
    }
}

// ── Shared pieces ────────────────────────────────────────────────────────

/// A type annotation as written: the pointer to its type node plus its
/// source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub ptr: NodePtr,
    pub text: String,
}

/// `@name(args)` or `@:name(args)`; arguments are kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_public: bool,
    pub is_private: bool,
    pub is_inline: bool,
    pub is_extern: bool,
    pub is_final: bool,
    pub is_override: bool,
    pub is_dynamic: bool,
    pub is_macro: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOwner {
    Decl(DeclId),
    Member(MemberId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    pub name: String,
    pub index: usize,
    pub constraints: Vec<TypeTag>,
    pub owner: GenericOwner,
    pub ptr: NodePtr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub type_tag: Option<TypeTag>,
    pub optional: bool,
    pub rest: bool,
    /// The default value expression, if any.
    pub default: Option<NodePtr>,
    pub ptr: NodePtr,
}

// ── Declarations ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Abstract,
    Typedef,
    /// A structure type written inline: `{ x:Int }`.
    Anonymous,
    /// An object literal, which defines a structure type of its own.
    ObjectLiteral,
}

/// Kind-specific part of a [`Declaration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclShape {
    Class {
        extends: Option<TypeTag>,
        implements: Vec<TypeTag>,
    },
    Interface {
        extends: Vec<TypeTag>,
    },
    Enum,
    Abstract {
        underlying: Option<TypeTag>,
        from: Vec<TypeTag>,
        to: Vec<TypeTag>,
        is_enum_abstract: bool,
    },
    Typedef {
        target: Option<TypeTag>,
    },
    Anonymous {
        extensions: Vec<TypeTag>,
    },
    ObjectLiteral,
}

impl DeclShape {
    pub fn kind(&self) -> DeclKind {
        match self {
            DeclShape::Class { .. } => DeclKind::Class,
            DeclShape::Interface { .. } => DeclKind::Interface,
            DeclShape::Enum => DeclKind::Enum,
            DeclShape::Abstract { .. } => DeclKind::Abstract,
            DeclShape::Typedef { .. } => DeclKind::Typedef,
            DeclShape::Anonymous { .. } => DeclKind::Anonymous,
            DeclShape::ObjectLiteral => DeclKind::ObjectLiteral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: DeclId,
    /// Simple name; the rendered structure for anonymous types.
    pub name: String,
    pub package: String,
    pub module: String,
    pub file: FileId,
    /// The declaring node (`CLASS_DEF`, `ANON_TYPE`, `OBJECT_LITERAL`, ...).
    pub ptr: NodePtr,
    /// The `NAME` node, absent for anonymous declarations.
    pub name_ptr: Option<NodePtr>,
    pub generics: Vec<GenericParam>,
    pub members: Vec<MemberId>,
    pub modifiers: Modifiers,
    pub meta: Vec<Meta>,
    pub shape: DeclShape,
}

impl Declaration {
    pub fn kind(&self) -> DeclKind {
        self.shape.kind()
    }

    /// `pack.Module.Name`, or `pack.Name` when the module is named after the
    /// type.
    pub fn qualified_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.package.is_empty() {
            parts.push(&self.package);
        }
        if self.module != self.name {
            parts.push(&self.module);
        }
        parts.push(&self.name);
        parts.join(".")
    }

    pub fn meta(&self, name: &str) -> Option<&Meta> {
        self.meta.iter().find(|m| m.name == name)
    }

    pub fn has_meta(&self, name: &str) -> bool {
        self.meta(name).is_some()
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, DeclShape::Enum)
    }

    pub fn is_enum_abstract(&self) -> bool {
        matches!(
            self.shape,
            DeclShape::Abstract {
                is_enum_abstract: true,
                ..
            }
        )
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind(), DeclKind::Anonymous | DeclKind::ObjectLiteral)
    }

    /// Whether `@:forward` sends `name` on to the underlying type.
    pub fn forwards(&self, name: &str) -> bool {
        match self.meta("forward") {
            Some(meta) => meta.args.is_empty() || meta.args.iter().any(|a| a == name),
            None => false,
        }
    }

    /// Underlying type of an abstract.
    pub fn underlying(&self) -> Option<&TypeTag> {
        match &self.shape {
            DeclShape::Abstract { underlying, .. } => underlying.as_ref(),
            _ => None,
        }
    }

    /// `from` casts of an abstract.
    pub fn from_casts(&self) -> &[TypeTag] {
        match &self.shape {
            DeclShape::Abstract { from, .. } => from,
            _ => &[],
        }
    }

    /// `to` casts of an abstract.
    pub fn to_casts(&self) -> &[TypeTag] {
        match &self.shape {
            DeclShape::Abstract { to, .. } => to,
            _ => &[],
        }
    }
}

// ── Members ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    Field,
    Method,
    EnumCtor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub owner: DeclId,
    pub name: String,
    pub kind: MemberKind,
    /// Declaring node: `FIELD_DEF`, `METHOD_DEF`, `ENUM_CTOR`, `ANON_FIELD`
    /// or `OBJECT_FIELD`.
    pub ptr: NodePtr,
    pub name_ptr: Option<NodePtr>,
    /// Field type, or method return type.
    pub type_tag: Option<TypeTag>,
    pub params: Vec<Param>,
    pub generics: Vec<GenericParam>,
    pub modifiers: Modifiers,
    /// Property accessors, `(get, set)`.
    pub accessors: Option<(String, String)>,
    pub meta: Vec<Meta>,
    /// Method body, field initializer, or object field value.
    pub body: Option<NodePtr>,
    /// `?x` structure fields and `@:optional` fields.
    pub optional: bool,
}

impl Member {
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Method && self.name == "new"
    }

    pub fn has_meta(&self, name: &str) -> bool {
        self.meta.iter().any(|m| m.name == name)
    }
}

// ── Capabilities ─────────────────────────────────────────────────────────

/// Anything that declares members.
pub trait HasMembers {
    fn member_ids(&self) -> &[MemberId];
}

/// Anything that declares generic parameters.
pub trait HasGenerics {
    fn generic_params(&self) -> &[GenericParam];

    fn generic_param(&self, name: &str) -> Option<&GenericParam> {
        self.generic_params().iter().find(|g| g.name == name)
    }
}

/// Anything with nominal supertypes: superclass and interfaces, extended
/// interfaces, structure extensions, or a typedef's target.
pub trait HasSupertypes {
    fn supertype_tags(&self) -> Vec<&TypeTag>;
}

impl HasMembers for Declaration {
    fn member_ids(&self) -> &[MemberId] {
        &self.members
    }
}

impl HasGenerics for Declaration {
    fn generic_params(&self) -> &[GenericParam] {
        &self.generics
    }
}

impl HasGenerics for Member {
    fn generic_params(&self) -> &[GenericParam] {
        &self.generics
    }
}

impl HasSupertypes for DeclShape {
    fn supertype_tags(&self) -> Vec<&TypeTag> {
        match self {
            DeclShape::Class {
                extends,
                implements,
            } => extends.iter().chain(implements).collect(),
            DeclShape::Interface { extends } => extends.iter().collect(),
            DeclShape::Anonymous { extensions } => extensions.iter().collect(),
            DeclShape::Typedef { target } => target.iter().collect(),
            DeclShape::Enum | DeclShape::Abstract { .. } | DeclShape::ObjectLiteral => Vec::new(),
        }
    }
}

impl HasSupertypes for Declaration {
    fn supertype_tags(&self) -> Vec<&TypeTag> {
        self.shape.supertype_tags()
    }
}

// ── Files ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Dotted path without the `.*`.
    pub path: String,
    pub wildcard: bool,
    pub alias: Option<String>,
    pub ptr: NodePtr,
}

impl Import {
    /// The name this import makes visible, if it names a single thing.
    pub fn visible_name(&self) -> Option<&str> {
        if self.wildcard {
            return None;
        }
        self.alias
            .as_deref()
            .or_else(|| self.path.rsplit('.').next())
    }
}

/// An indexed source file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub id: FileId,
    pub path: PathBuf,
    pub package: String,
    /// File stem.
    pub module: String,
    pub green: GreenNode,
    pub line_index: LineIndex,
    pub imports: Vec<Import>,
    /// `using` paths in source order.
    pub usings: Vec<String>,
    pub parse_errors: Vec<ParseError>,
    pub is_prelude: bool,
}

impl FileInfo {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────

/// The store of declarations the core reads from.
///
/// Implementations must not change while a session reads them; edits go
/// through the owner between sessions and bump
/// [`modification_stamp`](DeclarationCatalog::modification_stamp).
pub trait DeclarationCatalog: Send + Sync {
    fn find_by_qualified_name(&self, name: &str) -> Option<DeclId>;

    fn declaration(&self, id: DeclId) -> Option<&Declaration>;

    fn member(&self, id: MemberId) -> Option<&Member>;

    fn file(&self, id: FileId) -> Option<&FileInfo>;

    fn files(&self) -> Vec<FileId>;

    /// Top-level declarations of a package.
    fn declarations_in_package(&self, package: &str) -> Vec<DeclId>;

    /// Top-level declarations of a file, in source order.
    fn declarations_in_file(&self, file: FileId) -> Vec<DeclId>;

    /// The declaration registered for a declaring node.
    fn declaration_at(&self, ptr: &NodePtr) -> Option<DeclId>;

    /// The member registered for a declaring node.
    fn member_at(&self, ptr: &NodePtr) -> Option<MemberId>;

    /// Whether any package has this name or starts with `name.`.
    fn is_package(&self, name: &str) -> bool;

    /// True while the catalog is still being filled; results computed in
    /// that state must not be cached.
    fn is_indexing_in_progress(&self) -> bool;

    /// Incremented whenever any source changes.
    fn modification_stamp(&self) -> u64;

    fn members_of(&self, id: DeclId) -> Vec<&Member> {
        self.declaration(id)
            .map(|d| d.members.iter().filter_map(|m| self.member(*m)).collect())
            .unwrap_or_default()
    }

    fn supertypes_of(&self, id: DeclId) -> Vec<TypeTag> {
        self.declaration(id)
            .map(|d| d.supertype_tags().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    fn generic_parameters_of(&self, owner: GenericOwner) -> &[GenericParam] {
        match owner {
            GenericOwner::Decl(id) => self.declaration(id).map(|d| d.generic_params()),
            GenericOwner::Member(id) => self.member(id).map(|m| m.generic_params()),
        }
        .unwrap_or(&[])
    }

    /// The innermost reference node at `offset`: a `NAME_REF`, `this`,
    /// `super` or a property accessor.
    fn node_at(&self, file: FileId, offset: u32) -> Option<NodePtr> {
        let root = self.file(file)?.syntax();
        let token = token_at(&root, offset)?;
        let node = token.parent_ancestors().find(|n| {
            matches!(
                n.kind(),
                SyntaxKind::NAME_REF
                    | SyntaxKind::NAME
                    | SyntaxKind::THIS_EXPR
                    | SyntaxKind::SUPER_EXPR
                    | SyntaxKind::ACCESSOR
            )
        })?;
        Some(NodePtr::new(file, &node))
    }
}

/// The non-trivia token at `offset`, preferring identifiers when the offset
/// sits between two tokens.
pub fn token_at(root: &SyntaxNode, offset: u32) -> Option<hx_parser::SyntaxToken> {
    let offset = TextSize::from(offset);
    if !root.text_range().contains_inclusive(offset) {
        return None;
    }
    let candidates: Vec<_> = match root.token_at_offset(offset) {
        rowan::TokenAtOffset::None => Vec::new(),
        rowan::TokenAtOffset::Single(t) => vec![t],
        rowan::TokenAtOffset::Between(a, b) => vec![b, a],
    };
    candidates
        .iter()
        .find(|t| matches!(t.kind(), SyntaxKind::IDENT | SyntaxKind::MACRO_IDENT))
        .or_else(|| candidates.iter().find(|t| !t.kind().is_trivia()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> TypeTag {
        TypeTag {
            ptr: NodePtr {
                file: FileId(0),
                kind: SyntaxKind::PATH_TYPE,
                range: TextRange::new(0.into(), 1.into()),
            },
            text: text.to_string(),
        }
    }

    fn decl(shape: DeclShape) -> Declaration {
        Declaration {
            id: DeclId(0),
            name: "Point".into(),
            package: "geo".into(),
            module: "Shapes".into(),
            file: FileId(0),
            ptr: tag("x").ptr,
            name_ptr: None,
            generics: Vec::new(),
            members: Vec::new(),
            modifiers: Modifiers::default(),
            meta: Vec::new(),
            shape,
        }
    }

    #[test]
    fn qualified_name_skips_matching_module() {
        let mut d = decl(DeclShape::Enum);
        assert_eq!(d.qualified_name(), "geo.Shapes.Point");
        d.module = "Point".into();
        assert_eq!(d.qualified_name(), "geo.Point");
        d.package.clear();
        assert_eq!(d.qualified_name(), "Point");
    }

    #[test]
    fn supertypes_per_shape() {
        let class = DeclShape::Class {
            extends: Some(tag("Base")),
            implements: vec![tag("I1"), tag("I2")],
        };
        let names: Vec<_> = class.supertype_tags().iter().map(|t| t.text.clone()).collect();
        assert_eq!(names, ["Base", "I1", "I2"]);

        let abs = DeclShape::Abstract {
            underlying: Some(tag("Int")),
            from: vec![tag("Int")],
            to: vec![],
            is_enum_abstract: false,
        };
        assert!(abs.supertype_tags().is_empty());
    }

    #[test]
    fn forward_metadata() {
        let mut d = decl(DeclShape::Enum);
        assert!(!d.forwards("length"));
        d.meta.push(Meta {
            name: "forward".into(),
            args: vec!["length".into()],
        });
        assert!(d.forwards("length"));
        assert!(!d.forwards("push"));
        d.meta[0].args.clear();
        assert!(d.forwards("push"));
    }

    #[test]
    fn import_visible_name() {
        let ptr = tag("x").ptr;
        let plain = Import {
            path: "a.b.Thing".into(),
            wildcard: false,
            alias: None,
            ptr,
        };
        assert_eq!(plain.visible_name(), Some("Thing"));
        let aliased = Import {
            alias: Some("T".into()),
            ..plain.clone()
        };
        assert_eq!(aliased.visible_name(), Some("T"));
        let wildcard = Import {
            wildcard: true,
            ..plain
        };
        assert_eq!(wildcard.visible_name(), None);
    }

    #[test]
    fn node_ptr_round_trip() {
        let parse = hx_parser::parse("class A { var x:Int; }");
        let root = parse.syntax();
        let field = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::FIELD_DEF)
            .unwrap();
        let ptr = NodePtr::new(FileId(0), &field);
        assert_eq!(ptr.to_node(&root), Some(field));
        assert_eq!(ptr.span(), Span::new(10, 20));
    }
}
