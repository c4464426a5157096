//! Typed AST nodes for module-level declarations and members.

use crate::ast::expr::{ArgList, BlockExpr, Expr};
use crate::ast::ty::TypeRef;
use crate::ast::{ast_node, child_node, child_nodes, child_token, has_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Source File ──────────────────────────────────────────────────────────

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn package(&self) -> Option<PackageDecl> {
        child_node(&self.syntax)
    }

    /// Dotted package name, empty for the root package.
    pub fn package_name(&self) -> String {
        self.package()
            .and_then(|p| p.path())
            .map(|p| p.text())
            .unwrap_or_default()
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportDecl> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn usings(&self) -> impl Iterator<Item = UsingDecl> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn type_defs(&self) -> impl Iterator<Item = TypeDef> + '_ {
        self.syntax.children().filter_map(TypeDef::cast)
    }
}

ast_node!(PackageDecl, PACKAGE_DECL);

impl PackageDecl {
    pub fn path(&self) -> Option<Path> {
        child_node(&self.syntax)
    }
}

ast_node!(ImportDecl, IMPORT_DECL);

impl ImportDecl {
    pub fn path(&self) -> Option<Path> {
        child_node(&self.syntax)
    }

    /// `import pack.*;`
    pub fn is_wildcard(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::STAR)
    }

    /// The `as`/`in` alias, if any.
    pub fn alias(&self) -> Option<Name> {
        child_node::<ImportAlias>(&self.syntax).and_then(|a| child_node(&a.syntax))
    }
}

ast_node!(ImportAlias, IMPORT_ALIAS);

ast_node!(UsingDecl, USING_DECL);

impl UsingDecl {
    pub fn path(&self) -> Option<Path> {
        child_node(&self.syntax)
    }
}

// ── Names and Paths ──────────────────────────────────────────────────────

ast_node!(Name, NAME);

impl Name {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn text(&self) -> String {
        self.token().map(|t| t.text().to_string()).unwrap_or_default()
    }
}

ast_node!(NameRef, NAME_REF);

impl NameRef {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| matches!(t.kind(), SyntaxKind::IDENT | SyntaxKind::MACRO_IDENT))
    }

    pub fn text(&self) -> String {
        self.token().map(|t| t.text().to_string()).unwrap_or_default()
    }
}

ast_node!(Path, PATH);

impl Path {
    pub fn segments(&self) -> impl Iterator<Item = NameRef> + '_ {
        child_nodes(&self.syntax)
    }

    /// Segments joined with `.`.
    pub fn text(&self) -> String {
        self.segments()
            .map(|s| s.text())
            .collect::<Vec<_>>()
            .join(".")
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────

ast_node!(Metadata, METADATA);

impl Metadata {
    /// Tag name without the leading `@` or `@:`.
    pub fn name(&self) -> String {
        child_token(&self.syntax, SyntaxKind::META)
            .map(|t| {
                let text = t.text();
                text.trim_start_matches('@')
                    .trim_start_matches(':')
                    .to_string()
            })
            .unwrap_or_default()
    }

    pub fn args(&self) -> impl Iterator<Item = Expr> {
        child_node::<ArgList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.args().collect::<Vec<_>>())
    }
}

// ── Type declarations ────────────────────────────────────────────────────

/// Any module-level type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDef {
    Class(ClassDef),
    Interface(InterfaceDef),
    Enum(EnumDef),
    Abstract(AbstractDef),
    Typedef(TypedefDef),
}

impl TypeDef {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::CLASS_DEF => Some(TypeDef::Class(ClassDef { syntax: node })),
            SyntaxKind::INTERFACE_DEF => Some(TypeDef::Interface(InterfaceDef { syntax: node })),
            SyntaxKind::ENUM_DEF => Some(TypeDef::Enum(EnumDef { syntax: node })),
            SyntaxKind::ABSTRACT_DEF => Some(TypeDef::Abstract(AbstractDef { syntax: node })),
            SyntaxKind::TYPEDEF_DEF => Some(TypeDef::Typedef(TypedefDef { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            TypeDef::Class(d) => &d.syntax,
            TypeDef::Interface(d) => &d.syntax,
            TypeDef::Enum(d) => &d.syntax,
            TypeDef::Abstract(d) => &d.syntax,
            TypeDef::Typedef(d) => &d.syntax,
        }
    }

    pub fn name(&self) -> Option<Name> {
        child_node(self.syntax())
    }

    pub fn generic_param_list(&self) -> Option<GenericParamList> {
        child_node(self.syntax())
    }

    pub fn metadata(&self) -> impl Iterator<Item = Metadata> + '_ {
        child_nodes(self.syntax())
    }

    pub fn is_private(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::PRIVATE_KW)
    }

    pub fn is_extern(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::EXTERN_KW)
    }
}

ast_node!(ClassDef, CLASS_DEF);
ast_node!(InterfaceDef, INTERFACE_DEF);
ast_node!(EnumDef, ENUM_DEF);
ast_node!(AbstractDef, ABSTRACT_DEF);
ast_node!(TypedefDef, TYPEDEF_DEF);

fn clause_types<'a>(
    parent: &'a SyntaxNode,
    kind: SyntaxKind,
) -> impl Iterator<Item = TypeRef> + 'a {
    parent
        .children()
        .filter(move |c| c.kind() == kind)
        .filter_map(|c| c.children().find_map(TypeRef::cast))
}

fn members_of(parent: &SyntaxNode) -> impl Iterator<Item = Member> {
    parent
        .children()
        .find(|c| c.kind() == SyntaxKind::MEMBER_LIST)
        .into_iter()
        .flat_map(|list| list.children().filter_map(Member::cast).collect::<Vec<_>>())
}

impl ClassDef {
    /// The superclass, if any.
    pub fn extends(&self) -> Option<TypeRef> {
        clause_types(&self.syntax, SyntaxKind::EXTENDS_CLAUSE).next()
    }

    pub fn implements(&self) -> impl Iterator<Item = TypeRef> + '_ {
        clause_types(&self.syntax, SyntaxKind::IMPLEMENTS_CLAUSE)
    }

    pub fn members(&self) -> impl Iterator<Item = Member> {
        members_of(&self.syntax)
    }
}

impl InterfaceDef {
    pub fn extends(&self) -> impl Iterator<Item = TypeRef> + '_ {
        clause_types(&self.syntax, SyntaxKind::EXTENDS_CLAUSE)
    }

    pub fn members(&self) -> impl Iterator<Item = Member> {
        members_of(&self.syntax)
    }
}

impl EnumDef {
    pub fn ctors(&self) -> impl Iterator<Item = EnumCtor> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::MEMBER_LIST)
            .into_iter()
            .flat_map(|list| list.children().filter_map(EnumCtor::cast).collect::<Vec<_>>())
    }
}

impl AbstractDef {
    /// `abstract A(Underlying)`
    pub fn underlying(&self) -> Option<TypeRef> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::UNDERLYING_TYPE)
            .and_then(|u| u.children().find_map(TypeRef::cast))
    }

    pub fn from_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        clause_types(&self.syntax, SyntaxKind::FROM_CLAUSE)
    }

    pub fn to_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        clause_types(&self.syntax, SyntaxKind::TO_CLAUSE)
    }

    /// `enum abstract E(Int) { ... }`
    pub fn is_enum_abstract(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::ENUM_KW)
    }

    pub fn members(&self) -> impl Iterator<Item = Member> {
        members_of(&self.syntax)
    }
}

impl TypedefDef {
    pub fn target(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}

// ── Generic parameters ───────────────────────────────────────────────────

ast_node!(GenericParamList, GENERIC_PARAM_LIST);

impl GenericParamList {
    pub fn params(&self) -> impl Iterator<Item = GenericParam> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(GenericParam, GENERIC_PARAM);

impl GenericParam {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// Constraint types: one for `T:Foo`, several for `T:(A, B)` or `T:A & B`.
    pub fn constraints(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.syntax.children().filter_map(TypeRef::cast)
    }
}

// ── Members ──────────────────────────────────────────────────────────────

/// A field or method of a class, interface, abstract or structure type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Field(FieldDef),
    Method(MethodDef),
}

impl Member {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::FIELD_DEF => Some(Member::Field(FieldDef { syntax: node })),
            SyntaxKind::METHOD_DEF => Some(Member::Method(MethodDef { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Member::Field(f) => &f.syntax,
            Member::Method(m) => &m.syntax,
        }
    }

    pub fn name(&self) -> Option<Name> {
        child_node(self.syntax())
    }

    pub fn metadata(&self) -> impl Iterator<Item = Metadata> + '_ {
        child_nodes(self.syntax())
    }

    pub fn has_meta(&self, name: &str) -> bool {
        self.metadata().any(|m| m.name() == name)
    }

    pub fn is_static(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::STATIC_KW)
    }

    pub fn is_public(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::PUBLIC_KW)
    }

    pub fn is_private(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::PRIVATE_KW)
    }

    pub fn is_inline(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::INLINE_KW)
    }

    pub fn is_override(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::OVERRIDE_KW)
    }

    pub fn is_final(&self) -> bool {
        has_token(self.syntax(), SyntaxKind::FINAL_KW)
    }
}

ast_node!(FieldDef, FIELD_DEF);

impl FieldDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    pub fn initializer(&self) -> Option<Expr> {
        child_node::<Initializer>(&self.syntax).and_then(|i| i.expr())
    }

    /// `(get, set)` accessor texts.
    pub fn accessors(&self) -> Option<(String, String)> {
        let list = self
            .syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::ACCESSOR_LIST)?;
        let mut texts = list
            .children()
            .filter(|c| c.kind() == SyntaxKind::ACCESSOR)
            .map(|c| c.text().to_string());
        Some((texts.next()?, texts.next().unwrap_or_default()))
    }
}

ast_node!(MethodDef, METHOD_DEF);

impl MethodDef {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// `function new(...)`
    pub fn is_constructor(&self) -> bool {
        self.name()
            .and_then(|n| n.token())
            .is_some_and(|t| t.kind() == SyntaxKind::NEW_KW)
    }

    pub fn generic_param_list(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn return_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    /// The body: a block or a single expression. `None` for `function f();`.
    pub fn body(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    pub fn block(&self) -> Option<BlockExpr> {
        child_node(&self.syntax)
    }
}

ast_node!(EnumCtor, ENUM_CTOR);

impl EnumCtor {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn generic_param_list(&self) -> Option<GenericParamList> {
        child_node(&self.syntax)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn metadata(&self) -> impl Iterator<Item = Metadata> + '_ {
        child_nodes(&self.syntax)
    }
}

// ── Parameters, tags, initializers ───────────────────────────────────────

ast_node!(ParamList, PARAM_LIST);

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Param, PARAM);

impl Param {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// `?x`
    pub fn is_optional(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::QUESTION) || self.default_value().is_some()
    }

    /// `...rest`
    pub fn is_rest(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::ELLIPSIS)
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }

    pub fn default_value(&self) -> Option<Expr> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::DEFAULT_VALUE)
            .and_then(|d| d.children().find_map(Expr::cast))
    }
}

ast_node!(TypeTag, TYPE_TAG);

impl TypeTag {
    pub fn ty(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}

ast_node!(Initializer, INITIALIZER);

impl Initializer {
    pub fn expr(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}
