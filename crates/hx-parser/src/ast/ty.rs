//! Typed AST nodes for type expressions.

use crate::ast::item::{Member, Name, Path, TypeTag};
use crate::ast::{ast_node, child_node, child_nodes, has_token, AstNode};
use crate::cst::SyntaxNode;
use crate::syntax_kind::SyntaxKind;

/// A written type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Path(PathType),
    Anon(AnonType),
    Function(FunctionType),
    Paren(ParenType),
}

impl TypeRef {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::PATH_TYPE => Some(TypeRef::Path(PathType { syntax: node })),
            SyntaxKind::ANON_TYPE => Some(TypeRef::Anon(AnonType { syntax: node })),
            SyntaxKind::FUNCTION_TYPE => Some(TypeRef::Function(FunctionType { syntax: node })),
            SyntaxKind::PAREN_TYPE => Some(TypeRef::Paren(ParenType { syntax: node })),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            TypeRef::Path(t) => &t.syntax,
            TypeRef::Anon(t) => &t.syntax,
            TypeRef::Function(t) => &t.syntax,
            TypeRef::Paren(t) => &t.syntax,
        }
    }
}

ast_node!(PathType, PATH_TYPE);

impl PathType {
    pub fn path(&self) -> Option<Path> {
        child_node(&self.syntax)
    }

    /// `a.b.C` as written.
    pub fn name(&self) -> String {
        self.path().map(|p| p.text()).unwrap_or_default()
    }

    pub fn generic_args(&self) -> impl Iterator<Item = TypeRef> {
        self.syntax
            .children()
            .find(|c| c.kind() == SyntaxKind::GENERIC_ARG_LIST)
            .into_iter()
            .flat_map(|list| list.children().filter_map(TypeRef::cast).collect::<Vec<_>>())
    }
}

ast_node!(AnonType, ANON_TYPE);

impl AnonType {
    /// Short-notation fields: `{ x:Int, ?y:String }`.
    pub fn fields(&self) -> impl Iterator<Item = AnonField> + '_ {
        child_nodes(&self.syntax)
    }

    /// Class-notation members: `{ var x:Int; function f():Void; }`.
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.syntax.children().filter_map(Member::cast)
    }

    /// `> Base` extensions.
    pub fn extensions(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.syntax
            .children()
            .filter(|c| c.kind() == SyntaxKind::STRUCT_EXTENSION)
            .filter_map(|c| c.children().find_map(TypeRef::cast))
    }
}

ast_node!(AnonField, ANON_FIELD);

impl AnonField {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn is_optional(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::QUESTION)
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        child_node(&self.syntax)
    }
}

ast_node!(FunctionType, FUNCTION_TYPE);

impl FunctionType {
    pub fn args(&self) -> impl Iterator<Item = FunctionTypeArg> + '_ {
        child_nodes(&self.syntax)
    }

    /// The type after the last arrow.
    pub fn return_type(&self) -> Option<TypeRef> {
        self.syntax.children().filter_map(TypeRef::cast).last()
    }

    /// Whether the argument list is the old-style `Void -> R` (no arguments).
    pub fn is_nullary(&self) -> bool {
        let args: Vec<_> = self.args().collect();
        args.is_empty()
            || (args.len() == 1
                && args[0].name().is_none()
                && matches!(args[0].ty(), Some(TypeRef::Path(p)) if p.name() == "Void"))
    }
}

ast_node!(FunctionTypeArg, FUNCTION_TYPE_ARG);

impl FunctionTypeArg {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn is_optional(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::QUESTION)
    }

    pub fn is_rest(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::ELLIPSIS)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}

ast_node!(ParenType, PAREN_TYPE);

impl ParenType {
    pub fn inner(&self) -> Option<TypeRef> {
        self.syntax.children().find_map(TypeRef::cast)
    }
}
