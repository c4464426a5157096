//! Typed AST layer on top of the rowan CST.
//!
//! The wrappers are newtypes around `SyntaxNode` with typed accessors that
//! walk the tree on demand, following the rust-analyzer pattern.
//!
//! # Architecture
//!
//! - [`AstNode`] trait: every typed wrapper implements `cast()` and `syntax()`.
//! - `ast_node!` macro: generates the boilerplate for each wrapper type.
//! - Helpers: [`child_node`], [`child_nodes`] and [`child_token`].
//! - Closed enums over node families: [`expr::Expr`], [`ty::TypeRef`],
//!   [`item::TypeDef`], [`item::Member`] and [`expr::AnyFunction`].

pub mod expr;
pub mod item;
pub mod ty;

use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Trait for typed AST nodes that wrap a rowan `SyntaxNode`.
pub trait AstNode: Sized {
    /// Returns `Some(Self)` if the node's kind matches, `None` otherwise.
    fn cast(node: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;
}

/// Generate a typed wrapper struct and its `AstNode` impl.
macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == SyntaxKind::$kind {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

pub(crate) use ast_node;

/// Find the first child node that can be cast to type `N`.
pub fn child_node<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

/// Find all child nodes that can be cast to type `N`.
pub fn child_nodes<'a, N: AstNode + 'a>(parent: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
    parent.children().filter_map(N::cast)
}

/// Find the first child token with the given kind.
pub fn child_token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|it| it.kind() == kind)
}

/// Whether the node has a direct child token of the given kind.
pub fn has_token(parent: &SyntaxNode, kind: SyntaxKind) -> bool {
    child_token(parent, kind).is_some()
}
