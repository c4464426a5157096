//! Rowan plumbing: the language marker and node/token aliases.

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HxLanguage {}

impl rowan::Language for HxLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        debug_assert!(raw.0 <= SyntaxKind::OBJECT_FIELD as u16);
        // Safety: SyntaxKind is #[repr(u16)] with contiguous discriminants and
        // rowan only hands back kinds produced by `kind_to_raw`.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<HxLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<HxLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<HxLanguage>;
