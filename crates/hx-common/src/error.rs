use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error. Collected alongside the token stream; lexing never stops early.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    UnterminatedString,
    UnterminatedBlockComment,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedBlockComment => write!(f, "unterminated block comment"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.kind, self.span.start, self.span.end)
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_span() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('#'), Span::new(3, 4));
        assert_eq!(err.to_string(), "unexpected character: '#' at 3..4");
    }

    #[test]
    fn kind_messages() {
        assert_eq!(
            LexErrorKind::UnterminatedString.to_string(),
            "unterminated string literal"
        );
        assert_eq!(
            LexErrorKind::UnterminatedBlockComment.to_string(),
            "unterminated block comment"
        );
    }
}
