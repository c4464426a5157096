//! Parse error type.

use std::fmt;

use hx_common::span::Span;

/// A parse error with its primary location and an optional related location
/// (for example where an unclosed delimiter was opened).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub related: Option<(String, Span)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            related: None,
        }
    }

    pub fn with_related(
        message: impl Into<String>,
        span: Span,
        related_message: impl Into<String>,
        related_span: Span,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            related: Some((related_message.into(), related_span)),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some((msg, span)) = &self.related {
            write!(f, " ({msg} at {}..{})", span.start, span.end)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_related() {
        let err = ParseError::new("expected `;`", Span::new(4, 5));
        assert_eq!(err.to_string(), "expected `;`");
    }

    #[test]
    fn display_with_related() {
        let err = ParseError::with_related(
            "expected `}`",
            Span::new(40, 40),
            "block opened here",
            Span::new(10, 11),
        );
        assert_eq!(err.to_string(), "expected `}` (block opened here at 10..11)");
        assert_eq!(err.related.map(|(_, s)| s), Some(Span::new(10, 11)));
    }
}
