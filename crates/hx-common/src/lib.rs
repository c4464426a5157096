//! Shared front-end vocabulary: byte spans, line lookup, tokens and lexer errors.

pub mod error;
pub mod span;
pub mod token;
