//! Parser producing a lossless rowan-based CST.
//!
//! The token stream from `hx-lexer` is turned into a concrete syntax tree
//! that keeps every byte of the input, trivia included, so node text ranges
//! are byte offsets into the source. The semantic layer relies on that to
//! map editor positions to nodes.
//!
//! Parsing never fails: errors are collected and the tree always covers the
//! whole input.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

use std::fmt::Write;

use hx_common::error::LexError;
use hx_lexer::Lexer;

pub use cst::{HxLanguage, SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a source file.
///
/// Holds the green tree (immutable, cheap to clone and `Send + Sync`) and
/// the parse errors. Lexer errors are converted into parse errors.
#[derive(Debug, Clone)]
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// The underlying green node.
    pub fn green(&self) -> &rowan::GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The typed root of the tree.
    pub fn tree(&self) -> ast::item::SourceFile {
        ast::item::SourceFile {
            syntax: self.syntax(),
        }
    }
}

/// Parse a source file into a CST.
pub fn parse(source: &str) -> Parse {
    let (tokens, lex_errors) = Lexer::tokenize_with_errors(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    finish(p, lex_errors)
}

/// Parse a single expression (wrapped in a SOURCE_FILE node).
pub fn parse_expression(source: &str) -> Parse {
    let (tokens, lex_errors) = Lexer::tokenize_with_errors(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_expression_file(&mut p);
    finish(p, lex_errors)
}

fn finish(p: parser::Parser<'_>, lex_errors: Vec<LexError>) -> Parse {
    let (green, parse_errors) = p.build_tree();
    let mut errors: Vec<ParseError> = lex_errors
        .into_iter()
        .map(|e| ParseError::new(e.kind.to_string(), e.span))
        .collect();
    errors.extend(parse_errors);
    errors.sort_by_key(|e| e.span.start);
    Parse { green, errors }
}

/// Render a tree as an indented `KIND@start..end` listing. Trivia tokens are
/// left out; other tokens show their text.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    write_tree(&mut out, node, 0);
    out
}

fn write_tree(out: &mut String, node: &SyntaxNode, depth: usize) {
    let range = node.text_range();
    let _ = writeln!(
        out,
        "{:indent$}{:?}@{}..{}",
        "",
        node.kind(),
        u32::from(range.start()),
        u32::from(range.end()),
        indent = depth * 2
    );
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => write_tree(out, &n, depth + 1),
            rowan::NodeOrToken::Token(t) => {
                if t.kind().is_trivia() || t.kind() == SyntaxKind::EOF {
                    continue;
                }
                let range = t.text_range();
                let _ = writeln!(
                    out,
                    "{:indent$}{:?}@{}..{} {:?}",
                    "",
                    t.kind(),
                    u32::from(range.start()),
                    u32::from(range.end()),
                    t.text(),
                    indent = (depth + 1) * 2
                );
            }
        }
    }
}
