//! Event-based parser.
//!
//! Parse functions call `open()` to start a node, `advance()` to consume
//! tokens and `close()` to finish a node with its real kind. The events are
//! turned into a rowan green tree by `build_tree()`; `open_before()` wraps an
//! already-completed node through a forward-parent link (the matklad /
//! rust-analyzer technique).
//!
//! # Trivia
//!
//! Whitespace and comments are never seen by lookahead. They are not part of
//! the event stream either: `build_tree()` splices them in in front of the
//! next token or node, so trivia always belongs to the enclosing node rather
//! than the node that follows it and node ranges start at their first real
//! token.
//!
//! # Recovery
//!
//! Errors are recorded and parsing continues. Loops that could stall check
//! for progress and wrap the offending token in an `ERROR_NODE`.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod types;

use hx_common::span::Span;
use hx_common::token::Token;

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug)]
enum Event {
    /// Start a node. `kind` is TOMBSTONE until `close()` patches it.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    Close,
    /// Consume the next significant token.
    Advance,
}

/// A started, not yet closed node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// A completed node, usable with [`Parser::open_before`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    /// Index of the next unconsumed token (trivia included).
    pos: usize,
    events: Vec<Event>,
    source: &'src str,
    errors: Vec<ParseError>,
    prev: SyntaxKind,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
            prev: SyntaxKind::EOF,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Kind of the `n`th significant token ahead; `EOF` past the end.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_index(n)
            .map(|i| SyntaxKind::from(self.tokens[i].kind))
            .unwrap_or(SyntaxKind::EOF)
    }

    fn nth_index(&self, n: usize) -> Option<usize> {
        let mut remaining = n;
        let mut pos = self.pos;
        while pos < self.tokens.len() {
            if !self.tokens[pos].kind.is_trivia() {
                if remaining == 0 {
                    return Some(pos);
                }
                remaining -= 1;
            }
            pos += 1;
        }
        None
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'src str {
        match self.nth_index(n) {
            Some(i) => {
                let span = self.tokens[i].span;
                &self.source[span.start as usize..span.end as usize]
            }
            None => "",
        }
    }

    pub(crate) fn current_text(&self) -> &'src str {
        self.nth_text(0)
    }

    pub(crate) fn current_span(&self) -> Span {
        match self.nth_index(0) {
            Some(i) => self.tokens[i].span,
            None => Span::at(self.source.len() as u32),
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Whether the current token is the contextual keyword `word`
    /// (`from`, `to`, `as`, `is`, ...), which lexes as an identifier.
    pub(crate) fn at_contextual(&self, word: &str) -> bool {
        self.at(SyntaxKind::IDENT) && self.current_text() == word
    }

    /// Whether the current token is `first` immediately followed, without
    /// trivia, by `second`. Used to recognise `>>` and `>=` built from `>`.
    pub(crate) fn at_joined(&self, first: SyntaxKind, second: SyntaxKind) -> bool {
        match self.nth_index(0) {
            Some(i) if i + 1 < self.tokens.len() => {
                SyntaxKind::from(self.tokens[i].kind) == first
                    && SyntaxKind::from(self.tokens[i + 1].kind) == second
            }
            _ => false,
        }
    }

    /// Whether the current `(` has a matching `)` that is followed by `kind_after`.
    /// Distinguishes `(a, b) -> e` lambdas and `(A) -> B` function types from
    /// parenthesised expressions and types.
    pub(crate) fn paren_followed_by(&self, kind_after: SyntaxKind) -> bool {
        if !self.at(SyntaxKind::L_PAREN) {
            return false;
        }
        let mut depth = 0usize;
        let mut significant = self
            .tokens
            .iter()
            .skip(self.pos)
            .filter(|t| !t.kind.is_trivia())
            .map(|t| SyntaxKind::from(t.kind));
        while let Some(kind) = significant.next() {
            match kind {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return significant.next() == Some(kind_after);
                    }
                }
                SyntaxKind::EOF => return false,
                _ => {}
            }
        }
        false
    }

    /// Kind of the most recently consumed significant token.
    pub(crate) fn prev(&self) -> SyntaxKind {
        self.prev
    }

    /// Position marker used by loops to detect a lack of progress.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    // ── Node management ────────────────────────────────────────────────

    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Open a node that becomes the parent of an already completed node.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = self.open();
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open {
            kind: slot_kind, ..
        } = &mut self.events[m.index]
        {
            *slot_kind = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Token consumption ──────────────────────────────────────────────

    pub(crate) fn advance(&mut self) {
        if let Some(i) = self.nth_index(0) {
            self.events.push(Event::Advance);
            self.prev = SyntaxKind::from(self.tokens[i].kind);
            self.pos = i + 1;
        }
    }

    /// Wrap the current token in an ERROR_NODE and move past it.
    pub(crate) fn advance_with_error(&mut self, message: &str) {
        let m = self.open();
        self.error(message);
        if !self.at(SyntaxKind::EOF) {
            self.advance();
        }
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(&format!("expected {}", describe(kind)));
            false
        }
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an identifier (or a keyword used as a name) as a NAME node.
    pub(crate) fn name(&mut self) -> bool {
        if self.at(SyntaxKind::IDENT) || self.at(SyntaxKind::MACRO_IDENT) {
            let m = self.open();
            self.advance();
            self.close(m, SyntaxKind::NAME);
            true
        } else {
            self.error("expected a name");
            false
        }
    }

    /// Skip tokens until one of `kinds` (or EOF) is current, wrapping the
    /// skipped tokens in a single ERROR_NODE.
    pub(crate) fn recover_until(&mut self, kinds: &[SyntaxKind]) {
        if self.at_any(kinds) || self.at(SyntaxKind::EOF) {
            return;
        }
        let m = self.open();
        while !self.at_any(kinds) && !self.at(SyntaxKind::EOF) {
            self.advance();
        }
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    // ── Errors ─────────────────────────────────────────────────────────

    pub(crate) fn error(&mut self, message: &str) {
        let span = self.current_span();
        // Repeated errors at one position add nothing.
        if self.errors.last().is_some_and(|e| e.span == span) {
            return;
        }
        self.errors.push(ParseError::new(message, span));
    }

    pub(crate) fn error_with_related(&mut self, message: &str, related: Span, related_msg: &str) {
        let span = self.current_span();
        self.errors
            .push(ParseError::with_related(message, span, related_msg, related));
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert the events into a green tree, splicing trivia back in.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut token_pos = 0usize;
        let mut depth = 0usize;
        let mut forward_parents: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent,
                } => {
                    forward_parents.clear();
                    forward_parents.push(kind);
                    let mut next = forward_parent;
                    while let Some(fp) = next {
                        next = match self.events[fp] {
                            Event::Open {
                                kind,
                                forward_parent,
                            } => {
                                forward_parents.push(kind);
                                forward_parent
                            }
                            _ => None,
                        };
                        // Started here; skip it when the loop reaches it.
                        self.events[fp] = Event::Open {
                            kind: SyntaxKind::TOMBSTONE,
                            forward_parent: None,
                        };
                    }

                    if forward_parents.iter().all(|k| *k == SyntaxKind::TOMBSTONE) {
                        continue;
                    }
                    // Leading trivia belongs to the parent, except at the root.
                    if depth > 0 {
                        self.flush_trivia(&mut builder, &mut token_pos);
                    }
                    // Outermost wrapper first.
                    for kind in forward_parents.iter().rev() {
                        if *kind != SyntaxKind::TOMBSTONE {
                            builder.start_node(rowan::SyntaxKind(*kind as u16));
                            depth += 1;
                        }
                    }
                }
                Event::Close => {
                    builder.finish_node();
                    depth = depth.saturating_sub(1);
                }
                Event::Advance => {
                    self.flush_trivia(&mut builder, &mut token_pos);
                    if let Some(token) = self.tokens.get(token_pos) {
                        let kind = SyntaxKind::from(token.kind);
                        let text = &self.source[token.span.start as usize..token.span.end as usize];
                        builder.token(rowan::SyntaxKind(kind as u16), text);
                        token_pos += 1;
                    }
                }
            }
        }

        (builder.finish(), self.errors)
    }

    fn flush_trivia(&self, builder: &mut rowan::GreenNodeBuilder<'_>, token_pos: &mut usize) {
        while let Some(token) = self.tokens.get(*token_pos) {
            if !token.kind.is_trivia() {
                break;
            }
            let kind = SyntaxKind::from(token.kind);
            let text = &self.source[token.span.start as usize..token.span.end as usize];
            builder.token(rowan::SyntaxKind(kind as u16), text);
            *token_pos += 1;
        }
    }
}

/// Human-readable token description for "expected ..." messages.
pub(crate) fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::SEMICOLON => "`;`",
        SyntaxKind::COLON => "`:`",
        SyntaxKind::COMMA => "`,`",
        SyntaxKind::L_PAREN => "`(`",
        SyntaxKind::R_PAREN => "`)`",
        SyntaxKind::L_BRACE => "`{`",
        SyntaxKind::R_BRACE => "`}`",
        SyntaxKind::L_BRACKET => "`[`",
        SyntaxKind::R_BRACKET => "`]`",
        SyntaxKind::GT => "`>`",
        SyntaxKind::EQ => "`=`",
        SyntaxKind::ARROW => "`->`",
        SyntaxKind::FAT_ARROW => "`=>`",
        SyntaxKind::IN_KW => "`in`",
        SyntaxKind::WHILE_KW => "`while`",
        SyntaxKind::IDENT => "an identifier",
        _ => "a token",
    }
}

// ── Top level ──────────────────────────────────────────────────────────

/// SOURCE_FILE: package, imports, usings and type declarations until EOF.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();
    while !p.at(SyntaxKind::EOF) {
        let before = p.position();
        items::parse_top_level(p);
        if p.position() == before {
            p.advance_with_error("expected a declaration");
        }
    }
    p.advance(); // EOF
    p.close(root, SyntaxKind::SOURCE_FILE);
}

/// A single expression wrapped in SOURCE_FILE. Used by tests and tooling.
pub(crate) fn parse_expression_file(p: &mut Parser) {
    let root = p.open();
    expressions::expr(p);
    p.eat(SyntaxKind::SEMICOLON);
    if !p.at(SyntaxKind::EOF) {
        p.recover_until(&[]);
        p.error("unexpected input after expression");
    }
    p.advance();
    p.close(root, SyntaxKind::SOURCE_FILE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hx_lexer::Lexer;

    fn parser(source: &str) -> Parser<'_> {
        Parser::new(Lexer::tokenize(source), source)
    }

    #[test]
    fn lookahead_skips_trivia() {
        let p = parser("a /* c */ b\n  c");
        assert_eq!(p.current(), SyntaxKind::IDENT);
        assert_eq!(p.nth_text(1), "b");
        assert_eq!(p.nth_text(2), "c");
        assert_eq!(p.nth(3), SyntaxKind::EOF);
    }

    #[test]
    fn trivia_attaches_to_parent_not_next_node() {
        let source = "x  y";
        let mut p = parser(source);
        let root = p.open();
        let a = p.open();
        p.advance();
        p.close(a, SyntaxKind::NAME_REF);
        let b = p.open();
        p.advance();
        p.close(b, SyntaxKind::NAME_REF);
        p.advance();
        p.close(root, SyntaxKind::SOURCE_FILE);
        let (green, errors) = p.build_tree();
        assert!(errors.is_empty());

        let root = crate::cst::SyntaxNode::new_root(green);
        assert_eq!(root.text().to_string(), source);
        let ranges: Vec<_> = root
            .children()
            .map(|n| (u32::from(n.text_range().start()), u32::from(n.text_range().end())))
            .collect();
        assert_eq!(ranges, vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn open_before_wraps_completed_node() {
        let source = "f(1)";
        let mut p = parser(source);
        let root = p.open();
        let name = p.open();
        p.advance();
        let done = p.close(name, SyntaxKind::NAME_REF);
        let call = p.open_before(done);
        p.advance();
        p.advance();
        p.advance();
        p.close(call, SyntaxKind::CALL_EXPR);
        p.advance();
        p.close(root, SyntaxKind::SOURCE_FILE);

        let (green, _) = p.build_tree();
        let root = crate::cst::SyntaxNode::new_root(green);
        let call = root.first_child().expect("call node");
        assert_eq!(call.kind(), SyntaxKind::CALL_EXPR);
        assert_eq!(
            call.first_child().map(|n| n.kind()),
            Some(SyntaxKind::NAME_REF)
        );
    }

    #[test]
    fn nested_open_before_chains() {
        // ((a).b).c built by wrapping twice
        let source = "a.b.c";
        let mut p = parser(source);
        let root = p.open();
        let a = p.open();
        p.advance();
        let mut done = p.close(a, SyntaxKind::NAME_REF);
        for _ in 0..2 {
            let m = p.open_before(done);
            p.advance();
            p.advance();
            done = p.close(m, SyntaxKind::FIELD_ACCESS);
        }
        p.advance();
        p.close(root, SyntaxKind::SOURCE_FILE);
        let (green, _) = p.build_tree();
        let root = crate::cst::SyntaxNode::new_root(green);
        let outer = root.first_child().expect("outer");
        assert_eq!(outer.kind(), SyntaxKind::FIELD_ACCESS);
        let inner = outer.first_child().expect("inner");
        assert_eq!(inner.kind(), SyntaxKind::FIELD_ACCESS);
        assert_eq!(inner.text().to_string(), "a.b");
    }

    #[test]
    fn expect_records_error_without_consuming() {
        let mut p = parser("x");
        assert!(!p.expect(SyntaxKind::SEMICOLON));
        assert_eq!(p.current(), SyntaxKind::IDENT);
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].message, "expected `;`");
    }

    #[test]
    fn joined_tokens() {
        let p = parser(">>");
        assert!(p.at_joined(SyntaxKind::GT, SyntaxKind::GT));
        let p = parser("> >");
        assert!(!p.at_joined(SyntaxKind::GT, SyntaxKind::GT));
    }
}
