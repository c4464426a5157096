//! Lossless tokenizer.
//!
//! Every byte of the input ends up in exactly one token, trivia included, so
//! the parser can build a CST whose text ranges are the original source
//! offsets. Malformed input never stops the lexer: the offending characters
//! become `Error` tokens and a [`LexError`] is recorded.

mod cursor;

use cursor::Cursor;
use hx_common::error::{LexError, LexErrorKind};
use hx_common::span::Span;
use hx_common::token::{keyword_from_str, Token, TokenKind};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
    /// True until a non-trivia token has been seen on the current line.
    at_line_start: bool,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            at_line_start: true,
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Like [`Lexer::tokenize`] but also returns the collected errors.
    pub fn tokenize_with_errors(source: &str) -> (Vec<Token>, Vec<LexError>) {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        (tokens, lexer.errors)
    }

    fn next_token(&mut self) -> Token {
        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        let token = match c {
            '\n' => self.single(TokenKind::Newline, start),
            '\r' if self.cursor.peek_next() == Some('\n') => {
                self.cursor.advance();
                self.single(TokenKind::Newline, start)
            }
            c if c.is_whitespace() => {
                self.cursor
                    .eat_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                if self.cursor.pos() == start {
                    // a lone '\r'
                    self.cursor.advance();
                }
                Token::new(TokenKind::Whitespace, start, self.cursor.pos())
            }
            // Conditional compilation lines are carried as comments.
            '#' if self.at_line_start => {
                self.cursor.eat_while(|c| c != '\n');
                Token::new(TokenKind::LineComment, start, self.cursor.pos())
            }
            '/' if self.cursor.peek_next() == Some('/') => {
                self.cursor.eat_while(|c| c != '\n');
                Token::new(TokenKind::LineComment, start, self.cursor.pos())
            }
            '/' if self.cursor.peek_next() == Some('*') => self.lex_block_comment(start),

            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ':' => self.single(TokenKind::Colon, start),
            '~' => self.single(TokenKind::Tilde, start),

            '.' => self.lex_dot(start),
            '=' => self.lex_eq(start),
            '!' => self.lex_with_eq(start, TokenKind::Bang, TokenKind::NotEq),
            '<' => self.lex_lt(start),
            '>' => self.lex_with_eq(start, TokenKind::Gt, TokenKind::GtEq),
            '+' => self.lex_doubled(start, '+', TokenKind::Plus, TokenKind::PlusPlus),
            '-' => self.lex_minus(start),
            '*' => self.lex_with_eq(start, TokenKind::Star, TokenKind::CompoundAssign),
            '/' => self.lex_with_eq(start, TokenKind::Slash, TokenKind::CompoundAssign),
            '%' => self.lex_with_eq(start, TokenKind::Percent, TokenKind::CompoundAssign),
            '^' => self.lex_with_eq(start, TokenKind::Caret, TokenKind::CompoundAssign),
            '&' => self.lex_doubled(start, '&', TokenKind::Amp, TokenKind::AmpAmp),
            '|' => self.lex_doubled(start, '|', TokenKind::Pipe, TokenKind::PipePipe),
            '?' => self.lex_question(start),

            '0'..='9' => self.lex_number(start),
            '"' | '\'' => self.lex_string(start, c),
            '@' => self.lex_meta(start),
            '$' if self.cursor.peek_next().is_some_and(is_ident_start) => {
                self.cursor.advance();
                self.cursor.eat_while(is_ident_continue);
                Token::new(TokenKind::MacroIdent, start, self.cursor.pos())
            }
            c if is_ident_start(c) => self.lex_ident(start),

            other => {
                self.cursor.advance();
                let end = self.cursor.pos();
                self.errors.push(LexError::new(
                    LexErrorKind::UnexpectedCharacter(other),
                    Span::new(start, end),
                ));
                Token::new(TokenKind::Error, start, end)
            }
        };

        match token.kind {
            TokenKind::Newline => self.at_line_start = true,
            kind if kind.is_trivia() => {}
            _ => self.at_line_start = false,
        }
        token
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// `x` or `x=`.
    fn lex_with_eq(&mut self, start: u32, plain: TokenKind, with_eq: TokenKind) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') { with_eq } else { plain };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `x`, `xx` or `x=` (compound assignment).
    fn lex_doubled(&mut self, start: u32, c: char, single: TokenKind, double: TokenKind) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat(c) {
            double
        } else if self.cursor.eat('=') {
            TokenKind::CompoundAssign
        } else {
            single
        };
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('-') {
            TokenKind::MinusMinus
        } else if self.cursor.eat('>') {
            TokenKind::Arrow
        } else if self.cursor.eat('=') {
            TokenKind::CompoundAssign
        } else {
            TokenKind::Minus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::EqEq
        } else if self.cursor.eat('>') {
            TokenKind::FatArrow
        } else {
            TokenKind::Eq
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `<`, `<=`, `<<`, `<<=`. `>>` is never produced: the parser joins two
    /// adjacent `>` so nested generic argument lists close cleanly.
    fn lex_lt(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('=') {
            TokenKind::LtEq
        } else if self.cursor.eat('<') {
            if self.cursor.eat('=') {
                TokenKind::CompoundAssign
            } else {
                TokenKind::Shl
            }
        } else {
            TokenKind::Lt
        };
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_question(&mut self, start: u32) -> Token {
        self.cursor.advance();
        let kind = if self.cursor.eat('?') {
            if self.cursor.eat('=') {
                TokenKind::CompoundAssign
            } else {
                TokenKind::QuestionQuestion
            }
        } else {
            TokenKind::Question
        };
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_dot(&mut self, start: u32) -> Token {
        if self.cursor.starts_with("...") {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.advance();
            return Token::new(TokenKind::Ellipsis, start, self.cursor.pos());
        }
        if self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            if matches!(self.cursor.peek(), Some('e' | 'E')) {
                self.lex_exponent();
            }
            return Token::new(TokenKind::FloatLiteral, start, self.cursor.pos());
        }
        self.single(TokenKind::Dot, start)
    }

    // ── Comments ───────────────────────────────────────────────────────

    fn lex_block_comment(&mut self, start: u32) -> Token {
        self.cursor.advance(); // '/'
        self.cursor.advance(); // '*'
        loop {
            if self.cursor.starts_with("*/") {
                self.cursor.advance();
                self.cursor.advance();
                break;
            }
            if self.cursor.advance().is_none() {
                self.errors.push(LexError::new(
                    LexErrorKind::UnterminatedBlockComment,
                    Span::new(start, self.cursor.pos()),
                ));
                break;
            }
        }
        Token::new(TokenKind::BlockComment, start, self.cursor.pos())
    }

    // ── Literals ───────────────────────────────────────────────────────

    fn lex_number(&mut self, start: u32) -> Token {
        if self.cursor.starts_with("0x") || self.cursor.starts_with("0X") {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            return Token::new(TokenKind::IntLiteral, start, self.cursor.pos());
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        let mut kind = TokenKind::IntLiteral;

        // `1.5` is a float, `1...5` is an interval and `1.foo` never occurs.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            kind = TokenKind::FloatLiteral;
        }
        if matches!(self.cursor.peek(), Some('e' | 'E'))
            && self
                .cursor
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.lex_exponent();
            kind = TokenKind::FloatLiteral;
        }
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_exponent(&mut self) {
        self.cursor.advance(); // 'e' / 'E'
        if matches!(self.cursor.peek(), Some('+' | '-')) {
            self.cursor.advance();
        }
        self.cursor.eat_while(|c| c.is_ascii_digit());
    }

    /// String literal with either quote style. Interpolation inside single
    /// quotes stays part of the literal text.
    fn lex_string(&mut self, start: u32, quote: char) -> Token {
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    self.errors.push(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ));
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        Token::new(TokenKind::StringLiteral, start, self.cursor.pos())
    }

    fn lex_meta(&mut self, start: u32) -> Token {
        self.cursor.advance(); // '@'
        self.cursor.eat(':');
        self.cursor.eat_while(|c| is_ident_continue(c) || c == '.');
        Token::new(TokenKind::Meta, start, self.cursor.pos())
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, start, self.cursor.pos())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn var_declaration() {
        assert_eq!(
            kinds("var x:Int = 42;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn interval_is_not_a_float() {
        assert_eq!(
            kinds("0...10"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::Ellipsis,
                TokenKind::IntLiteral,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("1.5e3"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lossless_round_trip() {
        let source = "class A {\n  // hi\n  /* block */ var s = 'x$y';\n}\n";
        let text: String = Lexer::tokenize(source)
            .iter()
            .map(|t| &source[t.span.start as usize..t.span.end as usize])
            .collect();
        assert_eq!(text, source);
    }

    #[test]
    fn metadata_and_macro_idents() {
        assert_eq!(
            kinds("@:forward $name @native"),
            vec![
                TokenKind::Meta,
                TokenKind::MacroIdent,
                TokenKind::Meta,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn conditional_compilation_is_trivia() {
        assert_eq!(
            kinds("#if js\nvar x;\n#end"),
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (tokens, errors) = Lexer::tokenize_with_errors("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
    }
}
