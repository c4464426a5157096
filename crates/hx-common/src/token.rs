use serde::Serialize;

use crate::span::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the analysed language.
///
/// The lexer is lossless: whitespace, newlines and comments are tokens too,
/// so the concatenated token texts reproduce the input byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Abstract,
    Break,
    Case,
    Cast,
    Catch,
    Class,
    Continue,
    Default,
    Do,
    Dynamic,
    Else,
    Enum,
    Extends,
    Extern,
    False,
    Final,
    For,
    Function,
    If,
    Implements,
    Import,
    In,
    Inline,
    Interface,
    Macro,
    New,
    Null,
    Override,
    Package,
    Private,
    Public,
    Return,
    Static,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typedef,
    Untyped,
    Using,
    Var,
    While,

    // ── Operators ──────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `=`
    Eq,
    /// `+=`, `-=`, `*=`, `/=`, `%=`, `&=`, `|=`, `^=`, `<<=`, `??=`
    CompoundAssign,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// `?`
    Question,
    /// `??`
    QuestionQuestion,
    /// `...`
    Ellipsis,

    // ── Delimiters ─────────────────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // ── Punctuation ────────────────────────────────────────────────────
    Comma,
    Dot,
    Colon,
    Semicolon,

    // ── Literals ───────────────────────────────────────────────────────
    /// `42`, `0xFF`
    IntLiteral,
    /// `3.14`, `1e10`, `.5`
    FloatLiteral,
    /// `"text"` or `'text'`, quotes included.
    StringLiteral,

    // ── Names ──────────────────────────────────────────────────────────
    Ident,
    /// `$name` macro reification identifier.
    MacroIdent,
    /// `@name` or `@:name` metadata tag.
    Meta,

    // ── Trivia ─────────────────────────────────────────────────────────
    Whitespace,
    Newline,
    /// `// ...`
    LineComment,
    /// `/* ... */`
    BlockComment,

    // ── Special ────────────────────────────────────────────────────────
    Eof,
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }
}

/// Map an identifier-shaped word to its keyword, if it is one.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "abstract" => TokenKind::Abstract,
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "cast" => TokenKind::Cast,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "continue" => TokenKind::Continue,
        "default" => TokenKind::Default,
        "do" => TokenKind::Do,
        "dynamic" => TokenKind::Dynamic,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "extends" => TokenKind::Extends,
        "extern" => TokenKind::Extern,
        "false" => TokenKind::False,
        "final" => TokenKind::Final,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "implements" => TokenKind::Implements,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "inline" => TokenKind::Inline,
        "interface" => TokenKind::Interface,
        "macro" => TokenKind::Macro,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "override" => TokenKind::Override,
        "package" => TokenKind::Package,
        "private" => TokenKind::Private,
        "public" => TokenKind::Public,
        "return" => TokenKind::Return,
        "static" => TokenKind::Static,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typedef" => TokenKind::Typedef,
        "untyped" => TokenKind::Untyped,
        "using" => TokenKind::Using,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_round_trip_through_debug_names() {
        let words = [
            "abstract", "break", "case", "cast", "catch", "class", "continue", "default", "do",
            "dynamic", "else", "enum", "extends", "extern", "false", "final", "for",
            "function", "if", "implements", "import", "in", "inline", "interface", "macro",
            "new", "null", "override", "package", "private", "public", "return", "static",
            "super", "switch", "this", "throw", "true", "try", "typedef", "untyped", "using",
            "var", "while",
        ];
        for word in words {
            let kind = keyword_from_str(word)
                .unwrap_or_else(|| panic!("{word:?} should be a keyword"));
            assert_eq!(format!("{kind:?}").to_lowercase(), word);
        }
    }

    #[test]
    fn contextual_words_are_identifiers() {
        // `from`, `to`, `get`, `set`, `is` and `as` only mean something in context.
        for word in ["from", "to", "get", "set", "is", "as", "never", "trace", "Int"] {
            assert_eq!(keyword_from_str(word), None, "{word}");
        }
    }

    #[test]
    fn trivia_kinds() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(TokenKind::BlockComment.is_trivia());
        assert!(!TokenKind::Ident.is_trivia());
        assert!(!TokenKind::Meta.is_trivia());
    }
}
