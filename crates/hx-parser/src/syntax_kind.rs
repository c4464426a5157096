//! SyntaxKind enum for the CST.
//!
//! Token kinds are mapped 1:1 from [`TokenKind`]; node kinds follow them.
//! The first two values are sentinels used by the event-based parser.

use hx_common::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Placeholder kind for opened-but-not-yet-closed parser events.
    TOMBSTONE = 0,
    /// Wrapper for tokens that could not be parsed.
    ERROR_NODE = 1,

    // ── Keywords ───────────────────────────────────────────────────────
    ABSTRACT_KW,
    BREAK_KW,
    CASE_KW,
    CAST_KW,
    CATCH_KW,
    CLASS_KW,
    CONTINUE_KW,
    DEFAULT_KW,
    DO_KW,
    DYNAMIC_KW,
    ELSE_KW,
    ENUM_KW,
    EXTENDS_KW,
    EXTERN_KW,
    FALSE_KW,
    FINAL_KW,
    FOR_KW,
    FUNCTION_KW,
    IF_KW,
    IMPLEMENTS_KW,
    IMPORT_KW,
    IN_KW,
    INLINE_KW,
    INTERFACE_KW,
    MACRO_KW,
    NEW_KW,
    NULL_KW,
    OVERRIDE_KW,
    PACKAGE_KW,
    PRIVATE_KW,
    PUBLIC_KW,
    RETURN_KW,
    STATIC_KW,
    SUPER_KW,
    SWITCH_KW,
    THIS_KW,
    THROW_KW,
    TRUE_KW,
    TRY_KW,
    TYPEDEF_KW,
    UNTYPED_KW,
    USING_KW,
    VAR_KW,
    WHILE_KW,

    // ── Operators ──────────────────────────────────────────────────────
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    PLUS_PLUS,
    MINUS_MINUS,
    EQ_EQ,
    NOT_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    AMP_AMP,
    PIPE_PIPE,
    BANG,
    AMP,
    PIPE,
    CARET,
    TILDE,
    SHL,
    EQ,
    COMPOUND_ASSIGN,
    ARROW,
    FAT_ARROW,
    QUESTION,
    QUESTION_QUESTION,
    ELLIPSIS,

    // ── Delimiters and punctuation ─────────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    COMMA,
    DOT,
    COLON,
    SEMICOLON,

    // ── Literals and names ─────────────────────────────────────────────
    INT_LITERAL,
    FLOAT_LITERAL,
    STRING_LITERAL,
    IDENT,
    MACRO_IDENT,
    META,

    // ── Trivia ─────────────────────────────────────────────────────────
    WHITESPACE,
    NEWLINE,
    LINE_COMMENT,
    BLOCK_COMMENT,

    EOF,
    ERROR,

    // ── Top level ──────────────────────────────────────────────────────
    SOURCE_FILE,
    PACKAGE_DECL,
    IMPORT_DECL,
    /// `as Name` / `in Name` at the end of an import.
    IMPORT_ALIAS,
    USING_DECL,
    /// Dotted name: `a.b.C`. Each segment is a NAME_REF.
    PATH,
    /// `@:name(args)`
    METADATA,

    // ── Type declarations ──────────────────────────────────────────────
    CLASS_DEF,
    INTERFACE_DEF,
    ENUM_DEF,
    ABSTRACT_DEF,
    TYPEDEF_DEF,
    /// Declaring identifier of any declaration, parameter or binding.
    NAME,
    GENERIC_PARAM_LIST,
    GENERIC_PARAM,
    EXTENDS_CLAUSE,
    IMPLEMENTS_CLAUSE,
    /// `(T)` after an abstract's name.
    UNDERLYING_TYPE,
    FROM_CLAUSE,
    TO_CLAUSE,
    MEMBER_LIST,

    // ── Members ────────────────────────────────────────────────────────
    FIELD_DEF,
    /// `(get, set)` on a property.
    ACCESSOR_LIST,
    ACCESSOR,
    METHOD_DEF,
    ENUM_CTOR,
    PARAM_LIST,
    PARAM,
    /// `: Type`
    TYPE_TAG,
    /// `= expr` on a parameter.
    DEFAULT_VALUE,
    /// `= expr` on a field or local variable.
    INITIALIZER,

    // ── Types ──────────────────────────────────────────────────────────
    PATH_TYPE,
    GENERIC_ARG_LIST,
    ANON_TYPE,
    ANON_FIELD,
    /// `> Base,` inside a structure type.
    STRUCT_EXTENSION,
    FUNCTION_TYPE,
    FUNCTION_TYPE_ARG,
    PAREN_TYPE,

    // ── Expressions ────────────────────────────────────────────────────
    LITERAL,
    NAME_REF,
    THIS_EXPR,
    SUPER_EXPR,
    PAREN_EXPR,
    CALL_EXPR,
    ARG_LIST,
    FIELD_ACCESS,
    INDEX_EXPR,
    NEW_EXPR,
    BINARY_EXPR,
    PREFIX_EXPR,
    POSTFIX_EXPR,
    TERNARY_EXPR,
    /// `(expr : Type)`
    CHECK_TYPE_EXPR,
    CAST_EXPR,
    UNTYPED_EXPR,
    BLOCK,
    IF_EXPR,
    ELSE_BRANCH,
    SWITCH_EXPR,
    SWITCH_CASE,
    GUARD,
    CASE_BODY,
    WHILE_EXPR,
    DO_WHILE_EXPR,
    FOR_EXPR,
    /// `x in e` / `k => v in e` inside a for loop header.
    FOR_HEAD,
    TRY_EXPR,
    CATCH_CLAUSE,
    RETURN_EXPR,
    BREAK_EXPR,
    CONTINUE_EXPR,
    THROW_EXPR,
    VAR_DECL,
    /// `function name(...)` or `function (...)` in expression position.
    FUNCTION_EXPR,
    LAMBDA_EXPR,
    ARRAY_LITERAL,
    MAP_LITERAL,
    MAP_ENTRY,
    ARRAY_COMPREHENSION,
    OBJECT_LITERAL,
    OBJECT_FIELD,
}

impl SyntaxKind {
    /// Trivia is preserved in the CST but invisible to parser lookahead.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE
                | SyntaxKind::NEWLINE
                | SyntaxKind::LINE_COMMENT
                | SyntaxKind::BLOCK_COMMENT
        )
    }

    pub fn is_type_def(self) -> bool {
        matches!(
            self,
            SyntaxKind::CLASS_DEF
                | SyntaxKind::INTERFACE_DEF
                | SyntaxKind::ENUM_DEF
                | SyntaxKind::ABSTRACT_DEF
                | SyntaxKind::TYPEDEF_DEF
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::PATH_TYPE
                | SyntaxKind::ANON_TYPE
                | SyntaxKind::FUNCTION_TYPE
                | SyntaxKind::PAREN_TYPE
        )
    }

    /// Nodes that open a function body: returns inside them belong to them.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::METHOD_DEF | SyntaxKind::FUNCTION_EXPR | SyntaxKind::LAMBDA_EXPR
        )
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Abstract => SyntaxKind::ABSTRACT_KW,
            TokenKind::Break => SyntaxKind::BREAK_KW,
            TokenKind::Case => SyntaxKind::CASE_KW,
            TokenKind::Cast => SyntaxKind::CAST_KW,
            TokenKind::Catch => SyntaxKind::CATCH_KW,
            TokenKind::Class => SyntaxKind::CLASS_KW,
            TokenKind::Continue => SyntaxKind::CONTINUE_KW,
            TokenKind::Default => SyntaxKind::DEFAULT_KW,
            TokenKind::Do => SyntaxKind::DO_KW,
            TokenKind::Dynamic => SyntaxKind::DYNAMIC_KW,
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::Enum => SyntaxKind::ENUM_KW,
            TokenKind::Extends => SyntaxKind::EXTENDS_KW,
            TokenKind::Extern => SyntaxKind::EXTERN_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::Final => SyntaxKind::FINAL_KW,
            TokenKind::For => SyntaxKind::FOR_KW,
            TokenKind::Function => SyntaxKind::FUNCTION_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::Implements => SyntaxKind::IMPLEMENTS_KW,
            TokenKind::Import => SyntaxKind::IMPORT_KW,
            TokenKind::In => SyntaxKind::IN_KW,
            TokenKind::Inline => SyntaxKind::INLINE_KW,
            TokenKind::Interface => SyntaxKind::INTERFACE_KW,
            TokenKind::Macro => SyntaxKind::MACRO_KW,
            TokenKind::New => SyntaxKind::NEW_KW,
            TokenKind::Null => SyntaxKind::NULL_KW,
            TokenKind::Override => SyntaxKind::OVERRIDE_KW,
            TokenKind::Package => SyntaxKind::PACKAGE_KW,
            TokenKind::Private => SyntaxKind::PRIVATE_KW,
            TokenKind::Public => SyntaxKind::PUBLIC_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::Static => SyntaxKind::STATIC_KW,
            TokenKind::Super => SyntaxKind::SUPER_KW,
            TokenKind::Switch => SyntaxKind::SWITCH_KW,
            TokenKind::This => SyntaxKind::THIS_KW,
            TokenKind::Throw => SyntaxKind::THROW_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,
            TokenKind::Try => SyntaxKind::TRY_KW,
            TokenKind::Typedef => SyntaxKind::TYPEDEF_KW,
            TokenKind::Untyped => SyntaxKind::UNTYPED_KW,
            TokenKind::Using => SyntaxKind::USING_KW,
            TokenKind::Var => SyntaxKind::VAR_KW,
            TokenKind::While => SyntaxKind::WHILE_KW,
            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Percent => SyntaxKind::PERCENT,
            TokenKind::PlusPlus => SyntaxKind::PLUS_PLUS,
            TokenKind::MinusMinus => SyntaxKind::MINUS_MINUS,
            TokenKind::EqEq => SyntaxKind::EQ_EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::AmpAmp => SyntaxKind::AMP_AMP,
            TokenKind::PipePipe => SyntaxKind::PIPE_PIPE,
            TokenKind::Bang => SyntaxKind::BANG,
            TokenKind::Amp => SyntaxKind::AMP,
            TokenKind::Pipe => SyntaxKind::PIPE,
            TokenKind::Caret => SyntaxKind::CARET,
            TokenKind::Tilde => SyntaxKind::TILDE,
            TokenKind::Shl => SyntaxKind::SHL,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::CompoundAssign => SyntaxKind::COMPOUND_ASSIGN,
            TokenKind::Arrow => SyntaxKind::ARROW,
            TokenKind::FatArrow => SyntaxKind::FAT_ARROW,
            TokenKind::Question => SyntaxKind::QUESTION,
            TokenKind::QuestionQuestion => SyntaxKind::QUESTION_QUESTION,
            TokenKind::Ellipsis => SyntaxKind::ELLIPSIS,
            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,
            TokenKind::IntLiteral => SyntaxKind::INT_LITERAL,
            TokenKind::FloatLiteral => SyntaxKind::FLOAT_LITERAL,
            TokenKind::StringLiteral => SyntaxKind::STRING_LITERAL,
            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::MacroIdent => SyntaxKind::MACRO_IDENT,
            TokenKind::Meta => SyntaxKind::META,
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::LineComment => SyntaxKind::LINE_COMMENT,
            TokenKind::BlockComment => SyntaxKind::BLOCK_COMMENT,
            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_come_first() {
        assert_eq!(SyntaxKind::TOMBSTONE as u16, 0);
        assert_eq!(SyntaxKind::ERROR_NODE as u16, 1);
    }

    #[test]
    fn trivia_tokens_map_to_trivia_kinds() {
        for kind in [
            TokenKind::Whitespace,
            TokenKind::Newline,
            TokenKind::LineComment,
            TokenKind::BlockComment,
        ] {
            assert!(SyntaxKind::from(kind).is_trivia(), "{kind:?}");
        }
        assert!(!SyntaxKind::from(TokenKind::Ident).is_trivia());
    }

    #[test]
    fn node_kinds_follow_token_kinds() {
        assert!(SyntaxKind::SOURCE_FILE > SyntaxKind::ERROR);
        assert!(SyntaxKind::OBJECT_FIELD > SyntaxKind::SOURCE_FILE);
    }
}
