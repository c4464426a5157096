use hx_common::token::TokenKind;
use hx_lexer::Lexer;
use insta::assert_snapshot;

/// One line per significant token: kind, byte range and text.
fn dump(source: &str) -> String {
    Lexer::tokenize(source)
        .into_iter()
        .filter(|tok| !tok.kind.is_trivia())
        .map(|tok| {
            let text = &source[tok.span.start as usize..tok.span.end as usize];
            format!("{:?} {}..{} {:?}", tok.kind, tok.span.start, tok.span.end, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn enum_declaration() {
    assert_snapshot!(dump("enum E { A(x:Int); }"), @r###"
    Enum 0..4 "enum"
    Ident 5..6 "E"
    LBrace 7..8 "{"
    Ident 9..10 "A"
    LParen 10..11 "("
    Ident 11..12 "x"
    Colon 12..13 ":"
    Ident 13..16 "Int"
    RParen 16..17 ")"
    Semicolon 17..18 ";"
    RBrace 19..20 "}"
    Eof 20..20 ""
    "###);
}

#[test]
fn operators() {
    assert_snapshot!(dump("a += b ?? c => d -> e ... f"), @r###"
    Ident 0..1 "a"
    CompoundAssign 2..4 "+="
    Ident 5..6 "b"
    QuestionQuestion 7..9 "??"
    Ident 10..11 "c"
    FatArrow 12..14 "=>"
    Ident 15..16 "d"
    Arrow 17..19 "->"
    Ident 20..21 "e"
    Ellipsis 22..25 "..."
    Ident 26..27 "f"
    Eof 27..27 ""
    "###);
}

#[test]
fn nested_generics_close_with_single_angles() {
    let kinds: Vec<TokenKind> = Lexer::tokenize("Array<Array<Int>>")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident,
            TokenKind::Lt,
            TokenKind::Ident,
            TokenKind::Lt,
            TokenKind::Ident,
            TokenKind::Gt,
            TokenKind::Gt,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn strings_keep_quotes_and_escapes() {
    assert_snapshot!(dump(r#"'it\'s' "a\"b""#), @r###"
    StringLiteral 0..7 "'it\\'s'"
    StringLiteral 8..14 "\"a\\\"b\""
    Eof 14..14 ""
    "###);
}

#[test]
fn every_byte_is_covered() {
    let source = "package a.b;\nimport a.B as C;\n/* x */ class D<T:Int> {}\n";
    let tokens = Lexer::tokenize(source);
    let mut expected_start = 0;
    for tok in &tokens {
        assert_eq!(tok.span.start, expected_start, "gap before {:?}", tok);
        expected_start = tok.span.end;
    }
    assert_eq!(expected_start as usize, source.len());
}
