//! Module-level declarations and their members.
//!
//! Metadata and modifiers are parsed inside the node of the declaration or
//! member they belong to, so `@:forward abstract A(B) {}` yields an
//! ABSTRACT_DEF whose first child is a METADATA node.

use crate::syntax_kind::SyntaxKind;

use super::{expressions, types, Parser};

/// Tokens that may start a member; used to resynchronise after errors.
const MEMBER_START: &[SyntaxKind] = &[
    SyntaxKind::VAR_KW,
    SyntaxKind::FINAL_KW,
    SyntaxKind::FUNCTION_KW,
    SyntaxKind::PUBLIC_KW,
    SyntaxKind::PRIVATE_KW,
    SyntaxKind::STATIC_KW,
    SyntaxKind::INLINE_KW,
    SyntaxKind::OVERRIDE_KW,
    SyntaxKind::EXTERN_KW,
    SyntaxKind::MACRO_KW,
    SyntaxKind::DYNAMIC_KW,
    SyntaxKind::META,
    SyntaxKind::R_BRACE,
];

const TOP_LEVEL_START: &[SyntaxKind] = &[
    SyntaxKind::PACKAGE_KW,
    SyntaxKind::IMPORT_KW,
    SyntaxKind::USING_KW,
    SyntaxKind::CLASS_KW,
    SyntaxKind::INTERFACE_KW,
    SyntaxKind::ENUM_KW,
    SyntaxKind::ABSTRACT_KW,
    SyntaxKind::TYPEDEF_KW,
    SyntaxKind::PRIVATE_KW,
    SyntaxKind::EXTERN_KW,
    SyntaxKind::META,
];

pub(crate) fn parse_top_level(p: &mut Parser) {
    match p.current() {
        SyntaxKind::PACKAGE_KW => parse_package(p),
        SyntaxKind::IMPORT_KW => parse_import(p),
        SyntaxKind::USING_KW => parse_using(p),
        SyntaxKind::SEMICOLON => p.advance(),
        _ => parse_type_def(p),
    }
}

fn parse_package(p: &mut Parser) {
    let m = p.open();
    p.advance(); // package
    if p.at(SyntaxKind::IDENT) {
        parse_path(p);
    }
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::PACKAGE_DECL);
}

/// `import a.b.C;`, `import a.b.*;`, `import a.b.C.field as f;`
fn parse_import(p: &mut Parser) {
    let m = p.open();
    p.advance(); // import
    parse_path(p);
    if p.at(SyntaxKind::DOT) && p.nth(1) == SyntaxKind::STAR {
        p.advance();
        p.advance();
    }
    if p.at_contextual("as") || p.at(SyntaxKind::IN_KW) {
        let alias = p.open();
        p.advance();
        p.name();
        p.close(alias, SyntaxKind::IMPORT_ALIAS);
    }
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::IMPORT_DECL);
}

fn parse_using(p: &mut Parser) {
    let m = p.open();
    p.advance(); // using
    parse_path(p);
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::USING_DECL);
}

/// PATH: dot-separated NAME_REF segments. Stops before `.*`.
pub(crate) fn parse_path(p: &mut Parser) {
    let m = p.open();
    name_ref(p);
    while p.at(SyntaxKind::DOT) && p.nth(1) == SyntaxKind::IDENT {
        p.advance(); // .
        name_ref(p);
    }
    p.close(m, SyntaxKind::PATH);
}

fn name_ref(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::MACRO_IDENT) {
        let m = p.open();
        p.advance();
        p.close(m, SyntaxKind::NAME_REF);
    } else {
        p.error("expected an identifier");
    }
}

/// Zero or more `@meta` / `@:meta(args)` annotations.
pub(crate) fn parse_metadata(p: &mut Parser) {
    while p.at(SyntaxKind::META) {
        let m = p.open();
        // Arguments only when the paren touches the tag: `@:native("x")`.
        let has_args = p.at_joined(SyntaxKind::META, SyntaxKind::L_PAREN);
        p.advance();
        if has_args {
            expressions::parse_arg_list(p);
        }
        p.close(m, SyntaxKind::METADATA);
    }
}

fn parse_type_def(p: &mut Parser) {
    let m = p.open();
    parse_metadata(p);
    loop {
        match p.current() {
            SyntaxKind::PRIVATE_KW | SyntaxKind::EXTERN_KW | SyntaxKind::FINAL_KW => p.advance(),
            // `abstract class`
            SyntaxKind::ABSTRACT_KW if p.nth(1) == SyntaxKind::CLASS_KW => p.advance(),
            _ => break,
        }
    }

    match p.current() {
        SyntaxKind::CLASS_KW => {
            p.advance();
            parse_class_body(p, false);
            p.close(m, SyntaxKind::CLASS_DEF);
        }
        SyntaxKind::INTERFACE_KW => {
            p.advance();
            parse_class_body(p, true);
            p.close(m, SyntaxKind::INTERFACE_DEF);
        }
        SyntaxKind::ENUM_KW if p.nth(1) == SyntaxKind::ABSTRACT_KW => {
            p.advance(); // enum
            p.advance(); // abstract
            parse_abstract_body(p);
            p.close(m, SyntaxKind::ABSTRACT_DEF);
        }
        SyntaxKind::ENUM_KW => {
            p.advance();
            parse_enum_body(p);
            p.close(m, SyntaxKind::ENUM_DEF);
        }
        SyntaxKind::ABSTRACT_KW => {
            p.advance();
            parse_abstract_body(p);
            p.close(m, SyntaxKind::ABSTRACT_DEF);
        }
        SyntaxKind::TYPEDEF_KW => {
            p.advance();
            parse_typedef_body(p);
            p.close(m, SyntaxKind::TYPEDEF_DEF);
        }
        _ => {
            p.error("expected a type declaration");
            if !p.at(SyntaxKind::EOF) {
                p.advance();
            }
            p.recover_until(TOP_LEVEL_START);
            p.close(m, SyntaxKind::ERROR_NODE);
        }
    }
}

/// NAME GENERIC_PARAM_LIST? EXTENDS_CLAUSE* IMPLEMENTS_CLAUSE* MEMBER_LIST
fn parse_class_body(p: &mut Parser, is_interface: bool) {
    p.name();
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    loop {
        if p.at(SyntaxKind::EXTENDS_KW) {
            let c = p.open();
            p.advance();
            types::parse_type(p);
            p.close(c, SyntaxKind::EXTENDS_CLAUSE);
        } else if p.at(SyntaxKind::IMPLEMENTS_KW) {
            let c = p.open();
            p.advance();
            types::parse_type(p);
            p.close(c, SyntaxKind::IMPLEMENTS_CLAUSE);
        } else if is_interface && p.at(SyntaxKind::COMMA) {
            // `interface A extends B, C`
            let c = p.open();
            p.advance();
            types::parse_type(p);
            p.close(c, SyntaxKind::EXTENDS_CLAUSE);
        } else {
            break;
        }
    }
    parse_member_list(p);
}

fn parse_enum_body(p: &mut Parser) {
    p.name();
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    let list = p.open();
    if !p.expect(SyntaxKind::L_BRACE) {
        p.close(list, SyntaxKind::MEMBER_LIST);
        return;
    }
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
        let before = p.position();
        parse_enum_ctor(p);
        if p.position() == before {
            p.advance_with_error("expected an enum constructor");
        }
    }
    p.expect(SyntaxKind::R_BRACE);
    p.close(list, SyntaxKind::MEMBER_LIST);
}

/// ENUM_CTOR: METADATA* NAME GENERIC_PARAM_LIST? PARAM_LIST? `;`
fn parse_enum_ctor(p: &mut Parser) {
    if !p.at(SyntaxKind::IDENT) && !p.at(SyntaxKind::META) {
        return;
    }
    let m = p.open();
    parse_metadata(p);
    p.name();
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    if p.at(SyntaxKind::L_PAREN) {
        parse_param_list(p);
    }
    p.expect(SyntaxKind::SEMICOLON);
    p.close(m, SyntaxKind::ENUM_CTOR);
}

/// NAME GENERIC_PARAM_LIST? UNDERLYING_TYPE? (FROM_CLAUSE | TO_CLAUSE)* MEMBER_LIST
fn parse_abstract_body(p: &mut Parser) {
    p.name();
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    if p.at(SyntaxKind::L_PAREN) {
        let u = p.open();
        p.advance();
        types::parse_type(p);
        p.expect(SyntaxKind::R_PAREN);
        p.close(u, SyntaxKind::UNDERLYING_TYPE);
    }
    loop {
        let kind = if p.at_contextual("from") {
            SyntaxKind::FROM_CLAUSE
        } else if p.at_contextual("to") {
            SyntaxKind::TO_CLAUSE
        } else {
            break;
        };
        let c = p.open();
        p.advance();
        types::parse_type(p);
        p.close(c, kind);
    }
    parse_member_list(p);
}

/// `typedef Name<T> = Type;`
fn parse_typedef_body(p: &mut Parser) {
    p.name();
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    p.expect(SyntaxKind::EQ);
    types::parse_type(p);
    p.eat(SyntaxKind::SEMICOLON);
}

/// GENERIC_PARAM_LIST: `<` GENERIC_PARAM (`,` GENERIC_PARAM)* `>`
///
/// A constraint is `T:Foo`, `T:(A, B)` or `T:A & B`; every constraint type
/// is a direct child of the GENERIC_PARAM.
pub(crate) fn parse_generic_params(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <
    while !p.at(SyntaxKind::GT) && !p.at(SyntaxKind::EOF) {
        let param = p.open();
        parse_metadata(p);
        if !p.name() {
            p.close(param, SyntaxKind::GENERIC_PARAM);
            break;
        }
        if p.eat(SyntaxKind::COLON) {
            if p.at(SyntaxKind::L_PAREN) && !p.paren_followed_by(SyntaxKind::ARROW) {
                p.advance();
                while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) {
                    types::parse_type(p);
                    if !p.eat(SyntaxKind::COMMA) {
                        break;
                    }
                }
                p.expect(SyntaxKind::R_PAREN);
            } else {
                types::parse_type(p);
                while p.eat(SyntaxKind::AMP) {
                    types::parse_type(p);
                }
            }
        }
        p.close(param, SyntaxKind::GENERIC_PARAM);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::GT);
    p.close(m, SyntaxKind::GENERIC_PARAM_LIST);
}

/// MEMBER_LIST: `{` member* `}`
fn parse_member_list(p: &mut Parser) {
    let m = p.open();
    let open_span = p.current_span();
    if !p.expect(SyntaxKind::L_BRACE) {
        p.close(m, SyntaxKind::MEMBER_LIST);
        return;
    }
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
        let before = p.position();
        parse_member(p);
        if p.position() == before {
            p.advance_with_error("expected a field or method");
            p.recover_until(MEMBER_START);
        }
    }
    if !p.eat(SyntaxKind::R_BRACE) {
        p.error_with_related("expected `}`", open_span, "declaration body opened here");
    }
    p.close(m, SyntaxKind::MEMBER_LIST);
}

fn is_modifier(p: &Parser) -> bool {
    match p.current() {
        SyntaxKind::PUBLIC_KW
        | SyntaxKind::PRIVATE_KW
        | SyntaxKind::STATIC_KW
        | SyntaxKind::INLINE_KW
        | SyntaxKind::OVERRIDE_KW
        | SyntaxKind::EXTERN_KW
        | SyntaxKind::MACRO_KW
        | SyntaxKind::DYNAMIC_KW => true,
        // `final function` is a modifier; `final x` declares a field.
        SyntaxKind::FINAL_KW => p.nth(1) != SyntaxKind::IDENT,
        _ => false,
    }
}

/// FIELD_DEF or METHOD_DEF, including leading metadata and modifiers.
pub(crate) fn parse_member(p: &mut Parser) {
    if p.at(SyntaxKind::SEMICOLON) {
        p.advance();
        return;
    }
    let m = p.open();
    parse_metadata(p);
    while is_modifier(p) {
        p.advance();
    }
    match p.current() {
        SyntaxKind::VAR_KW | SyntaxKind::FINAL_KW => {
            p.advance();
            parse_field_rest(p);
            p.close(m, SyntaxKind::FIELD_DEF);
        }
        SyntaxKind::FUNCTION_KW => {
            p.advance();
            parse_method_rest(p);
            p.close(m, SyntaxKind::METHOD_DEF);
        }
        _ => {
            p.error("expected `var` or `function`");
            p.close(m, SyntaxKind::ERROR_NODE);
        }
    }
}

/// After `var`/`final`: NAME ACCESSOR_LIST? TYPE_TAG? INITIALIZER? `;`
fn parse_field_rest(p: &mut Parser) {
    p.name();
    if p.at(SyntaxKind::L_PAREN) {
        parse_accessor_list(p);
    }
    if p.at(SyntaxKind::COLON) {
        types::parse_type_tag(p);
    }
    if p.at(SyntaxKind::EQ) {
        let init = p.open();
        p.advance();
        expressions::expr(p);
        p.close(init, SyntaxKind::INITIALIZER);
    }
    p.expect(SyntaxKind::SEMICOLON);
}

/// `(get, set)`, `(default, null)`, `(never, dynamic)` ...
fn parse_accessor_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (
    for i in 0..2 {
        if i == 1 && !p.expect(SyntaxKind::COMMA) {
            break;
        }
        if p.at_any(&[
            SyntaxKind::IDENT,
            SyntaxKind::DEFAULT_KW,
            SyntaxKind::NULL_KW,
            SyntaxKind::DYNAMIC_KW,
        ]) {
            let a = p.open();
            p.advance();
            p.close(a, SyntaxKind::ACCESSOR);
        } else {
            p.error("expected an accessor");
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::ACCESSOR_LIST);
}

/// After `function`: NAME GENERIC_PARAM_LIST? PARAM_LIST TYPE_TAG? body
fn parse_method_rest(p: &mut Parser) {
    if p.at(SyntaxKind::NEW_KW) {
        let n = p.open();
        p.advance();
        p.close(n, SyntaxKind::NAME);
    } else {
        p.name();
    }
    if p.at(SyntaxKind::LT) {
        parse_generic_params(p);
    }
    parse_param_list(p);
    if p.at(SyntaxKind::COLON) {
        types::parse_type_tag(p);
    }
    parse_function_body(p);
}

/// A block, an expression terminated by `;`, or just `;` (no body).
pub(crate) fn parse_function_body(p: &mut Parser) {
    match p.current() {
        SyntaxKind::SEMICOLON => p.advance(),
        SyntaxKind::L_BRACE => {
            expressions::parse_block(p);
        }
        SyntaxKind::R_BRACE | SyntaxKind::EOF => p.error("expected a function body"),
        _ => {
            expressions::expr(p);
            p.expect(SyntaxKind::SEMICOLON);
        }
    }
}

/// PARAM_LIST: `(` PARAM (`,` PARAM)* `)`
pub(crate) fn parse_param_list(p: &mut Parser) {
    let m = p.open();
    if !p.expect(SyntaxKind::L_PAREN) {
        p.close(m, SyntaxKind::PARAM_LIST);
        return;
    }
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) {
        if !parse_param(p) {
            break;
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::PARAM_LIST);
}

/// PARAM: METADATA* `?`? `...`? NAME TYPE_TAG? DEFAULT_VALUE?
fn parse_param(p: &mut Parser) -> bool {
    let m = p.open();
    parse_metadata(p);
    p.eat(SyntaxKind::QUESTION);
    p.eat(SyntaxKind::ELLIPSIS);
    if !p.name() {
        p.close(m, SyntaxKind::PARAM);
        return false;
    }
    if p.at(SyntaxKind::COLON) {
        types::parse_type_tag(p);
    }
    if p.at(SyntaxKind::EQ) {
        let d = p.open();
        p.advance();
        expressions::expr(p);
        p.close(d, SyntaxKind::DEFAULT_VALUE);
    }
    p.close(m, SyntaxKind::PARAM);
    true
}
