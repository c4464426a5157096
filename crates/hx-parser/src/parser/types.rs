//! Type expressions: paths with arguments, anonymous structures, function
//! types in both notations, and parenthesised types.

use crate::syntax_kind::SyntaxKind;

use super::{items, MarkClosed, Parser};

/// TYPE_TAG: `:` type
pub(crate) fn parse_type_tag(p: &mut Parser) {
    let m = p.open();
    p.advance(); // :
    parse_type(p);
    p.close(m, SyntaxKind::TYPE_TAG);
}

/// Parse a full type, including old-style `A -> B -> C` function types.
///
/// The arrow form is flattened: every type left of the final arrow becomes
/// a FUNCTION_TYPE_ARG and the last one is the return type.
pub(crate) fn parse_type(p: &mut Parser) -> Option<MarkClosed> {
    let first = type_atom(p)?;
    if !p.at(SyntaxKind::ARROW) {
        return Some(first);
    }
    let arg = p.open_before(first);
    let first_arg = p.close(arg, SyntaxKind::FUNCTION_TYPE_ARG);
    let func = p.open_before(first_arg);
    loop {
        p.advance(); // ->
        let Some(next) = type_atom(p) else { break };
        if p.at(SyntaxKind::ARROW) {
            let arg = p.open_before(next);
            p.close(arg, SyntaxKind::FUNCTION_TYPE_ARG);
        } else {
            break;
        }
    }
    Some(p.close(func, SyntaxKind::FUNCTION_TYPE))
}

fn type_atom(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        SyntaxKind::IDENT | SyntaxKind::MACRO_IDENT => Some(parse_path_type(p)),
        SyntaxKind::L_BRACE => Some(parse_anon_type(p)),
        SyntaxKind::L_PAREN if p.paren_followed_by(SyntaxKind::ARROW) => {
            Some(parse_new_function_type(p))
        }
        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance();
            parse_type(p);
            p.expect(SyntaxKind::R_PAREN);
            Some(p.close(m, SyntaxKind::PAREN_TYPE))
        }
        // `?T` in old-style argument position: the marker stays on the arg.
        SyntaxKind::QUESTION => {
            p.advance();
            type_atom(p)
        }
        _ => {
            p.error("expected a type");
            None
        }
    }
}

/// PATH_TYPE: PATH GENERIC_ARG_LIST?
fn parse_path_type(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    items::parse_path(p);
    if p.at(SyntaxKind::LT) {
        parse_generic_args(p);
    }
    p.close(m, SyntaxKind::PATH_TYPE)
}

/// GENERIC_ARG_LIST: `<` type (`,` type)* `>`
pub(crate) fn parse_generic_args(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <
    while !p.at(SyntaxKind::GT) && !p.at(SyntaxKind::EOF) {
        if parse_type(p).is_none() {
            break;
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::GT);
    p.close(m, SyntaxKind::GENERIC_ARG_LIST);
}

/// `(a:Int, ?b:String) -> Bool`
fn parse_new_function_type(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // (
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) {
        let arg = p.open();
        p.eat(SyntaxKind::QUESTION);
        p.eat(SyntaxKind::ELLIPSIS);
        if p.at(SyntaxKind::IDENT) && p.nth(1) == SyntaxKind::COLON {
            p.name();
            p.advance(); // :
        }
        let parsed = parse_type(p).is_some();
        p.close(arg, SyntaxKind::FUNCTION_TYPE_ARG);
        if !parsed || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    p.expect(SyntaxKind::ARROW);
    parse_type(p);
    p.close(m, SyntaxKind::FUNCTION_TYPE)
}

/// ANON_TYPE in either notation:
/// `{ x:Int, ?y:String }`, `{ > Base, z:Bool }` or
/// `{ var x:Int; function f():Void; }`.
fn parse_anon_type(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // {
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
        let before = p.position();
        match p.current() {
            SyntaxKind::GT => {
                let ext = p.open();
                p.advance();
                parse_type(p);
                p.close(ext, SyntaxKind::STRUCT_EXTENSION);
                p.eat(SyntaxKind::COMMA);
            }
            SyntaxKind::VAR_KW
            | SyntaxKind::FINAL_KW
            | SyntaxKind::FUNCTION_KW
            | SyntaxKind::PUBLIC_KW
            | SyntaxKind::PRIVATE_KW
            | SyntaxKind::DYNAMIC_KW => items::parse_member(p),
            SyntaxKind::META
                if matches!(
                    p.nth(1),
                    SyntaxKind::VAR_KW | SyntaxKind::FINAL_KW | SyntaxKind::FUNCTION_KW
                ) =>
            {
                items::parse_member(p)
            }
            _ => {
                let field = p.open();
                items::parse_metadata(p);
                p.eat(SyntaxKind::QUESTION);
                p.name();
                if p.at(SyntaxKind::COLON) {
                    parse_type_tag(p);
                } else {
                    p.error("expected `:`");
                }
                p.close(field, SyntaxKind::ANON_FIELD);
                if !p.eat(SyntaxKind::COMMA) && !p.at(SyntaxKind::R_BRACE) {
                    p.error("expected `,` or `}`");
                }
            }
        }
        if p.position() == before {
            p.advance_with_error("unexpected token in structure type");
        }
    }
    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::ANON_TYPE)
}
