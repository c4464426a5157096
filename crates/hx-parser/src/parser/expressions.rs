//! Pratt expression parser.
//!
//! Statements are expressions in this language, so control flow (`if`,
//! `switch`, `for`, `while`, `try`), `var` declarations, `return` and
//! friends are all parsed as atoms here. Blocks parse a sequence of them.

use crate::syntax_kind::SyntaxKind;

use super::{items, types, MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right means left-associative; left > right means
/// right-associative (assignment).
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        SyntaxKind::EQ | SyntaxKind::COMPOUND_ASSIGN => Some((2, 1)),

        SyntaxKind::QUESTION_QUESTION => Some((6, 5)),

        // Interval: `0...10`
        SyntaxKind::ELLIPSIS => Some((7, 8)),

        SyntaxKind::PIPE_PIPE => Some((9, 10)),

        SyntaxKind::AMP_AMP => Some((11, 12)),

        SyntaxKind::EQ_EQ
        | SyntaxKind::NOT_EQ
        | SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ => Some((13, 14)),

        SyntaxKind::PIPE | SyntaxKind::AMP | SyntaxKind::CARET => Some((15, 16)),

        SyntaxKind::SHL => Some((17, 18)),

        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((19, 20)),

        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => Some((21, 22)),

        _ => None,
    }
}

/// Ternary `c ? a : b`, right-associative.
const TERNARY_BP: (u8, u8) = (4, 3);

/// `e is T`, binds like a comparison.
const IS_BP: u8 = 13;

/// `>>` and `>>>`, built from adjacent `>` tokens.
const SHR_BP: (u8, u8) = (17, 18);

fn prefix_binding_power(op: SyntaxKind) -> Option<((), u8)> {
    match op {
        SyntaxKind::MINUS
        | SyntaxKind::BANG
        | SyntaxKind::TILDE
        | SyntaxKind::PLUS_PLUS
        | SyntaxKind::MINUS_MINUS => Some(((), 25)),
        _ => None,
    }
}

/// Postfix operations (call, field access, indexing, `++`/`--`) bind
/// tighter than every prefix and infix operator.
const POSTFIX_BP: u8 = 27;

/// Unchecked `cast e` binds like a prefix operator.
const CAST_BP: u8 = 25;

/// Statement-ish atoms (`return x`, `throw x`, `untyped x`) take the rest of
/// the expression.
const KEYWORD_OPERAND_BP: u8 = 0;

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse an expression at the lowest binding power.
pub(crate) fn expr(p: &mut Parser) -> Option<MarkClosed> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        let current = p.current();

        // ── Postfix: call ──
        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            parse_arg_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        // ── Postfix: field access ──
        if current == SyntaxKind::DOT && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::MACRO_IDENT) {
                let name = p.open();
                p.advance();
                p.close(name, SyntaxKind::NAME_REF);
            } else {
                // `a.` while typing: keep the node so the receiver is still typed.
                p.error("expected a field name");
            }
            lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            continue;
        }

        // ── Postfix: index ──
        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr(p);
            p.expect(SyntaxKind::R_BRACKET);
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Postfix: increment / decrement ──
        if matches!(current, SyntaxKind::PLUS_PLUS | SyntaxKind::MINUS_MINUS)
            && POSTFIX_BP >= min_bp
        {
            let m = p.open_before(lhs);
            p.advance();
            lhs = p.close(m, SyntaxKind::POSTFIX_EXPR);
            continue;
        }

        // ── Ternary ──
        if current == SyntaxKind::QUESTION {
            let (l_bp, r_bp) = TERNARY_BP;
            if l_bp < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance(); // ?
            expr(p);
            p.expect(SyntaxKind::COLON);
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::TERNARY_EXPR);
            continue;
        }

        // ── `e is T` ──
        if p.at_contextual("is") {
            if IS_BP < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance(); // is
            types::parse_type(p);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        // ── `>>` / `>>>` ──
        if p.at_joined(SyntaxKind::GT, SyntaxKind::GT) {
            let (l_bp, r_bp) = SHR_BP;
            if l_bp < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance();
            let unsigned = p.at_joined(SyntaxKind::GT, SyntaxKind::GT);
            p.advance();
            if unsigned {
                p.advance();
            }
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }
            let m = p.open_before(lhs);
            p.advance(); // operator
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    if let Some(((), r_bp)) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        expr_bp(p, r_bp);
        return Some(p.close(m, SyntaxKind::PREFIX_EXPR));
    }

    match current {
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        SyntaxKind::IDENT | SyntaxKind::MACRO_IDENT if p.nth(1) == SyntaxKind::ARROW => {
            Some(parse_single_param_lambda(p))
        }

        SyntaxKind::IDENT | SyntaxKind::MACRO_IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }

        SyntaxKind::THIS_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::THIS_EXPR))
        }

        SyntaxKind::SUPER_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::SUPER_EXPR))
        }

        SyntaxKind::L_PAREN if p.paren_followed_by(SyntaxKind::ARROW) => {
            Some(parse_paren_lambda(p))
        }

        SyntaxKind::L_PAREN => Some(parse_paren_expr(p)),

        SyntaxKind::L_BRACKET => Some(parse_bracket_literal(p)),

        SyntaxKind::L_BRACE if is_object_literal(p) => Some(parse_object_literal(p)),

        SyntaxKind::L_BRACE => Some(parse_block(p)),

        SyntaxKind::NEW_KW => Some(parse_new_expr(p)),

        SyntaxKind::CAST_KW => Some(parse_cast_expr(p)),

        SyntaxKind::UNTYPED_KW => {
            let m = p.open();
            p.advance();
            expr_bp(p, KEYWORD_OPERAND_BP);
            Some(p.close(m, SyntaxKind::UNTYPED_EXPR))
        }

        SyntaxKind::FUNCTION_KW => Some(parse_function_expr(p)),

        SyntaxKind::IF_KW => Some(parse_if_expr(p)),

        SyntaxKind::SWITCH_KW => Some(parse_switch_expr(p)),

        SyntaxKind::WHILE_KW => Some(parse_while_expr(p)),

        SyntaxKind::DO_KW => Some(parse_do_while_expr(p)),

        SyntaxKind::FOR_KW => Some(parse_for_expr(p)),

        SyntaxKind::TRY_KW => Some(parse_try_expr(p)),

        SyntaxKind::RETURN_KW => {
            let m = p.open();
            p.advance();
            if !at_expression_end(p) {
                expr_bp(p, KEYWORD_OPERAND_BP);
            }
            Some(p.close(m, SyntaxKind::RETURN_EXPR))
        }

        SyntaxKind::THROW_KW => {
            let m = p.open();
            p.advance();
            expr_bp(p, KEYWORD_OPERAND_BP);
            Some(p.close(m, SyntaxKind::THROW_EXPR))
        }

        SyntaxKind::BREAK_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::BREAK_EXPR))
        }

        SyntaxKind::CONTINUE_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::CONTINUE_EXPR))
        }

        SyntaxKind::VAR_KW | SyntaxKind::FINAL_KW => Some(parse_var_decl(p)),

        // `@:privateAccess expr`: metadata is kept as a sibling.
        SyntaxKind::META => {
            items::parse_metadata(p);
            lhs(p)
        }

        _ => {
            p.error("expected an expression");
            None
        }
    }
}

fn at_expression_end(p: &Parser) -> bool {
    p.at_any(&[
        SyntaxKind::SEMICOLON,
        SyntaxKind::R_BRACE,
        SyntaxKind::R_PAREN,
        SyntaxKind::COMMA,
        SyntaxKind::EOF,
    ])
}

// ── Calls and Groups ───────────────────────────────────────────────────

/// ARG_LIST: `(` expr (`,` expr)* `)`
pub(crate) fn parse_arg_list(p: &mut Parser) {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // (
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) {
        if expr(p).is_none() {
            break;
        }
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    if !p.eat(SyntaxKind::R_PAREN) {
        p.error_with_related("expected `)`", open_span, "argument list opened here");
    }
    p.close(m, SyntaxKind::ARG_LIST);
}

/// PAREN_EXPR `(e)` or CHECK_TYPE_EXPR `(e : T)`.
fn parse_paren_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // (
    expr(p);
    let kind = if p.at(SyntaxKind::COLON) {
        p.advance();
        types::parse_type(p);
        SyntaxKind::CHECK_TYPE_EXPR
    } else {
        SyntaxKind::PAREN_EXPR
    };
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, kind)
}

/// NEW_EXPR: `new` PATH_TYPE ARG_LIST
fn parse_new_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // new
    types::parse_type(p);
    if p.at(SyntaxKind::L_PAREN) {
        parse_arg_list(p);
    } else {
        p.error("expected `(`");
    }
    p.close(m, SyntaxKind::NEW_EXPR)
}

/// `cast e` (unchecked) or `cast(e, T)` (checked).
fn parse_cast_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // cast
    if p.at(SyntaxKind::L_PAREN) {
        p.advance();
        expr(p);
        if p.eat(SyntaxKind::COMMA) {
            types::parse_type(p);
        }
        p.expect(SyntaxKind::R_PAREN);
    } else {
        expr_bp(p, CAST_BP);
    }
    p.close(m, SyntaxKind::CAST_EXPR)
}

// ── Literals ───────────────────────────────────────────────────────────

/// `{ name: ...` or `{ "name": ...` starts an object literal; `{}` is an
/// empty block.
fn is_object_literal(p: &Parser) -> bool {
    matches!(p.nth(1), SyntaxKind::IDENT | SyntaxKind::STRING_LITERAL)
        && p.nth(2) == SyntaxKind::COLON
}

/// OBJECT_LITERAL: `{` OBJECT_FIELD (`,` OBJECT_FIELD)* `}`
fn parse_object_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // {
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
        let field = p.open();
        if p.at(SyntaxKind::STRING_LITERAL) {
            p.advance();
        } else if !p.name() {
            p.close(field, SyntaxKind::OBJECT_FIELD);
            break;
        }
        p.expect(SyntaxKind::COLON);
        expr(p);
        p.close(field, SyntaxKind::OBJECT_FIELD);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::OBJECT_LITERAL)
}

/// ARRAY_LITERAL `[a, b]`, MAP_LITERAL `[k => v]` or
/// ARRAY_COMPREHENSION `[for (x in xs) f(x)]`.
fn parse_bracket_literal(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // [

    if p.at(SyntaxKind::FOR_KW) || p.at(SyntaxKind::WHILE_KW) {
        expr(p);
        p.expect(SyntaxKind::R_BRACKET);
        return p.close(m, SyntaxKind::ARRAY_COMPREHENSION);
    }

    let mut kind = SyntaxKind::ARRAY_LITERAL;
    let mut first = true;
    while !p.at(SyntaxKind::R_BRACKET) && !p.at(SyntaxKind::EOF) {
        let Some(element) = expr(p) else { break };
        if p.at(SyntaxKind::FAT_ARROW) && (first || kind == SyntaxKind::MAP_LITERAL) {
            kind = SyntaxKind::MAP_LITERAL;
            let entry = p.open_before(element);
            p.advance(); // =>
            expr(p);
            p.close(entry, SyntaxKind::MAP_ENTRY);
        } else if kind == SyntaxKind::MAP_LITERAL {
            p.error("expected `=>`");
        }
        first = false;
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACKET);
    p.close(m, kind)
}

// ── Blocks ─────────────────────────────────────────────────────────────

/// BLOCK: `{` statement* `}`
pub(crate) fn parse_block(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let open_span = p.current_span();
    p.advance(); // {
    parse_statements_until(p, &[SyntaxKind::R_BRACE]);
    if !p.eat(SyntaxKind::R_BRACE) {
        p.error_with_related("expected `}`", open_span, "block opened here");
    }
    p.close(m, SyntaxKind::BLOCK)
}

/// Statements separated by `;` until one of `terminators` or EOF.
fn parse_statements_until(p: &mut Parser, terminators: &[SyntaxKind]) {
    while !p.at_any(terminators) && !p.at(SyntaxKind::EOF) {
        let before = p.position();
        if p.eat(SyntaxKind::SEMICOLON) {
            continue;
        }
        let parsed = expr(p).is_some();
        // Local `var a = 1, b = 2;` continues with sibling declarations.
        while parsed && p.at(SyntaxKind::COMMA) {
            p.advance();
            parse_var_binding(p);
        }
        // Block-bodied expressions need no `;`.
        let terminated = p.eat(SyntaxKind::SEMICOLON)
            || p.at_any(terminators)
            || (parsed && p.prev() == SyntaxKind::R_BRACE);
        if !terminated {
            p.error("expected `;`");
        }
        if p.position() == before {
            p.advance_with_error("unexpected token");
        }
    }
}

// ── Declarations ───────────────────────────────────────────────────────

/// VAR_DECL: (`var` | `final`) NAME TYPE_TAG? INITIALIZER?
fn parse_var_decl(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // var / final
    var_binding_rest(p);
    p.close(m, SyntaxKind::VAR_DECL)
}

/// A follow-up binding after a comma: VAR_DECL without the keyword.
fn parse_var_binding(p: &mut Parser) {
    let m = p.open();
    var_binding_rest(p);
    p.close(m, SyntaxKind::VAR_DECL);
}

fn var_binding_rest(p: &mut Parser) {
    p.name();
    if p.at(SyntaxKind::COLON) {
        types::parse_type_tag(p);
    }
    if p.at(SyntaxKind::EQ) {
        let init = p.open();
        p.advance();
        expr_bp(p, 2);
        p.close(init, SyntaxKind::INITIALIZER);
    }
}

/// FUNCTION_EXPR: `function` NAME? GENERIC_PARAM_LIST? PARAM_LIST TYPE_TAG? body
fn parse_function_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // function
    if p.at(SyntaxKind::IDENT) {
        p.name();
    }
    if p.at(SyntaxKind::LT) {
        items::parse_generic_params(p);
    }
    items::parse_param_list(p);
    if p.at(SyntaxKind::COLON) {
        types::parse_type_tag(p);
    }
    if !at_expression_end(p) {
        expr(p);
    } else {
        p.error("expected a function body");
    }
    p.close(m, SyntaxKind::FUNCTION_EXPR)
}

/// `x -> body`
fn parse_single_param_lambda(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let params = p.open();
    let param = p.open();
    p.name();
    p.close(param, SyntaxKind::PARAM);
    p.close(params, SyntaxKind::PARAM_LIST);
    p.advance(); // ->
    expr_bp(p, KEYWORD_OPERAND_BP);
    p.close(m, SyntaxKind::LAMBDA_EXPR)
}

/// `(a, ?b:Int) -> body`
fn parse_paren_lambda(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    items::parse_param_list(p);
    p.expect(SyntaxKind::ARROW);
    expr_bp(p, KEYWORD_OPERAND_BP);
    p.close(m, SyntaxKind::LAMBDA_EXPR)
}

// ── Control Flow ───────────────────────────────────────────────────────

fn parse_condition(p: &mut Parser) {
    if p.expect(SyntaxKind::L_PAREN) {
        expr(p);
        p.expect(SyntaxKind::R_PAREN);
    }
}

/// IF_EXPR: `if` `(` cond `)` then ELSE_BRANCH?
fn parse_if_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // if
    parse_condition(p);
    expr(p);
    // `if (c) a; else b;`
    if p.at(SyntaxKind::SEMICOLON) && p.nth(1) == SyntaxKind::ELSE_KW {
        p.advance();
    }
    if p.at(SyntaxKind::ELSE_KW) {
        let e = p.open();
        p.advance();
        expr(p);
        p.close(e, SyntaxKind::ELSE_BRANCH);
    }
    p.close(m, SyntaxKind::IF_EXPR)
}

/// SWITCH_EXPR: `switch` subject `{` SWITCH_CASE* `}`
fn parse_switch_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // switch
    expr(p);
    let open_span = p.current_span();
    if p.expect(SyntaxKind::L_BRACE) {
        while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
            let before = p.position();
            parse_switch_case(p);
            if p.position() == before {
                p.advance_with_error("expected `case` or `default`");
            }
        }
        if !p.eat(SyntaxKind::R_BRACE) {
            p.error_with_related("expected `}`", open_span, "switch opened here");
        }
    }
    p.close(m, SyntaxKind::SWITCH_EXPR)
}

/// SWITCH_CASE: `case` pattern (`,` pattern)* GUARD? `:` CASE_BODY
///            | `default` `:` CASE_BODY
///
/// Patterns are expressions: `A | B` is a bitwise-or BINARY_EXPR and
/// extractors `f(_) => p` are BINARY_EXPRs with a `=>` operator.
fn parse_switch_case(p: &mut Parser) {
    if !p.at(SyntaxKind::CASE_KW) && !p.at(SyntaxKind::DEFAULT_KW) {
        return;
    }
    let m = p.open();
    if p.eat(SyntaxKind::DEFAULT_KW) {
        p.expect(SyntaxKind::COLON);
    } else {
        p.advance(); // case
        loop {
            let Some(pattern) = expr(p) else { break };
            if p.at(SyntaxKind::FAT_ARROW) {
                let extractor = p.open_before(pattern);
                p.advance();
                expr(p);
                p.close(extractor, SyntaxKind::BINARY_EXPR);
            }
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        if p.at(SyntaxKind::IF_KW) {
            let g = p.open();
            p.advance();
            parse_condition(p);
            p.close(g, SyntaxKind::GUARD);
        }
        p.expect(SyntaxKind::COLON);
    }
    let body = p.open();
    parse_statements_until(
        p,
        &[SyntaxKind::CASE_KW, SyntaxKind::DEFAULT_KW, SyntaxKind::R_BRACE],
    );
    p.close(body, SyntaxKind::CASE_BODY);
    p.close(m, SyntaxKind::SWITCH_CASE);
}

fn parse_while_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // while
    parse_condition(p);
    expr(p);
    p.close(m, SyntaxKind::WHILE_EXPR)
}

fn parse_do_while_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // do
    expr(p);
    p.eat(SyntaxKind::SEMICOLON);
    p.expect(SyntaxKind::WHILE_KW);
    parse_condition(p);
    p.close(m, SyntaxKind::DO_WHILE_EXPR)
}

/// FOR_EXPR: `for` `(` FOR_HEAD `)` body
/// FOR_HEAD: NAME (`=>` NAME)? `in` expr
fn parse_for_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // for
    if p.expect(SyntaxKind::L_PAREN) {
        let head = p.open();
        p.name();
        if p.eat(SyntaxKind::FAT_ARROW) {
            p.name();
        }
        p.expect(SyntaxKind::IN_KW);
        expr(p);
        p.close(head, SyntaxKind::FOR_HEAD);
        p.expect(SyntaxKind::R_PAREN);
    }
    expr(p);
    p.close(m, SyntaxKind::FOR_EXPR)
}

/// TRY_EXPR: `try` body CATCH_CLAUSE*
/// CATCH_CLAUSE: `catch` `(` NAME TYPE_TAG? `)` body
fn parse_try_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // try
    expr(p);
    while p.at(SyntaxKind::CATCH_KW) {
        let c = p.open();
        p.advance();
        if p.expect(SyntaxKind::L_PAREN) {
            p.name();
            if p.at(SyntaxKind::COLON) {
                types::parse_type_tag(p);
            }
            p.expect(SyntaxKind::R_PAREN);
        }
        expr(p);
        p.close(c, SyntaxKind::CATCH_CLAUSE);
    }
    p.close(m, SyntaxKind::TRY_EXPR)
}
