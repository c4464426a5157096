//! Literal constants and collection literals.

use hx_parser::ast::expr::{ArrayComprehension, ArrayLiteral, Literal, LiteralKind, MapLiteral};
use hx_parser::ast::AstNode;
use hx_parser::SyntaxNode;

use super::evaluate;
use super::expect::expected_type;
use super::typeref::builtin_type;
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::session::{Session, Typed};
use crate::ty::{ClassType, Constant, Primitive, TypeRef};
use crate::unify::{unify_all, UnifyRule};

fn parse_int(text: &str) -> Option<i64> {
    let text = text.replace('_', "");
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Strip the quotes and decode the common escapes.
pub(crate) fn unquote(text: &str) -> String {
    let inner = text
        .get(1..text.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub(crate) fn literal(lit: &Literal) -> Typed {
    let text = lit.text();
    let ty = match lit.kind() {
        Some(LiteralKind::Int) => match parse_int(&text) {
            Some(v) => TypeRef::Primitive(Primitive::Int, Some(Constant::Int(v))),
            None => TypeRef::int(),
        },
        Some(LiteralKind::Float) => match text.replace('_', "").parse::<f64>() {
            Ok(v) => TypeRef::Primitive(Primitive::Float, Some(Constant::Float(v))),
            Err(_) => TypeRef::float(),
        },
        Some(LiteralKind::String) => {
            TypeRef::Primitive(Primitive::String, Some(Constant::Str(unquote(&text))))
        }
        Some(LiteralKind::Bool) => {
            TypeRef::Primitive(Primitive::Bool, Some(Constant::Bool(text == "true")))
        }
        Some(LiteralKind::Null) => TypeRef::null(),
        None => TypeRef::Unknown,
    };
    Typed::new(ty)
}

/// Whether an array type still needs its element type.
pub(crate) fn is_open_array(s: &mut Session, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Class(ct) if s.is_builtin(ct.decl, "Array") => {
            ct.args.first().map_or(true, TypeRef::is_unknown)
        }
        _ => false,
    }
}

/// `[a, b, c]`: an array of the unified element type. All-constant
/// elements make a constant array; an empty literal takes the type its
/// position expects.
pub(crate) fn array(
    s: &mut Session,
    array: &ArrayLiteral,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let elements: Vec<_> = array.elements().collect();
    if elements.is_empty() {
        let empty = builtin_type(s, "Array", vec![TypeRef::Unknown])
            .with_constant(Constant::Array(Vec::new()));
        let Some(expected) = expected_type(s, array.syntax(), generics)? else {
            return Ok(Typed::new(empty));
        };
        let expected = unwrap_null(s, &expected);
        let is_collection = matches!(
            &expected,
            TypeRef::Class(ct) if s.is_builtin(ct.decl, "Array") || s.is_builtin(ct.decl, "Map")
        );
        return Ok(Typed::new(if is_collection {
            expected.without_constant()
        } else {
            empty
        }));
    }

    let mut typed = Typed::unknown();
    let mut types = Vec::with_capacity(elements.len());
    for element in &elements {
        let t = evaluate(s, element.syntax(), generics)?;
        typed.absorb(&t);
        types.push(t.ty);
    }
    let mut element = unify_all(s, &types, UnifyRule::IgnoreVoid)?.unwrap_or(TypeRef::Unknown);
    // Known but unrelated elements make an array of anything.
    if element.is_unknown() && !types.iter().any(TypeRef::is_unknown) {
        element = TypeRef::dynamic();
    }
    let constants: Option<Vec<Constant>> = types.iter().map(|t| t.constant().cloned()).collect();
    let mut ty = builtin_type(s, "Array", vec![element]);
    if let (Some(items), TypeRef::Class(ct)) = (constants, &mut ty) {
        ct.range = Some((0, items.len() as i64 - 1));
        ct.constant = Some(Constant::Array(items));
    }
    typed.ty = ty;
    Ok(typed)
}

/// `[k => v, ...]`: a map of the unified key and value types.
pub(crate) fn map(s: &mut Session, map: &MapLiteral, generics: &GenericResolver) -> Result<Typed, Fault> {
    let mut typed = Typed::unknown();
    let mut keys = Vec::new();
    let mut values = Vec::new();
    for entry in map.entries() {
        let k = super::evaluate_opt(s, entry.key(), generics)?;
        let v = super::evaluate_opt(s, entry.value(), generics)?;
        typed.absorb(&k);
        typed.absorb(&v);
        keys.push(k.ty);
        values.push(v.ty);
    }
    let key = unify_all(s, &keys, UnifyRule::IgnoreVoid)?.unwrap_or(TypeRef::Unknown);
    let value = unify_all(s, &values, UnifyRule::IgnoreVoid)?.unwrap_or(TypeRef::Unknown);
    typed.ty = builtin_type(s, "Map", vec![key, value]);
    Ok(typed)
}

/// `[for (x in xs) f(x)]` is an array of what the innermost body yields.
pub(crate) fn comprehension(
    s: &mut Session,
    comp: &ArrayComprehension,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let element = super::evaluate_opt(s, comp.element(), generics)?;
    let inner = element.ty.without_constant();
    Ok(Typed {
        ty: builtin_type(s, "Array", vec![inner]),
        cacheable: element.cacheable,
    })
}

/// `{ a: 1, b: "x" }` is the structure registered for the literal,
/// displayed with its field types.
pub(crate) fn object(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    let catalog = s.catalog;
    let Some(decl_id) = s.ptr(node).and_then(|ptr| catalog.declaration_at(&ptr)) else {
        return Ok(Typed::unknown());
    };
    let mut typed = Typed::unknown();
    let mut fields = Vec::new();
    for member in catalog.members_of(decl_id) {
        let ty = match member.body {
            Some(body) => {
                let value = s.node(&body)?;
                let t = evaluate(s, &value, generics)?;
                typed.absorb(&t);
                t.ty.without_constant()
            }
            None => TypeRef::Unknown,
        };
        fields.push(format!("{} : {ty}", member.name));
    }
    let name = if fields.is_empty() {
        String::from("{ }")
    } else {
        format!("{{ {} }}", fields.join(", "))
    };
    typed.ty = TypeRef::Class(ClassType::new(decl_id, name, Vec::new()));
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_in_decimal_and_hex() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0xFF"), Some(255));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("x"), None);
    }

    #[test]
    fn strings_are_unquoted_and_unescaped() {
        assert_eq!(unquote("\"a\\nb\""), "a\nb");
        assert_eq!(unquote("'it\\'s'"), "it's");
        assert_eq!(unquote("\"\""), "");
    }
}
