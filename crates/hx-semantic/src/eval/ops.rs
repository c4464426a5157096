//! Operators, with folding of constant operands.
//!
//! Integers follow 32-bit wrapping semantics when folded. Folding only
//! feeds reachability checks and hover output; it never changes a type.

use hx_parser::ast::expr::{BinaryExpr, BinaryOp, PostfixExpr, PrefixExpr};
use hx_parser::SyntaxKind;

use super::evaluate_opt;
use super::typeref::builtin_type;
use crate::error::Fault;
use crate::generics::{unwrap_null, GenericResolver};
use crate::session::{Session, Typed};
use crate::ty::{Constant, Primitive, TypeRef};
use crate::unify::{unify, UnifyRule};

fn int_const(v: i64) -> TypeRef {
    TypeRef::Primitive(Primitive::Int, Some(Constant::Int(i64::from(v as i32))))
}

fn float_const(v: f64) -> TypeRef {
    TypeRef::Primitive(Primitive::Float, Some(Constant::Float(v)))
}

fn bool_const(v: bool) -> TypeRef {
    TypeRef::Primitive(Primitive::Bool, Some(Constant::Bool(v)))
}

fn is_primitive(ty: &TypeRef, p: Primitive) -> bool {
    matches!(ty, TypeRef::Primitive(q, _) if *q == p)
}

fn is_numeric(ty: &TypeRef) -> bool {
    is_primitive(ty, Primitive::Int) || is_primitive(ty, Primitive::Float)
}

/// How a constant reads when concatenated to a string.
fn concat_text(c: &Constant) -> String {
    match c {
        Constant::Str(s) => s.clone(),
        Constant::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

pub(crate) fn binary(s: &mut Session, bin: &BinaryExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(op) = bin.op() else {
        return Ok(Typed::unknown());
    };
    if op == BinaryOp::Is {
        return Ok(Typed::new(TypeRef::bool()));
    }
    let lhs = evaluate_opt(s, bin.lhs(), generics)?;
    let mut typed = Typed::unknown();
    typed.absorb(&lhs);
    match op {
        BinaryOp::Assign | BinaryOp::CompoundAssign => {
            typed.ty = lhs.ty.without_constant();
            return Ok(typed);
        }
        BinaryOp::Interval => {
            typed.ty = builtin_type(s, "IntIterator", Vec::new());
            return Ok(typed);
        }
        _ => {}
    }
    let rhs = evaluate_opt(s, bin.rhs(), generics)?;
    typed.absorb(&rhs);
    let (a, b) = (lhs.ty, rhs.ty);
    typed.ty = match op {
        BinaryOp::Extractor => b,
        BinaryOp::NullCoalesce => {
            let left = unwrap_null(s, &a);
            unify(s, &left, &b, UnifyRule::Default)?
        }
        BinaryOp::And | BinaryOp::Or => logical(op, &a, &b),
        op if op.is_comparison() => comparison(op, &a, &b),
        op if op.is_arithmetic() => arithmetic(op, &a, &b),
        op if op.is_bitwise() => bitwise(op, &a, &b),
        _ => TypeRef::Unknown,
    };
    Ok(typed)
}

fn logical(op: BinaryOp, a: &TypeRef, b: &TypeRef) -> TypeRef {
    let x = a.constant().and_then(Constant::as_bool);
    let y = b.constant().and_then(Constant::as_bool);
    let folded = match (op, x, y) {
        (BinaryOp::And, Some(false), _) => Some(false),
        (BinaryOp::Or, Some(true), _) => Some(true),
        (BinaryOp::And, Some(true), Some(y)) | (BinaryOp::Or, Some(false), Some(y)) => Some(y),
        _ => None,
    };
    folded.map_or_else(TypeRef::bool, bool_const)
}

fn comparison(op: BinaryOp, a: &TypeRef, b: &TypeRef) -> TypeRef {
    let (Some(x), Some(y)) = (a.constant(), b.constant()) else {
        return TypeRef::bool();
    };
    let ordering = match (x, y) {
        (Constant::Str(p), Constant::Str(q)) => Some(p.cmp(q)),
        (Constant::Bool(p), Constant::Bool(q)) => Some(p.cmp(q)),
        (Constant::Null, Constant::Null) => Some(std::cmp::Ordering::Equal),
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(p), Some(q)) => p.partial_cmp(&q),
            _ => None,
        },
    };
    let Some(ordering) = ordering else {
        return match (op, x, y) {
            // A constant against `null` is never equal.
            (BinaryOp::Eq, Constant::Null, _) | (BinaryOp::Eq, _, Constant::Null) => {
                bool_const(false)
            }
            (BinaryOp::NotEq, Constant::Null, _) | (BinaryOp::NotEq, _, Constant::Null) => {
                bool_const(true)
            }
            _ => TypeRef::bool(),
        };
    };
    use std::cmp::Ordering::*;
    let result = match op {
        BinaryOp::Eq => ordering == Equal,
        BinaryOp::NotEq => ordering != Equal,
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::LtEq => ordering != Greater,
        BinaryOp::GtEq => ordering != Less,
        _ => return TypeRef::bool(),
    };
    bool_const(result)
}

fn arithmetic(op: BinaryOp, a: &TypeRef, b: &TypeRef) -> TypeRef {
    // String concatenation accepts anything on the other side.
    if op == BinaryOp::Add
        && (is_primitive(a, Primitive::String) || is_primitive(b, Primitive::String))
    {
        return match (a.constant(), b.constant()) {
            (Some(x), Some(y)) => TypeRef::Primitive(
                Primitive::String,
                Some(Constant::Str(format!("{}{}", concat_text(x), concat_text(y)))),
            ),
            _ => TypeRef::string(),
        };
    }
    if a.is_unknown() || b.is_unknown() {
        return TypeRef::Unknown;
    }
    if a.is_dynamic() || b.is_dynamic() {
        return TypeRef::dynamic();
    }
    if !is_numeric(a) || !is_numeric(b) {
        return TypeRef::Unknown;
    }
    let both_int = is_primitive(a, Primitive::Int) && is_primitive(b, Primitive::Int);
    if both_int && op != BinaryOp::Div {
        return match (a.constant(), b.constant()) {
            (Some(Constant::Int(x)), Some(Constant::Int(y))) => {
                let (x, y) = (*x as i32, *y as i32);
                match op {
                    BinaryOp::Add => int_const(i64::from(x.wrapping_add(y))),
                    BinaryOp::Sub => int_const(i64::from(x.wrapping_sub(y))),
                    BinaryOp::Mul => int_const(i64::from(x.wrapping_mul(y))),
                    BinaryOp::Mod if y != 0 => int_const(i64::from(x.wrapping_rem(y))),
                    _ => TypeRef::int(),
                }
            }
            _ => TypeRef::int(),
        };
    }
    match (a.constant().and_then(Constant::as_f64), b.constant().and_then(Constant::as_f64)) {
        (Some(x), Some(y)) => float_const(match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
            _ => x % y,
        }),
        _ => TypeRef::float(),
    }
}

fn bitwise(op: BinaryOp, a: &TypeRef, b: &TypeRef) -> TypeRef {
    if a.is_unknown() || b.is_unknown() {
        return TypeRef::Unknown;
    }
    // `|` on booleans is not folded; it still yields a Bool.
    if is_primitive(a, Primitive::Bool) && is_primitive(b, Primitive::Bool) {
        return TypeRef::bool();
    }
    let (Some(Constant::Int(x)), Some(Constant::Int(y))) = (a.constant(), b.constant()) else {
        return TypeRef::int();
    };
    let (x, y) = (*x as i32, *y as i32);
    let shift = (y & 31) as u32;
    let v = match op {
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitOr => x | y,
        BinaryOp::BitXor => x ^ y,
        BinaryOp::Shl => x.wrapping_shl(shift),
        BinaryOp::Shr => x.wrapping_shr(shift),
        BinaryOp::UShr => ((x as u32) >> shift) as i32,
        _ => return TypeRef::int(),
    };
    int_const(i64::from(v))
}

pub(crate) fn prefix(s: &mut Session, pre: &PrefixExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let operand = evaluate_opt(s, pre.operand(), generics)?;
    let ty = &operand.ty;
    let folded = match pre.op_kind() {
        Some(SyntaxKind::BANG) => match ty.constant().and_then(Constant::as_bool) {
            Some(v) => bool_const(!v),
            None => TypeRef::bool(),
        },
        Some(SyntaxKind::MINUS) => match ty.constant() {
            Some(Constant::Int(v)) => int_const(i64::from((*v as i32).wrapping_neg())),
            Some(Constant::Float(v)) => float_const(-v),
            _ => ty.without_constant(),
        },
        Some(SyntaxKind::TILDE) => match ty.constant() {
            Some(Constant::Int(v)) => int_const(i64::from(!(*v as i32))),
            _ if ty.is_unknown() => TypeRef::Unknown,
            _ => TypeRef::int(),
        },
        _ => ty.without_constant(),
    };
    Ok(operand.map(|_| folded))
}

pub(crate) fn postfix(s: &mut Session, post: &PostfixExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    let operand = evaluate_opt(s, post.operand(), generics)?;
    Ok(operand.map(|ty| ty.without_constant()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> TypeRef {
        int_const(v)
    }

    #[test]
    fn integer_arithmetic_wraps_at_32_bits() {
        assert_eq!(arithmetic(BinaryOp::Add, &int(i64::from(i32::MAX)), &int(1)), int(i64::from(i32::MIN)));
        assert_eq!(arithmetic(BinaryOp::Mul, &int(6), &int(7)), int(42));
    }

    #[test]
    fn division_is_always_float() {
        assert_eq!(arithmetic(BinaryOp::Div, &int(1), &int(2)), float_const(0.5));
        assert_eq!(arithmetic(BinaryOp::Div, &TypeRef::int(), &TypeRef::int()), TypeRef::float());
    }

    #[test]
    fn mixed_numbers_widen_to_float() {
        assert_eq!(arithmetic(BinaryOp::Add, &int(1), &float_const(1.5)), float_const(2.5));
        assert_eq!(arithmetic(BinaryOp::Sub, &TypeRef::int(), &TypeRef::float()), TypeRef::float());
    }

    #[test]
    fn concatenation_folds_to_a_string() {
        let s = TypeRef::Primitive(Primitive::String, Some(Constant::Str("n=".into())));
        assert_eq!(
            arithmetic(BinaryOp::Add, &s, &int(3)),
            TypeRef::Primitive(Primitive::String, Some(Constant::Str("n=3".into())))
        );
        assert_eq!(arithmetic(BinaryOp::Add, &TypeRef::Unknown, &TypeRef::string()), TypeRef::string());
    }

    #[test]
    fn unknown_operands_stay_unknown() {
        assert_eq!(arithmetic(BinaryOp::Add, &TypeRef::Unknown, &int(1)), TypeRef::Unknown);
        assert_eq!(bitwise(BinaryOp::BitAnd, &TypeRef::Unknown, &int(1)), TypeRef::Unknown);
    }

    #[test]
    fn comparisons_fold() {
        assert_eq!(comparison(BinaryOp::Lt, &int(1), &int(2)), bool_const(true));
        assert_eq!(comparison(BinaryOp::Eq, &int(1), &float_const(1.0)), bool_const(true));
        assert_eq!(comparison(BinaryOp::NotEq, &TypeRef::null(), &int(1)), bool_const(true));
        assert_eq!(comparison(BinaryOp::Eq, &TypeRef::int(), &int(1)), TypeRef::bool());
    }

    #[test]
    fn short_circuit_folds_on_the_left() {
        assert_eq!(logical(BinaryOp::And, &bool_const(false), &TypeRef::Unknown), bool_const(false));
        assert_eq!(logical(BinaryOp::Or, &bool_const(false), &bool_const(true)), bool_const(true));
        assert_eq!(logical(BinaryOp::Or, &TypeRef::bool(), &bool_const(true)), TypeRef::bool());
    }

    #[test]
    fn shifts_use_the_low_five_bits() {
        assert_eq!(bitwise(BinaryOp::Shl, &int(1), &int(33)), int(2));
        assert_eq!(bitwise(BinaryOp::UShr, &int(-1), &int(28)), int(15));
    }
}
