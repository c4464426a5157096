//! Type evaluation: the static type of any expression or statement.
//!
//! [`evaluate`] dispatches on the closed [`Expr`] enum. Each node kind has
//! one handler in a submodule:
//!
//! - `literals`: constants, collection and object literals.
//! - `locals`: names, and the types of what they resolve to.
//! - `ops`: unary and binary operators, with constant folding.
//! - `calls`: calls, `new`, field access and indexing.
//! - `flow`: blocks, branches, loops and return type inference.
//! - `patterns` / `expect`: the type a position expects, used for
//!   empty literals, lambda parameters and constructor patterns.
//! - `usage`: later uses of a variable whose initializer says nothing.
//!
//! Results are memoized per node and generic fingerprint inside the
//! session. A result that passed through a tripped recursion guard, or
//! that depended on a caller-supplied hint, is marked not cacheable and is
//! recomputed next time.

pub mod calls;
pub mod expect;
pub mod flow;
pub mod literals;
pub mod locals;
pub mod members;
pub mod ops;
pub mod patterns;
pub mod typeref;
pub mod usage;

use hx_parser::ast::expr::{CastExpr, CheckTypeExpr, Expr};
use hx_parser::{SyntaxKind, SyntaxNode};

use crate::error::Fault;
use crate::generics::GenericResolver;
use crate::model::DeclShape;
use crate::resolve::scope;
use crate::session::{GuardKey, Session, Typed};
use crate::ty::TypeRef;

/// The static type of `node` under `generics`.
pub fn evaluate(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    s.step()?;
    let Some(ptr) = s.ptr(node) else {
        return Ok(Typed::unknown());
    };
    let key = (ptr, generics.fingerprint());
    if let Some(ty) = s.memo_get(&key) {
        return Ok(Typed::new(ty));
    }
    let cycles = s.cycles();
    let mut typed = s.guarded(
        GuardKey::Eval(ptr, key.1),
        Typed::uncached(TypeRef::Unknown),
        |s| dispatch(s, node, generics),
    )?;
    typed.cacheable &= s.cycles() == cycles;
    if typed.cacheable {
        s.memo_put(key, typed.ty.clone());
    }
    Ok(typed)
}

/// Evaluate an optional child, `Unknown` when it is missing.
pub(crate) fn evaluate_opt(
    s: &mut Session,
    expr: Option<Expr>,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    match expr {
        Some(e) => evaluate(s, e.syntax(), generics),
        None => Ok(Typed::unknown()),
    }
}

fn dispatch(s: &mut Session, node: &SyntaxNode, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(expr) = Expr::cast(node.clone()) else {
        return non_expression(s, node, generics);
    };
    match expr {
        Expr::Literal(lit) => Ok(literals::literal(&lit)),
        Expr::NameRef(_) => locals::name_ref(s, node, generics),
        Expr::This(_) => Ok(Typed::new(scope::this_type(s, node, generics)?)),
        Expr::Super(_) => super_type(s, node, generics),
        Expr::Paren(p) => evaluate_opt(s, p.inner(), generics),
        Expr::Call(call) => calls::call(s, &call, generics),
        Expr::FieldAccess(fa) => calls::field_access(s, &fa, generics),
        Expr::Index(index) => calls::index(s, &index, generics),
        Expr::New(new) => calls::new_expr(s, &new, generics),
        Expr::Binary(bin) => ops::binary(s, &bin, generics),
        Expr::Prefix(pre) => ops::prefix(s, &pre, generics),
        Expr::Postfix(post) => ops::postfix(s, &post, generics),
        Expr::Ternary(t) => flow::ternary(s, &t, generics),
        Expr::CheckType(check) => check_type(s, &check, generics),
        Expr::Cast(cast) => cast_type(s, &cast, generics),
        Expr::Untyped(_) => Ok(Typed::new(TypeRef::dynamic())),
        Expr::Block(block) => flow::block(s, &block, generics),
        Expr::If(if_expr) => flow::if_expr(s, &if_expr, generics),
        Expr::Switch(switch) => flow::switch_expr(s, &switch, generics),
        Expr::Try(try_expr) => flow::try_expr(s, &try_expr, generics),
        Expr::While(_)
        | Expr::DoWhile(_)
        | Expr::For(_)
        | Expr::Return(_)
        | Expr::Break(_)
        | Expr::Continue(_)
        | Expr::Throw(_)
        | Expr::VarDecl(_) => Ok(Typed::new(TypeRef::Void)),
        Expr::Function(_) | Expr::Lambda(_) => flow::function_literal(s, node, generics),
        Expr::ArrayLiteral(array) => literals::array(s, &array, generics),
        Expr::MapLiteral(map) => literals::map(s, &map, generics),
        Expr::Comprehension(comp) => literals::comprehension(s, &comp, generics),
        Expr::ObjectLiteral(_) => literals::object(s, node, generics),
    }
}

/// Declaring names and type nodes.
fn non_expression(
    s: &mut Session,
    node: &SyntaxNode,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    match node.kind() {
        SyntaxKind::NAME => locals::declared_name(s, node, generics),
        k if k == SyntaxKind::TYPE_TAG || k.is_type() => {
            typeref::type_from_syntax(s, node, generics)
        }
        _ => Ok(Typed::unknown()),
    }
}

/// `super` has the type of the superclass.
fn super_type(s: &mut Session, node: &SyntaxNode, generics: &GenericResolver) -> Result<Typed, Fault> {
    let Some(decl_id) = scope::enclosing_decl(s, node) else {
        return Ok(Typed::unknown());
    };
    let catalog = s.catalog;
    match catalog.declaration(decl_id).map(|d| &d.shape) {
        Some(DeclShape::Class {
            extends: Some(tag), ..
        }) => typeref::type_of_tag(s, tag, generics),
        _ => Ok(Typed::unknown()),
    }
}

/// `(e : T)` has type `T`.
fn check_type(
    s: &mut Session,
    check: &CheckTypeExpr,
    generics: &GenericResolver,
) -> Result<Typed, Fault> {
    match check.ty() {
        Some(ty) => typeref::type_from_syntax(s, ty.syntax(), generics),
        None => evaluate_opt(s, check.expr(), generics),
    }
}

/// `cast(e, T)` is a `T`; an unchecked `cast e` could be anything.
fn cast_type(s: &mut Session, cast: &CastExpr, generics: &GenericResolver) -> Result<Typed, Fault> {
    match cast.ty() {
        Some(ty) => typeref::type_from_syntax(s, ty.syntax(), generics),
        None => Ok(Typed::new(TypeRef::dynamic())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSection;
    use crate::index::ProjectIndex;
    use crate::session::CancellationToken;

    #[test]
    fn cycles_met_while_unifying_keep_the_result_uncached() {
        let src = "typedef A = B;\ntypedef B = A;\nclass C extends A {}\nclass D extends A {}\nclass Main {\n  static function main() {\n    var flag = true;\n    var v = flag ? new C() : new D();\n  }\n}\n";
        let mut index = ProjectIndex::with_prelude();
        let file = index.add_file("Main.hx", src);
        let config = AnalysisSection::default();
        let mut s = Session::new(&index, &config, CancellationToken::new(), None);
        let root = s.root(file).unwrap();
        let ternary = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::TERNARY_EXPR)
            .unwrap();
        let typed = evaluate(&mut s, &ternary, &GenericResolver::new()).unwrap();
        assert!(!typed.cacheable);
        let key = (s.ptr(&ternary).unwrap(), 0);
        assert_eq!(s.memo_get(&key), None);
    }
}
