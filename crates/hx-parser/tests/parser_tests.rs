//! Parser integration tests.
//!
//! Small inputs are snapshotted through `debug_tree`; larger declarations
//! are checked through the typed AST.

use hx_parser::ast::expr::{BinaryOp, Expr};
use hx_parser::ast::item::{Member, TypeDef};
use hx_parser::ast::ty::TypeRef;
use hx_parser::ast::AstNode;
use hx_parser::{debug_tree, parse, parse_expression, Parse, SyntaxKind, SyntaxNode};
use insta::assert_snapshot;

fn render(parse: &Parse) -> String {
    let tree = debug_tree(&parse.syntax());
    if parse.errors().is_empty() {
        return tree;
    }
    format!(
        "{}errors:\n{}",
        tree,
        parse
            .errors()
            .iter()
            .map(|e| format!("  - {} @{}..{}", e.message, e.span.start, e.span.end))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

fn expr_debug(source: &str) -> String {
    render(&parse_expression(source))
}

fn nodes(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
    root.descendants().filter(|n| n.kind() == kind).collect()
}

fn first_expr(source: &str) -> Expr {
    let parse = parse_expression(source);
    assert!(parse.ok(), "{:?}", parse.errors());
    parse
        .syntax()
        .children()
        .find_map(Expr::cast)
        .expect("expression")
}

fn type_defs(source: &str) -> Vec<TypeDef> {
    let parse = parse(source);
    assert!(parse.ok(), "{:?}", parse.errors());
    parse.tree().type_defs().collect()
}

// ── Snapshots ──────────────────────────────────────────────────────────

#[test]
fn binary_precedence() {
    assert_snapshot!(expr_debug("1 + 2 * 3"), @r#"
    SOURCE_FILE@0..9
      BINARY_EXPR@0..9
        LITERAL@0..1
          INT_LITERAL@0..1 "1"
        PLUS@2..3 "+"
        BINARY_EXPR@4..9
          LITERAL@4..5
            INT_LITERAL@4..5 "2"
          STAR@6..7 "*"
          LITERAL@8..9
            INT_LITERAL@8..9 "3"
    "#);
}

#[test]
fn method_call_on_field() {
    assert_snapshot!(expr_debug("a.b(1)"), @r#"
    SOURCE_FILE@0..6
      CALL_EXPR@0..6
        FIELD_ACCESS@0..3
          NAME_REF@0..1
            IDENT@0..1 "a"
          DOT@1..2 "."
          NAME_REF@2..3
            IDENT@2..3 "b"
        ARG_LIST@3..6
          L_PAREN@3..4 "("
          LITERAL@4..5
            INT_LITERAL@4..5 "1"
          R_PAREN@5..6 ")"
    "#);
}

#[test]
fn single_param_lambda() {
    assert_snapshot!(expr_debug("x -> x + 1"), @r#"
    SOURCE_FILE@0..10
      LAMBDA_EXPR@0..10
        PARAM_LIST@0..1
          PARAM@0..1
            NAME@0..1
              IDENT@0..1 "x"
        ARROW@2..4 "->"
        BINARY_EXPR@5..10
          NAME_REF@5..6
            IDENT@5..6 "x"
          PLUS@7..8 "+"
          LITERAL@9..10
            INT_LITERAL@9..10 "1"
    "#);
}

#[test]
fn empty_class() {
    assert_snapshot!(render(&parse("class A {}")), @r#"
    SOURCE_FILE@0..10
      CLASS_DEF@0..10
        CLASS_KW@0..5 "class"
        NAME@6..7
          IDENT@6..7 "A"
        MEMBER_LIST@8..10
          L_BRACE@8..9 "{"
          R_BRACE@9..10 "}"
    "#);
}

#[test]
fn unclosed_argument_list() {
    assert_snapshot!(expr_debug("foo(1,"), @r#"
    SOURCE_FILE@0..6
      CALL_EXPR@0..6
        NAME_REF@0..3
          IDENT@0..3 "foo"
        ARG_LIST@3..6
          L_PAREN@3..4 "("
          LITERAL@4..5
            INT_LITERAL@4..5 "1"
          COMMA@5..6 ","
    errors:
      - expected `)` @6..6
    "#);
}

// ── Losslessness ───────────────────────────────────────────────────────

#[test]
fn tree_text_reproduces_source() {
    let source = r#"package demo.app;

import haxe.ds.StringMap;
import demo.util.*;
using StringTools;

/** Docs. */
@:keep
class Main<T:(Iterable<Int>)> extends Base implements IFoo {
    static var counter(default, null):Int = 0; // trailing
    public function new() { super(); }
    function run(?x:Int, ...rest:String):Void {
        var m = ["a" => 1];
        for (k => v in m) trace(k + v);
    }
}
"#;
    let parse = parse(source);
    assert!(parse.ok(), "{:?}", parse.errors());
    assert_eq!(parse.syntax().text().to_string(), source);
}

#[test]
fn node_ranges_exclude_leading_trivia() {
    let source = "class A {\n    // note\n    var x:Int;\n}";
    let root = parse(source).syntax();
    let field = &nodes(&root, SyntaxKind::FIELD_DEF)[0];
    assert_eq!(field.text().to_string(), "var x:Int;");
}

// ── Module level ───────────────────────────────────────────────────────

#[test]
fn package_imports_and_usings() {
    let parse = parse(
        "package a.b;\nimport x.y.Z;\nimport x.y.*;\nimport x.Tools.helper as help;\nusing x.Ext;",
    );
    assert!(parse.ok(), "{:?}", parse.errors());
    let file = parse.tree();
    assert_eq!(file.package_name(), "a.b");

    let imports: Vec<_> = file.imports().collect();
    assert_eq!(imports.len(), 3);
    assert_eq!(imports[0].path().map(|p| p.text()).as_deref(), Some("x.y.Z"));
    assert!(!imports[0].is_wildcard());
    assert!(imports[1].is_wildcard());
    assert_eq!(imports[1].path().map(|p| p.text()).as_deref(), Some("x.y"));
    assert_eq!(imports[2].alias().map(|n| n.text()).as_deref(), Some("help"));

    let usings: Vec<_> = file.usings().collect();
    assert_eq!(usings[0].path().map(|p| p.text()).as_deref(), Some("x.Ext"));
}

#[test]
fn class_with_members() {
    let defs = type_defs(
        "class Box<T> extends Base implements IGet {
            public static inline var LIMIT:Int = 10;
            var value(get, never):T;
            public function new(v:T) { this.value = v; }
            public function get():T return value;
            function noBody();
        }",
    );
    let TypeDef::Class(class) = &defs[0] else {
        panic!("expected a class");
    };
    assert_eq!(defs[0].name().map(|n| n.text()).as_deref(), Some("Box"));
    let params: Vec<_> = defs[0]
        .generic_param_list()
        .map(|l| l.params().filter_map(|p| p.name()).map(|n| n.text()).collect())
        .unwrap_or_default();
    assert_eq!(params, vec!["T"]);
    assert!(matches!(class.extends(), Some(TypeRef::Path(p)) if p.name() == "Base"));
    assert_eq!(class.implements().count(), 1);

    let members: Vec<_> = class.members().collect();
    assert_eq!(members.len(), 5);
    assert!(members[0].is_static() && members[0].is_inline() && members[0].is_public());
    let Member::Field(value) = &members[1] else {
        panic!("expected a field");
    };
    assert_eq!(
        value.accessors(),
        Some(("get".to_string(), "never".to_string()))
    );
    let Member::Method(ctor) = &members[2] else {
        panic!("expected a method");
    };
    assert!(ctor.is_constructor());
    let Member::Method(get) = &members[3] else {
        panic!("expected a method");
    };
    assert!(matches!(get.body(), Some(Expr::Return(_))));
    let Member::Method(no_body) = &members[4] else {
        panic!("expected a method");
    };
    assert!(no_body.body().is_none());
}

#[test]
fn method_body_forms() {
    let defs = type_defs(
        "class A {
            function block() { return 1; }
            function expression() return 2;
            function none();
        }",
    );
    let TypeDef::Class(class) = &defs[0] else {
        panic!("expected a class");
    };
    let bodies: Vec<_> = class
        .members()
        .map(|m| match m {
            Member::Method(m) => m.body(),
            _ => panic!("expected a method"),
        })
        .collect();
    assert!(matches!(bodies[0], Some(Expr::Block(_))));
    assert!(matches!(bodies[1], Some(Expr::Return(_))));
    assert!(bodies[2].is_none());
}

#[test]
fn interface_extends_list() {
    let defs = type_defs("interface I extends A extends B { function f():Void; }");
    let TypeDef::Interface(i) = &defs[0] else {
        panic!("expected an interface");
    };
    assert_eq!(i.extends().count(), 2);
    assert_eq!(i.members().count(), 1);
}

#[test]
fn enum_constructors() {
    let defs = type_defs("enum Option<T> { Some(v:T); None; @:meta Pair<A>(a:A, ?b:Int); }");
    let TypeDef::Enum(e) = &defs[0] else {
        panic!("expected an enum");
    };
    let ctors: Vec<_> = e.ctors().collect();
    assert_eq!(ctors.len(), 3);
    assert_eq!(ctors[0].name().map(|n| n.text()).as_deref(), Some("Some"));
    assert!(ctors[1].param_list().is_none());
    let pair_params: Vec<_> = ctors[2]
        .param_list()
        .map(|l| l.params().collect())
        .unwrap_or_default();
    assert_eq!(pair_params.len(), 2);
    assert!(pair_params[1].is_optional());
    assert!(ctors[2].generic_param_list().is_some());
}

#[test]
fn abstract_with_casts_and_metadata() {
    let defs = type_defs(
        "@:forward(length) abstract Meters(Float) from Float to Float to Int {
            @:from static function fromString(s:String):Meters return new Meters(0);
            @:arrayAccess function get(i:Int):Float return this;
        }
        enum abstract Color(Int) { var Red = 0; var Green = 1; }",
    );
    let TypeDef::Abstract(a) = &defs[0] else {
        panic!("expected an abstract");
    };
    assert!(matches!(a.underlying(), Some(TypeRef::Path(p)) if p.name() == "Float"));
    assert_eq!(a.from_types().count(), 1);
    assert_eq!(a.to_types().count(), 2);
    let meta: Vec<_> = defs[0].metadata().map(|m| m.name()).collect();
    assert_eq!(meta, vec!["forward"]);
    let forward_args: Vec<_> = defs[0]
        .metadata()
        .flat_map(|m| m.args().collect::<Vec<_>>())
        .map(|e| e.syntax().text().to_string())
        .collect();
    assert_eq!(forward_args, vec!["length"]);
    let members: Vec<_> = a.members().collect();
    assert!(members[0].has_meta("from"));
    assert!(members[1].has_meta("arrayAccess"));

    let TypeDef::Abstract(color) = &defs[1] else {
        panic!("expected an enum abstract");
    };
    assert!(color.is_enum_abstract());
    assert_eq!(color.members().count(), 2);
}

#[test]
fn typedef_structures() {
    let defs = type_defs(
        "typedef Point = { x:Int, ?y:Int };
        typedef Point3 = { > Point, z:Int };
        typedef Named = { var name:String; function greet(o:String):Void; }
        typedef Cb = Int -> String -> Void;
        typedef Cb2 = (code:Int, ?msg:String) -> Bool;
        typedef Thunk = Void -> Int;",
    );
    let target = |i: usize| match &defs[i] {
        TypeDef::Typedef(t) => t.target().expect("target"),
        _ => panic!("expected a typedef"),
    };

    let TypeRef::Anon(point) = target(0) else {
        panic!("expected a structure")
    };
    let fields: Vec<_> = point.fields().collect();
    assert_eq!(fields.len(), 2);
    assert!(!fields[0].is_optional());
    assert!(fields[1].is_optional());

    let TypeRef::Anon(point3) = target(1) else {
        panic!("expected a structure")
    };
    assert_eq!(point3.extensions().count(), 1);
    assert_eq!(point3.fields().count(), 1);

    let TypeRef::Anon(named) = target(2) else {
        panic!("expected a structure")
    };
    assert_eq!(named.members().count(), 2);

    let TypeRef::Function(cb) = target(3) else {
        panic!("expected a function type")
    };
    assert_eq!(cb.args().count(), 2);
    assert!(matches!(cb.return_type(), Some(TypeRef::Path(p)) if p.name() == "Void"));

    let TypeRef::Function(cb2) = target(4) else {
        panic!("expected a function type")
    };
    let args: Vec<_> = cb2.args().collect();
    assert_eq!(args[0].name().map(|n| n.text()).as_deref(), Some("code"));
    assert!(args[1].is_optional());

    let TypeRef::Function(thunk) = target(5) else {
        panic!("expected a function type")
    };
    assert!(thunk.is_nullary());
}

#[test]
fn nested_generic_arguments() {
    let defs = type_defs("typedef M = Map<String, Array<Array<Int>>>;");
    let TypeDef::Typedef(t) = &defs[0] else {
        panic!("expected a typedef");
    };
    let Some(TypeRef::Path(map)) = t.target() else {
        panic!("expected a path type");
    };
    let args: Vec<_> = map.generic_args().collect();
    assert_eq!(args.len(), 2);
    assert_eq!(args[1].syntax().text().to_string(), "Array<Array<Int>>");
}

#[test]
fn generic_constraints() {
    let defs = type_defs("class C<T:(A, B), U:Foo & Bar, V:Baz> {}");
    let params: Vec<_> = defs[0]
        .generic_param_list()
        .expect("params")
        .params()
        .collect();
    let counts: Vec<_> = params.iter().map(|p| p.constraints().count()).collect();
    assert_eq!(counts, vec![2, 2, 1]);
}

// ── Expressions ────────────────────────────────────────────────────────

#[test]
fn object_literal_versus_block() {
    assert!(matches!(first_expr("{ a: 1, \"b\": 2 }"), Expr::ObjectLiteral(_)));
    assert!(matches!(first_expr("{}"), Expr::Block(_)));
    assert!(matches!(first_expr("{ a; }"), Expr::Block(_)));

    let Expr::ObjectLiteral(obj) = first_expr("{ a: 1, \"b c\": 2 }") else {
        unreachable!()
    };
    let names: Vec<_> = obj.fields().map(|f| f.name_text()).collect();
    assert_eq!(names, vec!["a", "b c"]);
}

#[test]
fn collection_literals() {
    let Expr::MapLiteral(map) = first_expr("[\"a\" => 1, \"b\" => 2]") else {
        panic!("expected a map literal")
    };
    assert_eq!(map.entries().count(), 2);

    let Expr::ArrayLiteral(arr) = first_expr("[1, 2, 3]") else {
        panic!("expected an array literal")
    };
    assert_eq!(arr.elements().count(), 3);

    let Expr::Comprehension(c) = first_expr("[for (i in 0...3) i * 2]") else {
        panic!("expected a comprehension")
    };
    assert!(matches!(c.element(), Some(Expr::Binary(_))));
}

#[test]
fn type_check_and_casts() {
    assert!(matches!(first_expr("(x : Int)"), Expr::CheckType(_)));
    let Expr::Cast(checked) = first_expr("cast(x, String)") else {
        panic!("expected a cast")
    };
    assert!(checked.ty().is_some());
    let Expr::Cast(unchecked) = first_expr("cast x") else {
        panic!("expected a cast")
    };
    assert!(unchecked.ty().is_none());
}

#[test]
fn operators_built_from_contextual_tokens() {
    let Expr::Binary(shift) = first_expr("a >> 2") else {
        panic!("expected a binary expression")
    };
    assert_eq!(shift.op(), Some(BinaryOp::Shr));

    let Expr::Binary(ushift) = first_expr("a >>> 2") else {
        panic!("expected a binary expression")
    };
    assert_eq!(ushift.op(), Some(BinaryOp::UShr));

    let Expr::Binary(is) = first_expr("a is String") else {
        panic!("expected a binary expression")
    };
    assert_eq!(is.op(), Some(BinaryOp::Is));
    assert!(is.rhs_type().is_some());

    let Expr::Binary(gt) = first_expr("a > b") else {
        panic!("expected a binary expression")
    };
    assert_eq!(gt.op(), Some(BinaryOp::Gt));
}

#[test]
fn assignment_is_right_associative() {
    let Expr::Binary(outer) = first_expr("a = b = 1") else {
        panic!("expected an assignment")
    };
    assert_eq!(outer.op(), Some(BinaryOp::Assign));
    assert!(matches!(outer.rhs(), Some(Expr::Binary(_))));
}

#[test]
fn ternary_and_interval() {
    let Expr::Ternary(t) = first_expr("c ? 1 : 2") else {
        panic!("expected a ternary")
    };
    assert!(t.else_branch().is_some());
    let Expr::Binary(range) = first_expr("0...n") else {
        panic!("expected an interval")
    };
    assert_eq!(range.op(), Some(BinaryOp::Interval));
}

#[test]
fn switch_cases() {
    let Expr::Switch(s) = first_expr(
        "switch (v) {
            case Some(x) if (x > 0): x;
            case A | B, C: 0;
            case _.length => 3: 1;
            default: -1;
        }",
    ) else {
        panic!("expected a switch")
    };
    assert!(matches!(s.subject(), Some(Expr::NameRef(_))));
    let cases: Vec<_> = s.cases().collect();
    assert_eq!(cases.len(), 4);
    assert!(cases[0].guard().is_some());
    assert_eq!(cases[1].patterns().count(), 2);
    let Some(Expr::Binary(extractor)) = cases[2].patterns().next() else {
        panic!("expected an extractor")
    };
    assert_eq!(extractor.op(), Some(BinaryOp::Extractor));
    assert!(cases[3].is_default());
    assert!(s.has_default());
}

#[test]
fn loops() {
    let Expr::For(f) = first_expr("for (k => v in map) trace(v)") else {
        panic!("expected a for loop")
    };
    let head = f.head().expect("head");
    assert_eq!(head.key().map(|n| n.text()).as_deref(), Some("k"));
    assert_eq!(head.value().map(|n| n.text()).as_deref(), Some("v"));
    assert!(matches!(f.body(), Some(Expr::Call(_))));

    let Expr::For(plain) = first_expr("for (x in xs) {}") else {
        panic!("expected a for loop")
    };
    assert!(plain.head().and_then(|h| h.key()).is_none());

    assert!(matches!(first_expr("do x++ while (x < 3)"), Expr::DoWhile(_)));
    assert!(matches!(first_expr("while (true) break"), Expr::While(_)));
}

#[test]
fn block_statements() {
    let Expr::Block(b) = first_expr(
        "{
            var a = 1, b:String = 'x';
            final c = a;
            if (a > 0) a; else b;
            function local(n:Int) return n;
            try foo() catch (e:String) trace(e);
            return a;
        }",
    ) else {
        panic!("expected a block")
    };
    let kinds: Vec<_> = b.statements().map(|s| s.syntax().kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::VAR_DECL,
            SyntaxKind::VAR_DECL,
            SyntaxKind::VAR_DECL,
            SyntaxKind::IF_EXPR,
            SyntaxKind::FUNCTION_EXPR,
            SyntaxKind::TRY_EXPR,
            SyntaxKind::RETURN_EXPR,
        ]
    );
    let Some(Expr::VarDecl(c)) = b.statements().nth(2) else {
        panic!("expected a var declaration")
    };
    assert!(c.is_final());
    let Some(Expr::If(i)) = b.statements().nth(3) else {
        panic!("expected an if")
    };
    assert!(i.else_branch().is_some());
}

#[test]
fn paren_lambda_and_function_literal() {
    let Expr::Lambda(l) = first_expr("(a, ?b:Int) -> a") else {
        panic!("expected a lambda")
    };
    assert_eq!(l.param_list().map(|p| p.params().count()), Some(2));

    let Expr::Function(f) = first_expr("function(x:Int):Int { return x; }") else {
        panic!("expected a function literal")
    };
    assert!(f.name().is_none());
    assert!(f.return_tag().is_some());
    assert!(matches!(f.body(), Some(Expr::Block(_))));
}

#[test]
fn new_with_type_arguments() {
    let Expr::New(n) = first_expr("new Map<String, Int>()") else {
        panic!("expected a new expression")
    };
    let Some(TypeRef::Path(p)) = n.ty() else {
        panic!("expected a path type")
    };
    assert_eq!(p.name(), "Map");
    assert_eq!(p.generic_args().count(), 2);
}

#[test]
fn incomplete_field_access_keeps_receiver() {
    let parse = parse_expression("foo.");
    assert!(!parse.ok());
    let access = &nodes(&parse.syntax(), SyntaxKind::FIELD_ACCESS)[0];
    assert_eq!(access.text().to_string(), "foo.");
}

// ── Recovery ───────────────────────────────────────────────────────────

#[test]
fn missing_semicolon_between_fields() {
    let parse = parse("class A { var x:Int var y:Int; function f() {} }");
    assert_eq!(parse.errors().len(), 1);
    assert_eq!(parse.errors()[0].message, "expected `;`");
    let root = parse.syntax();
    assert_eq!(nodes(&root, SyntaxKind::FIELD_DEF).len(), 2);
    assert_eq!(nodes(&root, SyntaxKind::METHOD_DEF).len(), 1);
}

#[test]
fn garbage_between_declarations_is_skipped() {
    let parse = parse("class A {} ) ) class B {}");
    assert!(!parse.ok());
    let names: Vec<_> = parse
        .tree()
        .type_defs()
        .filter_map(|d| d.name())
        .map(|n| n.text())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(parse.syntax().text().to_string(), "class A {} ) ) class B {}");
}

#[test]
fn unterminated_block_reports_opening_brace() {
    let parse = parse("class A { function f() { var x = 1; }");
    let err = parse
        .errors()
        .iter()
        .find(|e| e.related.is_some())
        .expect("related error");
    assert_eq!(err.message, "expected `}`");
}
