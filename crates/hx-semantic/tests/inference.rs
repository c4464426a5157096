//! Integration tests for type evaluation.
//!
//! Types are read back through `check_file`, which evaluates every
//! declared name, or through `type_at` for a single expression.

use hx_semantic::{Analyzer, CancellationToken, FileReport, ProjectIndex};

// ── Helpers ────────────────────────────────────────────────────────────

fn check_source(src: &str) -> FileReport {
    let mut index = ProjectIndex::with_prelude();
    let file = index.add_file("Main.hx", src);
    Analyzer::new(index)
        .check_file(file, &CancellationToken::new())
        .expect("not cancelled")
}

/// Index every file and check the last one.
fn check_project(files: &[(&str, &str)]) -> FileReport {
    let mut index = ProjectIndex::with_prelude();
    let mut last = None;
    for (path, text) in files {
        last = Some(index.add_file(*path, *text));
    }
    Analyzer::new(index)
        .check_file(last.expect("at least one file"), &CancellationToken::new())
        .expect("not cancelled")
}

fn type_of(report: &FileReport, name: &str) -> String {
    assert!(report.parse_errors.is_empty(), "{:?}", report.parse_errors);
    report
        .declarations
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.ty.clone())
        .unwrap_or_else(|| panic!("`{name}` is not declared: {:?}", report.declarations))
}

/// The rendered type of the first declared name called `name`.
fn declared(src: &str, name: &str) -> String {
    type_of(&check_source(src), name)
}

/// The rendered type of the expression starting where `needle` first
/// occurs.
fn type_at(src: &str, needle: &str) -> String {
    let mut index = ProjectIndex::with_prelude();
    let file = index.add_file("Main.hx", src);
    let offset = src.find(needle).expect("needle in source") as u32;
    Analyzer::new(index)
        .type_at(file, offset, &CancellationToken::new())
        .expect("not cancelled")
        .to_string()
}

/// Wrap statements in a static `main`.
fn in_main(body: &str) -> String {
    format!("class Main {{\n  static function main() {{\n{body}\n  }}\n}}\n")
}

// ── Declarations and literals ──────────────────────────────────────────

#[test]
fn literals_lose_their_constant() {
    let src = in_main("var i = 1;\nvar f = 1.5;\nvar s = \"x\";\nvar b = true;");
    assert_eq!(declared(&src, "i"), "Int");
    assert_eq!(declared(&src, "f"), "Float");
    assert_eq!(declared(&src, "s"), "String");
    assert_eq!(declared(&src, "b"), "Bool");
}

#[test]
fn empty_array_takes_the_declared_type() {
    let src = in_main("var list:Array<String> = [];");
    assert_eq!(declared(&src, "list"), "Array<String>");
    assert_eq!(type_at(&src, "[]"), "Array<String>");
}

#[test]
fn empty_array_typed_from_later_push() {
    let src = in_main("var xs = [];\nxs.push(1);");
    assert_eq!(declared(&src, "xs"), "Array<Int>");
}

#[test]
fn object_literal_fields() {
    let src = in_main("var o = { name: \"x\", age: 3 };\nvar a = o.age;");
    assert_eq!(declared(&src, "a"), "Int");
}

#[test]
fn mixed_numeric_branches_widen_to_float() {
    let src = in_main("var flag = true;\nvar t = flag ? 1 : 2.5;");
    assert_eq!(declared(&src, "t"), "Float");
}

#[test]
fn null_coalescing_unwraps_null() {
    let src = in_main("var p:Null<Int> = null;\nvar q = p ?? 0;");
    assert_eq!(declared(&src, "q"), "Int");
}

#[test]
fn fields_of_dynamic_are_dynamic() {
    let src = in_main("var d:Dynamic = null;\nvar e = d.anything;");
    assert_eq!(declared(&src, "e"), "Dynamic");
}

#[test]
fn untyped_parameter_typed_from_assignment() {
    let src = "class Main {\n  function f(a) {\n    a = \"s\";\n  }\n}\n";
    assert_eq!(declared(src, "a"), "String");
}

#[test]
fn empty_array_field_typed_from_member_use() {
    let src = "class Main {\n  var xs = [];\n  var ys = [];\n  function f() {\n    xs.push(1);\n    this.ys.push(\"a\");\n  }\n}\n";
    assert_eq!(declared(src, "xs"), "Array<Int>");
    assert_eq!(declared(src, "ys"), "Array<String>");
}

// ── Generics ───────────────────────────────────────────────────────────

const BOX: &str = "class Box<T> {\n  public var value:T;\n  public function new(v:T) {\n    value = v;\n  }\n  public function get():T {\n    return value;\n  }\n}\n";

#[test]
fn generic_method_through_class_arguments() {
    let src = format!("{BOX}{}", in_main("var b = new Box<Int>(1);\nvar n = b.get();"));
    assert_eq!(declared(&src, "n"), "Int");
}

#[test]
fn generic_arguments_inferred_from_constructor() {
    let src = format!("{BOX}{}", in_main("var b = new Box(\"s\");\nvar n = b.get();"));
    assert_eq!(declared(&src, "n"), "String");
}

#[test]
fn inherited_generic_member() {
    let src = format!(
        "{BOX}class Named extends Box<String> {{}}\n{}",
        in_main("var named = new Named(\"a\");\nvar g = named.get();")
    );
    assert_eq!(declared(&src, "g"), "String");
}

#[test]
fn same_named_type_arguments_are_kept_apart() {
    let report = check_project(&[
        ("a/Foo.hx", "package a;\nclass Foo {\n  public var x:Int;\n  public function new() {}\n}\n"),
        ("b/Foo.hx", "package b;\nclass Foo {\n  public var x:String;\n  public function new() {}\n}\n"),
        (
            "Box.hx",
            "class Box<T> {\n  var v:T;\n  public function new(v:T) {\n    this.v = v;\n  }\n  public function get() {\n    return v;\n  }\n}\n",
        ),
        (
            "Main.hx",
            "class Main {\n  static function main() {\n    var p = new Box<a.Foo>(new a.Foo()).get().x;\n    var q = new Box<b.Foo>(new b.Foo()).get().x;\n  }\n}\n",
        ),
    ]);
    assert_eq!(type_of(&report, "p"), "Int");
    assert_eq!(type_of(&report, "q"), "String");
}

#[test]
fn generic_function_inferred_from_arguments() {
    let src = "class Main {\n  static function first<T>(xs:Array<T>):T {\n    return xs[0];\n  }\n  static function main() {\n    var f = first([\"a\"]);\n  }\n}\n";
    assert_eq!(declared(src, "f"), "String");
}

#[test]
fn lambda_parameter_from_expected_function() {
    let src = in_main("var lengths = [\"a\", \"bb\"].map(s -> s.length);");
    assert_eq!(declared(&src, "lengths"), "Array<Int>");
}

// ── Functions ──────────────────────────────────────────────────────────

#[test]
fn return_type_inferred_from_body() {
    let src = "class Main {\n  static function one() {\n    return 1;\n  }\n  static function main() {\n    var x = one();\n  }\n}\n";
    assert_eq!(declared(src, "one"), "() -> Int");
    assert_eq!(declared(src, "x"), "Int");
}

#[test]
fn function_without_return_is_void() {
    let src = "class Main {\n  static function noop() {\n    trace(1);\n  }\n}\n";
    assert_eq!(declared(src, "noop"), "() -> Void");
}

#[test]
fn bare_return_beside_a_value_is_void() {
    let src = "class Main {\n  static function g(b:Bool) {\n    if (b) return;\n    return 1;\n  }\n}\n";
    assert_eq!(declared(src, "g"), "(Bool) -> Void");
}

#[test]
fn returns_of_nested_functions_are_their_own() {
    let src = "class Main {\n  static function h() {\n    var f = function() {\n      return \"s\";\n    };\n    return 1;\n  }\n}\n";
    assert_eq!(declared(src, "h"), "() -> Int");
}

// ── Enums and switch ───────────────────────────────────────────────────

#[test]
fn enum_capture_takes_constructor_argument_type() {
    let src = "enum E {\n  A(x:Int);\n  B;\n}\nclass Main {\n  static function f(e:E) {\n    switch (e) {\n      case A(n): var m = n;\n      case B:\n    }\n  }\n}\n";
    assert_eq!(declared(src, "m"), "Int");
}

#[test]
fn nested_constructor_patterns() {
    let src = "enum Tree {\n  Leaf(v:Int);\n  Node(l:Tree, r:Tree);\n}\nclass Main {\n  static function f(t:Tree) {\n    switch (t) {\n      case Node(Leaf(a), _): var m = a;\n      case _:\n    }\n  }\n}\n";
    assert_eq!(declared(src, "m"), "Int");
}

#[test]
fn enum_constructor_value_is_the_enum() {
    let src = "enum E {\n  A(x:Int);\n  B;\n}\nclass Main {\n  static function main() {\n    var a = A(1);\n    var b = B;\n  }\n}\n";
    assert_eq!(declared(src, "a"), "E");
    assert_eq!(declared(src, "b"), "E");
}

#[test]
fn switch_value_unifies_its_cases() {
    let src = "class Main {\n  static function f(n:Int) {\n    var r = switch (n) {\n      case 1: 1;\n      case _: 2.5;\n    };\n  }\n}\n";
    assert_eq!(declared(src, "r"), "Float");
}

#[test]
fn try_value_unifies_body_and_catches() {
    let src = in_main("var t = try { 1; } catch (e:Dynamic) { 2.5; };");
    assert_eq!(declared(&src, "t"), "Float");
}

#[test]
fn array_pattern_inside_constructor() {
    let src = "enum E {\n  Items(xs:Array<Int>);\n}\nclass Main {\n  static function f(e:E) {\n    switch (e) {\n      case Items([a, b]): var m = a;\n    }\n  }\n}\n";
    assert_eq!(declared(src, "m"), "Int");
}

#[test]
fn object_pattern_inside_constructor() {
    let src = "typedef P = {name:String, age:Int};\nenum E {\n  Person(p:P);\n}\nclass Main {\n  static function f(e:E) {\n    switch (e) {\n      case Person({age: n}): var m = n;\n    }\n  }\n}\n";
    assert_eq!(declared(src, "m"), "Int");
}

// ── Loops ──────────────────────────────────────────────────────────────

#[test]
fn loop_variables() {
    let src = in_main(
        "for (i in 0...3) {}\nfor (s in [\"a\"]) {}\nvar m = new Map<String, Int>();\nfor (k => v in m) {}",
    );
    assert_eq!(declared(&src, "i"), "Int");
    assert_eq!(declared(&src, "s"), "String");
    assert_eq!(declared(&src, "k"), "String");
    assert_eq!(declared(&src, "v"), "Int");
}

// ── Cycles ─────────────────────────────────────────────────────────────

#[test]
fn cyclic_typedefs_are_unknown() {
    let src = "typedef A = B;\ntypedef B = A;\nclass Main {\n  static function main() {\n    var x:A = null;\n    var y:B = null;\n  }\n}\n";
    assert_eq!(declared(src, "x"), "Unknown");
    assert_eq!(declared(src, "y"), "Unknown");
}

#[test]
fn self_referencing_initializer_terminates() {
    let src = in_main("var x = x;");
    assert_eq!(declared(&src, "x"), "Unknown");
}

// ── Reports ────────────────────────────────────────────────────────────

#[test]
fn code_after_return_is_unreachable() {
    let src = "class Main {\n  static function f() {\n    return;\n    trace(1);\n  }\n}\n";
    let report = check_source(src);
    let lines: Vec<u32> = report.unreachable.iter().map(|u| u.line).collect();
    assert_eq!(lines, vec![4]);
}

#[test]
fn constant_false_branch_is_unreachable() {
    let src = "class Main {\n  static function f() {\n    if (false) {\n      trace(1);\n    }\n  }\n}\n";
    let report = check_source(src);
    let lines: Vec<u32> = report.unreachable.iter().map(|u| u.line).collect();
    assert_eq!(lines, vec![3]);
}

#[test]
fn unresolved_names_are_reported() {
    let src = in_main("var a = missing;\nvar b = a + 1;");
    let report = check_source(&src);
    let names: Vec<&str> = report.unresolved.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["missing"]);
}
