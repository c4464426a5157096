//! Integration tests for name resolution.
//!
//! Each test indexes a few files next to the prelude, points at a
//! reference by searching the source text, and checks what it resolves to
//! through the `TargetView` rendering a tool would show.

use hx_semantic::{
    Analyzer, CancellationToken, DeclarationCatalog, FileId, GenericResolver, ProjectIndex,
    TargetView,
};
use insta::assert_snapshot;

// ── Helpers ────────────────────────────────────────────────────────────

fn project(files: &[(&str, &str)]) -> (Analyzer<ProjectIndex>, Vec<FileId>) {
    let mut index = ProjectIndex::with_prelude();
    let ids = files
        .iter()
        .map(|(path, text)| index.add_file(*path, *text))
        .collect();
    (Analyzer::new(index), ids)
}

/// Byte offset of the `n`th (0-based) occurrence of `needle`.
fn nth_offset(src: &str, needle: &str, n: usize) -> u32 {
    src.match_indices(needle)
        .nth(n)
        .map(|(offset, _)| offset as u32)
        .unwrap_or_else(|| panic!("occurrence {n} of `{needle}` not found"))
}

fn render(analyzer: &Analyzer<ProjectIndex>, file: FileId, offset: u32) -> Vec<String> {
    let targets = analyzer
        .resolve_at(file, offset, &CancellationToken::new())
        .expect("not cancelled");
    targets
        .iter()
        .map(|t| {
            let view = TargetView::new(analyzer.catalog(), t);
            match view.location {
                Some(at) if view.kind != "class" => {
                    format!("{} {} @{}:{}", view.kind, view.name, at.line, at.column)
                }
                _ => format!("{} {}", view.kind, view.name),
            }
        })
        .collect()
}

/// Resolve the `n`th occurrence of `needle` in a single-file project.
fn resolve_in(src: &str, needle: &str, n: usize) -> String {
    let (analyzer, files) = project(&[("Main.hx", src)]);
    render(&analyzer, files[0], nth_offset(src, needle, n)).join("\n")
}

// ── Scope ──────────────────────────────────────────────────────────────

#[test]
fn local_shadows_field() {
    let src = "class Main {\n  var value:Int;\n  function run() {\n    var value = \"text\";\n    trace(value);\n  }\n}\n";
    assert_snapshot!(resolve_in(src, "value", 2), @"var value @4:9");
}

#[test]
fn field_through_this() {
    let src = "class Main {\n  var count:Int;\n  function run() {\n    this.count;\n  }\n}\n";
    assert_eq!(resolve_in(src, "count", 1), "field Main.count @2:7");
}

#[test]
fn parameter_of_enclosing_method() {
    let src = "class Main {\n  static function twice(n:Int) {\n    return n * 2;\n  }\n}\n";
    assert_eq!(resolve_in(src, "n * 2", 0), "param n @2:25");
}

#[test]
fn inherited_member_without_receiver() {
    let src = "class Base {\n  public var id:Int;\n  public function new() {}\n}\nclass Child extends Base {\n  function show() {\n    return id;\n  }\n}\n";
    assert_eq!(resolve_in(src, "id;", 0), "field Base.id @2:14");
}

#[test]
fn generic_parameter_in_type_position() {
    let src = "class Box<T> {\n  var item:T;\n}\n";
    assert_eq!(resolve_in(src, "T", 1), "type parameter T @1:11");
}

#[test]
fn unknown_name_resolves_to_nothing() {
    let src = "class Main {\n  function run() {\n    nothing;\n  }\n}\n";
    assert_eq!(resolve_in(src, "nothing", 0), "");
}

// ── Switch patterns ────────────────────────────────────────────────────

const COLORS: &str = "enum Color {\n  Red;\n  Green;\n  Rgb(r:Int, g:Int, b:Int);\n}\nclass Main {\n  static function name(c:Color) {\n    switch (c) {\n      case Red: return \"red\";\n      case Rgb(x, _, _): return \"rgb \" + x;\n      case _: return \"other\";\n    }\n  }\n}\n";

#[test]
fn case_names_the_enum_constructor() {
    assert_eq!(resolve_in(COLORS, "Red", 1), "enum constructor Color.Red @2:3");
}

#[test]
fn capture_in_constructor_pattern() {
    let use_site = resolve_in(COLORS, "x;", 0);
    assert_eq!(use_site, "capture x @10:16");
}

// ── Imports and packages ───────────────────────────────────────────────

const TOOLS: &str = "package a;\nclass Tools {\n  public static function twice(x:Int):Int {\n    return x * 2;\n  }\n}\n";

#[test]
fn imported_class_and_its_static_method() {
    let main = "import a.Tools;\nclass Main {\n  static function main() {\n    Tools.twice(2);\n  }\n}\n";
    let (analyzer, files) = project(&[("a/Tools.hx", TOOLS), ("Main.hx", main)]);
    assert_eq!(
        render(&analyzer, files[1], nth_offset(main, "Tools", 1)),
        vec!["class a.Tools"]
    );
    assert_eq!(
        render(&analyzer, files[1], nth_offset(main, "twice", 0)),
        vec!["method Tools.twice @3:26"]
    );
}

#[test]
fn import_alias_names_the_class() {
    let main = "import a.Tools as T2;\nclass Main {\n  static function main() {\n    T2.twice(2);\n  }\n}\n";
    let (analyzer, files) = project(&[("a/Tools.hx", TOOLS), ("Main.hx", main)]);
    assert_eq!(
        render(&analyzer, files[1], nth_offset(main, "T2", 1)),
        vec!["class a.Tools"]
    );
}

#[test]
fn package_prefix_then_class_then_method() {
    let src = "class Main {\n  static function main() {\n    haxe.Log.trace(\"hi\");\n  }\n}\n";
    let (analyzer, files) = project(&[("Main.hx", src)]);
    let at = |needle: &str| render(&analyzer, files[0], nth_offset(src, needle, 0));
    assert_eq!(at("haxe"), vec!["package haxe"]);
    assert_eq!(at("Log"), vec!["class haxe.Log"]);
    assert_eq!(at("trace")[0].split(" @").next(), Some("method Log.trace"));
}

// ── Enum constructor tie-break ─────────────────────────────────────────

const FIRST: &str = "package a;\nenum First {\n  A(x:Int);\n}\n";
const SECOND: &str = "package b;\nenum Second {\n  A(x:Int);\n}\n";

#[test]
fn same_name_constructors_pick_the_first_import() {
    let main = "import a.First;\nimport b.Second;\nclass Main {\n  static function main() {\n    var v = A(1);\n  }\n}\n";
    let (analyzer, files) = project(&[("a/First.hx", FIRST), ("b/Second.hx", SECOND), ("Main.hx", main)]);
    let picked = render(&analyzer, files[2], nth_offset(main, "A(1)", 0));
    assert_eq!(picked, vec!["enum constructor First.A @3:3"]);
}

#[test]
fn expected_type_overrides_import_order() {
    let main = "import a.First;\nimport b.Second;\nclass Main {\n  static function main() {\n    var v:Second = A(1);\n  }\n}\n";
    let (analyzer, files) = project(&[("a/First.hx", FIRST), ("b/Second.hx", SECOND), ("Main.hx", main)]);
    let picked = render(&analyzer, files[2], nth_offset(main, "A(1)", 0));
    assert_eq!(picked, vec!["enum constructor Second.A @3:3"]);
}

// ── Caching ────────────────────────────────────────────────────────────

#[test]
fn resolution_is_idempotent() {
    let src = "class Main {\n  var count:Int;\n  function run() {\n    count;\n  }\n}\n";
    let (analyzer, files) = project(&[("Main.hx", src)]);
    let token = CancellationToken::new();
    let reference = analyzer
        .catalog()
        .node_at(files[0], nth_offset(src, "count", 1))
        .expect("reference node");
    let generics = GenericResolver::new();
    let first = analyzer.resolve(reference, &generics, &token).unwrap();
    let second = analyzer.resolve(reference, &generics, &token).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    analyzer.invalidate();
    assert_eq!(analyzer.resolve(reference, &generics, &token).unwrap(), first);
}

#[test]
fn edits_are_seen_by_the_next_query() {
    let before = "class Main {\n  function run() {\n    this.later;\n  }\n}\n";
    let after = "class Main {\n  var later:Int;\n  function run() {\n    this.later;\n  }\n}\n";
    let (mut analyzer, files) = project(&[("Main.hx", before)]);
    assert!(render(&analyzer, files[0], nth_offset(before, "later", 0)).is_empty());
    analyzer.catalog_mut().update_file(files[0], after);
    assert_eq!(
        render(&analyzer, files[0], nth_offset(after, "later", 1)),
        vec!["field Main.later @2:7"]
    );
}

#[test]
fn queries_from_several_threads() {
    let src = "class Main {\n  var count:Int;\n  function run() {\n    count;\n  }\n}\n";
    let (analyzer, files) = project(&[("Main.hx", src)]);
    let offset = nth_offset(src, "count", 1);
    let results: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| render(&analyzer, files[0], offset)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for r in results {
        assert_eq!(r, vec!["field Main.count @2:7"]);
    }
}
