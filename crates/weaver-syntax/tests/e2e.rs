//! End-to-end tests for weaver-syntax using insta for snapshot testing.
//!
//! These tests exercise the public API: parsing into lossless trees,
//! cursors, literals, and type attribution.

use std::fmt::Write as _;

use insta::assert_snapshot;
use rstest::{fixture, rstest};

use weaver_syntax::{LiteralValue, Parser, SupportedLanguage, SyntaxNode, TypeInfo};

#[fixture]
fn typescript() -> Parser {
    Parser::new(SupportedLanguage::TypeScript).unwrap_or_else(|err| panic!("parser: {err}"))
}

fn outline(node: &SyntaxNode, depth: usize, out: &mut String) {
    let field = node.field().map(|name| format!(" ({name})")).unwrap_or_default();
    let text = if node.is_leaf() {
        format!(" {:?}", node.text())
    } else {
        String::new()
    };
    writeln!(out, "{}{}{field}{text}", "  ".repeat(depth), node.kind())
        .unwrap_or_else(|err| panic!("write: {err}"));
    for child in node.children() {
        outline(child, depth + 1, out);
    }
}

#[rstest]
fn snapshot_binary_expression_outline(mut typescript: Parser) {
    let tree = typescript
        .parse_tree("x + 1")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let mut out = String::new();
    outline(tree.root(), 0, &mut out);

    assert_snapshot!(out, @r#"
    program
      expression_statement
        binary_expression
          identifier (left) "x"
          + (operator) "+"
          number (right) "1"
    "#);
}

#[rstest]
fn trees_print_back_after_prefix_rewrites(mut typescript: Parser) {
    let tree = typescript
        .parse_tree("call(a,\n     b);")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let argument = tree
        .root()
        .descendants()
        .filter(|node| node.kind() == "identifier")
        .last()
        .unwrap_or_else(|| panic!("argument"));

    assert_eq!(argument.prefix(), "\n     ");
    assert_eq!(argument.clone().with_prefix(" ").to_source(), " b");
}

#[rstest]
#[case("0x10", "16")]
#[case("'x'", "\"x\"")]
fn literals_from_parsed_sources_compare_by_value(
    mut typescript: Parser,
    #[case] left: &str,
    #[case] right: &str,
) {
    let mut literal = |source: &str| {
        let tree = typescript
            .parse_tree(source)
            .unwrap_or_else(|err| panic!("parse: {err}"));
        tree.root()
            .descendants()
            .find_map(LiteralValue::of)
            .unwrap_or_else(|| panic!("literal in {source}"))
    };
    assert_eq!(literal(left), literal(right));
}

#[rstest]
fn imported_types_are_canonical(mut typescript: Parser) {
    let tree = typescript
        .parse_tree("import Default from 'lib';\nlet d: Default = make();\nuse(d);")
        .unwrap_or_else(|err| panic!("parse: {err}"));
    let used = tree
        .root()
        .descendants()
        .filter(|node| node.kind() == "identifier" && node.text() == "d")
        .last()
        .and_then(SyntaxNode::ty)
        .cloned();

    assert_eq!(used, Some(TypeInfo::in_module("lib", "default")));
}
