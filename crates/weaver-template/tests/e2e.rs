//! End-to-end tests for weaver-template using insta for snapshot testing.
//!
//! Each test parses a whole source file, offers every node to a rule in
//! pre-order the way a host visitor would, and snapshots the printed result.

use insta::assert_snapshot;
use rstest::rstest;

use weaver_syntax::{Cursor, Parser, SupportedLanguage, SyntaxNode};
use weaver_template::{
    Capture, Compiler, MatchOptions, Rewrite, RewriteRule, capture, pattern, template,
};

fn parse(language: SupportedLanguage, source: &str) -> SyntaxNode {
    Parser::new(language)
        .and_then(|mut parser| parser.parse_tree(source))
        .unwrap_or_else(|err| panic!("parse: {err}"))
        .into_root()
}

/// Replaces every outermost node the rule accepts.
fn rewrite(rule: &dyn Rewrite, node: &SyntaxNode, cursor: &Cursor<'_>) -> SyntaxNode {
    if let Some(replacement) = rule
        .try_on(node, Some(cursor))
        .unwrap_or_else(|err| panic!("rewrite: {err}"))
    {
        return replacement;
    }
    let children = node
        .children()
        .iter()
        .map(|child| rewrite(rule, child, &cursor.child(child)))
        .collect();
    node.clone().with_children(children)
}

fn rewrite_source(language: SupportedLanguage, rule: &dyn Rewrite, source: &str) -> String {
    let root = parse(language, source);
    rewrite(rule, &root, &Cursor::root(&root)).to_source()
}

fn variadic(name: &str) -> Capture {
    Capture::builder()
        .name(name)
        .variadic()
        .build()
        .unwrap_or_else(|err| panic!("capture: {err}"))
}

#[rstest]
fn snapshot_typescript_call_rename() {
    let compiler = Compiler::for_language(SupportedLanguage::TypeScript);
    let args = variadic("args");
    let rule = RewriteRule::builder()
        .before(pattern!(compiler; "foo(", &args, ")").unwrap_or_else(|err| panic!("{err}")))
        .after(template!(compiler; "bar(", &args, ")").unwrap_or_else(|err| panic!("{err}")))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    let output = rewrite_source(
        SupportedLanguage::TypeScript,
        &rule,
        "const total = foo(1,   2); // sum\nif (ready) {\n  foo();\n}\n",
    );

    assert_snapshot!(output, @r"
    const total = bar(1,   2); // sum
    if (ready) {
      bar();
    }
    ");
}

#[rstest]
fn snapshot_python_call_rename() {
    let compiler = Compiler::for_language(SupportedLanguage::Python);
    let message = capture("message");
    let rule = RewriteRule::builder()
        .before(pattern!(compiler; "emit(", &message, ")").unwrap_or_else(|err| panic!("{err}")))
        .after(
            template!(compiler; "logger.info(", &message, ")")
                .unwrap_or_else(|err| panic!("{err}")),
        )
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    let output = rewrite_source(
        SupportedLanguage::Python,
        &rule,
        "if ok:\n    emit('done')\nemit('a', 2)\n",
    );

    assert_snapshot!(output, @r"
    if ok:
        logger.info('done')
    emit('a', 2)
    ");
}

#[rstest]
fn snapshot_rust_unwrap_to_expect() {
    let compiler = Compiler::for_language(SupportedLanguage::Rust);
    let receiver = capture("receiver");
    let rule = RewriteRule::builder()
        .before(pattern!(compiler; &receiver, ".unwrap()").unwrap_or_else(|err| panic!("{err}")))
        .after(
            template!(compiler; &receiver, ".expect(\"present\")")
                .unwrap_or_else(|err| panic!("{err}")),
        )
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    let output = rewrite_source(
        SupportedLanguage::Rust,
        &rule,
        "fn main() {\n    let value = lookup().unwrap();\n}\n",
    );

    assert_snapshot!(output, @r#"
    fn main() {
        let value = lookup().expect("present");
    }
    "#);
}

#[rstest]
fn snapshot_failure_explanation() {
    let compiler = Compiler::for_language(SupportedLanguage::TypeScript);
    let property = capture("property");
    let destructure = pattern!(compiler; "const {", &property, "} = obj")
        .unwrap_or_else(|err| panic!("{err}"));
    let root = parse(SupportedLanguage::TypeScript, "const {a, b} = obj;");
    let target = root
        .descendants()
        .find(|node| node.kind() == "lexical_declaration")
        .unwrap_or_else(|| panic!("no declaration"));

    let outcome = destructure.match_with_explanation(target, None, &MatchOptions::default());
    let explanation = outcome
        .explanation()
        .map(ToString::to_string)
        .unwrap_or_default();

    assert_snapshot!(explanation, @"array-length-mismatch at lexical_declaration#children[1] > variable_declarator#name[0] > object_pattern#children: expected 3 children, found 4 children");
}
