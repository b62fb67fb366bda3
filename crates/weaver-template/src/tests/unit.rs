//! Unit tests for weaver-template, run against parsed TypeScript.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};
use weaver_syntax::{Cursor, Parser, SupportedLanguage, SyntaxNode};

use crate::{
    Bindings, Bound, Capture, CompileConfig, Compiler, Constraint, ConstraintError, DebugDefault,
    FailureReason, MatchFailure, MatchOptions, MatchResult, Matcher, Metavariables, Part, PathStep,
    Pattern, Recipe, Rewrite, RewriteRule, Template, TemplateError, capture, flatten_block,
    from_recipe, param,
};

#[fixture]
fn compiler() -> Compiler {
    Compiler::for_language(SupportedLanguage::TypeScript)
}

fn parse(source: &str) -> SyntaxNode {
    Parser::new(SupportedLanguage::TypeScript)
        .and_then(|mut parser| parser.parse_tree(source))
        .unwrap_or_else(|err| panic!("parse {source:?}: {err}"))
        .into_root()
}

fn first<'a>(root: &'a SyntaxNode, kind: &str) -> &'a SyntaxNode {
    root.descendants()
        .find(|node| node.kind() == kind)
        .unwrap_or_else(|| panic!("no {kind} in {:?}", root.to_source()))
}

fn variadic(name: &str) -> Capture {
    Capture::builder()
        .name(name)
        .variadic()
        .build()
        .unwrap_or_else(|err| panic!("capture {name}: {err}"))
}

fn compile_pattern(compiler: &Compiler, parts: Vec<Part>) -> Pattern {
    Pattern::compile(compiler, parts).unwrap_or_else(|err| panic!("pattern: {err}"))
}

fn compile_template(compiler: &Compiler, parts: Vec<Part>) -> Template {
    Template::compile(compiler, parts).unwrap_or_else(|err| panic!("template: {err}"))
}

fn rename_call(compiler: &Compiler, from: &str, to: &str) -> RewriteRule {
    let args = variadic("args");
    RewriteRule::builder()
        .before(compile_pattern(
            compiler,
            vec![format!("{from}(").into(), (&args).into(), ")".into()],
        ))
        .after(compile_template(
            compiler,
            vec![format!("{to}(").into(), (&args).into(), ")".into()],
        ))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"))
}

fn rewrite_first_call(rule: &impl Rewrite, source: &str) -> Option<String> {
    let root = parse(source);
    rule.try_on(first(&root, "call_expression"), None)
        .unwrap_or_else(|err| panic!("rewrite: {err}"))
        .map(|node| node.text())
}

// =============================================================================
// Matching
// =============================================================================

#[rstest]
fn swaps_binary_operands(compiler: Compiler) {
    let x = capture("x");
    let before = compile_pattern(&compiler, vec![(&x).into(), " + 1".into()]);
    let after = compile_template(&compiler, vec!["1 + ".into(), (&x).into()]);
    let root = parse("const y = a + 1;");
    let target = first(&root, "binary_expression");

    let result = before
        .matches(target, None)
        .unwrap_or_else(|| panic!("pattern should match"));
    let replaced = after
        .apply(target, None, &result)
        .unwrap_or_else(|err| panic!("apply: {err}"));

    assert_eq!(replaced.text(), "1 + a");
    assert_eq!(replaced.prefix(), " ");
}

#[rstest]
#[case("a + a", true)]
#[case("a + b", false)]
fn repeated_captures_must_bind_equal_code(
    compiler: Compiler,
    #[case] source: &str,
    #[case] matches: bool,
) {
    let x = capture("x");
    let pattern = compile_pattern(&compiler, vec![(&x).into(), " + ".into(), (&x).into()]);
    let root = parse(source);
    let outcome = pattern.match_with_explanation(
        first(&root, "binary_expression"),
        None,
        &MatchOptions::default(),
    );

    assert_eq!(outcome.matched(), matches);
    if !matches {
        assert_eq!(
            outcome.explanation().map(MatchFailure::reason),
            Some(FailureReason::ValueMismatch)
        );
    }
}

#[rstest]
#[case("16", "0x10", "number", true)]
#[case("16", "17", "number", false)]
#[case("'a'", "\"a\"", "string", true)]
fn literals_compare_by_value(
    compiler: Compiler,
    #[case] pattern_source: &str,
    #[case] target_source: &str,
    #[case] kind: &str,
    #[case] matches: bool,
) {
    let pattern = compile_pattern(&compiler, vec![pattern_source.into()]);
    let root = parse(target_source);
    assert_eq!(pattern.matches(first(&root, kind), None).is_some(), matches);
}

#[rstest]
#[case("bar()", false)]
#[case("bar(1, 2)", true)]
#[case("bar(1, 2, 3, 4)", false)]
fn bounded_wildcards_check_run_length(
    compiler: Compiler,
    #[case] source: &str,
    #[case] matches: bool,
) {
    let args = Capture::any_builder()
        .bounds(Some(1), Some(3))
        .build()
        .unwrap_or_else(|err| panic!("capture: {err}"));
    let pattern = compile_pattern(&compiler, vec!["bar(".into(), (&args).into(), ")".into()]);
    let root = parse(source);
    let outcome = pattern.match_with_explanation(
        first(&root, "call_expression"),
        None,
        &MatchOptions::default(),
    );

    assert_eq!(outcome.matched(), matches);
    if matches {
        assert!(
            outcome.result().is_some_and(MatchResult::is_empty),
            "wildcards must not be recorded"
        );
    } else {
        assert_eq!(
            outcome.explanation().map(MatchFailure::reason),
            Some(FailureReason::ArrayLengthMismatch)
        );
    }
}

#[rstest]
#[case(true, None)]
#[case(false, Some(FailureReason::TypeMismatch))]
fn untyped_patterns_match_typed_code_only_when_lenient(
    compiler: Compiler,
    #[case] lenient: bool,
    #[case] expected: Option<FailureReason>,
) {
    let name = capture("name");
    let params = variadic("params");
    let body = variadic("body");
    let pattern = Pattern::compile_with(
        &compiler,
        [
            Part::from("function "),
            Part::from(&name),
            Part::from("("),
            Part::from(&params),
            Part::from(") { "),
            Part::from(&body),
            Part::from(" }"),
        ],
        CompileConfig::new().lenient_type_matching(lenient),
    )
    .unwrap_or_else(|err| panic!("pattern: {err}"));
    let root = parse("function f(x: number) { return x; }");
    let outcome = pattern.match_with_explanation(
        first(&root, "function_declaration"),
        None,
        &MatchOptions::default(),
    );

    assert_eq!(outcome.explanation().map(MatchFailure::reason), expected);
    if let Some(failure) = outcome.explanation() {
        assert!(failure.path().is_empty(), "the root itself should mismatch");
    }
    if let Some(result) = outcome.result() {
        assert_eq!(result.node(&name).map(SyntaxNode::text).as_deref(), Some("f"));
        assert_eq!(result.nodes(&body).map(<[SyntaxNode]>::len), Some(1));
    }
}

#[rstest]
fn explains_where_destructuring_diverges(compiler: Compiler) {
    let property = capture("property");
    let pattern = compile_pattern(
        &compiler,
        vec!["const {".into(), (&property).into(), "} = obj".into()],
    );
    let root = parse("const {a, b} = obj;");
    let outcome = pattern.match_with_explanation(
        first(&root, "lexical_declaration"),
        None,
        &MatchOptions::default(),
    );

    let failure = outcome
        .explanation()
        .unwrap_or_else(|| panic!("pattern should not match"));
    assert_eq!(failure.reason(), FailureReason::ArrayLengthMismatch);
    assert_eq!(failure.path().last().map(PathStep::kind), Some("object_pattern"));
}

#[rstest]
fn constraint_errors_are_reported_and_logged(compiler: Compiler) {
    let value = Capture::builder()
        .name("value")
        .constraint(Constraint::fallible(|_, _| {
            Err(ConstraintError::new("lookup failed"))
        }))
        .build()
        .unwrap_or_else(|err| panic!("capture: {err}"));
    let pattern = compile_pattern(&compiler, vec!["foo(".into(), (&value).into(), ")".into()]);
    let root = parse("foo(1);");
    let outcome = pattern.match_with_explanation(
        first(&root, "call_expression"),
        None,
        &MatchOptions::default().debug(true),
    );

    let failure = outcome
        .explanation()
        .unwrap_or_else(|| panic!("constraint should fail the match"));
    assert_eq!(failure.reason(), FailureReason::ConstraintError);
    assert_eq!(failure.actual(), "lookup failed");
    let logged = outcome
        .debug_log()
        .is_some_and(|log| log.entries().iter().any(|entry| entry.ends_with("raised: lookup failed")));
    assert!(logged, "debug log should record the constraint error");
}

#[rstest]
#[case("foo(1)", true)]
#[case("foo(2)", false)]
fn constraints_see_the_candidate(compiler: Compiler, #[case] source: &str, #[case] matches: bool) {
    let one = Capture::builder()
        .name("one")
        .constraint(Constraint::new(|candidate, _| {
            candidate.as_node().is_some_and(|node| node.text() == "1")
        }))
        .build()
        .unwrap_or_else(|err| panic!("capture: {err}"));
    let pattern = compile_pattern(&compiler, vec!["foo(".into(), (&one).into(), ")".into()]);
    let root = parse(source);
    assert_eq!(pattern.matches(first(&root, "call_expression"), None).is_some(), matches);
}

#[rstest]
fn debug_settings_follow_precedence(compiler: Compiler) {
    let root = parse("a + 1");
    let target = first(&root, "binary_expression");
    let x = capture("x");
    let parts = vec![Part::from(&x), Part::from(" + 1")];
    let debugging = compiler.clone().with_debug_default(DebugDefault::new(true));
    let pattern = compile_pattern(&debugging, parts.clone());
    let quiet = pattern
        .configure(CompileConfig::new().debug(false))
        .unwrap_or_else(|err| panic!("configure: {err}"));

    let defaults = MatchOptions::default();
    assert!(pattern.match_with_explanation(target, None, &defaults).debug_log().is_some());
    assert!(quiet.match_with_explanation(target, None, &defaults).debug_log().is_none());
    assert!(
        quiet
            .match_with_explanation(target, None, &MatchOptions::default().debug(true))
            .debug_log()
            .is_some()
    );
    assert!(
        compile_pattern(&compiler, parts)
            .match_with_explanation(target, None, &defaults)
            .debug_log()
            .is_none()
    );
}

#[rstest]
fn matcher_exposes_bindings(compiler: Compiler) {
    let x = capture("x");
    let pattern = compile_pattern(&compiler, vec![(&x).into(), " + 1".into()]);
    let root = parse("a + 1");
    let matcher = Matcher::new(&pattern, first(&root, "binary_expression"), None);

    assert!(matcher.matches());
    assert_eq!(
        matcher.get(&x).and_then(Bound::as_node).map(SyntaxNode::text).as_deref(),
        Some("a")
    );
    assert!(matcher.explanation().is_none());
}

#[rstest]
#[case("foo(...a, ...b)", &["a", "b"])]
#[case("foo(...a)", &["a"])]
#[case("foo()", &[])]
fn spread_patterns_bind_the_spread_elements(
    compiler: Compiler,
    #[case] source: &str,
    #[case] expected: &[&str],
) {
    let args = variadic("args");
    let pattern = compile_pattern(&compiler, vec!["foo(...".into(), (&args).into(), ")".into()]);
    let root = parse(source);

    let result = pattern
        .matches(first(&root, "call_expression"), None)
        .unwrap_or_else(|| panic!("{source} should match"));
    let bound: Vec<String> = result
        .nodes(&args)
        .unwrap_or_default()
        .iter()
        .map(SyntaxNode::text)
        .collect();
    assert_eq!(bound, expected);
}

#[rstest]
fn spread_patterns_reject_plain_elements(compiler: Compiler) {
    let args = variadic("args");
    let pattern = compile_pattern(&compiler, vec!["foo(...".into(), (&args).into(), ")".into()]);
    let root = parse("foo(a, ...b)");

    let outcome = pattern.match_with_explanation(
        first(&root, "call_expression"),
        None,
        &MatchOptions::default(),
    );
    assert!(!outcome.matched());
    assert_eq!(
        outcome.explanation().map(MatchFailure::reason),
        Some(FailureReason::KindMismatch)
    );
}

#[rstest]
fn finds_matches_in_document_order(compiler: Compiler) {
    let x = capture("x");
    let pattern = compile_pattern(&compiler, vec!["console.log(".into(), (&x).into(), ")".into()]);
    let root = parse("console.log(1);\nfoo();\nconsole.log(2);\n");

    let bound: Vec<String> = pattern
        .find_all(&root)
        .iter()
        .filter_map(|found| found.result().node(&x).map(SyntaxNode::text))
        .collect();
    assert_eq!(bound, ["1", "2"]);
    assert_eq!(
        pattern.find_first(&root).map(|found| found.node().text()).as_deref(),
        Some("console.log(1)")
    );
}

// =============================================================================
// Templates
// =============================================================================

#[rstest]
#[case("foo(1,   2)", "bar(1,   2)")]
#[case("foo(a)", "bar(a)")]
#[case("foo()", "bar()")]
fn renames_calls_keeping_argument_layout(
    compiler: Compiler,
    #[case] source: &str,
    #[case] expected: &str,
) {
    let rule = rename_call(&compiler, "foo", "bar");
    assert_eq!(rewrite_first_call(&rule, source).as_deref(), Some(expected));
}

#[rstest]
#[case(&["bar(", "", ", 0)"], "foo()", "bar(0)")]
#[case(&["bar(", "", ", 0)"], "foo(1, 2)", "bar(1, 2, 0)")]
#[case(&["bar(0, ", "", ")"], "foo()", "bar(0)")]
#[case(&["bar(0, ", "", ")"], "foo(1)", "bar(0, 1)")]
fn empty_splices_leave_no_dangling_separator(
    compiler: Compiler,
    #[case] shape: &[&str],
    #[case] source: &str,
    #[case] expected: &str,
) {
    let args = variadic("args");
    let parts: Vec<Part> = shape
        .iter()
        .map(|code| {
            if code.is_empty() {
                Part::from(&args)
            } else {
                Part::from(*code)
            }
        })
        .collect();
    let rule = RewriteRule::builder()
        .before(compile_pattern(&compiler, vec!["foo(".into(), (&args).into(), ")".into()]))
        .after(compile_template(&compiler, parts))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    assert_eq!(rewrite_first_call(&rule, source).as_deref(), Some(expected));
}

#[rstest]
fn expression_templates_fill_statement_sites(compiler: Compiler) {
    let a = capture("a");
    let rule = RewriteRule::builder()
        .before(compile_pattern(&compiler, vec!["foo(".into(), (&a).into(), ");".into()]))
        .after(compile_template(&compiler, vec!["bar(".into(), (&a).into(), ")".into()]))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));
    let root = parse("foo(1);");
    let statement = first(&root, "expression_statement");
    let program = Cursor::root(&root);
    let cursor = program.child(statement);

    let replaced = rule
        .try_on(statement, Some(&cursor))
        .unwrap_or_else(|err| panic!("rewrite: {err}"))
        .unwrap_or_else(|| panic!("rule should apply"));

    assert_eq!(replaced.kind(), "expression_statement");
    assert_eq!(replaced.text(), "bar(1);");
}

#[rstest]
fn templates_need_every_parameter_bound(compiler: Compiler) {
    let p = param("p");
    let template = compile_template(&compiler, vec!["bar(".into(), (&p).into(), ")".into()]);
    let root = parse("foo()");
    let original = first(&root, "call_expression");

    let err = template
        .apply(original, None, &Bindings::new())
        .err()
        .map(|err| err.to_string());
    assert_eq!(err.as_deref(), Some("template parameter `p` has no bound value"));

    let by_name = Bindings::new().bind_name("p", SyntaxNode::leaf("number", "", "7"));
    let applied = template
        .apply(original, None, &by_name)
        .unwrap_or_else(|err| panic!("apply: {err}"));
    assert_eq!(applied.text(), "bar(7)");
}

#[rstest]
#[case("foo(1, 2)", "bar(...1, ...2)")]
#[case("foo(a)", "bar(...a)")]
#[case("foo()", "bar()")]
fn spread_templates_mark_every_element(
    compiler: Compiler,
    #[case] source: &str,
    #[case] expected: &str,
) {
    let args = variadic("args");
    let rule = RewriteRule::builder()
        .before(compile_pattern(&compiler, vec!["foo(".into(), (&args).into(), ")".into()]))
        .after(compile_template(&compiler, vec!["bar(...".into(), (&args).into(), ")".into()]))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    assert_eq!(rewrite_first_call(&rule, source).as_deref(), Some(expected));
}

#[rstest]
#[case("foo(...a, ...b)", "bar(...a, ...b)")]
#[case("foo(...a)", "bar(...a)")]
#[case("foo()", "bar()")]
fn spread_runs_round_trip_through_rules(
    compiler: Compiler,
    #[case] source: &str,
    #[case] expected: &str,
) {
    let args = variadic("args");
    let rule = RewriteRule::builder()
        .before(compile_pattern(&compiler, vec!["foo(...".into(), (&args).into(), ")".into()]))
        .after(compile_template(&compiler, vec!["bar(...".into(), (&args).into(), ")".into()]))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    assert_eq!(rewrite_first_call(&rule, source).as_deref(), Some(expected));
}

#[test]
fn flattens_nested_blocks() {
    let root = parse("function f() { a(); { b(); c(); } d(); }");
    let body = first(&root, "statement_block");
    assert_eq!(flatten_block(body).text(), "{ a(); b(); c(); d(); }");
}

// =============================================================================
// Rules
// =============================================================================

#[rstest]
fn and_then_rewrites_the_replacement(compiler: Compiler) {
    let chained = rename_call(&compiler, "foo", "bar").and_then(rename_call(&compiler, "bar", "baz"));
    assert_eq!(rewrite_first_call(&chained, "foo(1)").as_deref(), Some("baz(1)"));
    assert_eq!(rewrite_first_call(&chained, "bar(1)"), None);
}

#[rstest]
#[case("b", "c", "a(1)", Some("d(1)"))]
#[case("b", "c", "a()", Some("d()"))]
#[case("b", "c", "b(1)", None)]
#[case("z", "y", "a(1)", Some("b(1)"))]
#[case("b", "z", "a(x)", Some("z(x)"))]
fn and_then_is_associative(
    compiler: Compiler,
    #[case] middle_from: &str,
    #[case] middle_to: &str,
    #[case] source: &str,
    #[case] expected: Option<&str>,
) {
    let first_rule = rename_call(&compiler, "a", "b");
    let middle = rename_call(&compiler, middle_from, middle_to);
    let last = rename_call(&compiler, "c", "d");

    let grouped_left = first_rule
        .clone()
        .and_then(middle.clone())
        .and_then(last.clone());
    let grouped_right = first_rule.and_then(middle.and_then(last));

    let left = rewrite_first_call(&grouped_left, source);
    assert_eq!(left, rewrite_first_call(&grouped_right, source));
    assert_eq!(left.as_deref(), expected);
}

/// Replaces every node it visits and counts the visits.
struct CountingRecipe {
    visits: Arc<AtomicUsize>,
}

impl Recipe for CountingRecipe {
    fn visit(
        &self,
        _node: &SyntaxNode,
        _cursor: Option<&Cursor<'_>>,
    ) -> Result<SyntaxNode, TemplateError> {
        self.visits.fetch_add(1, Ordering::SeqCst);
        Ok(SyntaxNode::leaf("identifier", "", "visited"))
    }
}

#[rstest]
fn or_else_skips_the_alternative_after_a_match(compiler: Compiler) {
    let visits = Arc::new(AtomicUsize::new(0));
    let counting = from_recipe(CountingRecipe {
        visits: Arc::clone(&visits),
    });
    let either = rename_call(&compiler, "foo", "bar").or_else(counting);

    assert_eq!(rewrite_first_call(&either, "foo(1)").as_deref(), Some("bar(1)"));
    assert_eq!(visits.load(Ordering::SeqCst), 0);

    assert_eq!(rewrite_first_call(&either, "qux(1)").as_deref(), Some("visited"));
    assert_eq!(visits.load(Ordering::SeqCst), 1);
}

#[rstest]
fn or_else_tries_the_alternative_on_the_original(compiler: Compiler) {
    let either = rename_call(&compiler, "bar", "baz").or_else(rename_call(&compiler, "foo", "qux"));
    assert_eq!(rewrite_first_call(&either, "foo(1)").as_deref(), Some("qux(1)"));
    assert_eq!(rewrite_first_call(&either, "bar(1)").as_deref(), Some("baz(1)"));
}

#[rstest]
#[case("foo(1)", Some("bar(1)"))]
#[case("qux(2)", Some("bar(2)"))]
#[case("foo(0)", None)]
#[case("foo(skip)", None)]
fn predicates_gate_rules(compiler: Compiler, #[case] source: &str, #[case] expected: Option<&str>) {
    let a = capture("a");
    let guard = a.clone();
    let rule = RewriteRule::builder()
        .before(compile_pattern(&compiler, vec!["foo(".into(), (&a).into(), ")".into()]))
        .before(compile_pattern(&compiler, vec!["qux(".into(), (&a).into(), ")".into()]))
        .after(compile_template(&compiler, vec!["bar(".into(), (&a).into(), ")".into()]))
        .pre_match(|node, _| !node.text().contains("skip"))
        .post_match(move |_, result, _| result.node(&guard).is_some_and(|bound| bound.text() != "0"))
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    assert_eq!(rewrite_first_call(&rule, source).as_deref(), expected);
}

#[rstest]
fn metavariable_text_shares_captures(compiler: Compiler) {
    let mut metavariables = Metavariables::new();
    let before = metavariables
        .parts("foo($$$ARGS)")
        .and_then(|parts| Pattern::compile(&compiler, parts))
        .unwrap_or_else(|err| panic!("pattern: {err}"));
    let after = metavariables
        .parts("bar($$$ARGS)")
        .and_then(|parts| Template::compile(&compiler, parts))
        .unwrap_or_else(|err| panic!("template: {err}"));
    let rule = RewriteRule::builder()
        .before(before)
        .after(after)
        .build()
        .unwrap_or_else(|err| panic!("rule: {err}"));

    assert!(metavariables.get("ARGS").is_some_and(Capture::is_variadic));
    assert_eq!(rewrite_first_call(&rule, "foo(1, 2)").as_deref(), Some("bar(1, 2)"));
}
