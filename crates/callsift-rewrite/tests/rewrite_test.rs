//! Integration tests for the rewrite engine and the formatting rule

use callsift_ast::{FileSet, SyntaxUnit};
use callsift_calls::DiagnosticKind;
use callsift_parser::parse;
use callsift_rewrite::{
    apply, apply_all, ArgTemplate, CallTemplate, CalleeTemplate, FormatCallRule, FormatRuleConfig,
    MatchContext, RewriteOutcome, RewriteRule,
};
use callsift_types::{resolve_with_stdlib, PackageSource};

fn println_rule() -> FormatCallRule {
    FormatCallRule::new(FormatRuleConfig::default()).expect("default rule")
}

/// Parse, check and rewrite one `main` file; returns the rendered output
fn rewrite_with(rules: &[&dyn RewriteRule], source: &str) -> (String, RewriteOutcome) {
    let mut files = FileSet::new();
    let id = files.add("main.go");
    let unit = parse(source, "main.go", id).expect("parse failed");
    let packages = vec![PackageSource::new("main", vec![unit])];
    let info = resolve_with_stdlib(&packages, &mut files).expect("type check failed");
    let mut unit: SyntaxUnit = packages
        .into_iter()
        .next()
        .and_then(|p| p.units.into_iter().next())
        .expect("unit");
    let outcome = apply_all(rules, &mut unit, &info);
    (unit.render(), outcome)
}

fn rewrite(source: &str) -> (String, RewriteOutcome) {
    rewrite_with(&[&println_rule()], source)
}

// === Formatting rule ===

#[test]
fn test_int_and_string_arguments() {
    let source = r#"package main

import "fmt"

func main() {
	x := 1
	s := "hi"
	fmt.Println(x)
	fmt.Println(s)
	fmt.Println(42)
}
"#;
    let (output, outcome) = rewrite(source);
    assert_eq!(outcome.rewritten, 3);
    assert_eq!(
        output,
        r#"package main

import "fmt"

func main() {
	x := 1
	s := "hi"
	fmt.Printf("%d", x)
	fmt.Printf("%s", s)
	fmt.Printf("%d", 42)
}
"#
    );
    assert_eq!(outcome.changes[0].before, "fmt.Println(x)");
    assert_eq!(outcome.changes[0].after, "fmt.Printf(\"%d\", x)");
    assert_eq!(outcome.changes[0].rule, "println-to-printf");
}

#[test]
fn test_unmatched_calls_left_alone() {
    let source = r#"package main

import "fmt"

type Celsius int

type point struct{ x, y int }

func main() {
	var c Celsius
	fmt.Println(c)
	fmt.Println(point{1, 2})
	fmt.Println(nil)
	fmt.Println(1, 2)
	fmt.Println()
	fmt.Print(3)
	xs := []any{1}
	fmt.Println(xs...)
	fmt.Println(2i)
}
"#;
    let (output, outcome) = rewrite(source);
    assert!(outcome.is_unchanged());
    assert!(outcome.changes.is_empty());
    assert_eq!(output, source);
}

#[test]
fn test_aliased_import_keeps_qualifier() {
    let source = r#"package main

import f "fmt"

func main() {
	f.Println(  7 )
	f.Println(true)
	f.Println(2.5)
}
"#;
    let (output, outcome) = rewrite(source);
    assert_eq!(outcome.rewritten, 3);
    assert!(output.contains("f.Printf(\"%d\", 7)"));
    assert!(output.contains("f.Printf(\"%t\", true)"));
    assert!(output.contains("f.Printf(\"%f\", 2.5)"));
    assert!(!output.contains("Println"));
}

#[test]
fn test_local_function_with_same_name_not_rewritten() {
    let source = r#"package main

type printer struct{}

func (p printer) Println(v int) {}

func Println(v int) {}

func main() {
	var fmt printer
	fmt.Println(1)
	Println(2)
}
"#;
    let (output, outcome) = rewrite(source);
    assert!(outcome.is_unchanged());
    assert_eq!(output, source);
}

#[test]
fn test_bytes_outside_calls_preserved() {
    let source = "package main\n\nimport \"fmt\"\n\n// a comment  with   spacing\nfunc main() {\n\n\tn := 3 // trailing\n\tif n > 0 {   fmt.Println(n)   }\n\tfmt.Println(n /* inner */ )\n}\n";
    let (output, outcome) = rewrite(source);
    assert_eq!(outcome.rewritten, 2);
    let expected = "package main\n\nimport \"fmt\"\n\n// a comment  with   spacing\nfunc main() {\n\n\tn := 3 // trailing\n\tif n > 0 {   fmt.Printf(\"%d\", n)   }\n\tfmt.Printf(\"%d\", n)\n}\n";
    assert_eq!(output, expected);
}

#[test]
fn test_argument_text_copied_verbatim() {
    let source = r#"package main

import "fmt"

func size(xs []int) int { return len(xs) }

func main() {
	fmt.Println(size( []int{1,  2} ))
}
"#;
    let (output, _) = rewrite(source);
    assert!(output.contains("fmt.Printf(\"%d\", size( []int{1,  2} ))"));
}

#[test]
fn test_idempotent() {
    let source = r#"package main

import "fmt"

func main() {
	fmt.Println(10)
	fmt.Println("ten")
}
"#;
    let (once, first) = rewrite(source);
    assert_eq!(first.rewritten, 2);
    let (twice, second) = rewrite(&once);
    assert!(second.is_unchanged());
    assert_eq!(once, twice);
}

#[test]
fn test_newline_and_custom_specifiers() {
    let config = FormatRuleConfig {
        newline: true,
        ..FormatRuleConfig::default()
    };
    let rule = FormatCallRule::new(config).expect("rule");
    let source = r#"package main

import "fmt"

func main() {
	fmt.Println(5)
}
"#;
    let (output, outcome) = rewrite_with(&[&rule], source);
    assert_eq!(outcome.rewritten, 1);
    assert!(output.contains(r#"fmt.Printf("%d\n", 5)"#));

    let rules = callsift_rewrite::parse_rules(
        r#"{ "name": "hex", "function": { "package": "fmt", "name": "Println" },
             "replacement": "Printf", "specifiers": { "integer": "%x" } }"#,
    )
    .expect("rules");
    let rule = FormatCallRule::new(rules[0].clone()).expect("rule");
    let (output, outcome) = rewrite_with(&[&rule], &source.replace("5)", "5)\n\tfmt.Println(\"s\")"));
    assert_eq!(outcome.rewritten, 1);
    assert!(output.contains(r#"fmt.Printf("%x", 5)"#));
    assert!(output.contains(r#"fmt.Println("s")"#));
}

#[test]
fn test_other_package_function() {
    let rules = callsift_rewrite::parse_rules(
        r#"{ "name": "sprint", "function": { "package": "fmt", "name": "Sprint" },
             "replacement": "Sprintf" }"#,
    )
    .expect("rules");
    let rule = FormatCallRule::new(rules[0].clone()).expect("rule");
    let source = r#"package main

import "fmt"

func main() {
	s := fmt.Sprint(3)
	fmt.Println(s)
}
"#;
    let (output, outcome) = rewrite_with(&[&rule], source);
    assert_eq!(outcome.rewritten, 1);
    assert!(output.contains(r#"s := fmt.Sprintf("%d", 3)"#));
    assert!(output.contains("fmt.Println(s)"));
}

// === Engine ===

/// Renames calls to a local function, keeping every argument
struct Rename {
    name: &'static str,
    from: &'static str,
    to: &'static str,
}

impl RewriteRule for Rename {
    fn name(&self) -> &str {
        self.name
    }

    fn rewrite(&self, cx: &MatchContext<'_>) -> Option<CallTemplate> {
        let callee = cx.callee()?.as_ident()?;
        (callee.name == self.from).then(|| CallTemplate {
            callee: CalleeTemplate::Ident(self.to.to_string()),
            args: (0..cx.args().len()).map(ArgTemplate::Original).collect(),
        })
    }
}

#[test]
fn test_conflicting_rules_reported() {
    let source = r#"package main

func g(a, b int) {}

func h(a, b int) {}

func main() {
	g(1, 2)
}
"#;
    let first = Rename {
        name: "first",
        from: "g",
        to: "h",
    };
    let second = Rename {
        name: "second",
        from: "g",
        to: "h",
    };
    let (output, outcome) = rewrite_with(&[&first, &second], source);
    assert!(outcome.is_unchanged());
    assert_eq!(output, source);
    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.code, "W-REWRITE-001");
    match &diagnostic.kind {
        DiagnosticKind::RewriteConflict { call, rules } => {
            assert_eq!(call, "g(1, 2)");
            assert_eq!(rules, &vec!["first".to_string(), "second".to_string()]);
        }
        other => panic!("unexpected diagnostic {:?}", other),
    }
}

#[test]
fn test_nested_calls_rewritten_inside_out() {
    let source = r#"package main

func g(a int) int { return a }

func h(a int) int { return a }

func main() {
	_ = g(g(1) + g( 2 ))
}
"#;
    let rule = Rename {
        name: "rename",
        from: "g",
        to: "h",
    };
    let (output, outcome) = rewrite_with(&[&rule], source);
    assert_eq!(outcome.rewritten, 3);
    assert!(output.contains("_ = h(h(1) + h(2))"));
}

#[test]
fn test_single_rule_apply() {
    let source = r#"package main

import "fmt"

func main() {
	fmt.Println('x')
}
"#;
    let mut files = FileSet::new();
    let id = files.add("main.go");
    let unit = parse(source, "main.go", id).expect("parse failed");
    let mut packages = vec![PackageSource::new("main", vec![unit])];
    let info = resolve_with_stdlib(&packages, &mut files).expect("type check failed");
    let unit = &mut packages[0].units[0];
    let before = unit.next_node;
    let outcome = apply(&println_rule(), unit, &info);
    assert_eq!(outcome.rewritten, 1);
    // call, selector, member and the format literal
    assert_eq!(unit.next_node, before + 4);
    assert!(unit.render().contains("fmt.Printf(\"%d\", 'x')"));
}

#[test]
fn test_dot_import_allocates_only_used_ids() {
    let source = r#"package main

import . "fmt"

func main() {
	Println(1)
}
"#;
    let mut files = FileSet::new();
    let id = files.add("main.go");
    let unit = parse(source, "main.go", id).expect("parse failed");
    let mut packages = vec![PackageSource::new("main", vec![unit])];
    let info = resolve_with_stdlib(&packages, &mut files).expect("type check failed");
    let unit = &mut packages[0].units[0];
    let before = unit.next_node;
    let outcome = apply(&println_rule(), unit, &info);
    assert_eq!(outcome.rewritten, 1);
    // call, callee name and the format literal
    assert_eq!(unit.next_node, before + 3);
    assert!(unit.render().contains("\tPrintf(\"%d\", 1)\n"));
}

#[test]
fn test_comments_inside_rewritten_call_dropped() {
    let source = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tn := 1\n\tfmt.Println(\n\t\tn, // first\n\t)\n\t// kept\n}\n";
    let (output, outcome) = rewrite(source);
    assert_eq!(outcome.rewritten, 1);
    assert_eq!(
        output,
        "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tn := 1\n\tfmt.Printf(\"%d\", n)\n\t// kept\n}\n"
    );
}
