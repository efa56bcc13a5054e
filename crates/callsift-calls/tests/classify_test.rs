//! Integration tests for selector chains and call classification

use callsift_ast::{FileSet, SyntaxUnit};
use callsift_calls::{
    classify_unit, CallKind, CallSite, Classification, DiagnosticKind, FuncRef, MemberKind,
    RootKind, UnknownReason,
};
use callsift_parser::parse;
use callsift_types::{resolve_with_stdlib, PackageSource, TypeInfo};

fn analyze(sources: &[(&str, &str)]) -> (Vec<PackageSource>, TypeInfo) {
    let mut files = FileSet::new();
    let mut packages: Vec<PackageSource> = Vec::new();
    for (i, (path, source)) in sources.iter().enumerate() {
        let name = format!("file{}.go", i);
        let id = files.add(name.clone());
        let unit = parse(source, &name, id).expect("parse failed");
        match packages.iter_mut().find(|p| p.path == *path) {
            Some(package) => package.units.push(unit),
            None => packages.push(PackageSource::new(*path, vec![unit])),
        }
    }
    let info = resolve_with_stdlib(&packages, &mut files).expect("type check failed");
    (packages, info)
}

fn classify_main(source: &str) -> (SyntaxUnit, Classification, TypeInfo) {
    let (mut packages, info) = analyze(&[("main", source)]);
    let unit = packages.remove(0).units.remove(0);
    let classification = classify_unit(&unit, &info);
    (unit, classification, info)
}

/// The site whose source text is exactly `text`
fn site<'a>(unit: &SyntaxUnit, classification: &'a Classification, text: &str) -> &'a CallSite {
    classification
        .sites
        .iter()
        .find(|s| unit.snippet(s.span) == text)
        .unwrap_or_else(|| panic!("no call `{}`", text))
}

// === Taxonomy ===

#[test]
fn test_builtin_local_and_promoted_method() {
    let source = r#"
package main

type Base struct{}

func (b *Base) Method() int { return 1 }

type Derived struct {
	*Base
}

func g() {}

func f(instance Derived) {
	var xs []int
	xs = append(xs, 1)
	g()
	instance.Method()
}
"#;
    let (unit, classification, _) = classify_main(source);
    assert_eq!(site(&unit, &classification, "append(xs, 1)").kind, CallKind::BuiltIn);
    assert_eq!(site(&unit, &classification, "g()").kind, CallKind::LocalFunction);

    let method = site(&unit, &classification, "instance.Method()");
    assert_eq!(method.kind, CallKind::InstanceMethod);
    let chain = method.chain.as_ref().expect("chain");
    assert_eq!(chain.root.kind, RootKind::Variable);
    assert_eq!(chain.promoted_hops().count(), 1);
    assert_eq!(chain.hops[0].name, "Base");
    assert_eq!(chain.hops[0].declaring_type, "main.Derived");
    let terminal = chain.terminal.as_ref().expect("terminal");
    assert_eq!(terminal.name, "Method");
    assert_eq!(terminal.member, MemberKind::Method);
    assert_eq!(terminal.declaring_type, "main.Base");
    assert_eq!(chain.display(), "instance.[Base].Method");

    assert!(classification.diagnostics.is_empty());
}

#[test]
fn test_embedding_depth() {
    let source = r#"
package main

type D struct{}

func (D) M() {}

type C struct{ D }
type B struct{ C }
type A struct{ B }

func main() {
	var d D
	var c C
	var a A
	d.M()
	c.M()
	a.M()
	a.B.M()
}
"#;
    let (unit, classification, _) = classify_main(source);
    for (text, depth) in [("d.M()", 0), ("c.M()", 1), ("a.M()", 3)] {
        let site = site(&unit, &classification, text);
        assert_eq!(site.kind, CallKind::InstanceMethod, "{}", text);
        let chain = site.chain.as_ref().expect("chain");
        assert_eq!(chain.hops.len(), depth, "{}", text);
        assert!(chain.hops.iter().all(|h| h.is_promoted), "{}", text);
        let terminal = chain.terminal.as_ref().expect("terminal");
        assert_eq!(terminal.name, "M");
        assert_eq!(terminal.declaring_type, "main.D");
    }

    // An explicitly named field is a hop but not a promoted one
    let explicit = site(&unit, &classification, "a.B.M()");
    let chain = explicit.chain.as_ref().expect("chain");
    let names: Vec<(&str, bool)> = chain
        .hops
        .iter()
        .map(|h| (h.name.as_str(), h.is_promoted))
        .collect();
    assert_eq!(names, vec![("B", false), ("C", true), ("D", true)]);
    assert_eq!(chain.hops[0].declaring_type, "main.A");
    assert_eq!(chain.hops[0].member, MemberKind::Field);
}

#[test]
fn test_package_function_and_alias() {
    let source = r#"
package main

import (
	"fmt"
	f "strings"
)

func main() {
	fmt.Println(f.ToUpper("x"))
}
"#;
    let (unit, classification, info) = classify_main(source);
    let println = site(&unit, &classification, r#"fmt.Println(f.ToUpper("x"))"#);
    assert_eq!(println.kind, CallKind::PackageFunction);
    let chain = println.chain.as_ref().expect("chain");
    assert_eq!(chain.root.kind, RootKind::Package);
    assert!(chain.hops.is_empty());
    assert_eq!(println.target(&info), Some(FuncRef::function("fmt", "Println")));

    let upper = site(&unit, &classification, r#"f.ToUpper("x")"#);
    assert_eq!(upper.kind, CallKind::PackageFunction);
    assert_eq!(upper.chain.as_ref().map(|c| c.root.name.as_str()), Some("f"));
    assert_eq!(upper.target(&info), Some(FuncRef::function("strings", "ToUpper")));

    // Nested calls are classified too, outer first
    assert_eq!(classification.sites.len(), 2);
    assert_eq!(classification.sites[0].id, println.id);
}

#[test]
fn test_package_shadowed_by_local() {
    let source = r#"
package main

import "fmt"

type Printer struct{}

func (p Printer) Println(v int) {}

func main() {
	fmt.Println("real")
	{
		fmt := Printer{}
		fmt.Println(1)
	}
}
"#;
    let (unit, classification, _) = classify_main(source);
    let real = site(&unit, &classification, r#"fmt.Println("real")"#);
    assert_eq!(real.kind, CallKind::PackageFunction);
    let shadowed = site(&unit, &classification, "fmt.Println(1)");
    assert_eq!(shadowed.kind, CallKind::InstanceMethod);
    assert_eq!(
        shadowed.chain.as_ref().map(|c| c.root.kind),
        Some(RootKind::Variable)
    );
}

#[test]
fn test_package_variable_method_is_package_call() {
    let source = r#"
package main

import "os"

func main() {
	os.Stdout.WriteString("hi")
	os.Exit(0)
}
"#;
    let (unit, classification, info) = classify_main(source);
    let write = site(&unit, &classification, r#"os.Stdout.WriteString("hi")"#);
    assert_eq!(write.kind, CallKind::PackageFunction);
    let chain = write.chain.as_ref().expect("chain");
    assert_eq!(chain.root.kind, RootKind::Package);
    assert_eq!(chain.hops.len(), 1);
    assert_eq!(chain.hops[0].member, MemberKind::Variable);
    assert_eq!(chain.hops[0].declaring_type, "os");
    assert_eq!(
        write.target(&info),
        Some(FuncRef::method("os", "File", true, "WriteString"))
    );
    assert_eq!(site(&unit, &classification, "os.Exit(0)").kind, CallKind::PackageFunction);
}

#[test]
fn test_builtin_names_never_local() {
    let source = r#"
package main

func main() {
	m := make(map[string]int)
	delete(m, "a")
	println(len(m), cap([]int{}))
	_ = new(int)
}
"#;
    let (_, classification, _) = classify_main(source);
    assert_eq!(classification.sites.len(), 6);
    assert!(classification.sites.iter().all(|s| s.kind == CallKind::BuiltIn));
    assert!(classification.sites.iter().all(|s| s.chain.is_none()));
}

// === Unknown calls ===

#[test]
fn test_interface_dispatch_is_unknown() {
    let source = r#"
package main

type Shape interface {
	Area() float64
}

type Square struct{ side float64 }

func (s Square) Area() float64 { return s.side * s.side }

func total(s Shape) float64 {
	return s.Area()
}
"#;
    let (unit, classification, info) = classify_main(source);
    let area = site(&unit, &classification, "s.Area()");
    assert_eq!(area.kind, CallKind::Unknown);
    assert_eq!(area.reason, Some(UnknownReason::InterfaceDispatch));
    assert_eq!(area.target(&info), None);

    assert_eq!(classification.diagnostics.len(), 1);
    let diagnostic = &classification.diagnostics[0];
    assert_eq!(diagnostic.code, "W-RESOLVE-001");
    assert!(matches!(
        &diagnostic.kind,
        DiagnosticKind::UnresolvedReference { name, .. } if name == "s.Area"
    ));
}

#[test]
fn test_conversions_func_values_and_literals() {
    let source = r#"
package main

type Celsius float64

type Handler struct {
	fn func(int) int
}

func main() {
	c := Celsius(1.5)
	b := []byte("x")
	f := func(x int) int { return x }
	f(1)
	h := Handler{fn: f}
	h.fn(2)
	defer func() {}()
	_, _ = c, b
}
"#;
    let (unit, classification, _) = classify_main(source);
    let reason = |text: &str| site(&unit, &classification, text).reason;
    assert_eq!(reason("Celsius(1.5)"), Some(UnknownReason::Conversion));
    assert_eq!(reason(r#"[]byte("x")"#), Some(UnknownReason::Conversion));
    assert_eq!(reason("f(1)"), Some(UnknownReason::FuncValue));
    assert_eq!(reason("h.fn(2)"), Some(UnknownReason::FuncValue));
    assert_eq!(reason("func() {}()"), Some(UnknownReason::FuncLiteral));

    // Conversions and literals are not unresolved references
    assert_eq!(classification.diagnostics.len(), 2);
}

#[test]
fn test_ambiguous_selector_is_incomplete() {
    let source = r#"
package main

type A struct{}

func (A) Name() string { return "a" }

type B struct{}

func (B) Name() string { return "b" }

type C struct {
	A
	B
}

func main() {
	var c C
	c.Name()
	c.A.Name()
}
"#;
    let (unit, classification, _) = classify_main(source);
    let ambiguous = site(&unit, &classification, "c.Name()");
    assert_eq!(ambiguous.reason, Some(UnknownReason::IncompleteChain));
    let chain = ambiguous.chain.as_ref().expect("chain");
    assert!(chain.incomplete);
    assert!(chain.terminal.is_none());
    assert!(chain.truncated_at.as_ref().is_some_and(|t| t.ambiguous));

    assert_eq!(
        site(&unit, &classification, "c.A.Name()").kind,
        CallKind::InstanceMethod
    );
    assert_eq!(classification.diagnostics.len(), 1);
    assert_eq!(classification.diagnostics[0].code, "W-RESOLVE-002");
}

#[test]
fn test_missing_member_truncates_chain() {
    let source = r#"
package main

type T struct{ inner T2 }
type T2 struct{}

func main() {
	var t T
	t.inner.Missing()
}
"#;
    let (unit, classification, _) = classify_main(source);
    let call = site(&unit, &classification, "t.inner.Missing()");
    assert_eq!(call.kind, CallKind::Unknown);
    let chain = call.chain.as_ref().expect("chain");
    assert!(chain.incomplete);
    assert_eq!(chain.hops.len(), 1);
    assert_eq!(chain.hops[0].name, "inner");
    assert_eq!(chain.display(), "t.inner.?");
    assert_eq!(classification.diagnostics[0].code, "W-RESOLVE-001");
}

// === Chains and attribution ===

#[test]
fn test_method_expression_and_expression_root() {
    let source = r#"
package main

type T struct{}

func (t T) M() int { return 0 }

func make1() T { return T{} }

func main() {
	T.M(T{})
	make1().M()
}
"#;
    let (unit, classification, info) = classify_main(source);
    let expr = site(&unit, &classification, "T.M(T{})");
    assert_eq!(expr.kind, CallKind::InstanceMethod);
    assert_eq!(expr.chain.as_ref().map(|c| c.root.kind), Some(RootKind::TypeName));
    assert_eq!(expr.target(&info), Some(FuncRef::method("main", "T", false, "M")));

    let result = site(&unit, &classification, "make1().M()");
    assert_eq!(result.kind, CallKind::InstanceMethod);
    let chain = result.chain.as_ref().expect("chain");
    assert_eq!(chain.root.kind, RootKind::Expression);
    assert!(chain.root.name.is_empty());
    assert_eq!(site(&unit, &classification, "make1()").kind, CallKind::LocalFunction);
}

#[test]
fn test_enclosing_declaration() {
    let source = r#"
package main

var table = build()

func build() []int { return nil }

type S struct{}

func (s *S) run() {
	go func() {
		helper()
	}()
}

func helper() {}
"#;
    let (unit, classification, _) = classify_main(source);
    assert_eq!(site(&unit, &classification, "build()").enclosing, None);
    assert_eq!(
        site(&unit, &classification, "helper()").enclosing,
        Some(FuncRef::method("main", "S", true, "run"))
    );
    let literal = classification
        .sites
        .iter()
        .find(|s| s.reason == Some(UnknownReason::FuncLiteral))
        .expect("literal call");
    assert_eq!(literal.enclosing, Some(FuncRef::method("main", "S", true, "run")));
}

#[test]
fn test_cross_package_instance_method() {
    let (packages, info) = analyze(&[
        (
            "example.com/shapes",
            r#"
package shapes

type Circle struct{ R float64 }

func (c Circle) Area() float64 { return 3 * c.R * c.R }

func Unit() Circle { return Circle{R: 1} }
"#,
        ),
        (
            "main",
            r#"
package main

import "example.com/shapes"

func main() {
	c := shapes.Unit()
	c.Area()
}
"#,
        ),
    ]);
    let unit = &packages[1].units[0];
    let classification = classify_unit(unit, &info);
    let unit_call = site(unit, &classification, "shapes.Unit()");
    assert_eq!(unit_call.kind, CallKind::PackageFunction);
    assert_eq!(
        unit_call.target(&info),
        Some(FuncRef::function("example.com/shapes", "Unit"))
    );
    let area = site(unit, &classification, "c.Area()");
    assert_eq!(area.kind, CallKind::InstanceMethod);
    assert_eq!(
        area.chain.as_ref().and_then(|c| c.terminal.as_ref()).map(|t| t.declaring_type.as_str()),
        Some("shapes.Circle")
    );
}

#[test]
fn test_package_rooted_chains() {
    let (packages, info) = analyze(&[
        (
            "example.com/shapes",
            r#"
package shapes

type Circle struct{ R float64 }

func (c Circle) Area() float64 { return 3 * c.R * c.R }

type Meters float64

var Default Circle

var Scale func(float64) float64
"#,
        ),
        (
            "main",
            r#"
package main

import "example.com/shapes"

func main() {
	shapes.Default.Area()
	shapes.Scale(2)
	_ = shapes.Meters(3)
}
"#,
        ),
    ]);
    let unit = &packages[1].units[0];
    let classification = classify_unit(unit, &info);

    let area = site(unit, &classification, "shapes.Default.Area()");
    assert_eq!(area.kind, CallKind::PackageFunction);
    assert_eq!(
        area.target(&info),
        Some(FuncRef::method("example.com/shapes", "Circle", false, "Area"))
    );

    let scale = site(unit, &classification, "shapes.Scale(2)");
    assert_eq!(scale.kind, CallKind::PackageFunction);
    assert_eq!(scale.chain.as_ref().map(|c| c.root.kind), Some(RootKind::Package));
    assert_eq!(scale.target(&info), None);

    let meters = site(unit, &classification, "shapes.Meters(3)");
    assert_eq!(meters.reason, Some(UnknownReason::Conversion));
    assert!(classification.diagnostics.is_empty());
}
