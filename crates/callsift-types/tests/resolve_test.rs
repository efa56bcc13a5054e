//! Integration tests for package resolution and the Type Oracle

use callsift_ast::visit::{walk_expr, Visitor};
use callsift_ast::{Expr, ExprKind, FileSet, SyntaxUnit};
use callsift_parser::parse;
use callsift_types::{
    resolve, resolve_with_stdlib, BasicKind, CheckError, NoImporter, ObjectClass, ObjectKind,
    PackageSource, SelectionKind, Type, TypeCheckError, TypeInfo,
};

/// Parse `(import path, source)` pairs, grouping files by import path
fn load(files: &mut FileSet, sources: &[(&str, &str)]) -> Vec<PackageSource> {
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
    packages
}

fn check(sources: &[(&str, &str)]) -> Result<(Vec<PackageSource>, TypeInfo), TypeCheckError> {
    let mut files = FileSet::new();
    let packages = load(&mut files, sources);
    let info = resolve_with_stdlib(&packages, &mut files)?;
    Ok((packages, info))
}

fn check_ok(source: &str) -> (Vec<PackageSource>, TypeInfo) {
    let result = check(&[("main", source)]);
    assert!(result.is_ok(), "Expected check to succeed, got: {:?}", result.as_ref().err());
    result.unwrap()
}

fn check_errors(sources: &[(&str, &str)]) -> Vec<CheckError> {
    match check(sources) {
        Err(TypeCheckError::Check(errors)) => errors,
        other => panic!("expected type errors, got {:?}", other.map(|_| ())),
    }
}

struct Calls<'a> {
    calls: Vec<&'a Expr>,
}

impl<'a> Visitor<'a> for Calls<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if expr.is_call() {
            self.calls.push(expr);
        }
        walk_expr(self, expr);
    }
}

/// Every call expression of a unit, outermost first
fn calls(unit: &SyntaxUnit) -> Vec<&Expr> {
    let mut visitor = Calls { calls: Vec::new() };
    visitor.visit_file(&unit.file);
    visitor.calls
}

fn callee(call: &Expr) -> &Expr {
    match &call.kind {
        ExprKind::Call { callee, .. } => callee,
        _ => panic!("not a call"),
    }
}

fn first_arg(call: &Expr) -> &Expr {
    match &call.kind {
        ExprKind::Call { args, .. } => &args[0],
        _ => panic!("not a call"),
    }
}

// === Identifier resolution ===

#[test]
fn test_package_function_resolves() {
    let (packages, info) = check_ok(
        r#"package main

import "fmt"

func main() {
	fmt.Println("hi")
}
"#,
    );
    let unit = &packages[0].units[0];
    let call = calls(unit)[0];
    let ExprKind::Selector { operand, member } = &callee(call).kind else {
        panic!("expected selector");
    };
    assert_eq!(info.object_kind(operand.as_ident().unwrap()), ObjectClass::Package);
    assert_eq!(info.object_kind(member), ObjectClass::Function);
    let obj = info.object_of(member).unwrap();
    assert_eq!(info.package_path_of(obj), Some("fmt"));
    // Package-qualified identifiers are uses, not selections
    assert!(info.selection(callee(call)).is_none());
}

#[test]
fn test_import_alias_and_shadowing() {
    let (packages, info) = check_ok(
        r#"package main

import f "fmt"

type Printer struct{}

func (p Printer) Println(s string) {}

func main() {
	f.Println("aliased")
	{
		f := Printer{}
		f.Println("shadowed")
	}
}
"#,
    );
    let unit = &packages[0].units[0];
    let found = calls(unit);
    let ExprKind::Selector { operand, .. } = &callee(found[0]).kind else {
        panic!("expected selector");
    };
    assert_eq!(info.object_kind(operand.as_ident().unwrap()), ObjectClass::Package);

    let ExprKind::Selector { operand, .. } = &callee(found[1]).kind else {
        panic!("expected selector");
    };
    assert_eq!(info.object_kind(operand.as_ident().unwrap()), ObjectClass::Variable);
    let selection = info.selection(callee(found[1])).unwrap();
    assert_eq!(selection.kind, SelectionKind::MethodVal);
}

#[test]
fn test_builtins_and_conversions() {
    let (packages, info) = check_ok(
        r#"package main

func main() {
	xs := make([]int, 0)
	xs = append(xs, len(xs))
	b := []byte("x")
	_ = b
}
"#,
    );
    let unit = &packages[0].units[0];
    let found = calls(unit);
    assert_eq!(
        info.object_kind(callee(found[0]).as_ident().unwrap()),
        ObjectClass::BuiltIn
    );
    let slice = info.type_of(found[0]).unwrap();
    assert_eq!(info.display_type(slice), "[]int");
    let conversion = found.iter().find(|c| matches!(callee(c).kind, ExprKind::Type(_))).unwrap();
    assert_eq!(info.display_type(info.type_of(conversion).unwrap()), "[]uint8");
}

// === Selectors and embedding ===

#[test]
fn test_promoted_method_through_pointer() {
    let (packages, info) = check_ok(
        r#"package main

type Inner struct{ n int }

func (i *Inner) Bump() { i.n++ }

type Middle struct{ *Inner }

type Outer struct {
	Middle
}

func main() {
	o := Outer{}
	o.Bump()
}
"#,
    );
    let unit = &packages[0].units[0];
    let call = calls(unit)[0];
    let selection = info.selection(callee(call)).unwrap();
    assert_eq!(selection.kind, SelectionKind::MethodVal);
    assert_eq!(selection.depth(), 2);
    assert!(selection.indirect);
    let names: Vec<&str> = selection
        .path
        .iter()
        .map(|f| info.object(*f).name.as_str())
        .collect();
    assert_eq!(names, ["Middle", "Inner"]);
    assert_eq!(info.display_type(selection.recv), "main.Outer");
}

#[test]
fn test_ambiguous_selector_is_not_fatal() {
    let (packages, info) = check_ok(
        r#"package main

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
}
"#,
    );
    let unit = &packages[0].units[0];
    let call = calls(unit)[0];
    assert!(info.selection(callee(call)).is_none());
    assert!(info.is_ambiguous(callee(call)));
}

#[test]
fn test_method_expression() {
    let (packages, info) = check_ok(
        r#"package main

type T struct{}

func (t *T) M(n int) int { return n }

func main() {
	t := &T{}
	(*T).M(t, 1)
}
"#,
    );
    let unit = &packages[0].units[0];
    let call = calls(unit)[0];
    let selection = info.selection(callee(call)).unwrap();
    assert_eq!(selection.kind, SelectionKind::MethodExpr);
    let sig = info.type_of(callee(call)).unwrap();
    assert_eq!(info.display_type(sig), "func(*main.T, int) int");
}

#[test]
fn test_interface_method_selection() {
    let (packages, info) = check_ok(
        r#"package main

type Shape interface {
	Area() float64
}

func total(s Shape) float64 {
	return s.Area()
}
"#,
    );
    let unit = &packages[0].units[0];
    let call = calls(unit)[0];
    let selection = info.selection(callee(call)).unwrap();
    assert!(matches!(
        info.object(selection.object).kind,
        ObjectKind::Method { interface: true, .. }
    ));
    assert!(info.is_interface(selection.recv));
}

// === Expression types ===

#[test]
fn test_untyped_constants_and_defaults() {
    let (packages, info) = check_ok(
        r#"package main

import "fmt"

const greeting = "hi"

func main() {
	x := 42
	fmt.Println(1.5)
	fmt.Println(x)
	fmt.Println(greeting)
	fmt.Println(x > 3)
}
"#,
    );
    let unit = &packages[0].units[0];
    let kinds: Vec<BasicKind> = calls(unit)
        .iter()
        .map(|c| info.basic(info.type_of(first_arg(c)).unwrap()).unwrap())
        .collect();
    assert_eq!(
        kinds,
        [
            BasicKind::UntypedFloat,
            BasicKind::Int,
            BasicKind::UntypedString,
            BasicKind::UntypedBool,
        ]
    );
}

#[test]
fn test_forward_references_across_files() {
    let (packages, info) = check(&[
        (
            "main",
            r#"package main

import "fmt"

var label = describe(3)

func main() {
	fmt.Println(label)
}
"#,
        ),
        (
            "main",
            r#"package main

import "strconv"

func describe(n int) string {
	return strconv.Itoa(n)
}
"#,
        ),
    ])
    .unwrap();
    let unit = &packages[0].units[0];
    let println = calls(unit)
        .into_iter()
        .find(|c| matches!(callee(c).kind, ExprKind::Selector { .. }))
        .unwrap();
    let ty = info.type_of(first_arg(println)).unwrap();
    assert_eq!(info.basic(ty), Some(BasicKind::String));
}

#[test]
fn test_multi_value_and_comma_ok() {
    let (packages, info) = check_ok(
        r#"package main

import (
	"fmt"
	"strconv"
)

func main() {
	n, err := strconv.Atoi("4")
	m := map[string]bool{}
	v, ok := m["k"]
	fmt.Println(n)
	fmt.Println(err)
	fmt.Println(v)
	fmt.Println(ok)
}
"#,
    );
    let unit = &packages[0].units[0];
    let printed: Vec<String> = calls(unit)
        .iter()
        .filter(|c| {
            matches!(&callee(c).kind, ExprKind::Selector { member, .. } if member.name == "Println")
        })
        .map(|c| info.display_type(info.type_of(first_arg(c)).unwrap()))
        .collect();
    assert_eq!(printed, ["int", "error", "bool", "bool"]);
}

#[test]
fn test_type_switch_binding_per_clause() {
    let (packages, info) = check_ok(
        r#"package main

import "fmt"

func show(x any) {
	switch v := x.(type) {
	case int:
		fmt.Println(v)
	case string, bool:
		fmt.Println(v)
	}
}
"#,
    );
    let unit = &packages[0].units[0];
    let found = calls(unit);
    let first = info.type_of(first_arg(found[0])).unwrap();
    assert_eq!(info.basic(first), Some(BasicKind::Int));
    let second = info.type_of(first_arg(found[1])).unwrap();
    assert!(matches!(info.ty(second), Type::Interface { .. }));
}

#[test]
fn test_range_and_closures() {
    let (packages, info) = check_ok(
        r#"package main

import "fmt"

func main() {
	names := []string{"a", "b"}
	for i, name := range names {
		func() {
			fmt.Println(name)
		}()
		_ = i
	}
}
"#,
    );
    let unit = &packages[0].units[0];
    let println = calls(unit)
        .into_iter()
        .find(|c| matches!(callee(c).kind, ExprKind::Selector { .. }))
        .unwrap();
    let ty = info.type_of(first_arg(println)).unwrap();
    assert_eq!(info.basic(ty), Some(BasicKind::String));
}

// === Errors ===

#[test]
fn test_undefined_name() {
    let errors = check_errors(&[("main", "package main\n\nfunc main() {\n\tmissing()\n}\n")]);
    assert!(matches!(&errors[0], CheckError::UndefinedName { name, .. } if name == "missing"));
}

#[test]
fn test_missing_member_is_not_fatal() {
    let (packages, info) = check_ok(
        r#"package main

type T struct{}

func main() {
	var t T
	t.Nope()
}
"#,
    );
    let call = calls(&packages[0].units[0])[0];
    assert!(info.selection(callee(call)).is_none());
    assert!(!info.is_ambiguous(callee(call)));
}

#[test]
fn test_duplicate_declarations() {
    let errors = check_errors(&[
        ("main", "package main\n\nfunc helper() {}\n"),
        ("main", "package main\n\nfunc helper() {}\n"),
    ]);
    assert!(matches!(&errors[0], CheckError::DuplicateDecl { name, .. } if name == "helper"));
}

#[test]
fn test_invalid_receiver_and_duplicate_method() {
    let errors = check_errors(&[(
        "main",
        r#"package main

type T struct{}

func (t T) M() {}
func (t *T) M() {}
func (x Missing) N() {}
"#,
    )]);
    assert!(errors
        .iter()
        .any(|e| matches!(e, CheckError::DuplicateMethod { name, .. } if name == "M")));
    assert!(errors
        .iter()
        .any(|e| matches!(e, CheckError::InvalidReceiver { .. })));
}

#[test]
fn test_package_clause_mismatch() {
    let errors = check_errors(&[
        ("main", "package main\n"),
        ("main", "package other\n"),
    ]);
    assert!(matches!(errors[0], CheckError::PackageMismatch { .. }));
}

#[test]
fn test_unresolved_import() {
    let mut files = FileSet::new();
    let packages = load(
        &mut files,
        &[("main", "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println(1) }\n")],
    );
    let err = resolve(&packages, &mut NoImporter, &mut files).unwrap_err();
    assert!(matches!(err, TypeCheckError::UnresolvedImport { ref path, .. } if path == "fmt"));
}

#[test]
fn test_import_cycle() {
    let result = check(&[
        ("a", "package a\n\nimport \"b\"\n\nfunc A() { b.B() }\n"),
        ("b", "package b\n\nimport \"a\"\n\nfunc B() { a.A() }\n"),
    ]);
    let Err(TypeCheckError::ImportCycle { cycle }) = result else {
        panic!("expected an import cycle");
    };
    assert_eq!(cycle, ["a", "b", "a"]);
}

#[test]
fn test_analyzed_packages_import_each_other() {
    let (packages, info) = check(&[
        (
            "app",
            r#"package main

import "example/shapes"

func main() {
	s := shapes.Square{Side: 2}
	s.Area()
}
"#,
        ),
        (
            "example/shapes",
            r#"package shapes

type Square struct{ Side int }

func (s Square) Area() int { return s.Side * s.Side }
"#,
        ),
    ])
    .unwrap();
    let call = calls(&packages[0].units[0])[0];
    let selection = info.selection(callee(call)).unwrap();
    assert_eq!(info.package_path_of(selection.object), Some("example/shapes"));
    let pkg = info.package_by_path("example/shapes").unwrap();
    assert!(info.package(pkg).analyzed);
    assert_eq!(info.package(pkg).name, "shapes");
}
