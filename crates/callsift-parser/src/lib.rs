//! callsift parser - recursive descent parser for the Go subset
//!
//! Produces a [`SyntaxUnit`] whose spans are exact byte ranges of the
//! source, so the serializer can copy untouched text verbatim. Every
//! expression, identifier and type node gets a [`NodeId`] unique within the
//! unit's file.

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use callsift_ast::{FileId, SyntaxUnit};
use callsift_lexer::tokenize;

/// Parse one source file
pub fn parse(source: &str, filename: &str, file_id: FileId) -> Result<SyntaxUnit, SyntaxError> {
    let tokens = tokenize(source);
    let mut parser = Parser::new(source, tokens, file_id);
    let file = parser.parse_file()?;
    Ok(SyntaxUnit {
        name: filename.to_string(),
        file_id,
        source: source.to_string(),
        file,
        next_node: parser.node_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsift_ast::*;

    fn parse_ok(source: &str) -> SyntaxUnit {
        let result = parse(source, "test.go", FileId(0));
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
        result.unwrap()
    }

    fn body_stmts(unit: &SyntaxUnit, func: &str) -> Vec<Stmt> {
        unit.file
            .funcs()
            .find(|f| f.name.name == func)
            .and_then(|f| f.body.clone())
            .map(|b| b.stmts)
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_hello_world() {
        let unit = parse_ok(
            r#"package main

import "fmt"

func main() {
	fmt.Println("Hello, world!")
}
"#,
        );
        assert_eq!(unit.package_name(), "main");
        assert_eq!(unit.file.imports[0].path, "fmt");
        assert_eq!(unit.file.funcs().count(), 1);
    }

    #[test]
    fn test_parse_import_forms() {
        let unit = parse_ok(
            r#"package main

import (
	"fmt"
	str "strings"
	. "errors"
	_ "os"
)
"#,
        );
        let imports = &unit.file.imports;
        assert_eq!(imports.len(), 4);
        assert!(imports[0].alias.is_none());
        assert_eq!(imports[1].alias.as_ref().unwrap().name, "str");
        assert_eq!(imports[2].alias.as_ref().unwrap().name, ".");
        assert_eq!(imports[3].alias.as_ref().unwrap().name, "_");
        assert_eq!(imports[1].default_name(), "strings");
    }

    #[test]
    fn test_parse_struct_with_embedding() {
        let unit = parse_ok(
            r#"package main

type Outer struct {
	Inner
	*example.Other
	a, b int
	name string `json:"name"`
}
"#,
        );
        let Decl::Gen(GenDecl::Type(specs)) = &unit.file.decls[0] else {
            panic!("expected type decl");
        };
        let TypeExprKind::Struct(st) = &specs[0].ty.kind else {
            panic!("expected struct");
        };
        assert_eq!(st.fields.len(), 4);
        assert_eq!(st.fields[0].embedded_name().unwrap().name, "Inner");
        assert_eq!(st.fields[1].embedded_name().unwrap().name, "Other");
        assert_eq!(st.fields[2].names.len(), 2);
        assert_eq!(st.fields[3].tag.as_deref(), Some("`json:\"name\"`"));
    }

    #[test]
    fn test_parse_methods_and_receivers() {
        let unit = parse_ok(
            r#"package main

func (m MyStruct) Method1() int { return 1 }
func (m *MyStruct) Method2(a, b int, rest ...string) (int, error) { return 0, nil }
"#,
        );
        let funcs: Vec<_> = unit.file.funcs().collect();
        let (name, pointer) = funcs[0].recv.as_ref().unwrap().base_type().unwrap();
        assert_eq!(name.name, "MyStruct");
        assert!(!pointer);
        let (_, pointer) = funcs[1].recv.as_ref().unwrap().base_type().unwrap();
        assert!(pointer);
        assert_eq!(funcs[1].ty.params.len(), 3);
        assert!(funcs[1].ty.is_variadic());
        assert_eq!(funcs[1].ty.results.len(), 2);
    }

    #[test]
    fn test_parse_bodyless_func() {
        let unit = parse_ok("package fmt\n\nfunc Println(a ...any) (n int, err error)\n");
        let func = unit.file.funcs().next().unwrap();
        assert!(func.body.is_none());
        assert_eq!(func.ty.results.len(), 2);
    }

    #[test]
    fn test_selector_chain_shape() {
        let unit = parse_ok("package main\n\nfunc f() {\n\ta.b.c.d()\n}\n");
        let stmts = body_stmts(&unit, "f");
        let StmtKind::Expr(call) = &stmts[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { callee, .. } = &call.kind else {
            panic!("expected call");
        };
        let ExprKind::Selector { operand, member } = &callee.kind else {
            panic!("expected selector");
        };
        assert_eq!(member.name, "d");
        assert!(matches!(operand.kind, ExprKind::Selector { .. }));
        assert_eq!(unit.snippet(call.span), "a.b.c.d()");
    }

    #[test]
    fn test_composite_literal_in_if_header() {
        let unit = parse_ok(
            r#"package main

func f() {
	if x == y {
		g(T{1})
	}
	for _, v := range []int{1, 2} {
		g(v)
	}
}
"#,
        );
        let stmts = body_stmts(&unit, "f");
        assert!(matches!(stmts[0].kind, StmtKind::If { .. }));
        let StmtKind::Range { define, subject, .. } = &stmts[1].kind else {
            panic!("expected range");
        };
        assert!(*define);
        assert!(matches!(subject.kind, ExprKind::CompositeLit { .. }));
    }

    #[test]
    fn test_parse_control_flow() {
        let unit = parse_ok(
            r#"package main

func f(x any, c chan int) {
	for i := 0; i < 10; i++ {
		continue
	}
	switch v := x.(type) {
	case int, string:
		g(v)
	default:
	}
	switch {
	case true:
		fallthrough
	default:
	}
	select {
	case n := <-c:
		g(n)
	case c <- 1:
	default:
	}
outer:
	for {
		break outer
	}
	defer func() { recover() }()
	go g(1)
}
"#,
        );
        let stmts = body_stmts(&unit, "f");
        assert!(matches!(stmts[0].kind, StmtKind::For { .. }));
        let StmtKind::TypeSwitch { binding, clauses, .. } = &stmts[1].kind else {
            panic!("expected type switch");
        };
        assert_eq!(binding.as_ref().unwrap().name, "v");
        assert_eq!(clauses[0].types.as_ref().unwrap().len(), 2);
        assert!(matches!(stmts[2].kind, StmtKind::Switch { tag: None, .. }));
        assert!(matches!(stmts[3].kind, StmtKind::Select { .. }));
        assert!(matches!(stmts[4].kind, StmtKind::Labeled { .. }));
        assert!(matches!(stmts[5].kind, StmtKind::Defer(_)));
        assert!(matches!(stmts[6].kind, StmtKind::Go(_)));
    }

    #[test]
    fn test_method_expression_and_conversion() {
        let unit = parse_ok("package main\n\nfunc f() {\n\t(*T).M(t)\n\t_ = []byte(s)\n}\n");
        let stmts = body_stmts(&unit, "f");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[1].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let unit = parse_ok("package main\n\nfunc f() { g(a, b.c) }\n");
        let stmts = body_stmts(&unit, "f");
        let StmtKind::Expr(call) = &stmts[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { callee, args, .. } = &call.kind else {
            panic!("expected call");
        };
        let ids = [call.id, callee.id, args[0].id, args[1].id];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(unit.next_node > call.id.index);
    }

    #[test]
    fn test_block_comments_are_trivia() {
        let source = "package main\n\n/* doc */\nfunc main() {\n\tx := 1 /* trailing */\n\ty := /* inner */ x\n\t_ = y /* spans\nlines */\n}\n";
        let unit = parse_ok(source);
        assert_eq!(body_stmts(&unit, "main").len(), 3);
        assert_eq!(unit.render(), source);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let result = parse("package main\n\n/* open\nfunc main() {}\n", "test.go", FileId(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_package_clause() {
        let err = parse("func main() {}", "test.go", FileId(0)).unwrap_err();
        assert!(matches!(err, SyntaxError::MissingPackage { .. }));
    }

    #[test]
    fn test_syntax_error_span() {
        let source = "package main\n\nfunc main() {\n\tx := \n}\n";
        let err = parse(source, "test.go", FileId(0)).unwrap_err();
        assert_eq!(&source[err.span().start..err.span().start + 1], "}");
    }

    #[test]
    fn test_invalid_character() {
        let err = parse("package main\n\nvar x = 1 @ 2\n", "test.go", FileId(0)).unwrap_err();
        assert!(matches!(err, SyntaxError::InvalidCharacter { .. }));
    }
}
