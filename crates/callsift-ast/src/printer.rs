//! Source serializer
//!
//! Rendering is driven by the original text: everything that was parsed is
//! copied byte-for-byte from the source, and only synthetic nodes (created by
//! a rewrite) are printed from the tree. Original subexpressions nested inside
//! a synthetic node are again copied from source, so formatting inside
//! reused arguments survives a rewrite.

use crate::visit::{self, Visitor};
use crate::*;

/// Render a syntax unit back to source text
pub fn render(unit: &SyntaxUnit) -> String {
    let roots = synthetic_roots_in_file(&unit.file);
    splice(&unit.source, Span::new(0, unit.source.len()), &roots)
}

/// Print a single expression. Parsed nodes come from `source`.
pub fn print_expr(expr: &Expr, source: &str) -> String {
    if expr.synthetic {
        print_synthetic(expr, source)
    } else {
        let mut collector = SyntheticRoots::default();
        visit::walk_expr(&mut collector, expr);
        splice(source, expr.span, &collector.roots)
    }
}

/// Print a type expression in canonical form
pub fn print_type(ty: &TypeExpr) -> String {
    match &ty.kind {
        TypeExprKind::Name(name) => name.name.clone(),
        TypeExprKind::Qualified { package, name } => format!("{}.{}", package.name, name.name),
        TypeExprKind::Pointer(inner) => format!("*{}", print_type(inner)),
        TypeExprKind::Slice(inner) => format!("[]{}", print_type(inner)),
        TypeExprKind::Array { len: None, elem } => format!("[...]{}", print_type(elem)),
        TypeExprKind::Array { len: Some(_), elem } => format!("[N]{}", print_type(elem)),
        TypeExprKind::Map { key, value } => {
            format!("map[{}]{}", print_type(key), print_type(value))
        }
        TypeExprKind::Chan { dir, elem } => match dir {
            ChanDir::Both => format!("chan {}", print_type(elem)),
            ChanDir::Send => format!("chan<- {}", print_type(elem)),
            ChanDir::Recv => format!("<-chan {}", print_type(elem)),
        },
        TypeExprKind::Func(func) => format!("func{}", print_signature(func)),
        TypeExprKind::Struct(st) => {
            let fields: Vec<String> = st
                .fields
                .iter()
                .map(|f| {
                    if f.embedded {
                        print_type(&f.ty)
                    } else {
                        let names: Vec<&str> = f.names.iter().map(|n| n.name.as_str()).collect();
                        format!("{} {}", names.join(", "), print_type(&f.ty))
                    }
                })
                .collect();
            format!("struct{{{}}}", fields.join("; "))
        }
        TypeExprKind::Interface(iface) => {
            let elems: Vec<String> = iface
                .elems
                .iter()
                .map(|e| match e {
                    InterfaceElem::Method { name, ty } => {
                        format!("{}{}", name.name, print_signature(ty))
                    }
                    InterfaceElem::Embedded(ty) => print_type(ty),
                })
                .collect();
            format!("interface{{{}}}", elems.join("; "))
        }
        TypeExprKind::Paren(inner) => format!("({})", print_type(inner)),
    }
}

fn print_signature(func: &FuncType) -> String {
    let print_param = |p: &Param| {
        let ty = if p.variadic {
            format!("...{}", print_type(&p.ty))
        } else {
            print_type(&p.ty)
        };
        match &p.name {
            Some(name) => format!("{} {}", name.name, ty),
            None => ty,
        }
    };
    let params: Vec<String> = func.params.iter().map(print_param).collect();
    let results: Vec<String> = func.results.iter().map(print_param).collect();
    match results.len() {
        0 => format!("({})", params.join(", ")),
        1 if func.results[0].name.is_none() => format!("({}) {}", params.join(", "), results[0]),
        _ => format!("({}) ({})", params.join(", "), results.join(", ")),
    }
}

fn print_synthetic(expr: &Expr, source: &str) -> String {
    match &expr.kind {
        ExprKind::Ident(ident) => ident.name.clone(),
        ExprKind::BasicLit(lit) => lit.raw.clone(),
        ExprKind::Paren(inner) => format!("({})", print_expr(inner, source)),
        ExprKind::Selector { operand, member } => {
            format!("{}.{}", print_expr(operand, source), member.name)
        }
        ExprKind::Call {
            callee,
            args,
            ellipsis,
        } => {
            let args: Vec<String> = args.iter().map(|a| print_expr(a, source)).collect();
            format!(
                "{}({}{})",
                print_expr(callee, source),
                args.join(", "),
                if *ellipsis { "..." } else { "" }
            )
        }
        ExprKind::Index { operand, index } => {
            format!("{}[{}]", print_expr(operand, source), print_expr(index, source))
        }
        ExprKind::Slice {
            operand,
            low,
            high,
            max,
        } => {
            let part = |e: &Option<Box<Expr>>| {
                e.as_ref().map(|e| print_expr(e, source)).unwrap_or_default()
            };
            match max {
                Some(_) => format!(
                    "{}[{}:{}:{}]",
                    print_expr(operand, source),
                    part(low),
                    part(high),
                    part(max)
                ),
                None => format!("{}[{}:{}]", print_expr(operand, source), part(low), part(high)),
            }
        }
        ExprKind::TypeAssert { operand, ty } => match ty {
            Some(ty) => format!("{}.({})", print_expr(operand, source), print_type(ty)),
            None => format!("{}.(type)", print_expr(operand, source)),
        },
        ExprKind::Unary { op, operand } => format!("{}{}", op.symbol(), print_expr(operand, source)),
        ExprKind::Binary { op, left, right } => format!(
            "{} {} {}",
            print_expr(left, source),
            op.symbol(),
            print_expr(right, source)
        ),
        ExprKind::CompositeLit { ty, elements } => {
            let elements: Vec<String> = elements
                .iter()
                .map(|e| match &e.key {
                    Some(key) => format!("{}: {}", print_expr(key, source), print_expr(&e.value, source)),
                    None => print_expr(&e.value, source),
                })
                .collect();
            let ty = ty.as_ref().map(print_type).unwrap_or_default();
            format!("{}{{{}}}", ty, elements.join(", "))
        }
        ExprKind::Type(ty) => print_type(ty),
        // Function bodies are never synthesized; reuse the text they replaced.
        ExprKind::FuncLit { .. } => source.get(expr.span.start..expr.span.end).unwrap_or_default().to_string(),
    }
}

/// Copy `range` of `source`, substituting each synthetic root
fn splice(source: &str, range: Span, roots: &[&Expr]) -> String {
    let mut out = String::with_capacity(range.len());
    let mut cursor = range.start;
    let mut roots: Vec<&Expr> = roots
        .iter()
        .copied()
        .filter(|e| range.contains(e.span))
        .collect();
    roots.sort_by_key(|e| e.span.start);

    for root in roots {
        if root.span.start < cursor {
            // Overlapping replacement; the earlier one already covers it.
            continue;
        }
        out.push_str(&source[cursor..root.span.start]);
        out.push_str(&print_synthetic(root, source));
        cursor = root.span.end;
    }
    out.push_str(&source[cursor..range.end]);
    out
}

fn synthetic_roots_in_file(file: &File) -> Vec<&Expr> {
    let mut collector = SyntheticRoots::default();
    collector.visit_file(file);
    collector.roots
}

/// Collects the outermost synthetic expressions
#[derive(Default)]
struct SyntheticRoots<'a> {
    roots: Vec<&'a Expr>,
}

impl<'a> Visitor<'a> for SyntheticRoots<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if expr.synthetic {
            self.roots.push(expr);
        } else {
            visit::walk_expr(self, expr);
        }
    }
}
