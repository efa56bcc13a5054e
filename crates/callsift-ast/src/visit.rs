//! Tree traversal
//!
//! [`Visitor`] walks a tree by shared reference and [`VisitorMut`] by
//! exclusive reference. Override a `visit_*` method and call the matching
//! `walk_*` function to keep descending. `Visitor<'ast>` hands out references
//! that live as long as the tree, so visitors can collect nodes.

use crate::*;

pub trait Visitor<'ast> {
    fn visit_file(&mut self, file: &'ast File) {
        walk_file(self, file);
    }

    fn visit_func_decl(&mut self, func: &'ast FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_gen_decl(&mut self, decl: &'ast GenDecl) {
        walk_gen_decl(self, decl);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, ty: &'ast TypeExpr) {
        walk_type_expr(self, ty);
    }
}

pub fn walk_file<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, file: &'ast File) {
    for decl in &file.decls {
        match decl {
            Decl::Func(func) => v.visit_func_decl(func),
            Decl::Gen(gen) => v.visit_gen_decl(gen),
        }
    }
}

pub fn walk_func_decl<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, func: &'ast FuncDecl) {
    if let Some(recv) = &func.recv {
        v.visit_type_expr(&recv.ty);
    }
    walk_func_type(v, &func.ty);
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

fn walk_func_type<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, ty: &'ast FuncType) {
    for param in ty.params.iter().chain(&ty.results) {
        v.visit_type_expr(&param.ty);
    }
}

pub fn walk_gen_decl<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, decl: &'ast GenDecl) {
    match decl {
        GenDecl::Var(specs) | GenDecl::Const(specs) => {
            for spec in specs {
                if let Some(ty) = &spec.ty {
                    v.visit_type_expr(ty);
                }
                for value in &spec.values {
                    v.visit_expr(value);
                }
            }
        }
        GenDecl::Type(specs) => {
            for spec in specs {
                v.visit_type_expr(&spec.ty);
            }
        }
    }
}

pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Empty | StmtKind::Branch { .. } => {}
        StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => v.visit_expr(expr),
        StmtKind::Send { channel, value } => {
            v.visit_expr(channel);
            v.visit_expr(value);
        }
        StmtKind::IncDec { target, .. } => v.visit_expr(target),
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                v.visit_expr(expr);
            }
        }
        StmtKind::Define { values, .. } => {
            for value in values {
                v.visit_expr(value);
            }
        }
        StmtKind::Decl(decl) => v.visit_gen_decl(decl),
        StmtKind::Return(values) => {
            for value in values {
                v.visit_expr(value);
            }
        }
        StmtKind::Block(block) => v.visit_block(block),
        StmtKind::If {
            init,
            cond,
            then_branch,
            else_branch,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        StmtKind::Range {
            key,
            value,
            subject,
            body,
            ..
        } => {
            if let Some(key) = key {
                v.visit_expr(key);
            }
            if let Some(value) = value {
                v.visit_expr(value);
            }
            v.visit_expr(subject);
            v.visit_block(body);
        }
        StmtKind::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_expr(tag);
            }
            for clause in clauses {
                for expr in clause.exprs.iter().flatten() {
                    v.visit_expr(expr);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::TypeSwitch {
            init,
            subject,
            clauses,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(subject);
            for clause in clauses {
                for ty in clause.types.iter().flatten() {
                    v.visit_type_expr(ty);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &clause.comm {
                    v.visit_stmt(comm);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Labeled { stmt, .. } => v.visit_stmt(stmt),
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) => {}
        ExprKind::CompositeLit { ty, elements } => {
            if let Some(ty) = ty {
                v.visit_type_expr(ty);
            }
            for element in elements {
                if let Some(key) = &element.key {
                    v.visit_expr(key);
                }
                v.visit_expr(&element.value);
            }
        }
        ExprKind::FuncLit { ty, body } => {
            walk_func_type(v, ty);
            v.visit_block(body);
        }
        ExprKind::Paren(inner) => v.visit_expr(inner),
        ExprKind::Selector { operand, .. } => v.visit_expr(operand),
        ExprKind::Index { operand, index } => {
            v.visit_expr(operand);
            v.visit_expr(index);
        }
        ExprKind::Slice {
            operand,
            low,
            high,
            max,
        } => {
            v.visit_expr(operand);
            for part in [low, high, max].into_iter().flatten() {
                v.visit_expr(part);
            }
        }
        ExprKind::TypeAssert { operand, ty } => {
            v.visit_expr(operand);
            if let Some(ty) = ty {
                v.visit_type_expr(ty);
            }
        }
        ExprKind::Call { callee, args, .. } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Type(ty) => v.visit_type_expr(ty),
    }
}

pub fn walk_type_expr<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, ty: &'ast TypeExpr) {
    match &ty.kind {
        TypeExprKind::Name(_) | TypeExprKind::Qualified { .. } => {}
        TypeExprKind::Pointer(inner) | TypeExprKind::Slice(inner) | TypeExprKind::Paren(inner) => {
            v.visit_type_expr(inner)
        }
        TypeExprKind::Array { len, elem } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_type_expr(elem);
        }
        TypeExprKind::Map { key, value } => {
            v.visit_type_expr(key);
            v.visit_type_expr(value);
        }
        TypeExprKind::Chan { elem, .. } => v.visit_type_expr(elem),
        TypeExprKind::Func(func) => walk_func_type(v, func),
        TypeExprKind::Struct(st) => {
            for field in &st.fields {
                v.visit_type_expr(&field.ty);
            }
        }
        TypeExprKind::Interface(iface) => {
            for elem in &iface.elems {
                match elem {
                    InterfaceElem::Method { ty, .. } => walk_func_type(v, ty),
                    InterfaceElem::Embedded(ty) => v.visit_type_expr(ty),
                }
            }
        }
    }
}

/// Mutable traversal. Only statements and expressions are visited; type
/// expressions are left alone since nothing rewrites them.
pub trait VisitorMut {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_file_mut<V: VisitorMut + ?Sized>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        match decl {
            Decl::Func(func) => {
                if let Some(body) = &mut func.body {
                    v.visit_block_mut(body);
                }
            }
            Decl::Gen(gen) => walk_gen_decl_mut(v, gen),
        }
    }
}

fn walk_gen_decl_mut<V: VisitorMut + ?Sized>(v: &mut V, decl: &mut GenDecl) {
    if let GenDecl::Var(specs) | GenDecl::Const(specs) = decl {
        for spec in specs {
            for value in &mut spec.values {
                v.visit_expr_mut(value);
            }
        }
    }
}

pub fn walk_block_mut<V: VisitorMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Empty | StmtKind::Branch { .. } => {}
        StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => {
            v.visit_expr_mut(expr)
        }
        StmtKind::Send { channel, value } => {
            v.visit_expr_mut(channel);
            v.visit_expr_mut(value);
        }
        StmtKind::IncDec { target, .. } => v.visit_expr_mut(target),
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter_mut().chain(rhs.iter_mut()) {
                v.visit_expr_mut(expr);
            }
        }
        StmtKind::Define { values, .. } | StmtKind::Return(values) => {
            for value in values {
                v.visit_expr_mut(value);
            }
        }
        StmtKind::Decl(decl) => walk_gen_decl_mut(v, decl),
        StmtKind::Block(block) => v.visit_block_mut(block),
        StmtKind::If {
            init,
            cond,
            then_branch,
            else_branch,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt_mut(else_branch);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                v.visit_expr_mut(cond);
            }
            if let Some(post) = post {
                v.visit_stmt_mut(post);
            }
            v.visit_block_mut(body);
        }
        StmtKind::Range {
            key,
            value,
            subject,
            body,
            ..
        } => {
            if let Some(key) = key {
                v.visit_expr_mut(key);
            }
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
            v.visit_expr_mut(subject);
            v.visit_block_mut(body);
        }
        StmtKind::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(tag) = tag {
                v.visit_expr_mut(tag);
            }
            for clause in clauses {
                for expr in clause.exprs.iter_mut().flatten() {
                    v.visit_expr_mut(expr);
                }
                for stmt in &mut clause.body {
                    v.visit_stmt_mut(stmt);
                }
            }
        }
        StmtKind::TypeSwitch {
            init,
            subject,
            clauses,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(subject);
            for clause in clauses {
                for stmt in &mut clause.body {
                    v.visit_stmt_mut(stmt);
                }
            }
        }
        StmtKind::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &mut clause.comm {
                    v.visit_stmt_mut(comm);
                }
                for stmt in &mut clause.body {
                    v.visit_stmt_mut(stmt);
                }
            }
        }
        StmtKind::Labeled { stmt, .. } => v.visit_stmt_mut(stmt),
    }
}

pub fn walk_expr_mut<V: VisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) | ExprKind::Type(_) => {}
        ExprKind::CompositeLit { elements, .. } => {
            for element in elements {
                if let Some(key) = &mut element.key {
                    v.visit_expr_mut(key);
                }
                v.visit_expr_mut(&mut element.value);
            }
        }
        ExprKind::FuncLit { body, .. } => v.visit_block_mut(body),
        ExprKind::Paren(inner) => v.visit_expr_mut(inner),
        ExprKind::Selector { operand, .. } => v.visit_expr_mut(operand),
        ExprKind::Index { operand, index } => {
            v.visit_expr_mut(operand);
            v.visit_expr_mut(index);
        }
        ExprKind::Slice {
            operand,
            low,
            high,
            max,
        } => {
            v.visit_expr_mut(operand);
            for part in [low, high, max].into_iter().flatten() {
                v.visit_expr_mut(part);
            }
        }
        ExprKind::TypeAssert { operand, .. } => v.visit_expr_mut(operand),
        ExprKind::Call { callee, args, .. } => {
            v.visit_expr_mut(callee);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        ExprKind::Unary { operand, .. } => v.visit_expr_mut(operand),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr_mut(left);
            v.visit_expr_mut(right);
        }
    }
}
