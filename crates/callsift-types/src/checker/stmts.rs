//! Statement checking and local declarations

use callsift_ast::{
    Block, Expr, ExprKind, GenDecl, Stmt, StmtKind, TypeExpr, TypeExprKind, TypeSpec, ValueSpec,
};

use super::Checker;
use crate::{
    BasicCategory, BasicKind, Mode, Object, ObjectKind, Type, TypeAndValue, TypeId,
};

impl Checker<'_> {
    pub(super) fn check_block(&mut self, block: &Block) {
        self.scopes.enter_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.exit_scope();
    }

    fn check_stmts_in_scope(&mut self, stmts: &[Stmt]) {
        self.scopes.enter_scope();
        for stmt in stmts {
            self.check_stmt(stmt);
        }
        self.scopes.exit_scope();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Branch { .. } => {}
            StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => {
                self.check_expr(expr);
            }
            StmtKind::Send { channel, value } => {
                self.check_expr(channel);
                self.check_expr(value);
            }
            StmtKind::IncDec { target, .. } => {
                self.check_expr(target);
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                for target in lhs {
                    self.check_expr(target);
                }
                for value in rhs {
                    self.check_expr(value);
                }
            }
            StmtKind::Define { names, values } => {
                let types = self.assign_types(values, names.len());
                for (name, ty) in names.iter().zip(types) {
                    if name.is_blank() {
                        continue;
                    }
                    // At least one name is new; the others are plain assignments
                    if let Some(existing) = self.scopes.local(&name.name) {
                        self.info.uses.insert(name.id, existing);
                        continue;
                    }
                    let ty = self.default_type(ty);
                    self.declare_var(name, ty, false);
                }
            }
            StmtKind::Decl(decl) => self.check_local_decl(decl),
            StmtKind::Return(values) => {
                for value in values {
                    self.check_expr(value);
                }
            }
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::If {
                init,
                cond,
                then_branch,
                else_branch,
            } => {
                self.scopes.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                self.check_expr(cond);
                self.check_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
                self.scopes.exit_scope();
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.scopes.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(post) = post {
                    self.check_stmt(post);
                }
                self.check_block(body);
                self.scopes.exit_scope();
            }
            StmtKind::Range {
                key,
                value,
                define,
                subject,
                body,
            } => {
                let x = self.check_expr(subject);
                let (key_ty, value_ty) = self.range_types(x.ty);
                self.scopes.enter_scope();
                for (target, ty) in [(key, key_ty), (value, value_ty)] {
                    let Some(target) = target else {
                        continue;
                    };
                    if *define {
                        self.define_range_var(target, ty);
                    } else {
                        self.check_expr(target);
                    }
                }
                self.check_block(body);
                self.scopes.exit_scope();
            }
            StmtKind::Switch { init, tag, clauses } => {
                self.scopes.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(tag) = tag {
                    self.check_expr(tag);
                }
                for clause in clauses {
                    for expr in clause.exprs.iter().flatten() {
                        self.check_expr(expr);
                    }
                    self.check_stmts_in_scope(&clause.body);
                }
                self.scopes.exit_scope();
            }
            StmtKind::TypeSwitch {
                init,
                binding,
                subject,
                clauses,
            } => {
                self.scopes.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                let x = self.check_expr(subject);
                if let Some(binding) = binding {
                    // The declaring identifier stands for every clause's variable
                    self.new_object(binding, ObjectKind::Variable { param: false }, x.ty);
                }
                for clause in clauses {
                    let types: Vec<TypeId> = clause
                        .types
                        .iter()
                        .flatten()
                        .map(|ty| self.case_type(ty))
                        .collect();
                    self.scopes.enter_scope();
                    if let Some(binding) = binding {
                        let nil = self.info.types.basic(BasicKind::UntypedNil);
                        let ty = match types.as_slice() {
                            [single] if *single != nil => *single,
                            _ => x.ty,
                        };
                        let site = self.site(binding.span);
                        let obj = self.info.add_object(Object {
                            name: binding.name.clone(),
                            kind: ObjectKind::Variable { param: false },
                            package: Some(self.pkg),
                            ty,
                            site,
                        });
                        self.scopes.define(&binding.name, obj);
                    }
                    for stmt in &clause.body {
                        self.check_stmt(stmt);
                    }
                    self.scopes.exit_scope();
                }
                self.scopes.exit_scope();
            }
            StmtKind::Select { clauses } => {
                for clause in clauses {
                    self.scopes.enter_scope();
                    if let Some(comm) = &clause.comm {
                        self.check_stmt(comm);
                    }
                    for stmt in &clause.body {
                        self.check_stmt(stmt);
                    }
                    self.scopes.exit_scope();
                }
            }
            StmtKind::Labeled { stmt, .. } => self.check_stmt(stmt),
        }
    }

    fn define_range_var(&mut self, target: &Expr, ty: TypeId) {
        let ExprKind::Ident(ident) = &target.kind else {
            self.check_expr(target);
            return;
        };
        if ident.is_blank() {
            return;
        }
        self.declare_var(ident, ty, false);
        self.info.expr_types.insert(
            target.id,
            TypeAndValue {
                mode: Mode::Variable,
                ty,
            },
        );
    }

    /// Key and value types of `for k, v := range x`
    fn range_types(&self, ty: TypeId) -> (TypeId, TypeId) {
        let int = self.info.types.basic(BasicKind::Int);
        let base = self.info.underlying(ty);
        let (base, _) = self.info.deref(base);
        let base = self.info.underlying(base);
        match self.info.ty(base) {
            Type::Basic(kind) => match kind.category() {
                BasicCategory::String => (int, self.info.types.basic(BasicKind::Int32)),
                BasicCategory::Integer => (self.default_type(ty), TypeId::INVALID),
                _ => (TypeId::INVALID, TypeId::INVALID),
            },
            Type::Slice(elem) | Type::Array { elem, .. } => (int, *elem),
            Type::Map { key, value } => (*key, *value),
            Type::Chan { elem, .. } => (*elem, TypeId::INVALID),
            _ => (TypeId::INVALID, TypeId::INVALID),
        }
    }

    /// A type switch case: a type, or `nil`
    fn case_type(&mut self, ty: &TypeExpr) -> TypeId {
        if let TypeExprKind::Name(ident) = &ty.kind {
            if let Some(obj) = self.lookup(&ident.name) {
                if self.info.object(obj).kind == ObjectKind::Nil {
                    self.info.uses.insert(ident.id, obj);
                    return self.info.types.basic(BasicKind::UntypedNil);
                }
            }
        }
        self.resolve_type(ty)
    }

    fn check_local_decl(&mut self, decl: &GenDecl) {
        match decl {
            GenDecl::Var(specs) => {
                for spec in specs {
                    let types = self.value_spec_types(spec, None, false);
                    for (name, ty) in spec.names.iter().zip(types) {
                        self.declare_var(name, ty, false);
                    }
                }
            }
            GenDecl::Const(specs) => {
                let mut last: Option<&ValueSpec> = None;
                for spec in specs {
                    let inherited = if spec.values.is_empty() { last } else { None };
                    if !spec.values.is_empty() {
                        last = Some(spec);
                    }
                    let types = self.value_spec_types(spec, inherited, true);
                    for (name, ty) in spec.names.iter().zip(types) {
                        let obj = self.new_object(name, ObjectKind::Constant, ty);
                        if !name.is_blank() {
                            self.scopes.define(&name.name, obj);
                        }
                    }
                }
            }
            GenDecl::Type(specs) => {
                for spec in specs {
                    self.check_local_type(spec);
                }
            }
        }
    }

    fn check_local_type(&mut self, spec: &TypeSpec) {
        let obj = self.new_object(&spec.name, ObjectKind::TypeName, TypeId::INVALID);
        self.scopes.define(&spec.name.name, obj);
        if spec.alias {
            let ty = self.resolve_type(&spec.ty);
            self.set_object_type(obj, ty);
            return;
        }
        let named = self.info.types.insert(Type::Named {
            obj,
            underlying: TypeId::INVALID,
            methods: Vec::new(),
        });
        self.set_object_type(obj, named);
        let rhs = self.resolve_type(&spec.ty);
        let underlying = self.underlying_of(rhs);
        if let Some(Type::Named { underlying: u, .. }) = self.info.types.get_mut(named) {
            *u = underlying;
        }
    }

    /// Types of the names of a `var` or `const` spec
    pub(super) fn value_spec_types(
        &mut self,
        spec: &ValueSpec,
        inherited: Option<&ValueSpec>,
        constant: bool,
    ) -> Vec<TypeId> {
        let source = if spec.values.is_empty() {
            inherited.unwrap_or(spec)
        } else {
            spec
        };
        let declared = spec
            .ty
            .as_ref()
            .or(source.ty.as_ref())
            .map(|ty| self.resolve_type(ty));
        let n = spec.names.len();
        let inferred = if source.values.is_empty() {
            vec![TypeId::INVALID; n]
        } else {
            self.assign_types(&source.values, n)
        };
        match declared {
            Some(ty) => vec![ty; n],
            None if constant => inferred,
            None => inferred.into_iter().map(|ty| self.default_type(ty)).collect(),
        }
    }
}
