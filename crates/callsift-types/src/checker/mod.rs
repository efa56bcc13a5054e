//! Package checker
//!
//! Checks one package at a time, in import order, writing every resolved
//! identifier, selector and expression type into the shared [`TypeInfo`].
//! Package-level declarations are collected from all files first so forward
//! references across files work. Package variables, constants, aliases and
//! signatures are resolved on first use.

mod exprs;
mod stmts;
mod typexpr;

use std::collections::{BTreeMap, HashMap};

use callsift_ast::{
    Decl, FileId, FuncDecl, GenDecl, Ident, Span, SyntaxUnit, TypeSpec, ValueSpec,
};

use crate::{
    CheckError, Object, ObjectId, ObjectKind, PackageId, Site, Type, TypeId, TypeInfo,
};

/// Where a lazily resolved package-level object was declared
#[derive(Clone, Copy)]
enum DeclRef<'a> {
    Type {
        unit: usize,
        spec: &'a TypeSpec,
    },
    Func {
        unit: usize,
        decl: &'a FuncDecl,
    },
    Value {
        unit: usize,
        spec: &'a ValueSpec,
        /// Constant spec whose values this one repeats (`iota` groups)
        inherited: Option<&'a ValueSpec>,
        constant: bool,
    },
}

impl DeclRef<'_> {
    fn unit(&self) -> usize {
        match self {
            DeclRef::Type { unit, .. } | DeclRef::Func { unit, .. } | DeclRef::Value { unit, .. } => {
                *unit
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    InProgress,
    Done,
}

/// Nested block scopes of the function being checked
#[derive(Debug, Default)]
struct Scopes {
    stack: Vec<HashMap<String, ObjectId>>,
}

impl Scopes {
    fn enter_scope(&mut self) {
        self.stack.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        self.stack.pop();
    }

    fn define(&mut self, name: &str, obj: ObjectId) {
        if let Some(scope) = self.stack.last_mut() {
            scope.insert(name.to_string(), obj);
        }
    }

    /// Declared in the innermost scope
    fn local(&self, name: &str) -> Option<ObjectId> {
        self.stack.last().and_then(|s| s.get(name)).copied()
    }

    fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.stack.iter().rev().find_map(|s| s.get(name)).copied()
    }
}

pub(crate) struct Checker<'a> {
    info: &'a mut TypeInfo,
    errors: Vec<CheckError>,
    pkg: PackageId,
    units: &'a [SyntaxUnit],
    /// Import names visible in each file
    file_scopes: Vec<HashMap<String, ObjectId>>,
    /// Index into `units` of the file being checked
    current: usize,
    scopes: Scopes,
    decls: HashMap<ObjectId, DeclRef<'a>>,
    state: HashMap<ObjectId, ResolveState>,
    /// Package-level objects in declaration order
    order: Vec<ObjectId>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(info: &'a mut TypeInfo, pkg: PackageId, units: &'a [SyntaxUnit]) -> Self {
        Self {
            info,
            errors: Vec::new(),
            pkg,
            units,
            file_scopes: vec![HashMap::new(); units.len()],
            current: 0,
            scopes: Scopes::default(),
            decls: HashMap::new(),
            state: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Run every phase over the package and return the errors found
    pub(crate) fn check_package(mut self) -> Vec<CheckError> {
        self.check_package_clauses();

        // First pass: collect package-level declarations from every file
        for unit in 0..self.units.len() {
            self.current = unit;
            self.collect_file(unit);
        }

        for unit in 0..self.units.len() {
            self.current = unit;
            self.collect_imports(unit);
        }

        // Methods need their receiver type names, not the types' contents
        for unit in 0..self.units.len() {
            self.current = unit;
            self.collect_methods(unit);
        }

        // Resolve types, signatures and package values
        for obj in self.order.clone() {
            self.ensure(obj);
        }

        // Second pass: function bodies
        for unit in 0..self.units.len() {
            self.current = unit;
            self.check_file_bodies(unit);
        }

        self.errors
    }

    fn file_id(&self) -> FileId {
        self.units
            .get(self.current)
            .map(|u| u.file_id)
            .unwrap_or(FileId(0))
    }

    fn error(&mut self, error: CheckError) {
        tracing::debug!(%error, "type error");
        self.errors.push(error);
    }

    fn site(&self, span: Span) -> Option<Site> {
        Some(Site {
            file: self.file_id(),
            span,
        })
    }

    fn new_object(&mut self, ident: &Ident, kind: ObjectKind, ty: TypeId) -> ObjectId {
        let site = self.site(ident.span);
        let obj = self.info.add_object(Object {
            name: ident.name.clone(),
            kind,
            package: Some(self.pkg),
            ty,
            site,
        });
        self.info.defs.insert(ident.id, obj);
        obj
    }

    fn set_object_type(&mut self, obj: ObjectId, ty: TypeId) {
        if let Some(object) = self.info.object_mut(obj) {
            object.ty = ty;
        }
    }

    fn package_scope(&self) -> &BTreeMap<String, ObjectId> {
        &self.info.package(self.pkg).scope
    }

    // === Name resolution ===

    /// Block scopes, then the file's imports, then the package, then the universe
    fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.scopes
            .lookup(name)
            .or_else(|| {
                self.file_scopes
                    .get(self.current)
                    .and_then(|s| s.get(name))
                    .copied()
            })
            .or_else(|| self.package_scope().get(name).copied())
            .or_else(|| self.info.universe_lookup(name))
    }

    /// Resolve a package-level object declared in this package, if still pending
    fn ensure(&mut self, obj: ObjectId) {
        if self.state.contains_key(&obj) {
            return;
        }
        let Some(decl) = self.decls.get(&obj).copied() else {
            return;
        };
        self.state.insert(obj, ResolveState::InProgress);

        let saved_unit = std::mem::replace(&mut self.current, decl.unit());
        let saved_scopes = std::mem::take(&mut self.scopes);

        match decl {
            DeclRef::Type { spec, .. } => self.resolve_type_decl(obj, spec),
            DeclRef::Func { decl, .. } => {
                let ty = self.signature(&decl.ty);
                self.set_object_type(obj, ty);
            }
            DeclRef::Value {
                spec,
                inherited,
                constant,
                ..
            } => {
                let names: Vec<Option<ObjectId>> = spec
                    .names
                    .iter()
                    .map(|n| self.info.defs.get(&n.id).copied())
                    .collect();
                for o in names.iter().flatten() {
                    self.state.insert(*o, ResolveState::InProgress);
                }
                let types = self.value_spec_types(spec, inherited, constant);
                for (o, ty) in names.iter().zip(types) {
                    if let Some(o) = o {
                        self.set_object_type(*o, ty);
                        self.state.insert(*o, ResolveState::Done);
                    }
                }
            }
        }

        self.scopes = saved_scopes;
        self.current = saved_unit;
        self.state.insert(obj, ResolveState::Done);
    }

    // === Collection ===

    fn check_package_clauses(&mut self) {
        let Some(first) = self.units.first() else {
            return;
        };
        let expected = first.package_name().to_string();
        for unit in &self.units[1..] {
            if unit.package_name() != expected {
                let error = CheckError::PackageMismatch {
                    expected: expected.clone(),
                    found: unit.package_name().to_string(),
                    file: unit.file_id,
                    span: unit.file.package.span,
                };
                self.error(error);
            }
        }
    }

    fn declare_package_level(&mut self, ident: &Ident, kind: ObjectKind, decl: DeclRef<'a>) {
        let obj = self.new_object(ident, kind, TypeId::INVALID);
        self.decls.insert(obj, decl);
        self.order.push(obj);
        if ident.is_blank() || (kind == ObjectKind::Function && ident.name == "init") {
            return;
        }
        let pkg = self.pkg;
        let duplicate = match self.info.package_mut(pkg) {
            Some(package) => {
                if package.scope.contains_key(&ident.name) {
                    true
                } else {
                    package.scope.insert(ident.name.clone(), obj);
                    false
                }
            }
            None => false,
        };
        if duplicate {
            let error = CheckError::DuplicateDecl {
                name: ident.name.clone(),
                file: self.file_id(),
                span: ident.span,
            };
            self.error(error);
        }
    }

    fn collect_file(&mut self, unit: usize) {
        let units = self.units;
        for decl in &units[unit].file.decls {
            match decl {
                Decl::Func(func) if func.recv.is_none() => {
                    self.declare_package_level(
                        &func.name,
                        ObjectKind::Function,
                        DeclRef::Func { unit, decl: func },
                    );
                }
                Decl::Func(_) => {}
                Decl::Gen(GenDecl::Type(specs)) => {
                    for spec in specs {
                        self.declare_package_level(
                            &spec.name,
                            ObjectKind::TypeName,
                            DeclRef::Type { unit, spec },
                        );
                        if !spec.alias {
                            if let Some(obj) = self.info.defs.get(&spec.name.id).copied() {
                                let named = self.info.types.insert(Type::Named {
                                    obj,
                                    underlying: TypeId::INVALID,
                                    methods: Vec::new(),
                                });
                                self.set_object_type(obj, named);
                            }
                        }
                    }
                }
                Decl::Gen(GenDecl::Var(specs)) => {
                    for spec in specs {
                        for name in &spec.names {
                            self.declare_package_level(
                                name,
                                ObjectKind::Variable { param: false },
                                DeclRef::Value {
                                    unit,
                                    spec,
                                    inherited: None,
                                    constant: false,
                                },
                            );
                        }
                    }
                }
                Decl::Gen(GenDecl::Const(specs)) => {
                    let mut last: Option<&ValueSpec> = None;
                    for spec in specs {
                        let inherited = if spec.values.is_empty() { last } else { None };
                        if !spec.values.is_empty() {
                            last = Some(spec);
                        }
                        for name in &spec.names {
                            self.declare_package_level(
                                name,
                                ObjectKind::Constant,
                                DeclRef::Value {
                                    unit,
                                    spec,
                                    inherited,
                                    constant: true,
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    fn collect_imports(&mut self, unit: usize) {
        let units = self.units;
        for import in &units[unit].file.imports {
            let Some(imported) = self.info.package_by_path(&import.path) else {
                continue;
            };
            let alias = import.alias.as_ref();
            match alias.map(|a| a.name.as_str()) {
                Some("_") => {}
                Some(".") => {
                    let exported: Vec<(String, ObjectId)> = self
                        .info
                        .package(imported)
                        .scope
                        .iter()
                        .filter(|(name, _)| {
                            name.chars().next().is_some_and(char::is_uppercase)
                        })
                        .map(|(name, obj)| (name.clone(), *obj))
                        .collect();
                    if let Some(scope) = self.file_scopes.get_mut(unit) {
                        scope.extend(exported);
                    }
                }
                _ => {
                    let name = match alias {
                        Some(alias) => alias.name.clone(),
                        None => self.info.package(imported).name.clone(),
                    };
                    let site = self.site(import.span);
                    let obj = self.info.add_object(Object {
                        name: name.clone(),
                        kind: ObjectKind::Package { imported },
                        package: Some(self.pkg),
                        ty: TypeId::INVALID,
                        site,
                    });
                    if let Some(alias) = alias {
                        self.info.defs.insert(alias.id, obj);
                    }
                    if let Some(scope) = self.file_scopes.get_mut(unit) {
                        scope.insert(name, obj);
                    }
                }
            }
        }
    }

    fn collect_methods(&mut self, unit: usize) {
        let units = self.units;
        for func in units[unit].file.funcs() {
            let Some(recv) = &func.recv else {
                continue;
            };
            let base = recv.base_type();
            let named = base.and_then(|(ident, pointer)| {
                let obj = self.package_scope().get(&ident.name).copied()?;
                self.info.uses.insert(ident.id, obj);
                match self.info.object(obj).kind {
                    ObjectKind::TypeName => {
                        let ty = self.info.object(obj).ty;
                        match self.info.ty(ty) {
                            Type::Named { .. } => Some((ty, pointer)),
                            _ => None,
                        }
                    }
                    _ => None,
                }
            });
            let Some((named, pointer)) = named else {
                let error = CheckError::InvalidReceiver {
                    found: callsift_ast::print_type(&recv.ty),
                    file: self.file_id(),
                    span: recv.ty.span,
                };
                self.error(error);
                continue;
            };

            let obj = self.new_object(
                &func.name,
                ObjectKind::Method {
                    recv: named,
                    pointer,
                    interface: false,
                },
                TypeId::INVALID,
            );
            self.decls.insert(obj, DeclRef::Func { unit, decl: func });
            self.order.push(obj);

            if func.name.is_blank() {
                continue;
            }
            let info = &*self.info;
            let duplicate = match info.ty(named) {
                Type::Named { methods, .. } => methods
                    .iter()
                    .any(|m| info.object(*m).name == func.name.name),
                _ => false,
            };
            if duplicate {
                let error = CheckError::DuplicateMethod {
                    type_name: self.info.display_type(named),
                    name: func.name.name.clone(),
                    file: self.file_id(),
                    span: func.name.span,
                };
                self.error(error);
                continue;
            }
            if let Some(Type::Named { methods, .. }) = self.info.types.get_mut(named) {
                methods.push(obj);
            }
        }
    }

    fn resolve_type_decl(&mut self, obj: ObjectId, spec: &TypeSpec) {
        let rhs = self.resolve_type(&spec.ty);
        if spec.alias {
            self.set_object_type(obj, rhs);
            return;
        }
        let named = self.info.object(obj).ty;
        let underlying = self.underlying_of(rhs);
        if let Some(Type::Named { underlying: u, .. }) = self.info.types.get_mut(named) {
            *u = underlying;
        }
    }

    /// Underlying type, resolving the declaration of a named type on demand
    fn underlying_of(&mut self, ty: TypeId) -> TypeId {
        if let Type::Named { obj, .. } = self.info.ty(ty) {
            let obj = *obj;
            self.ensure(obj);
        }
        self.info.underlying(ty)
    }

    // === Bodies ===

    fn check_file_bodies(&mut self, unit: usize) {
        let units = self.units;
        for decl in &units[unit].file.decls {
            let Decl::Func(func) = decl else {
                continue;
            };
            let Some(body) = &func.body else {
                continue;
            };
            let Some(obj) = self.info.defs.get(&func.name.id).copied() else {
                continue;
            };
            let sig = self.info.object(obj).ty;

            self.scopes.enter_scope();
            if let Some(recv) = &func.recv {
                if let Some(name) = &recv.name {
                    let ty = self.resolve_type(&recv.ty);
                    self.declare_var(name, ty, true);
                }
            }
            self.declare_params(&func.ty, sig);
            self.check_block(body);
            self.scopes.exit_scope();
        }
    }

    /// Declare a local variable in the innermost scope
    fn declare_var(&mut self, ident: &Ident, ty: TypeId, param: bool) -> ObjectId {
        let obj = self.new_object(ident, ObjectKind::Variable { param }, ty);
        if !ident.is_blank() {
            self.scopes.define(&ident.name, obj);
        }
        obj
    }

    fn declare_params(&mut self, func: &callsift_ast::FuncType, sig: TypeId) {
        let (params, results) = match self.info.ty(sig) {
            Type::Signature(sig) => (sig.params.clone(), sig.results.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        for (param, ty) in func.params.iter().zip(params) {
            if let Some(name) = &param.name {
                self.declare_var(name, ty, true);
            }
        }
        for (result, ty) in func.results.iter().zip(results) {
            if let Some(name) = &result.name {
                self.declare_var(name, ty, false);
            }
        }
    }
}
