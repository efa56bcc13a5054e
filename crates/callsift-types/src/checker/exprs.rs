//! Expression checking

use callsift_ast::{BinaryOp, Element, Expr, ExprKind, Ident, LitKind, TypeExpr, UnaryOp};

use super::Checker;
use crate::lookup::{lookup_field_or_method, Lookup};
use crate::{
    BasicKind, Builtin, CheckError, Mode, ObjectId, ObjectKind, Selection, SelectionKind,
    Signature, Type, TypeAndValue, TypeId,
};

impl TypeAndValue {
    pub(crate) const INVALID: TypeAndValue = TypeAndValue {
        mode: Mode::Value,
        ty: TypeId::INVALID,
    };

    fn value(ty: TypeId) -> Self {
        Self {
            mode: Mode::Value,
            ty,
        }
    }
}

impl Checker<'_> {
    pub(super) fn check_expr(&mut self, expr: &Expr) -> TypeAndValue {
        self.check_expr_with_hint(expr, None)
    }

    /// Check `expr`; `hint` is the type an elided composite literal takes
    pub(super) fn check_expr_with_hint(&mut self, expr: &Expr, hint: Option<TypeId>) -> TypeAndValue {
        let tv = self.expr_kind(expr, hint);
        self.info.expr_types.insert(expr.id, tv);
        tv
    }

    fn expr_kind(&mut self, expr: &Expr, hint: Option<TypeId>) -> TypeAndValue {
        match &expr.kind {
            ExprKind::Ident(ident) => self.check_ident(ident),
            ExprKind::BasicLit(lit) => {
                let kind = match lit.kind {
                    LitKind::Int => BasicKind::UntypedInt,
                    LitKind::Float => BasicKind::UntypedFloat,
                    LitKind::Imag => BasicKind::UntypedComplex,
                    LitKind::Char => BasicKind::UntypedRune,
                    LitKind::String => BasicKind::UntypedString,
                };
                TypeAndValue {
                    mode: Mode::Constant,
                    ty: self.info.types.basic(kind),
                }
            }
            ExprKind::CompositeLit { ty, elements } => {
                self.check_composite(ty.as_ref(), elements, hint)
            }
            ExprKind::FuncLit { ty, body } => {
                let sig = self.signature(ty);
                self.scopes.enter_scope();
                self.declare_params(ty, sig);
                self.check_block(body);
                self.scopes.exit_scope();
                TypeAndValue::value(sig)
            }
            ExprKind::Paren(inner) => self.check_expr_with_hint(inner, hint),
            ExprKind::Selector { operand, member } => self.check_selector(expr, operand, member),
            ExprKind::Index { operand, index } => {
                let x = self.check_expr(operand);
                self.check_expr(index);
                if x.mode == Mode::Type {
                    return TypeAndValue::INVALID;
                }
                self.index_result(x.ty)
            }
            ExprKind::Slice {
                operand,
                low,
                high,
                max,
            } => {
                let x = self.check_expr(operand);
                for bound in [low, high, max].into_iter().flatten() {
                    self.check_expr(bound);
                }
                TypeAndValue::value(self.slice_result(x.ty))
            }
            ExprKind::TypeAssert { operand, ty } => {
                self.check_expr(operand);
                match ty {
                    Some(ty) => TypeAndValue::value(self.resolve_type(ty)),
                    None => TypeAndValue::INVALID,
                }
            }
            ExprKind::Call { callee, args, .. } => self.check_call(callee, args),
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand),
            ExprKind::Binary { op, left, right } => {
                let l = self.check_expr(left);
                let r = self.check_expr(right);
                self.binary_result(*op, l, r)
            }
            ExprKind::Type(ty) => TypeAndValue {
                mode: Mode::Type,
                ty: self.resolve_type(ty),
            },
        }
    }

    fn check_ident(&mut self, ident: &Ident) -> TypeAndValue {
        if ident.is_blank() {
            return TypeAndValue::INVALID;
        }
        match self.lookup(&ident.name) {
            Some(obj) => {
                self.info.uses.insert(ident.id, obj);
                self.object_value(obj)
            }
            None => {
                let error = CheckError::UndefinedName {
                    name: ident.name.clone(),
                    file: self.file_id(),
                    span: ident.span,
                };
                self.error(error);
                TypeAndValue::INVALID
            }
        }
    }

    /// What a use of `obj` denotes as an expression
    fn object_value(&mut self, obj: ObjectId) -> TypeAndValue {
        self.ensure(obj);
        let object = self.info.object(obj);
        let mode = match object.kind {
            ObjectKind::Package { .. } => return TypeAndValue::INVALID,
            ObjectKind::Function | ObjectKind::Method { .. } => Mode::Value,
            ObjectKind::BuiltIn(_) => Mode::Builtin,
            ObjectKind::Field { .. } | ObjectKind::Variable { .. } => Mode::Variable,
            ObjectKind::TypeName => Mode::Type,
            ObjectKind::Constant | ObjectKind::Nil => Mode::Constant,
        };
        TypeAndValue {
            mode,
            ty: object.ty,
        }
    }

    /// `pkg.Name`: an exported member of an imported package
    pub(super) fn package_member(&mut self, package: &Ident, member: &Ident) -> Option<ObjectId> {
        let obj = self.lookup(&package.name)?;
        let ObjectKind::Package { imported } = self.info.object(obj).kind else {
            return None;
        };
        self.info.uses.insert(package.id, obj);
        if !member.is_exported() {
            return None;
        }
        let found = self.info.package(imported).scope.get(&member.name).copied()?;
        self.info.uses.insert(member.id, found);
        Some(found)
    }

    fn check_selector(&mut self, expr: &Expr, operand: &Expr, member: &Ident) -> TypeAndValue {
        if let ExprKind::Ident(package) = &operand.kind {
            let is_package = self
                .lookup(&package.name)
                .is_some_and(|obj| matches!(self.info.object(obj).kind, ObjectKind::Package { .. }));
            if is_package {
                return match self.package_member(package, member) {
                    Some(obj) => self.object_value(obj),
                    None => {
                        tracing::trace!(package = %package.name, member = %member.name, "unresolved package member");
                        TypeAndValue::INVALID
                    }
                };
            }
        }

        let x = self.check_expr(operand);
        if x.ty.is_invalid() {
            return TypeAndValue::INVALID;
        }

        match lookup_field_or_method(self.info, x.ty, &member.name) {
            Lookup::Found {
                object,
                path,
                indirect,
            } => {
                self.ensure(object);
                self.info.uses.insert(member.id, object);
                let is_method = matches!(self.info.object(object).kind, ObjectKind::Method { .. });
                let member_ty = self.info.object(object).ty;
                let (kind, tv) = match (x.mode, is_method) {
                    (Mode::Type, true) => (
                        SelectionKind::MethodExpr,
                        TypeAndValue::value(self.method_expr_type(x.ty, member_ty)),
                    ),
                    (Mode::Type, false) => return TypeAndValue::INVALID,
                    (_, true) => (SelectionKind::MethodVal, TypeAndValue::value(member_ty)),
                    (_, false) => (
                        SelectionKind::FieldVal,
                        TypeAndValue {
                            mode: Mode::Variable,
                            ty: member_ty,
                        },
                    ),
                };
                self.info.selections.insert(
                    expr.id,
                    Selection {
                        kind,
                        recv: x.ty,
                        object,
                        path,
                        indirect,
                    },
                );
                tv
            }
            Lookup::Ambiguous => {
                tracing::debug!(member = %member.name, "ambiguous selector");
                self.info.ambiguous.insert(expr.id);
                TypeAndValue::INVALID
            }
            Lookup::NotFound => {
                tracing::trace!(
                    ty = %self.info.display_type(x.ty),
                    member = %member.name,
                    "no field or method"
                );
                TypeAndValue::INVALID
            }
        }
    }

    /// `T.m` takes the receiver as its first parameter
    fn method_expr_type(&mut self, recv: TypeId, method: TypeId) -> TypeId {
        let Type::Signature(sig) = self.info.ty(method) else {
            return TypeId::INVALID;
        };
        let mut params = Vec::with_capacity(sig.params.len() + 1);
        params.push(recv);
        params.extend(sig.params.iter().copied());
        let sig = Signature {
            params,
            results: sig.results.clone(),
            variadic: sig.variadic,
        };
        self.info.types.intern(Type::Signature(sig))
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr]) -> TypeAndValue {
        let f = self.check_expr(callee);
        match f.mode {
            // Conversion
            Mode::Type => {
                for arg in args {
                    self.check_expr(arg);
                }
                TypeAndValue::value(f.ty)
            }
            Mode::Builtin => self.check_builtin(callee, args),
            _ => {
                for arg in args {
                    self.check_expr(arg);
                }
                if f.ty.is_invalid() {
                    return TypeAndValue::INVALID;
                }
                let underlying = self.info.underlying(f.ty);
                match self.info.ty(underlying) {
                    Type::Signature(sig) => match sig.results.as_slice() {
                        [] => TypeAndValue {
                            mode: Mode::NoValue,
                            ty: TypeId::INVALID,
                        },
                        [single] => TypeAndValue::value(*single),
                        many => {
                            let many = many.to_vec();
                            TypeAndValue::value(self.info.types.tuple(many))
                        }
                    },
                    _ => {
                        let source = self
                            .units
                            .get(self.current)
                            .map(|u| u.source.as_str())
                            .unwrap_or_default();
                        let error = CheckError::NotCallable {
                            expr: callsift_ast::print_expr(callee, source),
                            file: self.file_id(),
                            span: callee.span,
                        };
                        self.error(error);
                        TypeAndValue::INVALID
                    }
                }
            }
        }
    }

    fn check_builtin(&mut self, callee: &Expr, args: &[Expr]) -> TypeAndValue {
        let builtin = callee
            .unparen()
            .as_ident()
            .and_then(|ident| self.info.uses.get(&ident.id))
            .and_then(|obj| match self.info.object(*obj).kind {
                ObjectKind::BuiltIn(builtin) => Some(builtin),
                _ => None,
            });
        let arg_tvs: Vec<TypeAndValue> = args.iter().map(|a| self.check_expr(a)).collect();
        let first = arg_tvs.first().map(|tv| tv.ty).unwrap_or(TypeId::INVALID);
        let Some(builtin) = builtin else {
            return TypeAndValue::INVALID;
        };
        let no_value = TypeAndValue {
            mode: Mode::NoValue,
            ty: TypeId::INVALID,
        };
        match builtin {
            Builtin::Append | Builtin::Make => TypeAndValue::value(first),
            Builtin::New => TypeAndValue::value(self.info.types.pointer(first)),
            Builtin::Cap | Builtin::Len | Builtin::Copy => {
                TypeAndValue::value(self.info.types.basic(BasicKind::Int))
            }
            Builtin::Complex => TypeAndValue::value(self.info.types.basic(BasicKind::Complex128)),
            Builtin::Real | Builtin::Imag => {
                TypeAndValue::value(self.info.types.basic(BasicKind::Float64))
            }
            Builtin::Max | Builtin::Min => {
                let typed = arg_tvs
                    .iter()
                    .map(|tv| tv.ty)
                    .find(|ty| !self.info.basic(*ty).is_some_and(|k| k.is_untyped()));
                let mode = if arg_tvs.iter().all(|tv| tv.mode == Mode::Constant) {
                    Mode::Constant
                } else {
                    Mode::Value
                };
                TypeAndValue {
                    mode,
                    ty: typed.unwrap_or(first),
                }
            }
            Builtin::Recover => {
                let any = self
                    .info
                    .universe_lookup("any")
                    .map(|obj| self.info.object(obj).ty)
                    .unwrap_or(TypeId::INVALID);
                TypeAndValue::value(any)
            }
            Builtin::Clear
            | Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println => no_value,
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr) -> TypeAndValue {
        let x = self.check_expr(operand);
        match op {
            UnaryOp::Deref if x.mode == Mode::Type => TypeAndValue {
                mode: Mode::Type,
                ty: self.info.types.pointer(x.ty),
            },
            UnaryOp::Deref => match self.info.ty(self.info.underlying(x.ty)) {
                Type::Pointer(elem) => TypeAndValue {
                    mode: Mode::Variable,
                    ty: *elem,
                },
                _ => TypeAndValue::INVALID,
            },
            UnaryOp::AddrOf => TypeAndValue::value(self.info.types.pointer(x.ty)),
            UnaryOp::Recv => match self.info.ty(self.info.underlying(x.ty)) {
                Type::Chan { elem, .. } => TypeAndValue::value(*elem),
                _ => TypeAndValue::INVALID,
            },
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot | UnaryOp::Not => TypeAndValue {
                mode: if x.mode == Mode::Constant {
                    Mode::Constant
                } else {
                    Mode::Value
                },
                ty: x.ty,
            },
        }
    }

    fn binary_result(&mut self, op: BinaryOp, l: TypeAndValue, r: TypeAndValue) -> TypeAndValue {
        let mode = if l.mode == Mode::Constant && r.mode == Mode::Constant {
            Mode::Constant
        } else {
            Mode::Value
        };
        if op.is_comparison() {
            return TypeAndValue {
                mode,
                ty: self.info.types.basic(BasicKind::UntypedBool),
            };
        }
        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            return TypeAndValue { mode, ty: l.ty };
        }
        let untyped = |ty: TypeId| self.info.basic(ty).filter(|k| k.is_untyped());
        let ty = match (untyped(l.ty), untyped(r.ty)) {
            (Some(a), Some(b)) if b.untyped_rank() > a.untyped_rank() => r.ty,
            (Some(_), None) if !r.ty.is_invalid() => r.ty,
            _ => l.ty,
        };
        TypeAndValue { mode, ty }
    }

    fn index_result(&self, ty: TypeId) -> TypeAndValue {
        let base = self.info.underlying(ty);
        let (base, _) = self.info.deref(base);
        let base = self.info.underlying(base);
        match self.info.ty(base) {
            Type::Slice(elem) | Type::Array { elem, .. } => TypeAndValue {
                mode: Mode::Variable,
                ty: *elem,
            },
            Type::Map { value, .. } => TypeAndValue::value(*value),
            Type::Basic(BasicKind::String | BasicKind::UntypedString) => {
                TypeAndValue::value(self.info.types.basic(BasicKind::Uint8))
            }
            _ => TypeAndValue::INVALID,
        }
    }

    fn slice_result(&mut self, ty: TypeId) -> TypeId {
        let base = self.info.underlying(ty);
        let (inner, _) = self.info.deref(base);
        let inner = self.info.underlying(inner);
        match self.info.ty(inner) {
            Type::Basic(BasicKind::UntypedString) => self.info.types.basic(BasicKind::String),
            Type::Basic(BasicKind::String) | Type::Slice(_) => ty,
            Type::Array { elem, .. } => {
                let elem = *elem;
                self.info.types.slice(elem)
            }
            _ => TypeId::INVALID,
        }
    }

    fn check_composite(
        &mut self,
        ty: Option<&TypeExpr>,
        elements: &[Element],
        hint: Option<TypeId>,
    ) -> TypeAndValue {
        let lit_ty = match ty {
            Some(ty) => self.resolve_type(ty),
            None => hint.unwrap_or(TypeId::INVALID),
        };
        // An elided `&T{...}` inside `[]*T{...}`
        let base = if ty.is_none() {
            self.info.deref(lit_ty).0
        } else {
            lit_ty
        };
        let base = self.underlying_of(base);

        match self.info.ty(base).clone() {
            Type::Struct { fields } => {
                for (i, element) in elements.iter().enumerate() {
                    let field = match &element.key {
                        Some(key) => match key.as_ident() {
                            Some(ident) => {
                                let field = fields
                                    .iter()
                                    .copied()
                                    .find(|f| self.info.object(*f).name == ident.name);
                                if let Some(field) = field {
                                    self.info.uses.insert(ident.id, field);
                                }
                                field
                            }
                            None => {
                                self.check_expr(key);
                                None
                            }
                        },
                        None => fields.get(i).copied(),
                    };
                    let field_ty = field.map(|f| self.info.object(f).ty);
                    self.check_expr_with_hint(&element.value, field_ty);
                }
            }
            Type::Slice(elem) | Type::Array { elem, .. } => {
                for element in elements {
                    if let Some(key) = &element.key {
                        self.check_expr(key);
                    }
                    self.check_expr_with_hint(&element.value, Some(elem));
                }
            }
            Type::Map { key, value } => {
                for element in elements {
                    if let Some(k) = &element.key {
                        self.check_expr_with_hint(k, Some(key));
                    }
                    self.check_expr_with_hint(&element.value, Some(value));
                }
            }
            _ => {
                for element in elements {
                    if let Some(key) = &element.key {
                        self.check_expr(key);
                    }
                    self.check_expr(&element.value);
                }
            }
        }
        TypeAndValue::value(lit_ty)
    }

    /// Types for `n` names assigned from `values`, including the
    /// single-call and comma-ok forms
    pub(super) fn assign_types(&mut self, values: &[Expr], n: usize) -> Vec<TypeId> {
        if values.len() == n {
            return values.iter().map(|v| self.check_expr(v).ty).collect();
        }
        if let [value] = values {
            let tv = self.check_expr(value);
            if let Type::Tuple(elems) = self.info.ty(tv.ty) {
                let mut elems = elems.clone();
                elems.resize(n, TypeId::INVALID);
                return elems;
            }
            if n == 2 && is_comma_ok(value) {
                return vec![tv.ty, self.info.types.basic(BasicKind::Bool)];
            }
        } else {
            for value in values {
                self.check_expr(value);
            }
        }
        vec![TypeId::INVALID; n]
    }

    /// The type a variable initialized from an untyped constant gets
    pub(super) fn default_type(&self, ty: TypeId) -> TypeId {
        match self.info.basic(ty) {
            Some(kind) if kind.is_untyped() && kind != BasicKind::UntypedNil => {
                self.info.types.basic(kind.default_kind())
            }
            _ => ty,
        }
    }
}

fn is_comma_ok(expr: &Expr) -> bool {
    matches!(
        expr.unparen().kind,
        ExprKind::Index { .. }
            | ExprKind::TypeAssert { ty: Some(_), .. }
            | ExprKind::Unary {
                op: UnaryOp::Recv,
                ..
            }
    )
}
