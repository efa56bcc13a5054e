//! Type expressions to resolved types

use callsift_ast::{ExprKind, FuncType, InterfaceElem, LitKind, TypeExpr, TypeExprKind};

use super::Checker;
use crate::{
    CheckError, Mode, Object, ObjectId, ObjectKind, Signature, Type, TypeAndValue, TypeId,
};

impl Checker<'_> {
    pub(super) fn resolve_type(&mut self, ty: &TypeExpr) -> TypeId {
        let resolved = match &ty.kind {
            TypeExprKind::Name(ident) => match self.lookup(&ident.name) {
                Some(obj) => {
                    self.info.uses.insert(ident.id, obj);
                    self.type_name_type(obj, &ident.name, ty)
                }
                None => {
                    let error = CheckError::UndefinedName {
                        name: ident.name.clone(),
                        file: self.file_id(),
                        span: ident.span,
                    };
                    self.error(error);
                    TypeId::INVALID
                }
            },
            TypeExprKind::Qualified { package, name } => {
                let full = format!("{}.{}", package.name, name.name);
                match self.package_member(package, name) {
                    Some(obj) => self.type_name_type(obj, &full, ty),
                    None => {
                        let error = CheckError::UndefinedName {
                            name: full,
                            file: self.file_id(),
                            span: ty.span,
                        };
                        self.error(error);
                        TypeId::INVALID
                    }
                }
            }
            TypeExprKind::Pointer(elem) => {
                let elem = self.resolve_type(elem);
                self.info.types.pointer(elem)
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type(elem);
                self.info.types.slice(elem)
            }
            TypeExprKind::Array { len, elem } => {
                let len = len.as_deref().and_then(|len| {
                    self.check_expr(len);
                    match &len.kind {
                        ExprKind::BasicLit(lit) if lit.kind == LitKind::Int => {
                            parse_int_literal(&lit.raw)
                        }
                        _ => None,
                    }
                });
                let elem = self.resolve_type(elem);
                self.info.types.intern(Type::Array { len, elem })
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type(key);
                let value = self.resolve_type(value);
                self.info.types.intern(Type::Map { key, value })
            }
            TypeExprKind::Chan { dir, elem } => {
                let elem = self.resolve_type(elem);
                self.info.types.intern(Type::Chan { dir: *dir, elem })
            }
            TypeExprKind::Func(func) => self.signature(func),
            TypeExprKind::Struct(st) => {
                let mut fields = Vec::new();
                for field in &st.fields {
                    let field_ty = self.resolve_type(&field.ty);
                    if let Some(name) = field.embedded_name() {
                        let obj = self.new_field(name, field_ty, true);
                        fields.push(obj);
                    }
                    for name in &field.names {
                        let obj = self.new_field(name, field_ty, false);
                        fields.push(obj);
                    }
                }
                self.info.types.insert(Type::Struct { fields })
            }
            TypeExprKind::Interface(iface) => {
                let id = self.info.types.insert(Type::Interface {
                    methods: Vec::new(),
                    embedded: Vec::new(),
                });
                let mut methods = Vec::new();
                let mut embedded = Vec::new();
                for elem in &iface.elems {
                    match elem {
                        InterfaceElem::Method { name, ty } => {
                            let sig = self.signature(ty);
                            let obj = self.new_object(
                                name,
                                ObjectKind::Method {
                                    recv: id,
                                    pointer: false,
                                    interface: true,
                                },
                                sig,
                            );
                            methods.push(obj);
                        }
                        InterfaceElem::Embedded(ty) => embedded.push(self.resolve_type(ty)),
                    }
                }
                if let Some(Type::Interface {
                    methods: m,
                    embedded: e,
                }) = self.info.types.get_mut(id)
                {
                    *m = methods;
                    *e = embedded;
                }
                id
            }
            TypeExprKind::Paren(inner) => self.resolve_type(inner),
        };
        self.info.expr_types.insert(
            ty.id,
            TypeAndValue {
                mode: Mode::Type,
                ty: resolved,
            },
        );
        resolved
    }

    /// The type a type name denotes, reporting names that are not types
    fn type_name_type(&mut self, obj: ObjectId, name: &str, ty: &TypeExpr) -> TypeId {
        if self.info.object(obj).kind != ObjectKind::TypeName {
            let error = CheckError::NotAType {
                name: name.to_string(),
                file: self.file_id(),
                span: ty.span,
            };
            self.error(error);
            return TypeId::INVALID;
        }
        if self.info.object(obj).ty.is_invalid() {
            self.ensure(obj);
        }
        self.info.object(obj).ty
    }

    fn new_field(&mut self, name: &callsift_ast::Ident, ty: TypeId, embedded: bool) -> ObjectId {
        let site = self.site(name.span);
        let obj = self.info.add_object(Object {
            name: name.name.clone(),
            kind: ObjectKind::Field { embedded },
            package: Some(self.pkg),
            ty,
            site,
        });
        if !embedded {
            self.info.defs.insert(name.id, obj);
        }
        obj
    }

    pub(super) fn signature(&mut self, func: &FuncType) -> TypeId {
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = self.resolve_type(&param.ty);
            if param.variadic {
                params.push(self.info.types.slice(ty));
            } else {
                params.push(ty);
            }
        }
        let results = func
            .results
            .iter()
            .map(|r| self.resolve_type(&r.ty))
            .collect();
        self.info.types.intern(Type::Signature(Signature {
            params,
            results,
            variadic: func.is_variadic(),
        }))
    }
}

/// Value of a Go integer literal: decimal, hex, octal or binary, `_` allowed
fn parse_int_literal(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        u64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_int_literal;

    #[test]
    fn test_int_literals() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("0o17"), Some(15));
        assert_eq!(parse_int_literal("017"), Some(15));
        assert_eq!(parse_int_literal("1_000"), Some(1000));
        assert_eq!(parse_int_literal("0"), Some(0));
    }
}
