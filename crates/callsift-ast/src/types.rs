//! Type expression AST nodes

use serde::{Deserialize, Serialize};
use crate::{Expr, Ident, NodeId, Span};

/// A type as written in source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
    pub id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeExprKind {
    /// Named type: `int`, `MyStruct`
    Name(Ident),

    /// Package-qualified type: `example.AnotherStruct`
    Qualified { package: Ident, name: Ident },

    /// Pointer: `*T`
    Pointer(Box<TypeExpr>),

    /// Slice: `[]T`
    Slice(Box<TypeExpr>),

    /// Array: `[4]T`, or `[...]T` when `len` is `None`
    Array {
        len: Option<Box<Expr>>,
        elem: Box<TypeExpr>,
    },

    /// Map: `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },

    /// Channel: `chan T`, `<-chan T`, `chan<- T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },

    /// Function type: `func(int) string`
    Func(FuncType),

    /// Struct type literal
    Struct(StructType),

    /// Interface type literal
    Interface(InterfaceType),

    /// Parenthesized type: `(T)`
    Paren(Box<TypeExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A function signature: parameters and results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub span: Span,
}

impl FuncType {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

/// A parameter or result: `a int`, `int`, `args ...string`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<FieldDecl>,
}

/// A struct field line: `a, b int`, or an embedded field `Base` / `*pkg.Base`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Empty for embedded fields
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub embedded: bool,
    pub tag: Option<String>,
    pub span: Span,
}

impl FieldDecl {
    /// The implicit field name of an embedded field (`T` for `*pkg.T`)
    pub fn embedded_name(&self) -> Option<&Ident> {
        if !self.embedded {
            return None;
        }
        let mut ty = &self.ty;
        loop {
            match &ty.kind {
                TypeExprKind::Pointer(inner) | TypeExprKind::Paren(inner) => ty = inner,
                TypeExprKind::Name(name) => return Some(name),
                TypeExprKind::Qualified { name, .. } => return Some(name),
                _ => return None,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceType {
    pub elems: Vec<InterfaceElem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InterfaceElem {
    /// Method specification: `Method1() int`
    Method { name: Ident, ty: FuncType },
    /// Embedded interface: `io.Reader`
    Embedded(TypeExpr),
}
