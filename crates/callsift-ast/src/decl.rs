//! Declaration AST nodes (top-level items)

use serde::{Deserialize, Serialize};
use crate::{Block, Expr, FuncType, Ident, Span, TypeExpr, TypeExprKind};

/// A parsed source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl File {
    /// Iterate over function and method declarations
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            Decl::Gen(_) => None,
        })
    }
}

/// `import alias "path"`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Explicit name: an alias, `_` or `.`
    pub alias: Option<Ident>,
    /// Unquoted import path
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The default local name: the last path element
    pub fn default_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A top-level declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

/// Function or method declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub ty: FuncType,
    /// `None` for declarations without a body
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

/// Method receiver: `(ms MyStruct)` or `(a *A)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

impl Receiver {
    /// Base type name and whether the receiver is a pointer
    pub fn base_type(&self) -> Option<(&Ident, bool)> {
        let mut ty = &self.ty;
        let mut pointer = false;
        loop {
            match &ty.kind {
                TypeExprKind::Paren(inner) => ty = inner,
                TypeExprKind::Pointer(inner) if !pointer => {
                    pointer = true;
                    ty = inner;
                }
                TypeExprKind::Name(name) => return Some((name, pointer)),
                _ => return None,
            }
        }
    }
}

/// `var`, `const` or `type` declaration, possibly grouped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GenDecl {
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
    Type(Vec<TypeSpec>),
}

/// `a, b int = 1, 2`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// `type T struct { ... }` or alias `type T = U`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}
