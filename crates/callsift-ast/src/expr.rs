//! Expression AST nodes

use serde::{Deserialize, Serialize};
use crate::{Block, FuncType, Ident, NodeId, Span, TypeExpr};

/// An expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub id: NodeId,
    /// Created by a rewrite rather than by the parser. The span of a
    /// synthetic node is the span of the source text it replaced.
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Identifier: `x`, `fmt`, `append`. The ident shares the expression's id.
    Ident(Ident),

    /// Literal: `42`, `"hello"`, `'a'`, `1.5`
    BasicLit(BasicLit),

    /// Composite literal: `MyStruct{field1: 1}`, `[]int{1, 2}`, or an
    /// elided inner literal `{1, 2}` when `ty` is `None`
    CompositeLit {
        ty: Option<TypeExpr>,
        elements: Vec<Element>,
    },

    /// Function literal: `func() { ... }`
    FuncLit { ty: FuncType, body: Block },

    /// Parenthesized expression: `(x)`
    Paren(Box<Expr>),

    /// Selector: `x.y`
    Selector { operand: Box<Expr>, member: Ident },

    /// Index: `a[i]`
    Index { operand: Box<Expr>, index: Box<Expr> },

    /// Slice expression: `a[lo:hi]`, `a[lo:hi:max]`
    Slice {
        operand: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },

    /// Type assertion: `x.(T)`, or `x.(type)` in a type switch when `ty` is `None`
    TypeAssert {
        operand: Box<Expr>,
        ty: Option<TypeExpr>,
    },

    /// Call: `f(a, b)`, `f(xs...)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },

    /// Unary operation: `-x`, `!ok`, `&v`, `*p`, `<-ch`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation: `a + b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// A type in expression position: `[]byte(s)`, `make(map[string]int)`
    Type(TypeExpr),
}

impl Expr {
    /// Strip any number of enclosing parentheses
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }
}

/// A literal value, kept as written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicLit {
    pub kind: LitKind,
    /// Source text including quotes and prefixes
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

/// An element of a composite literal: `value` or `key: value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Deref,
    AddrOf,
    Recv,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Bitwise
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,

    // Logical
    LogAnd,
    LogOr,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Binding strength, 5 binds tightest
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::LogOr => 1,
            BinaryOp::LogAnd => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }
}
