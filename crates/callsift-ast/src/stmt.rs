//! Statement AST nodes

use serde::{Deserialize, Serialize};
use crate::{Expr, GenDecl, Ident, Span, TypeExpr};

/// A block of statements: `{ ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// Empty statement (a lone `;`)
    Empty,

    /// Expression statement: `foo()`
    Expr(Expr),

    /// Channel send: `c <- 3`
    Send { channel: Expr, value: Expr },

    /// `x++` or `x--`
    IncDec { target: Expr, inc: bool },

    /// Assignment: `a = b`, `a, b = b, a`, `x += 1`
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },

    /// Short variable declaration: `a, b := f()`
    Define { names: Vec<Ident>, values: Vec<Expr> },

    /// Local `var`, `const` or `type` declaration
    Decl(GenDecl),

    /// `go f()`
    Go(Expr),

    /// `defer f()`
    Defer(Expr),

    /// `return a, b`
    Return(Vec<Expr>),

    /// `break`, `continue`, `goto L`, `fallthrough`
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },

    /// Nested block
    Block(Block),

    /// `if init; cond { ... } else ...`
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then_branch: Block,
        /// Either another `If` or a `Block`
        else_branch: Option<Box<Stmt>>,
    },

    /// `for init; cond; post { ... }`, `for cond { ... }`, `for { ... }`
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },

    /// `for k, v := range x { ... }`
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        /// `:=` rather than `=`
        define: bool,
        subject: Expr,
        body: Block,
    },

    /// Expression switch
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },

    /// Type switch: `switch v := x.(type) { ... }`
    TypeSwitch {
        init: Option<Box<Stmt>>,
        binding: Option<Ident>,
        subject: Expr,
        clauses: Vec<TypeCaseClause>,
    },

    /// `select { ... }`
    Select { clauses: Vec<CommClause> },

    /// `label: stmt`
    Labeled { label: Ident, stmt: Box<Stmt> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

/// `case a, b:` or `default:` when `exprs` is `None`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseClause {
    pub exprs: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `case int, string:` or `default:` when `types` is `None`.
/// `nil` cases are recorded as the type name `nil`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCaseClause {
    pub types: Option<Vec<TypeExpr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `case v := <-c:`, `case c <- v:` or `default:` when `comm` is `None`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommClause {
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}
