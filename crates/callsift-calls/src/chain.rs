//! Selector chain decomposition
//!
//! `a.b.c.d` is decomposed innermost first: the identifier `a` is the root,
//! then every level contributes the embedded fields the oracle walked
//! through (promoted hops) followed by the member named in the source. The
//! last named member is the terminal.

use callsift_ast::{Expr, ExprKind, Ident, Span};
use callsift_types::{ObjectClass, ObjectId, ObjectKind, TypeId, TypeInfo};
use serde::Serialize;

/// What the left-most operand of a chain denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RootKind {
    Package,
    /// A variable, parameter, constant or field value
    Variable,
    /// A type name, as in the method expression `T.m`
    TypeName,
    /// Anything that is not an identifier: a call result, an index, `(*T)`
    Expression,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRoot {
    /// Identifier text; empty for an `Expression` root
    pub name: String,
    pub span: Span,
    pub kind: RootKind,
    #[serde(skip)]
    pub object: Option<ObjectId>,
    #[serde(skip)]
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    Field,
    Method,
    Function,
    Variable,
    Constant,
    TypeName,
}

impl MemberKind {
    fn of(kind: &ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::Field { .. } => Some(MemberKind::Field),
            ObjectKind::Method { .. } => Some(MemberKind::Method),
            ObjectKind::Function => Some(MemberKind::Function),
            ObjectKind::Variable { .. } => Some(MemberKind::Variable),
            ObjectKind::Constant | ObjectKind::Nil => Some(MemberKind::Constant),
            ObjectKind::TypeName => Some(MemberKind::TypeName),
            ObjectKind::Package { .. } | ObjectKind::BuiltIn(_) => None,
        }
    }
}

/// One step of a chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hop {
    pub name: String,
    /// The type (or package) the member was found on, e.g. `main.Outer`
    pub declaring_type: String,
    pub member: MemberKind,
    /// An embedded field the source does not name
    pub is_promoted: bool,
    #[serde(skip)]
    pub object: ObjectId,
    /// Span of the selector that produced this hop
    pub span: Span,
}

/// Where and why decomposition stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Truncation {
    pub name: String,
    pub span: Span,
    pub ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorChain {
    pub root: ChainRoot,
    pub hops: Vec<Hop>,
    pub terminal: Option<Hop>,
    /// Some level could not be resolved; `hops` and `terminal` stop before it
    pub incomplete: bool,
    pub truncated_at: Option<Truncation>,
}

impl SelectorChain {
    fn new(root: ChainRoot) -> Self {
        let incomplete = root.kind == RootKind::Unresolved;
        let truncated_at = incomplete.then(|| Truncation {
            name: root.name.clone(),
            span: root.span,
            ambiguous: false,
        });
        Self {
            root,
            hops: Vec::new(),
            terminal: None,
            incomplete,
            truncated_at,
        }
    }

    fn truncate(&mut self, name: &str, span: Span, ambiguous: bool) {
        self.incomplete = true;
        self.truncated_at = Some(Truncation {
            name: name.to_string(),
            span,
            ambiguous,
        });
    }

    /// Promoted hops anywhere in the chain
    pub fn promoted_hops(&self) -> impl Iterator<Item = &Hop> {
        self.hops.iter().filter(|hop| hop.is_promoted)
    }

    /// Dotted form with promoted hops in brackets: `o.[Inner].Bump`
    pub fn display(&self) -> String {
        let mut out = if self.root.name.is_empty() {
            "(expr)".to_string()
        } else {
            self.root.name.clone()
        };
        for hop in self.hops.iter().chain(&self.terminal) {
            out.push('.');
            if hop.is_promoted {
                out.push_str(&format!("[{}]", hop.name));
            } else {
                out.push_str(&hop.name);
            }
        }
        if self.incomplete {
            out.push_str(".?");
        }
        out
    }
}

/// Decompose a selector expression into its chain
pub fn decompose(expr: &Expr, info: &TypeInfo) -> SelectorChain {
    let expr = expr.unparen();
    let ExprKind::Selector { operand, member } = &expr.kind else {
        return SelectorChain::new(root_of(expr, info));
    };

    let mut chain = match &operand.unparen().kind {
        ExprKind::Selector { .. } => decompose(operand, info),
        _ => SelectorChain::new(root_of(operand, info)),
    };
    if chain.incomplete {
        return chain;
    }
    if let Some(previous) = chain.terminal.take() {
        chain.hops.push(previous);
    }

    if chain.root.kind == RootKind::Package && chain.hops.is_empty() {
        package_member(&mut chain, expr, member, info);
    } else {
        selected_member(&mut chain, expr, member, info);
    }
    chain
}

fn root_of(expr: &Expr, info: &TypeInfo) -> ChainRoot {
    let ty = info.type_of(expr);
    match &expr.kind {
        ExprKind::Ident(ident) => ident_root(ident, ty, info),
        _ => ChainRoot {
            name: String::new(),
            span: expr.span,
            kind: RootKind::Expression,
            object: None,
            ty,
        },
    }
}

fn ident_root(ident: &Ident, ty: Option<TypeId>, info: &TypeInfo) -> ChainRoot {
    let kind = match info.object_kind(ident) {
        ObjectClass::Package => RootKind::Package,
        ObjectClass::Variable | ObjectClass::Field | ObjectClass::Constant => RootKind::Variable,
        ObjectClass::TypeName => RootKind::TypeName,
        ObjectClass::Function | ObjectClass::Method | ObjectClass::BuiltIn => {
            RootKind::Expression
        }
        ObjectClass::Unresolved => RootKind::Unresolved,
    };
    ChainRoot {
        name: ident.name.clone(),
        span: ident.span,
        kind,
        object: info.object_of(ident),
        ty,
    }
}

/// `pkg.Name`: the member is a package-level declaration
fn package_member(chain: &mut SelectorChain, expr: &Expr, member: &Ident, info: &TypeInfo) {
    let found = info.uses.get(&member.id).copied().and_then(|obj| {
        let kind = MemberKind::of(&info.object(obj).kind)?;
        Some((obj, kind))
    });
    let Some((object, kind)) = found else {
        chain.truncate(&member.name, member.span, false);
        return;
    };
    let declaring_type = info
        .package_path_of(object)
        .unwrap_or(&chain.root.name)
        .to_string();
    chain.terminal = Some(Hop {
        name: member.name.clone(),
        declaring_type,
        member: kind,
        is_promoted: false,
        object,
        span: expr.span,
    });
}

/// `x.f`: a field or method, possibly promoted through embedded fields
fn selected_member(chain: &mut SelectorChain, expr: &Expr, member: &Ident, info: &TypeInfo) {
    let Some(selection) = info.selection(expr) else {
        chain.truncate(&member.name, member.span, info.is_ambiguous(expr));
        return;
    };

    let mut current = selection.recv;
    for field in &selection.path {
        let object = info.object(*field);
        chain.hops.push(Hop {
            name: object.name.clone(),
            declaring_type: type_label(info, current),
            member: MemberKind::Field,
            is_promoted: true,
            object: *field,
            span: expr.span,
        });
        current = object.ty;
    }

    let object = info.object(selection.object);
    let Some(kind) = MemberKind::of(&object.kind) else {
        chain.truncate(&member.name, member.span, false);
        return;
    };
    chain.terminal = Some(Hop {
        name: member.name.clone(),
        declaring_type: type_label(info, current),
        member: kind,
        is_promoted: false,
        object: selection.object,
        span: expr.span,
    });
}

fn type_label(info: &TypeInfo, ty: TypeId) -> String {
    let (base, _) = info.deref(ty);
    info.display_type(base)
}
