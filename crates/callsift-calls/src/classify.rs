//! Call classification
//!
//! Every call expression gets exactly one [`CallKind`]. The decision is made
//! from the objects the oracle resolved, never from how names look.

use callsift_ast::visit::{self, Visitor};
use callsift_ast::{Expr, ExprKind, FileId, FuncDecl, NodeId, Span, SyntaxUnit};
use callsift_types::{Mode, ObjectId, ObjectKind, TypeInfo};
use serde::{Deserialize, Serialize};

use crate::chain::{decompose, MemberKind, RootKind, SelectorChain};
use crate::{Diagnostic, FuncRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Qualified call into an imported package: `fmt.Println(x)`
    PackageFunction,
    /// `len`, `append` and the other universe functions
    BuiltIn,
    /// Unqualified call to a function of an analyzed package
    LocalFunction,
    /// A concrete method selected on a value, at any promotion depth
    InstanceMethod,
    Unknown,
}

impl CallKind {
    pub fn name(&self) -> &'static str {
        match self {
            CallKind::PackageFunction => "package-function",
            CallKind::BuiltIn => "builtin",
            CallKind::LocalFunction => "local-function",
            CallKind::InstanceMethod => "instance-method",
            CallKind::Unknown => "unknown",
        }
    }
}

/// Why a call could not be attributed to a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnknownReason {
    /// The callee name has no object
    Unresolved,
    /// A level of the selector chain has no object
    IncompleteChain,
    /// Method of an interface-typed value; the concrete receiver is not
    /// statically known
    InterfaceDispatch,
    /// A variable, field or result of function type
    FuncValue,
    /// An immediately invoked function literal
    FuncLiteral,
    /// A type conversion, which only looks like a call
    Conversion,
}

impl UnknownReason {
    pub fn describe(&self) -> &'static str {
        match self {
            UnknownReason::Unresolved => "no declaration found",
            UnknownReason::IncompleteChain => "selector chain could not be resolved",
            UnknownReason::InterfaceDispatch => "interface method with no statically known receiver",
            UnknownReason::FuncValue => "call through a function value",
            UnknownReason::FuncLiteral => "function literal",
            UnknownReason::Conversion => "type conversion",
        }
    }
}

/// A classified call expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSite {
    pub id: NodeId,
    pub file: FileId,
    pub span: Span,
    pub kind: CallKind,
    pub reason: Option<UnknownReason>,
    /// Absent for bare identifiers and other non-selector callees
    pub chain: Option<SelectorChain>,
    /// Declaration whose body contains the call; `None` at package level
    pub enclosing: Option<FuncRef>,
    #[serde(skip)]
    pub callee: Option<ObjectId>,
    pub args: Vec<NodeId>,
}

impl CallSite {
    pub fn is_unknown(&self) -> bool {
        self.kind == CallKind::Unknown
    }

    /// The declaration this call statically enters, if any
    pub fn target(&self, info: &TypeInfo) -> Option<FuncRef> {
        match self.kind {
            CallKind::LocalFunction | CallKind::PackageFunction | CallKind::InstanceMethod => {
                self.callee.and_then(|obj| FuncRef::from_object(info, obj))
            }
            CallKind::BuiltIn | CallKind::Unknown => None,
        }
    }

    /// The diagnostic an unknown call deserves, if any
    pub fn diagnostic(&self, callee_text: &str) -> Option<Diagnostic> {
        let reason = self.reason?;
        if let Some(truncated) = self.chain.as_ref().and_then(|c| c.truncated_at.as_ref()) {
            if truncated.ambiguous {
                return Some(Diagnostic::ambiguous(&truncated.name, self.file, truncated.span));
            }
        }
        match reason {
            UnknownReason::Unresolved
            | UnknownReason::IncompleteChain
            | UnknownReason::InterfaceDispatch
            | UnknownReason::FuncValue => Some(Diagnostic::unresolved(
                callee_text,
                reason.describe(),
                self.file,
                self.span,
            )),
            UnknownReason::FuncLiteral | UnknownReason::Conversion => None,
        }
    }
}

/// Classify one call expression
pub fn classify(call: &Expr, info: &TypeInfo, enclosing: Option<&FuncRef>) -> CallSite {
    let (callee, args) = match &call.kind {
        ExprKind::Call { callee, args, .. } => (callee.unparen(), args.as_slice()),
        _ => (call, &[][..]),
    };
    let (kind, reason, chain, object) = decide(callee, info);
    CallSite {
        id: call.id,
        file: call.id.file,
        span: call.span,
        kind,
        reason,
        chain,
        enclosing: enclosing.cloned(),
        callee: object,
        args: args.iter().map(|a| a.id).collect(),
    }
}

type Decision = (CallKind, Option<UnknownReason>, Option<SelectorChain>, Option<ObjectId>);

fn unknown(reason: UnknownReason, chain: Option<SelectorChain>) -> Decision {
    (CallKind::Unknown, Some(reason), chain, None)
}

fn decide(callee: &Expr, info: &TypeInfo) -> Decision {
    match &callee.kind {
        ExprKind::Ident(ident) => {
            let Some(obj) = info.object_of(ident) else {
                return unknown(UnknownReason::Unresolved, None);
            };
            let object = info.object(obj);
            match object.kind {
                ObjectKind::BuiltIn(_) => (CallKind::BuiltIn, None, None, Some(obj)),
                ObjectKind::Function => {
                    let analyzed = object
                        .package
                        .is_some_and(|pkg| info.package(pkg).analyzed);
                    // Dot-imported functions are the only unqualified calls
                    // into other packages
                    let kind = if analyzed {
                        CallKind::LocalFunction
                    } else {
                        CallKind::PackageFunction
                    };
                    (kind, None, None, Some(obj))
                }
                ObjectKind::TypeName => unknown(UnknownReason::Conversion, None),
                ObjectKind::Variable { .. } | ObjectKind::Field { .. } => {
                    unknown(UnknownReason::FuncValue, None)
                }
                _ => unknown(UnknownReason::Unresolved, None),
            }
        }
        ExprKind::Selector { .. } => {
            let chain = decompose(callee, info);
            selector_decision(chain, info)
        }
        ExprKind::FuncLit { .. } => unknown(UnknownReason::FuncLiteral, None),
        _ => match info.type_and_value(callee).map(|tv| tv.mode) {
            Some(Mode::Type) => unknown(UnknownReason::Conversion, None),
            Some(Mode::Builtin) => (CallKind::BuiltIn, None, None, None),
            Some(_) => unknown(UnknownReason::FuncValue, None),
            None => unknown(UnknownReason::Unresolved, None),
        },
    }
}

fn selector_decision(chain: SelectorChain, info: &TypeInfo) -> Decision {
    if chain.incomplete {
        return unknown(UnknownReason::IncompleteChain, Some(chain));
    }
    let Some(terminal) = chain.terminal.as_ref() else {
        return unknown(UnknownReason::IncompleteChain, Some(chain));
    };
    let object = terminal.object;

    // Any complete chain rooted at a package is a package call, whether the
    // terminal is the function itself, a method on a package variable or a
    // function-valued variable. Only qualified types are conversions.
    if chain.root.kind == RootKind::Package {
        return match terminal.member {
            MemberKind::TypeName => unknown(UnknownReason::Conversion, Some(chain)),
            _ => (CallKind::PackageFunction, None, Some(chain), Some(object)),
        };
    }

    match (terminal.member, info.object(object).kind) {
        (
            MemberKind::Method,
            ObjectKind::Method {
                interface: true, ..
            },
        ) => unknown(UnknownReason::InterfaceDispatch, Some(chain)),
        (MemberKind::Method, _) => (CallKind::InstanceMethod, None, Some(chain), Some(object)),
        (MemberKind::TypeName, _) => unknown(UnknownReason::Conversion, Some(chain)),
        _ => unknown(UnknownReason::FuncValue, Some(chain)),
    }
}

/// Every call site of a unit, with diagnostics for the unknown ones
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub sites: Vec<CallSite>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    pub fn count(&self, kind: CallKind) -> usize {
        self.sites.iter().filter(|s| s.kind == kind).count()
    }

    pub fn site(&self, id: NodeId) -> Option<&CallSite> {
        self.sites.iter().find(|s| s.id == id)
    }
}

/// Classify every call in a unit, including calls nested in arguments and
/// in function literals. Calls inside a literal belong to the declaration
/// that contains the literal.
#[tracing::instrument(skip_all, fields(file = %unit.name))]
pub fn classify_unit(unit: &SyntaxUnit, info: &TypeInfo) -> Classification {
    let mut walker = UnitWalker {
        unit,
        info,
        enclosing: None,
        out: Classification::default(),
    };
    walker.visit_file(&unit.file);
    let out = walker.out;
    tracing::debug!(
        sites = out.sites.len(),
        unknown = out.count(CallKind::Unknown),
        "classified calls"
    );
    out
}

struct UnitWalker<'a> {
    unit: &'a SyntaxUnit,
    info: &'a TypeInfo,
    enclosing: Option<FuncRef>,
    out: Classification,
}

impl<'ast> Visitor<'ast> for UnitWalker<'_> {
    fn visit_func_decl(&mut self, func: &'ast FuncDecl) {
        let previous = self
            .enclosing
            .replace(FuncRef::declared(self.info, self.unit, func));
        visit::walk_func_decl(self, func);
        self.enclosing = previous;
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let ExprKind::Call { callee, .. } = &expr.kind {
            let site = classify(expr, self.info, self.enclosing.as_ref());
            tracing::trace!(span = ?site.span, kind = site.kind.name(), "call site");
            let text = callsift_ast::print_expr(callee, &self.unit.source);
            if let Some(diagnostic) = site.diagnostic(&text) {
                self.out.diagnostics.push(diagnostic);
            }
            self.out.sites.push(site);
        }
        visit::walk_expr(self, expr);
    }
}
