//! The rule interface: a match predicate plus a replacement template

use callsift_ast::{print_expr, Expr, ExprKind};
use callsift_calls::CallSite;
use callsift_types::{ObjectId, TypeId, TypeInfo};

/// Everything a rule may inspect about one call site
pub struct MatchContext<'a> {
    pub site: &'a CallSite,
    pub call: &'a Expr,
    pub info: &'a TypeInfo,
    /// Text of the unit containing the call
    pub source: &'a str,
}

impl<'a> MatchContext<'a> {
    pub fn callee(&self) -> Option<&'a Expr> {
        match &self.call.kind {
            ExprKind::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    pub fn args(&self) -> &'a [Expr] {
        match &self.call.kind {
            ExprKind::Call { args, .. } => args,
            _ => &[],
        }
    }

    /// `f(xs...)`
    pub fn has_ellipsis(&self) -> bool {
        matches!(self.call.kind, ExprKind::Call { ellipsis: true, .. })
    }

    /// Static type of argument `index`
    pub fn arg_type(&self, index: usize) -> Option<TypeId> {
        self.args().get(index).and_then(|arg| self.info.type_of(arg))
    }

    /// The function or method the call resolved to
    pub fn callee_object(&self) -> Option<ObjectId> {
        self.site.callee
    }

    /// Source text of the whole call
    pub fn text(&self) -> String {
        print_expr(self.call, self.source)
    }
}

/// Replacement for a matched call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTemplate {
    pub callee: CalleeTemplate,
    pub args: Vec<ArgTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalleeTemplate {
    /// Replace the selected name and keep whatever qualifies it, so
    /// `f.Println` with `f` an import alias becomes `f.Printf`
    SameQualifier(String),
    /// A bare function name
    Ident(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgTemplate {
    /// Literal source text, such as `"%d"`
    Literal(String),
    /// The original argument at this position, copied unchanged
    Original(usize),
}

/// A declarative rewrite. Rules are stateless; the engine calls
/// [`RewriteRule::rewrite`] once per classified call site.
pub trait RewriteRule {
    fn name(&self) -> &str;

    /// The replacement for this call, or `None` when the rule does not
    /// apply. A rule must not match its own output.
    fn rewrite(&self, cx: &MatchContext<'_>) -> Option<CallTemplate>;
}
