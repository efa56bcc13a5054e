//! Rewrite engine
//!
//! Rewriting runs in three phases over one unit:
//!
//! 1. **Plan**: classify every call and ask each rule for a template.
//!    Nothing is mutated, so rules see the tree exactly as it was checked.
//! 2. **Allocate**: reserve node ids for every node the plans will create.
//! 3. **Apply**: a post-order pass swaps each planned call for a synthetic
//!    one, moving the original qualifier and arguments into it.
//!
//! A call matched by more than one rule is left alone and reported.

use std::collections::HashMap;

use callsift_ast::visit::{self, Visitor, VisitorMut};
use callsift_ast::{
    print_expr, BasicLit, Expr, ExprKind, Ident, LitKind, NodeId, Span, SyntaxUnit,
};
use callsift_calls::{classify_unit, Diagnostic};
use callsift_types::TypeInfo;
use serde::Serialize;

use crate::rule::{ArgTemplate, CallTemplate, CalleeTemplate, MatchContext, RewriteRule};

/// One replaced call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub rule: String,
    /// Span of the replaced call in the text the unit was parsed from
    pub span: Span,
    pub before: String,
    pub after: String,
}

/// Result of rewriting one unit
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteOutcome {
    pub rewritten: usize,
    pub changes: Vec<Change>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RewriteOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.rewritten == 0
    }

    pub fn merge(&mut self, other: RewriteOutcome) {
        self.rewritten += other.rewritten;
        self.changes.extend(other.changes);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Apply a single rule to `unit`
pub fn apply(rule: &dyn RewriteRule, unit: &mut SyntaxUnit, info: &TypeInfo) -> RewriteOutcome {
    apply_all(&[rule], unit, info)
}

/// Apply `rules` to `unit` in one pass. `info` must describe the tree as
/// it is now; after a pass with changes the unit has to be re-rendered and
/// re-checked before it is rewritten again.
///
/// A rewritten call is printed from its template: kept arguments are copied
/// from their own spans, and comments between them (or before the closing
/// parenthesis) are not carried over. Text outside rewritten calls is never
/// touched.
#[tracing::instrument(skip_all, fields(unit = %unit.name, rules = rules.len()))]
pub fn apply_all(
    rules: &[&dyn RewriteRule],
    unit: &mut SyntaxUnit,
    info: &TypeInfo,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();
    let mut plans = plan(rules, unit, info, &mut outcome.diagnostics);
    if plans.is_empty() {
        return outcome;
    }

    for plan in plans.values_mut() {
        plan.ids = (0..plan.nodes_needed()).map(|_| unit.fresh_id()).collect();
    }

    let SyntaxUnit { file, source, .. } = unit;
    let mut rewriter = Rewriter {
        plans,
        source: source.as_str(),
        changes: Vec::new(),
    };
    visit::walk_file_mut(&mut rewriter, file);

    for (id, plan) in &rewriter.plans {
        tracing::warn!(call = %id, rule = %plan.rule, "planned call was not found in the tree");
    }
    let mut changes = rewriter.changes;
    changes.sort_by_key(|c| c.span.start);
    outcome.rewritten = changes.len();
    outcome.changes = changes;
    tracing::debug!(rewritten = outcome.rewritten, "rewrite pass complete");
    outcome
}

/// A rule's decision for one call
#[derive(Debug)]
struct Plan {
    rule: String,
    template: CallTemplate,
    before: String,
    /// The new callee keeps the call's selector qualifier
    qualified: bool,
    ids: Vec<NodeId>,
}

impl Plan {
    /// Call, callee name, optional selector, one per literal argument
    fn nodes_needed(&self) -> usize {
        let selector = self.qualified as usize;
        let literals = self
            .template
            .args
            .iter()
            .filter(|a| matches!(a, ArgTemplate::Literal(_)))
            .count();
        2 + selector + literals
    }
}

fn plan(
    rules: &[&dyn RewriteRule],
    unit: &SyntaxUnit,
    info: &TypeInfo,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<NodeId, Plan> {
    let classification = classify_unit(unit, info);
    let mut calls = CallIndex::default();
    calls.visit_file(&unit.file);

    let mut plans = HashMap::new();
    for site in &classification.sites {
        let Some(call) = calls.calls.get(&site.id).copied() else {
            continue;
        };
        let cx = MatchContext {
            site,
            call,
            info,
            source: &unit.source,
        };
        let mut matched: Vec<(&str, CallTemplate)> = rules
            .iter()
            .filter_map(|rule| rule.rewrite(&cx).map(|t| (rule.name(), t)))
            .collect();

        if matched.len() > 1 {
            let names = matched.iter().map(|(name, _)| name.to_string()).collect();
            diagnostics.push(Diagnostic::rewrite_conflict(cx.text(), names, site.file, site.span));
            continue;
        }
        let Some((rule, template)) = matched.pop() else {
            continue;
        };
        if !fits(&template, call) {
            tracing::warn!(rule, call = %cx.text(), "template does not fit the call");
            continue;
        }
        tracing::trace!(rule, call = %cx.text(), "planned rewrite");
        let qualified = matches!(template.callee, CalleeTemplate::SameQualifier(_))
            && matches!(
                &call.kind,
                ExprKind::Call { callee, .. } if matches!(callee.kind, ExprKind::Selector { .. })
            );
        plans.insert(
            site.id,
            Plan {
                rule: rule.to_string(),
                template,
                before: cx.text(),
                qualified,
                ids: Vec::new(),
            },
        );
    }
    plans
}

/// Every original argument is used at most once and exists, and a
/// qualified callee has something to keep.
fn fits(template: &CallTemplate, call: &Expr) -> bool {
    let ExprKind::Call { callee, args, .. } = &call.kind else {
        return false;
    };
    if let CalleeTemplate::SameQualifier(_) = template.callee {
        if !matches!(callee.kind, ExprKind::Selector { .. } | ExprKind::Ident(_)) {
            return false;
        }
    }
    let mut used = vec![false; args.len()];
    template.args.iter().all(|arg| match arg {
        ArgTemplate::Literal(_) => true,
        ArgTemplate::Original(i) => match used.get_mut(*i) {
            Some(slot) if !*slot => {
                *slot = true;
                true
            }
            _ => false,
        },
    })
}

#[derive(Default)]
struct CallIndex<'a> {
    calls: HashMap<NodeId, &'a Expr>,
}

impl<'a> Visitor<'a> for CallIndex<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if expr.is_call() {
            self.calls.insert(expr.id, expr);
        }
        visit::walk_expr(self, expr);
    }
}

struct Rewriter<'s> {
    plans: HashMap<NodeId, Plan>,
    source: &'s str,
    changes: Vec<Change>,
}

impl VisitorMut for Rewriter<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        // Arguments first, so an outer rewrite moves already rewritten calls
        visit::walk_expr_mut(self, expr);
        let Some(plan) = self.plans.remove(&expr.id) else {
            return;
        };
        let span = expr.span;
        let placeholder = Expr {
            kind: ExprKind::Ident(Ident::new("_", span, expr.id)),
            span,
            id: expr.id,
            synthetic: true,
        };
        let original = std::mem::replace(expr, placeholder);
        *expr = build_call(original, &plan);
        self.changes.push(Change {
            rule: plan.rule,
            span,
            before: plan.before,
            after: print_expr(expr, self.source),
        });
    }
}

/// Assemble the synthetic replacement for `original`
fn build_call(original: Expr, plan: &Plan) -> Expr {
    let Expr {
        kind,
        span,
        id,
        synthetic,
    } = original;
    let (callee, args) = match kind {
        ExprKind::Call { callee, args, .. } => (callee, args),
        kind => {
            return Expr {
                kind,
                span,
                id,
                synthetic,
            }
        }
    };
    let mut ids = plan.ids.iter().copied();
    let mut next_id = move || ids.next().unwrap_or(id);
    let mut args: Vec<Option<Expr>> = args.into_iter().map(Some).collect();

    let call_id = next_id();
    let callee = match &plan.template.callee {
        CalleeTemplate::SameQualifier(name) => {
            let callee = *callee;
            match callee.kind {
                ExprKind::Selector { operand, member } => {
                    let member = Ident::new(name.clone(), member.span, next_id());
                    Expr {
                        kind: ExprKind::Selector { operand, member },
                        span: callee.span,
                        id: next_id(),
                        synthetic: true,
                    }
                }
                // Dot import: there is no qualifier to keep
                _ => synthetic_ident(name, callee.span, next_id()),
            }
        }
        CalleeTemplate::Ident(name) => synthetic_ident(name, callee.span, next_id()),
    };

    let args = plan
        .template
        .args
        .iter()
        .filter_map(|arg| match arg {
            ArgTemplate::Literal(raw) => Some(Expr {
                kind: ExprKind::BasicLit(BasicLit {
                    kind: literal_kind(raw),
                    raw: raw.clone(),
                }),
                span: Span::new(span.start, span.start),
                id: next_id(),
                synthetic: true,
            }),
            ArgTemplate::Original(i) => args.get_mut(*i).and_then(Option::take),
        })
        .collect();

    Expr {
        kind: ExprKind::Call {
            callee: Box::new(callee),
            args,
            ellipsis: false,
        },
        span,
        id: call_id,
        synthetic: true,
    }
}

fn synthetic_ident(name: &str, span: Span, id: NodeId) -> Expr {
    Expr {
        kind: ExprKind::Ident(Ident::new(name, span, id)),
        span,
        id,
        synthetic: true,
    }
}

fn literal_kind(raw: &str) -> LitKind {
    match raw.chars().next() {
        Some('"') | Some('`') => LitKind::String,
        Some('\'') => LitKind::Char,
        _ if raw.ends_with('i') => LitKind::Imag,
        _ if raw.contains(['.', 'e', 'E']) && !raw.starts_with("0x") => LitKind::Float,
        _ => LitKind::Int,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_kind() {
        assert_eq!(literal_kind("\"%d\""), LitKind::String);
        assert_eq!(literal_kind("`raw`"), LitKind::String);
        assert_eq!(literal_kind("'a'"), LitKind::Char);
        assert_eq!(literal_kind("1.5"), LitKind::Float);
        assert_eq!(literal_kind("0x1E"), LitKind::Int);
        assert_eq!(literal_kind("42"), LitKind::Int);
        assert_eq!(literal_kind("2i"), LitKind::Imag);
    }
}
