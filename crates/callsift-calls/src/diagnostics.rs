//! Non-fatal diagnostics
//!
//! Classification, graph building and rewriting keep going past problems
//! they can attribute to a single call site. Each such problem becomes a
//! [`Diagnostic`] returned next to the partial result.

use callsift_ast::{FileId, Span};
use serde::Serialize;

/// A problem found during a pass that did not stop it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: FileId,
    /// Primary source span
    pub span: Span,
    pub severity: Severity,
    /// Diagnostic code (e.g., "W-RESOLVE-001")
    pub code: &'static str,
    /// Why this happened and what the pass did about it
    pub explanation: String,
    pub related: Vec<RelatedLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A name or selector the oracle could not resolve although the package
    /// set type-checked
    UnresolvedReference { name: String, reason: String },
    /// Two members of the same name at the same embedding depth
    AmbiguousSelector { name: String },
    /// More than one rewrite rule matched one call site
    RewriteConflict { call: String, rules: Vec<String> },
}

/// Another location that explains a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedLocation {
    pub span: Span,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, file: FileId, span: Span, code: &'static str) -> Self {
        Self {
            kind,
            file,
            span,
            severity: Severity::Warning,
            code,
            explanation: String::new(),
            related: Vec::new(),
        }
    }

    pub fn unresolved(
        name: impl Into<String>,
        reason: impl Into<String>,
        file: FileId,
        span: Span,
    ) -> Self {
        let name = name.into();
        let explanation = format!(
            "`{}` could not be resolved to a single declaration; the call is classified as unknown",
            name
        );
        Self::new(
            DiagnosticKind::UnresolvedReference {
                name,
                reason: reason.into(),
            },
            file,
            span,
            "W-RESOLVE-001",
        )
        .with_explanation(explanation)
    }

    pub fn ambiguous(name: impl Into<String>, file: FileId, span: Span) -> Self {
        let name = name.into();
        let explanation = format!(
            "`{}` is promoted from more than one embedded field at the same depth",
            name
        );
        Self::new(
            DiagnosticKind::AmbiguousSelector { name },
            file,
            span,
            "W-RESOLVE-002",
        )
        .with_explanation(explanation)
    }

    pub fn rewrite_conflict(call: impl Into<String>, rules: Vec<String>, file: FileId, span: Span) -> Self {
        Self::new(
            DiagnosticKind::RewriteConflict {
                call: call.into(),
                rules,
            },
            file,
            span,
            "W-REWRITE-001",
        )
        .with_explanation("the call site was left unchanged; apply the rules in separate passes to pick an order")
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related.push(RelatedLocation {
            span,
            label: label.into(),
        });
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// The primary message for this diagnostic
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::UnresolvedReference { name, reason } => {
                format!("unresolved reference `{}`: {}", name, reason)
            }
            DiagnosticKind::AmbiguousSelector { name } => {
                format!("ambiguous selector `{}`", name)
            }
            DiagnosticKind::RewriteConflict { call, rules } => {
                format!("rules {} all match `{}`", rules.join(", "), call)
            }
        }
    }

    /// One-line rendering without source context
    pub fn format_simple(&self) -> String {
        format!(
            "{}: {} (at {}..{})",
            self.code,
            self.message(),
            self.span.start,
            self.span.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let span = Span::new(4, 9);
        let d = Diagnostic::unresolved("s.Area", "interface method", FileId(0), span);
        assert_eq!(d.code, "W-RESOLVE-001");
        assert_eq!(d.message(), "unresolved reference `s.Area`: interface method");
        assert_eq!(d.format_simple(), "W-RESOLVE-001: unresolved reference `s.Area`: interface method (at 4..9)");

        let d = Diagnostic::ambiguous("Name", FileId(0), span);
        assert_eq!(d.code, "W-RESOLVE-002");
        assert_eq!(d.severity, Severity::Warning);

        let d = Diagnostic::rewrite_conflict("fmt.Println(x)", vec!["a".into(), "b".into()], FileId(1), span)
            .with_severity(Severity::Info);
        assert_eq!(d.code, "W-REWRITE-001");
        assert_eq!(d.message(), "rules a, b all match `fmt.Println(x)`");
        assert_eq!(d.severity, Severity::Info);
    }
}
