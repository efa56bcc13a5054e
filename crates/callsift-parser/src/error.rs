//! Syntax error types

use callsift_ast::Span;
use callsift_lexer::TokenKind;
use thiserror::Error;

/// The parser rejected a unit. Fatal for that unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("invalid character")]
    InvalidCharacter { span: Span },

    #[error("expected expression")]
    ExpectedExpression { span: Span },

    #[error("expected type")]
    ExpectedType { span: Span },

    #[error("expected declaration")]
    ExpectedDeclaration { span: Span },

    #[error("expected {expected} on the left side of {op}")]
    InvalidLhs {
        expected: &'static str,
        op: &'static str,
        span: Span,
    },

    #[error("mixed named and unnamed parameters")]
    MixedParameters { span: Span },

    #[error("missing package clause")]
    MissingPackage { span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. } => *span,
            SyntaxError::InvalidCharacter { span } => *span,
            SyntaxError::ExpectedExpression { span } => *span,
            SyntaxError::ExpectedType { span } => *span,
            SyntaxError::ExpectedDeclaration { span } => *span,
            SyntaxError::InvalidLhs { span, .. } => *span,
            SyntaxError::MixedParameters { span } => *span,
            SyntaxError::MissingPackage { span } => *span,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        if found == TokenKind::Error {
            return SyntaxError::InvalidCharacter { span };
        }
        SyntaxError::UnexpectedToken {
            expected: expected.into(),
            found: found.describe().to_string(),
            span,
        }
    }
}
