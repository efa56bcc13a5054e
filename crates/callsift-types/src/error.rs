//! Errors that make an analysis pass fail

use callsift_ast::{FileId, Span};
use callsift_parser::SyntaxError;
use thiserror::Error;

/// Fatal for the whole pass
#[derive(Debug, Clone, Error)]
pub enum TypeCheckError {
    /// E-TYPE-001
    #[error("cannot find package \"{path}\" imported by {importer}")]
    UnresolvedImport {
        path: String,
        importer: String,
        file: FileId,
        span: Span,
    },

    /// E-TYPE-002
    #[error("import cycle not allowed: {}", cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },

    /// E-TYPE-003
    #[error("package \"{path}\" failed to parse: {source}")]
    Import {
        path: String,
        file: FileId,
        #[source]
        source: SyntaxError,
    },

    /// E-TYPE-004
    #[error("{} type error(s), first: {}", .0.len(), first_message(.0))]
    Check(Vec<CheckError>),
}

fn first_message(errors: &[CheckError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_default()
}

impl TypeCheckError {
    /// Location of the error, when it has one
    pub fn location(&self) -> Option<(FileId, Span)> {
        match self {
            TypeCheckError::UnresolvedImport { file, span, .. } => Some((*file, *span)),
            TypeCheckError::Import { file, source, .. } => Some((*file, source.span())),
            TypeCheckError::Check(errors) => errors.first().map(|e| (e.file(), e.span())),
            TypeCheckError::ImportCycle { .. } => None,
        }
    }
}

/// One problem found while checking a package
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckError {
    #[error("undefined: {name}")]
    UndefinedName { name: String, file: FileId, span: Span },

    #[error("{name} redeclared in this block")]
    DuplicateDecl { name: String, file: FileId, span: Span },

    #[error("method {type_name}.{name} already declared")]
    DuplicateMethod {
        type_name: String,
        name: String,
        file: FileId,
        span: Span,
    },

    #[error("invalid receiver type {found}")]
    InvalidReceiver { found: String, file: FileId, span: Span },

    #[error("{name} is not a type")]
    NotAType { name: String, file: FileId, span: Span },

    #[error("package {found}; expected package {expected}")]
    PackageMismatch {
        expected: String,
        found: String,
        file: FileId,
        span: Span,
    },

    #[error("invalid operation: cannot call non-function {expr}")]
    NotCallable { expr: String, file: FileId, span: Span },
}

impl CheckError {
    pub fn file(&self) -> FileId {
        match self {
            CheckError::UndefinedName { file, .. }
            | CheckError::DuplicateDecl { file, .. }
            | CheckError::DuplicateMethod { file, .. }
            | CheckError::InvalidReceiver { file, .. }
            | CheckError::NotAType { file, .. }
            | CheckError::PackageMismatch { file, .. }
            | CheckError::NotCallable { file, .. } => *file,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            CheckError::UndefinedName { span, .. }
            | CheckError::DuplicateDecl { span, .. }
            | CheckError::DuplicateMethod { span, .. }
            | CheckError::InvalidReceiver { span, .. }
            | CheckError::NotAType { span, .. }
            | CheckError::PackageMismatch { span, .. }
            | CheckError::NotCallable { span, .. } => *span,
        }
    }
}
