//! Errors of the workspace pipeline

use std::io;
use std::path::PathBuf;

use callsift_ast::FileId;
use callsift_parser::SyntaxError;
use callsift_rewrite::RewriteError;
use callsift_types::TypeCheckError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name}: {source}")]
    Syntax {
        name: String,
        file: FileId,
        #[source]
        source: SyntaxError,
    },

    #[error(transparent)]
    TypeCheck(#[from] TypeCheckError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("no source files to analyze")]
    NoSources,
}
