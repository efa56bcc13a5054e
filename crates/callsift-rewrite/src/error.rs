//! Error types for rule configuration

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RewriteError>;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid rule configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("rule `{rule}`: {message}")]
    InvalidRule { rule: String, message: String },
}
