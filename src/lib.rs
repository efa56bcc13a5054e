//! callsift - call classification, call graphs and type-aware rewrites
//! for Go sources
//!
//! The pipeline lives in the member crates; this crate ties them together
//! behind [`Workspace`] and re-exports them.

mod error;
mod workspace;

pub use callsift_ast as ast;
pub use callsift_calls as calls;
pub use callsift_graph as graph;
pub use callsift_parser as parser;
pub use callsift_rewrite as rewrite;
pub use callsift_types as types;

pub use error::{Error, Result};
pub use workspace::{FileRewrite, RewriteReport, UnitClassification, Workspace};
