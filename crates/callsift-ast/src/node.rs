//! Node identities shared by every file of an analysis pass

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Span;

/// Identifies one source file inside a [`FileSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Identity of an expression or identifier node.
///
/// Unique across all files allocated from the same [`FileSet`], so one
/// type index can cover many files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub file: FileId,
    pub index: u32,
}

impl NodeId {
    pub fn new(file: FileId, index: u32) -> Self {
        Self { file, index }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.0, self.index)
    }
}

/// Hands out file ids and remembers file names for diagnostics
#[derive(Debug, Default, Clone)]
pub struct FileSet {
    names: Vec<String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file name and return its id
    pub fn add(&mut self, name: impl Into<String>) -> FileId {
        let id = FileId(self.names.len() as u32);
        self.names.push(name.into());
        id
    }

    pub fn name(&self, file: FileId) -> Option<&str> {
        self.names.get(file.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// An identifier occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub id: NodeId,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span, id: NodeId) -> Self {
        Self {
            name: name.into(),
            span,
            id,
        }
    }

    /// The blank identifier `_`
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Exported names start with an upper-case letter
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}
