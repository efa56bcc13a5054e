//! callsift AST - syntax tree for the analyzed Go subset
//!
//! Defines node types, spans, node identities shared with the type index,
//! tree traversal, and the byte-preserving serializer used after rewrites.

mod span;
mod node;
mod types;
mod expr;
mod stmt;
mod decl;
mod printer;
pub mod visit;

pub use span::*;
pub use node::*;
pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use printer::{print_expr, print_type, render};

use serde::{Deserialize, Serialize};

/// One parsed source file together with its original text.
///
/// The tree is read-only for every pass except rewriting, which replaces
/// call expressions in place and allocates ids for the new nodes through
/// [`SyntaxUnit::fresh_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxUnit {
    pub name: String,
    pub file_id: FileId,
    pub source: String,
    pub file: File,
    /// Next free node index in this file
    pub next_node: u32,
}

impl SyntaxUnit {
    /// Allocate a node id no parsed node uses
    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId::new(self.file_id, self.next_node);
        self.next_node += 1;
        id
    }

    /// Package name from the package clause
    pub fn package_name(&self) -> &str {
        &self.file.package.name
    }

    /// Serialize back to source text
    pub fn render(&self) -> String {
        render(self)
    }

    /// Source text covered by `span`
    pub fn snippet(&self, span: Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or_default()
    }
}
