//! callsift graph - static call graph and queries
//!
//! Nodes are functions and methods, interned by their canonical
//! [`FuncRef`]. Each statically resolved call site adds one edge, so
//! repeated calls and recursion are kept as separate edges and self-loops.
//!
//! Dispatch is static: calls through interface values add no edge. The
//! graph over-approximates reachability (dead branches still contribute
//! edges) but never misses a statically determined target.

mod graph;
mod query;

pub use graph::*;
pub use query::*;

use std::collections::HashMap;

use callsift_calls::{CallSite, FuncRef};
use serde::{Deserialize, Serialize};

/// Index of a node in a [`CallGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

#[derive(Debug, Clone, Serialize)]
pub struct CallGraphNode {
    pub func: FuncRef,
    /// Declared in one of the units the graph was built from
    pub declared: bool,
    /// Declared in a package outside the analyzed set
    pub external: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallGraphEdge {
    pub caller: NodeIndex,
    pub callee: NodeIndex,
    /// The call that produced this edge
    pub site: CallSite,
}

/// Directed, possibly cyclic call graph
#[derive(Debug, Default, Clone)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
    index: HashMap<FuncRef, NodeIndex>,
    edges: Vec<CallGraphEdge>,
    /// Forward edges: edge positions by caller
    outgoing: HashMap<NodeIndex, Vec<usize>>,
    /// Backward edges: edge positions by callee
    incoming: HashMap<NodeIndex, Vec<usize>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node for `func`, created on first use. A later declaration
    /// upgrades a node first seen as a callee.
    pub fn intern(&mut self, func: FuncRef, declared: bool, external: bool) -> NodeIndex {
        if let Some(&id) = self.index.get(&func) {
            if declared {
                self.nodes[id.0 as usize].declared = true;
            }
            return id;
        }
        let id = NodeIndex(self.nodes.len() as u32);
        self.index.insert(func.clone(), id);
        self.nodes.push(CallGraphNode {
            func,
            declared,
            external,
        });
        id
    }

    /// Add a call edge; parallel edges and self-loops are kept
    pub fn add_edge(&mut self, caller: NodeIndex, callee: NodeIndex, site: CallSite) {
        let position = self.edges.len();
        self.edges.push(CallGraphEdge {
            caller,
            callee,
            site,
        });
        self.outgoing.entry(caller).or_default().push(position);
        self.incoming.entry(callee).or_default().push(position);
    }

    pub fn node(&self, func: &FuncRef) -> Option<NodeIndex> {
        self.index.get(func).copied()
    }

    pub fn node_data(&self, id: NodeIndex) -> Option<&CallGraphNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn func(&self, id: NodeIndex) -> Option<&FuncRef> {
        self.node_data(id).map(|n| &n.func)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &CallGraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex(i as u32), n))
    }

    pub fn edges(&self) -> &[CallGraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `id`, in insertion order
    pub fn out_edges(&self, id: NodeIndex) -> impl Iterator<Item = &CallGraphEdge> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Edges entering `id`, in insertion order
    pub fn in_edges(&self, id: NodeIndex) -> impl Iterator<Item = &CallGraphEdge> {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Distinct callees of `id`
    pub fn callees(&self, id: NodeIndex) -> Vec<NodeIndex> {
        let mut callees: Vec<NodeIndex> = self.out_edges(id).map(|e| e.callee).collect();
        callees.sort();
        callees.dedup();
        callees
    }

    /// Distinct callers of `id`
    pub fn callers(&self, id: NodeIndex) -> Vec<NodeIndex> {
        let mut callers: Vec<NodeIndex> = self.in_edges(id).map(|e| e.caller).collect();
        callers.sort();
        callers.dedup();
        callers
    }

    /// Declared functions nothing in the graph calls
    pub fn uncalled(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(id, node)| node.declared && !self.incoming.contains_key(id))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsift_ast::{FileId, NodeId, Span};
    use callsift_calls::CallKind;

    fn site(index: u32) -> CallSite {
        CallSite {
            id: NodeId::new(FileId(0), index),
            file: FileId(0),
            span: Span::dummy(),
            kind: CallKind::LocalFunction,
            reason: None,
            chain: None,
            enclosing: None,
            callee: None,
            args: Vec::new(),
        }
    }

    #[test]
    fn test_intern_and_multi_edges() {
        let mut graph = CallGraph::new();
        let a = graph.intern(FuncRef::function("main", "a"), false, false);
        let b = graph.intern(FuncRef::function("main", "b"), true, false);
        assert_eq!(graph.intern(FuncRef::function("main", "a"), true, false), a);
        assert!(graph.node_data(a).is_some_and(|n| n.declared));

        graph.add_edge(a, b, site(1));
        graph.add_edge(a, b, site(2));
        graph.add_edge(a, a, site(3));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.out_edges(a).count(), 3);
        assert_eq!(graph.callees(a), vec![a, b]);
        assert_eq!(graph.callers(b), vec![a]);
        assert_eq!(graph.in_edges(b).count(), 2);
        assert!(graph.uncalled().is_empty());
    }
}
