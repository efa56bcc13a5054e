//! Query interface for the call graph

use std::collections::{HashMap, HashSet, VecDeque};

use callsift_calls::CallKind;
use serde::{Deserialize, Serialize};

use crate::{CallGraph, CallGraphEdge, NodeIndex};

/// Filter conditions over edges, matched against the displayed `FuncRef`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeFilter {
    /// Caller or callee contains the text
    Mentions(String),
    /// Caller contains the text
    Caller(String),
    /// Callee contains the text
    Callee(String),
    /// Caller or callee is declared in the package with this path
    Package(String),
    /// Edges produced by calls of this kind
    Kind(CallKind),
    /// Logical AND
    And(Vec<EdgeFilter>),
    /// Logical OR
    Or(Vec<EdgeFilter>),
    /// Logical NOT
    Not(Box<EdgeFilter>),
}

impl EdgeFilter {
    fn matches(&self, graph: &CallGraph, edge: &CallGraphEdge) -> bool {
        let name = |id: NodeIndex| graph.func(id).map(|f| f.to_string()).unwrap_or_default();
        let package = |id: NodeIndex| graph.func(id).map(|f| f.package.as_str()) == Some(self.text());
        match self {
            EdgeFilter::Mentions(text) => {
                name(edge.caller).contains(text.as_str()) || name(edge.callee).contains(text.as_str())
            }
            EdgeFilter::Caller(text) => name(edge.caller).contains(text.as_str()),
            EdgeFilter::Callee(text) => name(edge.callee).contains(text.as_str()),
            EdgeFilter::Package(_) => package(edge.caller) || package(edge.callee),
            EdgeFilter::Kind(kind) => edge.site.kind == *kind,
            EdgeFilter::And(filters) => filters.iter().all(|f| f.matches(graph, edge)),
            EdgeFilter::Or(filters) => filters.iter().any(|f| f.matches(graph, edge)),
            EdgeFilter::Not(inner) => !inner.matches(graph, edge),
        }
    }

    fn text(&self) -> &str {
        match self {
            EdgeFilter::Mentions(text)
            | EdgeFilter::Caller(text)
            | EdgeFilter::Callee(text)
            | EdgeFilter::Package(text) => text,
            _ => "",
        }
    }
}

/// Parse a filter like `caller:main.run`, `callee:Println`, `pkg:fmt`,
/// `kind:instance-method`, or plain text matching either side. Space
/// separated terms must all match; a leading `!` negates a term.
pub fn parse_filter(input: &str) -> Option<EdgeFilter> {
    let terms: Vec<EdgeFilter> = input
        .split_whitespace()
        .map(parse_term)
        .collect::<Option<_>>()?;
    match terms.len() {
        0 => None,
        1 => terms.into_iter().next(),
        _ => Some(EdgeFilter::And(terms)),
    }
}

fn parse_term(term: &str) -> Option<EdgeFilter> {
    if let Some(inner) = term.strip_prefix('!') {
        return parse_term(inner).map(|f| EdgeFilter::Not(Box::new(f)));
    }
    let filter = match term.split_once(':') {
        Some(("caller", text)) => EdgeFilter::Caller(text.to_string()),
        Some(("callee", text)) => EdgeFilter::Callee(text.to_string()),
        Some(("pkg", text)) => EdgeFilter::Package(text.to_string()),
        Some(("kind", text)) => EdgeFilter::Kind(parse_kind(text)?),
        _ => EdgeFilter::Mentions(term.to_string()),
    };
    Some(filter)
}

fn parse_kind(text: &str) -> Option<CallKind> {
    [
        CallKind::PackageFunction,
        CallKind::BuiltIn,
        CallKind::LocalFunction,
        CallKind::InstanceMethod,
        CallKind::Unknown,
    ]
    .into_iter()
    .find(|k| k.name() == text)
}

/// Serializable form of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: u32,
    pub name: String,
    pub declared: bool,
    pub external: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    pub caller: u32,
    pub callee: u32,
    pub kind: CallKind,
    pub file: u32,
    pub start: usize,
    pub end: usize,
}

impl CallGraph {
    /// Whether `to` is reachable from `from` through at least one edge,
    /// searched on demand. `path_exists(f, f)` holds only when `f` is
    /// recursive, directly or through other functions.
    pub fn path_exists(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.shortest_path(from, to).is_some()
    }

    /// Fewest-edges path from `from` to `to`, both ends included. The path
    /// has at least one edge, so for `from == to` it is the shortest cycle
    /// through the node.
    pub fn shortest_path(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            for callee in self.callees(node) {
                if !visited.insert(callee) {
                    continue;
                }
                parent.insert(callee, node);
                if callee == to {
                    return Some(unwind(&parent, from, to));
                }
                queue.push_back(callee);
            }
        }
        None
    }

    /// Every node reachable from `from` through at least one edge
    pub fn reachable_from(&self, from: NodeIndex) -> Vec<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            for callee in self.callees(node) {
                if visited.insert(callee) {
                    stack.push(callee);
                }
            }
        }
        let mut reached: Vec<NodeIndex> = visited.into_iter().collect();
        reached.sort();
        reached
    }

    /// `caller --> callee` lines, sorted, one per edge
    pub fn edge_listing(&self, filter: Option<&EdgeFilter>) -> Vec<String> {
        let mut lines: Vec<String> = self
            .edges()
            .iter()
            .filter(|edge| filter.map_or(true, |f| f.matches(self, edge)))
            .filter_map(|edge| {
                let caller = self.func(edge.caller)?;
                let callee = self.func(edge.callee)?;
                Some(format!("{} --> {}", caller, callee))
            })
            .collect();
        lines.sort();
        lines
    }

    pub fn export(&self) -> GraphExport {
        let nodes = self
            .nodes()
            .map(|(id, node)| NodeExport {
                id: id.0,
                name: node.func.to_string(),
                declared: node.declared,
                external: node.external,
            })
            .collect();
        let edges = self
            .edges()
            .iter()
            .map(|edge| EdgeExport {
                caller: edge.caller.0,
                callee: edge.callee.0,
                kind: edge.site.kind,
                file: edge.site.file.0,
                start: edge.site.span.start,
                end: edge.site.span.end,
            })
            .collect();
        GraphExport { nodes, edges }
    }
}

/// Walk `parent` links back from `to` until `from` is reached
fn unwind(parent: &HashMap<NodeIndex, NodeIndex>, from: NodeIndex, to: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![to];
    let mut current = to;
    while let Some(&prev) = parent.get(&current) {
        path.push(prev);
        if prev == from {
            break;
        }
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("run"), Some(EdgeFilter::Mentions("run".into())));
        assert_eq!(
            parse_filter("caller:main.run !pkg:fmt"),
            Some(EdgeFilter::And(vec![
                EdgeFilter::Caller("main.run".into()),
                EdgeFilter::Not(Box::new(EdgeFilter::Package("fmt".into()))),
            ]))
        );
        assert_eq!(
            parse_filter("kind:instance-method"),
            Some(EdgeFilter::Kind(CallKind::InstanceMethod))
        );
        assert_eq!(parse_filter("kind:virtual"), None);
        assert_eq!(parse_filter("   "), None);
    }
}
