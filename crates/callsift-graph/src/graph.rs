//! Graph building from classified call sites

use callsift_ast::SyntaxUnit;
use callsift_calls::{classify_unit, CallSite, Diagnostic, FuncRef};
use callsift_types::TypeInfo;

use crate::CallGraph;

/// A built graph plus the diagnostics collected while classifying
#[derive(Debug, Default)]
pub struct GraphBuild {
    pub graph: CallGraph,
    pub diagnostics: Vec<Diagnostic>,
    /// Call sites seen, including those that produced no edge
    pub sites: usize,
}

/// Accumulates units into one graph
pub struct GraphBuilder<'a> {
    info: &'a TypeInfo,
    out: GraphBuild,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(info: &'a TypeInfo) -> Self {
        Self {
            info,
            out: GraphBuild::default(),
        }
    }

    /// Register every declaration of `unit` as a node
    pub fn declare_unit(&mut self, unit: &SyntaxUnit) {
        for func in unit.file.funcs() {
            let func = FuncRef::declared(self.info, unit, func);
            self.out.graph.intern(func, true, false);
        }
    }

    /// Add an edge for every statically resolved call in `unit`
    pub fn add_unit(&mut self, unit: &SyntaxUnit) {
        let classification = classify_unit(unit, self.info);
        self.out.sites += classification.sites.len();
        self.out.diagnostics.extend(classification.diagnostics);
        for site in classification.sites {
            self.add_site(site);
        }
    }

    fn add_site(&mut self, site: CallSite) {
        let Some(callee) = site.target(self.info) else {
            return;
        };
        let Some(caller) = site.enclosing.clone() else {
            tracing::trace!(callee = %callee, "package-level call has no caller node");
            return;
        };
        let external = site
            .callee
            .and_then(|obj| self.info.object(obj).package)
            .is_some_and(|pkg| !self.info.package(pkg).analyzed);
        let caller = self.out.graph.intern(caller, true, false);
        let callee_id = self.out.graph.intern(callee, false, external);
        tracing::trace!(kind = site.kind.name(), "edge");
        self.out.graph.add_edge(caller, callee_id, site);
    }

    pub fn finish(self) -> GraphBuild {
        tracing::debug!(
            nodes = self.out.graph.node_count(),
            edges = self.out.graph.edge_count(),
            sites = self.out.sites,
            "built call graph"
        );
        self.out
    }
}

/// Build the call graph of `units`. All declarations become nodes before
/// any edge is added, so node order follows declaration order.
#[tracing::instrument(skip_all)]
pub fn build<'u>(units: impl IntoIterator<Item = &'u SyntaxUnit>, info: &TypeInfo) -> GraphBuild {
    let units: Vec<&SyntaxUnit> = units.into_iter().collect();
    let mut builder = GraphBuilder::new(info);
    for unit in &units {
        builder.declare_unit(unit);
    }
    for unit in &units {
        builder.add_unit(unit);
    }
    builder.finish()
}
