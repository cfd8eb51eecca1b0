//! Dependency graph over documented routes.
//!
//! One vertex per uniquely-named route, stored in a directed graph (using
//! petgraph) with prerequisite edges pointing at the routes that depend on
//! them. Vertex insertion order is declaration order in the source
//! document, which the scheduler relies on for its deterministic tie-break.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use serde_json::{Value, json};

use crate::{
    ApiflowError, Result,
    model::{RequestData, RouteName},
};

/// Graph vertex: a route's prerequisites plus its request descriptor.
#[derive(Debug, Clone)]
pub struct RouteNode {
    /// Names of routes that must execute before this one, deduplicated.
    pub dependencies: Vec<RouteName>,
    /// Everything needed to issue the route's request.
    pub request: RequestData,
}

/// Directed graph of route nodes keyed by route name.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<RouteNode, ()>,
    index: HashMap<RouteName, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node already declared under the same
    /// name. Replacement keeps the earlier declaration position.
    pub fn insert(
        &mut self,
        node: RouteNode,
    ) {
        let name = node.request.name.clone();
        match self.index.get(&name) {
            Some(idx) => {
                self.graph[*idx] = node;
            }
            None => {
                let idx = self.graph.add_node(node);
                self.index.insert(name, idx);
            }
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.index.contains_key(name)
    }

    /// Node declared under `name`.
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&RouteNode> {
        self.index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Route names in declaration order.
    pub fn names(&self) -> Vec<RouteName> {
        self.graph.node_indices().map(|idx| self.graph[idx].request.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Add one prerequisite edge per declared dependency.
    ///
    /// Must run after the satisfaction check; a dependency without a node is
    /// reported rather than silently dropped.
    pub fn link_dependencies(&mut self) -> Result<()> {
        let mut edges = Vec::new();
        for idx in self.graph.node_indices() {
            for dependency in &self.graph[idx].dependencies {
                match self.index.get(dependency) {
                    Some(dep_idx) => edges.push((*dep_idx, idx)),
                    None => {
                        return Err(ApiflowError::Unsatisfied {
                            names: vec![dependency.clone()],
                        });
                    }
                }
            }
        }
        for (from, to) in edges {
            self.graph.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Names of the routes that depend on `name`, once edges are linked.
    pub fn dependents(
        &self,
        name: &str,
    ) -> Vec<RouteName> {
        self.index
            .get(name)
            .map(|idx| self.graph.neighbors_directed(*idx, Direction::Outgoing).map(|dep_idx| self.graph[dep_idx].request.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Output a human-readable representation of the graph.
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Dependency Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            if node.dependencies.is_empty() {
                lines.push(format!("[{}] {} {} -> (no prerequisites)", node.request.name, node.request.method.as_upper(), node.request.original_route));
            } else {
                lines.push(format!(
                    "[{}] {} {} -> requires {}",
                    node.request.name,
                    node.request.method.as_upper(),
                    node.request.original_route,
                    node.dependencies.join(", ")
                ));
            }
        }

        lines.join("\n")
    }

    /// JSON summary for external visualization tooling.
    pub fn to_value(&self) -> Value {
        let mut nodes = serde_json::Map::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            nodes.insert(
                node.request.name.clone(),
                json!({
                    "dependencies": node.dependencies,
                    "method": node.request.method.as_ref(),
                    "route": node.request.original_route,
                }),
            );
        }
        Value::Object(nodes)
    }
}
