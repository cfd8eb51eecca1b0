//! Graph validation: dependency satisfaction and cycle detection.
//!
//! Both checks run before anything is scheduled; either failure aborts the
//! run with no requests issued.

use std::collections::HashSet;

use tracing::info;

use crate::{ApiflowError, Result, graph::graph::DependencyGraph, model::RouteName};

/// Validate the graph and link its prerequisite edges.
///
/// Order matters: satisfaction first (every referenced name must be a
/// node), then edge linking, then cycle detection over the linked graph.
pub fn validate(graph: &mut DependencyGraph) -> Result<()> {
    satisfy_constraints(graph)?;
    graph.link_dependencies()?;
    detect_cycles(graph)
}

/// Every name referenced as a dependency must itself be a node key.
///
/// Missing names are collected across the whole graph, not reported
/// fail-fast on the first.
pub fn satisfy_constraints(graph: &DependencyGraph) -> Result<()> {
    info!("verifying all dependencies are satisfied in the dependency graph");

    let mut missing: Vec<RouteName> = Vec::new();
    for name in graph.names() {
        let node = graph.get(&name).expect("name taken from the graph");
        for dependency in &node.dependencies {
            if !graph.contains(dependency) && !missing.contains(dependency) {
                missing.push(dependency.clone());
            }
        }
    }

    if !missing.is_empty() {
        return Err(ApiflowError::Unsatisfied { names: missing });
    }

    info!("all dependencies are satisfied");
    Ok(())
}

/// DFS cycle detection with a recursion-stack marker per node.
///
/// Scanning continues through remaining unvisited roots after a cycle is
/// found, so every independent cycle in the graph is reported in one pass.
pub fn detect_cycles(graph: &DependencyGraph) -> Result<()> {
    info!("verifying there are no cyclic dependency chains");

    let mut visited: HashSet<RouteName> = HashSet::new();
    let mut stack: HashSet<RouteName> = HashSet::new();
    let mut chains: Vec<Vec<RouteName>> = Vec::new();

    for name in graph.names() {
        if !visited.contains(&name) {
            // A fresh stack per root keeps paths that merely lead into an
            // already-reported cycle from being reported as cycles themselves.
            stack.clear();
            if let Some(chain) = cyclic_visit(graph, &name, &mut visited, &mut stack, &[]) {
                let mut full = vec![name.clone()];
                full.extend(chain);
                chains.push(full);
            }
        }
    }

    if !chains.is_empty() {
        return Err(ApiflowError::Cycle { chains });
    }

    info!("no cyclic dependency chains were detected");
    Ok(())
}

fn cyclic_visit(
    graph: &DependencyGraph,
    node: &str,
    visited: &mut HashSet<RouteName>,
    stack: &mut HashSet<RouteName>,
    history: &[RouteName],
) -> Option<Vec<RouteName>> {
    visited.insert(node.to_string());
    stack.insert(node.to_string());

    let dependencies = graph.get(node).map(|n| n.dependencies.clone()).unwrap_or_default();
    for dependency in dependencies {
        let mut chain = history.to_vec();
        chain.push(dependency.clone());

        if !visited.contains(&dependency) {
            if let Some(found) = cyclic_visit(graph, &dependency, visited, stack, &chain) {
                return Some(found);
            }
        } else if stack.contains(&dependency) {
            return Some(chain);
        }
    }

    stack.remove(node);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::graph::RouteNode,
        model::{HttpMethod, RequestData},
    };

    fn node(
        name: &str,
        dependencies: &[&str],
    ) -> RouteNode {
        RouteNode {
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            request: RequestData {
                name: name.to_string(),
                method: HttpMethod::Get,
                original_route: format!("/{}", name.to_lowercase()),
                api_route: format!("/{}", name.to_lowercase()),
                request_body: None,
                definition_name: None,
            },
        }
    }

    fn org_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.insert(node("Organization", &[]));
        graph.insert(node("OrganizationID", &["Organization"]));
        graph.insert(node("Budget", &["Organization"]));
        graph.insert(node("GetBudget", &["Budget"]));
        graph
    }

    #[test]
    fn test_validate_accepts_acyclic_graph() {
        let mut graph = org_graph();
        assert!(validate(&mut graph).is_ok());
        assert_eq!(graph.dependents("Organization"), ["OrganizationID", "Budget"]);
    }

    #[test]
    fn test_missing_dependency_reported() {
        let mut graph = DependencyGraph::new();
        graph.insert(node("OrganizationID", &["Organization"]));

        let result = satisfy_constraints(&graph);
        assert_eq!(
            result.unwrap_err(),
            ApiflowError::Unsatisfied {
                names: vec!["Organization".to_string()],
            }
        );
    }

    #[test]
    fn test_all_missing_dependencies_collected() {
        let mut graph = DependencyGraph::new();
        graph.insert(node("A", &["Gone", "AlsoGone"]));
        graph.insert(node("B", &["Gone"]));

        let result = satisfy_constraints(&graph);
        assert_eq!(
            result.unwrap_err(),
            ApiflowError::Unsatisfied {
                names: vec!["Gone".to_string(), "AlsoGone".to_string()],
            }
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.insert(node("Organization", &["Organization"]));

        let result = detect_cycles(&graph);
        assert_eq!(
            result.unwrap_err(),
            ApiflowError::Cycle {
                chains: vec![vec!["Organization".to_string(), "Organization".to_string()]],
            }
        );
    }

    #[test]
    fn test_two_node_cycle_chain() {
        let mut graph = DependencyGraph::new();
        graph.insert(node("A", &["B"]));
        graph.insert(node("B", &["A"]));

        let result = detect_cycles(&graph);
        let ApiflowError::Cycle { chains } = result.unwrap_err() else {
            panic!("expected cycle error");
        };
        assert_eq!(chains, vec![vec!["A".to_string(), "B".to_string(), "A".to_string()]]);
    }

    #[test]
    fn test_all_independent_cycles_reported() {
        let mut graph = DependencyGraph::new();
        graph.insert(node("A", &["B"]));
        graph.insert(node("B", &["A"]));
        graph.insert(node("C", &["C"]));

        let ApiflowError::Cycle { chains } = detect_cycles(&graph).unwrap_err() else {
            panic!("expected cycle error");
        };
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[1], vec!["C".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut graph = org_graph();
        graph.insert(node("Report", &["OrganizationID", "GetBudget"]));
        assert!(validate(&mut graph).is_ok());
    }
}
