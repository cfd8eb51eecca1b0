//! Deterministic topological scheduling (Kahn's algorithm).

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::{ApiflowError, Result, common::ExecutionQueue, graph::graph::DependencyGraph, model::RouteName};

/// Produce the execution order for a validated graph.
///
/// Each of the `|V|` iterations scans node names in declaration order and
/// schedules the first whose in-degree is zero, so simultaneously eligible
/// nodes are always taken earliest-declared first. The validator has
/// already guaranteed satisfaction and acyclicity; if an iteration still
/// finds no eligible node, or a decrement would go negative, scheduling
/// fails loudly instead of tolerating the inconsistency.
pub fn topological_sort(graph: &DependencyGraph) -> Result<ExecutionQueue> {
    info!("starting sorting process for correct dependency call order");

    let names = graph.names();
    let mut in_degree: HashMap<RouteName, usize> = names
        .iter()
        .map(|name| {
            let count = graph.get(name).map(|n| n.dependencies.len()).unwrap_or(0);
            (name.clone(), count)
        })
        .collect();

    let mut queue = ExecutionQueue::new();
    let mut scheduled: HashSet<RouteName> = HashSet::new();

    for _ in 0..names.len() {
        let eligible = names.iter().find(|name| !scheduled.contains(*name) && in_degree[*name] == 0);

        let Some(node) = eligible else {
            return Err(ApiflowError::Schedule("dependencies cannot be sorted, residual cyclic chain detected".to_string()));
        };

        scheduled.insert(node.clone());
        queue.enqueue(node.clone());

        for dependent in graph.dependents(node) {
            let degree = in_degree.get_mut(&dependent).ok_or_else(|| ApiflowError::Schedule(format!("unknown dependent '{}' during scheduling", dependent)))?;
            *degree = degree
                .checked_sub(1)
                .ok_or_else(|| ApiflowError::Schedule(format!("in-degree underflow on '{}', graph was not validated", dependent)))?;
        }
    }

    info!("completed sorting of dependencies, proceeding to API call process");
    Ok(queue)
}
