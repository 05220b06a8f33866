//! Cycle detection over target-to-target edges.
//!
//! # Overview
//!
//! Only targets can form cycles: precompiled artifacts, SDKs and bundles
//! are leaves as far as targets are concerned. The walk therefore follows
//! target edges only.
//!
//! The DFS is iterative with an explicit call stack. A node is either
//! *on the stack* (part of the current path) or *finished* (its whole
//! subgraph is known to be acyclic). Finished nodes are never expanded
//! again, so diamond-shaped graphs are walked in linear time.
//!
//! The reported cycle starts at the first repeated node and ends with that
//! node again: `A -> B -> C -> A`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use crate::condition::PlatformCondition;
use crate::error::GraphError;
use crate::key::{DependencyKey, TargetKey};
use crate::model::{ProjectDescriptor, WorkspaceDescriptor};

/// Check the declared target dependencies of `projects` for a cycle.
///
/// Dependencies naming a project or target that does not exist are skipped
/// here; the loader reports those separately.
///
/// # Errors
///
/// Returns [`GraphError::CircularDependency`] with the ordered cycle.
#[instrument(skip_all, fields(workspace = %workspace.name, projects = projects.len()))]
pub fn detect(
    workspace: &WorkspaceDescriptor,
    projects: &BTreeMap<PathBuf, ProjectDescriptor>,
) -> Result<(), GraphError> {
    let roots = projects.values().flat_map(|project| {
        project
            .targets
            .iter()
            .map(|target| TargetKey::new(project.path.clone(), target.name.clone()))
    });

    let cycle = find_cycle(roots, |key| {
        let Some(target) = projects
            .get(&key.project_path)
            .and_then(|project| project.target(&key.name))
        else {
            return Vec::new();
        };
        target
            .dependencies
            .iter()
            .filter_map(|dep| dep.target_reference(&key.project_path))
            .filter(|(path, name)| {
                projects
                    .get(*path)
                    .is_some_and(|project| project.target(name).is_some())
            })
            .map(|(path, name)| TargetKey::new(path, name))
            .collect()
    });

    match cycle {
        Some(cycle) => {
            debug!(length = cycle.len(), "declared dependencies form a cycle");
            Err(GraphError::CircularDependency { cycle })
        }
        None => Ok(()),
    }
}

/// Find a cycle among the target nodes of a built graph.
#[must_use]
pub fn find_target_cycle(
    graph: &DiGraph<DependencyKey, Option<PlatformCondition>>,
) -> Option<Vec<TargetKey>> {
    let mut roots: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&idx| graph[idx].is_target())
        .collect();
    roots.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

    let cycle = find_cycle(roots, |&node| {
        let mut next: Vec<NodeIndex> = graph
            .neighbors(node)
            .filter(|&idx| graph[idx].is_target())
            .collect();
        next.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
        next.dedup();
        next
    })?;

    Some(
        cycle
            .into_iter()
            .filter_map(|idx| graph[idx].as_target().cloned())
            .collect(),
    )
}

/// Iterative DFS returning the first cycle found, or `None`.
///
/// `roots` are tried in order; `successors` must be deterministic for the
/// reported cycle to be.
pub fn find_cycle<N, I, F>(roots: I, mut successors: F) -> Option<Vec<N>>
where
    N: Ord + Clone,
    I: IntoIterator<Item = N>,
    F: FnMut(&N) -> Vec<N>,
{
    let mut finished: BTreeSet<N> = BTreeSet::new();
    let mut on_stack: BTreeSet<N> = BTreeSet::new();

    for root in roots {
        if finished.contains(&root) {
            continue;
        }

        // Explicit call stack: (node, its successors, next successor index).
        let first = successors(&root);
        on_stack.insert(root.clone());
        let mut call_stack: Vec<(N, Vec<N>, usize)> = vec![(root, first, 0)];

        while let Some((node, next_nodes, next_idx)) = call_stack.last_mut() {
            if let Some(next) = next_nodes.get(*next_idx).cloned() {
                *next_idx += 1;

                if on_stack.contains(&next) {
                    let start = call_stack
                        .iter()
                        .position(|(n, _, _)| *n == next)
                        .unwrap_or(0);
                    let mut cycle: Vec<N> =
                        call_stack[start..].iter().map(|(n, _, _)| n.clone()).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                if finished.contains(&next) {
                    continue;
                }

                let after = successors(&next);
                on_stack.insert(next.clone());
                call_stack.push((next, after, 0));
            } else {
                let done = node.clone();
                call_stack.pop();
                on_stack.remove(&done);
                finished.insert(done);
            }
        }
    }

    None
}
