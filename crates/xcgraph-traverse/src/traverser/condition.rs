//! Net platform condition between two nodes.
//!
//! # Overview
//!
//! Along one path the edge conditions intersect; across paths the results
//! union, with an unconditional path absorbing everything else. The number
//! of simple paths in a diamond-heavy graph is exponential, so the walk is a
//! post-order over nodes instead: the result for `(node, destination)` is the
//! union over `node`'s successors of "edge condition AND result for
//! `(successor, destination)`", memoized per query.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use xcgraph_core::condition::CombinationResult;
use xcgraph_core::DependencyGraph;

/// Per-query memo of `(node, destination) → combined condition`.
#[derive(Debug)]
pub struct ConditionCache<'g> {
    graph: &'g DependencyGraph,
    memo: HashMap<(NodeIndex, NodeIndex), CombinationResult>,
}

impl<'g> ConditionCache<'g> {
    #[must_use]
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            memo: HashMap::new(),
        }
    }

    /// Condition for a `to` known to be reachable from `from`.
    pub fn resolve(&mut self, from: NodeIndex, to: NodeIndex) -> CombinationResult {
        if !self.graph.has_conditions() {
            return CombinationResult::UNCONDITIONAL;
        }
        self.between(from, to)
    }

    /// Union over every path `from → to` of the path's intersected edge
    /// conditions. [`CombinationResult::Incompatible`] when no path exists.
    pub fn between(&mut self, from: NodeIndex, to: NodeIndex) -> CombinationResult {
        if from == to {
            return CombinationResult::UNCONDITIONAL;
        }
        if let Some(hit) = self.memo.get(&(from, to)) {
            return hit.clone();
        }

        let mut stack = vec![(from, false)];
        while let Some((node, expanded)) = stack.pop() {
            if self.memo.contains_key(&(node, to)) {
                continue;
            }
            if node == to {
                self.memo.insert((node, to), CombinationResult::UNCONDITIONAL);
                continue;
            }
            if !expanded {
                stack.push((node, true));
                stack.extend(
                    self.graph
                        .successors(node)
                        .filter(|next| !self.memo.contains_key(&(*next, to)))
                        .map(|next| (next, false)),
                );
                continue;
            }

            let result = self
                .graph
                .successors(node)
                .fold(CombinationResult::Incompatible, |acc, next| {
                    let through = self
                        .memo
                        .get(&(next, to))
                        .cloned()
                        .unwrap_or(CombinationResult::Incompatible)
                        .narrow(self.graph.edge_condition(node, next));
                    acc.combine_with(through)
                });
            self.memo.insert((node, to), result);
        }

        self.memo
            .get(&(from, to))
            .cloned()
            .unwrap_or(CombinationResult::Incompatible)
    }
}
