//! Linkable dependency resolution.
//!
//! # Rules
//!
//! 1. Direct SDKs, direct dynamic targets and direct precompiled dynamic
//!    binaries are linked. Nothing behind a dynamic node is surfaced.
//! 2. A target that can link static products also links every static node
//!    reachable through static hops (static targets and static precompiled
//!    binaries), plus the SDKs and dynamic nodes those static hops depend
//!    on. Static xcframeworks reached through a hop are copied instead
//!    (see `copy_product_dependencies`); direct ones are linked.
//! 3. A unit test bundle hosted by an app links nothing the host can reach.
//! 4. Dependencies the target merges into its own binary are dropped.
//!
//! Macro executables and macro targets are never linked and never walked
//! through.

use std::collections::BTreeSet;
use std::path::Path;

use petgraph::graph::NodeIndex;
use tracing::{instrument, trace};
use xcgraph_core::key::DependencyKey;
use xcgraph_core::model::Product;

use super::{GraphTraverser, Query};
use crate::reference::{Reference, ReferenceSet};
use crate::rules;

impl<'g> GraphTraverser<'g> {
    /// What `name` passes to the linker, in canonical order.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn linkable_dependencies(&self, path: &Path, name: &str) -> Vec<Reference> {
        self.query(path, name)
            .map(|mut query| self.linkable(&mut query, true).into_vec())
            .unwrap_or_default()
    }

    pub(crate) fn linkable(&self, query: &mut Query<'g>, exclude_host: bool) -> ReferenceSet {
        let graph = self.graph;
        let target = query.target.target;
        let direct: BTreeSet<NodeIndex> = graph.successors(query.from).collect();

        let mut nodes: BTreeSet<NodeIndex> = direct
            .iter()
            .copied()
            .filter(|next| {
                let key = self.key(*next);
                matches!(key, DependencyKey::Sdk { .. })
                    || rules::is_precompiled_dynamic(key)
                    || rules::is_dynamic_target(graph, key)
            })
            .collect();

        if target.product.can_link_static_products() {
            let statics = self.transitive_static_dependencies(query.from);
            for &node in &statics {
                let key = self.key(node);
                if key.is_target()
                    || rules::is_precompiled_static_binary(key)
                    || direct.contains(&node)
                {
                    nodes.insert(node);
                }
                nodes.extend(graph.successors(node).filter(|next| {
                    let key = self.key(*next);
                    matches!(key, DependencyKey::Sdk { .. })
                        || rules::is_precompiled_dynamic(key)
                        || rules::is_dynamic_target(graph, key)
                }));
            }
        }

        if exclude_host && target.product == Product::UnitTests {
            let host = self
                .unit_test_host(query.target.path, &target.name)
                .and_then(|host| graph.target_index(host.path, host.name()));
            if let Some(host) = host {
                let hosted = self.reachable(host);
                nodes.retain(|node| !hosted.contains(node));
            }
        }

        nodes.retain(|node| !rules::is_merged_into(graph, target, self.key(*node)));

        let references = query.collect(nodes);
        trace!(target = %target.name, count = references.len(), "linkable dependencies");
        references
    }

    /// Static nodes whose code ends up in the binary `from` links, found by
    /// walking through static hops only.
    pub(crate) fn transitive_static_dependencies(&self, from: NodeIndex) -> BTreeSet<NodeIndex> {
        let graph = self.graph;
        self.filter_dependencies(
            &[from],
            |key| rules::is_static(graph, key),
            |key| rules::can_link_static_products(graph, key) || rules::is_macro(graph, key),
        )
    }
}
