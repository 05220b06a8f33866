//! Embeddable framework resolution.
//!
//! Only targets that produce a runnable or loadable bundle embed anything.
//! Unlike linking, the walk goes through dynamic frameworks: the outermost
//! bundle has to carry every dynamic image loaded into its process. It stops
//! at nested embedding targets (an app extension embeds its own frameworks)
//! and at macros.

use std::path::Path;

use tracing::{instrument, trace};
use xcgraph_core::model::Product;

use super::{GraphTraverser, Query};
use crate::reference::{Reference, ReferenceSet};
use crate::rules;

impl<'g> GraphTraverser<'g> {
    /// Frameworks `name` copies into its bundle, in canonical order.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn embeddable_frameworks(&self, path: &Path, name: &str) -> Vec<Reference> {
        self.query(path, name)
            .map(|mut query| self.embeddable(&mut query).into_vec())
            .unwrap_or_default()
    }

    fn embeddable(&self, query: &mut Query<'g>) -> ReferenceSet {
        let graph = self.graph;
        let target = query.target.target;
        if !rules::can_embed_frameworks(target) {
            return ReferenceSet::new();
        }

        let mut nodes = self.filter_dependencies(
            &[query.from],
            |key| {
                rules::is_precompiled_dynamic(key) || rules::is_embeddable_dependency_target(graph, key)
            },
            |key| rules::can_dependency_embed_frameworks(graph, key) || rules::is_macro(graph, key),
        );
        nodes.retain(|node| !rules::is_merged_into(graph, target, self.key(*node)));
        let mut references = query.collect(nodes);

        if target.product.is_tests_bundle() {
            let host = self.unit_test_host(query.target.path, &target.name);
            match host.and_then(|host| self.query(host.path, host.name())) {
                Some(mut host_query) => references.subtract(&self.embeddable(&mut host_query)),
                None if target.product == Product::UnitTests => return ReferenceSet::new(),
                None => {}
            }
        }

        trace!(target = %target.name, count = references.len(), "embeddable frameworks");
        references
    }
}
