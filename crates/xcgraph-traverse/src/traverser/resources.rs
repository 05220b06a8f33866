//! Resource bundles and copy-product references.
//!
//! # Resource bundles
//!
//! Local and precompiled bundles float up through anything without a
//! resources phase and stop at the first target that has one, so a static
//! library's bundle lands in the app or dynamic framework above it, and
//! nothing above that framework sees it. Bundles from external projects
//! follow package-manager semantics instead: only targets that can embed
//! bundles copy them, which keeps them out of intermediate dynamic
//! frameworks.
//!
//! # Copy products
//!
//! Static xcframeworks reachable through static hops, the direct static
//! products of a static target, apps and extensions from other projects, and
//! the resource bundles above.

use std::path::Path;

use petgraph::graph::NodeIndex;
use tracing::instrument;
use xcgraph_core::model::Product;

use super::{GraphTraverser, Query};
use crate::reference::{Reference, ReferenceSet};
use crate::rules;

impl<'g> GraphTraverser<'g> {
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn resource_bundle_dependencies(&self, path: &Path, name: &str) -> Vec<Reference> {
        self.query(path, name)
            .map(|mut query| self.resource_bundles(&mut query).into_vec())
            .unwrap_or_default()
    }

    fn resource_bundles(&self, query: &mut Query<'g>) -> ReferenceSet {
        let graph = self.graph;
        let target = query.target.target;
        if !rules::can_host_resources(target) {
            return ReferenceSet::new();
        }

        let mut nodes = self.filter_dependencies(
            &[query.from],
            |key| rules::is_resource_bundle(graph, key) && !rules::is_external(graph, key),
            |key| rules::can_dependency_host_resources(graph, key),
        );

        if rules::can_embed_bundles(target) {
            nodes.extend(self.filter_dependencies(
                &[query.from],
                |key| rules::is_resource_bundle(graph, key) && rules::is_external(graph, key),
                |key| rules::can_dependency_embed_bundles(graph, key),
            ));
        }

        query.collect(nodes)
    }

    /// What `name` copies into its products directory.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn copy_product_dependencies(&self, path: &Path, name: &str) -> Vec<Reference> {
        let Some(mut query) = self.query(path, name) else {
            return Vec::new();
        };
        let graph = self.graph;
        let target = query.target.target;

        let xcframeworks = self.filter_dependencies(
            &[query.from],
            rules::is_precompiled_static_xcframework,
            |key| {
                rules::is_precompiled_dynamic(key)
                    || rules::is_macro(graph, key)
                    || (key.is_target() && !rules::is_static(graph, key))
            },
        );
        let mut references = query.collect(xcframeworks);

        if target.product.is_static() {
            references.extend(self.direct_static_targets(&mut query).into_vec());
        }

        let executables: Vec<NodeIndex> = graph
            .successors(query.from)
            .filter(|next| {
                graph.target_at(*next).is_some_and(|dependency| {
                    dependency.path != query.target.path
                        && matches!(dependency.product(), Product::App | Product::AppExtension)
                })
            })
            .collect();
        references.extend(query.collect(executables).into_vec());
        references.extend(self.resource_bundles(&mut query).into_vec());

        references.into_vec()
    }
}
