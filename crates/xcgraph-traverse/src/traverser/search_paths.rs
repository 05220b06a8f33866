//! Compiler and runtime search paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::instrument;
use xcgraph_core::key::{DependencyKey, PrecompiledBinary, PrecompiledOrigin};
use xcgraph_core::model::Product;

use super::GraphTraverser;
use crate::reference::Reference;
use crate::rules;

fn parent_dirs<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
    let dirs: BTreeSet<PathBuf> = paths
        .into_iter()
        .filter_map(Path::parent)
        .map(Path::to_path_buf)
        .collect();
    dirs.into_iter().collect()
}

impl<'g> GraphTraverser<'g> {
    /// Everything `name`'s compiler must see: its linkable dependencies
    /// (host app included) plus the precompiled static frameworks and
    /// libraries reachable through static hops, which an intermediate static
    /// target sees but does not link.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn searchable_path_dependencies(&self, path: &Path, name: &str) -> Vec<Reference> {
        let Some(mut query) = self.query(path, name) else {
            return Vec::new();
        };
        let mut references = self.linkable(&mut query, false);
        let graph = self.graph;
        let precompiled = self.filter_dependencies(
            &[query.from],
            rules::is_precompiled_static_binary,
            |key| rules::can_link_static_products(graph, key) || rules::is_macro(graph, key),
        );
        references.extend(query.collect(precompiled).into_vec());
        references.into_vec()
    }

    fn direct_libraries(&self, path: &Path, name: &str) -> Vec<&'g PrecompiledBinary> {
        self.graph
            .target_index(path, name)
            .into_iter()
            .flat_map(|node| self.graph.successors(node))
            .filter_map(|next| self.key(next).as_precompiled())
            .filter(|binary| binary.is_library())
            .collect()
    }

    /// Directories of the libraries `name` links or declares.
    #[must_use]
    pub fn libraries_search_paths(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let Some(mut query) = self.query(path, name) else {
            return Vec::new();
        };
        let linked = self.linkable(&mut query, false).into_vec();
        let linked_libraries = linked.iter().filter_map(|reference| match reference {
            Reference::Library { path, .. } => Some(path.as_path()),
            _ => None,
        });
        let direct = self.direct_libraries(path, name);
        parent_dirs(
            direct
                .iter()
                .map(|binary| binary.path.as_path())
                .chain(linked_libraries),
        )
    }

    /// Directories of the Swift module maps of `name`'s direct libraries.
    #[must_use]
    pub fn libraries_swift_include_paths(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        parent_dirs(
            self.direct_libraries(path, name)
                .into_iter()
                .filter_map(|binary| match &binary.origin {
                    PrecompiledOrigin::Library {
                        swift_module_map, ..
                    } => swift_module_map.as_deref(),
                    PrecompiledOrigin::Framework | PrecompiledOrigin::XcFramework { .. } => None,
                }),
        )
    }

    /// Public header directories of `name`'s direct libraries.
    #[must_use]
    pub fn libraries_public_headers_folders(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let folders: BTreeSet<PathBuf> = self
            .direct_libraries(path, name)
            .into_iter()
            .filter_map(|binary| match &binary.origin {
                PrecompiledOrigin::Library { public_headers, .. } => Some(public_headers.clone()),
                PrecompiledOrigin::Framework | PrecompiledOrigin::XcFramework { .. } => None,
            })
            .collect();
        folders.into_iter().collect()
    }

    /// Directories of the dynamic frameworks a unit test bundle without a
    /// host app loads at run time. Empty for every other target.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn run_path_search_paths(&self, path: &Path, name: &str) -> Vec<PathBuf> {
        let Some(target) = self.graph.target(path, name) else {
            return Vec::new();
        };
        if target.product() != Product::UnitTests
            || !rules::can_embed_frameworks(target.target)
            || self.unit_test_host(path, name).is_some()
        {
            return Vec::new();
        }
        let Some(from) = self.graph.target_index(path, name) else {
            return Vec::new();
        };

        let graph = self.graph;
        let frameworks = self.filter_dependencies(
            &[from],
            |key| {
                matches!(key, DependencyKey::Precompiled(binary)
                    if binary.is_dynamic() && !binary.is_library())
            },
            |key| rules::can_dependency_embed_frameworks(graph, key),
        );
        parent_dirs(frameworks.into_iter().filter_map(|node| self.key(node).path()))
    }
}
