//! The read-only query engine.
//!
//! # Overview
//!
//! [`GraphTraverser`] borrows a [`DependencyGraph`] and answers questions
//! about one target at a time. Queries never mutate the graph and keep all
//! scratch state (visited sets, condition memo) local to the call, so one
//! traverser can serve many threads at once.
//!
//! ## Walks
//!
//! Every resolver is built on [`GraphTraverser::filter_dependencies`]: an
//! explicit-stack depth-first walk from a set of roots that collects the
//! nodes passing a `test` and does not descend below nodes matching `skip`.
//! Roots themselves are neither tested nor skipped.
//!
//! ## Query families
//!
//! | Module          | Queries |
//! |-----------------|---------|
//! | `linking`       | linkable dependencies |
//! | `embedding`     | embeddable frameworks |
//! | `resources`     | resource bundles, copy products |
//! | `search_paths`  | searchable dependencies, library and run-path search paths |
//! | `macros`        | macro executables and plugin specifiers |
//! | this module     | target lookups, direct and transitive target dependencies |

mod condition;
mod embedding;
mod linking;
mod macros;
mod resources;
mod search_paths;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;
use tracing::instrument;
use xcgraph_core::condition::CombinationResult;
use xcgraph_core::key::DependencyKey;
use xcgraph_core::model::Product;
use xcgraph_core::{DependencyGraph, GraphTarget, GraphTargetReference};

use crate::reference::{Reference, ReferenceSet};
use crate::rules;

use self::condition::ConditionCache;

const XCTEST_SDK: &str = "XCTest.framework";

/// Products listed as app extensions of a host app.
const APP_EXTENSION_PRODUCTS: [Product; 5] = [
    Product::AppExtension,
    Product::StickerPackExtension,
    Product::Watch2Extension,
    Product::TvTopShelfExtension,
    Product::MessagesExtension,
];

/// Query engine over a borrowed graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphTraverser<'g> {
    graph: &'g DependencyGraph,
}

/// Scratch state for one query rooted at one target.
pub(crate) struct Query<'g> {
    graph: &'g DependencyGraph,
    from: NodeIndex,
    target: GraphTarget<'g>,
    conditions: ConditionCache<'g>,
}

impl<'g> Query<'g> {
    /// The reference for `to`, or `None` when the node has no reference form
    /// or no route to it applies on any platform.
    fn reference(&mut self, to: NodeIndex) -> Option<Reference> {
        let condition = self.conditions.resolve(self.from, to).into_condition()?;
        match self.graph.key(to) {
            DependencyKey::Target(key) => self
                .graph
                .target_for_key(key)
                .map(|target| Reference::product(target, condition)),
            DependencyKey::Precompiled(binary) => Some(Reference::precompiled(binary, condition)),
            DependencyKey::Sdk {
                path,
                status,
                source,
                ..
            } => Some(Reference::Sdk {
                path: path.clone(),
                status: *status,
                source: *source,
                condition,
            }),
            DependencyKey::Bundle { path } => Some(Reference::Bundle {
                path: path.clone(),
                condition,
            }),
            DependencyKey::PackageProduct { .. } | DependencyKey::Macro { .. } => None,
        }
    }

    fn collect(&mut self, nodes: impl IntoIterator<Item = NodeIndex>) -> ReferenceSet {
        nodes
            .into_iter()
            .filter_map(|node| self.reference(node))
            .collect()
    }

    fn target_reference(&mut self, to: NodeIndex) -> Option<GraphTargetReference<'g>> {
        let target = self.graph.target_at(to)?;
        let condition = self.conditions.resolve(self.from, to).into_condition()?;
        Some(GraphTargetReference { target, condition })
    }
}

impl<'g> GraphTraverser<'g> {
    #[must_use]
    pub const fn new(graph: &'g DependencyGraph) -> Self {
        Self { graph }
    }

    #[must_use]
    pub const fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    fn query(&self, path: &Path, name: &str) -> Option<Query<'g>> {
        let target = self.graph.target(path, name)?;
        let from = self.graph.target_index(path, name)?;
        Some(Query {
            graph: self.graph,
            from,
            target,
            conditions: ConditionCache::new(self.graph),
        })
    }

    fn key(&self, node: NodeIndex) -> &'g DependencyKey {
        self.graph.key(node)
    }

    /// Nodes reachable from `roots` that pass `test`, not descending below
    /// nodes that match `skip`.
    pub(crate) fn filter_dependencies(
        &self,
        roots: &[NodeIndex],
        mut test: impl FnMut(&DependencyKey) -> bool,
        mut skip: impl FnMut(&DependencyKey) -> bool,
    ) -> BTreeSet<NodeIndex> {
        let root_set: HashSet<NodeIndex> = roots.iter().copied().collect();
        let mut stack: Vec<NodeIndex> = roots.to_vec();
        let mut visited = HashSet::new();
        let mut found = BTreeSet::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let key = self.key(node);
            let is_root = root_set.contains(&node);
            if !is_root && test(key) {
                found.insert(node);
            }
            if !is_root && skip(key) {
                continue;
            }
            stack.extend(
                self.graph
                    .successors(node)
                    .filter(|next| !visited.contains(next)),
            );
        }
        found
    }

    /// Everything reachable from `from`, `from` included.
    fn reachable(&self, from: NodeIndex) -> BTreeSet<NodeIndex> {
        let mut nodes = self.filter_dependencies(&[from], |_| true, |_| false);
        nodes.insert(from);
        nodes
    }

    /// Net condition under which `from` needs `to`.
    #[must_use]
    pub fn combined_condition(&self, from: &DependencyKey, to: &DependencyKey) -> CombinationResult {
        match (self.graph.node_index(from), self.graph.node_index(to)) {
            (Some(from), Some(to)) => ConditionCache::new(self.graph).between(from, to),
            _ => CombinationResult::Incompatible,
        }
    }

    // -----------------------------------------------------------------------
    // Targets
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn target(&self, path: &Path, name: &str) -> Option<GraphTarget<'g>> {
        self.graph.target(path, name)
    }

    /// Targets of one project, sorted by name.
    #[must_use]
    pub fn targets_at(&self, path: &Path) -> Vec<GraphTarget<'g>> {
        self.graph
            .targets()
            .get(path)
            .into_iter()
            .flat_map(|by_name| by_name.keys())
            .filter_map(|name| self.graph.target(path, name))
            .collect()
    }

    #[must_use]
    pub fn all_targets(&self) -> Vec<GraphTarget<'g>> {
        self.graph
            .targets()
            .keys()
            .flat_map(|path| self.targets_at(path))
            .collect()
    }

    /// Targets of the projects the workspace lists directly.
    #[must_use]
    pub fn root_targets(&self) -> Vec<GraphTarget<'g>> {
        let roots: BTreeSet<GraphTarget<'g>> = self
            .graph
            .workspace()
            .projects
            .iter()
            .flat_map(|path| self.targets_at(path))
            .collect();
        roots.into_iter().collect()
    }

    /// All targets, each after every target it depends on. Ties break on
    /// `(project path, name)`.
    #[must_use]
    pub fn all_targets_topological_sorted(&self) -> Vec<GraphTarget<'g>> {
        let targets = self.all_targets();
        let mut pending: BTreeMap<GraphTarget<'g>, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<GraphTarget<'g>, Vec<GraphTarget<'g>>> = BTreeMap::new();

        for target in &targets {
            let dependencies = self.direct_targets(*target);
            pending.insert(*target, dependencies.len());
            for dependency in dependencies {
                dependents.entry(dependency).or_default().push(*target);
            }
        }

        let mut ready: BTreeSet<GraphTarget<'g>> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(target, _)| *target)
            .collect();
        let mut order = Vec::with_capacity(targets.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for dependent in dependents.get(&next).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }
        order
    }

    fn direct_targets(&self, target: GraphTarget<'g>) -> BTreeSet<GraphTarget<'g>> {
        self.graph
            .target_index(target.path, target.name())
            .into_iter()
            .flat_map(|node| self.graph.successors(node))
            .filter_map(|next| self.graph.target_at(next))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Target dependencies
    // -----------------------------------------------------------------------

    /// Targets `name` depends on directly, with the condition of each edge.
    #[must_use]
    pub fn direct_target_dependencies(
        &self,
        path: &Path,
        name: &str,
    ) -> Vec<GraphTargetReference<'g>> {
        let Some(mut query) = self.query(path, name) else {
            return Vec::new();
        };
        let successors: BTreeSet<NodeIndex> = self.graph.successors(query.from).collect();
        let references: BTreeSet<GraphTargetReference<'g>> = successors
            .into_iter()
            .filter_map(|next| query.target_reference(next))
            .collect();
        references.into_iter().collect()
    }

    /// Direct target dependencies declared in the same project.
    #[must_use]
    pub fn direct_local_target_dependencies(
        &self,
        path: &Path,
        name: &str,
    ) -> Vec<GraphTargetReference<'g>> {
        let mut references = self.direct_target_dependencies(path, name);
        references.retain(|reference| reference.target.path == path);
        references
    }

    /// Direct target dependencies living in other projects.
    #[must_use]
    pub fn direct_non_local_target_dependencies(
        &self,
        path: &Path,
        name: &str,
    ) -> Vec<GraphTargetReference<'g>> {
        let mut references = self.direct_target_dependencies(path, name);
        references.retain(|reference| reference.target.path != path);
        references
    }

    /// Every target reachable from `name`, not including itself.
    #[must_use]
    pub fn all_target_dependencies(&self, path: &Path, name: &str) -> Vec<GraphTarget<'g>> {
        let Some(from) = self.graph.target_index(path, name) else {
            return Vec::new();
        };
        let nodes =
            self.filter_dependencies(&[from], DependencyKey::is_target, |key| !key.is_target());
        let targets: BTreeSet<GraphTarget<'g>> = nodes
            .into_iter()
            .filter_map(|node| self.graph.target_at(node))
            .collect();
        targets.into_iter().collect()
    }

    /// Static targets `name` depends on directly.
    #[must_use]
    pub fn direct_static_dependencies(&self, path: &Path, name: &str) -> Vec<Reference> {
        self.query(path, name)
            .map(|mut query| self.direct_static_targets(&mut query).into_vec())
            .unwrap_or_default()
    }

    fn direct_static_targets(&self, query: &mut Query<'g>) -> ReferenceSet {
        let nodes: Vec<NodeIndex> = self
            .graph
            .successors(query.from)
            .filter(|next| rules::is_static_target(self.graph, self.key(*next)))
            .collect();
        query.collect(nodes)
    }

    #[must_use]
    pub fn app_extension_dependencies(
        &self,
        path: &Path,
        name: &str,
    ) -> Vec<GraphTargetReference<'g>> {
        let mut references = self.direct_target_dependencies(path, name);
        references.retain(|reference| APP_EXTENSION_PRODUCTS.contains(&reference.target.product()));
        references
    }

    #[must_use]
    pub fn app_clip_dependencies(&self, path: &Path, name: &str) -> Option<GraphTargetReference<'g>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .find(|reference| reference.target.product() == Product::AppClip)
    }

    /// The app a test bundle runs inside: its first direct dependency able to
    /// host tests.
    #[must_use]
    pub fn unit_test_host(&self, path: &Path, name: &str) -> Option<GraphTarget<'g>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .map(|reference| reference.target)
            .find(|target| target.product().can_host_tests())
    }

    /// The first target of the same project that depends on `name` directly.
    #[must_use]
    pub fn host_target_for(&self, path: &Path, name: &str) -> Option<GraphTarget<'g>> {
        let dependency = self.graph.target_index(path, name)?;
        self.targets_at(path).into_iter().find(|candidate| {
            self.graph
                .target_index(candidate.path, candidate.name())
                .is_some_and(|node| self.graph.successors(node).any(|next| next == dependency))
        })
    }

    /// Test bundles, targets opting into testing search paths, and targets
    /// linking `XCTest.framework` directly.
    #[must_use]
    pub fn depends_on_xctest(&self, path: &Path, name: &str) -> bool {
        let Some(target) = self.graph.target(path, name) else {
            return false;
        };
        if target.product().is_tests_bundle() || target.target.enable_testing_search_paths {
            return true;
        }
        self.graph
            .target_index(path, name)
            .into_iter()
            .flat_map(|node| self.graph.successors(node))
            .any(|next| {
                matches!(self.key(next), DependencyKey::Sdk { name, .. } if name == XCTEST_SDK)
            })
    }

    /// Whether `name` or anything it depends on needs XCTest on the search
    /// paths.
    #[must_use]
    pub fn needs_enable_testing_search_paths(&self, path: &Path, name: &str) -> bool {
        self.depends_on_xctest(path, name)
            || self
                .all_target_dependencies(path, name)
                .iter()
                .any(|dependency| self.depends_on_xctest(dependency.path, dependency.name()))
    }

    // -----------------------------------------------------------------------
    // Whole-graph queries
    // -----------------------------------------------------------------------

    /// Union of linkable, embeddable and copy-product references over every
    /// target of a project.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn all_project_dependencies(&self, path: &Path) -> Vec<Reference> {
        let mut references = ReferenceSet::new();
        for target in self.targets_at(path) {
            let name = target.name();
            references.extend(self.linkable_dependencies(path, name));
            references.extend(self.embeddable_frameworks(path, name));
            references.extend(self.copy_product_dependencies(path, name));
        }
        references.into_vec()
    }

    /// Paths of every precompiled `.framework` in the graph.
    #[must_use]
    pub fn precompiled_frameworks_paths(&self) -> Vec<PathBuf> {
        let paths: BTreeSet<PathBuf> = self
            .graph
            .node_indices()
            .filter_map(|node| self.key(node).as_precompiled())
            .filter(|binary| binary.is_framework())
            .map(|binary| binary.path.clone())
            .collect();
        paths.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcgraph_core::model::{ProjectDescriptor, TargetDescriptor, WorkspaceDescriptor};
    use xcgraph_core::GraphBuilder;

    fn target(name: &str) -> DependencyKey {
        DependencyKey::target("/p", name)
    }

    /// `A → B → D`, `A → C → D`.
    fn diamond() -> DependencyGraph {
        let project = ["A", "B", "C", "D"].iter().fold(
            ProjectDescriptor::new("/p", "P"),
            |project, name| project.with_target(TargetDescriptor::new(*name, Product::Framework)),
        );
        let mut builder = GraphBuilder::new(WorkspaceDescriptor::new("/", "W").with_project("/p"));
        builder.add_project(project);
        builder.add_edge(target("A"), target("B"), None);
        builder.add_edge(target("A"), target("C"), None);
        builder.add_edge(target("B"), target("D"), None);
        builder.add_edge(target("C"), target("D"), None);
        builder.build().expect("build")
    }

    #[test]
    fn filter_visits_shared_nodes_once() {
        let graph = diamond();
        let traverser = GraphTraverser::new(&graph);
        let from = graph.node_index(&target("A")).expect("A");

        let mut tested = 0;
        let found = traverser.filter_dependencies(
            &[from],
            |_| {
                tested += 1;
                true
            },
            |_| false,
        );
        assert_eq!(found.len(), 3);
        assert_eq!(tested, 3);
    }

    #[test]
    fn skip_stops_descent_but_still_tests() {
        let graph = diamond();
        let traverser = GraphTraverser::new(&graph);
        let from = graph.node_index(&target("A")).expect("A");
        let b = target("B");
        let c = target("C");

        let found = traverser.filter_dependencies(&[from], |_| true, |key| *key == b || *key == c);
        let names: Vec<&DependencyKey> = found.iter().map(|node| graph.key(*node)).collect();
        assert_eq!(names, vec![&b, &c]);
    }

    #[test]
    fn roots_are_not_reported() {
        let graph = diamond();
        let traverser = GraphTraverser::new(&graph);
        let from = graph.node_index(&target("A")).expect("A");
        let found = traverser.filter_dependencies(&[from], |_| true, |_| false);
        assert!(!found.contains(&from));
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let graph = diamond();
        let order: Vec<String> = GraphTraverser::new(&graph)
            .all_targets_topological_sorted()
            .iter()
            .map(|target| target.name().to_string())
            .collect();
        assert_eq!(order, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn host_target_is_the_direct_dependent() {
        let graph = diamond();
        let traverser = GraphTraverser::new(&graph);
        let host = traverser.host_target_for(Path::new("/p"), "D").expect("host");
        assert_eq!(host.name(), "B");
        assert!(traverser.host_target_for(Path::new("/p"), "A").is_none());
    }

    #[test]
    fn unknown_targets_answer_empty() {
        let graph = diamond();
        let traverser = GraphTraverser::new(&graph);
        let nowhere = Path::new("/nowhere");
        assert!(traverser.direct_target_dependencies(nowhere, "A").is_empty());
        assert!(traverser.all_target_dependencies(nowhere, "A").is_empty());
        assert!(traverser.linkable_dependencies(nowhere, "A").is_empty());
        assert!(traverser.embeddable_frameworks(nowhere, "A").is_empty());
        assert!(!traverser.depends_on_xctest(nowhere, "A"));
    }
}
