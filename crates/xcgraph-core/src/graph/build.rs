//! Graph construction and validation.
//!
//! # Overview
//!
//! [`GraphBuilder`] collects projects, nodes and conditional edges, then
//! [`GraphBuilder::build`] validates everything at once and freezes the
//! result into an immutable [`DependencyGraph`].
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A depends on B". Edge weights are the optional
//! [`PlatformCondition`] restricting the edge.
//!
//! ## Validation
//!
//! 1. Every target node names a registered project and a target inside it.
//! 2. Artifacts never depend on targets.
//! 3. Target edges are acyclic (see [`super::cycles`]).
//! 4. No chain is longer than the configured maximum depth.
//!
//! ## Content Hash
//!
//! The graph carries a BLAKE3 hash of its sorted node and edge lists, so an
//! emitter can skip regeneration when nothing changed.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument, warn};

use crate::condition::{union_optional, PlatformCondition};
use crate::config::TraversalConfig;
use crate::error::GraphError;
use crate::graph::cycles::find_target_cycle;
use crate::graph::target::GraphTarget;
use crate::key::{DependencyKey, TargetKey};
use crate::model::{ProjectDescriptor, TargetDescriptor, WorkspaceDescriptor};

type Inner = DiGraph<DependencyKey, Option<PlatformCondition>>;

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// A validated, immutable dependency graph.
///
/// Keys are interned: each distinct [`DependencyKey`] is stored once and
/// addressed by a [`NodeIndex`]. The graph owns everything it references,
/// so it can be shared across threads by reference.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    workspace: WorkspaceDescriptor,
    projects: BTreeMap<PathBuf, ProjectDescriptor>,
    targets: BTreeMap<PathBuf, BTreeMap<String, TargetDescriptor>>,
    graph: Inner,
    node_map: HashMap<DependencyKey, NodeIndex>,
    content_hash: String,
    conditional: bool,
}

impl DependencyGraph {
    #[must_use]
    pub const fn workspace(&self) -> &WorkspaceDescriptor {
        &self.workspace
    }

    #[must_use]
    pub const fn projects(&self) -> &BTreeMap<PathBuf, ProjectDescriptor> {
        &self.projects
    }

    #[must_use]
    pub fn project(&self, path: &Path) -> Option<&ProjectDescriptor> {
        self.projects.get(path)
    }

    /// Targets grouped by project path, then by name.
    #[must_use]
    pub const fn targets(&self) -> &BTreeMap<PathBuf, BTreeMap<String, TargetDescriptor>> {
        &self.targets
    }

    #[must_use]
    pub fn target(&self, path: &Path, name: &str) -> Option<GraphTarget<'_>> {
        let (path, project) = self.projects.get_key_value(path)?;
        let target = self.targets.get(path)?.get(name)?;
        Some(GraphTarget {
            path,
            target,
            project,
        })
    }

    #[must_use]
    pub fn target_for_key(&self, key: &TargetKey) -> Option<GraphTarget<'_>> {
        self.target(&key.project_path, &key.name)
    }

    /// The target behind a node, if the node is a target.
    #[must_use]
    pub fn target_at(&self, idx: NodeIndex) -> Option<GraphTarget<'_>> {
        self.key(idx)
            .as_target()
            .and_then(|key| self.target_for_key(key))
    }

    #[must_use]
    pub fn node_index(&self, key: &DependencyKey) -> Option<NodeIndex> {
        self.node_map.get(key).copied()
    }

    #[must_use]
    pub fn target_index(&self, path: &Path, name: &str) -> Option<NodeIndex> {
        self.node_index(&DependencyKey::target(path, name))
    }

    /// The key of a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn key(&self, idx: NodeIndex) -> &DependencyKey {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, in unspecified order.
    pub fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    /// Direct dependencies of `key`, sorted.
    #[must_use]
    pub fn dependencies(&self, key: &DependencyKey) -> Vec<&DependencyKey> {
        let Some(idx) = self.node_index(key) else {
            return Vec::new();
        };
        let mut deps: Vec<&DependencyKey> = self.successors(idx).map(|s| self.key(s)).collect();
        deps.sort();
        deps
    }

    /// Condition recorded on the edge `from → to`. `None` both for
    /// unconditional edges and for missing edges.
    #[must_use]
    pub fn edge_condition(&self, from: NodeIndex, to: NodeIndex) -> Option<&PlatformCondition> {
        self.graph
            .find_edge(from, to)
            .and_then(|edge| self.graph[edge].as_ref())
    }

    /// Whether any edge carries a condition. Condition queries short-circuit
    /// to "unconditional" when none does.
    #[must_use]
    pub const fn has_conditions(&self) -> bool {
        self.conditional
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// BLAKE3 hash of the sorted node and edge lists, `blake3:<hex>`.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub const fn inner(&self) -> &Inner {
        &self.graph
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Collects nodes and edges for a [`DependencyGraph`].
///
/// Adding is infallible; all validation happens in [`GraphBuilder::build`].
#[derive(Debug)]
pub struct GraphBuilder {
    workspace: WorkspaceDescriptor,
    projects: BTreeMap<PathBuf, ProjectDescriptor>,
    graph: Inner,
    node_map: HashMap<DependencyKey, NodeIndex>,
    max_depth: usize,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(workspace: WorkspaceDescriptor) -> Self {
        Self {
            workspace,
            projects: BTreeMap::new(),
            graph: Inner::new(),
            node_map: HashMap::new(),
            max_depth: TraversalConfig::default().max_depth,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Register a project and a node for each of its targets.
    pub fn add_project(&mut self, project: ProjectDescriptor) -> &mut Self {
        for target in &project.targets {
            self.add_node(DependencyKey::target(project.path.clone(), target.name.clone()));
        }
        self.projects.insert(project.path.clone(), project);
        self
    }

    /// Intern `key`, returning its index. Adding an existing key is a no-op.
    pub fn add_node(&mut self, key: DependencyKey) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.node_map.insert(key, idx);
        idx
    }

    /// Add `from → to`. Both endpoints are interned.
    ///
    /// Declaring the same edge twice keeps one edge whose condition is the
    /// union of both declarations.
    pub fn add_edge(
        &mut self,
        from: DependencyKey,
        to: DependencyKey,
        condition: Option<PlatformCondition>,
    ) -> &mut Self {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);

        if let Some(edge) = self.graph.find_edge(from_idx, to_idx) {
            warn!(
                from = %self.graph[from_idx],
                to = %self.graph[to_idx],
                "dependency declared more than once"
            );
            let merged = union_optional(self.graph[edge].as_ref(), condition.as_ref());
            self.graph[edge] = merged;
        } else {
            self.graph.add_edge(from_idx, to_idx, condition);
        }
        self
    }

    /// Validate and freeze the graph.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingProject`] / [`GraphError::TargetNotFound`] for
    ///   target nodes that were never registered through
    ///   [`GraphBuilder::add_project`].
    /// - [`GraphError::UnsupportedConfiguration`] for artifact → target
    ///   edges, artifact cycles and chains deeper than the maximum depth.
    /// - [`GraphError::CircularDependency`] for target cycles.
    #[instrument(skip(self), fields(workspace = %self.workspace.name))]
    pub fn build(self) -> Result<DependencyGraph, GraphError> {
        self.validate_targets()?;
        self.validate_artifact_edges()?;

        if let Some(cycle) = find_target_cycle(&self.graph) {
            return Err(GraphError::CircularDependency { cycle });
        }
        self.validate_depth()?;

        let targets: BTreeMap<PathBuf, BTreeMap<String, TargetDescriptor>> = self
            .projects
            .iter()
            .map(|(path, project)| {
                let by_name: BTreeMap<String, TargetDescriptor> = project
                    .targets
                    .iter()
                    .map(|t| (t.name.clone(), t.clone()))
                    .collect();
                (path.clone(), by_name)
            })
            .collect();
        let content_hash = compute_content_hash(&self.graph);
        let conditional = self
            .graph
            .edge_references()
            .any(|edge| edge.weight().is_some());

        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            %content_hash,
            "dependency graph built"
        );

        Ok(DependencyGraph {
            workspace: self.workspace,
            projects: self.projects,
            targets,
            graph: self.graph,
            node_map: self.node_map,
            content_hash,
            conditional,
        })
    }

    fn sorted_nodes(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        nodes
    }

    fn validate_targets(&self) -> Result<(), GraphError> {
        for idx in self.sorted_nodes() {
            let Some(key) = self.graph[idx].as_target() else {
                continue;
            };
            let project = self.projects.get(&key.project_path).ok_or_else(|| {
                GraphError::MissingProject {
                    path: key.project_path.clone(),
                }
            })?;
            if project.target(&key.name).is_none() {
                return Err(GraphError::TargetNotFound {
                    name: key.name.clone(),
                    project_path: key.project_path.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_artifact_edges(&self) -> Result<(), GraphError> {
        let mut offending: Vec<(&DependencyKey, &DependencyKey)> = self
            .graph
            .edge_references()
            .map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()]))
            .filter(|(from, to)| !from.is_target() && to.is_target())
            .collect();
        offending.sort();

        match offending.first() {
            Some((from, to)) => Err(GraphError::unsupported(format!(
                "{from} cannot depend on {to}: only targets may depend on targets"
            ))),
            None => Ok(()),
        }
    }

    /// Longest chain, in edges, must not exceed `max_depth`.
    fn validate_depth(&self) -> Result<(), GraphError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            GraphError::unsupported(format!(
                "dependency cycle through {}",
                self.graph[cycle.node_id()]
            ))
        })?;

        let mut depth = vec![0usize; self.graph.node_count()];
        for &idx in order.iter().rev() {
            let longest = self
                .graph
                .neighbors(idx)
                .map(|next| depth[next.index()] + 1)
                .max()
                .unwrap_or(0);
            if longest > self.max_depth {
                return Err(GraphError::unsupported(format!(
                    "dependency chain of {longest} edges from {} exceeds max_depth {}",
                    self.graph[idx], self.max_depth
                )));
            }
            depth[idx.index()] = longest;
        }
        Ok(())
    }
}

fn compute_content_hash(graph: &Inner) -> String {
    let mut nodes: Vec<String> = graph
        .node_indices()
        .map(|idx| format!("{:?}", graph[idx]))
        .collect();
    nodes.sort_unstable();

    let mut edges: Vec<String> = graph
        .edge_references()
        .map(|edge| {
            let condition = edge
                .weight()
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            format!(
                "{:?}\x00{:?}\x00{condition}",
                graph[edge.source()],
                graph[edge.target()]
            )
        })
        .collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for line in nodes.iter().chain(edges.iter()) {
        hasher.update(line.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}
