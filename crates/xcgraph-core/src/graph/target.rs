use std::cmp::Ordering;
use std::path::Path;

use crate::condition::PlatformCondition;
use crate::key::{DependencyKey, TargetKey};
use crate::model::{Product, ProjectDescriptor, TargetDescriptor};

/// A target together with the project it belongs to.
///
/// Borrowed from a [`DependencyGraph`](super::DependencyGraph) on demand;
/// never stored.
#[derive(Debug, Clone, Copy)]
pub struct GraphTarget<'g> {
    pub path: &'g Path,
    pub target: &'g TargetDescriptor,
    pub project: &'g ProjectDescriptor,
}

impl GraphTarget<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.target.name
    }

    #[must_use]
    pub const fn product(&self) -> Product {
        self.target.product
    }

    #[must_use]
    pub fn key(&self) -> TargetKey {
        TargetKey::new(self.path, self.target.name.clone())
    }

    #[must_use]
    pub fn dependency_key(&self) -> DependencyKey {
        DependencyKey::Target(self.key())
    }
}

impl PartialEq for GraphTarget<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.target.name == other.target.name
    }
}

impl Eq for GraphTarget<'_> {}

impl PartialOrd for GraphTarget<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphTarget<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(other.path)
            .then_with(|| self.target.name.cmp(&other.target.name))
    }
}

/// A target reached through an edge, with the net condition of that edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphTargetReference<'g> {
    pub target: GraphTarget<'g>,
    pub condition: Option<PlatformCondition>,
}
