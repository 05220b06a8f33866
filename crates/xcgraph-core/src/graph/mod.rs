//! The dependency graph: construction, validation and loading.
//!
//! ## Submodules
//!
//! - [`build`]: [`GraphBuilder`] and the frozen [`DependencyGraph`].
//! - [`cycles`]: cycle detection over target edges.
//! - [`loader`]: turns descriptors plus artifact metadata into a graph.
//! - [`target`]: borrowed [`GraphTarget`] views.

pub mod build;
pub mod cycles;
pub mod loader;
pub mod target;

pub use build::{DependencyGraph, GraphBuilder};
pub use loader::GraphLoader;
pub use target::{GraphTarget, GraphTargetReference};
