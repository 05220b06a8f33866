#![forbid(unsafe_code)]
//! xcgraph-core library.
//!
//! The data model and the validated dependency graph that the traversal
//! crate answers link, embed and search-path queries over.
//!
//! # Conventions
//!
//! - **Errors**: graph construction returns [`GraphError`]; configuration
//!   loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`, `warn!`).

pub mod condition;
pub mod config;
pub mod error;
pub mod graph;
pub mod key;
pub mod metadata;
pub mod model;

pub use condition::{CombinationResult, PlatformCondition};
pub use config::GraphConfig;
pub use error::{ArtifactKind, ErrorCode, GraphError};
pub use graph::{DependencyGraph, GraphBuilder, GraphLoader, GraphTarget, GraphTargetReference};
pub use key::{DependencyKey, PrecompiledBinary, PrecompiledOrigin, TargetKey};
