#![forbid(unsafe_code)]
//! xcgraph-traverse library.
//!
//! Read-only queries over a [`DependencyGraph`](xcgraph_core::DependencyGraph):
//! what a target links, embeds, copies and searches, returned as ordered
//! [`Reference`] lists.
//!
//! # Conventions
//!
//! - **Errors**: queries are total over a valid graph and return plain
//!   values; an unknown target yields an empty result.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`).
//! - **Ordering**: every list is sorted by [`Reference`]'s `Ord`, path lists
//!   are sorted and deduplicated.

pub mod reference;
pub mod rules;
pub mod traverser;

pub use reference::{Reference, ReferenceSet};
pub use traverser::GraphTraverser;
