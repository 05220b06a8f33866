//! Platform conditions and the algebra that combines them.
//!
//! # Overview
//!
//! An edge may carry a [`PlatformCondition`] restricting it to a subset of
//! platforms. `None` (no condition) means the edge applies everywhere.
//!
//! Two operations combine conditions:
//!
//! - **Along one path** the conditions are intersected
//!   ([`CombinationResult::narrow`], [`combine_path`]). An unconditional
//!   edge does not narrow. An empty intersection makes the whole path
//!   [`CombinationResult::Incompatible`].
//! - **Across paths** the results are unioned
//!   ([`CombinationResult::combine_with`]). An unconditional path absorbs
//!   everything else and incompatible paths contribute nothing.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Platform;

// ---------------------------------------------------------------------------
// PlatformCondition
// ---------------------------------------------------------------------------

/// A non-empty set of platforms an edge is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeSet<Platform>", into = "BTreeSet<Platform>")]
pub struct PlatformCondition {
    platforms: BTreeSet<Platform>,
}

/// Error for a condition with no platforms in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a platform condition needs at least one platform")]
pub struct EmptyCondition;

impl PlatformCondition {
    /// Restrict to `platforms`. Returns `None` for an empty set, since an
    /// edge that applies nowhere is not representable as a condition.
    #[must_use]
    pub fn when(platforms: impl IntoIterator<Item = Platform>) -> Option<Self> {
        let platforms: BTreeSet<Platform> = platforms.into_iter().collect();
        if platforms.is_empty() {
            None
        } else {
            Some(Self { platforms })
        }
    }

    #[must_use]
    pub const fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    #[must_use]
    pub fn contains(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// AND of two restrictions.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> CombinationResult {
        let common = self.platforms.intersection(&other.platforms).copied();
        Self::when(common).map_or(CombinationResult::Incompatible, |c| {
            CombinationResult::Condition(Some(c))
        })
    }

    /// OR of two restrictions.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            platforms: self.platforms.union(&other.platforms).copied().collect(),
        }
    }
}

impl TryFrom<BTreeSet<Platform>> for PlatformCondition {
    type Error = EmptyCondition;

    fn try_from(platforms: BTreeSet<Platform>) -> Result<Self, Self::Error> {
        Self::when(platforms).ok_or(EmptyCondition)
    }
}

impl From<PlatformCondition> for BTreeSet<Platform> {
    fn from(condition: PlatformCondition) -> Self {
        condition.platforms
    }
}

impl fmt::Display for PlatformCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.platforms.iter().map(|p| p.as_str()).collect();
        write!(f, "when[{}]", names.join(","))
    }
}

/// Union of two optional conditions where `None` (unconditional) absorbs.
#[must_use]
pub fn union_optional(
    lhs: Option<&PlatformCondition>,
    rhs: Option<&PlatformCondition>,
) -> Option<PlatformCondition> {
    match (lhs, rhs) {
        (Some(a), Some(b)) => Some(a.union(b)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// CombinationResult
// ---------------------------------------------------------------------------

/// Net restriction between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombinationResult {
    /// No path applies on any platform.
    Incompatible,
    /// At least one path applies; `None` means on every platform.
    Condition(Option<PlatformCondition>),
}

impl CombinationResult {
    pub const UNCONDITIONAL: Self = Self::Condition(None);

    /// AND with one more edge condition along the same path.
    #[must_use]
    pub fn narrow(self, edge: Option<&PlatformCondition>) -> Self {
        match (self, edge) {
            (Self::Incompatible, _) => Self::Incompatible,
            (current, None) => current,
            (Self::Condition(None), Some(edge)) => Self::Condition(Some(edge.clone())),
            (Self::Condition(Some(current)), Some(edge)) => current.intersection(edge),
        }
    }

    /// OR with the result of another path.
    #[must_use]
    pub fn combine_with(self, other: Self) -> Self {
        match (self, other) {
            (Self::Incompatible, other) => other,
            (this, Self::Incompatible) => this,
            (Self::Condition(a), Self::Condition(b)) => {
                Self::Condition(union_optional(a.as_ref(), b.as_ref()))
            }
        }
    }

    #[must_use]
    pub const fn is_incompatible(&self) -> bool {
        matches!(self, Self::Incompatible)
    }

    /// The resulting condition, or `None` when incompatible.
    #[must_use]
    pub fn into_condition(self) -> Option<Option<PlatformCondition>> {
        match self {
            Self::Incompatible => None,
            Self::Condition(condition) => Some(condition),
        }
    }
}

/// Combine the edge conditions found along one path.
#[must_use]
pub fn combine_path<'a>(
    conditions: impl IntoIterator<Item = Option<&'a PlatformCondition>>,
) -> CombinationResult {
    conditions
        .into_iter()
        .fold(CombinationResult::UNCONDITIONAL, CombinationResult::narrow)
}
