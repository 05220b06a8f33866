//! Query results and their canonical order.
//!
//! # Overview
//!
//! A [`Reference`] is a linking, embedding or copying instruction for one
//! artifact, derived from a [`DependencyKey`](xcgraph_core::DependencyKey)
//! and the net condition under which it applies. Unlike keys, references are
//! not identities: two keys for the same framework reached through
//! different routes collapse into one reference.
//!
//! ## Ordering
//!
//! The derived `Ord` is the output order of every query. Variants are
//! declared in category order (`sdk < product < library < framework <
//! xcframework < bundle`) and each variant leads with its identifying field,
//! so ties within a category break on path or product file name. Products
//! with the same file name fall back to project path, then target name.
//!
//! ## Merging
//!
//! [`ReferenceSet`] keys references by category plus identifying field. A
//! product is identified by its project and target, like the target key it
//! came from.
//! Inserting a reference that is already present unions the conditions
//! (unconditional absorbs) and keeps the stronger linking status.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use xcgraph_core::condition::{union_optional, PlatformCondition};
use xcgraph_core::key::{PrecompiledBinary, PrecompiledOrigin, XcFrameworkInfoPlist};
use xcgraph_core::model::{BinaryArchitecture, BinaryLinking, LinkingStatus, SdkSource};
use xcgraph_core::GraphTarget;

/// Path fragment identifying frameworks built by Carthage.
const CARTHAGE_BUILD_DIR: &str = "Carthage/Build";

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// One item of a query result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reference {
    Sdk {
        path: PathBuf,
        status: LinkingStatus,
        source: SdkSource,
        condition: Option<PlatformCondition>,
    },
    /// The built product of another target, e.g. `Core.framework`.
    Product {
        product_name: String,
        project: PathBuf,
        target: String,
        condition: Option<PlatformCondition>,
    },
    Library {
        path: PathBuf,
        public_headers: PathBuf,
        swift_module_map: Option<PathBuf>,
        linking: BinaryLinking,
        architectures: BTreeSet<BinaryArchitecture>,
        condition: Option<PlatformCondition>,
    },
    Framework {
        path: PathBuf,
        binary_path: PathBuf,
        dsym_path: Option<PathBuf>,
        bcsymbolmap_paths: Vec<PathBuf>,
        linking: BinaryLinking,
        architectures: BTreeSet<BinaryArchitecture>,
        is_third_party: bool,
        status: LinkingStatus,
        condition: Option<PlatformCondition>,
    },
    XcFramework {
        path: PathBuf,
        info_plist: XcFrameworkInfoPlist,
        primary_binary_path: PathBuf,
        linking: BinaryLinking,
        status: LinkingStatus,
        condition: Option<PlatformCondition>,
    },
    Bundle {
        path: PathBuf,
        condition: Option<PlatformCondition>,
    },
}

impl Reference {
    /// Product reference for a target.
    #[must_use]
    pub fn product(target: GraphTarget<'_>, condition: Option<PlatformCondition>) -> Self {
        Self::Product {
            product_name: target.target.product_file_name(),
            project: target.path.to_path_buf(),
            target: target.target.name.clone(),
            condition,
        }
    }

    #[must_use]
    pub fn precompiled(binary: &PrecompiledBinary, condition: Option<PlatformCondition>) -> Self {
        match &binary.origin {
            PrecompiledOrigin::Framework => Self::Framework {
                path: binary.path.clone(),
                binary_path: binary.binary_path.clone(),
                dsym_path: binary.dsym_path.clone(),
                bcsymbolmap_paths: binary.bcsymbolmap_paths.clone(),
                linking: binary.linking,
                architectures: binary.architectures.clone(),
                is_third_party: is_third_party(&binary.path),
                status: binary.status,
                condition,
            },
            PrecompiledOrigin::Library {
                public_headers,
                swift_module_map,
            } => Self::Library {
                path: binary.path.clone(),
                public_headers: public_headers.clone(),
                swift_module_map: swift_module_map.clone(),
                linking: binary.linking,
                architectures: binary.architectures.clone(),
                condition,
            },
            PrecompiledOrigin::XcFramework { info_plist } => Self::XcFramework {
                path: binary.path.clone(),
                info_plist: info_plist.clone(),
                primary_binary_path: binary.binary_path.clone(),
                linking: binary.linking,
                status: binary.status,
                condition,
            },
        }
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&PlatformCondition> {
        match self {
            Self::Sdk { condition, .. }
            | Self::Product { condition, .. }
            | Self::Library { condition, .. }
            | Self::Framework { condition, .. }
            | Self::XcFramework { condition, .. }
            | Self::Bundle { condition, .. } => condition.as_ref(),
        }
    }

    /// Path of the artifact; `None` for products.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Product { .. } => None,
            Self::Sdk { path, .. }
            | Self::Library { path, .. }
            | Self::Framework { path, .. }
            | Self::XcFramework { path, .. }
            | Self::Bundle { path, .. } => Some(path.as_path()),
        }
    }

    /// The identity references are merged on.
    #[must_use]
    pub fn id(&self) -> ReferenceId {
        match self {
            Self::Sdk { path, .. } => ReferenceId::Sdk(path.clone()),
            Self::Product {
                product_name,
                project,
                target,
                ..
            } => ReferenceId::Product {
                product_name: product_name.clone(),
                project: project.clone(),
                target: target.clone(),
            },
            Self::Library { path, .. } => ReferenceId::Library(path.clone()),
            Self::Framework { path, .. } => ReferenceId::Framework(path.clone()),
            Self::XcFramework { path, .. } => ReferenceId::XcFramework(path.clone()),
            Self::Bundle { path, .. } => ReferenceId::Bundle(path.clone()),
        }
    }

    /// Linking status, for the categories that carry one.
    #[must_use]
    pub const fn status(&self) -> Option<LinkingStatus> {
        match self {
            Self::Sdk { status, .. }
            | Self::Framework { status, .. }
            | Self::XcFramework { status, .. } => Some(*status),
            Self::Product { .. } | Self::Library { .. } | Self::Bundle { .. } => None,
        }
    }

    const fn parts_mut(&mut self) -> (&mut Option<PlatformCondition>, Option<&mut LinkingStatus>) {
        match self {
            Self::Sdk {
                condition, status, ..
            }
            | Self::Framework {
                condition, status, ..
            }
            | Self::XcFramework {
                condition, status, ..
            } => (condition, Some(status)),
            Self::Product { condition, .. }
            | Self::Library { condition, .. }
            | Self::Bundle { condition, .. } => (condition, None),
        }
    }

    /// Fold `other` (same identity) into `self`.
    fn absorb(&mut self, other: &Self) {
        let merged = union_optional(self.condition(), other.condition());
        let theirs = other.status();
        let (condition, status) = self.parts_mut();
        *condition = merged;
        if let (Some(status), Some(theirs)) = (status, theirs) {
            *status = status.strongest(theirs);
        }
    }
}

fn is_third_party(path: &Path) -> bool {
    path.to_string_lossy().contains(CARTHAGE_BUILD_DIR)
}

/// Category plus identifying field of a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceId {
    Sdk(PathBuf),
    /// The file name leads so products sort by it; project and target
    /// identify.
    Product {
        product_name: String,
        project: PathBuf,
        target: String,
    },
    Library(PathBuf),
    Framework(PathBuf),
    XcFramework(PathBuf),
    Bundle(PathBuf),
}

// ---------------------------------------------------------------------------
// ReferenceSet
// ---------------------------------------------------------------------------

/// An ordered, merging set of references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    items: BTreeMap<ReferenceId, Reference>,
}

impl ReferenceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, merging with an existing reference of the same identity.
    pub fn insert(&mut self, reference: Reference) {
        let id = reference.id();
        match self.items.get_mut(&id) {
            Some(existing) => existing.absorb(&reference),
            None => {
                self.items.insert(id, reference);
            }
        }
    }

    /// Remove every reference whose identity appears in `other`.
    pub fn subtract(&mut self, other: &Self) {
        self.items.retain(|id, _| !other.items.contains_key(id));
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Reference) -> bool) {
        self.items.retain(|_, reference| keep(reference));
    }

    #[must_use]
    pub fn contains(&self, id: &ReferenceId) -> bool {
        self.items.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.items.values()
    }

    /// The references in canonical order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Reference> {
        self.items.into_values().collect()
    }
}

impl Extend<Reference> for ReferenceSet {
    fn extend<I: IntoIterator<Item = Reference>>(&mut self, iter: I) {
        for reference in iter {
            self.insert(reference);
        }
    }
}

impl FromIterator<Reference> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
