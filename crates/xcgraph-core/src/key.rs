//! Graph node identities.
//!
//! # Overview
//!
//! A [`DependencyKey`] names one node of the dependency graph. Keys are
//! plain values: equality and hashing are structural, so two call sites that
//! describe the same artifact produce equal keys and the graph deduplicates
//! them on insertion.
//!
//! Keys are interned by the graph (see
//! [`DependencyGraph::node_index`](crate::graph::DependencyGraph::node_index));
//! traversals work on integer node indices and only look at the key when a
//! rule needs to classify the node.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{
    BinaryArchitecture, BinaryLinking, LinkingStatus, PackageKind, Platform, SdkSource,
};

// ---------------------------------------------------------------------------
// TargetKey
// ---------------------------------------------------------------------------

/// `(project path, target name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    pub project_path: PathBuf,
    pub name: String,
}

impl TargetKey {
    #[must_use]
    pub fn new(project_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_path.display(), self.name)
    }
}

// ---------------------------------------------------------------------------
// Precompiled binaries
// ---------------------------------------------------------------------------

/// One slice listed in an xcframework's `Info.plist`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct XcFrameworkLibrary {
    pub identifier: String,
    /// Path of the slice's binary or framework, relative to the xcframework.
    pub path: PathBuf,
    pub binary_name: String,
    pub architectures: BTreeSet<BinaryArchitecture>,
    pub platform: Platform,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct XcFrameworkInfoPlist {
    pub libraries: Vec<XcFrameworkLibrary>,
}

impl XcFrameworkInfoPlist {
    /// Binary name shared by the slices; manual merge lists refer to it.
    #[must_use]
    pub fn binary_name(&self) -> Option<&str> {
        self.libraries.first().map(|l| l.binary_name.as_str())
    }
}

/// What kind of container a precompiled binary came in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrecompiledOrigin {
    /// A `.framework` bundle.
    Framework,
    /// A bare `.a` or `.dylib` with its public headers.
    Library {
        public_headers: PathBuf,
        swift_module_map: Option<PathBuf>,
    },
    XcFramework { info_plist: XcFrameworkInfoPlist },
}

/// A precompiled framework, library or xcframework.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrecompiledBinary {
    pub path: PathBuf,
    /// The binary selected for the current platform.
    pub binary_path: PathBuf,
    pub linking: BinaryLinking,
    pub architectures: BTreeSet<BinaryArchitecture>,
    pub dsym_path: Option<PathBuf>,
    pub bcsymbolmap_paths: Vec<PathBuf>,
    pub origin: PrecompiledOrigin,
    pub status: LinkingStatus,
    pub mergeable: bool,
}

impl PrecompiledBinary {
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.linking.is_static()
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        self.linking.is_dynamic()
    }

    #[must_use]
    pub const fn is_xcframework(&self) -> bool {
        matches!(self.origin, PrecompiledOrigin::XcFramework { .. })
    }

    #[must_use]
    pub const fn is_framework(&self) -> bool {
        matches!(self.origin, PrecompiledOrigin::Framework)
    }

    #[must_use]
    pub const fn is_library(&self) -> bool {
        matches!(self.origin, PrecompiledOrigin::Library { .. })
    }

    /// The name a manual merge list would use for this binary.
    #[must_use]
    pub fn merge_name(&self) -> Option<&str> {
        match &self.origin {
            PrecompiledOrigin::XcFramework { info_plist } => info_plist.binary_name(),
            PrecompiledOrigin::Framework | PrecompiledOrigin::Library { .. } => {
                self.binary_path.file_name().and_then(|n| n.to_str())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DependencyKey
// ---------------------------------------------------------------------------

/// Identity of one graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyKey {
    Target(TargetKey),
    Precompiled(Box<PrecompiledBinary>),
    PackageProduct {
        project_path: PathBuf,
        product: String,
        kind: PackageKind,
    },
    Sdk {
        name: String,
        path: PathBuf,
        status: LinkingStatus,
        source: SdkSource,
    },
    /// A precompiled resource bundle.
    Bundle { path: PathBuf },
    /// A macro executable shipped next to a precompiled wrapper.
    Macro { path: PathBuf },
}

impl DependencyKey {
    #[must_use]
    pub fn target(project_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::Target(TargetKey::new(project_path, name))
    }

    #[must_use]
    pub fn precompiled(binary: PrecompiledBinary) -> Self {
        Self::Precompiled(Box::new(binary))
    }

    #[must_use]
    pub const fn as_target(&self) -> Option<&TargetKey> {
        match self {
            Self::Target(key) => Some(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_precompiled(&self) -> Option<&PrecompiledBinary> {
        match self {
            Self::Precompiled(binary) => Some(&**binary),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_target(&self) -> bool {
        matches!(self, Self::Target(_))
    }

    #[must_use]
    pub const fn is_macro(&self) -> bool {
        matches!(self, Self::Macro { .. })
    }

    /// Path of the artifact on disk, for keys that have one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Target(_) | Self::PackageProduct { .. } => None,
            Self::Precompiled(binary) => Some(binary.path.as_path()),
            Self::Sdk { path, .. } | Self::Bundle { path } | Self::Macro { path } => {
                Some(path.as_path())
            }
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(key) => write!(f, "target {key}"),
            Self::Precompiled(binary) => write!(f, "precompiled {}", binary.path.display()),
            Self::PackageProduct {
                project_path,
                product,
                ..
            } => write!(f, "package {product} ({})", project_path.display()),
            Self::Sdk { name, .. } => write!(f, "sdk {name}"),
            Self::Bundle { path } => write!(f, "bundle {}", path.display()),
            Self::Macro { path } => write!(f, "macro {}", path.display()),
        }
    }
}
