//! Workspace, project and target descriptions handed over by the manifest
//! loader.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::condition::PlatformCondition;
use crate::model::{LinkingStatus, PackageKind, Platform, Product};

// ---------------------------------------------------------------------------
// Workspace / project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    pub path: PathBuf,
    pub name: String,
    /// Root paths of the projects the workspace lists.
    #[serde(default)]
    pub projects: Vec<PathBuf>,
}

impl WorkspaceDescriptor {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            projects: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.projects.push(path.into());
        self
    }
}

/// Whether a project was authored in the workspace or generated from a
/// third-party package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    #[default]
    Local,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub kind: ProjectKind,
    #[serde(default)]
    pub targets: Vec<TargetDescriptor>,
}

impl ProjectDescriptor {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind: ProjectKind::Local,
            targets: Vec::new(),
        }
    }

    #[must_use]
    pub const fn external(mut self) -> Self {
        self.kind = ProjectKind::External;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetDescriptor) -> Self {
        self.targets.push(target);
        self
    }

    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetDescriptor> {
        self.targets.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.kind, ProjectKind::External)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Binary merging requested by a consuming target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "names")]
pub enum MergedBinaryType {
    #[default]
    Disabled,
    Automatic,
    /// Merge the mergeable dependencies plus the named ones.
    Manual(BTreeSet<String>),
}

impl MergedBinaryType {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub name: String,
    pub product: Product,
    /// Defaults to the target name.
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub destinations: BTreeSet<Platform>,
    /// Declared dependencies, in manifest order.
    #[serde(default)]
    pub dependencies: Vec<TargetDependency>,
    #[serde(default)]
    pub merged_binary: MergedBinaryType,
    /// Built as a mergeable library that consumers may fold into themselves.
    #[serde(default)]
    pub mergeable: bool,
    #[serde(default)]
    pub contains_resources: bool,
    #[serde(default)]
    pub enable_testing_search_paths: bool,
}

impl TargetDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, product: Product) -> Self {
        Self {
            name: name.into(),
            product,
            product_name: None,
            destinations: BTreeSet::from([Platform::Ios]),
            dependencies: Vec::new(),
            merged_binary: MergedBinaryType::Disabled,
            mergeable: false,
            contains_resources: false,
            enable_testing_search_paths: false,
        }
    }

    #[must_use]
    pub fn with_destinations(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.destinations = platforms.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    #[must_use]
    pub fn depends_on(mut self, dependency: TargetDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    #[must_use]
    pub fn with_merged_binary(mut self, merged_binary: MergedBinaryType) -> Self {
        self.merged_binary = merged_binary;
        self
    }

    #[must_use]
    pub const fn mergeable(mut self) -> Self {
        self.mergeable = true;
        self
    }

    #[must_use]
    pub const fn with_resources(mut self) -> Self {
        self.contains_resources = true;
        self
    }

    #[must_use]
    pub const fn with_testing_search_paths(mut self) -> Self {
        self.enable_testing_search_paths = true;
        self
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.name)
    }

    /// e.g. `Core.framework`, `libCore.a`.
    #[must_use]
    pub fn product_file_name(&self) -> String {
        self.product.file_name(self.product_name())
    }

    /// The platform single-platform decisions (SDK resolution) are made for.
    #[must_use]
    pub fn primary_platform(&self) -> Option<Platform> {
        self.destinations.first().copied()
    }

    #[must_use]
    pub fn supports(&self, platform: Platform) -> bool {
        self.destinations.contains(&platform)
    }

    /// Static frameworks with resources are embedded like dynamic ones so
    /// their resources ship inside the bundle.
    #[must_use]
    pub const fn is_embeddable_static_framework(&self) -> bool {
        matches!(self.product, Product::StaticFramework) && self.contains_resources
    }
}

// ---------------------------------------------------------------------------
// Declared dependencies
// ---------------------------------------------------------------------------

/// One dependency as written in a target manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetDependency {
    /// Another target of the same project.
    Target {
        name: String,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    /// A target of another project.
    Project {
        target: String,
        path: PathBuf,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    Framework {
        path: PathBuf,
        #[serde(default)]
        status: LinkingStatus,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    Library {
        path: PathBuf,
        public_headers: PathBuf,
        #[serde(default)]
        swift_module_map: Option<PathBuf>,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    #[serde(rename = "xcframework")]
    XcFramework {
        path: PathBuf,
        #[serde(default)]
        status: LinkingStatus,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    Sdk {
        name: String,
        #[serde(default)]
        status: LinkingStatus,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    Package {
        product: String,
        #[serde(default)]
        kind: PackageKind,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    /// A precompiled resource bundle.
    Bundle {
        path: PathBuf,
        #[serde(default)]
        condition: Option<PlatformCondition>,
    },
    /// The developer `XCTest.framework`.
    Xctest,
}

impl TargetDependency {
    #[must_use]
    pub fn target(name: impl Into<String>) -> Self {
        Self::Target {
            name: name.into(),
            condition: None,
        }
    }

    #[must_use]
    pub fn project(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Project {
            target: target.into(),
            path: path.into(),
            condition: None,
        }
    }

    #[must_use]
    pub fn framework(path: impl Into<PathBuf>) -> Self {
        Self::Framework {
            path: path.into(),
            status: LinkingStatus::Required,
            condition: None,
        }
    }

    #[must_use]
    pub fn library(path: impl Into<PathBuf>, public_headers: impl Into<PathBuf>) -> Self {
        Self::Library {
            path: path.into(),
            public_headers: public_headers.into(),
            swift_module_map: None,
            condition: None,
        }
    }

    #[must_use]
    pub fn xcframework(path: impl Into<PathBuf>) -> Self {
        Self::XcFramework {
            path: path.into(),
            status: LinkingStatus::Required,
            condition: None,
        }
    }

    #[must_use]
    pub fn sdk(name: impl Into<String>, status: LinkingStatus) -> Self {
        Self::Sdk {
            name: name.into(),
            status,
            condition: None,
        }
    }

    #[must_use]
    pub fn package(product: impl Into<String>, kind: PackageKind) -> Self {
        Self::Package {
            product: product.into(),
            kind,
            condition: None,
        }
    }

    #[must_use]
    pub fn bundle(path: impl Into<PathBuf>) -> Self {
        Self::Bundle {
            path: path.into(),
            condition: None,
        }
    }

    /// Restrict this dependency to a platform condition. Has no effect on
    /// [`TargetDependency::Xctest`].
    #[must_use]
    pub fn when(mut self, new: Option<PlatformCondition>) -> Self {
        match &mut self {
            Self::Target { condition, .. }
            | Self::Project { condition, .. }
            | Self::Framework { condition, .. }
            | Self::Library { condition, .. }
            | Self::XcFramework { condition, .. }
            | Self::Sdk { condition, .. }
            | Self::Package { condition, .. }
            | Self::Bundle { condition, .. } => *condition = new,
            Self::Xctest => {}
        }
        self
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&PlatformCondition> {
        match self {
            Self::Target { condition, .. }
            | Self::Project { condition, .. }
            | Self::Framework { condition, .. }
            | Self::Library { condition, .. }
            | Self::XcFramework { condition, .. }
            | Self::Sdk { condition, .. }
            | Self::Package { condition, .. }
            | Self::Bundle { condition, .. } => condition.as_ref(),
            Self::Xctest => None,
        }
    }

    /// The `(project path, target name)` this dependency points at when it
    /// is a target dependency, resolving same-project references against
    /// `project_path`.
    #[must_use]
    pub fn target_reference<'a>(&'a self, project_path: &'a Path) -> Option<(&'a Path, &'a str)> {
        match self {
            Self::Target { name, .. } => Some((project_path, name.as_str())),
            Self::Project { target, path, .. } => Some((path.as_path(), target.as_str())),
            _ => None,
        }
    }
}
