//! Building a [`DependencyGraph`] from workspace and project descriptors.
//!
//! # Overview
//!
//! The loader walks every target's declared dependencies in manifest order
//! and turns each one into a [`DependencyKey`]:
//!
//! - target and project dependencies become target keys, after checking
//!   that the project and target exist;
//! - frameworks, libraries and xcframeworks are resolved through an
//!   [`ArtifactMetadataProvider`], cached per path for the whole load;
//! - SDKs (and `xctest`) are resolved through an [`SdkMetadataProvider`]
//!   for the target's primary platform.
//!
//! Declared target cycles are rejected before any artifact is inspected.
//! Any provider failure aborts the load.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};

use crate::condition::PlatformCondition;
use crate::config::GraphConfig;
use crate::error::{ArtifactKind, GraphError};
use crate::graph::build::{DependencyGraph, GraphBuilder};
use crate::graph::cycles;
use crate::key::{DependencyKey, PrecompiledBinary, PrecompiledOrigin};
use crate::metadata::{
    ArtifactMetadataProvider, FrameworkMetadata, LibraryMetadata, MetadataError,
    SdkMetadataProvider, XcFrameworkMetadata,
};
use crate::model::{
    LinkingStatus, Platform, Product, ProjectDescriptor, SdkSource, TargetDependency,
    TargetDescriptor, WorkspaceDescriptor,
};

const XCTEST_SDK: &str = "XCTest.framework";
const APP_CLIP_SDK: &str = "AppClip.framework";

/// Loads descriptors into a validated graph.
#[derive(Debug, Clone)]
pub struct GraphLoader<A, S> {
    artifacts: A,
    sdks: S,
    config: GraphConfig,
}

/// Metadata resolved so far during one load.
#[derive(Debug, Default)]
struct MetadataCache {
    frameworks: HashMap<PathBuf, FrameworkMetadata>,
    libraries: HashMap<PathBuf, LibraryMetadata>,
    xcframeworks: HashMap<PathBuf, XcFrameworkMetadata>,
}

impl<A, S> GraphLoader<A, S>
where
    A: ArtifactMetadataProvider,
    S: SdkMetadataProvider,
{
    #[must_use]
    pub fn new(artifacts: A, sdks: S) -> Self {
        Self {
            artifacts,
            sdks,
            config: GraphConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Load `projects` into a graph for `workspace`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingProject`] when the workspace or a dependency
    ///   names a project that is not in `projects`.
    /// - [`GraphError::TargetNotFound`] when a dependency names an unknown
    ///   target.
    /// - [`GraphError::CircularDependency`] for declared target cycles.
    /// - [`GraphError::ArtifactNotFound`] when a provider cannot resolve a
    ///   declared artifact.
    /// - [`GraphError::UnsupportedConfiguration`] for SDKs that cannot be
    ///   resolved and for graphs rejected by [`GraphBuilder::build`].
    #[instrument(skip_all, fields(workspace = %workspace.name))]
    pub fn load(
        &self,
        workspace: WorkspaceDescriptor,
        projects: impl IntoIterator<Item = ProjectDescriptor>,
    ) -> Result<DependencyGraph, GraphError> {
        let projects: BTreeMap<PathBuf, ProjectDescriptor> = projects
            .into_iter()
            .map(|project| (project.path.clone(), project))
            .collect();

        if let Some(missing) = workspace
            .projects
            .iter()
            .find(|path| !projects.contains_key(*path))
        {
            return Err(GraphError::MissingProject {
                path: missing.clone(),
            });
        }

        cycles::detect(&workspace, &projects)?;

        let mut builder =
            GraphBuilder::new(workspace).with_max_depth(self.config.traversal.max_depth);
        for project in projects.values() {
            builder.add_project(project.clone());
        }

        let mut cache = MetadataCache::default();
        for project in projects.values() {
            debug!(
                project = %project.path.display(),
                targets = project.targets.len(),
                "loading project"
            );
            for target in &project.targets {
                self.load_target(project, target, &projects, &mut cache, &mut builder)?;
            }
        }

        builder.build()
    }

    fn load_target(
        &self,
        project: &ProjectDescriptor,
        target: &TargetDescriptor,
        projects: &BTreeMap<PathBuf, ProjectDescriptor>,
        cache: &mut MetadataCache,
        builder: &mut GraphBuilder,
    ) -> Result<(), GraphError> {
        let from = DependencyKey::target(project.path.clone(), target.name.clone());

        for dependency in &target.dependencies {
            let to = self.resolve(project, target, dependency, projects, cache, builder)?;
            trace!(from = %from, to = %to, "edge");
            builder.add_edge(from.clone(), to, dependency.condition().cloned());
        }

        if target.product == Product::AppClip && self.config.linking.implicit_app_clip_sdk {
            let sdk = self.resolve_sdk(
                target,
                APP_CLIP_SDK,
                Some(Platform::Ios),
                LinkingStatus::Required,
                SdkSource::System,
            )?;
            builder.add_edge(from, sdk, PlatformCondition::when([Platform::Ios]));
        }
        Ok(())
    }

    fn resolve(
        &self,
        project: &ProjectDescriptor,
        target: &TargetDescriptor,
        dependency: &TargetDependency,
        projects: &BTreeMap<PathBuf, ProjectDescriptor>,
        cache: &mut MetadataCache,
        builder: &mut GraphBuilder,
    ) -> Result<DependencyKey, GraphError> {
        match dependency {
            TargetDependency::Target { name, .. } => {
                resolve_target(projects, &project.path, name)
            }
            TargetDependency::Project {
                target: name, path, ..
            } => resolve_target(projects, path, name),
            TargetDependency::Framework { path, status, .. } => {
                let metadata = self.framework(cache, path)?;
                Ok(DependencyKey::precompiled(PrecompiledBinary {
                    path: path.clone(),
                    binary_path: metadata.binary_path,
                    linking: metadata.linking,
                    architectures: metadata.architectures,
                    dsym_path: metadata.dsym_path,
                    bcsymbolmap_paths: metadata.bcsymbolmap_paths,
                    origin: PrecompiledOrigin::Framework,
                    status: *status,
                    mergeable: false,
                }))
            }
            TargetDependency::Library {
                path,
                public_headers,
                swift_module_map,
                ..
            } => {
                let metadata =
                    self.library(cache, path, public_headers, swift_module_map.as_deref())?;
                Ok(DependencyKey::precompiled(PrecompiledBinary {
                    path: path.clone(),
                    binary_path: path.clone(),
                    linking: metadata.linking,
                    architectures: metadata.architectures,
                    dsym_path: None,
                    bcsymbolmap_paths: Vec::new(),
                    origin: PrecompiledOrigin::Library {
                        public_headers: public_headers.clone(),
                        swift_module_map: swift_module_map.clone(),
                    },
                    status: LinkingStatus::Required,
                    mergeable: false,
                }))
            }
            TargetDependency::XcFramework { path, status, .. } => {
                let metadata = self.xcframework(cache, path)?;
                let architectures = metadata.architectures();
                let key = DependencyKey::precompiled(PrecompiledBinary {
                    path: path.clone(),
                    binary_path: metadata.primary_binary_path,
                    linking: metadata.linking,
                    architectures,
                    dsym_path: None,
                    bcsymbolmap_paths: Vec::new(),
                    origin: PrecompiledOrigin::XcFramework {
                        info_plist: metadata.info_plist,
                    },
                    status: *status,
                    mergeable: metadata.mergeable,
                });
                if let Some(macro_path) = metadata.macro_path {
                    builder.add_edge(key.clone(), DependencyKey::Macro { path: macro_path }, None);
                }
                Ok(key)
            }
            TargetDependency::Sdk { name, status, .. } => {
                self.resolve_sdk(target, name, None, *status, SdkSource::System)
            }
            TargetDependency::Xctest => self.resolve_sdk(
                target,
                XCTEST_SDK,
                None,
                LinkingStatus::Required,
                SdkSource::Developer,
            ),
            TargetDependency::Package { product, kind, .. } => Ok(DependencyKey::PackageProduct {
                project_path: project.path.clone(),
                product: product.clone(),
                kind: *kind,
            }),
            TargetDependency::Bundle { path, .. } => Ok(DependencyKey::Bundle { path: path.clone() }),
        }
    }

    fn resolve_sdk(
        &self,
        target: &TargetDescriptor,
        name: &str,
        platform: Option<Platform>,
        status: LinkingStatus,
        source: SdkSource,
    ) -> Result<DependencyKey, GraphError> {
        let platform = platform
            .or_else(|| target.primary_platform())
            .ok_or_else(|| {
                GraphError::unsupported(format!(
                    "target '{}' has no destinations to resolve sdk '{name}' for",
                    target.name
                ))
            })?;
        let metadata = self
            .sdks
            .load_sdk(name, platform, status, source)
            .map_err(|err| match err {
                MetadataError::NotFound(_) => GraphError::ArtifactNotFound {
                    kind: ArtifactKind::Sdk,
                    path: PathBuf::from(name),
                },
                MetadataError::Unsupported(reason) => GraphError::unsupported(reason),
            })?;
        Ok(DependencyKey::Sdk {
            name: name.to_string(),
            path: metadata.path,
            status,
            source,
        })
    }

    fn framework(
        &self,
        cache: &mut MetadataCache,
        path: &Path,
    ) -> Result<FrameworkMetadata, GraphError> {
        if let Some(hit) = cache.frameworks.get(path) {
            return Ok(hit.clone());
        }
        let metadata = self
            .artifacts
            .load_framework(path)
            .map_err(|err| artifact_error(ArtifactKind::Framework, path, err))?;
        cache.frameworks.insert(path.to_path_buf(), metadata.clone());
        Ok(metadata)
    }

    fn library(
        &self,
        cache: &mut MetadataCache,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, GraphError> {
        if let Some(hit) = cache.libraries.get(path) {
            return Ok(hit.clone());
        }
        let metadata = self
            .artifacts
            .load_library(path, public_headers, swift_module_map)
            .map_err(|err| artifact_error(ArtifactKind::Library, path, err))?;
        cache.libraries.insert(path.to_path_buf(), metadata.clone());
        Ok(metadata)
    }

    fn xcframework(
        &self,
        cache: &mut MetadataCache,
        path: &Path,
    ) -> Result<XcFrameworkMetadata, GraphError> {
        if let Some(hit) = cache.xcframeworks.get(path) {
            return Ok(hit.clone());
        }
        let metadata = self
            .artifacts
            .load_xcframework(path)
            .map_err(|err| artifact_error(ArtifactKind::XcFramework, path, err))?;
        cache.xcframeworks.insert(path.to_path_buf(), metadata.clone());
        Ok(metadata)
    }
}

fn resolve_target(
    projects: &BTreeMap<PathBuf, ProjectDescriptor>,
    project_path: &Path,
    name: &str,
) -> Result<DependencyKey, GraphError> {
    let project = projects
        .get(project_path)
        .ok_or_else(|| GraphError::MissingProject {
            path: project_path.to_path_buf(),
        })?;
    if project.target(name).is_none() {
        return Err(GraphError::TargetNotFound {
            name: name.to_string(),
            project_path: project_path.to_path_buf(),
        });
    }
    Ok(DependencyKey::target(project_path, name))
}

fn artifact_error(kind: ArtifactKind, path: &Path, err: MetadataError) -> GraphError {
    match err {
        MetadataError::NotFound(_) => GraphError::ArtifactNotFound {
            kind,
            path: path.to_path_buf(),
        },
        MetadataError::Unsupported(reason) => GraphError::unsupported(reason),
    }
}
