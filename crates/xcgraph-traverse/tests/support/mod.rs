#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use xcgraph_core::condition::PlatformCondition;
use xcgraph_core::key::{
    DependencyKey, PrecompiledBinary, PrecompiledOrigin, XcFrameworkInfoPlist, XcFrameworkLibrary,
};
use xcgraph_core::model::{
    BinaryArchitecture, BinaryLinking, LinkingStatus, Platform, ProjectDescriptor, SdkSource,
    TargetDescriptor, WorkspaceDescriptor,
};
use xcgraph_core::{DependencyGraph, GraphBuilder};
use xcgraph_traverse::Reference;

pub const APP: &str = "/ws/App";
pub const LIBS: &str = "/ws/Libs";
/// Generated from package manifests; marked external.
pub const PACKAGES: &str = "/ws/Packages";

pub fn app_path() -> &'static Path {
    Path::new(APP)
}

// ---------------------------------------------------------------------------
// Graph fixture
// ---------------------------------------------------------------------------

type Edge = (DependencyKey, DependencyKey, Option<PlatformCondition>);

/// Declarative graph builder for traversal tests.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    projects: BTreeMap<PathBuf, ProjectDescriptor>,
    edges: Vec<Edge>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target to the `/ws/App` project.
    pub fn target(self, target: TargetDescriptor) -> Self {
        self.target_in(APP, target)
    }

    pub fn target_in(mut self, project: &str, target: TargetDescriptor) -> Self {
        let path = PathBuf::from(project);
        let descriptor = self.projects.entry(path.clone()).or_insert_with(|| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let descriptor = ProjectDescriptor::new(path.clone(), name);
            if project == PACKAGES {
                descriptor.external()
            } else {
                descriptor
            }
        });
        descriptor.targets.push(target);
        self
    }

    pub fn edge(mut self, from: DependencyKey, to: DependencyKey) -> Self {
        self.edges.push((from, to, None));
        self
    }

    pub fn edge_when(mut self, from: DependencyKey, to: DependencyKey, platforms: &[Platform]) -> Self {
        self.edges
            .push((from, to, PlatformCondition::when(platforms.iter().copied())));
        self
    }

    /// Reorder edges and targets by `keys` (applied cyclically), keeping the
    /// described graph the same.
    pub fn permute(mut self, keys: &[u64]) -> Self {
        if keys.is_empty() {
            return self;
        }
        let mut keyed: Vec<(u64, Edge)> = self
            .edges
            .into_iter()
            .enumerate()
            .map(|(i, edge)| (keys[i % keys.len()], edge))
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        self.edges = keyed.into_iter().map(|(_, edge)| edge).collect();

        for project in self.projects.values_mut() {
            let mut targets: Vec<(u64, TargetDescriptor)> = project
                .targets
                .drain(..)
                .enumerate()
                .map(|(i, target)| (keys[(i + 1) % keys.len()], target))
                .collect();
            targets.sort_by_key(|(key, _)| *key);
            project.targets = targets.into_iter().map(|(_, target)| target).collect();
        }
        self
    }

    pub fn build(self) -> DependencyGraph {
        let workspace = self
            .projects
            .keys()
            .fold(WorkspaceDescriptor::new("/ws", "Workspace"), |ws, path| {
                ws.with_project(path.clone())
            });
        let mut builder = GraphBuilder::new(workspace);
        for project in self.projects.into_values() {
            builder.add_project(project);
        }
        for (from, to, condition) in self.edges {
            builder.add_edge(from, to, condition);
        }
        builder.build().expect("fixture graph is valid")
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub fn target(name: &str) -> DependencyKey {
    DependencyKey::target(APP, name)
}

pub fn target_in(project: &str, name: &str) -> DependencyKey {
    DependencyKey::target(project, name)
}

fn binary(path: &str, binary_path: PathBuf, linking: BinaryLinking, origin: PrecompiledOrigin) -> PrecompiledBinary {
    PrecompiledBinary {
        path: PathBuf::from(path),
        binary_path,
        linking,
        architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
        dsym_path: None,
        bcsymbolmap_paths: Vec::new(),
        origin,
        status: LinkingStatus::Required,
        mergeable: false,
    }
}

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A precompiled `.framework`.
pub fn framework(path: &str, linking: BinaryLinking) -> DependencyKey {
    let binary_path = Path::new(path).join(stem(path));
    DependencyKey::precompiled(binary(path, binary_path, linking, PrecompiledOrigin::Framework))
}

/// A precompiled library with headers in `<dir>/include` and a module map in
/// `<dir>/swift`.
pub fn library(path: &str, linking: BinaryLinking) -> DependencyKey {
    let dir = Path::new(path).parent().unwrap_or(Path::new("/"));
    DependencyKey::precompiled(binary(
        path,
        PathBuf::from(path),
        linking,
        PrecompiledOrigin::Library {
            public_headers: dir.join("include"),
            swift_module_map: Some(dir.join("swift").join("module.modulemap")),
        },
    ))
}

pub fn xcframework(path: &str, linking: BinaryLinking) -> DependencyKey {
    let name = stem(path);
    let info_plist = XcFrameworkInfoPlist {
        libraries: vec![XcFrameworkLibrary {
            identifier: "ios-arm64".to_string(),
            path: PathBuf::from(format!("{name}.framework")),
            binary_name: name.clone(),
            architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
            platform: Platform::Ios,
        }],
    };
    let binary_path = Path::new(path)
        .join("ios-arm64")
        .join(format!("{name}.framework"))
        .join(&name);
    DependencyKey::precompiled(binary(
        path,
        binary_path,
        linking,
        PrecompiledOrigin::XcFramework { info_plist },
    ))
}

/// A dynamic xcframework built with `-make_mergeable`.
pub fn mergeable_xcframework(path: &str) -> DependencyKey {
    match xcframework(path, BinaryLinking::Dynamic) {
        DependencyKey::Precompiled(mut binary) => {
            binary.mergeable = true;
            DependencyKey::Precompiled(binary)
        }
        other => other,
    }
}

pub fn sdk(name: &str) -> DependencyKey {
    DependencyKey::Sdk {
        name: name.to_string(),
        path: PathBuf::from(format!("/sdk/{name}")),
        status: LinkingStatus::Required,
        source: SdkSource::System,
    }
}

pub fn optional_sdk(name: &str) -> DependencyKey {
    DependencyKey::Sdk {
        name: name.to_string(),
        path: PathBuf::from(format!("/sdk/{name}")),
        status: LinkingStatus::Optional,
        source: SdkSource::System,
    }
}

pub fn bundle(path: &str) -> DependencyKey {
    DependencyKey::Bundle {
        path: PathBuf::from(path),
    }
}

pub fn macro_executable(path: &str) -> DependencyKey {
    DependencyKey::Macro {
        path: PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Short names for a result: the target for products, the file name for
/// everything else.
pub fn names(references: &[Reference]) -> Vec<String> {
    references
        .iter()
        .map(|reference| match reference {
            Reference::Product { target, .. } => target.clone(),
            other => other
                .path()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}
