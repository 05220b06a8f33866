//! Integration tests for loading descriptors into a dependency graph.
//!
//! Covers: artifact resolution through providers, SDK resolution, the
//! implicit app clip SDK, macro edges, the per-load metadata cache and every
//! construction error the loader can raise.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use xcgraph_core::config::GraphConfig;
use xcgraph_core::key::{XcFrameworkInfoPlist, XcFrameworkLibrary};
use xcgraph_core::metadata::{
    ArtifactMetadataProvider, FrameworkMetadata, InMemoryArtifacts, LibraryMetadata,
    MetadataError, SystemSdkProvider, XcFrameworkMetadata,
};
use xcgraph_core::model::{
    BinaryArchitecture, BinaryLinking, LinkingStatus, Platform, Product, ProjectDescriptor,
    SdkSource, TargetDependency, TargetDescriptor, WorkspaceDescriptor,
};
use xcgraph_core::{
    ArtifactKind, DependencyGraph, DependencyKey, GraphError, GraphLoader, PlatformCondition,
    PrecompiledOrigin, TargetKey,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const ROOT: &str = "/Platforms";

fn framework_metadata(binary: &str, linking: BinaryLinking) -> FrameworkMetadata {
    FrameworkMetadata {
        binary_path: PathBuf::from(binary),
        linking,
        architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
        dsym_path: None,
        bcsymbolmap_paths: Vec::new(),
    }
}

fn xcframework_metadata(binary_name: &str, macro_path: Option<&str>) -> XcFrameworkMetadata {
    XcFrameworkMetadata {
        info_plist: XcFrameworkInfoPlist {
            libraries: vec![XcFrameworkLibrary {
                identifier: "ios-arm64".into(),
                path: PathBuf::from(format!("{binary_name}.framework")),
                binary_name: binary_name.into(),
                architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
                platform: Platform::Ios,
            }],
        },
        primary_binary_path: PathBuf::from(format!(
            "/deps/{binary_name}.xcframework/ios-arm64/{binary_name}.framework/{binary_name}"
        )),
        linking: BinaryLinking::Static,
        mergeable: false,
        macro_path: macro_path.map(PathBuf::from),
    }
}

fn workspace() -> WorkspaceDescriptor {
    WorkspaceDescriptor::new("/ws", "Workspace").with_project("/ws/App")
}

fn app_project(targets: Vec<TargetDescriptor>) -> ProjectDescriptor {
    let mut project = ProjectDescriptor::new("/ws/App", "App");
    project.targets = targets;
    project
}

fn load(
    artifacts: &InMemoryArtifacts,
    projects: Vec<ProjectDescriptor>,
) -> Result<DependencyGraph, GraphError> {
    GraphLoader::new(artifacts, SystemSdkProvider::new(ROOT)).load(workspace(), projects)
}

fn app_dependencies(graph: &DependencyGraph) -> Vec<DependencyKey> {
    graph
        .dependencies(&DependencyKey::target("/ws/App", "App"))
        .into_iter()
        .cloned()
        .collect()
}

/// Counts framework lookups and delegates to an in-memory store.
struct CountingArtifacts {
    inner: InMemoryArtifacts,
    calls: Cell<usize>,
}

impl ArtifactMetadataProvider for CountingArtifacts {
    fn load_framework(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.load_framework(path)
    }

    fn load_library(
        &self,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.load_library(path, public_headers, swift_module_map)
    }

    fn load_xcframework(&self, path: &Path) -> Result<XcFrameworkMetadata, MetadataError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.load_xcframework(path)
    }
}

// ===========================================================================
// Successful loads
// ===========================================================================

#[test]
fn resolves_every_dependency_kind() {
    let artifacts = InMemoryArtifacts::new()
        .with_framework(
            "/deps/Dyn.framework",
            framework_metadata("/deps/Dyn.framework/Dyn", BinaryLinking::Dynamic),
        )
        .with_library(
            "/deps/libStatic.a",
            LibraryMetadata {
                linking: BinaryLinking::Static,
                architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
            },
        )
        .with_xcframework("/deps/Kit.xcframework", xcframework_metadata("Kit", None));

    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::target("Core"))
        .depends_on(TargetDependency::framework("/deps/Dyn.framework"))
        .depends_on(TargetDependency::library("/deps/libStatic.a", "/deps/include"))
        .depends_on(TargetDependency::xcframework("/deps/Kit.xcframework"))
        .depends_on(TargetDependency::sdk("UIKit.framework", LinkingStatus::Optional))
        .depends_on(TargetDependency::bundle("/deps/Assets.bundle"));
    let core = TargetDescriptor::new("Core", Product::StaticLibrary);

    let graph = load(&artifacts, vec![app_project(vec![app, core])]).expect("load");
    let deps = app_dependencies(&graph);
    assert_eq!(deps.len(), 6);

    assert!(deps.contains(&DependencyKey::target("/ws/App", "Core")));
    assert!(deps.contains(&DependencyKey::Bundle {
        path: PathBuf::from("/deps/Assets.bundle")
    }));
    assert!(deps.contains(&DependencyKey::Sdk {
        name: "UIKit.framework".into(),
        path: PathBuf::from(
            "/Platforms/iPhoneOS.platform/Developer/SDKs/iPhoneOS.sdk/System/Library/Frameworks/UIKit.framework"
        ),
        status: LinkingStatus::Optional,
        source: SdkSource::System,
    }));

    let library = deps
        .iter()
        .filter_map(DependencyKey::as_precompiled)
        .find(|binary| binary.is_library())
        .expect("library");
    assert_eq!(
        library.origin,
        PrecompiledOrigin::Library {
            public_headers: PathBuf::from("/deps/include"),
            swift_module_map: None,
        }
    );
    assert!(library.is_static());

    let xcframework = deps
        .iter()
        .filter_map(DependencyKey::as_precompiled)
        .find(|binary| binary.is_xcframework())
        .expect("xcframework");
    assert_eq!(xcframework.merge_name(), Some("Kit"));
}

#[test]
fn xctest_resolves_to_developer_framework() {
    let tests = TargetDescriptor::new("AppTests", Product::UnitTests)
        .depends_on(TargetDependency::Xctest);
    let graph = load(&InMemoryArtifacts::new(), vec![app_project(vec![tests])]).expect("load");

    let deps = graph.dependencies(&DependencyKey::target("/ws/App", "AppTests"));
    assert_eq!(
        deps,
        vec![&DependencyKey::Sdk {
            name: "XCTest.framework".into(),
            path: PathBuf::from(
                "/Platforms/iPhoneOS.platform/Developer/Library/Frameworks/XCTest.framework"
            ),
            status: LinkingStatus::Required,
            source: SdkSource::Developer,
        }]
    );
}

#[test]
fn sdk_follows_primary_platform() {
    let tool = TargetDescriptor::new("Tool", Product::CommandLineTool)
        .with_destinations([Platform::Macos])
        .depends_on(TargetDependency::sdk("libz.tbd", LinkingStatus::Required));
    let graph = load(&InMemoryArtifacts::new(), vec![app_project(vec![tool])]).expect("load");

    let deps = graph.dependencies(&DependencyKey::target("/ws/App", "Tool"));
    assert_eq!(
        deps[0].path(),
        Some(Path::new(
            "/Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk/usr/lib/libz.tbd"
        ))
    );
}

#[test]
fn conditions_are_recorded_on_edges() {
    let ios = PlatformCondition::when([Platform::Ios]);
    let app = TargetDescriptor::new("App", Product::App)
        .with_destinations([Platform::Ios, Platform::Macos])
        .depends_on(TargetDependency::target("Core").when(ios.clone()));
    let core = TargetDescriptor::new("Core", Product::StaticLibrary);
    let graph = load(&InMemoryArtifacts::new(), vec![app_project(vec![app, core])]).expect("load");

    let from = graph.target_index(Path::new("/ws/App"), "App").expect("app");
    let to = graph.target_index(Path::new("/ws/App"), "Core").expect("core");
    assert_eq!(graph.edge_condition(from, to), ios.as_ref());
    assert!(graph.has_conditions());
}

#[test]
fn app_clips_get_implicit_sdk_on_ios() {
    let clip = TargetDescriptor::new("Clip", Product::AppClip);
    let graph = load(&InMemoryArtifacts::new(), vec![app_project(vec![clip.clone()])])
        .expect("load");

    let from = graph.target_index(Path::new("/ws/App"), "Clip").expect("clip");
    let deps = graph.dependencies(&DependencyKey::target("/ws/App", "Clip"));
    assert_eq!(deps.len(), 1);
    let DependencyKey::Sdk { name, .. } = deps[0] else {
        panic!("expected sdk, got {:?}", deps[0]);
    };
    assert_eq!(name, "AppClip.framework");
    let to = graph.node_index(deps[0]).expect("sdk node");
    assert_eq!(
        graph.edge_condition(from, to),
        PlatformCondition::when([Platform::Ios]).as_ref()
    );

    let mut config = GraphConfig::default();
    config.linking.implicit_app_clip_sdk = false;
    let graph = GraphLoader::new(InMemoryArtifacts::new(), SystemSdkProvider::new(ROOT))
        .with_config(config)
        .load(workspace(), vec![app_project(vec![clip])])
        .expect("load");
    assert!(graph
        .dependencies(&DependencyKey::target("/ws/App", "Clip"))
        .is_empty());
}

#[test]
fn xcframework_macro_becomes_a_node() {
    let artifacts = InMemoryArtifacts::new().with_xcframework(
        "/deps/Macros.xcframework",
        xcframework_metadata("Macros", Some("/deps/Macros.xcframework/Macros-tool")),
    );
    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::xcframework("/deps/Macros.xcframework"));
    let graph = load(&artifacts, vec![app_project(vec![app])]).expect("load");

    let xcframework = app_dependencies(&graph).remove(0);
    assert_eq!(
        graph.dependencies(&xcframework),
        vec![&DependencyKey::Macro {
            path: PathBuf::from("/deps/Macros.xcframework/Macros-tool")
        }]
    );
}

#[test]
fn metadata_is_requested_once_per_path() {
    let artifacts = CountingArtifacts {
        inner: InMemoryArtifacts::new().with_framework(
            "/deps/Shared.framework",
            framework_metadata("/deps/Shared.framework/Shared", BinaryLinking::Dynamic),
        ),
        calls: Cell::new(0),
    };
    let a = TargetDescriptor::new("A", Product::App)
        .depends_on(TargetDependency::framework("/deps/Shared.framework"));
    let b = TargetDescriptor::new("B", Product::Framework)
        .depends_on(TargetDependency::framework("/deps/Shared.framework"));

    let graph = GraphLoader::new(&artifacts, SystemSdkProvider::new(ROOT))
        .load(workspace(), vec![app_project(vec![a, b])])
        .expect("load");
    assert_eq!(artifacts.calls.get(), 1);
    // Two targets plus one shared framework node.
    assert_eq!(graph.node_count(), 3);
}

// ===========================================================================
// Construction errors
// ===========================================================================

#[test]
fn workspace_project_must_be_loaded() {
    let err = load(&InMemoryArtifacts::new(), Vec::new()).expect_err("missing");
    assert_eq!(
        err,
        GraphError::MissingProject {
            path: PathBuf::from("/ws/App")
        }
    );
}

#[test]
fn dependency_on_unknown_project_is_missing_project() {
    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::project("Net", "/ws/Net"));
    let err = load(&InMemoryArtifacts::new(), vec![app_project(vec![app])]).expect_err("missing");
    assert_eq!(
        err,
        GraphError::MissingProject {
            path: PathBuf::from("/ws/Net")
        }
    );
}

#[test]
fn dependency_on_unknown_target_is_target_not_found() {
    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::target("Ghost"));
    let err = load(&InMemoryArtifacts::new(), vec![app_project(vec![app])]).expect_err("missing");
    assert_eq!(
        err,
        GraphError::TargetNotFound {
            name: "Ghost".into(),
            project_path: PathBuf::from("/ws/App"),
        }
    );
}

#[test]
fn missing_framework_is_artifact_not_found() {
    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::framework("/deps/Nope.framework"));
    let err = load(&InMemoryArtifacts::new(), vec![app_project(vec![app])]).expect_err("missing");
    assert_eq!(
        err,
        GraphError::ArtifactNotFound {
            kind: ArtifactKind::Framework,
            path: PathBuf::from("/deps/Nope.framework"),
        }
    );
    assert_eq!(err.code().code(), "E3001");
}

#[test]
fn unsupported_sdk_extension_is_rejected() {
    let app = TargetDescriptor::new("App", Product::App)
        .depends_on(TargetDependency::sdk("libz.so", LinkingStatus::Required));
    let err = load(&InMemoryArtifacts::new(), vec![app_project(vec![app])]).expect_err("bad sdk");
    assert!(matches!(err, GraphError::UnsupportedConfiguration { .. }), "{err}");
}

#[test]
fn sdk_without_destinations_is_rejected() {
    let app = TargetDescriptor::new("App", Product::App)
        .with_destinations([])
        .depends_on(TargetDependency::sdk("UIKit.framework", LinkingStatus::Required));
    let err = load(&InMemoryArtifacts::new(), vec![app_project(vec![app])]).expect_err("no platform");
    assert!(err.to_string().contains("no destinations"), "{err}");
}

#[test]
fn declared_cycle_fails_before_artifacts_are_inspected() {
    let artifacts = CountingArtifacts {
        inner: InMemoryArtifacts::new(),
        calls: Cell::new(0),
    };
    let a = TargetDescriptor::new("A", Product::Framework)
        .depends_on(TargetDependency::framework("/deps/X.framework"))
        .depends_on(TargetDependency::target("B"));
    let b = TargetDescriptor::new("B", Product::Framework).depends_on(TargetDependency::target("A"));

    let err = GraphLoader::new(&artifacts, SystemSdkProvider::new(ROOT))
        .load(workspace(), vec![app_project(vec![a, b])])
        .expect_err("cycle");
    assert_eq!(
        err,
        GraphError::CircularDependency {
            cycle: vec![
                TargetKey::new("/ws/App", "A"),
                TargetKey::new("/ws/App", "B"),
                TargetKey::new("/ws/App", "A"),
            ]
        }
    );
    assert_eq!(artifacts.calls.get(), 0);
}

#[test]
fn max_depth_from_config_is_enforced() {
    let mut config = GraphConfig::default();
    config.traversal.max_depth = 1;
    let a = TargetDescriptor::new("A", Product::App).depends_on(TargetDependency::target("B"));
    let b = TargetDescriptor::new("B", Product::StaticLibrary)
        .depends_on(TargetDependency::target("C"));
    let c = TargetDescriptor::new("C", Product::StaticLibrary);

    let err = GraphLoader::new(InMemoryArtifacts::new(), SystemSdkProvider::new(ROOT))
        .with_config(config)
        .load(workspace(), vec![app_project(vec![a, b, c])])
        .expect_err("too deep");
    assert!(matches!(err, GraphError::UnsupportedConfiguration { .. }));
}
