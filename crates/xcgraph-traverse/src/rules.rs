//! Classification rules the resolvers switch on.
//!
//! Every linking, embedding and resource decision funnels through these
//! free functions, keyed on the [`DependencyKey`] variant and the target's
//! [`Product`]. Target lookups go through the graph; a target key the graph
//! does not know classifies as "no" everywhere.

use xcgraph_core::key::DependencyKey;
use xcgraph_core::model::{MergedBinaryType, Platform, Product, TargetDescriptor};
use xcgraph_core::DependencyGraph;

fn target<'g>(graph: &'g DependencyGraph, key: &DependencyKey) -> Option<&'g TargetDescriptor> {
    key.as_target()
        .and_then(|key| graph.target_for_key(key))
        .map(|target| target.target)
}

fn test_target(
    graph: &DependencyGraph,
    key: &DependencyKey,
    test: impl FnOnce(&TargetDescriptor) -> bool,
) -> bool {
    target(graph, key).is_some_and(test)
}

// ---------------------------------------------------------------------------
// Target rules
// ---------------------------------------------------------------------------

/// Targets that carry dynamic dependencies inside their own bundle.
#[must_use]
pub fn can_embed_frameworks(target: &TargetDescriptor) -> bool {
    match target.product {
        Product::App
        | Product::AppClip
        | Product::Watch2App
        | Product::Watch2Extension
        | Product::UnitTests
        | Product::UiTests
        | Product::AppExtension
        | Product::TvTopShelfExtension
        | Product::MessagesExtension
        | Product::StickerPackExtension
        | Product::ExtensionKitExtension
        | Product::SystemExtension
        | Product::Xpc => true,
        Product::Bundle => target.destinations.len() == 1 && target.supports(Platform::Macos),
        Product::StaticLibrary
        | Product::DynamicLibrary
        | Product::Framework
        | Product::StaticFramework
        | Product::CommandLineTool
        | Product::Macro => false,
    }
}

/// Targets that copy resource bundles coming from external projects.
#[must_use]
pub const fn can_embed_bundles(target: &TargetDescriptor) -> bool {
    matches!(
        target.product,
        Product::App
            | Product::AppClip
            | Product::AppExtension
            | Product::ExtensionKitExtension
            | Product::Watch2App
            | Product::Watch2Extension
            | Product::UnitTests
            | Product::UiTests
            | Product::SystemExtension
            | Product::Xpc
    )
}

/// Targets with a resources build phase of their own. Resource bundles stop
/// propagating upward at the first one.
#[must_use]
pub const fn can_host_resources(target: &TargetDescriptor) -> bool {
    target.product.supports_resources()
}

/// Dynamic targets, and static frameworks carrying resources.
#[must_use]
pub const fn is_embeddable_target(target: &TargetDescriptor) -> bool {
    target.product.is_dynamic() || target.is_embeddable_static_framework()
}

// ---------------------------------------------------------------------------
// Key rules
// ---------------------------------------------------------------------------

/// Static targets and static precompiled binaries.
#[must_use]
pub fn is_static(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    match key {
        DependencyKey::Target(_) => test_target(graph, key, |t| t.product.is_static()),
        DependencyKey::Precompiled(binary) => binary.is_static(),
        DependencyKey::PackageProduct { .. }
        | DependencyKey::Sdk { .. }
        | DependencyKey::Bundle { .. }
        | DependencyKey::Macro { .. } => false,
    }
}

#[must_use]
pub fn is_static_target(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    key.is_target() && is_static(graph, key)
}

#[must_use]
pub fn is_precompiled_dynamic(key: &DependencyKey) -> bool {
    key.as_precompiled().is_some_and(|binary| binary.is_dynamic())
}

/// Precompiled static `.framework`s and `.a`s.
#[must_use]
pub fn is_precompiled_static_binary(key: &DependencyKey) -> bool {
    key.as_precompiled()
        .is_some_and(|binary| binary.is_static() && !binary.is_xcframework())
}

#[must_use]
pub fn is_precompiled_static_xcframework(key: &DependencyKey) -> bool {
    key.as_precompiled()
        .is_some_and(|binary| binary.is_static() && binary.is_xcframework())
}

/// Whether static code stops propagating at this node: a target able to
/// produce a linked image, or a precompiled dynamic binary.
#[must_use]
pub fn can_link_static_products(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    match key {
        DependencyKey::Target(_) => {
            test_target(graph, key, |t| t.product.can_link_static_products())
        }
        DependencyKey::Precompiled(binary) => binary.is_dynamic(),
        DependencyKey::PackageProduct { .. }
        | DependencyKey::Sdk { .. }
        | DependencyKey::Bundle { .. }
        | DependencyKey::Macro { .. } => false,
    }
}

/// Dynamic targets that a consumer links directly.
#[must_use]
pub fn is_dynamic_target(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    test_target(graph, key, |t| t.product.is_dynamic())
}

#[must_use]
pub fn is_embeddable_dependency_target(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    test_target(graph, key, is_embeddable_target)
}

/// Macro executables and macro targets.
#[must_use]
pub fn is_macro(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    key.is_macro() || test_target(graph, key, |t| t.product == Product::Macro)
}

#[must_use]
pub fn can_dependency_embed_frameworks(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    test_target(graph, key, can_embed_frameworks)
}

#[must_use]
pub fn can_dependency_embed_bundles(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    test_target(graph, key, can_embed_bundles)
}

#[must_use]
pub fn can_dependency_host_resources(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    test_target(graph, key, can_host_resources)
}

/// Precompiled bundles and bundle targets.
#[must_use]
pub fn is_resource_bundle(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    matches!(key, DependencyKey::Bundle { .. })
        || test_target(graph, key, |t| t.product == Product::Bundle)
}

/// Targets that live in an external (package-generated) project.
#[must_use]
pub fn is_external(graph: &DependencyGraph, key: &DependencyKey) -> bool {
    key.as_target()
        .and_then(|key| graph.target_for_key(key))
        .is_some_and(|target| target.project.is_external())
}

/// Whether `consumer` folds `key` into its own binary instead of linking or
/// embedding it.
#[must_use]
pub fn is_merged_into(
    graph: &DependencyGraph,
    consumer: &TargetDescriptor,
    key: &DependencyKey,
) -> bool {
    let (mergeable, name) = match key {
        DependencyKey::Target(target_key) => (
            test_target(graph, key, |t| t.mergeable),
            Some(target_key.name.as_str()),
        ),
        DependencyKey::Precompiled(binary) => (binary.mergeable, binary.merge_name()),
        DependencyKey::PackageProduct { .. }
        | DependencyKey::Sdk { .. }
        | DependencyKey::Bundle { .. }
        | DependencyKey::Macro { .. } => return false,
    };
    match &consumer.merged_binary {
        MergedBinaryType::Disabled => false,
        MergedBinaryType::Automatic => mergeable,
        MergedBinaryType::Manual(names) => {
            mergeable || name.is_some_and(|name| names.contains(name))
        }
    }
}
