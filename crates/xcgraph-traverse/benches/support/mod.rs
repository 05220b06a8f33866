#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use xcgraph_core::key::{DependencyKey, PrecompiledBinary, PrecompiledOrigin};
use xcgraph_core::model::{
    BinaryArchitecture, BinaryLinking, LinkingStatus, Platform, Product, ProjectDescriptor,
    SdkSource, TargetDescriptor, WorkspaceDescriptor,
};
use xcgraph_core::condition::PlatformCondition;
use xcgraph_core::{DependencyGraph, GraphBuilder};

pub const PROJECT: &str = "/bench/App";

#[derive(Clone, Copy, Debug)]
pub struct GraphTier {
    pub name: &'static str,
    pub layers: usize,
    pub width: usize,
}

pub const TIER_S: GraphTier = GraphTier {
    name: "S",
    layers: 4,
    width: 4,
};

pub const TIER_M: GraphTier = GraphTier {
    name: "M",
    layers: 12,
    width: 6,
};

pub const TIER_L: GraphTier = GraphTier {
    name: "L",
    layers: 24,
    width: 8,
};

pub const TIERS: [GraphTier; 3] = [TIER_S, TIER_M, TIER_L];

pub fn project_path() -> &'static Path {
    Path::new(PROJECT)
}

fn layer_name(layer: usize, index: usize) -> String {
    format!("L{layer}_{index}")
}

fn key(name: &str) -> DependencyKey {
    DependencyKey::target(PROJECT, name)
}

fn precompiled(layer: usize) -> DependencyKey {
    let path = PathBuf::from(format!("/deps/Dyn{layer}.framework"));
    DependencyKey::precompiled(PrecompiledBinary {
        binary_path: path.join(format!("Dyn{layer}")),
        path,
        linking: BinaryLinking::Dynamic,
        architectures: BTreeSet::from([BinaryArchitecture::Arm64]),
        dsym_path: None,
        bcsymbolmap_paths: Vec::new(),
        origin: PrecompiledOrigin::Framework,
        status: LinkingStatus::Required,
        mergeable: false,
    })
}

/// `App` and `AppTests` over `layers` fully connected layers of `width`
/// targets each. The first target of every layer is a dynamic framework,
/// the rest are static libraries, so every layer is a wall of diamonds.
/// Every other layer restricts its SDK edge to iOS.
pub fn layered_graph(tier: GraphTier) -> DependencyGraph {
    let mut project = ProjectDescriptor::new(PROJECT, "App")
        .with_target(TargetDescriptor::new("App", Product::App))
        .with_target(TargetDescriptor::new("AppTests", Product::UnitTests));
    for layer in 0..tier.layers {
        for index in 0..tier.width {
            let product = if index == 0 {
                Product::Framework
            } else {
                Product::StaticLibrary
            };
            project = project.with_target(TargetDescriptor::new(layer_name(layer, index), product));
        }
    }

    let mut builder = GraphBuilder::new(WorkspaceDescriptor::new("/bench", "Bench").with_project(PROJECT))
        .with_max_depth(tier.layers + 8);
    builder.add_project(project);
    builder.add_edge(key("AppTests"), key("App"), None);
    for index in 0..tier.width {
        builder.add_edge(key("App"), key(&layer_name(0, index)), None);
        builder.add_edge(key("AppTests"), key(&layer_name(0, index)), None);
    }
    for layer in 0..tier.layers.saturating_sub(1) {
        for from in 0..tier.width {
            for to in 0..tier.width {
                builder.add_edge(
                    key(&layer_name(layer, from)),
                    key(&layer_name(layer + 1, to)),
                    None,
                );
            }
        }
    }
    for layer in 0..tier.layers {
        let condition = if layer % 2 == 0 {
            PlatformCondition::when([Platform::Ios])
        } else {
            None
        };
        builder.add_edge(
            key(&layer_name(layer, tier.width - 1)),
            DependencyKey::Sdk {
                name: "UIKit.framework".to_string(),
                path: PathBuf::from("/sdk/UIKit.framework"),
                status: LinkingStatus::Required,
                source: SdkSource::System,
            },
            condition,
        );
        builder.add_edge(key(&layer_name(layer, 1)), precompiled(layer), None);
    }
    builder.build().expect("benchmark graph is valid")
}
