//! Swift macro executables.
//!
//! Macros are never linked or embedded. They reach the compiler as plugin
//! specifiers instead:
//!
//! - precompiled macros shipped next to an xcframework are passed as
//!   `<path>#<ModuleName>`;
//! - macro targets built from source are passed as the built product under
//!   the build directory, through the library targets that wrap them.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::instrument;
use xcgraph_core::condition::PlatformCondition;
use xcgraph_core::key::DependencyKey;
use xcgraph_core::model::{Platform, Product};
use xcgraph_core::GraphTarget;

use super::GraphTraverser;
use crate::reference::Reference;

const MACRO_EXTENSION: &str = ".macro";

/// Library products that can wrap a macro target.
const MACRO_WRAPPERS: [Product; 4] = [
    Product::StaticFramework,
    Product::Framework,
    Product::DynamicLibrary,
    Product::StaticLibrary,
];

fn plugin_specifier(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let module = file_name.strip_suffix(MACRO_EXTENSION).unwrap_or(&*file_name);
    format!("{}#{module}", path.display())
}

fn built_product_specifier(product_name: &str) -> String {
    format!("$BUILD_DIR/Debug$EFFECTIVE_PLATFORM_NAME/{product_name}#{product_name}")
}

impl<'g> GraphTraverser<'g> {
    fn direct_macro_targets(&self, path: &Path, name: &str) -> Vec<GraphTarget<'g>> {
        self.direct_target_dependencies(path, name)
            .into_iter()
            .map(|reference| reference.target)
            .filter(|target| target.product() == Product::Macro)
            .collect()
    }

    /// Macro targets `name` depends on directly. Macros run on the build
    /// host, so each reference is restricted to macOS.
    #[must_use]
    pub fn direct_macro_executables(&self, path: &Path, name: &str) -> Vec<Reference> {
        let macros: BTreeSet<Reference> = self
            .direct_macro_targets(path, name)
            .into_iter()
            .map(|target| {
                Reference::product(target, PlatformCondition::when([Platform::Macos]))
            })
            .collect();
        macros.into_iter().collect()
    }

    /// `-load-plugin-executable` values for `name`: precompiled macros
    /// reached through xcframeworks, and macros built from source by `name`
    /// or by any library target it depends on.
    #[instrument(level = "debug", skip(self))]
    #[must_use]
    pub fn macro_plugin_executables(&self, path: &Path, name: &str) -> Vec<String> {
        let Some(from) = self.graph.target_index(path, name) else {
            return Vec::new();
        };
        let graph = self.graph;

        let precompiled = self.filter_dependencies(
            &[from],
            DependencyKey::is_macro,
            DependencyKey::is_macro,
        );
        let mut specifiers: BTreeSet<String> = precompiled
            .into_iter()
            .filter_map(|node| graph.key(node).path())
            .map(plugin_specifier)
            .collect();

        let mut wrappers: Vec<GraphTarget<'g>> = self
            .all_target_dependencies(path, name)
            .into_iter()
            .filter(|target| MACRO_WRAPPERS.contains(&target.product()))
            .collect();
        wrappers.extend(self.target(path, name));

        for wrapper in wrappers {
            specifiers.extend(
                self.direct_macro_targets(wrapper.path, wrapper.name())
                    .into_iter()
                    .map(|target| built_product_specifier(target.target.product_name())),
            );
        }
        specifiers.into_iter().collect()
    }
}
