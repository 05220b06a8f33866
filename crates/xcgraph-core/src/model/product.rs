//! Product types and the classification predicates the resolvers switch on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    App,
    StaticLibrary,
    DynamicLibrary,
    Framework,
    StaticFramework,
    UnitTests,
    UiTests,
    Bundle,
    CommandLineTool,
    AppClip,
    AppExtension,
    Watch2App,
    Watch2Extension,
    TvTopShelfExtension,
    MessagesExtension,
    StickerPackExtension,
    Xpc,
    SystemExtension,
    ExtensionKitExtension,
    Macro,
}

impl Product {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::StaticLibrary => "static_library",
            Self::DynamicLibrary => "dynamic_library",
            Self::Framework => "framework",
            Self::StaticFramework => "static_framework",
            Self::UnitTests => "unit_tests",
            Self::UiTests => "ui_tests",
            Self::Bundle => "bundle",
            Self::CommandLineTool => "command_line_tool",
            Self::AppClip => "app_clip",
            Self::AppExtension => "app_extension",
            Self::Watch2App => "watch2_app",
            Self::Watch2Extension => "watch2_extension",
            Self::TvTopShelfExtension => "tv_top_shelf_extension",
            Self::MessagesExtension => "messages_extension",
            Self::StickerPackExtension => "sticker_pack_extension",
            Self::Xpc => "xpc",
            Self::SystemExtension => "system_extension",
            Self::ExtensionKitExtension => "extension_kit_extension",
            Self::Macro => "macro",
        }
    }

    /// Code linked straight into the consumer's binary.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::StaticLibrary | Self::StaticFramework)
    }

    /// A standalone loadable image other targets can link against.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Framework | Self::DynamicLibrary)
    }

    /// Whether the product is a linked image that static code can be folded
    /// into. Static dependencies propagate upward until they reach one of
    /// these.
    #[must_use]
    pub const fn can_link_static_products(self) -> bool {
        matches!(
            self,
            Self::App
                | Self::AppClip
                | Self::Framework
                | Self::DynamicLibrary
                | Self::CommandLineTool
                | Self::Xpc
                | Self::UnitTests
                | Self::UiTests
                | Self::AppExtension
                | Self::Watch2App
                | Self::Watch2Extension
                | Self::TvTopShelfExtension
                | Self::MessagesExtension
                | Self::SystemExtension
                | Self::ExtensionKitExtension
                | Self::Macro
        )
    }

    #[must_use]
    pub const fn can_host_tests(self) -> bool {
        matches!(self, Self::App | Self::AppClip)
    }

    #[must_use]
    pub const fn is_tests_bundle(self) -> bool {
        matches!(self, Self::UnitTests | Self::UiTests)
    }

    /// Whether the product has a resources build phase at all.
    #[must_use]
    pub const fn supports_resources(self) -> bool {
        matches!(
            self,
            Self::App
                | Self::AppClip
                | Self::Framework
                | Self::UnitTests
                | Self::UiTests
                | Self::Bundle
                | Self::AppExtension
                | Self::Watch2App
                | Self::Watch2Extension
                | Self::TvTopShelfExtension
                | Self::MessagesExtension
                | Self::StickerPackExtension
                | Self::ExtensionKitExtension
        )
    }

    /// Products a user or the system launches directly.
    #[must_use]
    pub const fn is_runnable(self) -> bool {
        matches!(
            self,
            Self::App | Self::AppClip | Self::CommandLineTool | Self::Watch2App
        )
    }

    /// Products that are installed inside another product's bundle.
    #[must_use]
    pub const fn is_app_extension(self) -> bool {
        matches!(
            self,
            Self::AppExtension
                | Self::TvTopShelfExtension
                | Self::MessagesExtension
                | Self::StickerPackExtension
                | Self::ExtensionKitExtension
        )
    }

    /// File name of the built product for a given product name.
    #[must_use]
    pub fn file_name(self, product_name: &str) -> String {
        match self {
            Self::StaticLibrary => format!("lib{product_name}.a"),
            Self::DynamicLibrary => format!("lib{product_name}.dylib"),
            Self::Framework | Self::StaticFramework => format!("{product_name}.framework"),
            Self::App | Self::AppClip | Self::Watch2App => format!("{product_name}.app"),
            Self::UnitTests | Self::UiTests => format!("{product_name}.xctest"),
            Self::Bundle => format!("{product_name}.bundle"),
            Self::AppExtension
            | Self::Watch2Extension
            | Self::TvTopShelfExtension
            | Self::MessagesExtension
            | Self::StickerPackExtension
            | Self::ExtensionKitExtension => format!("{product_name}.appex"),
            Self::Xpc => format!("{product_name}.xpc"),
            Self::SystemExtension => format!("{product_name}.systemextension"),
            Self::CommandLineTool | Self::Macro => product_name.to_string(),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
