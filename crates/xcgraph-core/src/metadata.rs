//! Artifact and SDK metadata providers.
//!
//! # Overview
//!
//! Reading a framework's binary, a library's linkage or an xcframework's
//! `Info.plist` happens outside this crate. The graph loader only talks to
//! the two traits below, so the inspection layer can be swapped for fixtures
//! in tests.
//!
//! - [`ArtifactMetadataProvider`] resolves frameworks, libraries and
//!   xcframeworks.
//! - [`SdkMetadataProvider`] resolves system SDK names to paths.
//!
//! [`InMemoryArtifacts`] and [`SystemSdkProvider`] are the built-in
//! implementations.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::config::SdkConfig;
use crate::key::XcFrameworkInfoPlist;
use crate::model::{BinaryArchitecture, BinaryLinking, LinkingStatus, Platform, SdkSource};

/// Why a provider could not answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("no artifact at {}", .0.display())]
    NotFound(PathBuf),
    #[error("{0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkMetadata {
    pub binary_path: PathBuf,
    pub linking: BinaryLinking,
    pub architectures: BTreeSet<BinaryArchitecture>,
    pub dsym_path: Option<PathBuf>,
    pub bcsymbolmap_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMetadata {
    pub linking: BinaryLinking,
    pub architectures: BTreeSet<BinaryArchitecture>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcFrameworkMetadata {
    pub info_plist: XcFrameworkInfoPlist,
    /// Binary of the slice matching the platform being generated.
    pub primary_binary_path: PathBuf,
    pub linking: BinaryLinking,
    pub mergeable: bool,
    /// Macro executable shipped inside the xcframework, if any.
    pub macro_path: Option<PathBuf>,
}

impl XcFrameworkMetadata {
    /// Union of the architectures of every slice.
    #[must_use]
    pub fn architectures(&self) -> BTreeSet<BinaryArchitecture> {
        self.info_plist
            .libraries
            .iter()
            .flat_map(|l| l.architectures.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkMetadata {
    pub path: PathBuf,
}

pub trait ArtifactMetadataProvider {
    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when nothing exists at `path`.
    fn load_framework(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError>;

    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when nothing exists at `path`.
    fn load_library(
        &self,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError>;

    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when nothing exists at `path`.
    fn load_xcframework(&self, path: &Path) -> Result<XcFrameworkMetadata, MetadataError>;
}

pub trait SdkMetadataProvider {
    /// # Errors
    ///
    /// Returns [`MetadataError::Unsupported`] for SDK names this provider
    /// cannot represent and [`MetadataError::NotFound`] for unknown ones.
    fn load_sdk(
        &self,
        name: &str,
        platform: Platform,
        status: LinkingStatus,
        source: SdkSource,
    ) -> Result<SdkMetadata, MetadataError>;
}

impl<T: ArtifactMetadataProvider + ?Sized> ArtifactMetadataProvider for &T {
    fn load_framework(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError> {
        (**self).load_framework(path)
    }

    fn load_library(
        &self,
        path: &Path,
        public_headers: &Path,
        swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError> {
        (**self).load_library(path, public_headers, swift_module_map)
    }

    fn load_xcframework(&self, path: &Path) -> Result<XcFrameworkMetadata, MetadataError> {
        (**self).load_xcframework(path)
    }
}

impl<T: SdkMetadataProvider + ?Sized> SdkMetadataProvider for &T {
    fn load_sdk(
        &self,
        name: &str,
        platform: Platform,
        status: LinkingStatus,
        source: SdkSource,
    ) -> Result<SdkMetadata, MetadataError> {
        (**self).load_sdk(name, platform, status, source)
    }
}

// ---------------------------------------------------------------------------
// InMemoryArtifacts
// ---------------------------------------------------------------------------

/// Metadata registered ahead of time, e.g. by an inspection pass that ran
/// before graph loading.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifacts {
    frameworks: HashMap<PathBuf, FrameworkMetadata>,
    libraries: HashMap<PathBuf, LibraryMetadata>,
    xcframeworks: HashMap<PathBuf, XcFrameworkMetadata>,
}

impl InMemoryArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_framework(mut self, path: impl Into<PathBuf>, metadata: FrameworkMetadata) -> Self {
        self.frameworks.insert(path.into(), metadata);
        self
    }

    #[must_use]
    pub fn with_library(mut self, path: impl Into<PathBuf>, metadata: LibraryMetadata) -> Self {
        self.libraries.insert(path.into(), metadata);
        self
    }

    #[must_use]
    pub fn with_xcframework(
        mut self,
        path: impl Into<PathBuf>,
        metadata: XcFrameworkMetadata,
    ) -> Self {
        self.xcframeworks.insert(path.into(), metadata);
        self
    }
}

impl ArtifactMetadataProvider for InMemoryArtifacts {
    fn load_framework(&self, path: &Path) -> Result<FrameworkMetadata, MetadataError> {
        self.frameworks
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(path.to_path_buf()))
    }

    fn load_library(
        &self,
        path: &Path,
        _public_headers: &Path,
        _swift_module_map: Option<&Path>,
    ) -> Result<LibraryMetadata, MetadataError> {
        self.libraries
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(path.to_path_buf()))
    }

    fn load_xcframework(&self, path: &Path) -> Result<XcFrameworkMetadata, MetadataError> {
        self.xcframeworks
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(path.to_path_buf()))
    }
}

// ---------------------------------------------------------------------------
// SystemSdkProvider
// ---------------------------------------------------------------------------

/// Resolves SDK names against an Xcode `Platforms` directory.
///
/// - `Foo.framework` → `<sdk>/System/Library/Frameworks/Foo.framework`
/// - `libfoo.tbd` → `<sdk>/usr/lib/libfoo.tbd`
/// - `Foo.swiftmodule` → `<sdk>/usr/lib/swift/Foo.swiftmodule`
///
/// Developer frameworks (`XCTest.framework`) live in
/// `<platform>/Developer/Library/Frameworks`.
#[derive(Debug, Clone)]
pub struct SystemSdkProvider {
    platforms_root: PathBuf,
}

impl SystemSdkProvider {
    #[must_use]
    pub fn new(platforms_root: impl Into<PathBuf>) -> Self {
        Self {
            platforms_root: platforms_root.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(config.platforms_root.clone())
    }

    fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.platforms_root
            .join(format!("{}.platform", platform.sdk_stem()))
    }
}

impl SdkMetadataProvider for SystemSdkProvider {
    fn load_sdk(
        &self,
        name: &str,
        platform: Platform,
        _status: LinkingStatus,
        source: SdkSource,
    ) -> Result<SdkMetadata, MetadataError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let platform_dir = self.platform_dir(platform);
        let sdk_root = platform_dir
            .join("Developer/SDKs")
            .join(format!("{}.sdk", platform.sdk_stem()));

        let path = match (source, extension) {
            (SdkSource::Developer, "framework") => {
                platform_dir.join("Developer/Library/Frameworks").join(name)
            }
            (SdkSource::System, "framework") => sdk_root.join("System/Library/Frameworks").join(name),
            (SdkSource::System, "tbd") => sdk_root.join("usr/lib").join(name),
            (SdkSource::System, "swiftmodule") => sdk_root.join("usr/lib/swift").join(name),
            (source, _) => {
                return Err(MetadataError::Unsupported(format!(
                    "sdk '{name}' has an unsupported extension for a {source:?} sdk"
                )));
            }
        };
        Ok(SdkMetadata { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sdks() -> SystemSdkProvider {
        SystemSdkProvider::new("/Platforms")
    }

    #[test]
    fn resolves_system_frameworks_per_platform() {
        let ios = sdks()
            .load_sdk("UIKit.framework", Platform::Ios, LinkingStatus::Required, SdkSource::System)
            .expect("framework");
        assert_eq!(
            ios.path,
            PathBuf::from(
                "/Platforms/iPhoneOS.platform/Developer/SDKs/iPhoneOS.sdk/System/Library/Frameworks/UIKit.framework"
            )
        );

        let mac = sdks()
            .load_sdk("AppKit.framework", Platform::Macos, LinkingStatus::Required, SdkSource::System)
            .expect("framework");
        assert!(mac.path.starts_with("/Platforms/MacOSX.platform"));
    }

    #[test]
    fn resolves_tbd_under_usr_lib() {
        let sdk = sdks()
            .load_sdk("libc++.tbd", Platform::Ios, LinkingStatus::Optional, SdkSource::System)
            .expect("tbd");
        assert!(sdk.path.ends_with("iPhoneOS.sdk/usr/lib/libc++.tbd"));
    }

    #[test]
    fn resolves_developer_frameworks() {
        let sdk = sdks()
            .load_sdk("XCTest.framework", Platform::Ios, LinkingStatus::Required, SdkSource::Developer)
            .expect("xctest");
        assert_eq!(
            sdk.path,
            PathBuf::from("/Platforms/iPhoneOS.platform/Developer/Library/Frameworks/XCTest.framework")
        );
    }

    #[test]
    fn rejects_unknown_extensions() {
        let err = sdks()
            .load_sdk("libz.dylib", Platform::Ios, LinkingStatus::Required, SdkSource::System)
            .expect_err("unsupported");
        assert!(matches!(err, MetadataError::Unsupported(_)));
    }

    #[test]
    fn in_memory_reports_missing_paths() {
        let artifacts = InMemoryArtifacts::new();
        assert_eq!(
            artifacts.load_framework(Path::new("/Missing.framework")),
            Err(MetadataError::NotFound(PathBuf::from("/Missing.framework")))
        );
    }
}
