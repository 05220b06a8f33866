use serde::{Deserialize, Serialize};
use std::fmt;

/// How a precompiled binary is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryLinking {
    Static,
    Dynamic,
}

impl BinaryLinking {
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static)
    }

    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

/// Whether a missing binary fails the link (`required`) or is weak-linked.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkingStatus {
    #[default]
    Required,
    Optional,
}

impl LinkingStatus {
    /// The stronger of two statuses; `required` wins.
    #[must_use]
    pub const fn strongest(self, other: Self) -> Self {
        match (self, other) {
            (Self::Optional, Self::Optional) => Self::Optional,
            _ => Self::Required,
        }
    }
}

/// Where an SDK framework is found.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SdkSource {
    #[default]
    System,
    Developer,
}

/// CPU slice contained in a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BinaryArchitecture {
    #[serde(rename = "x86_64")]
    X8664,
    #[serde(rename = "i386")]
    I386,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "arm64e")]
    Arm64e,
    #[serde(rename = "armv7")]
    Armv7,
    #[serde(rename = "armv7s")]
    Armv7s,
    #[serde(rename = "armv7k")]
    Armv7k,
    #[serde(rename = "arm64_32")]
    Arm6432,
}

impl BinaryArchitecture {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X8664 => "x86_64",
            Self::I386 => "i386",
            Self::Arm64 => "arm64",
            Self::Arm64e => "arm64e",
            Self::Armv7 => "armv7",
            Self::Armv7s => "armv7s",
            Self::Armv7k => "armv7k",
            Self::Arm6432 => "arm64_32",
        }
    }
}

impl fmt::Display for BinaryArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of product a package exposes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    #[default]
    Runtime,
    Plugin,
    Macro,
}
