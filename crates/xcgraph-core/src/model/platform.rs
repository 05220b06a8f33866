use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// An Apple platform a target can be built for.
///
/// The derived order is the canonical order used wherever platform sets are
/// rendered, so it must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Macos,
    Tvos,
    Watchos,
    Visionos,
}

impl Platform {
    pub const ALL: [Self; 5] = [
        Self::Ios,
        Self::Macos,
        Self::Tvos,
        Self::Watchos,
        Self::Visionos,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Macos => "macos",
            Self::Tvos => "tvos",
            Self::Watchos => "watchos",
            Self::Visionos => "visionos",
        }
    }

    /// Directory stem of the device SDK, e.g. `iPhoneOS` in
    /// `iPhoneOS.platform/Developer/SDKs/iPhoneOS.sdk`.
    #[must_use]
    pub const fn sdk_stem(self) -> &'static str {
        match self {
            Self::Ios => "iPhoneOS",
            Self::Macos => "MacOSX",
            Self::Tvos => "AppleTVOS",
            Self::Watchos => "WatchOS",
            Self::Visionos => "XROS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "macos" | "osx" => Ok(Self::Macos),
            "tvos" => Ok(Self::Tvos),
            "watchos" => Ok(Self::Watchos),
            "visionos" | "xros" => Ok(Self::Visionos),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}
