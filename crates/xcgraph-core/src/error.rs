//! Construction-time error taxonomy.
//!
//! Every failure this crate can report happens while a
//! [`DependencyGraph`](crate::graph::DependencyGraph) is being built. Once a
//! graph exists it is valid, and queries over it never fail.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::key::TargetKey;

/// Machine-readable error codes for tooling that wraps the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MissingProject,
    TargetNotFound,
    CycleDetected,
    ArtifactNotFound,
    UnsupportedConfiguration,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MissingProject => "E2001",
            Self::TargetNotFound => "E2002",
            Self::CycleDetected => "E2003",
            Self::ArtifactNotFound => "E3001",
            Self::UnsupportedConfiguration => "E3002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MissingProject => "Project not found",
            Self::TargetNotFound => "Target not found",
            Self::CycleDetected => "Circular dependency between targets",
            Self::ArtifactNotFound => "Precompiled artifact not found",
            Self::UnsupportedConfiguration => "Unsupported dependency configuration",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .xcgraph/config.toml and retry."),
            Self::MissingProject => {
                Some("Add the project to the workspace or fix the dependency's project path.")
            }
            Self::TargetNotFound => Some("Check the target name for typos."),
            Self::CycleDetected => {
                Some("Break the cycle by moving shared code into a separate target.")
            }
            Self::ArtifactNotFound => {
                Some("Make sure the artifact was built or fetched before generating.")
            }
            Self::UnsupportedConfiguration => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The kind of precompiled artifact a metadata provider failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Framework,
    Library,
    XcFramework,
    Sdk,
}

impl ArtifactKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Framework => "framework",
            Self::Library => "library",
            Self::XcFramework => "xcframework",
            Self::Sdk => "sdk",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building a dependency graph.
///
/// Construction is fail-fast: the first error aborts the build and no
/// partial graph is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("project not found at {}", path.display())]
    MissingProject { path: PathBuf },

    #[error("target '{name}' not found in project at {}", project_path.display())]
    TargetNotFound { name: String, project_path: PathBuf },

    #[error("circular dependency: {}", format_cycle(cycle))]
    CircularDependency { cycle: Vec<TargetKey> },

    #[error("{kind} not found at {}", path.display())]
    ArtifactNotFound { kind: ArtifactKind, path: PathBuf },

    #[error("unsupported configuration: {reason}")]
    UnsupportedConfiguration { reason: String },
}

impl GraphError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            reason: reason.into(),
        }
    }

    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingProject { .. } => ErrorCode::MissingProject,
            Self::TargetNotFound { .. } => ErrorCode::TargetNotFound,
            Self::CircularDependency { .. } => ErrorCode::CycleDetected,
            Self::ArtifactNotFound { .. } => ErrorCode::ArtifactNotFound,
            Self::UnsupportedConfiguration { .. } => ErrorCode::UnsupportedConfiguration,
        }
    }
}

fn format_cycle(cycle: &[TargetKey]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
