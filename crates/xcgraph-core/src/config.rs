use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;

/// Settings that shape graph construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub sdk: SdkConfig,
    #[serde(default)]
    pub linking: LinkingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Longest dependency chain a graph may contain.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default = "default_platforms_root")]
    pub platforms_root: PathBuf,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            platforms_root: default_platforms_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkingConfig {
    /// Give app clip targets an implicit, iOS-only `AppClip.framework`.
    #[serde(default = "default_true")]
    pub implicit_app_clip_sdk: bool,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            implicit_app_clip_sdk: default_true(),
        }
    }
}

const CONFIG_FILE: &str = ".xcgraph/config.toml";
const MAX_DEPTH_ENV: &str = "XCGRAPH_MAX_DEPTH";

fn read_config(path: &Path) -> Result<GraphConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<GraphConfig>(&content).with_context(|| {
        format!(
            "{}: {} in {}",
            ErrorCode::ConfigParseError,
            ErrorCode::ConfigParseError.message(),
            path.display()
        )
    })
}

/// Load `<workspace_root>/.xcgraph/config.toml`, if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<GraphConfig>> {
    let path = workspace_root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path).map(Some)
}

/// Load `<config_dir>/xcgraph/config.toml`, if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<GraphConfig>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };

    let path = config_dir.join("xcgraph/config.toml");
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path).map(Some)
}

/// Resolve the effective configuration for a workspace.
///
/// The workspace file wins over the user file, which wins over defaults.
/// `XCGRAPH_MAX_DEPTH` then overrides `traversal.max_depth`.
///
/// # Errors
///
/// Returns an error if a config file is unreadable or malformed, or if the
/// environment override is not a positive integer.
pub fn resolve_config(workspace_root: &Path) -> Result<GraphConfig> {
    let base = match load_workspace_config(workspace_root)? {
        Some(config) => config,
        None => load_user_config()?.unwrap_or_default(),
    };
    apply_env_overrides(base, std::env::var(MAX_DEPTH_ENV).ok())
}

fn apply_env_overrides(mut config: GraphConfig, max_depth: Option<String>) -> Result<GraphConfig> {
    if let Some(raw) = max_depth {
        let depth: usize = raw
            .trim()
            .parse()
            .with_context(|| format!("{MAX_DEPTH_ENV} must be a positive integer, got '{raw}'"))?;
        anyhow::ensure!(depth > 0, "{MAX_DEPTH_ENV} must be greater than zero");
        config.traversal.max_depth = depth;
    }
    Ok(config)
}

const fn default_true() -> bool {
    true
}

const fn default_max_depth() -> usize {
    256
}

fn default_platforms_root() -> PathBuf {
    PathBuf::from("/Applications/Xcode.app/Contents/Developer/Platforms")
}
