//! Configuration and snapshot loading

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use qroute_routing_engine::config::EngineConfig;
use serde::de::DeserializeOwned;
use tracing::debug;

/// `<config dir>/qroute/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("qroute").join("config.toml"))
}

/// Load the engine configuration
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.is_file()),
    };

    let config = match path {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
            let config: EngineConfig =
                toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
            debug!(path = %path.display(), "configuration loaded");
            config
        }
        None => EngineConfig::default(),
    };

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &EngineConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))
}

/// Read a JSON snapshot file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
