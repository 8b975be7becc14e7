//! Service configuration
//!
//! Loaded from a JSON file (`otad.json` by default, overridable via
//! `OTAD_CONFIG`). A missing file falls back to defaults; a present
//! but unparseable file is an error so a typo never silently reverts
//! fleet settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV: &str = "OTAD_CONFIG";

/// Default config file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "otad.json";

/// External compiler invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Toolchain executable
    pub command: String,
    /// Fully-qualified board name passed to the toolchain
    pub fqbn: String,
    /// Extra libraries directory passed to the toolchain
    pub libraries_dir: Option<PathBuf>,
    /// Wall-clock timeout for one compile invocation
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: "arduino-cli".to_string(),
            fqbn: "esp32:esp32:esp32".to_string(),
            libraries_dir: None,
            timeout_secs: 1800,
        }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listen address
    pub listen_addr: SocketAddr,
    /// Persistent store document
    pub store_path: PathBuf,
    /// Output directory for compiled firmware images
    pub firmware_dir: PathBuf,
    /// Scratch directory for compile sketches
    pub build_dir: PathBuf,
    /// Compiler settings
    pub compiler: CompilerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            store_path: PathBuf::from("ota_store.json"),
            firmware_dir: PathBuf::from("firmware_bins"),
            build_dir: PathBuf::from("build/temp"),
            compiler: CompilerConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `OTAD_CONFIG` or the default path
    ///
    /// A missing file yields `Ok(None)` so the caller can fall back to
    /// defaults with a log line; a malformed file is an error.
    pub async fn load() -> Result<Option<Self>> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: ServiceConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!(path = ?path, listen_addr = %config.listen_addr, "Loaded config");
        Ok(Some(config))
    }
}
