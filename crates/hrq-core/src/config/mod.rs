//! Configuration: the on-disk file and the runtime defaults built from it.

mod persistent;

pub use persistent::{Defaults, PersistentConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::code::DEFAULT_CODE_CEILING;

/// Configuration loaded from `~/.config/hrq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrqConfig {
    /// Timeout of the first attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the first attempt for timeouts and connection failures.
    pub max_retries: u32,
    /// Each retry's timeout is the previous one times this factor.
    pub backoff_multiplier: f32,
    /// Charset label used to decode response bodies (e.g. "UTF-8", "latin1").
    pub encoding: String,
    /// Maximum transport attempts running at once.
    pub max_concurrent_requests: usize,
    /// Request codes wrap back to 1 after this value.
    #[serde(default = "default_code_ceiling")]
    pub code_ceiling: u32,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Query parameters appended to every request URL.
    #[serde(default)]
    pub url_parameters: HashMap<String, String>,
}

fn default_code_ceiling() -> u32 {
    DEFAULT_CODE_CEILING
}

impl Default for HrqConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 0,
            backoff_multiplier: 1.5,
            encoding: "UTF-8".to_string(),
            max_concurrent_requests: 4,
            code_ceiling: DEFAULT_CODE_CEILING,
            headers: HashMap::new(),
            url_parameters: HashMap::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hrq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HrqConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<HrqConfig> {
    if !path.exists() {
        let default_cfg = HrqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: HrqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
