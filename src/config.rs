use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whole-request timeout for every fetch, in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Number of platform artifacts checked at once. 1 keeps checks sequential.
    pub concurrency: usize,
    /// Reject download URLs that carry no `checksum` query parameter.
    pub require_checksum: bool,
    pub show_progress: bool,
    /// Where scratch directories are created. Defaults to the system temp dir.
    pub scratch_parent: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 15,
            concurrency: 1,
            require_checksum: false,
            show_progress: true,
            scratch_parent: None,
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "plan-check", "plan-check")
        .context("Failed to determine project directories")?;
    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Loads the user config, writing the defaults out on first use.
pub fn load_config() -> Result<Config> {
    load_config_at(&config_path()?)
}

pub fn load_config_at(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    } else {
        let config = Config::default();
        save_config_at(&config, path)?;
        tracing::info!("created default config at {}", path.display());
        Ok(config)
    }
}

pub fn save_config_at(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
