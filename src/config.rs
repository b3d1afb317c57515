use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

/// Overrides for the sandbox layout. Anything left unset is resolved to
/// the conventional per-user location at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub app_dir: Option<PathBuf>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_app_id() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            root: None,
            app_dir: None,
            cache_dir: None,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sandspace")
            .join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sandbox: SandboxConfig::default(),
        }
    }
}
