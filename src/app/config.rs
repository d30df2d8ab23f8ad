use std::path::{Path, PathBuf};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use crate::renderer::config::RenderConfig;

const DEFAULT_CONFIG_FILE: &str = "vkswap.toml";
const CONFIG_PATH_ENV: &str = "VKSWAP_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("vkswap"),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    /// Ends the session after this many presented frames.
    pub max_frames: Option<u64>,
}

impl AppConfig {
    /// Reads the file named by `VKSWAP_CONFIG`, else `vkswap.toml` in the working directory.
    /// A missing file gives the defaults. A file that exists but does not parse is an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let config = Self::parse(&source)
                    .wrap_err_with(|| format!("Invalid config file {:?}", path))?;
                log::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config file at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(err) => Err(err).wrap_err_with(|| format!("Failed to read config file {:?}", path)),
        }
    }

    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}
