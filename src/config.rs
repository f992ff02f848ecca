use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the interactive demo writes the encrypted image.
    pub encrypted_output: PathBuf,
    /// Where the interactive demo writes the decrypted copy.
    pub decrypted_output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encrypted_output: PathBuf::from("encrypted.png"),
            decrypted_output: PathBuf::from("decrypted.png"),
        }
    }
}

pub fn get_config_file_path() -> Result<PathBuf> {
    let mut path = dirs::home_dir().context("Could not find home directory")?;
    path.push(".pixcrypt");
    path.push("config.json");
    Ok(path)
}

/// Reads `~/.pixcrypt/config.json`, or the defaults if it does not exist.
pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_file_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("No config at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Malformed config {:?}", path))?;
    Ok(config)
}
