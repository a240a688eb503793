use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Repo creation policy: admins only, or any authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateRepoPolicy {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database and host key material.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Display-only base URL shown in rendered output.
    #[serde(default = "default_url")]
    pub url: String,
    /// Admin public keys in authorized-keys format.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Display-only strftime format for timestamps.
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_create_repo")]
    pub create_repo: CreateRepoPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_url() -> String {
    "ssh://localhost".to_string()
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

fn default_create_repo() -> CreateRepoPolicy {
    CreateRepoPolicy::Admin
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            url: default_url(),
            admins: Vec::new(),
            time_format: default_time_format(),
            create_repo: default_create_repo(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, falling back to defaults when no
    /// path is given. `PATCHBAY_DATA_DIR` overrides `data_dir` either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))?
            }
            None => Config::default(),
        };

        if let Ok(dir) = std::env::var("PATCHBAY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("patchbay.db")
    }
}
