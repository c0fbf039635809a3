use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::view::SortMode;

pub const CONFIG_FILE: &str = "taskboard.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Published CSV export URL, or a local CSV path.
    pub csv_url: String,
    /// Endpoint that receives status updates. Sync is off when unset.
    pub api_url: Option<String>,
    pub show_complete: bool,
    pub sort: SortMode,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_url: String::new(),
            api_url: None,
            show_complete: false,
            sort: SortMode::Date,
            log_file: PathBuf::from("taskboard.log"),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("no config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes a default config into `dir`. Returns `None` if one is already there.
    pub fn init(dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return Ok(None);
        }
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(write_err)?;
        let json = serde_json::to_string_pretty(&Config::default()).map_err(|source| {
            ConfigError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json).map_err(write_err)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"csv_url":"tasks.csv","sort":"priority"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.csv_url, "tasks.csv");
        assert_eq!(config.sort, SortMode::Priority);
        assert_eq!(config.api_url, None);
        assert!(!config.show_complete);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("board");
        let written = Config::init(&target).unwrap().unwrap();
        assert_eq!(Config::load(&written).unwrap(), Config::default());
        assert!(Config::init(&target).unwrap().is_none());
    }
}
