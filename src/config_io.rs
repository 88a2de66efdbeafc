//! Runtime configuration I/O operations.
//!
//! This module contains system directory detection and the persistent
//! key-value config store. The store keeps a typed [`Config`] but exposes the
//! flat key space the shell works with (`get("font_size")`,
//! `set("scheme", "oblivion")`).

use crate::config::{Config, ConfigError};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Application name used for the per-user data directory
pub const APP_NAME: &str = "jellypie";

/// Directory paths for editor state and configuration
///
/// Passed explicitly so tests can point everything at a temp directory.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Data directory, e.g. ~/.local/share/jellypie on Linux
    pub data_dir: PathBuf,

    /// User's home directory
    pub home_dir: Option<PathBuf>,
}

impl DirectoryContext {
    /// Create a DirectoryContext from the system directories
    /// This should ONLY be called from main()
    pub fn from_system() -> std::io::Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine data directory",
                )
            })?
            .join(APP_NAME);

        Ok(Self {
            data_dir,
            home_dir: dirs::home_dir(),
        })
    }

    /// Create a DirectoryContext for testing with a temp directory
    pub fn for_testing(temp_dir: &Path) -> Self {
        Self {
            data_dir: temp_dir.join("data"),
            home_dir: Some(temp_dir.join("home")),
        }
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(Config::FILENAME)
    }
}

/// Persistent configuration backed by a single JSON file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load the store from `path`, merging the file over the built-in defaults.
    ///
    /// A missing file is not an error: the defaults are used and nothing is
    /// written until the first `set`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            Config::load_from_file(&path)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Config::default()
        };
        Ok(Self { path, config })
    }

    /// Build a store around an existing config without touching the disk
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read one key from the flat key space
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(&self.config) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Set one key and rewrite the whole file.
    ///
    /// The new value must fit the key's type; otherwise the store is left
    /// unchanged and nothing is written.
    pub fn set(&mut self, key: &str, value: impl Serialize) -> Result<(), ConfigError> {
        let value = serde_json::to_value(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let mut map = match serde_json::to_value(&self.config) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ConfigError::Serialize("config is not an object".to_string())),
            Err(e) => return Err(ConfigError::Serialize(e.to_string())),
        };
        map.insert(key.to_string(), value);

        let updated: Config = serde_json::from_value(Value::Object(map))
            .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        updated.validate()?;

        self.config = updated;
        self.save()
    }

    /// Write the full config, 4-space indented, with a trailing newline
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut contents, formatter);
        self.config
            .serialize(&mut serializer)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        contents.push(b'\n');

        std::fs::write(&self.path, contents)?;
        tracing::debug!("Config written to {:?}", self.path);
        Ok(())
    }
}
