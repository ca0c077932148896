//! JSON file backed settings store.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::SettingsStore;
use crate::error::{FitError, Result};

/// Settings persisted as a flat JSON object in a single file.
///
/// The default location is `settings.json` next to the config file. Reads
/// of a missing file behave like an empty store; writes create the parent
/// directory as needed.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the store at the platform default location.
    pub fn open_default() -> Result<Self> {
        let dir = crate::config::get_config_dir().ok_or_else(|| {
            FitError::Store(
                rust_i18n::t!("store.read_failed", error = "no home directory").to_string(),
            )
        })?;
        Ok(Self::new(dir.join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(FitError::Store(
                    rust_i18n::t!("store.read_failed", error = e.to_string()).to_string(),
                ));
            }
        };
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            FitError::Store(rust_i18n::t!("store.read_failed", error = e.to_string()).to_string())
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(FitError::Store(
                rust_i18n::t!("store.read_failed", error = "settings root is not an object")
                    .to_string(),
            )),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FitError::Store(
                    rust_i18n::t!("store.write_failed", error = e.to_string()).to_string(),
                )
            })?;
        }
        let raw = serde_json::to_string_pretty(&Value::Object(map.clone())).map_err(|e| {
            FitError::Store(rust_i18n::t!("store.write_failed", error = e.to_string()).to_string())
        })?;
        std::fs::write(&self.path, raw).map_err(|e| {
            FitError::Store(rust_i18n::t!("store.write_failed", error = e.to_string()).to_string())
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
