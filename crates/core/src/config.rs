//! Key-value application settings stored as a JSON file.
//!
//! Loaded values are merged over built-in defaults, so a partial or missing
//! config file always yields a complete configuration.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::CoreError;

pub const CONFIG_JSON: &str = "config.json";

pub const DATABASE_PATH: &str = "database_path";
pub const BACKUP_PATH: &str = "backup_path";
pub const APP_NAME: &str = "app_name";
pub const VERSION: &str = "version";
pub const AUTO_BACKUP: &str = "auto_backup";
pub const BACKUP_INTERVAL_DAYS: &str = "backup_interval_days";
pub const SUGGESTIONS_ENABLED: &str = "suggestions_enabled";
pub const MAX_SUGGESTIONS: &str = "max_suggestions";

const DEFAULT_DATABASE_PATH: &str = "./Data/financial_data.json";
const DEFAULT_BACKUP_PATH: &str = "./Data/backups/";
const DEFAULT_BACKUP_INTERVAL_DAYS: u32 = 7;
const DEFAULT_MAX_SUGGESTIONS: usize = 10;

/// Allowed range for `backup_interval_days`.
pub const BACKUP_INTERVAL_RANGE: (u32, u32) = (1, 30);

/// Allowed range for `max_suggestions`.
pub const MAX_SUGGESTIONS_RANGE: (usize, usize) = (5, 20);

fn defaults() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(DATABASE_PATH.into(), json!(DEFAULT_DATABASE_PATH));
    map.insert(BACKUP_PATH.into(), json!(DEFAULT_BACKUP_PATH));
    map.insert(APP_NAME.into(), json!("Controle Financeiro"));
    map.insert(VERSION.into(), json!(crate::storage::format::SCHEMA_VERSION));
    map.insert(AUTO_BACKUP.into(), json!(true));
    map.insert(BACKUP_INTERVAL_DAYS.into(), json!(DEFAULT_BACKUP_INTERVAL_DAYS));
    map.insert(SUGGESTIONS_ENABLED.into(), json!(true));
    map.insert(MAX_SUGGESTIONS.into(), json!(DEFAULT_MAX_SUGGESTIONS));
    map
}

/// The application's configuration: a JSON object of settings plus the file it lives in.
///
/// Relative paths inside the configuration are resolved against the directory
/// that contains the config file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    base_dir: PathBuf,
    values: Map<String, Value>,
}

impl ConfigManager {
    /// Load `path`, falling back to defaults for a missing or unreadable file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let config_path = absolute(&path.into());
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut values = defaults();
        match read_object(&config_path) {
            Ok(Some(loaded)) => {
                debug!("Configuration loaded from {}", config_path.display());
                values.extend(loaded);
            }
            Ok(None) => debug!(
                "No configuration at {}, using defaults",
                config_path.display()
            ),
            Err(e) => warn!("Ignoring configuration file: {e}"),
        }

        Self {
            config_path,
            base_dir,
            values,
        }
    }

    /// Start from defaults with paths relative to `base_dir`, saving to `base_dir/config.json`.
    pub fn with_defaults(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = absolute(&base_dir.into());
        Self {
            config_path: base_dir.join(CONFIG_JSON),
            base_dir,
            values: defaults(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Value of `key`, or `default` when the key is missing or holds a different type.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(default)
    }

    /// Set `key` and write the config file. The in-memory value is updated even
    /// when the write fails.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), CoreError> {
        let value = serde_json::to_value(value)
            .map_err(|e| CoreError::Config(format!("Cannot store '{key}': {e}")))?;
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Write all settings to the config file.
    pub fn save(&self) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, json).map_err(|e| {
            CoreError::Config(format!(
                "Unable to write {}: {e}",
                self.config_path.display()
            ))
        })
    }

    // ── Typed accessors ─────────────────────────────────────────────

    /// Absolute path of the transaction data file.
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.get(DATABASE_PATH, DEFAULT_DATABASE_PATH.to_string()))
    }

    /// Absolute path of the backup directory. [`FinanceTracker::open`](crate::FinanceTracker::open)
    /// creates it when missing.
    pub fn backup_path(&self) -> PathBuf {
        self.resolve(&self.get(BACKUP_PATH, DEFAULT_BACKUP_PATH.to_string()))
    }

    pub fn auto_backup(&self) -> bool {
        self.get(AUTO_BACKUP, true)
    }

    /// Days between automatic backups, clamped to 1–30.
    pub fn backup_interval_days(&self) -> u32 {
        let (min, max) = BACKUP_INTERVAL_RANGE;
        self.get(BACKUP_INTERVAL_DAYS, DEFAULT_BACKUP_INTERVAL_DAYS)
            .clamp(min, max)
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.get(SUGGESTIONS_ENABLED, true)
    }

    /// Suggestion list length, clamped to 5–20.
    pub fn max_suggestions(&self) -> usize {
        let (min, max) = MAX_SUGGESTIONS_RANGE;
        self.get(MAX_SUGGESTIONS, DEFAULT_MAX_SUGGESTIONS)
            .clamp(min, max)
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        joined
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
}

fn read_object(path: &Path) -> Result<Option<Map<String, Value>>, CoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(CoreError::Config(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
