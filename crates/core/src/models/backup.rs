use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A backup file found in the backup directory. Rebuilt on every scan, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// Filesystem modification time (local)
    pub modified: NaiveDateTime,
    /// Absolute path of the backup file
    pub path: PathBuf,
}
