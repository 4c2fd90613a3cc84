use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::transaction::Transaction;

/// Schema version written into every data file.
pub const SCHEMA_VERSION: &str = "2.0.0";

/// Filename prefix of regular backups: `financial_data_<YYYY-MM-DD_HH-MM-SS>.json`.
pub const BACKUP_PREFIX: &str = "financial_data_";

/// Filename prefix of the safety copy taken right before a restore.
pub const PRE_RESTORE_PREFIX: &str = "pre_restore_";

/// Extension shared by the data file and every backup.
pub const JSON_EXTENSION: &str = ".json";

/// Timestamp layout embedded in regular backup filenames.
/// Zero-padded, so lexical order equals chronological order.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp layout embedded in pre-restore filenames.
pub const PRE_RESTORE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The JSON document stored in the data file (and, byte for byte, in every backup).
///
/// ```text
/// { "transactions": [...], "saved_at": "2025-01-15T10:30:00", "schema_version": "2.0.0" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    pub transactions: Vec<Transaction>,

    #[serde(default)]
    pub saved_at: Option<NaiveDateTime>,

    /// Older files carry this under `version`.
    #[serde(default = "default_schema_version", alias = "version")]
    pub schema_version: String,

    #[serde(default)]
    pub total_transactions: usize,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl DataFile {
    /// Wrap a snapshot of transactions, stamped with the current local time.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let total_transactions = transactions.len();
        Self {
            transactions,
            saved_at: Some(now()),
            schema_version: SCHEMA_VERSION.to_string(),
            total_transactions,
        }
    }
}

// ── Backup filenames ────────────────────────────────────────────────
//
// All backup naming goes through the functions below, so creation, listing
// and the due-check always agree on the format.

/// `financial_data_<YYYY-MM-DD_HH-MM-SS>.json` for the given moment.
pub fn backup_filename(at: NaiveDateTime) -> String {
    format!(
        "{BACKUP_PREFIX}{}{JSON_EXTENSION}",
        at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// `pre_restore_<YYYYMMDD_HHMMSS>.json` for the given moment.
pub fn pre_restore_filename(at: NaiveDateTime) -> String {
    format!(
        "{PRE_RESTORE_PREFIX}{}{JSON_EXTENSION}",
        at.format(PRE_RESTORE_TIMESTAMP_FORMAT)
    )
}

/// Whether `name` looks like a regular backup (prefix + `.json`).
/// Pre-restore copies and unrelated JSON files do not qualify.
pub fn is_backup_filename(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(JSON_EXTENSION)
}

/// Extract the creation timestamp embedded in a regular backup filename.
/// Returns `None` for anything that does not match the format exactly.
pub fn parse_backup_filename(name: &str) -> Option<NaiveDateTime> {
    let stamp = name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(JSON_EXTENSION)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}

/// Current local wall-clock time, truncated to whole seconds by the formats above.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
