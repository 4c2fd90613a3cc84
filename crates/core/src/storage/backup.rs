use chrono::{DateTime, Local, NaiveDateTime};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::backup::BackupRecord;

use super::format::{self, backup_filename, is_backup_filename, parse_backup_filename};

/// Creates, lists and restores timestamped copies of the data file.
///
/// Works purely on the filesystem: it knows the data file path and the backup
/// directory, never the in-memory transactions. After a successful restore the
/// caller is responsible for reloading the store.
#[derive(Debug, Clone)]
pub struct BackupManager {
    data_file: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(data_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Point the manager at a different data file (after a relocation).
    pub fn set_data_file(&mut self, path: impl Into<PathBuf>) {
        self.data_file = path.into();
    }

    /// Create the backup directory if it does not exist yet.
    pub fn ensure_backup_dir(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.backup_dir).map_err(|e| {
            CoreError::Backup(format!(
                "Unable to create backup directory {}: {e}",
                self.backup_dir.display()
            ))
        })
    }

    /// Copy the data file to `financial_data_<YYYY-MM-DD_HH-MM-SS>.json`.
    ///
    /// Returns the new backup's filename.
    pub fn create_backup(&self) -> Result<String, CoreError> {
        self.create_backup_at(format::now())
    }

    /// Same as [`create_backup`](Self::create_backup) with an explicit timestamp.
    ///
    /// Fails if the data file is missing, the backup directory cannot be created,
    /// or a backup with the same name already exists (it is never overwritten).
    pub fn create_backup_at(&self, at: NaiveDateTime) -> Result<String, CoreError> {
        if !self.data_file.is_file() {
            return Err(CoreError::Backup(format!(
                "Data file {} does not exist",
                self.data_file.display()
            )));
        }
        self.ensure_backup_dir()?;

        let filename = backup_filename(at);
        let target = self.backup_dir.join(&filename);
        copy_to_new_file(&self.data_file, &target).map_err(|e| {
            CoreError::Backup(format!("Unable to write {}: {e}", target.display()))
        })?;

        info!("Backup created: {filename}");
        Ok(filename)
    }

    /// All regular backups in the backup directory, newest first.
    ///
    /// Only `financial_data_*.json` files count; pre-restore copies and any other
    /// JSON files in the directory are ignored. A missing directory yields an empty list.
    pub fn list_backups(&self) -> Vec<BackupRecord> {
        let entries = match std::fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    "Backup directory {} not readable: {e}",
                    self.backup_dir.display()
                );
                return Vec::new();
            }
        };

        let mut records: Vec<BackupRecord> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let filename = entry.file_name().to_string_lossy().to_string();
                if !is_backup_filename(&filename) {
                    return None;
                }
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let modified = metadata
                    .modified()
                    .map(|t| DateTime::<Local>::from(t).naive_local())
                    .ok()?;
                Some(BackupRecord {
                    filename,
                    size: metadata.len(),
                    modified,
                    path: absolute(&entry.path()),
                })
            })
            .collect();

        // Fixed zero-padded timestamp format: descending name == newest first
        records.sort_by(|a, b| b.filename.cmp(&a.filename));
        records
    }

    /// Replace the data file with the contents of backup `filename`.
    ///
    /// Before overwriting, the current data file is copied to
    /// `pre_restore_<YYYYMMDD_HHMMSS>.json` (best effort). Returns `false` if the
    /// backup does not exist or the overwrite fails; the data file is untouched then.
    pub fn restore_backup(&self, filename: &str) -> bool {
        let Some(source) = self.resolve_backup(filename) else {
            warn!("Backup not found: {filename}");
            return false;
        };

        if self.data_file.is_file() {
            let safety = self
                .backup_dir
                .join(format::pre_restore_filename(format::now()));
            match copy_to_new_file(&self.data_file, &safety) {
                Ok(_) => debug!("Pre-restore snapshot written to {}", safety.display()),
                Err(e) => warn!("Pre-restore snapshot failed, continuing: {e}"),
            }
        }

        if let Some(parent) = self.data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Unable to create {}: {e}", parent.display());
                return false;
            }
        }

        match std::fs::copy(&source, &self.data_file) {
            Ok(_) => {
                info!("Backup restored: {filename}");
                true
            }
            Err(e) => {
                warn!("Failed to restore backup {filename}: {e}");
                false
            }
        }
    }

    /// Whether an automatic backup should be taken now.
    pub fn is_backup_due(&self, interval_days: u32) -> bool {
        self.is_backup_due_at(interval_days, format::now())
    }

    /// Due when there is no backup yet, when the newest backup is at least
    /// `interval_days` whole days older than `now`, or when its timestamp cannot be parsed.
    pub fn is_backup_due_at(&self, interval_days: u32, now: NaiveDateTime) -> bool {
        let backups = self.list_backups();
        let Some(latest) = backups.first() else {
            return true;
        };

        match parse_backup_filename(&latest.filename) {
            Some(created) => {
                let elapsed = (now - created).num_days();
                elapsed >= i64::from(interval_days)
            }
            None => {
                warn!(
                    "Cannot parse timestamp of backup {}, treating backup as due",
                    latest.filename
                );
                true
            }
        }
    }

    /// Path of a file directly inside the backup directory, if it exists.
    /// Names with path components are rejected.
    fn resolve_backup(&self, filename: &str) -> Option<PathBuf> {
        let is_plain_name = Path::new(filename)
            .file_name()
            .is_some_and(|name| name == filename);
        if !is_plain_name {
            return None;
        }
        let path = self.backup_dir.join(filename);
        path.is_file().then_some(path)
    }
}

/// Copy `from` into a file that must not exist yet.
fn copy_to_new_file(from: &Path, to: &Path) -> std::io::Result<u64> {
    let mut source = File::open(from)?;
    let mut target = OpenOptions::new().write(true).create_new(true).open(to)?;
    std::io::copy(&mut source, &mut target)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
