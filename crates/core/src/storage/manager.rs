use std::path::Path;

use crate::errors::CoreError;

use super::format::DataFile;

/// Low-level data file operations: whole-file JSON read and whole-file JSON write.
pub struct StorageManager;

impl StorageManager {
    /// Serialize a data file document to pretty-printed JSON bytes.
    pub fn save_to_bytes(data: &DataFile) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec_pretty(data)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize data file: {e}")))
    }

    /// Parse a data file document from raw bytes.
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DataFile, CoreError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CoreError::Deserialization(format!("Failed to parse data file: {e}")))
    }

    /// Write the document to `path`, creating parent directories as needed.
    ///
    /// The file is replaced in a single write; there is no temp-file step.
    pub fn save_to_file(data: &DataFile, path: &Path) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(data)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Persistence(format!(
                    "Unable to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        std::fs::write(path, bytes).map_err(|e| {
            CoreError::Persistence(format!("Unable to write {}: {e}", path.display()))
        })
    }

    /// Read the document at `path`.
    ///
    /// `Ok(None)` when the file does not exist. Unreadable or unparseable files
    /// are reported as `CoreError::Load`.
    pub fn load_from_file(path: &Path) -> Result<Option<DataFile>, CoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path).map_err(|e| {
            CoreError::Load(format!("Unable to read {}: {e}", path.display()))
        })?;
        Self::load_from_bytes(&bytes)
            .map(Some)
            .map_err(|e| CoreError::Load(format!("{}: {e}", path.display())))
    }
}
