pub mod backup;
pub mod format;
pub mod manager;
