pub mod backup;
pub mod summary;
pub mod suggestion;
pub mod transaction;
