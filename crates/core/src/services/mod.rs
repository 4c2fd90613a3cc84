pub mod report_service;
pub mod suggestion_engine;
pub mod transaction_store;
