pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

use chrono::NaiveDateTime;
use config::ConfigManager;
use models::{
    backup::BackupRecord,
    suggestion::{PopularTransaction, SuggestionStats},
    summary::{Balance, CategorySummary, MonthlyReport},
    transaction::{Category, Transaction, TransactionFilter, TransactionKind},
};
use services::{
    report_service::ReportService,
    suggestion_engine::SuggestionEngine,
    transaction_store::{LoadStatus, TransactionStore},
};
use std::path::PathBuf;
use storage::backup::BackupManager;
use tracing::{info, warn};

use errors::CoreError;

/// Number of entries returned by [`FinanceTracker::popular_transactions`].
pub const POPULAR_LIMIT: usize = 6;

/// Main entry point for the Finance Tracker core library.
///
/// Owns the transaction store, the suggestion engine and the backup manager, and
/// keeps them in step: every change to the transactions is persisted and then
/// re-indexed; a restore reloads the store and re-indexes it.
#[must_use]
pub struct FinanceTracker {
    config: ConfigManager,
    store: TransactionStore,
    engine: SuggestionEngine,
    backups: BackupManager,
    report_service: ReportService,
}

impl std::fmt::Debug for FinanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceTracker")
            .field("data_file", &self.store.path())
            .field("backup_dir", &self.backups.backup_dir())
            .field("transactions", &self.store.len())
            .field("suggestions_enabled", &self.config.suggestions_enabled())
            .field("dirty", &self.store.has_unsaved_changes())
            .finish()
    }
}

impl FinanceTracker {
    /// Load the data file named by `config`, index it, and take an automatic
    /// backup if one is due. Nothing here fails: load and backup problems are logged.
    pub fn open(config: ConfigManager) -> Self {
        let data_file = config.database_path();
        let backup_dir = config.backup_path();

        let store = TransactionStore::open(&data_file);
        let backups = BackupManager::new(data_file, backup_dir);
        if let Err(e) = backups.ensure_backup_dir() {
            warn!("{e}");
        }

        let mut tracker = Self {
            config,
            store,
            engine: SuggestionEngine::new(),
            backups,
            report_service: ReportService::new(),
        };
        tracker.refresh_suggestions();
        tracker.run_auto_backup();
        tracker
    }

    /// Load the config file at `config_path` and open the tracker it describes.
    pub fn open_path(config_path: impl Into<PathBuf>) -> Self {
        Self::open(ConfigManager::load(config_path))
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Add a transaction, persist, and re-index.
    ///
    /// A failed write still keeps the transaction; check
    /// [`has_unsaved_changes`](Self::has_unsaved_changes) for durability.
    pub fn add_transaction(
        &mut self,
        description: &str,
        amount: f64,
        kind: TransactionKind,
        category: Category,
        occurred_at: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> Result<Transaction, CoreError> {
        let transaction =
            self.store
                .add(description, amount, kind, category, occurred_at, notes)?;
        self.refresh_suggestions();
        Ok(transaction)
    }

    /// Remove a transaction by id. Returns `false` if the id is unknown.
    pub fn remove_transaction(&mut self, id: &str) -> bool {
        let removed = self.store.remove(id);
        if removed {
            self.refresh_suggestions();
        }
        removed
    }

    #[must_use]
    pub fn get_transaction(&self, id: &str) -> Option<&Transaction> {
        self.store.get(id)
    }

    /// Transactions within the inclusive range, newest first.
    #[must_use]
    pub fn get_transactions(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Vec<&Transaction> {
        self.store.list(start, end)
    }

    /// Transactions matching every criterion of `filter`, newest first.
    #[must_use]
    pub fn filter_transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        self.store.filter(filter)
    }

    #[must_use]
    pub fn calculate_balance(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Balance {
        self.store.balance(start, end)
    }

    #[must_use]
    pub fn category_summary(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> CategorySummary {
        self.store.category_summary(start, end)
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the latest change could not be written to the data file.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }

    /// Retry writing the data file.
    pub fn save(&mut self) -> Result<(), CoreError> {
        self.store.persist()
    }

    /// Re-read the data file and re-index.
    pub fn reload_data(&mut self) -> LoadStatus {
        let status = self.store.reload();
        self.refresh_suggestions();
        status
    }

    /// Move the data file to `path`.
    ///
    /// The current file is backed up first (best effort), the transactions are
    /// written to the new location, and the configuration is updated.
    pub fn change_database_location(&mut self, path: impl Into<PathBuf>) -> Result<(), CoreError> {
        let path = path.into();
        if let Err(e) = self.backups.create_backup() {
            warn!("Backup before relocation skipped: {e}");
        }
        self.store.relocate(&path)?;
        self.backups.set_data_file(&path);
        self.config
            .set(config::DATABASE_PATH, path.to_string_lossy().to_string())?;
        info!("Data file moved to {}", path.display());
        Ok(())
    }

    // ── Suggestions ─────────────────────────────────────────────────

    /// Description completions for `partial_text`, at most `max_suggestions` long.
    /// Empty while suggestions are disabled.
    #[must_use]
    pub fn suggest_descriptions(&self, partial_text: &str, kind: TransactionKind) -> Vec<String> {
        if !self.config.suggestions_enabled() {
            return Vec::new();
        }
        self.engine
            .suggest_descriptions(partial_text, kind, self.config.max_suggestions())
    }

    #[must_use]
    pub fn suggest_category(&self, description: &str, kind: TransactionKind) -> Option<Category> {
        if !self.config.suggestions_enabled() {
            return None;
        }
        self.engine.suggest_category(description, kind)
    }

    #[must_use]
    pub fn suggest_amount(&self, description: &str) -> Option<f64> {
        if !self.config.suggestions_enabled() {
            return None;
        }
        self.engine.suggest_amount(description)
    }

    /// The [`POPULAR_LIMIT`] most frequently used descriptions of `kind`, with
    /// suggested category and amount.
    #[must_use]
    pub fn popular_transactions(&self, kind: TransactionKind) -> Vec<PopularTransaction> {
        self.popular_transactions_with_limit(kind, POPULAR_LIMIT)
    }

    /// Same as [`popular_transactions`](Self::popular_transactions) with an explicit length.
    #[must_use]
    pub fn popular_transactions_with_limit(
        &self,
        kind: TransactionKind,
        limit: usize,
    ) -> Vec<PopularTransaction> {
        if !self.config.suggestions_enabled() {
            return Vec::new();
        }
        self.engine.popular(kind, limit)
    }

    /// Counters of the current index. All zero while suggestions are disabled.
    #[must_use]
    pub fn suggestion_statistics(&self) -> SuggestionStats {
        self.engine.statistics()
    }

    /// Rebuild the suggestion index from the current transactions.
    pub fn update_suggestions(&mut self) {
        self.refresh_suggestions();
    }

    /// Throw away everything learned and learn it again.
    pub fn clear_suggestions(&mut self) {
        self.engine.clear();
        self.refresh_suggestions();
    }

    #[must_use]
    pub fn suggestions_enabled(&self) -> bool {
        self.config.suggestions_enabled()
    }

    /// Turn suggestions on or off. Turning them on re-indexes immediately;
    /// turning them off drops the index.
    pub fn set_suggestions_enabled(&mut self, enabled: bool) -> Result<(), CoreError> {
        let saved = self.config.set(config::SUGGESTIONS_ENABLED, enabled);
        if enabled {
            self.refresh_suggestions();
        } else {
            self.engine.clear();
        }
        saved
    }

    /// Set the completion list length. The value is clamped to 5–20 and the
    /// stored value is returned.
    pub fn set_max_suggestions(&mut self, max: usize) -> Result<usize, CoreError> {
        let (min, upper) = config::MAX_SUGGESTIONS_RANGE;
        let clamped = max.clamp(min, upper);
        self.config.set(config::MAX_SUGGESTIONS, clamped)?;
        Ok(clamped)
    }

    // ── Backups ─────────────────────────────────────────────────────

    /// Snapshot the data file now. Returns the backup's filename.
    pub fn create_backup(&self) -> Result<String, CoreError> {
        self.backups.create_backup()
    }

    #[must_use]
    pub fn list_backups(&self) -> Vec<BackupRecord> {
        self.backups.list_backups()
    }

    /// Restore backup `filename`, then reload and re-index.
    /// Returns `false`, changing nothing, if the backup does not exist.
    pub fn restore_backup(&mut self, filename: &str) -> bool {
        if !self.backups.restore_backup(filename) {
            return false;
        }
        self.store.reload();
        self.refresh_suggestions();
        true
    }

    /// Whether the configured backup interval has elapsed since the newest backup.
    #[must_use]
    pub fn is_backup_due(&self) -> bool {
        self.backups.is_backup_due(self.config.backup_interval_days())
    }

    pub fn set_auto_backup(&mut self, enabled: bool) -> Result<(), CoreError> {
        self.config.set(config::AUTO_BACKUP, enabled)
    }

    /// Set the automatic backup interval. Clamped to 1–30 days; the stored value is returned.
    pub fn set_backup_interval_days(&mut self, days: u32) -> Result<u32, CoreError> {
        let (min, max) = config::BACKUP_INTERVAL_RANGE;
        let clamped = days.clamp(min, max);
        self.config.set(config::BACKUP_INTERVAL_DAYS, clamped)?;
        Ok(clamped)
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Totals and top expense categories for one calendar month.
    pub fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport, CoreError> {
        self.report_service.monthly_report(&self.store, year, month)
    }

    /// Transactions matching `filter` as `;`-separated CSV, newest first.
    pub fn export_csv(&self, filter: &TransactionFilter) -> Result<String, CoreError> {
        let transactions = self.store.filter(filter);
        self.report_service.export_csv(&transactions)
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    #[must_use]
    pub fn backup_manager(&self) -> &BackupManager {
        &self.backups
    }

    // ── Internal ────────────────────────────────────────────────────

    fn refresh_suggestions(&mut self) {
        if self.config.suggestions_enabled() {
            self.engine.rebuild(self.store.transactions());
        }
    }

    /// Startup check: back up when enabled, the data file exists and the interval has elapsed.
    fn run_auto_backup(&self) {
        if !self.config.auto_backup() || !self.store.path().is_file() {
            return;
        }
        if !self.is_backup_due() {
            return;
        }
        if let Err(e) = self.backups.create_backup() {
            warn!("Automatic backup failed: {e}");
        }
    }
}
