use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::summary::{Balance, CategorySummary};
use crate::models::transaction::{Category, Transaction, TransactionFilter, TransactionKind};
use crate::storage::format::{self, DataFile};
use crate::storage::manager::StorageManager;

/// Outcome of reading the data file. Never an error: every case leaves the
/// store in a usable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// File parsed; holds the number of transactions read
    Loaded(usize),
    /// No data file yet; the store is empty
    Missing,
    /// File could not be read or parsed; the store is empty
    Corrupt(String),
}

/// Authoritative in-memory list of transactions, backed by one JSON file.
///
/// Every mutation writes the whole file. A failed write does not undo the
/// mutation: the in-memory list stays authoritative and
/// [`has_unsaved_changes`](Self::has_unsaved_changes) reports the lost durability.
#[derive(Debug)]
pub struct TransactionStore {
    path: PathBuf,
    transactions: Vec<Transaction>,
    /// Set when the in-memory list differs from what was last written.
    dirty: bool,
}

impl TransactionStore {
    /// An empty store bound to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            transactions: Vec::new(),
            dirty: false,
        }
    }

    /// A store bound to `path`, populated from the file if present.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.reload();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Validate and append a new transaction, then persist.
    ///
    /// Rejects an empty description, a non-positive (or non-finite) amount, and a
    /// category that does not belong to `kind`. `occurred_at` defaults to now.
    pub fn add(
        &mut self,
        description: &str,
        amount: f64,
        kind: TransactionKind,
        category: Category,
        occurred_at: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> Result<Transaction, CoreError> {
        validate(description, amount, kind, category)?;

        let mut transaction = Transaction::new(
            description,
            amount.abs(),
            kind,
            category,
            occurred_at.unwrap_or_else(format::now),
        );
        transaction.notes = notes.filter(|n| !n.trim().is_empty());

        debug!(id = %transaction.id, "Adding transaction");
        self.transactions.push(transaction.clone());
        self.dirty = true;
        self.persist_soft();
        Ok(transaction)
    }

    /// Remove the transaction with `id`. Returns `false` (and changes nothing)
    /// when no such transaction exists.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(idx) = self.transactions.iter().position(|t| t.id == id) else {
            return false;
        };
        self.transactions.remove(idx);
        self.dirty = true;
        self.persist_soft();
        true
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions within the inclusive range, newest first.
    /// Equal timestamps keep their insertion order.
    pub fn list(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Vec<&Transaction> {
        self.filter(&TransactionFilter::between(start, end))
    }

    /// Transactions matching `filter`, newest first (stable on ties).
    pub fn filter(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut matched: Vec<&Transaction> =
            self.transactions.iter().filter(|t| filter.matches(t)).collect();
        matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        matched
    }

    /// Income, expense and net totals within the inclusive range.
    pub fn balance(&self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Balance {
        let (income, expense) = self.list(start, end).into_iter().fold(
            (0.0, 0.0),
            |(income, expense), t| match t.kind {
                TransactionKind::Income => (income + t.amount, expense),
                TransactionKind::Expense => (income, expense + t.amount),
            },
        );
        Balance::new(income, expense)
    }

    /// Per-category totals within the inclusive range.
    pub fn category_summary(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> CategorySummary {
        let mut summary = CategorySummary::default();
        for t in self.list(start, end) {
            let bucket = match t.kind {
                TransactionKind::Income => &mut summary.income,
                TransactionKind::Expense => &mut summary.expense,
            };
            *bucket.entry(t.category).or_insert(0.0) += t.amount;
        }
        summary
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Write all transactions to the data file.
    /// Clears the unsaved-changes flag on success.
    pub fn persist(&mut self) -> Result<(), CoreError> {
        let data = DataFile::new(self.transactions.clone());
        StorageManager::save_to_file(&data, &self.path)?;
        self.dirty = false;
        debug!(count = self.transactions.len(), path = %self.path.display(), "Data file saved");
        Ok(())
    }

    /// Replace the in-memory list with the data file's contents.
    ///
    /// A missing file gives an empty store. A corrupt file also gives an empty
    /// store and logs a warning; nothing is propagated. A file holding any record
    /// that [`add`](Self::add) would reject, or a repeated id, counts as corrupt.
    pub fn reload(&mut self) -> LoadStatus {
        self.dirty = false;
        match StorageManager::load_from_file(&self.path) {
            Ok(Some(data)) => {
                if let Err(e) = check_loaded(&data.transactions) {
                    self.transactions.clear();
                    warn!("Data file rejected, starting empty: {e}");
                    return LoadStatus::Corrupt(e.to_string());
                }
                self.transactions = data.transactions;
                info!(
                    count = self.transactions.len(),
                    path = %self.path.display(),
                    "Data file loaded"
                );
                LoadStatus::Loaded(self.transactions.len())
            }
            Ok(None) => {
                self.transactions.clear();
                info!(path = %self.path.display(), "Data file not found, starting empty");
                LoadStatus::Missing
            }
            Err(e) => {
                self.transactions.clear();
                warn!("Data file unreadable, starting empty: {e}");
                LoadStatus::Corrupt(e.to_string())
            }
        }
    }

    /// Bind the store to a new data file and write the current list there.
    /// The old file is left in place.
    pub fn relocate(&mut self, path: impl Into<PathBuf>) -> Result<(), CoreError> {
        self.path = path.into();
        self.dirty = true;
        self.persist()
    }

    /// Returns `true` if the last mutation could not be written to disk.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn persist_soft(&mut self) {
        if let Err(e) = self.persist() {
            warn!("Changes kept in memory only: {e}");
        }
    }
}

/// Input rules for new transactions.
fn validate(
    description: &str,
    amount: f64,
    kind: TransactionKind,
    category: Category,
) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "Description must not be empty".into(),
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Amount must be a positive number, got {amount}"
        )));
    }
    if !category.is_compatible_with(kind) {
        return Err(CoreError::ValidationError(format!(
            "Category '{category}' cannot be used for {kind} transactions"
        )));
    }
    Ok(())
}

/// Records read from disk obey the same rules as new ones, and ids are unique.
fn check_loaded(transactions: &[Transaction]) -> Result<(), CoreError> {
    let mut ids = HashSet::new();
    for t in transactions {
        validate(&t.description, t.amount, t.kind, t.category)
            .map_err(|e| CoreError::Load(format!("Record '{}': {e}", t.id)))?;
        if !ids.insert(t.id.as_str()) {
            return Err(CoreError::Load(format!("Duplicate transaction id '{}'", t.id)));
        }
    }
    Ok(())
}
