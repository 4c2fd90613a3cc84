use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::transaction::Category;

/// Income/expense totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub income_total: f64,
    pub expense_total: f64,
    /// `income_total - expense_total`
    pub net: f64,
}

impl Balance {
    pub fn new(income_total: f64, expense_total: f64) -> Self {
        Self {
            income_total,
            expense_total,
            net: income_total - expense_total,
        }
    }
}

/// Per-category totals, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub income: BTreeMap<Category, f64>,
    pub expense: BTreeMap<Category, f64>,
}

/// One line of the "top expense categories" breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    pub total: f64,
    /// Share of the month's expense total, 0–100
    pub percentage: f64,
}

/// Summary of a single calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub transaction_count: usize,
    pub balance: Balance,
    /// Mean absolute amount per transaction (0 when the month is empty)
    pub average_ticket: f64,
    /// Largest expense categories, biggest first
    pub top_expense_categories: Vec<CategoryShare>,
}
