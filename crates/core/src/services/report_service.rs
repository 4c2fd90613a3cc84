use chrono::{Months, NaiveDate, NaiveDateTime};

use crate::errors::CoreError;
use crate::models::summary::{Balance, CategoryShare, MonthlyReport};
use crate::models::transaction::{Transaction, TransactionKind};
use crate::services::transaction_store::TransactionStore;

/// Number of expense categories listed in a monthly report.
pub const TOP_CATEGORIES: usize = 5;

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 6] = [
    "Data",
    "Descrição",
    "Tipo",
    "Categoria",
    "Valor",
    "Observações",
];

/// Read-only reports over a [`TransactionStore`]: monthly summaries and CSV export.
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Summarize a calendar month (`month` is 1–12).
    pub fn monthly_report(
        &self,
        store: &TransactionStore,
        year: i32,
        month: u32,
    ) -> Result<MonthlyReport, CoreError> {
        let (start, next) = month_bounds(year, month)?;
        let transactions: Vec<&Transaction> = store
            .list(Some(start), None)
            .into_iter()
            .filter(|t| t.occurred_at < next)
            .collect();

        let mut income = 0.0;
        let mut expense = 0.0;
        for t in &transactions {
            match t.kind {
                TransactionKind::Income => income += t.amount,
                TransactionKind::Expense => expense += t.amount,
            }
        }
        let balance = Balance::new(income, expense);
        let average_ticket = (income + expense) / transactions.len().max(1) as f64;

        let mut by_category: Vec<CategoryShare> = Vec::new();
        for t in transactions.iter().filter(|t| t.kind == TransactionKind::Expense) {
            match by_category.iter_mut().find(|s| s.category == t.category) {
                Some(share) => share.total += t.amount,
                None => by_category.push(CategoryShare {
                    category: t.category,
                    total: t.amount,
                    percentage: 0.0,
                }),
            }
        }
        by_category.sort_by(|a, b| b.total.total_cmp(&a.total));
        by_category.truncate(TOP_CATEGORIES);
        for share in &mut by_category {
            share.percentage = if expense > 0.0 {
                share.total / expense * 100.0
            } else {
                0.0
            };
        }

        Ok(MonthlyReport {
            year,
            month,
            transaction_count: transactions.len(),
            balance,
            average_ticket,
            top_expense_categories: by_category,
        })
    }

    /// Render transactions as `;`-separated CSV with a header row.
    ///
    /// Dates are written as `dd/mm/YYYY` and amounts with a decimal comma.
    pub fn export_csv(&self, transactions: &[&Transaction]) -> Result<String, CoreError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER)?;
        for t in transactions {
            writer.write_record([
                t.occurred_at.format("%d/%m/%Y").to_string(),
                t.description.clone(),
                t.kind.display_name().to_string(),
                t.category.label().to_string(),
                format!("{:.2}", t.amount).replace('.', ","),
                t.notes.clone().unwrap_or_default(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
    }
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}

/// First instant of the month and first instant of the following month.
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime), CoreError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::InvalidPeriod(format!("month {month:02}/{year}")))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| CoreError::InvalidPeriod(format!("month {month:02}/{year} out of range")))?;
    Ok((
        first.and_time(chrono::NaiveTime::MIN),
        next.and_time(chrono::NaiveTime::MIN),
    ))
}
