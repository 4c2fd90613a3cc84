use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::transaction::Category;

/// A frequently entered transaction, ready to pre-fill a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularTransaction {
    /// Title-cased description
    pub description: String,
    pub category: Option<Category>,
    pub amount: Option<f64>,
    /// How many times the description was recorded for this kind
    pub frequency: usize,
}

/// Size counters of the suggestion index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionStats {
    /// Distinct descriptions summed over both kinds
    pub total_descriptions: usize,
    /// Distinct descriptions regardless of kind
    pub unique_descriptions: usize,
    pub keywords_learned: usize,
    /// Keywords carrying at least one category vote
    pub category_pattern_count: usize,
    pub last_build_time: Option<NaiveDateTime>,
}
