use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::models::suggestion::{PopularTransaction, SuggestionStats};
use crate::models::transaction::{Category, Transaction, TransactionKind};
use crate::storage::format;

/// At most this many keywords are taken from one description.
pub const MAX_KEYWORDS: usize = 4;

/// Tokens must be longer than this many characters to count as keywords.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Minimum keyword overlap for a stored description to contribute to an
/// amount estimate. Heuristic; tune freely.
pub const AMOUNT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Short connector words that never become keywords.
pub const STOP_WORDS: &[&str] = &[
    "com", "para", "por", "que", "uma", "dos", "das", "the", "and", "or", "mas", "ate", "sem",
    "sob", "sobre", "tras", "entre", "ante",
];

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static pattern is valid"));

/// Split a description into at most [`MAX_KEYWORDS`] keywords.
///
/// Lower-cases, replaces punctuation with spaces, drops tokens of
/// [`MIN_TOKEN_CHARS`] characters or fewer and drops [`STOP_WORDS`].
/// Order of appearance is kept.
pub fn extract_keywords(description: &str) -> Vec<String> {
    let lowered = description.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_TOKEN_CHARS)
        .filter(|w| !STOP_WORDS.contains(w))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Capitalize the first letter of every word and lower-case the rest.
/// A word starts after any non-alphabetic character.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Normalized form used as the key for descriptions.
fn normalize(description: &str) -> String {
    description.trim().to_lowercase()
}

// ═══════════════════════════════════════════════════════════════════
// Index
// ═══════════════════════════════════════════════════════════════════

/// Distinct descriptions of one kind, in first-seen order, with occurrence counts.
#[derive(Debug, Clone, Default, PartialEq)]
struct DescriptionHistory {
    entries: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl DescriptionHistory {
    fn record(&mut self, description: &str) {
        match self.positions.get(description) {
            Some(&idx) => self.entries[idx].1 += 1,
            None => {
                self.positions
                    .insert(description.to_string(), self.entries.len());
                self.entries.push((description.to_string(), 1));
            }
        }
    }

    /// Most frequent first; equal counts keep first-seen order.
    fn ranked(&self) -> Vec<&(String, usize)> {
        let mut ranked: Vec<&(String, usize)> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Amounts observed under one exact description.
#[derive(Debug, Clone, PartialEq)]
struct AmountHistory {
    keywords: HashSet<String>,
    amounts: Vec<f64>,
}

/// Everything the engine knows, derived from one snapshot of transactions.
///
/// Built from scratch by [`SuggestionIndex::build`]; never patched. Dropping it
/// and building again is always safe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionIndex {
    descriptions: HashMap<TransactionKind, DescriptionHistory>,
    /// keyword → (category, vote count), in first-vote order
    category_votes: HashMap<String, Vec<(Category, usize)>>,
    keyword_frequency: HashMap<String, usize>,
    /// exact description → amounts, in first-seen order
    amounts: Vec<(String, AmountHistory)>,
    amount_positions: HashMap<String, usize>,
    built_at: Option<NaiveDateTime>,
}

impl SuggestionIndex {
    /// Index `transactions` in order. The same list always yields the same index
    /// (apart from `built_at`).
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut index = Self::default();
        for t in transactions {
            index.learn(t);
        }
        index.built_at = Some(format::now());
        index
    }

    fn learn(&mut self, t: &Transaction) {
        let description = normalize(&t.description);

        self.descriptions
            .entry(t.kind)
            .or_default()
            .record(&description);

        let keywords = extract_keywords(&description);
        for keyword in &keywords {
            *self.keyword_frequency.entry(keyword.clone()).or_insert(0) += 1;
            let votes = self.category_votes.entry(keyword.clone()).or_default();
            match votes.iter_mut().find(|(c, _)| *c == t.category) {
                Some((_, n)) => *n += 1,
                None => votes.push((t.category, 1)),
            }
        }

        match self.amount_positions.get(&description) {
            Some(&idx) => self.amounts[idx].1.amounts.push(t.amount),
            None => {
                self.amount_positions
                    .insert(description.clone(), self.amounts.len());
                self.amounts.push((
                    description,
                    AmountHistory {
                        keywords: keywords.into_iter().collect(),
                        amounts: vec![t.amount],
                    },
                ));
            }
        }
    }

    pub fn built_at(&self) -> Option<NaiveDateTime> {
        self.built_at
    }

    fn history(&self, kind: TransactionKind) -> Option<&DescriptionHistory> {
        self.descriptions.get(&kind)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════

/// Proposes descriptions, categories and amounts learned from transaction history.
///
/// Holds no state of its own beyond the current [`SuggestionIndex`]; call
/// [`rebuild`](Self::rebuild) after every change to the transaction list.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    index: SuggestionIndex,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current index and build a new one from `transactions`.
    pub fn rebuild(&mut self, transactions: &[Transaction]) {
        self.index = SuggestionIndex::build(transactions);
        debug!(
            transactions = transactions.len(),
            keywords = self.index.keyword_frequency.len(),
            "Suggestion index rebuilt"
        );
    }

    /// Drop everything learned. `last_build_time` becomes `None`.
    pub fn clear(&mut self) {
        self.index = SuggestionIndex::default();
    }

    pub fn index(&self) -> &SuggestionIndex {
        &self.index
    }

    /// Descriptions of `kind` matching `partial_text`, title-cased, without duplicates.
    ///
    /// Empty input returns the most frequent descriptions. Otherwise prefix matches
    /// come first, then descriptions merely containing the text, each group in
    /// first-seen order.
    pub fn suggest_descriptions(
        &self,
        partial_text: &str,
        kind: TransactionKind,
        limit: usize,
    ) -> Vec<String> {
        let Some(history) = self.index.history(kind) else {
            return Vec::new();
        };

        if partial_text.is_empty() {
            return history
                .ranked()
                .into_iter()
                .take(limit)
                .map(|(d, _)| title_case(d))
                .collect();
        }

        let needle = partial_text.to_lowercase();
        let prefixed = history
            .entries
            .iter()
            .filter(|(d, _)| d.starts_with(&needle));
        let contained = history
            .entries
            .iter()
            .filter(|(d, _)| !d.starts_with(&needle) && d.contains(&needle));

        let mut seen = HashSet::new();
        prefixed
            .chain(contained)
            .map(|(d, _)| title_case(d))
            .filter(|d| seen.insert(d.clone()))
            .take(limit)
            .collect()
    }

    /// Category with the highest keyword-weighted vote among those compatible with `kind`.
    ///
    /// Each vote a category received for a keyword counts with that keyword's global
    /// frequency as weight. Ties go to the category accumulated first.
    pub fn suggest_category(&self, description: &str, kind: TransactionKind) -> Option<Category> {
        let mut scores: Vec<(Category, usize)> = Vec::new();

        for keyword in extract_keywords(description) {
            let Some(votes) = self.index.category_votes.get(&keyword) else {
                continue;
            };
            let weight = self
                .index
                .keyword_frequency
                .get(&keyword)
                .copied()
                .unwrap_or(1);
            for (category, count) in votes {
                if !category.is_compatible_with(kind) {
                    continue;
                }
                let score = count * weight;
                match scores.iter_mut().find(|(c, _)| c == category) {
                    Some((_, total)) => *total += score,
                    None => scores.push((*category, score)),
                }
            }
        }

        let mut best: Option<(Category, usize)> = None;
        for (category, score) in scores {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((category, score));
            }
        }
        best.map(|(category, _)| category)
    }

    /// Typical amount for `description`.
    ///
    /// An exact (case-insensitive) match returns the mean of its amounts. Otherwise
    /// the amounts of every stored description whose keyword overlap exceeds
    /// [`AMOUNT_SIMILARITY_THRESHOLD`] are pooled and averaged.
    pub fn suggest_amount(&self, description: &str) -> Option<f64> {
        let key = normalize(description);
        if let Some(&idx) = self.index.amount_positions.get(&key) {
            return mean(&self.index.amounts[idx].1.amounts);
        }

        let query: HashSet<String> = extract_keywords(&key).into_iter().collect();
        if query.is_empty() {
            return None;
        }

        let mut pool: Vec<f64> = Vec::new();
        for (_, history) in &self.index.amounts {
            let common = query.intersection(&history.keywords).count();
            if common == 0 {
                continue;
            }
            let similarity = common as f64 / query.len().max(history.keywords.len()) as f64;
            if similarity > AMOUNT_SIMILARITY_THRESHOLD {
                pool.extend_from_slice(&history.amounts);
            }
        }
        mean(&pool)
    }

    /// The `limit` most frequent descriptions of `kind` with their suggested
    /// category and amount.
    pub fn popular(&self, kind: TransactionKind, limit: usize) -> Vec<PopularTransaction> {
        let Some(history) = self.index.history(kind) else {
            return Vec::new();
        };
        history
            .ranked()
            .into_iter()
            .take(limit)
            .map(|(description, frequency)| PopularTransaction {
                description: title_case(description),
                category: self.suggest_category(description, kind),
                amount: self.suggest_amount(description),
                frequency: *frequency,
            })
            .collect()
    }

    pub fn statistics(&self) -> SuggestionStats {
        let total_descriptions = self
            .index
            .descriptions
            .values()
            .map(|h| h.entries.len())
            .sum();
        let unique_descriptions = self
            .index
            .descriptions
            .values()
            .flat_map(|h| h.entries.iter().map(|(d, _)| d.as_str()))
            .collect::<HashSet<_>>()
            .len();

        SuggestionStats {
            total_descriptions,
            unique_descriptions,
            keywords_learned: self.index.keyword_frequency.len(),
            category_pattern_count: self.index.category_votes.len(),
            last_build_time: self.index.built_at,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
