use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign class of a transaction. The stored amount is always positive;
/// the kind decides whether it adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money coming in
    #[serde(rename = "receita")]
    Income,
    /// Money going out
    #[serde(rename = "despesa")]
    Expense,
}

impl TransactionKind {
    /// The label used in the data file (`receita` / `despesa`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "receita",
            TransactionKind::Expense => "despesa",
        }
    }

    /// Human-readable label used in exports.
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Receita",
            TransactionKind::Expense => "Despesa",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of transaction categories.
///
/// Each category belongs to exactly one [`TransactionKind`]; the income and
/// expense groups are disjoint. Serialized by its exact display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    // ── Income ──────────────────────────────────────────────────────
    #[serde(rename = "Salário")]
    Salary,
    #[serde(rename = "Freelance")]
    Freelance,
    #[serde(rename = "Investimentos")]
    Investments,
    #[serde(rename = "Vendas")]
    Sales,
    #[serde(rename = "Bônus")]
    Bonus,
    #[serde(rename = "Outros (Receita)")]
    OtherIncome,

    // ── Expense ─────────────────────────────────────────────────────
    #[serde(rename = "Alimentação")]
    Food,
    #[serde(rename = "Transporte")]
    Transport,
    #[serde(rename = "Moradia")]
    Housing,
    #[serde(rename = "Saúde")]
    Health,
    #[serde(rename = "Educação")]
    Education,
    #[serde(rename = "Entretenimento")]
    Entertainment,
    #[serde(rename = "Compras")]
    Shopping,
    #[serde(rename = "Contas")]
    Bills,
    #[serde(rename = "Vestuário")]
    Clothing,
    #[serde(rename = "Tecnologia")]
    Technology,
    #[serde(rename = "Outros (Despesa)")]
    OtherExpense,
}

impl Category {
    /// Every category, income group first, in declaration order.
    pub const ALL: [Category; 17] = [
        Category::Salary,
        Category::Freelance,
        Category::Investments,
        Category::Sales,
        Category::Bonus,
        Category::OtherIncome,
        Category::Food,
        Category::Transport,
        Category::Housing,
        Category::Health,
        Category::Education,
        Category::Entertainment,
        Category::Shopping,
        Category::Bills,
        Category::Clothing,
        Category::Technology,
        Category::OtherExpense,
    ];

    /// The kind this category is compatible with.
    pub fn kind(&self) -> TransactionKind {
        match self {
            Category::Salary
            | Category::Freelance
            | Category::Investments
            | Category::Sales
            | Category::Bonus
            | Category::OtherIncome => TransactionKind::Income,
            _ => TransactionKind::Expense,
        }
    }

    pub fn is_compatible_with(&self, kind: TransactionKind) -> bool {
        self.kind() == kind
    }

    /// Categories that may be used with `kind`, in declaration order.
    pub fn for_kind(kind: TransactionKind) -> Vec<Category> {
        Self::ALL
            .iter()
            .copied()
            .filter(|c| c.is_compatible_with(kind))
            .collect()
    }

    /// The exact label stored in the data file.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Salary => "Salário",
            Category::Freelance => "Freelance",
            Category::Investments => "Investimentos",
            Category::Sales => "Vendas",
            Category::Bonus => "Bônus",
            Category::OtherIncome => "Outros (Receita)",
            Category::Food => "Alimentação",
            Category::Transport => "Transporte",
            Category::Housing => "Moradia",
            Category::Health => "Saúde",
            Category::Education => "Educação",
            Category::Entertainment => "Entretenimento",
            Category::Shopping => "Compras",
            Category::Bills => "Contas",
            Category::Clothing => "Vestuário",
            Category::Technology => "Tecnologia",
            Category::OtherExpense => "Outros (Despesa)",
        }
    }

    /// Look up a category by its exact label.
    pub fn from_label(label: &str) -> Option<Category> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single income or expense entry.
///
/// Transactions are never edited in place: an update is a remove followed by an add,
/// so `id` stays stable for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque unique identifier (UUID v4 for new records)
    pub id: String,

    /// Free-text description as typed by the user
    pub description: String,

    /// Always positive; the sign is carried by `kind`
    pub amount: f64,

    /// Income or expense
    #[serde(rename = "transaction_type")]
    pub kind: TransactionKind,

    pub category: Category,

    /// Moment the transaction happened (local time, no offset)
    #[serde(rename = "date")]
    pub occurred_at: NaiveDateTime,

    #[serde(default)]
    pub notes: Option<String>,
}

impl Transaction {
    /// Build a record with a freshly generated id. No validation happens here;
    /// `TransactionStore::add` is the validating entry point.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        category: Category,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            amount,
            kind,
            category,
            occurred_at,
            notes: None,
        }
    }

    /// Signed contribution to the balance.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Criteria for narrowing a transaction listing. Every field is optional;
/// an empty filter matches everything. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub kind: Option<TransactionKind>,
    pub category: Option<Category>,
}

impl TransactionFilter {
    pub fn between(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.start.map_or(true, |s| t.occurred_at >= s)
            && self.end.map_or(true, |e| t.occurred_at <= e)
            && self.kind.map_or(true, |k| t.kind == k)
            && self.category.map_or(true, |c| t.category == c)
    }
}
