use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spending category vocabulary. The serde renames are the canonical display
/// strings and the strings exchanged with the remote categorization provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Dining,
    Groceries,
    Gas,
    Travel,
    Entertainment,
    Shopping,
    Healthcare,
    Transportation,
    Subscriptions,
    #[serde(rename = "Home & Garden")]
    HomeGarden,
    #[serde(rename = "Bills & Utilities")]
    BillsUtilities,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Other,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Dining,
        Category::Groceries,
        Category::Gas,
        Category::Travel,
        Category::Entertainment,
        Category::Shopping,
        Category::Healthcare,
        Category::Transportation,
        Category::Subscriptions,
        Category::HomeGarden,
        Category::BillsUtilities,
        Category::PersonalCare,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dining => "Dining",
            Category::Groceries => "Groceries",
            Category::Gas => "Gas",
            Category::Travel => "Travel",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Healthcare => "Healthcare",
            Category::Transportation => "Transportation",
            Category::Subscriptions => "Subscriptions",
            Category::HomeGarden => "Home & Garden",
            Category::BillsUtilities => "Bills & Utilities",
            Category::PersonalCare => "Personal Care",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive parse. Unknown strings (e.g. a remote model inventing
    /// a category) collapse to `Other` rather than failing the pipeline.
    pub fn parse_lossy(s: &str) -> Category {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .unwrap_or(Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orthogonal to category: what kind of money movement this row is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Purchase,
    Transfer,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Income => "income",
        }
    }

    pub fn parse_lossy(s: &str) -> TransactionKind {
        match s.trim().to_ascii_lowercase().as_str() {
            "transfer" => TransactionKind::Transfer,
            "income" => TransactionKind::Income,
            _ => TransactionKind::Purchase,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single statement row as produced by a parser: sign-stripped amount,
/// provisional kind from description heuristics, sniffed currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    /// Absolute magnitude; direction is carried by `kind`.
    pub amount: Decimal,
    pub raw_description: String,
    pub kind: Option<TransactionKind>,
    /// ISO 4217 code when one could be sniffed from the statement text.
    pub currency: Option<String>,
}

/// Resolved categorization for one merchant, whichever stage produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Categorization {
    pub category: Category,
    #[serde(rename = "transactionType")]
    pub kind: TransactionKind,
    pub confidence: f64,
}

impl Categorization {
    /// The defined degradation value for every remote failure mode.
    pub fn fallback() -> Categorization {
        Categorization {
            category: Category::Other,
            kind: TransactionKind::Purchase,
            confidence: 0.0,
        }
    }
}

/// Merchant-cache row: last-known categorization keyed by normalized merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub merchant: String,
    pub category: Category,
    pub kind: TransactionKind,
    pub last_updated: String,
}

/// Fully resolved, persistable transaction record.
///
/// Invariant at write time: `usd_amount == original_amount * exchange_rate`
/// (rounded to cents). Manual edits recompute the triple atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub merchant: String,
    /// Display amount, always in the base currency. Equal to `usd_amount`.
    pub amount: Decimal,
    pub category: Category,
    pub kind: TransactionKind,
    pub raw_description: Option<String>,
    pub original_currency: String,
    pub original_amount: Decimal,
    pub exchange_rate: f64,
    pub usd_amount: Decimal,
    /// Set when conversion degraded (both rate sources failed) and the
    /// amount is carried unconverted. Never silently absorbed.
    pub conversion_note: Option<String>,
    pub created_at: Option<String>,
}
