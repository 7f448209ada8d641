use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Header names selected for the date, merchant and amount columns of a
/// tabular statement. Built by auto-detection or supplied by the caller
/// when detection comes up short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub merchant: String,
    pub amount: String,
}

static DATE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)date|posted|trans.*date").unwrap());
static MERCHANT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)description|merchant|vendor|payee|memo").unwrap());
static BALANCE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)balance|running|bal\.|bal$").unwrap());
static AMOUNT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(amount|debit|credit|total|amt)$").unwrap());

/// Guess the date/merchant/amount columns from header names. First matching
/// header wins per role. Running-balance columns are never taken for the
/// amount, and the amount match is anchored so "Amount in EUR" style headers
/// do not qualify. Returns `None` unless all three roles resolve.
pub fn detect_column_mapping(headers: &[String]) -> Option<ColumnMapping> {
    let date = headers.iter().find(|h| DATE_HEADER.is_match(h.trim()))?;
    let merchant = headers.iter().find(|h| MERCHANT_HEADER.is_match(h.trim()))?;
    let amount = headers.iter().find(|h| {
        let h = h.trim();
        !BALANCE_HEADER.is_match(h) && AMOUNT_HEADER.is_match(h)
    })?;

    Some(ColumnMapping {
        date: date.clone(),
        merchant: merchant.clone(),
        amount: amount.clone(),
    })
}
