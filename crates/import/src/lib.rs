//! Statement ingestion: turns uploaded bank and card statements in their
//! various formats into [`ParsedTransaction`] rows ready for the pipeline.

pub mod columns;
pub mod delimited;
pub mod kind;
pub mod sheet;
pub mod statement_pdf;
pub mod textline;
pub mod util;

use std::path::Path;

use centime_core::ParsedTransaction;
use serde::Serialize;
use thiserror::Error;

pub use columns::{detect_column_mapping, ColumnMapping};
pub use kind::{detect_transaction_kind, sniff_currency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Delimited,
    Spreadsheet,
    Text,
    Document,
}

/// Result of parsing one statement. `headers` is set only when a tabular
/// statement's date/merchant/amount columns could not be resolved, so a
/// caller can offer a manual mapping; a mapped statement whose rows were
/// all dropped is an ordinary zero-row outcome.
#[derive(Debug)]
pub struct ParseOutcome {
    pub transactions: Vec<ParsedTransaction>,
    pub headers: Option<Vec<String>>,
    pub format: StatementFormat,
}

impl ParseOutcome {
    /// True when the statement had recognizable structure but the
    /// date/merchant/amount columns could not be resolved.
    pub fn needs_mapping(&self) -> bool {
        self.headers.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported statement format: .{0}")]
    UnsupportedFormat(String),
    #[error("malformed delimited statement: {0}")]
    Delimited(#[from] csv::Error),
    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("spreadsheet has no rows")]
    EmptySpreadsheet,
}

/// Parse a statement, dispatching on the file extension. `mapping`
/// overrides column auto-detection for tabular formats.
pub fn parse_statement(
    bytes: &[u8],
    filename: &str,
    mapping: Option<&ColumnMapping>,
) -> Result<ParseOutcome, ParseError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => delimited::parse(bytes, mapping),
        "xlsx" | "xls" => sheet::parse(bytes, mapping),
        "txt" => Ok(textline::parse(bytes)),
        "pdf" => Ok(statement_pdf::parse(bytes, filename)),
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}

/// Assemble one transaction from raw field text. Rows with an empty
/// merchant, an unparseable or zero amount, or an unparseable date are
/// dropped rather than failing the whole statement.
pub(crate) fn row_to_transaction(
    date_text: &str,
    merchant_text: &str,
    amount_text: &str,
) -> Option<ParsedTransaction> {
    let merchant = merchant_text.trim();
    if merchant.is_empty() {
        return None;
    }

    let amount = util::parse_statement_amount(amount_text)?;
    if amount.is_zero() {
        return None;
    }
    let date = util::parse_flexible_date(date_text)?;

    Some(ParsedTransaction {
        date,
        merchant: merchant.to_string(),
        amount,
        raw_description: merchant.to_string(),
        kind: Some(kind::detect_transaction_kind(merchant)),
        currency: Some(kind::sniff_currency(amount_text, merchant)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse_statement(b"whatever", "statement.docx", None).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(ext) if ext == "docx"));
    }

    #[test]
    fn extension_is_case_insensitive() {
        let csv = b"Date,Description,Amount\n2024-01-15,KROGER,12.00\n";
        let outcome = parse_statement(csv, "Statement.CSV", None).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
    }

    #[test]
    fn zero_and_invalid_rows_are_dropped() {
        assert!(row_to_transaction("2024-01-15", "KROGER", "0.00").is_none());
        assert!(row_to_transaction("2024-01-15", "", "5.00").is_none());
        assert!(row_to_transaction("someday", "KROGER", "5.00").is_none());
        assert!(row_to_transaction("2024-01-15", "KROGER", "pending").is_none());
    }
}
