use std::sync::LazyLock;

use regex::Regex;

use crate::{row_to_transaction, ParseOutcome, StatementFormat};

// Ledger grammar: date, description, amount, running balance. Tried first
// so the balance column is never mistaken for the amount.
static LEDGER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})\s+(.+?)\s+(-?[\d,]+\.?\d{0,2})\s+([\d,]+\.\d{2})\s*$")
        .unwrap()
});

// Simple grammar: date, description, amount.
static SIMPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})\s+(.+?)\s+(-?[\d,]+\.\d{2})\s*$").unwrap()
});

/// Parse a plain-text statement line by line. Unmatched lines are skipped,
/// so headers, footers and summary text fall out naturally.
pub fn parse(bytes: &[u8]) -> ParseOutcome {
    let text = String::from_utf8_lossy(bytes);

    let mut transactions = Vec::new();
    for line in text.lines() {
        let lower = line.to_lowercase();
        if lower.contains("beginning balance")
            || lower.contains("ending balance")
            || (lower.contains("date") && lower.contains("description"))
        {
            continue;
        }

        let Some(caps) = LEDGER_LINE
            .captures(line)
            .or_else(|| SIMPLE_LINE.captures(line))
        else {
            continue;
        };

        if let Some(mut tx) = row_to_transaction(&caps[1], caps[2].trim(), &caps[3]) {
            tx.raw_description = line.trim().to_string();
            transactions.push(tx);
        }
    }

    ParseOutcome {
        transactions,
        headers: None,
        format: StatementFormat::Text,
    }
}
