use std::sync::LazyLock;

use centime_core::ParsedTransaction;
use chrono::{Datelike, Utc};
use regex::Regex;
use tracing::warn;

use crate::{row_to_transaction, ParseOutcome, StatementFormat};

// Year sources tried in order: statement date, closing date, billing
// period range. Transaction lines in card PDFs carry month/day only.
static YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)statement\s+date[:\s]+\d{1,2}/\d{1,2}/(\d{4})",
        r"(?i)closing\s+date[:\s]+\d{1,2}/\d{1,2}/(\d{4})",
        r"\d{1,2}/\d{1,2}/(\d{4})\s*-\s*\d{1,2}/\d{1,2}/\d{4}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static FILENAME_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(20\d{2})").unwrap());

static ACTIVITY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)account\s+activity").unwrap());
static TRANSACTIONS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*transactions\s*$").unwrap());

// One-line grammar: date, description, amount at end of line.
static INLINE_TXN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}/\d{1,2}(?:/\d{2,4})?)\s+(.+?)\s+(-?[\d,]+\.\d{2})\s*$").unwrap()
});

// Two-line grammar: transaction date, posting date, description, with the
// amount (and sometimes a currency code) on the following line.
static SPLIT_TXN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}/\d{1,2})\s+\d{1,2}/\d{1,2}\s+(.+)$").unwrap());
static AMOUNT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[\d,]+\.\d{2})(\s+[A-Z]{3})?\s*$").unwrap());
static TRAILING_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?[\d,]+\.\d{2})\s*$").unwrap());

static STARTS_WITH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Inline,
    Split,
}

/// Parse a PDF card statement. Extraction failures degrade to an empty
/// outcome rather than an error; scanned or image-only PDFs simply yield
/// nothing.
pub fn parse(bytes: &[u8], filename: &str) -> ParseOutcome {
    let text = match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, filename, "no extractable text in pdf statement");
            return ParseOutcome {
                transactions: Vec::new(),
                headers: None,
                format: StatementFormat::Document,
            };
        }
    };

    let year = statement_year(&text, filename);
    let (section, dialect) = locate_activity(&text);

    let transactions = match dialect {
        Dialect::Inline => parse_inline(section, year),
        Dialect::Split => parse_split(section, year),
    };

    ParseOutcome {
        transactions,
        headers: None,
        format: StatementFormat::Document,
    }
}

/// Recover the statement year: body patterns first, then a 20xx token in
/// the filename, then the current year.
fn statement_year(text: &str, filename: &str) -> i32 {
    let current = Utc::now().year();
    let plausible = |y: i32| (2000..=current + 1).contains(&y);

    for pattern in YEAR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(year) = caps[1].parse::<i32>() {
                if plausible(year) {
                    return year;
                }
            }
        }
    }
    if let Some(caps) = FILENAME_YEAR.captures(filename) {
        if let Ok(year) = caps[1].parse::<i32>() {
            if plausible(year) {
                return year;
            }
        }
    }
    current
}

/// Find the transaction section and pick the line grammar. An "Account
/// Activity" heading selects the inline grammar, a bare "Transactions"
/// heading the split one; with neither, the whole text is scanned inline.
fn locate_activity(text: &str) -> (&str, Dialect) {
    if let Some(m) = ACTIVITY_HEADING.find(text) {
        (&text[m.start()..], Dialect::Inline)
    } else if let Some(m) = TRANSACTIONS_HEADING.find(text) {
        (&text[m.start()..], Dialect::Split)
    } else {
        (text, Dialect::Inline)
    }
}

fn is_boilerplate(line: &str) -> bool {
    let upper = line.to_uppercase();
    let upper = upper.trim();

    if matches!(
        upper,
        "ACCOUNT ACTIVITY" | "TRANSACTIONS" | "TRANSACTIONS CONTINUED" | "PURCHASE"
    ) {
        return true;
    }
    if upper.contains("PURCHASES AND ADJUSTMENTS")
        || upper.contains("PAYMENTS AND OTHER CREDITS")
        || upper.contains("MERCHANT NAME")
        || upper.contains("CONTINUED ON NEXT PAGE")
    {
        return true;
    }

    let has_all = |words: &[&str]| words.iter().all(|w| upper.contains(w));
    if has_all(&["TRANSACTION", "POSTING", "DATE"])
        || has_all(&["DATE", "DESCRIPTION", "AMOUNT"])
        || has_all(&["REFERENCE", "NUMBER", "AMOUNT"])
    {
        return true;
    }
    if has_all(&["POSTING", "DATE"]) && !STARTS_WITH_DATE.is_match(line) {
        return true;
    }
    false
}

fn complete_date(date: &str, year: i32) -> String {
    if date.matches('/').count() == 1 {
        format!("{date}/{year}")
    } else {
        date.to_string()
    }
}

fn parse_inline(section: &str, year: i32) -> Vec<ParsedTransaction> {
    let mut out = Vec::new();
    for line in section.lines() {
        let line = line.trim();
        if line.is_empty() || is_boilerplate(line) {
            continue;
        }
        let Some(caps) = INLINE_TXN.captures(line) else { continue };

        let merchant = caps[2].trim();
        let upper = merchant.to_uppercase();
        if upper.contains("PAYMENT THANK YOU")
            || upper.contains("BALANCE")
            || upper.contains("TOTAL")
        {
            continue;
        }

        let date_text = complete_date(&caps[1], year);
        if let Some(mut tx) = row_to_transaction(&date_text, merchant, &caps[3]) {
            tx.raw_description = line.to_string();
            out.push(tx);
        }
    }
    out
}

fn parse_split(section: &str, year: i32) -> Vec<ParsedTransaction> {
    let lines: Vec<&str> = section.lines().map(str::trim).collect();
    let mut out = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if line.is_empty() || is_boilerplate(line) {
            continue;
        }
        let Some(caps) = SPLIT_TXN.captures(line) else { continue };

        let trans_date = caps[1].to_string();
        let rest = caps[2].trim().to_string();

        // amount either trails the description or sits on the next line
        let (merchant, amount_text) = if let Some(m) = TRAILING_AMOUNT.find(&rest) {
            (rest[..m.start()].trim().to_string(), rest[m.start()..].trim().to_string())
        } else if i < lines.len() && AMOUNT_LINE.is_match(lines[i]) {
            let amount = lines[i].to_string();
            i += 1;
            (rest.clone(), amount)
        } else {
            continue;
        };

        let date_text = format!("{trans_date}/{year}");
        if let Some(mut tx) = row_to_transaction(&date_text, &merchant, &amount_text) {
            tx.raw_description = line.to_string();
            out.push(tx);
        }
    }
    out
}
