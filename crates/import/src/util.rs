use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

static ISO_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{3}").unwrap());

/// Parse a statement amount field into its absolute magnitude.
///
/// Strips currency symbols and embedded ISO codes ("1,234.56 SEK"),
/// thousands separators, and accounting parentheses. Returns `None` for
/// text that is not a number; sign is discarded, direction is inferred
/// elsewhere.
pub fn parse_statement_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let s = if s.starts_with('(') && s.ends_with(')') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    let stripped = ISO_CODE.replace_all(s, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₹' | ',' | ' '))
        .collect();

    Decimal::from_str(&cleaned).ok().map(|d| d.abs())
}

/// Parse a date, trying the usual statement formats in order. US
/// month-first forms come before day-first, matching the source banks.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in &[
        "%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_statement_amount ────────────────────────────────────────────────

    #[test]
    fn plain_amount() {
        assert_eq!(parse_statement_amount("123.45"), Some(Decimal::new(12345, 2)));
    }

    #[test]
    fn dollar_sign_and_commas() {
        assert_eq!(parse_statement_amount("$1,234.56"), Some(Decimal::new(123456, 2)));
    }

    #[test]
    fn sign_is_stripped() {
        assert_eq!(parse_statement_amount("-6.75"), Some(Decimal::new(675, 2)));
        assert_eq!(parse_statement_amount("(75.25)"), Some(Decimal::new(7525, 2)));
    }

    #[test]
    fn embedded_iso_code() {
        assert_eq!(parse_statement_amount("209.90 SEK"), Some(Decimal::new(20990, 2)));
        assert_eq!(parse_statement_amount("USD 12.00"), Some(Decimal::new(1200, 2)));
    }

    #[test]
    fn unicode_currency_symbols() {
        assert_eq!(parse_statement_amount("€99.99"), Some(Decimal::new(9999, 2)));
        assert_eq!(parse_statement_amount("₹1,000"), Some(Decimal::from(1000)));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_statement_amount("pending"), None);
        assert_eq!(parse_statement_amount(""), None);
    }

    // ── parse_flexible_date ───────────────────────────────────────────────────

    #[test]
    fn iso_date() {
        assert_eq!(
            parse_flexible_date("2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn us_slash_date() {
        assert_eq!(
            parse_flexible_date("01/15/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            parse_flexible_date("1/5/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn two_digit_year() {
        assert_eq!(
            parse_flexible_date("01/15/24"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn invalid_date_is_none() {
        assert_eq!(parse_flexible_date("not-a-date"), None);
        assert_eq!(parse_flexible_date("13/45/2024"), None);
    }
}
