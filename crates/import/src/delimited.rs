use crate::columns::{detect_column_mapping, ColumnMapping};
use crate::{row_to_transaction, ParseError, ParseOutcome, StatementFormat};

/// Parse a CSV statement. With no usable column mapping the headers are
/// returned alone so the caller can ask for a manual mapping. Individual
/// bad rows are skipped, never failing the statement.
pub fn parse(bytes: &[u8], manual: Option<&ColumnMapping>) -> Result<ParseOutcome, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mapping = manual.cloned().or_else(|| detect_column_mapping(&headers));
    let Some(indices) = mapping.as_ref().and_then(|m| resolve_indices(&headers, m)) else {
        return Ok(ParseOutcome {
            transactions: Vec::new(),
            headers: Some(headers),
            format: StatementFormat::Delimited,
        });
    };
    let (date_idx, merchant_idx, amount_idx) = indices;

    let mut transactions = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let (Some(date), Some(merchant), Some(amount)) = (
            record.get(date_idx),
            record.get(merchant_idx),
            record.get(amount_idx),
        ) else {
            continue;
        };
        if let Some(tx) = row_to_transaction(date, merchant, amount) {
            transactions.push(tx);
        }
    }

    Ok(ParseOutcome {
        transactions,
        headers: None,
        format: StatementFormat::Delimited,
    })
}

fn resolve_indices(headers: &[String], mapping: &ColumnMapping) -> Option<(usize, usize, usize)> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    };
    Some((
        find(&mapping.date)?,
        find(&mapping.merchant)?,
        find(&mapping.amount)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use centime_core::TransactionKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn parses_standard_statement() {
        let csv = b"Date,Description,Amount\n\
            2024-01-15,KROGER #1234,45.67\n\
            2024-01-16,STARBUCKS STORE 5678,-6.75\n";
        let outcome = parse(csv, None).unwrap();
        assert_eq!(outcome.transactions.len(), 2);
        assert!(!outcome.needs_mapping());

        let first = &outcome.transactions[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.merchant, "KROGER #1234");
        assert_eq!(first.amount, Decimal::new(4567, 2));
        assert_eq!(first.currency.as_deref(), Some("USD"));

        // sign is discarded on import
        assert_eq!(outcome.transactions[1].amount, Decimal::new(675, 2));
    }

    #[test]
    fn unknown_headers_request_mapping() {
        let csv = b"When,Who,How Much\n2024-01-15,KROGER,45.67\n";
        let outcome = parse(csv, None).unwrap();
        assert!(outcome.needs_mapping());
        assert_eq!(
            outcome.headers.as_deref(),
            Some(&["When".to_string(), "Who".to_string(), "How Much".to_string()][..])
        );
    }

    #[test]
    fn manual_mapping_overrides_detection() {
        let csv = b"When,Who,How Much\n2024-01-15,KROGER,45.67\n";
        let mapping = ColumnMapping {
            date: "When".to_string(),
            merchant: "Who".to_string(),
            amount: "How Much".to_string(),
        };
        let outcome = parse(csv, Some(&mapping)).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].merchant, "KROGER");
    }

    #[test]
    fn manual_mapping_with_missing_column_requests_mapping() {
        let csv = b"When,Who,How Much\n2024-01-15,KROGER,45.67\n";
        let mapping = ColumnMapping {
            date: "Nope".to_string(),
            merchant: "Who".to_string(),
            amount: "How Much".to_string(),
        };
        let outcome = parse(csv, Some(&mapping)).unwrap();
        assert!(outcome.needs_mapping());
    }

    #[test]
    fn mapped_but_empty_statement_is_not_a_mapping_request() {
        // columns resolved fine, the rows were just all droppable
        let csv = b"Date,Description,Amount\n2024-01-15,FREE SAMPLE,0.00\n";
        let outcome = parse(csv, None).unwrap();
        assert!(outcome.transactions.is_empty());
        assert!(!outcome.needs_mapping());
        assert!(outcome.headers.is_none());
    }

    #[test]
    fn manually_mapped_empty_statement_is_not_a_mapping_request() {
        let csv = b"When,Who,How Much\n2024-01-15,FREE SAMPLE,0.00\n";
        let mapping = ColumnMapping {
            date: "When".to_string(),
            merchant: "Who".to_string(),
            amount: "How Much".to_string(),
        };
        let outcome = parse(csv, Some(&mapping)).unwrap();
        assert!(outcome.transactions.is_empty());
        assert!(!outcome.needs_mapping());
    }

    #[test]
    fn bad_rows_are_skipped() {
        let csv = b"Date,Description,Amount\n\
            2024-01-15,KROGER,45.67\n\
            not-a-date,BAD ROW,1.00\n\
            2024-01-17,FREE SAMPLE,0.00\n\
            2024-01-18,,9.99\n";
        let outcome = parse(csv, None).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
    }

    #[test]
    fn foreign_currency_and_kind_are_annotated() {
        let csv = b"Date,Description,Amount\n\
            2024-01-15,PRESSBYRAN STOCKHOLM,209.90 SEK\n\
            2024-01-16,Zelle payment to Alice,100.00\n\
            2024-01-17,ACME CORP PAYROLL,2500.00\n";
        let outcome = parse(csv, None).unwrap();
        assert_eq!(outcome.transactions[0].currency.as_deref(), Some("SEK"));
        assert_eq!(outcome.transactions[1].kind, Some(TransactionKind::Transfer));
        assert_eq!(outcome.transactions[2].kind, Some(TransactionKind::Income));
    }
}
