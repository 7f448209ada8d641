use std::io::Cursor;

use calamine::{Data, Reader};
use chrono::NaiveDate;

use crate::columns::{detect_column_mapping, ColumnMapping};
use crate::{row_to_transaction, ParseError, ParseOutcome, StatementFormat};

/// Parse an Excel statement from the first worksheet. The first row is
/// taken as headers; column handling then mirrors the delimited path,
/// including the manual-mapping fallback.
pub fn parse(bytes: &[u8], manual: Option<&ColumnMapping>) -> Result<ParseOutcome, ParseError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::EmptySpreadsheet)?
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ParseError::EmptySpreadsheet)?
        .iter()
        .map(cell_text)
        .collect();

    let mapping = manual.cloned().or_else(|| detect_column_mapping(&headers));
    let Some(indices) = mapping.as_ref().and_then(|m| resolve_indices(&headers, m)) else {
        return Ok(ParseOutcome {
            transactions: Vec::new(),
            headers: Some(headers),
            format: StatementFormat::Spreadsheet,
        });
    };
    let (date_idx, merchant_idx, amount_idx) = indices;

    let mut transactions = Vec::new();
    for row in rows {
        let date = row.get(date_idx).map(cell_text).unwrap_or_default();
        let merchant = row.get(merchant_idx).map(cell_text).unwrap_or_default();
        let amount = row.get(amount_idx).map(cell_text).unwrap_or_default();
        if let Some(tx) = row_to_transaction(&date, &merchant, &amount) {
            transactions.push(tx);
        }
    }

    Ok(ParseOutcome {
        transactions,
        headers: None,
        format: StatementFormat::Spreadsheet,
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

/// Render a cell as field text for the shared row builder. Whole-number
/// floats print without the trailing ".0" so store numbers and years keep
/// their statement form; date cells are rendered ISO.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

// Excel serial day 0 is 1899-12-30 under the convention every modern
// producer uses for post-1900 dates.
fn excel_serial_to_iso(serial: f64) -> String {
    if serial < 1.0 {
        return String::new();
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|base| base.checked_add_days(chrono::Days::new(serial.trunc() as u64)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_to_iso() {
        assert_eq!(excel_serial_to_iso(45306.0), "2024-01-15");
        assert_eq!(excel_serial_to_iso(45306.75), "2024-01-15"); // time of day ignored
        assert_eq!(excel_serial_to_iso(0.5), "");
    }

    #[test]
    fn float_cells_keep_statement_form() {
        assert_eq!(cell_text(&Data::Float(1234.0)), "1234");
        assert_eq!(cell_text(&Data::Float(45.67)), "45.67");
    }

    #[test]
    fn string_cells_are_trimmed() {
        assert_eq!(cell_text(&Data::String("  KROGER  ".to_string())), "KROGER");
    }

    #[test]
    fn empty_and_error_cells_are_blank() {
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
