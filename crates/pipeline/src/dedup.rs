use centime_core::CanonicalTransaction;
use rust_decimal::Decimal;

/// An incoming record judged to already exist in the store.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    /// Index into the prepared record list.
    pub index: usize,
    /// Every stored record that matched; never empty.
    pub existing: Vec<CanonicalTransaction>,
}

impl DuplicateMatch {
    pub fn match_count(&self) -> usize {
        self.existing.len()
    }
}

fn amount_epsilon() -> Decimal {
    Decimal::new(1, 2) // one cent
}

/// Same day, same merchant ignoring case, amounts within one cent.
pub fn is_duplicate(candidate: &CanonicalTransaction, existing: &CanonicalTransaction) -> bool {
    candidate.date == existing.date
        && candidate.merchant.eq_ignore_ascii_case(&existing.merchant)
        && (candidate.amount - existing.amount).abs() <= amount_epsilon()
}

/// Flag incoming records that match something already stored, with all the
/// stored records they collide with. Records without a match simply do not
/// appear in the result; absence means "not a duplicate".
pub fn find_duplicates(
    candidates: &[CanonicalTransaction],
    existing: &[CanonicalTransaction],
) -> Vec<DuplicateMatch> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let matches: Vec<CanonicalTransaction> = existing
                .iter()
                .filter(|e| is_duplicate(candidate, e))
                .cloned()
                .collect();
            (!matches.is_empty()).then_some(DuplicateMatch { index, existing: matches })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use centime_core::{Category, TransactionKind};
    use chrono::NaiveDate;

    fn tx(merchant: &str, day: u32, cents: i64) -> CanonicalTransaction {
        let amount = Decimal::new(cents, 2);
        CanonicalTransaction {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            merchant: merchant.to_string(),
            amount,
            category: Category::Other,
            kind: TransactionKind::Purchase,
            raw_description: None,
            original_currency: "USD".to_string(),
            original_amount: amount,
            exchange_rate: 1.0,
            usd_amount: amount,
            conversion_note: None,
            created_at: None,
        }
    }

    #[test]
    fn exact_match_is_duplicate() {
        assert!(is_duplicate(&tx("KROGER", 15, 4567), &tx("KROGER", 15, 4567)));
    }

    #[test]
    fn merchant_case_is_ignored() {
        assert!(is_duplicate(&tx("Kroger #1234", 15, 4567), &tx("KROGER #1234", 15, 4567)));
    }

    #[test]
    fn one_cent_apart_is_duplicate_two_is_not() {
        assert!(is_duplicate(&tx("KROGER", 15, 4567), &tx("KROGER", 15, 4568)));
        assert!(!is_duplicate(&tx("KROGER", 15, 4567), &tx("KROGER", 15, 4569)));
    }

    #[test]
    fn different_day_or_merchant_is_not() {
        assert!(!is_duplicate(&tx("KROGER", 15, 4567), &tx("KROGER", 16, 4567)));
        assert!(!is_duplicate(&tx("KROGER", 15, 4567), &tx("PUBLIX", 15, 4567)));
    }

    #[test]
    fn only_matches_are_reported() {
        let candidates = vec![tx("KROGER", 15, 4567), tx("NEW PLACE", 16, 1000)];
        let existing = vec![tx("kroger", 15, 4567)];

        let dups = find_duplicates(&candidates, &existing);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].index, 0);
        assert_eq!(dups[0].match_count(), 1);
    }

    #[test]
    fn every_colliding_record_is_listed() {
        let candidates = vec![tx("KROGER", 15, 4567)];
        let existing = vec![tx("KROGER", 15, 4567), tx("Kroger", 15, 4568)];

        let dups = find_duplicates(&candidates, &existing);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].match_count(), 2);
    }
}
