use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All conversion targets this one currency.
pub const BASE_CURRENCY: &str = "USD";

/// A resolved exchange rate for one `(from, to, date)` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub rate: f64,
    /// Whether the rate came from the persistent cache (or the identity
    /// short-circuit) rather than a remote source.
    pub cached: bool,
    pub date: NaiveDate,
}

/// Base-currency equivalent of `amount` at `rate`, rounded to cents.
pub fn usd_equivalent(amount: Decimal, rate: f64) -> Decimal {
    let rate = Decimal::from_f64_retain(rate).unwrap_or(Decimal::ONE);
    (amount * rate).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn identity_rate_preserves_amount() {
        let amt = Decimal::from_str("6.75").unwrap();
        assert_eq!(usd_equivalent(amt, 1.0), amt);
    }

    #[test]
    fn conversion_rounds_to_cents() {
        let amt = Decimal::from_str("209.90").unwrap();
        let usd = usd_equivalent(amt, 0.0948);
        assert_eq!(usd, Decimal::from_str("19.90").unwrap());
    }

    #[test]
    fn non_finite_rate_degrades_to_identity() {
        let amt = Decimal::from_str("10.00").unwrap();
        assert_eq!(usd_equivalent(amt, f64::NAN), amt);
    }
}
