use std::sync::LazyLock;

use centime_core::{TransactionKind, BASE_CURRENCY};
use regex::Regex;

// Bank-specific wordings that are always transfers, checked before the
// generic phrases so e.g. autopay never reads as income.
const KNOWN_TRANSFERS: [&str; 9] = [
    "fid bkg svc llc",
    "zelle payment from",
    "zelle payment to",
    "zelle sent",
    "online banking transfer",
    "autopay",
    "automatic payment",
    "credit crd des:autopay",
    "chase credit crd",
];

const TRANSFER_PHRASES: [&str; 16] = [
    "transfer to",
    "transfer from",
    "payment to",
    "online transfer",
    "mobile transfer",
    "wire transfer",
    "wire sent",
    "ach transfer",
    "ach payment",
    "bill pay",
    "external transfer",
    "p2p payment",
    "venmo",
    "paypal transfer",
    "cash app",
    "transfer",
];

const INCOME_PHRASES: [&str; 4] = ["direct deposit", "payroll", "refund", "reimbursement"];

/// Infer transaction direction from merchant wording: transfers beat
/// income, everything else is a purchase. "deposit" counts as income
/// unless it is an ATM deposit, and "credit" unless it is a credit card
/// or autopay line.
pub fn detect_transaction_kind(merchant: &str) -> TransactionKind {
    let lower = merchant.to_lowercase();

    if KNOWN_TRANSFERS.iter().any(|p| lower.contains(p))
        || TRANSFER_PHRASES.iter().any(|p| lower.contains(p))
    {
        return TransactionKind::Transfer;
    }

    if INCOME_PHRASES.iter().any(|p| lower.contains(p))
        || (lower.contains("deposit") && !lower.contains("atm"))
        || (lower.contains("credit")
            && !lower.contains("credit card")
            && !lower.contains("autopay"))
    {
        return TransactionKind::Income;
    }

    TransactionKind::Purchase
}

static CURRENCY_MARKERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"€|\bEUR\b", "EUR"),
        (r"£|\bGBP\b", "GBP"),
        (r"¥|\bJPY\b", "JPY"),
        (r"₹|\bINR\b", "INR"),
        (r"\bSEK\b", "SEK"),
        (r"\bNOK\b", "NOK"),
        (r"\bDKK\b", "DKK"),
        (r"\bCHF\b", "CHF"),
        (r"\bCAD\b", "CAD"),
        (r"\bAUD\b", "AUD"),
        (r"\bCNY\b", "CNY"),
    ]
    .iter()
    .map(|(p, code)| (Regex::new(&format!("(?i){p}")).unwrap(), *code))
    .collect()
});

/// Sniff the currency from the amount cell and the description, defaulting
/// to the base currency. Dollar signs and "USD" need no entry since the
/// default already covers them. Codes must appear as whole words so AUDIO
/// never reads as AUD.
pub fn sniff_currency(amount_text: &str, description: &str) -> String {
    let combined = format!("{amount_text} {description}");
    for (re, code) in CURRENCY_MARKERS.iter() {
        if re.is_match(&combined) {
            return (*code).to_string();
        }
    }
    BASE_CURRENCY.to_string()
}
