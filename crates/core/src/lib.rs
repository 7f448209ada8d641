pub mod currency;
pub mod transaction;

pub use currency::{usd_equivalent, RateQuote, BASE_CURRENCY};
pub use transaction::{
    CanonicalTransaction, Categorization, Category, MerchantMapping, ParsedTransaction,
    TransactionKind,
};
