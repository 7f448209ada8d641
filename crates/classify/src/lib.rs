//! Merchant categorization: a static priority-ordered keyword table for the
//! common cases, with a remote model as the fallback for the long tail.

pub mod patterns;
pub mod payload;
pub mod prompt;
pub mod remote;

pub use patterns::{categorize_by_pattern, normalize_to_base_merchant, MERCHANT_PATTERNS};
pub use remote::{ClassifyError, RemoteClassifier};
