pub mod db;
pub mod mappings;
pub mod rates;
pub mod transactions;

pub use db::{create_db, DbPool};
pub use mappings::{get_mapping, upsert_mapping};
pub use rates::{get_cached_rate, upsert_rate};
pub use transactions::{
    delete_all_transactions, delete_transaction, get_transactions, get_transactions_on_dates,
    insert_transaction, insert_transactions, spending_stats, update_category, update_conversion,
    CategoryTotal, SpendingStats, TransactionFilter,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("corrupt stored amount: {0:?}")]
    Amount(String),
    #[error("corrupt stored date: {0:?}")]
    Date(String),
}
