use chrono::NaiveDate;

use crate::{DbPool, StorageError};

/// Cached rate for a currency pair on a calendar date, if one is stored.
pub async fn get_cached_rate(
    pool: &DbPool,
    from: &str,
    to: &str,
    date: NaiveDate,
) -> Result<Option<f64>, StorageError> {
    let row = sqlx::query_as::<_, (f64,)>(
        "SELECT rate FROM exchange_rates
         WHERE from_currency = ? AND to_currency = ? AND date = ?",
    )
    .bind(from)
    .bind(to)
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

/// Store a fetched rate. The natural key is (from, to, date); refetching a
/// pair replaces the stored value.
pub async fn upsert_rate(
    pool: &DbPool,
    from: &str,
    to: &str,
    date: NaiveDate,
    rate: f64,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO exchange_rates (from_currency, to_currency, date, rate)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(from_currency, to_currency, date) DO UPDATE SET
            rate = excluded.rate,
            created_at = datetime('now')
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(date.format("%Y-%m-%d").to_string())
    .bind(rate)
    .execute(pool)
    .await?;

    Ok(())
}
