use std::collections::HashMap;
use std::str::FromStr;

use centime_core::{CanonicalTransaction, Category, TransactionKind};
use centime_vendor::normalize_merchant;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::QueryBuilder;

use crate::{DbPool, StorageError};

// Column order shared by every SELECT so one row mapper serves them all.
const COLUMNS: &str = "id, date, merchant, amount, category, transaction_kind, raw_description, \
     original_currency, original_amount, exchange_rate, usd_amount, conversion_note, created_at";

type Row = (
    i64,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    f64,
    String,
    Option<String>,
    String,
);

fn parse_stored_amount(s: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(s).map_err(|_| StorageError::Amount(s.to_string()))
}

fn parse_stored_date(s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StorageError::Date(s.to_string()))
}

fn from_row(r: Row) -> Result<CanonicalTransaction, StorageError> {
    Ok(CanonicalTransaction {
        id: Some(r.0),
        date: parse_stored_date(&r.1)?,
        merchant: r.2,
        amount: parse_stored_amount(&r.3)?,
        category: Category::parse_lossy(&r.4),
        kind: TransactionKind::parse_lossy(&r.5),
        raw_description: r.6,
        original_currency: r.7,
        original_amount: parse_stored_amount(&r.8)?,
        exchange_rate: r.9,
        usd_amount: parse_stored_amount(&r.10)?,
        conversion_note: r.11,
        created_at: Some(r.12),
    })
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Substring match on merchant or raw description.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub kind: Option<TransactionKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn insert_transaction(
    pool: &DbPool,
    tx: &CanonicalTransaction,
) -> Result<i64, StorageError> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (date, merchant, amount, category, transaction_kind, raw_description,
             original_currency, original_amount, exchange_rate, usd_amount, conversion_note)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tx.date.format("%Y-%m-%d").to_string())
    .bind(&tx.merchant)
    .bind(tx.amount.to_string())
    .bind(tx.category.as_str())
    .bind(tx.kind.as_str())
    .bind(&tx.raw_description)
    .bind(&tx.original_currency)
    .bind(tx.original_amount.to_string())
    .bind(tx.exchange_rate)
    .bind(tx.usd_amount.to_string())
    .bind(&tx.conversion_note)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Persist a batch in one database transaction: either the whole import
/// commits or none of it does.
pub async fn insert_transactions(
    pool: &DbPool,
    txs: &[CanonicalTransaction],
) -> Result<usize, StorageError> {
    let mut txn = pool.begin().await?;

    for tx in txs {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (date, merchant, amount, category, transaction_kind, raw_description,
                 original_currency, original_amount, exchange_rate, usd_amount, conversion_note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.date.format("%Y-%m-%d").to_string())
        .bind(&tx.merchant)
        .bind(tx.amount.to_string())
        .bind(tx.category.as_str())
        .bind(tx.kind.as_str())
        .bind(&tx.raw_description)
        .bind(&tx.original_currency)
        .bind(tx.original_amount.to_string())
        .bind(tx.exchange_rate)
        .bind(tx.usd_amount.to_string())
        .bind(&tx.conversion_note)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;
    Ok(txs.len())
}

pub async fn get_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Vec<CanonicalTransaction>, StorageError> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM transactions WHERE 1=1"));

    if let Some(search) = &filter.search {
        let like = format!("%{search}%");
        qb.push(" AND (merchant LIKE ")
            .push_bind(like.clone())
            .push(" OR raw_description LIKE ")
            .push_bind(like)
            .push(")");
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND transaction_kind = ").push_bind(kind.as_str());
    }
    if let Some(from) = filter.from {
        qb.push(" AND date >= ")
            .push_bind(from.format("%Y-%m-%d").to_string());
    }
    if let Some(to) = filter.to {
        qb.push(" AND date <= ")
            .push_bind(to.format("%Y-%m-%d").to_string());
    }
    qb.push(" ORDER BY date DESC, id DESC");

    let rows: Vec<Row> = qb.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(from_row).collect()
}

/// All stored transactions dated on any of the given days. This is the
/// duplicate-probe query: candidate sets stay small because statements
/// cluster on few dates.
pub async fn get_transactions_on_dates(
    pool: &DbPool,
    dates: &[NaiveDate],
) -> Result<Vec<CanonicalTransaction>, StorageError> {
    if dates.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM transactions WHERE date IN ("));
    let mut sep = qb.separated(", ");
    for date in dates {
        sep.push_bind(date.format("%Y-%m-%d").to_string());
    }
    qb.push(") ORDER BY date, id");

    let rows: Vec<Row> = qb.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(from_row).collect()
}

/// Re-categorize one transaction and write the decision through to the
/// merchant cache, so the user's correction wins over any model output on
/// the next import.
pub async fn update_category(
    pool: &DbPool,
    id: i64,
    category: Category,
    kind: TransactionKind,
) -> Result<(), StorageError> {
    let mut txn = pool.begin().await?;

    let row: Option<(String,)> = sqlx::query_as("SELECT merchant FROM transactions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let Some((merchant,)) = row else {
        return Err(StorageError::Db(sqlx::Error::RowNotFound));
    };

    sqlx::query("UPDATE transactions SET category = ?, transaction_kind = ? WHERE id = ?")
        .bind(category.as_str())
        .bind(kind.as_str())
        .bind(id)
        .execute(&mut *txn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO merchant_mappings (merchant, category, transaction_kind, last_updated)
        VALUES (?, ?, ?, datetime('now'))
        ON CONFLICT(merchant) DO UPDATE SET
            category = excluded.category,
            transaction_kind = excluded.transaction_kind,
            last_updated = datetime('now')
        "#,
    )
    .bind(normalize_merchant(&merchant))
    .bind(category.as_str())
    .bind(kind.as_str())
    .execute(&mut *txn)
    .await?;

    txn.commit().await?;
    Ok(())
}

/// Replace the conversion triple in one statement so amount, rate and usd
/// value can never be observed out of step.
pub async fn update_conversion(
    pool: &DbPool,
    id: i64,
    exchange_rate: f64,
    usd_amount: Decimal,
    conversion_note: Option<&str>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE transactions
         SET amount = ?, usd_amount = ?, exchange_rate = ?, conversion_note = ?
         WHERE id = ?",
    )
    .bind(usd_amount.to_string())
    .bind(usd_amount.to_string())
    .bind(exchange_rate)
    .bind(conversion_note)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_transaction(pool: &DbPool, id: i64) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_all_transactions(pool: &DbPool) -> Result<u64, StorageError> {
    let result = sqlx::query("DELETE FROM transactions").execute(pool).await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Clone)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct SpendingStats {
    pub total_spent: Decimal,
    pub transaction_count: i64,
    pub average_amount: Decimal,
    pub top_category: Option<Category>,
    pub totals: Vec<CategoryTotal>,
}

/// Spending grouped by category, purchases only. Transfers and income are
/// movement, not spend. Amounts are summed as decimals after the TEXT
/// boundary, not in SQL.
pub async fn spending_stats(pool: &DbPool) -> Result<SpendingStats, StorageError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT category, usd_amount FROM transactions WHERE transaction_kind = 'purchase'")
            .fetch_all(pool)
            .await?;

    let mut grouped: HashMap<Category, (Decimal, i64)> = HashMap::new();
    for (category, amount) in rows {
        let amount = parse_stored_amount(&amount)?;
        let entry = grouped.entry(Category::parse_lossy(&category)).or_default();
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal { category, total, count })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total));

    let total_spent: Decimal = totals.iter().map(|t| t.total).sum();
    let transaction_count: i64 = totals.iter().map(|t| t.count).sum();
    let average_amount = if transaction_count > 0 {
        (total_spent / Decimal::from(transaction_count)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(SpendingStats {
        total_spent,
        transaction_count,
        average_amount,
        top_category: totals.first().map(|t| t.category),
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_db_in_memory;
    use crate::mappings::get_mapping;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn tx(merchant: &str, d: u32, amount: &str) -> CanonicalTransaction {
        let amount = Decimal::from_str(amount).unwrap();
        CanonicalTransaction {
            id: None,
            date: day(d),
            merchant: merchant.to_string(),
            amount,
            category: Category::Other,
            kind: TransactionKind::Purchase,
            raw_description: Some(merchant.to_string()),
            original_currency: "USD".to_string(),
            original_amount: amount,
            exchange_rate: 1.0,
            usd_amount: amount,
            conversion_note: None,
            created_at: None,
        }
    }

    // ── round trip ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_then_list() {
        let pool = create_db_in_memory().await.unwrap();
        let id = insert_transaction(&pool, &tx("KROGER #1234", 15, "45.67")).await.unwrap();
        assert!(id > 0);

        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, Some(id));
        assert_eq!(all[0].merchant, "KROGER #1234");
        assert_eq!(all[0].amount, Decimal::from_str("45.67").unwrap());
        assert_eq!(all[0].date, day(15));
        assert!(all[0].created_at.is_some());
    }

    #[tokio::test]
    async fn batch_insert_is_all_or_nothing() {
        let pool = create_db_in_memory().await.unwrap();
        let n = insert_transactions(&pool, &[tx("A", 1, "1.00"), tx("B", 2, "2.00")])
            .await
            .unwrap();
        assert_eq!(n, 2);
        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    // ── filters ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn filters_compose() {
        let pool = create_db_in_memory().await.unwrap();
        let mut grocery = tx("KROGER", 10, "20.00");
        grocery.category = Category::Groceries;
        let mut coffee = tx("STARBUCKS", 20, "6.75");
        coffee.category = Category::Dining;
        insert_transaction(&pool, &grocery).await.unwrap();
        insert_transaction(&pool, &coffee).await.unwrap();

        let filter = TransactionFilter {
            category: Some(Category::Dining),
            ..Default::default()
        };
        let dining = get_transactions(&pool, &filter).await.unwrap();
        assert_eq!(dining.len(), 1);
        assert_eq!(dining[0].merchant, "STARBUCKS");

        let filter = TransactionFilter {
            search: Some("KROG".to_string()),
            ..Default::default()
        };
        assert_eq!(get_transactions(&pool, &filter).await.unwrap().len(), 1);

        let filter = TransactionFilter {
            from: Some(day(15)),
            ..Default::default()
        };
        let later = get_transactions(&pool, &filter).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].merchant, "STARBUCKS");
    }

    #[tokio::test]
    async fn date_probe_returns_only_those_days() {
        let pool = create_db_in_memory().await.unwrap();
        insert_transaction(&pool, &tx("A", 1, "1.00")).await.unwrap();
        insert_transaction(&pool, &tx("B", 2, "2.00")).await.unwrap();
        insert_transaction(&pool, &tx("C", 3, "3.00")).await.unwrap();

        let hits = get_transactions_on_dates(&pool, &[day(1), day(3)]).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(get_transactions_on_dates(&pool, &[]).await.unwrap().is_empty());
    }

    // ── updates ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn category_edit_writes_through_to_mapping() {
        let pool = create_db_in_memory().await.unwrap();
        let id = insert_transaction(&pool, &tx("Kroger #1234", 15, "45.67")).await.unwrap();

        update_category(&pool, id, Category::Groceries, TransactionKind::Purchase)
            .await
            .unwrap();

        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(all[0].category, Category::Groceries);

        // cache keyed by the normalized merchant
        let mapping = get_mapping(&pool, "KROGER 1234").await.unwrap().unwrap();
        assert_eq!(mapping.category, Category::Groceries);
    }

    #[tokio::test]
    async fn category_edit_unknown_id_errors() {
        let pool = create_db_in_memory().await.unwrap();
        let err = update_category(&pool, 999, Category::Other, TransactionKind::Purchase).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn conversion_triple_updates_together() {
        let pool = create_db_in_memory().await.unwrap();
        let mut t = tx("PRESSBYRAN", 15, "209.90");
        t.original_currency = "SEK".to_string();
        let id = insert_transaction(&pool, &t).await.unwrap();

        update_conversion(&pool, id, 0.0948, Decimal::from_str("19.90").unwrap(), None)
            .await
            .unwrap();

        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(all[0].usd_amount, Decimal::from_str("19.90").unwrap());
        assert_eq!(all[0].amount, Decimal::from_str("19.90").unwrap());
        assert_eq!(all[0].exchange_rate, 0.0948);
        assert_eq!(all[0].original_amount, Decimal::from_str("209.90").unwrap());
    }

    // ── deletes and stats ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_one_and_all() {
        let pool = create_db_in_memory().await.unwrap();
        let id = insert_transaction(&pool, &tx("A", 1, "1.00")).await.unwrap();
        insert_transaction(&pool, &tx("B", 2, "2.00")).await.unwrap();

        delete_transaction(&pool, id).await.unwrap();
        assert_eq!(get_transactions(&pool, &TransactionFilter::default()).await.unwrap().len(), 1);

        assert_eq!(delete_all_transactions(&pool).await.unwrap(), 1);
        assert!(get_transactions(&pool, &TransactionFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_cover_purchases_only() {
        let pool = create_db_in_memory().await.unwrap();
        let mut grocery = tx("KROGER", 10, "30.00");
        grocery.category = Category::Groceries;
        let mut coffee = tx("STARBUCKS", 11, "10.00");
        coffee.category = Category::Dining;
        let mut transfer = tx("ZELLE TO BOB", 12, "500.00");
        transfer.kind = TransactionKind::Transfer;
        insert_transaction(&pool, &grocery).await.unwrap();
        insert_transaction(&pool, &coffee).await.unwrap();
        insert_transaction(&pool, &transfer).await.unwrap();

        let stats = spending_stats(&pool).await.unwrap();
        assert_eq!(stats.total_spent, Decimal::from_str("40.00").unwrap());
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(stats.average_amount, Decimal::from_str("20.00").unwrap());
        assert_eq!(stats.top_category, Some(Category::Groceries));
        assert_eq!(stats.totals.len(), 2);
    }
}
