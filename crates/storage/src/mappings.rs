use centime_core::{Category, MerchantMapping, TransactionKind};

use crate::{DbPool, StorageError};

/// Look up the cached categorization for a normalized merchant key.
pub async fn get_mapping(
    pool: &DbPool,
    merchant: &str,
) -> Result<Option<MerchantMapping>, StorageError> {
    let row = sqlx::query_as::<_, (String, String, String, String)>(
        "SELECT merchant, category, transaction_kind, last_updated
         FROM merchant_mappings WHERE merchant = ?",
    )
    .bind(merchant)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| MerchantMapping {
        merchant: r.0,
        category: Category::parse_lossy(&r.1),
        kind: TransactionKind::parse_lossy(&r.2),
        last_updated: r.3,
    }))
}

/// Insert or refresh a cached categorization. Last write wins per key.
pub async fn upsert_mapping(
    pool: &DbPool,
    merchant: &str,
    category: Category,
    kind: TransactionKind,
) -> Result<(), StorageError> {
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
    .bind(merchant)
    .bind(category.as_str())
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_db_in_memory;

    #[tokio::test]
    async fn missing_mapping_is_none() {
        let pool = create_db_in_memory().await.unwrap();
        assert!(get_mapping(&pool, "KROGER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let pool = create_db_in_memory().await.unwrap();
        upsert_mapping(&pool, "KROGER", Category::Groceries, TransactionKind::Purchase)
            .await
            .unwrap();

        let m = get_mapping(&pool, "KROGER").await.unwrap().unwrap();
        assert_eq!(m.category, Category::Groceries);
        assert_eq!(m.kind, TransactionKind::Purchase);
    }

    #[tokio::test]
    async fn upsert_overwrites() {
        let pool = create_db_in_memory().await.unwrap();
        upsert_mapping(&pool, "UBER", Category::Dining, TransactionKind::Purchase)
            .await
            .unwrap();
        upsert_mapping(&pool, "UBER", Category::Transportation, TransactionKind::Purchase)
            .await
            .unwrap();

        let m = get_mapping(&pool, "UBER").await.unwrap().unwrap();
        assert_eq!(m.category, Category::Transportation);
    }
}
