use std::path::Path;

use anyhow::{bail, Context};
use centime_classify::RemoteClassifier;
use centime_core::{Category, TransactionKind};
use centime_import::ColumnMapping;
use centime_pipeline::{commit, prepare, PrepareOutcome};
use centime_rates::ExchangeRateService;
use centime_storage::{self as storage, DbPool, TransactionFilter};
use centime_vendor::{find_similar_transactions, group_similar};
use chrono::NaiveDate;

pub async fn import(
    pool: &DbPool,
    file: &Path,
    date_col: Option<String>,
    merchant_col: Option<String>,
    amount_col: Option<String>,
    keep_duplicates: bool,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let mapping = match (date_col, merchant_col, amount_col) {
        (Some(date), Some(merchant), Some(amount)) => {
            Some(ColumnMapping { date, merchant, amount })
        }
        (None, None, None) => None,
        _ => bail!("--date-col, --merchant-col and --amount-col must be given together"),
    };

    let classifier = RemoteClassifier::from_env();
    if classifier.is_none() {
        eprintln!("note: GEMINI_API_KEY not set; unrecognized merchants fall back to Other");
    }
    let rates = ExchangeRateService::new(pool.clone());

    let outcome = prepare(
        pool,
        &rates,
        classifier.as_ref(),
        &bytes,
        filename,
        mapping.as_ref(),
    )
    .await?;

    let plan = match outcome {
        PrepareOutcome::NeedsMapping { headers } => {
            eprintln!("could not auto-detect date/merchant/amount columns; headers found:");
            for header in &headers {
                eprintln!("  {header}");
            }
            eprintln!("re-run with --date-col, --merchant-col and --amount-col");
            return Ok(());
        }
        PrepareOutcome::Ready(plan) => plan,
    };

    for warning in &plan.warnings {
        eprintln!("warning: {warning}");
    }
    for dup in &plan.duplicates {
        let incoming = &plan.records[dup.index];
        let ids: Vec<String> = dup
            .existing
            .iter()
            .map(|e| format!("#{}", e.id.unwrap_or_default()))
            .collect();
        println!(
            "duplicate: {} {} {} (matches {} stored: {})",
            incoming.date,
            incoming.merchant,
            incoming.amount,
            dup.match_count(),
            ids.join(", ")
        );
    }

    let inserted = commit(pool, &plan, !keep_duplicates).await?;
    println!(
        "imported {inserted} of {} transaction(s), {} duplicate(s) {}",
        plan.records.len(),
        plan.duplicates.len(),
        if keep_duplicates { "kept" } else { "skipped" }
    );
    Ok(())
}

pub async fn list(
    pool: &DbPool,
    search: Option<String>,
    category: Option<String>,
    kind: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let filter = TransactionFilter {
        search,
        category: category.as_deref().map(parse_category).transpose()?,
        kind: kind.as_deref().map(parse_kind).transpose()?,
        from,
        to,
    };

    let txs = storage::get_transactions(pool, &filter).await?;
    for t in &txs {
        let mut line = format!(
            "{:>5}  {}  {:<32}  {:>10}  {:<16}  {}",
            t.id.unwrap_or_default(),
            t.date,
            t.merchant,
            t.amount,
            t.category,
            t.kind
        );
        if t.original_currency != "USD" {
            line.push_str(&format!("  ({} {})", t.original_amount, t.original_currency));
        }
        if let Some(note) = &t.conversion_note {
            line.push_str(&format!("  [{note}]"));
        }
        println!("{line}");
    }
    println!("{} transaction(s)", txs.len());
    Ok(())
}

pub async fn similar(pool: &DbPool, id: i64, threshold: f64) -> anyhow::Result<()> {
    let all = storage::get_transactions(pool, &TransactionFilter::default()).await?;
    let Some(target) = all.iter().find(|t| t.id == Some(id)) else {
        bail!("no transaction with id {id}");
    };

    let groups = group_similar(find_similar_transactions(target, &all, threshold));
    if groups.is_empty() {
        println!("no similar transactions at threshold {threshold}");
        return Ok(());
    }

    for group in &groups {
        println!(
            "{} (avg similarity {:.2})",
            group.core_name, group.average_similarity
        );
        for item in &group.transactions {
            let t = &item.transaction;
            println!(
                "  #{:<5} {}  {:<32}  {:>10}  ({:.2})",
                t.id.unwrap_or_default(),
                t.date,
                t.merchant,
                t.amount,
                item.similarity.score
            );
        }
    }
    Ok(())
}

pub async fn set_category(
    pool: &DbPool,
    id: i64,
    category: &str,
    kind: &str,
) -> anyhow::Result<()> {
    let category = parse_category(category)?;
    let kind = parse_kind(kind)?;
    storage::update_category(pool, id, category, kind)
        .await
        .with_context(|| format!("updating transaction {id}"))?;
    println!("transaction {id} set to {category} ({kind})");
    Ok(())
}

pub async fn delete(pool: &DbPool, id: i64) -> anyhow::Result<()> {
    storage::delete_transaction(pool, id).await?;
    println!("deleted transaction {id}");
    Ok(())
}

pub async fn stats(pool: &DbPool) -> anyhow::Result<()> {
    let stats = storage::spending_stats(pool).await?;

    println!("total spent    {}", stats.total_spent);
    println!("transactions   {}", stats.transaction_count);
    println!("average        {}", stats.average_amount);
    if let Some(top) = stats.top_category {
        println!("top category   {top}");
    }
    for total in &stats.totals {
        println!(
            "  {:<18} {:>12}  ({} txns)",
            total.category.as_str(),
            total.total,
            total.count
        );
    }
    Ok(())
}

pub async fn wipe(pool: &DbPool, yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("refusing to delete all transactions without --yes");
    }
    let deleted = storage::delete_all_transactions(pool).await?;
    println!("deleted {deleted} transaction(s)");
    Ok(())
}

fn parse_category(s: &str) -> anyhow::Result<Category> {
    Category::ALL
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(s))
        .with_context(|| {
            format!(
                "unknown category {s:?}; expected one of: {}",
                Category::ALL.map(|c| c.as_str()).join(", ")
            )
        })
}

fn parse_kind(s: &str) -> anyhow::Result<TransactionKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "purchase" => Ok(TransactionKind::Purchase),
        "transfer" => Ok(TransactionKind::Transfer),
        "income" => Ok(TransactionKind::Income),
        _ => bail!("unknown kind {s:?}; expected purchase, transfer or income"),
    }
}
