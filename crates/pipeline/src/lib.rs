//! The import pipeline. `prepare` runs parse, categorize, convert and
//! duplicate detection without touching the store; `commit` persists an
//! accepted plan in one database transaction.

pub mod dedup;

use std::collections::{HashMap, HashSet};
use std::fmt;

use centime_classify::{categorize_by_pattern, RemoteClassifier};
use centime_core::{
    usd_equivalent, CanonicalTransaction, Categorization, TransactionKind, BASE_CURRENCY,
};
use centime_import::{parse_statement, ColumnMapping, ParseError};
use centime_rates::ExchangeRateService;
use centime_storage::{self as storage, DbPool, StorageError};
use centime_vendor::normalize_merchant;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Degradations encountered while preparing an import. Warnings never
/// block the plan; they are surfaced so the user can see what was kept
/// approximate.
#[derive(Debug, Clone)]
pub enum ImportWarning {
    ConversionUnavailable { currency: String, date: NaiveDate },
    CategorizationUnavailable { merchants: usize },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::ConversionUnavailable { currency, date } => {
                write!(f, "could not convert {currency} amounts dated {date}; kept unconverted")
            }
            ImportWarning::CategorizationUnavailable { merchants } => {
                write!(f, "{merchants} merchant(s) could not be categorized; defaulted to Other")
            }
        }
    }
}

#[derive(Debug)]
pub struct ImportPlan {
    pub records: Vec<CanonicalTransaction>,
    pub duplicates: Vec<dedup::DuplicateMatch>,
    pub warnings: Vec<ImportWarning>,
    /// Remote categorization requests issued; at most one per prepare.
    pub remote_calls: usize,
}

#[derive(Debug)]
pub enum PrepareOutcome {
    /// Tabular statement whose columns could not be auto-detected; the
    /// caller should ask for a mapping and try again.
    NeedsMapping { headers: Vec<String> },
    Ready(ImportPlan),
}

/// Prepare a statement for import. Nothing is persisted except resolved
/// categorizations and exchange rates, which are caches by design.
pub async fn prepare(
    pool: &DbPool,
    rates: &ExchangeRateService,
    classifier: Option<&RemoteClassifier>,
    bytes: &[u8],
    filename: &str,
    mapping: Option<&ColumnMapping>,
) -> Result<PrepareOutcome, ImportError> {
    let outcome = parse_statement(bytes, filename, mapping)?;
    if outcome.needs_mapping() {
        return Ok(PrepareOutcome::NeedsMapping {
            headers: outcome.headers.unwrap_or_default(),
        });
    }
    let parsed = outcome.transactions;
    info!(count = parsed.len(), filename, "parsed statement");

    let mut warnings = Vec::new();
    let mut remote_calls = 0usize;

    // one categorization per distinct merchant key, first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut merchants_by_key: HashMap<String, String> = HashMap::new();
    for tx in &parsed {
        let key = normalize_merchant(&tx.merchant);
        merchants_by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            tx.merchant.clone()
        });
    }

    let mut resolved: HashMap<String, Categorization> = HashMap::new();
    let mut uncached: Vec<String> = Vec::new();
    for key in &order {
        let merchant = &merchants_by_key[key];
        if let Some(c) = categorize_by_pattern(merchant) {
            // pattern hits refresh the cache too; only pure cache hits don't
            storage::upsert_mapping(pool, key, c.category, c.kind).await?;
            resolved.insert(key.clone(), c);
        } else if let Some(m) = storage::get_mapping(pool, key).await? {
            resolved.insert(
                key.clone(),
                Categorization { category: m.category, kind: m.kind, confidence: 1.0 },
            );
        } else {
            uncached.push(key.clone());
        }
    }

    if !uncached.is_empty() {
        match classifier {
            Some(client) => {
                let names: Vec<String> =
                    uncached.iter().map(|k| merchants_by_key[k].clone()).collect();
                remote_calls += 1;
                match client.categorize_batch(&names).await {
                    Ok(results) => {
                        for (key, c) in uncached.iter().zip(results) {
                            storage::upsert_mapping(pool, key, c.category, c.kind).await?;
                            resolved.insert(key.clone(), c);
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, merchants = uncached.len(),
                            "batch categorization failed, defaulting");
                        warnings.push(ImportWarning::CategorizationUnavailable {
                            merchants: uncached.len(),
                        });
                        for key in &uncached {
                            resolved.insert(key.clone(), Categorization::fallback());
                        }
                    }
                }
            }
            None => {
                warn!(merchants = uncached.len(),
                    "no categorization provider configured, defaulting");
                warnings.push(ImportWarning::CategorizationUnavailable {
                    merchants: uncached.len(),
                });
                for key in &uncached {
                    resolved.insert(key.clone(), Categorization::fallback());
                }
            }
        }
    }

    // one rate per distinct (currency, date)
    let mut rate_by_pair: HashMap<(String, NaiveDate), (f64, bool)> = HashMap::new();
    for tx in &parsed {
        let currency = tx.currency.clone().unwrap_or_else(|| BASE_CURRENCY.to_string());
        if currency == BASE_CURRENCY {
            continue;
        }
        let pair = (currency.clone(), tx.date);
        if rate_by_pair.contains_key(&pair) {
            continue;
        }
        match rates.get_rate(&currency, BASE_CURRENCY, tx.date).await {
            Ok(quote) => {
                rate_by_pair.insert(pair, (quote.rate, false));
            }
            Err(err) => {
                warn!(error = %err, %currency, date = %tx.date, "conversion unavailable");
                warnings.push(ImportWarning::ConversionUnavailable {
                    currency: currency.clone(),
                    date: tx.date,
                });
                rate_by_pair.insert(pair, (1.0, true));
            }
        }
    }

    let mut records = Vec::with_capacity(parsed.len());
    for tx in &parsed {
        let key = normalize_merchant(&tx.merchant);
        let categorization = resolved
            .get(&key)
            .copied()
            .unwrap_or_else(Categorization::fallback);
        // the parser's wording heuristic only decides when nothing else did
        let kind = if categorization.confidence > 0.0 {
            categorization.kind
        } else {
            tx.kind.unwrap_or(TransactionKind::Purchase)
        };

        let currency = tx.currency.clone().unwrap_or_else(|| BASE_CURRENCY.to_string());
        let (rate, note) = if currency == BASE_CURRENCY {
            (1.0, None)
        } else {
            let (rate, degraded) = rate_by_pair[&(currency.clone(), tx.date)];
            let note = degraded.then(|| {
                format!("rate unavailable for {currency} on {}; amount kept in {currency}", tx.date)
            });
            (rate, note)
        };
        let usd = usd_equivalent(tx.amount, rate);

        records.push(CanonicalTransaction {
            id: None,
            date: tx.date,
            merchant: tx.merchant.clone(),
            amount: usd,
            category: categorization.category,
            kind,
            raw_description: Some(tx.raw_description.clone()),
            original_currency: currency,
            original_amount: tx.amount,
            exchange_rate: rate,
            usd_amount: usd,
            conversion_note: note,
            created_at: None,
        });
    }

    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();
    let existing = storage::get_transactions_on_dates(pool, &dates).await?;
    let duplicates = dedup::find_duplicates(&records, &existing);

    info!(
        records = records.len(),
        duplicates = duplicates.len(),
        remote_calls,
        "prepared import"
    );
    Ok(PrepareOutcome::Ready(ImportPlan { records, duplicates, warnings, remote_calls }))
}

/// Persist an accepted plan. With `skip_duplicates` the flagged records
/// are left out; either way the insert is a single database transaction.
pub async fn commit(
    pool: &DbPool,
    plan: &ImportPlan,
    skip_duplicates: bool,
) -> Result<usize, StorageError> {
    let skip: HashSet<usize> = if skip_duplicates {
        plan.duplicates.iter().map(|d| d.index).collect()
    } else {
        HashSet::new()
    };

    let records: Vec<CanonicalTransaction> = plan
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(_, r)| r.clone())
        .collect();

    let inserted = storage::insert_transactions(pool, &records).await?;
    info!(inserted, skipped = skip.len(), "committed import");
    Ok(inserted)
}
