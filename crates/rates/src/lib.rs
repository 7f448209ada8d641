//! Daily exchange rates: local cache first, then a free currency API with
//! a mirror fallback. Rates are keyed by (from, to, date).

use std::collections::HashMap;

use centime_core::{usd_equivalent, RateQuote};
use centime_storage::{self as storage, DbPool, StorageError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

const PRIMARY_API: &str = "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@";
const FALLBACK_API: &str = "https://currency-api.pages.dev/";

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate cache error: {0}")]
    Storage(#[from] StorageError),
    #[error("both rate sources failed for {from}->{to} on {date}: primary: {primary}; fallback: {fallback}")]
    SourcesFailed {
        from: String,
        to: String,
        date: NaiveDate,
        primary: String,
        fallback: String,
    },
}

/// One requested conversion pair on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatePair {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
}

pub struct ExchangeRateService {
    pool: DbPool,
    client: reqwest::Client,
}

impl ExchangeRateService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the rate for one pair on one date.
    ///
    /// Same-currency pairs short-circuit to 1.0 and are reported as cached
    /// without touching the store. Fresh remote rates are persisted before
    /// returning, so the next import of the same statement date is free.
    pub async fn get_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<RateQuote, RateError> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();

        if from == to {
            return Ok(RateQuote { rate: 1.0, cached: true, date });
        }

        if let Some(rate) = storage::get_cached_rate(&self.pool, &from, &to, date).await? {
            return Ok(RateQuote { rate, cached: true, date });
        }

        let rate = self.fetch(&from, &to, date).await?;
        storage::upsert_rate(&self.pool, &from, &to, date, rate).await?;

        Ok(RateQuote { rate, cached: false, date })
    }

    /// Resolve many pairs. Per-pair failures degrade to rate 1.0 marked
    /// uncached instead of failing the batch; the caller decides how to
    /// surface that.
    pub async fn get_rates(&self, requests: &[RatePair]) -> HashMap<RatePair, RateQuote> {
        let mut results = HashMap::with_capacity(requests.len());
        for req in requests {
            let quote = match self.get_rate(&req.from, &req.to, req.date).await {
                Ok(quote) => quote,
                Err(err) => {
                    warn!(from = %req.from, to = %req.to, date = %req.date, error = %err,
                        "rate lookup failed, carrying amount unconverted");
                    RateQuote { rate: 1.0, cached: false, date: req.date }
                }
            };
            results.insert(req.clone(), quote);
        }
        results
    }

    /// Convert an amount, returning the converted value and the rate used.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<(Decimal, f64), RateError> {
        let quote = self.get_rate(from, to, date).await?;
        Ok((usd_equivalent(amount, quote.rate), quote.rate))
    }

    async fn fetch(&self, from: &str, to: &str, date: NaiveDate) -> Result<f64, RateError> {
        match self.fetch_from(PRIMARY_API, from, to, date).await {
            Ok(rate) => Ok(rate),
            Err(primary) => {
                warn!(%primary, from, to, "primary rate source failed, trying fallback");
                self.fetch_from(FALLBACK_API, from, to, date)
                    .await
                    .map_err(|fallback| RateError::SourcesFailed {
                        from: from.to_string(),
                        to: to.to_string(),
                        date,
                        primary,
                        fallback,
                    })
            }
        }
    }

    // Response shape: {"date": "...", "<from>": {"<to>": rate, ...}}
    async fn fetch_from(
        &self,
        base: &str,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<f64, String> {
        let url = source_url(base, from, date);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("source returned {}", resp.status()));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
        body.get(from.to_lowercase())
            .and_then(|rates| rates.get(to.to_lowercase()))
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| format!("no rate for {from}->{to}"))
    }
}

fn source_url(base: &str, from: &str, date: NaiveDate) -> String {
    format!(
        "{base}{}/v1/currencies/{}.json",
        date.format("%Y-%m-%d"),
        from.to_lowercase()
    )
}
