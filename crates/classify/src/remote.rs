use centime_core::{Categorization, Category, TransactionKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payload;
use crate::prompt;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("categorization request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("categorization provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no json payload in model response")]
    MissingPayload,
    #[error("malformed model response: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Client for the remote categorization model. Construction is optional;
/// callers treat an absent client as "always answer with the fallback".
pub struct RemoteClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WireCategorization {
    category: Option<String>,
    #[serde(rename = "transactionType")]
    kind: Option<String>,
    confidence: Option<f64>,
}

impl From<WireCategorization> for Categorization {
    fn from(wire: WireCategorization) -> Self {
        Categorization {
            category: wire
                .category
                .as_deref()
                .map(Category::parse_lossy)
                .unwrap_or(Category::Other),
            kind: wire
                .kind
                .as_deref()
                .map(TransactionKind::parse_lossy)
                .unwrap_or(TransactionKind::Purchase),
            confidence: wire.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        }
    }
}

impl RemoteClassifier {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, API_BASE.to_string())
    }

    /// Point the client at a different endpoint root, e.g. a local stub.
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    /// Build a client from `GEMINI_API_KEY`, or `None` when unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(key, DEFAULT_MODEL.to_string()))
    }

    /// Categorize one merchant.
    pub async fn categorize(&self, merchant: &str) -> Result<Categorization, ClassifyError> {
        let text = self.generate(&prompt::single(merchant)).await?;
        let json = payload::extract_object(&text).ok_or(ClassifyError::MissingPayload)?;
        let wire: WireCategorization = serde_json::from_str(json)?;
        Ok(wire.into())
    }

    /// Categorize a batch of merchants with a single request. The result
    /// always has one entry per input, in order: entries the model skipped
    /// or garbled come back as the fallback categorization.
    pub async fn categorize_batch(
        &self,
        merchants: &[String],
    ) -> Result<Vec<Categorization>, ClassifyError> {
        let text = self.generate(&prompt::batch(merchants)).await?;
        let json = payload::extract_array(&text).ok_or(ClassifyError::MissingPayload)?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(align_batch(&entries, merchants.len()))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ClassifyError> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            candidates: Option<Vec<Candidate>>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }
        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Option<Vec<CandidatePart>>,
        }
        #[derive(Deserialize)]
        struct CandidatePart {
            text: Option<String>,
        }

        let body = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifyError::Status { status, body });
        }

        let out: Resp = resp.json().await?;
        let mut text = String::new();
        for candidate in out.candidates.unwrap_or_default() {
            for part in candidate.content.parts.unwrap_or_default() {
                if let Some(t) = part.text {
                    text.push_str(&t);
                }
            }
        }
        Ok(text.trim().to_string())
    }
}

/// Map raw batch entries onto the expected length. Short arrays are padded
/// with the fallback, extra entries are dropped, and individually garbled
/// entries degrade without poisoning their neighbors.
fn align_batch(entries: &[serde_json::Value], expected: usize) -> Vec<Categorization> {
    (0..expected)
        .map(|i| {
            entries
                .get(i)
                .cloned()
                .and_then(|v| serde_json::from_value::<WireCategorization>(v).ok())
                .map(Categorization::from)
                .unwrap_or_else(Categorization::fallback)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_maps_known_values() {
        let wire: WireCategorization = serde_json::from_str(
            r#"{"category": "Dining", "transactionType": "purchase", "confidence": 0.95}"#,
        )
        .unwrap();
        let c = Categorization::from(wire);
        assert_eq!(c.category, Category::Dining);
        assert_eq!(c.kind, TransactionKind::Purchase);
        assert!((c.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn wire_unknown_strings_degrade() {
        let wire: WireCategorization = serde_json::from_str(
            r#"{"category": "Snacks", "transactionType": "donation", "confidence": 2.5}"#,
        )
        .unwrap();
        let c = Categorization::from(wire);
        assert_eq!(c.category, Category::Other);
        assert_eq!(c.kind, TransactionKind::Purchase);
        assert_eq!(c.confidence, 1.0); // clamped
    }

    #[test]
    fn wire_missing_fields_degrade() {
        let wire: WireCategorization = serde_json::from_str("{}").unwrap();
        let c = Categorization::from(wire);
        assert_eq!(c.category, Category::Other);
        assert_eq!(c.confidence, 0.0);
    }

    // ── align_batch ───────────────────────────────────────────────────────────

    #[test]
    fn short_batch_is_padded() {
        let entries = vec![json!({"category": "Gas", "transactionType": "purchase", "confidence": 0.9})];
        let out = align_batch(&entries, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].category, Category::Gas);
        assert_eq!(out[1].category, Category::Other);
        assert_eq!(out[1].confidence, 0.0);
    }

    #[test]
    fn long_batch_is_truncated() {
        let entries = vec![
            json!({"category": "Gas", "transactionType": "purchase", "confidence": 0.9}),
            json!({"category": "Dining", "transactionType": "purchase", "confidence": 0.9}),
        ];
        assert_eq!(align_batch(&entries, 1).len(), 1);
    }

    #[test]
    fn garbled_entry_degrades_alone() {
        let entries = vec![
            json!("not an object"),
            json!({"category": "Travel", "transactionType": "purchase", "confidence": 0.8}),
        ];
        let out = align_batch(&entries, 2);
        assert_eq!(out[0].category, Category::Other);
        assert_eq!(out[1].category, Category::Travel);
    }
}
