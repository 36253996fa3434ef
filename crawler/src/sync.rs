//! Pull-based training-sample synchronization.
//!
//! The sample service answers `GET <base>/lastSample/<afterId>` with
//!
//! ```json
//! {"samples": [{"7": {"ignore": "twilight saga"}}, {"8": {"relevant": "sea ice extent"}}]}
//! ```
//!
//! Each element holds exactly one sample id, mapping to exactly one label, mapping to
//! the sample text. Only the first key at each level is read; any further keys are
//! logged and dropped.

use focus_core::tokenizer::tokenize;
use focus_core::{SampleId, TrainingSample};
use reqwest::{header, Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP error code: {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("malformed sample payload: {0}")]
    Payload(String),
}

/// Fetches labeled samples newer than a cursor from the remote sample service.
#[derive(Debug, Clone)]
pub struct SampleSyncClient {
    base: Option<String>,
    client: Client,
}

impl SampleSyncClient {
    /// `base` of `None` or blank disables sync for the lifetime of the client.
    pub fn new(base: Option<&str>, timeout: Duration) -> Result<Self, SyncError> {
        let base = base
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty());
        let client = Client::builder().timeout(timeout).build()?;
        match &base {
            Some(b) => tracing::info!(base = %b, timeout_secs = timeout.as_secs_f64(), "sample sync enabled"),
            None => tracing::info!("API URL not set, training samples will not be refreshed"),
        }
        Ok(Self { base, client })
    }

    pub fn disabled() -> Self {
        Self { base: None, client: Client::new() }
    }

    pub fn is_enabled(&self) -> bool { self.base.is_some() }

    pub fn endpoint(&self, after_id: SampleId) -> Option<String> {
        self.base.as_ref().map(|b| format!("{b}/lastSample/{after_id}"))
    }

    /// Samples after `after_id`, or `None` when sync is disabled or the request failed.
    /// Failures are logged and never surface to the caller.
    pub async fn fetch_new_samples(&self, after_id: SampleId) -> Option<Vec<TrainingSample>> {
        let url = self.endpoint(after_id)?;
        match self.request(&url).await {
            Ok(samples) => {
                tracing::debug!(%url, count = samples.len(), "fetched training samples");
                Some(samples)
            }
            Err(err) => {
                tracing::warn!(%url, error = %err, "sample sync failed, keeping current training set");
                None
            }
        }
    }

    async fn request(&self, url: &str) -> Result<Vec<TrainingSample>, SyncError> {
        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(SyncError::Status(resp.status()));
        }
        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| SyncError::Payload(e.to_string()))?;
        parse_samples(&body)
    }
}

/// Decode a sample-service response body. Any malformed element rejects the whole batch.
pub fn parse_samples(body: &Value) -> Result<Vec<TrainingSample>, SyncError> {
    let items = body
        .get("samples")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::Payload("missing \"samples\" array".into()))?;
    items.iter().map(parse_sample).collect()
}

fn parse_sample(item: &Value) -> Result<TrainingSample, SyncError> {
    let outer = item
        .as_object()
        .ok_or_else(|| SyncError::Payload(format!("sample is not an object: {item}")))?;
    let (id_key, inner) = first_entry(outer, "sample id")?;
    let id = id_key
        .trim()
        .parse::<SampleId>()
        .map_err(|_| SyncError::Payload(format!("invalid sample id {id_key:?}")))?;
    let inner = inner
        .as_object()
        .ok_or_else(|| SyncError::Payload(format!("sample {id} has no label object")))?;
    let (label, text) = first_entry(inner, "label")?;
    let text = text
        .as_str()
        .ok_or_else(|| SyncError::Payload(format!("sample {id} text is not a string")))?;
    Ok(TrainingSample { id, label: label.to_lowercase(), tokens: tokenize(text) })
}

fn first_entry<'a>(map: &'a Map<String, Value>, what: &str) -> Result<(&'a String, &'a Value), SyncError> {
    let mut entries = map.iter();
    let first = entries
        .next()
        .ok_or_else(|| SyncError::Payload(format!("empty object where a {what} was expected")))?;
    let ignored: Vec<&String> = entries.map(|(k, _)| k).collect();
    if !ignored.is_empty() {
        tracing::warn!(kept = %first.0, ?ignored, "sample object has more than one {what}, extra keys dropped");
    }
    Ok(first)
}
