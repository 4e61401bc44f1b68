//! Persistence providers - where committed rows go
//!
//! The controller only needs a success/failure answer for a record snapshot.
//! This module defines that capability as the `RowPersistence` trait and
//! ships three providers:
//!
//! - `SimulatedFailure`: rejects every update with a 400 (default, for demos)
//! - `AcceptAll`: local mode, every update succeeds
//! - `HttpPersistence`: sends the record JSON to an HTTP endpoint
//!
//! # Async design
//!
//! `update` returns a boxed future so providers stay object-safe and can be
//! shared as `Arc<dyn RowPersistence>` across commit tasks.

use crate::config::{HttpMethod, PersistenceConfig, PersistenceMode};
use crate::grid::Record;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Message returned by the simulated backend
pub const SIMULATED_ERROR_MESSAGE: &str = "Simulated server error";

/// Why an update was not persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The backend answered with a non-success status
    Rejected { status: u16, message: String },
    /// The request never produced an answer (connect, timeout, encoding)
    Transport(String),
}

impl PersistenceError {
    /// Application-level status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, message } => write!(f, "{} ({})", message, status),
            Self::Transport(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Capability to persist one record
pub trait RowPersistence: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Attempt to persist the record snapshot
    fn update<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), PersistenceError>>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Local providers
// ═══════════════════════════════════════════════════════════════════════════

/// Rejects every update with a 400, the way the demo backend does
#[derive(Debug, Default)]
pub struct SimulatedFailure;

impl RowPersistence for SimulatedFailure {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn update<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), PersistenceError>> {
        tracing::debug!("Simulated backend rejecting row {}", record.id());
        futures::future::ready(Err(PersistenceError::Rejected {
            status: 400,
            message: SIMULATED_ERROR_MESSAGE.to_string(),
        }))
        .boxed()
    }
}

/// Accepts every update without sending it anywhere
#[derive(Debug, Default)]
pub struct AcceptAll;

impl RowPersistence for AcceptAll {
    fn name(&self) -> &'static str {
        "local"
    }

    fn update<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), PersistenceError>> {
        tracing::debug!("Accepted row {} locally", record.id());
        futures::future::ready(Ok(())).boxed()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HTTP Provider
// ═══════════════════════════════════════════════════════════════════════════

/// Sends each committed record as JSON to an HTTP endpoint
///
/// Any 2xx status is success. Other statuses become `Rejected` with the
/// message taken from the response body when it has one.
pub struct HttpPersistence {
    client: reqwest::Client,
    endpoint: String,
    method: reqwest::Method,
}

impl HttpPersistence {
    pub fn new(
        endpoint: impl Into<String>,
        method: HttpMethod,
        timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PersistenceError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        let endpoint = endpoint.into();
        let method = match method {
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
        };

        tracing::info!("HTTP persistence: {} {}", method, endpoint);

        Ok(Self {
            client,
            endpoint,
            method,
        })
    }

    async fn send(&self, record: &Record) -> Result<(), PersistenceError> {
        let response = self
            .client
            .request(self.method.clone(), &self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Row {} persisted ({})", record.id(), status.as_u16());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl RowPersistence for HttpPersistence {
    fn name(&self) -> &'static str {
        "http"
    }

    fn update<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.send(record).boxed()
    }
}

/// Error body shapes commonly returned by REST backends
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Longest raw error body shown to the user, in characters
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Pull a human-readable message out of an error response body
///
/// Prefers `{"message": ...}`, then `{"error": ...}`, then the raw text.
/// HTML error pages are skipped and long text is cut.
fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error) {
            return Some(msg);
        }
    }

    // Structured body without a message field, or markup, is not useful to show
    if body.starts_with('{') || body.starts_with('[') || body.starts_with('<') {
        return None;
    }

    Some(cap_message(body))
}

fn cap_message(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Create a persistence provider from configuration
pub fn create_persistence(
    config: &PersistenceConfig,
) -> Result<Arc<dyn RowPersistence>, PersistenceError> {
    let provider: Arc<dyn RowPersistence> = match config.mode {
        PersistenceMode::Simulated => Arc::new(SimulatedFailure),
        PersistenceMode::Local => Arc::new(AcceptAll),
        PersistenceMode::Http => Arc::new(HttpPersistence::new(
            config.endpoint.clone(),
            config.method,
            Duration::from_secs(config.timeout_secs),
        )?),
    };
    Ok(provider)
}
