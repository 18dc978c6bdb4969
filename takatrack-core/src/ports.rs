//! Traits describing the data source and the output channels, plus the fetch error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{AlertEvent, RenderFrame, Snapshot, SnapshotError};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while fetching a snapshot.
///
/// Every variant is recoverable: the cycle is skipped and the last good state kept.
pub enum FetchError {
    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,
    /// The source answered with a non-success status code.
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// The body was not a usable sequence of records.
    #[error("Malformed body: {0}")]
    MalformedBody(String),
    /// Transport failure without a response (connection refused, DNS, ...).
    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Short machine-friendly label, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::MalformedBody(_) => "malformed_body",
            FetchError::Network(_) => "network",
        }
    }
}

impl From<ReqwestError> for FetchError {
    fn from(err: ReqwestError) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FetchError::MalformedBody(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<SnapshotError> for FetchError {
    fn from(err: SnapshotError) -> Self {
        FetchError::MalformedBody(err.to_string())
    }
}

#[async_trait]
/// Source of full-state fleet snapshots.
pub trait SnapshotPort: Send + Sync {
    /// Human-readable description of the source, used in logs.
    fn describe(&self) -> String;

    /// Fetch the current snapshot. Implementations must not retry.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request fails or the body is unusable.
    async fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Receiver of full-bin alerts.
pub trait AlertSink: Send + Sync {
    /// Surface a single alert.
    fn alert(&self, event: &AlertEvent);
}

/// Receiver of rendered cycle results.
pub trait RenderSink: Send + Sync {
    /// Show the result of a completed cycle.
    fn render(&self, frame: &RenderFrame);

    /// Called when a cycle's fetch failed. The displayed data must stay as it is.
    fn fetch_failed(&self, _error: &FetchError) {}
}
