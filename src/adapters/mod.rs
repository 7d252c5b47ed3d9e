//! Stage client interface for the remote services.
//!
//! Every stage (analyzer, anonymizer, LLM provider) is reached through the
//! same [`StageClient`] trait, so the orchestrator is agnostic to how a call
//! is carried out.

pub mod http;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{FailureKind, Stage};

// Re-export the HTTP client
pub use http::HttpStageClient;

/// Largest slice of a remote error body kept as diagnostic detail
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Ways a single stage call can fail
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// The call did not complete within its timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, or any other network failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success status
    #[error("remote returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// Success status, but the body is not what the pipeline needs
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The call could not be issued as described
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl StageError {
    /// Classification used for the outward status code
    pub fn kind(&self) -> FailureKind {
        match self {
            StageError::Timeout(_) => FailureKind::Timeout,
            StageError::Transport(_) => FailureKind::Transport,
            StageError::Remote { .. } => FailureKind::RemoteError,
            StageError::MalformedResponse(_) => FailureKind::MalformedResponse,
            StageError::InvalidRequest(_) => FailureKind::Internal,
        }
    }
}

/// Output of a successful stage call
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,

    /// Parsed JSON response body
    pub payload: Value,

    /// Time spent waiting on the remote
    pub elapsed: Duration,

    /// True for every result a `StageClient` returns; failures are `StageError`
    pub succeeded: bool,
}

impl StageResult {
    pub fn success(stage: Stage, payload: Value, elapsed: Duration) -> Self {
        Self {
            stage,
            payload,
            elapsed,
            succeeded: true,
        }
    }
}

/// One outbound call to a stage endpoint
#[derive(Clone)]
pub struct StageCall<'a> {
    pub stage: Stage,
    pub url: &'a str,
    pub body: Value,
    pub timeout: Duration,

    /// Bearer credential sent as `Authorization` (never logged)
    pub bearer: Option<&'a str>,
}

impl<'a> StageCall<'a> {
    pub fn new(stage: Stage, url: &'a str, body: Value, timeout: Duration) -> Self {
        Self {
            stage,
            url,
            body,
            timeout,
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, bearer: Option<&'a str>) -> Self {
        self.bearer = bearer;
        self
    }

    /// Log-safe description of the call
    pub fn summary(&self) -> String {
        let bytes = serde_json::to_string(&self.body)
            .map(|s| s.len())
            .unwrap_or(0);
        format!("POST {} ({} bytes)", self.url, bytes)
    }
}

impl fmt::Debug for StageCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageCall")
            .field("stage", &self.stage)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("bearer", &self.bearer.map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// Trait for stage transports
#[async_trait]
pub trait StageClient: Send + Sync {
    /// Human-readable client name
    fn name(&self) -> &str;

    /// Perform the call and parse the response body
    async fn call(&self, call: StageCall<'_>) -> Result<StageResult, StageError>;
}

/// Cut a diagnostic body down to [`MAX_ERROR_BODY_CHARS`]
pub(crate) fn truncate_detail(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
