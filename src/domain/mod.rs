//! Domain types for the gateway.
//!
//! This module contains the core data structures:
//! - Request: Pipeline input and the default entity catalog
//! - Stage: Stage identifiers
//! - Contracts: Typed bodies exchanged with each stage
//! - Outcome: Success or stage-tagged failure of a run
//! - Log: Per-run structured log

pub mod contracts;
pub mod log;
pub mod outcome;
pub mod request;
pub mod stage;

// Re-export commonly used types
pub use contracts::{
    AnalyzerRequest, AnonymizerRequest, AnonymizerResponse, ChatCompletionRequest,
    ChatCompletionResponse, Operator, DEFAULT_REDACTION_TOKEN,
};
pub use log::{duration_ms, LogEntry, LogLevel, RunLog};
pub use outcome::{
    FailureKind, OutcomeResult, PipelineFailure, PipelineOutcome, PipelineSuccess, INVALID_BODY,
    TEXT_REQUIRED,
};
pub use request::{default_entities, PipelineRequest, DEFAULT_ENTITIES, DEFAULT_LANGUAGE};
pub use stage::{FailedAt, Stage};
