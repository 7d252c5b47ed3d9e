//! redact-gateway - anonymizing gateway in front of an LLM
//!
//! Forwards submitted text to an analyzer service, hands the findings to an
//! anonymizer service, and sends the anonymized text to an
//! OpenAI-compatible LLM API for free-text analysis.
//!
//! # Architecture
//!
//! The pipeline is strictly sequential:
//! - Each stage consumes the previous stage's output
//! - Every stage call has its own timeout and is never retried
//! - The first failure ends the run with a stage-tagged error
//!
//! # Modules
//!
//! - `adapters`: Stage client trait and its HTTP implementation
//! - `core`: Pipeline orchestrator
//! - `domain`: Data structures (request, stage contracts, outcome, run log)
//! - `config`: Layered configuration
//! - `server`: HTTP gateway (form front end + JSON endpoint)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve the gateway
//! ANALYZER_URL=... ANONYMIZER_URL=... LLM_BASE_URL=... redact-gateway serve
//!
//! # Run the pipeline once
//! echo "My phone is 555-1234" | redact-gateway run --entities PHONE_NUMBER
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;

// Re-export main types at crate root for convenience
pub use adapters::{HttpStageClient, StageCall, StageClient, StageError, StageResult};
pub use config::{PipelineSettings, ResolvedConfig};
pub use crate::core::Orchestrator;
pub use domain::{PipelineFailure, PipelineOutcome, PipelineRequest, PipelineSuccess, Stage};
