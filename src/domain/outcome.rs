//! Terminal value of a pipeline run.
//!
//! An outcome is either a full success or a stage-tagged failure, never a
//! mix of the two. Serialized, a success carries `analyzer_results`,
//! `anonymized_text` and `llm_analysis`; a failure carries `error`,
//! `details` and `stage`. Both carry `timings_ms`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::log::{duration_ms, LogEntry};
use super::stage::{FailedAt, Stage};

/// Summary returned when the submission has no text
pub const TEXT_REQUIRED: &str = "Text is required";

/// Summary reported when the submission body cannot be used at all
pub const INVALID_BODY: &str = "Invalid request body";

/// Classification of a failure, which decides the outward status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Timeout,
    Transport,
    RemoteError,
    MalformedResponse,
    Internal,
}

impl FailureKind {
    /// HTTP status the gateway answers with
    pub fn http_status(&self) -> u16 {
        match self {
            FailureKind::Validation => 400,
            FailureKind::Timeout => 504,
            FailureKind::Transport
            | FailureKind::RemoteError
            | FailureKind::MalformedResponse
            | FailureKind::Internal => 500,
        }
    }
}

/// Results of a run where all three stages succeeded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSuccess {
    /// Analyzer findings, forwarded untouched
    pub analyzer_results: Value,

    pub anonymized_text: String,

    pub llm_analysis: String,
}

/// Why and where a run stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineFailure {
    /// Short summary, e.g. "Analyzer stage failed"
    pub error: String,

    /// Diagnostic detail from the failing call
    pub details: String,

    pub stage: FailedAt,

    pub kind: FailureKind,
}

impl PipelineFailure {
    /// Submission had no text; no stage was called
    pub fn validation(details: impl Into<String>) -> Self {
        Self {
            error: TEXT_REQUIRED.to_string(),
            details: details.into(),
            stage: FailedAt::Validation,
            kind: FailureKind::Validation,
        }
    }

    /// Submission body was unparsable or had a field of the wrong shape;
    /// no stage was called
    pub fn invalid_body(details: impl Into<String>) -> Self {
        Self {
            error: INVALID_BODY.to_string(),
            details: details.into(),
            stage: FailedAt::Validation,
            kind: FailureKind::Validation,
        }
    }

    /// A stage call or its response decoding failed
    pub fn stage(stage: Stage, kind: FailureKind, details: impl Into<String>) -> Self {
        let error = match kind {
            FailureKind::Timeout => format!("{} stage timed out", stage.label()),
            _ => format!("{} stage failed", stage.label()),
        };
        Self {
            error,
            details: details.into(),
            stage: stage.into(),
            kind,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// Success or failure of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutcomeResult {
    Success(PipelineSuccess),
    Failure(PipelineFailure),
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    #[serde(flatten)]
    pub result: OutcomeResult,

    /// Wall-clock time per stage that was called
    pub timings_ms: BTreeMap<Stage, u64>,

    /// Log captured during the run (rendered on the HTML page only)
    #[serde(skip)]
    pub logs: Vec<LogEntry>,
}

impl PipelineOutcome {
    pub fn success(
        success: PipelineSuccess,
        timings: BTreeMap<Stage, Duration>,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self::build(OutcomeResult::Success(success), timings, logs)
    }

    pub fn failure(
        failure: PipelineFailure,
        timings: BTreeMap<Stage, Duration>,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self::build(OutcomeResult::Failure(failure), timings, logs)
    }

    fn build(
        result: OutcomeResult,
        timings: BTreeMap<Stage, Duration>,
        logs: Vec<LogEntry>,
    ) -> Self {
        let timings_ms = timings
            .into_iter()
            .map(|(stage, elapsed)| (stage, duration_ms(elapsed)))
            .collect();
        Self {
            result,
            timings_ms,
            logs,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Success(_))
    }

    pub fn success_fields(&self) -> Option<&PipelineSuccess> {
        match &self.result {
            OutcomeResult::Success(success) => Some(success),
            OutcomeResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineFailure> {
        match &self.result {
            OutcomeResult::Success(_) => None,
            OutcomeResult::Failure(failure) => Some(failure),
        }
    }

    /// HTTP status the gateway answers with
    pub fn http_status(&self) -> u16 {
        self.error().map_or(200, PipelineFailure::http_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_classification() {
        assert_eq!(FailureKind::Validation.http_status(), 400);
        assert_eq!(FailureKind::Timeout.http_status(), 504);
        assert_eq!(FailureKind::Transport.http_status(), 500);
        assert_eq!(FailureKind::RemoteError.http_status(), 500);
        assert_eq!(FailureKind::MalformedResponse.http_status(), 500);
    }

    #[test]
    fn test_success_serialization() {
        let mut timings = BTreeMap::new();
        timings.insert(Stage::Analyze, Duration::from_millis(5));
        let outcome = PipelineOutcome::success(
            PipelineSuccess {
                analyzer_results: json!([]),
                anonymized_text: "hi".into(),
                llm_analysis: "fine".into(),
            },
            timings,
            Vec::new(),
        );

        assert_eq!(outcome.http_status(), 200);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "analyzer_results": [],
                "anonymized_text": "hi",
                "llm_analysis": "fine",
                "timings_ms": { "analyze": 5 }
            })
        );
    }

    #[test]
    fn test_failure_serialization() {
        let outcome = PipelineOutcome::failure(
            PipelineFailure::stage(Stage::LlmAnalyze, FailureKind::Timeout, "timed out after 30s"),
            BTreeMap::new(),
            Vec::new(),
        );

        assert!(!outcome.is_success());
        assert_eq!(outcome.http_status(), 504);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["error"], "LLM analysis stage timed out");
        assert_eq!(value["details"], "timed out after 30s");
        assert_eq!(value["stage"], "llm_analyze");
        assert_eq!(value["kind"], "timeout");
        assert!(value.get("anonymized_text").is_none());
    }

    #[test]
    fn test_validation_failure() {
        let failure = PipelineFailure::validation("missing text");
        assert_eq!(failure.error, TEXT_REQUIRED);
        assert_eq!(failure.stage, FailedAt::Validation);
        assert_eq!(failure.http_status(), 400);
    }

    #[test]
    fn test_invalid_body_keeps_own_summary() {
        let failure = PipelineFailure::invalid_body("entities: invalid type");
        assert_eq!(failure.error, INVALID_BODY);
        assert_ne!(failure.error, TEXT_REQUIRED);
        assert_eq!(failure.stage, FailedAt::Validation);
        assert_eq!(failure.http_status(), 400);
    }

    #[test]
    fn test_huge_timing_saturates() {
        let outcome = PipelineOutcome::failure(
            PipelineFailure::stage(Stage::Analyze, FailureKind::Timeout, "slow"),
            BTreeMap::from([(Stage::Analyze, Duration::MAX)]),
            Vec::new(),
        );
        assert_eq!(outcome.timings_ms[&Stage::Analyze], u64::MAX);
    }
}
