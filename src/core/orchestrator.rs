//! Main orchestrator for pipeline execution.
//!
//! Runs analyze -> anonymize -> llm_analyze in strict order. Each stage
//! feeds the next, so stages never overlap and the first failure ends the
//! run. Failures are never retried.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::adapters::{HttpStageClient, StageCall, StageClient, StageError};
use crate::config::PipelineSettings;
use crate::domain::{
    AnalyzerRequest, AnonymizerRequest, AnonymizerResponse, ChatCompletionRequest,
    ChatCompletionResponse, PipelineFailure, PipelineOutcome, PipelineRequest, PipelineSuccess,
    RunLog, Stage,
};

/// Main pipeline orchestrator
pub struct Orchestrator {
    /// Transport used for every stage call
    client: Arc<dyn StageClient>,

    settings: PipelineSettings,
}

/// Log and timings collected while a run is in flight
struct RunTrace {
    log: RunLog,
    timings: BTreeMap<Stage, Duration>,
}

impl RunTrace {
    fn new() -> Self {
        Self {
            log: RunLog::new(),
            timings: BTreeMap::new(),
        }
    }

    fn fail(self, failure: PipelineFailure) -> PipelineOutcome {
        PipelineOutcome::failure(failure, self.timings, self.log.into_entries())
    }

    fn succeed(self, success: PipelineSuccess) -> PipelineOutcome {
        PipelineOutcome::success(success, self.timings, self.log.into_entries())
    }
}

impl Orchestrator {
    /// Create an orchestrator that talks HTTP to the configured services
    pub fn new(settings: PipelineSettings) -> Self {
        Self::with_client(settings, Arc::new(HttpStageClient::new()))
    }

    /// Create an orchestrator over a custom stage client
    pub fn with_client(settings: PipelineSettings, client: Arc<dyn StageClient>) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Execute the pipeline for one submission
    #[instrument(
        skip(self, request),
        fields(run_id = %Uuid::new_v4(), entities = request.entities.len(), language = %request.language)
    )]
    pub async fn run(&self, request: &PipelineRequest) -> PipelineOutcome {
        let mut trace = RunTrace::new();

        if !request.has_text() {
            trace.log.warn(None, "Rejected submission without text");
            return trace.fail(PipelineFailure::validation(
                "the 'text' field must be a non-empty string",
            ));
        }

        info!(chars = request.text.chars().count(), "Starting pipeline execution");

        // Step 1: analyze
        let analyzer_body =
            AnalyzerRequest::new(&request.text, &request.language, &request.entities);
        let findings = match self
            .invoke(
                &mut trace,
                Stage::Analyze,
                &self.settings.analyzer_url,
                &analyzer_body,
                None,
            )
            .await
        {
            Ok(payload) => payload,
            Err(failure) => return trace.fail(failure),
        };

        // Step 2: anonymize with the analyzer findings
        let anonymizer_body =
            AnonymizerRequest::new(&request.text, &self.settings.operator, &findings);
        let payload = match self
            .invoke(
                &mut trace,
                Stage::Anonymize,
                &self.settings.anonymizer_url,
                &anonymizer_body,
                None,
            )
            .await
        {
            Ok(payload) => payload,
            Err(failure) => return trace.fail(failure),
        };
        let anonymized: AnonymizerResponse = match decode(&mut trace.log, Stage::Anonymize, payload)
        {
            Ok(response) => response,
            Err(failure) => return trace.fail(failure),
        };

        // Step 3: LLM analysis of the anonymized text
        let llm = &self.settings.llm;
        let completions_url = llm.completions_url();
        let chat_body = ChatCompletionRequest::single_turn(
            &llm.model,
            &llm.system_prompt,
            &anonymized.text,
            llm.max_tokens,
        );
        let payload = match self
            .invoke(
                &mut trace,
                Stage::LlmAnalyze,
                &completions_url,
                &chat_body,
                llm.api_key.as_deref(),
            )
            .await
        {
            Ok(payload) => payload,
            Err(failure) => return trace.fail(failure),
        };
        let completion: ChatCompletionResponse =
            match decode(&mut trace.log, Stage::LlmAnalyze, payload) {
                Ok(response) => response,
                Err(failure) => return trace.fail(failure),
            };

        let Some(analysis) = completion.first_text() else {
            let error = StageError::MalformedResponse(
                "completion contains no choices with message content".into(),
            );
            let failure = reject(&mut trace.log, Stage::LlmAnalyze, error);
            return trace.fail(failure);
        };
        let llm_analysis = analysis.to_string();

        info!("Pipeline completed successfully");

        trace.succeed(PipelineSuccess {
            analyzer_results: findings,
            anonymized_text: anonymized.text,
            llm_analysis,
        })
    }

    /// Perform one stage call, recording its timing and log entry
    async fn invoke<B: Serialize>(
        &self,
        trace: &mut RunTrace,
        stage: Stage,
        url: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<Value, PipelineFailure> {
        let body = match serde_json::to_value(body) {
            Ok(value) => value,
            Err(e) => {
                let error = StageError::InvalidRequest(format!("failed to encode body: {}", e));
                return Err(reject(&mut trace.log, stage, error));
            }
        };

        let timeout = self.settings.timeouts.for_stage(stage);
        let call = StageCall::new(stage, url, body, timeout).with_bearer(bearer);
        let summary = call.summary();

        let started = Instant::now();
        let result = self.client.call(call).await;

        match result {
            Ok(result) => {
                trace.timings.insert(stage, result.elapsed);
                trace.log.stage_completed(stage, &summary, result.elapsed);
                Ok(result.payload)
            }
            Err(error) => {
                let elapsed = started.elapsed();
                trace.timings.insert(stage, elapsed);
                trace
                    .log
                    .stage_failed(stage, &summary, elapsed, &error.to_string());
                Err(PipelineFailure::stage(stage, error.kind(), error.to_string()))
            }
        }
    }
}

/// Decode a stage payload into its typed contract
fn decode<T: DeserializeOwned>(
    log: &mut RunLog,
    stage: Stage,
    payload: Value,
) -> Result<T, PipelineFailure> {
    serde_json::from_value(payload).map_err(|e| {
        let error =
            StageError::MalformedResponse(format!("unexpected {} response: {}", stage, e));
        reject(log, stage, error)
    })
}

/// Turn a post-call failure into a tagged pipeline failure
fn reject(log: &mut RunLog, stage: Stage, error: StageError) -> PipelineFailure {
    let details = error.to_string();
    log.warn(Some(stage), details.clone());
    PipelineFailure::stage(stage, error.kind(), details)
}
