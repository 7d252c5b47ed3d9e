//! Typed request and response bodies for each stage boundary.
//!
//! Requests borrow from the pipeline input so building them never copies
//! the submitted text. Responses are decoded from the stage payload right
//! after each call, so a missing field fails at the stage that produced it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token the default operator substitutes for every detected entity
pub const DEFAULT_REDACTION_TOKEN: &str = "<REDACTED>";

/// Operator key the anonymizer applies to every entity type
const DEFAULT_OPERATOR_KEY: &str = "DEFAULT";

/// Analyzer request: `{text, language, analyzer_config: {entities}}`
#[derive(Debug, Serialize)]
pub struct AnalyzerRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub analyzer_config: AnalyzerConfig<'a>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzerConfig<'a> {
    pub entities: &'a [String],
}

impl<'a> AnalyzerRequest<'a> {
    pub fn new(text: &'a str, language: &'a str, entities: &'a [String]) -> Self {
        Self {
            text,
            language,
            analyzer_config: AnalyzerConfig { entities },
        }
    }
}

/// Replacement policy handed to the anonymizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// Substitute a fixed value for the entity
    Replace {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },

    /// Remove the entity, leaving empty text in its place
    Redact,
}

impl Default for Operator {
    fn default() -> Self {
        Self::Replace {
            new_value: Some(DEFAULT_REDACTION_TOKEN.to_string()),
        }
    }
}

impl Operator {
    /// Operator name as the anonymizer service knows it
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Replace { .. } => "replace",
            Operator::Redact => "redact",
        }
    }

    /// Text that will stand in for an entity, when known locally
    pub fn replacement(&self) -> Option<&str> {
        match self {
            Operator::Replace { new_value } => new_value.as_deref(),
            Operator::Redact => Some(""),
        }
    }
}

/// Anonymizer request:
/// `{text, anonymizer_config: {operators: {DEFAULT: op}}, analyzer_results}`
#[derive(Debug, Serialize)]
pub struct AnonymizerRequest<'a> {
    pub text: &'a str,
    pub anonymizer_config: AnonymizerConfig<'a>,
    pub analyzer_results: &'a Value,
}

#[derive(Debug, Serialize)]
pub struct AnonymizerConfig<'a> {
    pub operators: BTreeMap<&'static str, &'a Operator>,
}

impl<'a> AnonymizerRequest<'a> {
    pub fn new(text: &'a str, operator: &'a Operator, findings: &'a Value) -> Self {
        let mut operators = BTreeMap::new();
        operators.insert(DEFAULT_OPERATOR_KEY, operator);
        Self {
            text,
            anonymizer_config: AnonymizerConfig { operators },
            analyzer_results: findings,
        }
    }
}

/// The part of the anonymizer response the pipeline depends on
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymizerResponse {
    pub text: String,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    /// A single user turn preceded by the system instruction
    pub fn single_turn(
        model: &'a str,
        system_prompt: &'a str,
        user_text: &'a str,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            max_tokens,
        }
    }
}

/// OpenAI-compatible chat completion response (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice, if the provider returned one
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
    }
}
