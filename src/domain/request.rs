//! Pipeline input.
//!
//! A PipelineRequest is built once per inbound submission and never
//! modified afterwards.

use serde::{Deserialize, Serialize};

/// Entity types requested from the analyzer when the caller names none
pub const DEFAULT_ENTITIES: [&str; 16] = [
    "PERSON",
    "PHONE_NUMBER",
    "EMAIL_ADDRESS",
    "CREDIT_CARD",
    "IP_ADDRESS",
    "DATE_TIME",
    "NRP",
    "LOCATION",
    "BANK_ACCOUNT",
    "IBAN_CODE",
    "US_PASSPORT",
    "UK_NHS",
    "US_DRIVER_LICENSE",
    "US_ITIN",
    "US_SSN",
    "UUID",
];

/// Language used when the caller does not supply one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Input for a single pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Free text to analyze (must be non-empty for the run to proceed)
    pub text: String,

    /// Entity types forwarded to the analyzer, in order
    pub entities: Vec<String>,

    /// Language code forwarded to the analyzer
    pub language: String,
}

impl PipelineRequest {
    /// Create a request with the default entity catalog and language
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: default_entities(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Build a request from optional caller overrides.
    ///
    /// Only an absent `entities` falls back to the catalog. An explicit
    /// empty list is kept as-is.
    pub fn from_parts(
        text: Option<String>,
        entities: Option<Vec<String>>,
        language: Option<String>,
        default_language: &str,
    ) -> Self {
        Self {
            text: text.unwrap_or_default(),
            entities: entities.unwrap_or_else(default_entities),
            language: language.unwrap_or_else(|| default_language.to_string()),
        }
    }

    /// Replace the entity list
    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    /// Replace the language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Whether the request carries text the analyzer can work on
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// The default entity catalog as owned strings
pub fn default_entities() -> Vec<String> {
    DEFAULT_ENTITIES.iter().map(|e| e.to_string()).collect()
}
