//! Pipeline stage identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three remote calls, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Entity detection
    Analyze,

    /// Replacement of detected entities
    Anonymize,

    /// Free-text analysis by the LLM provider
    LlmAnalyze,
}

impl Stage {
    /// All stages in the order the pipeline runs them
    pub const ALL: [Stage; 3] = [Stage::Analyze, Stage::Anonymize, Stage::LlmAnalyze];

    /// Wire name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Anonymize => "anonymize",
            Stage::LlmAnalyze => "llm_analyze",
        }
    }

    /// Human-readable label used in error summaries
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Analyze => "Analyzer",
            Stage::Anonymize => "Anonymizer",
            Stage::LlmAnalyze => "LLM analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pipeline run stopped
///
/// Validation happens before any stage runs, so it is not a [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedAt {
    Validation,
    Analyze,
    Anonymize,
    LlmAnalyze,
}

impl FailedAt {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedAt::Validation => "validation",
            FailedAt::Analyze => "analyze",
            FailedAt::Anonymize => "anonymize",
            FailedAt::LlmAnalyze => "llm_analyze",
        }
    }
}

impl From<Stage> for FailedAt {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Analyze => FailedAt::Analyze,
            Stage::Anonymize => FailedAt::Anonymize,
            Stage::LlmAnalyze => FailedAt::LlmAnalyze,
        }
    }
}

impl fmt::Display for FailedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
            assert_eq!(FailedAt::from(stage).as_str(), stage.as_str());
        }
        assert_eq!(
            serde_json::to_string(&FailedAt::Validation).unwrap(),
            "\"validation\""
        );
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Analyze < Stage::Anonymize);
        assert!(Stage::Anonymize < Stage::LlmAnalyze);
    }
}
