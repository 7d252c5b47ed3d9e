//! Configuration for the gateway.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ANALYZER_URL, ANONYMIZER_URL, LLM_BASE_URL, ...)
//! 2. Config file (explicit path, or .redact-gateway/config.yaml)
//! 3. Defaults (timeouts, model, prompt, bind address)
//!
//! Service URLs have no defaults. A gateway that starts without them would
//! silently call whatever instance a default happened to name.
//!
//! Config file discovery:
//! - Searches current directory and parents for .redact-gateway/config.yaml

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Operator, Stage, DEFAULT_LANGUAGE};

/// Env var naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "REDACT_GATEWAY_CONFIG";

pub const ANALYZER_URL_ENV: &str = "ANALYZER_URL";
pub const ANONYMIZER_URL_ENV: &str = "ANONYMIZER_URL";
pub const LLM_BASE_URL_ENV: &str = "LLM_BASE_URL";
pub const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const LLM_MODEL_ENV: &str = "LLM_MODEL";
pub const BIND_ENV: &str = "REDACT_GATEWAY_BIND";
pub const ANALYZE_TIMEOUT_ENV: &str = "REDACT_GATEWAY_ANALYZE_TIMEOUT_SECS";
pub const ANONYMIZE_TIMEOUT_ENV: &str = "REDACT_GATEWAY_ANONYMIZE_TIMEOUT_SECS";
pub const LLM_TIMEOUT_ENV: &str = "REDACT_GATEWAY_LLM_TIMEOUT_SECS";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that analyzes anonymized log data.";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub llm: LlmFileConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub pipeline: PipelineFileConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesConfig {
    pub analyzer_url: Option<String>,
    pub anonymizer_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmFileConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

/// Per-stage timeouts in seconds
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeoutsConfig {
    pub analyze: Option<u64>,
    pub anonymize: Option<u64>,
    pub llm_analyze: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineFileConfig {
    pub default_language: Option<String>,
    pub redaction: Option<Operator>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

/// Independent timeout for each stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub analyze: Duration,
    pub anonymize: Duration,
    pub llm_analyze: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        let secs = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            analyze: secs,
            anonymize: secs,
            llm_analyze: secs,
        }
    }
}

impl StageTimeouts {
    pub fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Analyze => self.analyze,
            Stage::Anonymize => self.anonymize,
            Stage::LlmAnalyze => self.llm_analyze,
        }
    }
}

/// LLM provider settings
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API (e.g. https://api.openai.com/v1)
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl LlmSettings {
    /// Chat completions endpoint URL
    pub fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

/// Everything the orchestrator needs to run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub analyzer_url: String,
    pub anonymizer_url: String,
    pub llm: LlmSettings,
    pub timeouts: StageTimeouts,
    pub operator: Operator,
    pub default_language: String,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub pipeline: PipelineSettings,

    /// Address the HTTP server binds to
    pub bind: String,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".redact-gateway").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration from all sources.
///
/// `explicit` wins over discovery; an explicit path that cannot be read is
/// an error rather than a fallback.
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let config_file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let mut resolved = resolve(file, |key| std::env::var(key).ok())?;
    resolved.config_file = config_file;
    Ok(resolved)
}

/// Merge a parsed config file with an environment lookup
pub fn resolve<F>(file: ConfigFile, env: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Empty values count as unset
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let analyzer_url = lookup(ANALYZER_URL_ENV).or(file.services.analyzer_url);
    let anonymizer_url = lookup(ANONYMIZER_URL_ENV).or(file.services.anonymizer_url);
    let llm_base_url = lookup(LLM_BASE_URL_ENV).or(file.llm.base_url);

    let mut missing = Vec::new();
    if analyzer_url.is_none() {
        missing.push(format!("services.analyzer_url ({})", ANALYZER_URL_ENV));
    }
    if anonymizer_url.is_none() {
        missing.push(format!("services.anonymizer_url ({})", ANONYMIZER_URL_ENV));
    }
    if llm_base_url.is_none() {
        missing.push(format!("llm.base_url ({})", LLM_BASE_URL_ENV));
    }

    let (Some(analyzer_url), Some(anonymizer_url), Some(base_url)) =
        (analyzer_url, anonymizer_url, llm_base_url)
    else {
        return Err(ConfigError::Missing(missing));
    };

    let timeouts = StageTimeouts {
        analyze: timeout_secs(
            "timeouts.analyze",
            lookup(ANALYZE_TIMEOUT_ENV),
            file.timeouts.analyze,
        )?,
        anonymize: timeout_secs(
            "timeouts.anonymize",
            lookup(ANONYMIZE_TIMEOUT_ENV),
            file.timeouts.anonymize,
        )?,
        llm_analyze: timeout_secs(
            "timeouts.llm_analyze",
            lookup(LLM_TIMEOUT_ENV),
            file.timeouts.llm_analyze,
        )?,
    };

    let llm = LlmSettings {
        base_url,
        api_key: lookup(LLM_API_KEY_ENV).or(file.llm.api_key),
        model: lookup(LLM_MODEL_ENV)
            .or(file.llm.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        max_tokens: file.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system_prompt: file
            .llm
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
    };

    if llm.max_tokens == 0 {
        return Err(ConfigError::Invalid {
            key: "llm.max_tokens".into(),
            reason: "must be greater than zero".into(),
        });
    }

    Ok(ResolvedConfig {
        pipeline: PipelineSettings {
            analyzer_url,
            anonymizer_url,
            llm,
            timeouts,
            operator: file.pipeline.redaction.unwrap_or_default(),
            default_language: file
                .pipeline
                .default_language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        },
        bind: lookup(BIND_ENV)
            .or(file.server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        config_file: None,
    })
}

/// Pick a timeout (env over file over default) and reject zero
fn timeout_secs(
    key: &str,
    from_env: Option<String>,
    from_file: Option<u64>,
) -> Result<Duration, ConfigError> {
    let secs = match from_env {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("'{}' is not a whole number of seconds: {}", raw, e),
        })?,
        None => from_file.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "must be greater than zero".into(),
        });
    }

    Ok(Duration::from_secs(secs))
}
