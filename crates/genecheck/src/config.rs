//! Configuration management for genecheck.
//!
//! Loads settings from a TOML file (`--config`, then the user config dir) or
//! falls back to defaults. Every field has a default so partial files work.

use crate::verifier::AgentSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding `llm.model`.
pub const MODEL_ENV: &str = "OPENAI_MODEL_NAME";

/// Model service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model for generation, extraction and revision
    #[serde(default = "default_model")]
    pub model: String,

    /// Model for the verification agent (defaults to `model`)
    #[serde(default)]
    pub verifier_model: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// HTTP timeout per model call in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            verifier_model: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn verifier_model(&self) -> &str {
        self.verifier_model.as_deref().unwrap_or(&self.model)
    }
}

/// Verification loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Loop passes per claim before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Pause before each verification model call (rate limiting)
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,
}

fn default_max_iterations() -> usize {
    10
}

fn default_call_delay_ms() -> u64 {
    2_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            call_delay_ms: default_call_delay_ms(),
        }
    }
}

/// Knowledge tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base URL of the lookup service; each tool is served at `{base_url}/{name}`
    #[serde(default = "default_tools_base_url")]
    pub base_url: String,

    /// Tools offered to the verification agent, in order
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// HTTP timeout per tool call in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tools_base_url() -> String {
    "http://127.0.0.1:8700/tools".to_string()
}

fn default_enabled_tools() -> Vec<String> {
    crate::tools::catalog::TOOL_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tools_base_url(),
            enabled: default_enabled_tools(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// Audit log locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_baseline_log")]
    pub baseline_log: PathBuf,

    #[serde(default = "default_verification_log")]
    pub verification_log: PathBuf,

    #[serde(default = "default_final_log")]
    pub final_log: PathBuf,
}

fn default_baseline_log() -> PathBuf {
    PathBuf::from("outputs/baseline/baseline_responses.txt")
}

fn default_verification_log() -> PathBuf {
    PathBuf::from("outputs/verification/claims_and_verification.txt")
}

fn default_final_log() -> PathBuf {
    PathBuf::from("outputs/cascade/final_responses.txt")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            baseline_log: default_baseline_log(),
            verification_log: default_verification_log(),
            final_log: default_final_log(),
        }
    }
}

/// Batch input columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_id_column")]
    pub id_column: String,

    #[serde(default = "default_subjects_column")]
    pub subjects_column: String,
}

fn default_id_column() -> String {
    "ID".to_string()
}

fn default_subjects_column() -> String {
    "Genes".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            subjects_column: default_subjects_column(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub input: InputConfig,
}

impl Config {
    /// Default config location (`~/.config/genecheck/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("genecheck").join("config.toml"))
    }

    /// Load config.
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried, then built-in defaults. Environment overrides are applied and
    /// the result validated in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_path(&path)?,
                None => {
                    warn!("Config not found, using defaults");
                    Config::default()
                }
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(MODEL_ENV) {
            let model = model.trim();
            if !model.is_empty() {
                info!("Model overridden by {}: {}", MODEL_ENV, model);
                self.llm.model = model.to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be at least 1");
        }
        if self.llm.endpoint.trim().is_empty() {
            bail!("llm.endpoint must not be empty");
        }
        Ok(())
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_iterations: self.agent.max_iterations,
            call_delay: Duration::from_millis(self.agent.call_delay_ms),
        }
    }
}
