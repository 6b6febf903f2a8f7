//! Configuration loading
//!
//! Settings come from `.speech-orchestrator.toml`; every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::agent_config::RoleConfig;
use crate::error::DraftResult;
use crate::workflow::SequencingMode;

/// File name searched for in the current directory and its parents
pub const CONFIG_FILE_NAME: &str = ".speech-orchestrator.toml";

/// Find the config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at `<config_dir>/speech-orchestrator/config.toml`
fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_upwards(&cwd, CONFIG_FILE_NAME) {
            return Some(found);
        }
    }

    let global_path = dirs::config_dir()?
        .join("speech-orchestrator")
        .join("config.toml");
    global_path.exists().then_some(global_path)
}

fn find_upwards(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Top-level configuration (from `.speech-orchestrator.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Per-role overrides
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default model for every role
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Engine behaviour settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub sequencing: SequencingMode,
    /// How long to wait for a checkpoint decision (none = forever)
    #[serde(default)]
    pub checkpoint_timeout_secs: Option<u64>,
    /// Retries allowed per stage
    #[serde(default = "default_max_stage_retries")]
    pub max_stage_retries: u32,
    /// Auto-approve every checkpoint
    #[serde(default)]
    pub non_interactive: bool,
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

pub(crate) fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_stage_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sequencing: SequencingMode::default(),
            checkpoint_timeout_secs: None,
            max_stage_retries: default_max_stage_retries(),
            non_interactive: false,
        }
    }
}

impl EngineConfig {
    pub fn checkpoint_timeout(&self) -> Option<Duration> {
        self.checkpoint_timeout_secs.map(Duration::from_secs)
    }
}

impl FileConfig {
    /// Load config from the discovered file, or defaults if there is none
    pub fn load() -> DraftResult<Self> {
        if let Some(config_path) = find_config_file() {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> DraftResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml(toml_str: &str) -> DraftResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}
