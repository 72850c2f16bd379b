//! Devmate configuration: optional `devmate.toml` plus environment credentials.
//!
//! Settings are constructed once at startup and passed by reference to every
//! collaborator that needs them. Nothing reads the environment after that.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::DevmateError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "devmate.toml";

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const ENV_VAR: &str = "ENV";

/// Devmate configuration (TOML).
///
/// Missing fields default to the values the agent was designed around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DevmateConfig {
    /// Deployment label (`dev`, `test`, `prod`). The `ENV` variable overrides it.
    pub env: String,
    pub llm: LlmConfig,
    pub github: GithubConfig,
    pub context: ContextConfig,
    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    /// OpenAI-compatible API root (without `/chat/completions`).
    pub base_url: String,
    /// Request timeout. Unset means the call blocks until the service answers.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub per_page: u32,
    /// Request timeout. Unset means the call blocks until GitHub answers.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    /// Files larger than this are never selected; rendered content is cut to it.
    pub max_file_chars: usize,
    /// Candidate selection stops after this many files.
    pub max_files: usize,
    /// Allowed file extensions, without the leading dot.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub timeout_secs: u64,
    /// Truncate captured git stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for DevmateConfig {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            llm: LlmConfig::default(),
            github: GithubConfig::default(),
            context: ContextConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            per_page: 100,
            timeout_secs: None,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_file_chars: 4_000,
            max_files: 10,
            extensions: ["py", "rs", "md", "txt"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DevmateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must be non-empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("llm.temperature must be within 0.0..=2.0"));
        }
        if self.llm.timeout_secs == Some(0) {
            return Err(anyhow!("llm.timeout_secs must be > 0 when set"));
        }
        if self.github.timeout_secs == Some(0) {
            return Err(anyhow!("github.timeout_secs must be > 0 when set"));
        }
        if self.github.per_page == 0 || self.github.per_page > 100 {
            return Err(anyhow!("github.per_page must be within 1..=100"));
        }
        if self.context.max_file_chars == 0 {
            return Err(anyhow!("context.max_file_chars must be > 0"));
        }
        if self.context.max_files == 0 {
            return Err(anyhow!("context.max_files must be > 0"));
        }
        if self.context.extensions.is_empty()
            || self.context.extensions.iter().any(|e| e.trim().is_empty())
        {
            return Err(anyhow!("context.extensions must be a non-empty list of names"));
        }
        if self.git.timeout_secs == 0 {
            return Err(anyhow!("git.timeout_secs must be > 0"));
        }
        if self.git.output_limit_bytes == 0 {
            return Err(anyhow!("git.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DevmateConfig::default()`.
pub fn load_config(path: &Path) -> Result<DevmateConfig> {
    if !path.exists() {
        let cfg = DevmateConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DevmateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Secrets read from the environment. Empty values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field("github_token", &self.github_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_var(OPENAI_API_KEY_VAR),
            github_token: non_empty_var(GITHUB_TOKEN_VAR),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Everything a run needs to know about its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: DevmateConfig,
    pub credentials: Credentials,
    /// Directory relative paths resolve against (files, git, context).
    pub workdir: PathBuf,
}

impl Settings {
    pub fn new(config: DevmateConfig, credentials: Credentials, workdir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            credentials,
            workdir: workdir.into(),
        }
    }

    /// Load `config_path` (or `<workdir>/devmate.toml`) and credentials from the environment.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(workdir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) if !path.exists() => {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            Some(path) => path.to_path_buf(),
            None => workdir.join(CONFIG_FILE_NAME),
        };
        let mut config = load_config(&path)?;
        if let Some(env) = non_empty_var(ENV_VAR) {
            config.env = env;
        }
        Ok(Self::new(config, Credentials::from_env(), workdir))
    }

    pub fn env(&self) -> &str {
        &self.config.env
    }

    /// The text-generation API key, or a configuration error naming the variable.
    pub fn require_openai_key(&self) -> Result<&str, DevmateError> {
        self.credentials
            .openai_api_key
            .as_deref()
            .ok_or_else(|| missing_credential(OPENAI_API_KEY_VAR))
    }

    /// The GitHub token, or a configuration error naming the variable.
    pub fn require_github_token(&self) -> Result<&str, DevmateError> {
        self.credentials
            .github_token
            .as_deref()
            .ok_or_else(|| missing_credential(GITHUB_TOKEN_VAR))
    }
}

pub(crate) fn missing_credential(var: &str) -> DevmateError {
    DevmateError::Configuration(format!(
        "{var} is not set; export it or add it to your environment"
    ))
}
