use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::conversation::ContextPolicy;
use crate::utils::url::validate_base_url;

pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the OpenAI-compatible API (e.g., "https://api.openai.com/v1")
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    /// Upper bound on generated tokens per response
    pub max_tokens: Option<u32>,
    /// Context sent with each request: "full-history" or "single-turn"
    pub context: Option<ContextPolicy>,
    /// Where named transcripts are stored; defaults to the platform data dir
    pub transcripts_dir: Option<PathBuf>,
}

/// Keys accepted by `sillage set` / `sillage unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BaseUrl,
    DefaultModel,
    MaxTokens,
    Context,
    TranscriptsDir,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::BaseUrl,
        ConfigKey::DefaultModel,
        ConfigKey::MaxTokens,
        ConfigKey::Context,
        ConfigKey::TranscriptsDir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::DefaultModel => "default-model",
            ConfigKey::MaxTokens => "max-tokens",
            ConfigKey::Context => "context",
            ConfigKey::TranscriptsDir => "transcripts-dir",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| {
                let known: Vec<_> = ConfigKey::ALL.iter().map(|key| key.as_str()).collect();
                format!("Unknown config key: {value} (known: {})", known.join(", "))
            })
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn context_policy(&self) -> ContextPolicy {
        self.context.unwrap_or_default()
    }

    /// Parses and stores `value` under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {}", key.as_str()));
        }
        match key {
            ConfigKey::BaseUrl => self.base_url = Some(validate_base_url(value)?),
            ConfigKey::DefaultModel => self.default_model = Some(value.to_string()),
            ConfigKey::MaxTokens => {
                let tokens = value
                    .parse::<u32>()
                    .ok()
                    .filter(|tokens| *tokens > 0)
                    .ok_or_else(|| format!("max-tokens must be a positive integer, got '{value}'"))?;
                self.max_tokens = Some(tokens);
            }
            ConfigKey::Context => self.context = Some(value.parse()?),
            ConfigKey::TranscriptsDir => self.transcripts_dir = Some(PathBuf::from(value)),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::DefaultModel => self.default_model = None,
            ConfigKey::MaxTokens => self.max_tokens = None,
            ConfigKey::Context => self.context = None,
            ConfigKey::TranscriptsDir => self.transcripts_dir = None,
        }
    }
}
