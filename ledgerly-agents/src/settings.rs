use crate::llm::{default_headers, LlmClientConfig, DEFAULT_BASE_URL};
use crate::statement_extractor::{
    ExtractionOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The `[llm]` section shared by the API server and the CLI
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub json_mode: bool,
    pub default_headers: BTreeMap<String, String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: true,
            default_headers: default_headers(),
        }
    }
}

impl LlmSettings {
    /// Fills an unset API key or model from `OPENROUTER_API_KEY` / `OPENROUTER_MODEL`.
    pub fn with_env_fallbacks(self) -> Self {
        self.with_fallbacks(|name| std::env::var(name).ok())
    }

    pub fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if is_blank(&self.api_key) {
            self.api_key = lookup("OPENROUTER_API_KEY");
        }
        if is_blank(&self.model) {
            self.model = lookup("OPENROUTER_MODEL");
        }
        self
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn client_config(&self) -> LlmClientConfig {
        LlmClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            default_headers: self.default_headers.clone(),
        }
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            model: self.model().to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: self.json_mode,
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub fn default_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("ledgerly").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

/// Layers the TOML file (optional) under `LEDGERLY_*` environment overrides,
/// e.g. `LEDGERLY_LLM__API_KEY` or `LEDGERLY_SERVER__PORT`.
pub fn build_config(path: &Path) -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::from(path.to_path_buf()).required(false))
        .add_source(
            Environment::with_prefix("LEDGERLY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}
