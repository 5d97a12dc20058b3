use crate::llm::LlmError;
use extractors::JsonRecoveryError;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "qwen/qwen3-235b-a22b-2507";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Per-call LLM parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request `response_format = json_object` from the provider
    pub json_mode: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: true,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("No text could be extracted from the document")]
    EmptyInput,

    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Failed to extract valid JSON structure from LLM output.")]
    Parse(#[from] JsonRecoveryError),
}
