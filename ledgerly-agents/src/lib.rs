pub mod llm;
pub mod settings;
pub mod statement_extractor;

pub use llm::{LlmClient, LlmClientConfig, LlmError, OpenAiCompatibleClient};
pub use settings::LlmSettings;
pub use statement_extractor::{ExtractionOptions, StatementExtractor};
