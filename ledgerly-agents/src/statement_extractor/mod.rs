pub mod agent;
pub mod system_prompt;
pub mod types;

pub use agent::StatementExtractor;
pub use types::{ExtractionOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
