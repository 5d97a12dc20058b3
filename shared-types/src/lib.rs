use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod transaction;

pub use transaction::{ExtractionResult, TransactionRecord, TransactionType, UploadResponse};

/// Error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Response of the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HealthResponse {
    pub status: String,
}
