use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Direction of money movement on a statement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Exact, case-sensitive match against the two accepted literals.
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "Credit" => Some(Self::Credit),
            "Debit" => Some(Self::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement line after normalization.
///
/// Only `amount` and `transaction_type` are guaranteed; everything else is
/// passed through from the model output without validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TransactionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,

    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub user_id: Option<String>,

    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: f64,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub category: Option<String>,

    pub balance: Option<f64>,
}

/// Envelope returned by the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ExtractionResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub transactions: Option<Vec<TransactionRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(transactions: Vec<TransactionRecord>) -> Self {
        Self {
            success: true,
            count: Some(transactions.len()),
            transactions: Some(transactions),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: None,
            transactions: None,
            error: Some(error.into()),
        }
    }

    /// Consumes the envelope, yielding the transactions or the error message.
    pub fn into_result(self) -> Result<Vec<TransactionRecord>, String> {
        if self.success {
            Ok(self.transactions.unwrap_or_default())
        } else {
            Err(self
                .error
                .unwrap_or_else(|| "Unknown extraction error".to_string()))
        }
    }
}

/// Successful response of the upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub transactions: Vec<TransactionRecord>,
    pub csv_url: String,
}
