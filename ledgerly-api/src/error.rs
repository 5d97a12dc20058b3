use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use extractors::PdfTextError;
use shared_types::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    Missing,

    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF text extraction failed: {0}")]
    Pdf(#[from] PdfTextError),

    #[error("PDF text extraction aborted")]
    Aborted,

    #[error("CSV rendering failed: {0}")]
    Csv(#[from] csv::Error),

    /// The pipeline ran but reported failure; the message is shown to clients
    #[error("{0}")]
    Extraction(String),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Missing => StatusCode::BAD_REQUEST,
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            UploadError::Missing | UploadError::TooLarge { .. } | UploadError::Extraction(_) => {
                self.to_string()
            }
            _ => "Error processing file".to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(message))
    }
}
