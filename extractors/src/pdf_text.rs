use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfTextError {
    #[error("PDF file is empty")]
    Empty,

    #[error("Failed to read PDF: {0}")]
    Parse(String),
}

/// Source of raw statement text.
///
/// Scanned or badly encoded PDFs come back as garbled text rather than an
/// error; only unreadable files fail.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfTextError>;
}

/// Text extraction backed by the `pdf-extract` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractBackend;

impl PdfTextExtractor for PdfExtractBackend {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfTextError> {
        if bytes.is_empty() {
            return Err(PdfTextError::Empty);
        }
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfTextError::Parse(e.to_string()))
    }
}
