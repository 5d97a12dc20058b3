//! Extractors Crate
//!
//! Synchronous building blocks that turn bank statement text and unreliable
//! model output into validated transaction records.
//!
//! # Modules
//!
//! - `number`: lenient amount parsing (`"1,234.56CR"` → `1234.56`)
//! - `json_recovery`: locating and repairing the JSON object in a model response
//! - `transactions`: mapping the parsed object onto `TransactionRecord`s
//! - `csv_export`: CSV rendering of a record batch
//! - `pdf_text`: raw text extraction from PDF bytes
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{normalize_transactions, recover_json};
//!
//! let parsed = recover_json(&completion_text)?;
//! let records = normalize_transactions(&parsed);
//! ```

pub mod csv_export;
pub mod json_recovery;
pub mod number;
pub mod pdf_text;
pub mod transactions;

pub use csv_export::{render_csv, CSV_HEADERS};
pub use json_recovery::{recover_json, repair_json, JsonRecoveryError};
pub use number::{normalize_number, normalize_number_str};
pub use pdf_text::{PdfExtractBackend, PdfTextError, PdfTextExtractor};
pub use transactions::{normalize_transactions, normalize_transactions_with_stats, NormalizedBatch};
