//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. All variants are
//! recoverable at the application boundary: the caller can restart a
//! reconciliation run or retry an export.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// The hosted model call failed or the transport broke mid-stream.
    #[error("generation backend error: {0}")]
    Generation(String),

    /// The chunk stream completed normally but no chunk ever validated as a
    /// full reconciliation result. Distinct from `Generation`: the stream
    /// itself succeeded.
    #[error("analysis finished without producing a reconciliation result")]
    NoResult,

    /// Credential missing, expired, or rejected by the spreadsheet service.
    /// Message is user-actionable.
    #[error("export authorization failed: {0}")]
    ExportAuth(String),

    /// The spreadsheet service rejected the write. Retry is the caller's
    /// decision.
    #[error("spreadsheet service error: {0}")]
    ExportService(String),

    #[error("repository error: {0}")]
    Repo(String),

    /// Ledger document could not be read or encoded.
    #[error("ledger document error: {0}")]
    Document(String),

    #[error("input error: {0}")]
    Input(String),
}
