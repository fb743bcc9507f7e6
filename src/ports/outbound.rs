//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    DomainError, LedgerDocument, PriceEstimate, PurchaseRate, ReconciliationResult, SheetReport,
    TrendSummary,
};
use tokio::sync::mpsc;

/// Generation backend gateway. One prompt-completion request per call;
/// reconciliation streams raw text chunks back through a sender.
#[async_trait::async_trait]
pub trait LedgerAnalystPort: Send + Sync {
    /// Open one generation request carrying both ledgers and the fixed
    /// reconciliation instructions. Every raw chunk the backend delivers is
    /// pushed into `chunk_tx` in arrival order; chunk boundaries carry no
    /// semantic meaning. Returns `Ok(())` when the stream ends cleanly,
    /// `Err(Generation)` when the call or transport fails. The sender is
    /// dropped on return either way.
    async fn reconcile(
        &self,
        party_a: &LedgerDocument,
        party_b: &LedgerDocument,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), DomainError>;

    /// Estimate a future price for a product from its rate history
    /// (semicolon-delimited CSV context).
    async fn estimate_price(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<PriceEstimate, DomainError>;

    /// Summarize trends and outliers in a product's rate history.
    async fn summarize_trends(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<TrendSummary, DomainError>;
}

/// Repository port. Persist and query purchase rates.
#[async_trait::async_trait]
pub trait RateRepoPort: Send + Sync {
    /// Append one purchase-rate record.
    async fn save_rate(&self, rate: &PurchaseRate) -> Result<(), DomainError>;

    /// All distinct products with at least one recorded rate.
    async fn list_products(&self) -> Result<Vec<String>, DomainError>;

    /// Rate history for a product, oldest first, at most `limit` rows.
    async fn get_rates(&self, product: &str, limit: u32) -> Result<Vec<PurchaseRate>, DomainError>;
}

/// Port for creating spreadsheet reports in an external service.
///
/// Not idempotent: every call creates one new external resource.
#[async_trait::async_trait]
pub trait SheetExportPort: Send + Sync {
    /// Create one spreadsheet from a sealed reconciliation result using the
    /// caller's bearer credential. Returns the shareable URL.
    ///
    /// # Errors
    /// `ExportAuth` when the credential is rejected; `ExportService` for any
    /// other service rejection.
    async fn create_report(
        &self,
        result: &ReconciliationResult,
        credential: &str,
    ) -> Result<SheetReport, DomainError>;
}
