//! Phase 2 of the reconcile contract: explicit spreadsheet export.
//!
//! Takes a sealed result and a caller-supplied bearer credential. Every
//! call creates one external resource; no retry, no deduplication — the
//! caller decides whether to call again.

use crate::domain::{DomainError, ReconciliationResult, SheetReport};
use crate::ports::SheetExportPort;
use std::sync::Arc;
use tracing::info;

pub struct ExportService {
    sheets: Arc<dyn SheetExportPort>,
}

impl ExportService {
    pub fn new(sheets: Arc<dyn SheetExportPort>) -> Self {
        Self { sheets }
    }

    /// Create one spreadsheet report from a reconciliation result.
    ///
    /// A missing credential is rejected before any call leaves the process.
    pub async fn export(
        &self,
        result: &ReconciliationResult,
        credential: &str,
    ) -> Result<SheetReport, DomainError> {
        if credential.trim().is_empty() {
            return Err(DomainError::ExportAuth(
                "no spreadsheet credential provided; re-authenticate and retry".to_string(),
            ));
        }

        let report = self.sheets.create_report(result, credential).await?;
        info!(url = %report.sheet_url, "reconciliation report exported");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSheets {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SheetExportPort for CountingSheets {
        async fn create_report(
            &self,
            _result: &ReconciliationResult,
            _credential: &str,
        ) -> Result<SheetReport, DomainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SheetReport {
                sheet_url: format!("https://sheets.example/report/{n}"),
            })
        }
    }

    fn result() -> ReconciliationResult {
        ReconciliationResult {
            summary: "done".to_string(),
            matches: vec![],
            party_a_discrepancies: vec![],
            party_b_discrepancies: vec![],
        }
    }

    #[tokio::test]
    async fn blank_credential_is_rejected_before_the_port() {
        let sheets = Arc::new(CountingSheets {
            calls: AtomicUsize::new(0),
        });
        let service = ExportService::new(Arc::clone(&sheets) as Arc<dyn SheetExportPort>);

        let err = service.export(&result(), "   ").await.unwrap_err();
        assert!(matches!(err, DomainError::ExportAuth(_)));
        assert_eq!(sheets.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exporting_twice_creates_two_distinct_reports() {
        let sheets = Arc::new(CountingSheets {
            calls: AtomicUsize::new(0),
        });
        let service = ExportService::new(Arc::clone(&sheets) as Arc<dyn SheetExportPort>);
        let result = result();

        let first = service.export(&result, "token").await.unwrap();
        let second = service.export(&result, "token").await.unwrap();

        assert_ne!(first.sheet_url, second.sheet_url);
        assert_eq!(sheets.calls.load(Ordering::SeqCst), 2);
    }
}
