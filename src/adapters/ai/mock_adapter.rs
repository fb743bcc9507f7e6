//! Mock analyst adapter for testing without API calls.
//!
//! Plays back a canned reconciliation stream and returns hardcoded
//! insight responses. Simulates network latency with configurable delay.

use crate::domain::{DomainError, LedgerDocument, PriceEstimate, TrendSummary};
use crate::ports::LedgerAnalystPort;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Mock analyst.
///
/// The reconciliation script ends with one valid single-line JSON result so
/// the full pipeline (classify, capture, terminal event, export) can be
/// exercised offline.
pub struct MockAnalystAdapter {
    /// Simulated network delay in milliseconds, applied per chunk.
    delay_ms: u64,
}

impl MockAnalystAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn script(party_a: &LedgerDocument, party_b: &LedgerDocument) -> Vec<String> {
        vec![
            format!(
                "[MOCK] Reading {} ({} bytes) and {} ({} bytes)...",
                party_a.filename,
                party_a.len(),
                party_b.filename,
                party_b.len()
            ),
            "[MOCK] Matching transactions across both ledgers...".to_string(),
            "[MOCK] Cross-checking one-sided entries...".to_string(),
            concat!(
                r#"{"summary":"[MOCK] 2 matched transactions, 1 discrepancy on each side.","#,
                r#""matches":[{"date":"2024-01-05","description":"Invoice 1001","amount":500},"#,
                r#"{"date":"2024-01-12","description":"Invoice 1002","amount":220.4}],"#,
                r#""partyADiscrepancies":[{"date":"2024-01-20","description":"Bank fee","amount":12.5}],"#,
                r#""partyBDiscrepancies":[{"date":"2024-01-22","description":"Refund 88","amount":75}]}"#
            )
            .to_string(),
        ]
    }
}

impl Default for MockAnalystAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerAnalystPort for MockAnalystAdapter {
    async fn reconcile(
        &self,
        party_a: &LedgerDocument,
        party_b: &LedgerDocument,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        info!(
            party_a = %party_a.filename,
            party_b = %party_b.filename,
            "[MOCK] Simulating reconciliation stream"
        );

        for chunk in Self::script(party_a, party_b) {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            if chunk_tx.send(chunk).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    async fn estimate_price(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<PriceEstimate, DomainError> {
        info!(
            product,
            csv_len = history_csv.len(),
            "[MOCK] Simulating price estimate"
        );
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        // Rough anchor so the number tracks the data: last row's price.
        let last_price = history_csv
            .lines()
            .last()
            .and_then(|line| line.split(';').nth(2))
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(10.0);

        Ok(PriceEstimate {
            product: product.to_string(),
            estimated_price: last_price * 1.05,
            horizon: "next 30 days".to_string(),
            rationale: "[MOCK] Last observed price plus a 5% drift. \
                        Configure a real AI API key for production estimates."
                .to_string(),
        })
    }

    async fn summarize_trends(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<TrendSummary, DomainError> {
        info!(
            product,
            csv_len = history_csv.len(),
            "[MOCK] Simulating trend summary"
        );
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let rows = history_csv.lines().count().saturating_sub(1);
        Ok(TrendSummary {
            summary: format!(
                "[MOCK] Simulated trend summary over {rows} recorded rates for {product}. \
                 In production the LLM would describe direction, volatility, and drivers."
            ),
            outliers: vec!["[MOCK] No outlier detection without a real model".to_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{classify_chunk, ChunkClass, PartyLabel};

    #[tokio::test]
    async fn script_ends_with_a_valid_result_chunk() {
        let a = LedgerDocument::new(PartyLabel::PartyA, "a.pdf", vec![1, 2]);
        let b = LedgerDocument::new(PartyLabel::PartyB, "b.pdf", vec![3]);
        let script = MockAnalystAdapter::script(&a, &b);

        let last = script.last().unwrap();
        assert!(matches!(
            classify_chunk(last),
            ChunkClass::ResultCandidate(_)
        ));
        for chunk in &script[..script.len() - 1] {
            assert!(matches!(classify_chunk(chunk), ChunkClass::Progress(_)));
        }
    }

    #[tokio::test]
    async fn reconcile_delivers_script_in_order() {
        let adapter = MockAnalystAdapter::with_delay(1);
        let a = LedgerDocument::new(PartyLabel::PartyA, "a.pdf", vec![1]);
        let b = LedgerDocument::new(PartyLabel::PartyB, "b.pdf", vec![2]);
        let (tx, mut rx) = mpsc::channel(8);

        adapter.reconcile(&a, &b, tx).await.unwrap();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].contains("a.pdf"));
        assert!(chunks[3].starts_with('{'));
    }

    #[tokio::test]
    async fn mock_estimate_tracks_last_price() {
        let adapter = MockAnalystAdapter::with_delay(1);
        let csv = "Date;Product;UnitPrice;Supplier\n2024-01-01;Steel rod;10;Acme\n2024-02-01;Steel rod;20;Acme";
        let estimate = adapter.estimate_price("Steel rod", csv).await.unwrap();
        assert_eq!(estimate.estimated_price, 21.0);
    }
}
