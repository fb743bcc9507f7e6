//! AI price insight. Orchestrates rate history -> CSV context -> analyst.
//!
//! Coordinates between the repository (data) and the generation backend
//! (estimation and trend summaries).

use crate::adapters::ai::rates_to_csv;
use crate::domain::{DomainError, PriceEstimate, PurchaseRate, TrendSummary};
use crate::ports::{LedgerAnalystPort, RateRepoPort};
use crate::usecases::rate_service::HISTORY_LIMIT;
use std::sync::Arc;
use tracing::info;

pub struct InsightService {
    analyst: Arc<dyn LedgerAnalystPort>,
    repo: Arc<dyn RateRepoPort>,
}

impl InsightService {
    pub fn new(analyst: Arc<dyn LedgerAnalystPort>, repo: Arc<dyn RateRepoPort>) -> Self {
        Self { analyst, repo }
    }

    /// Estimate a future price for a product from its recorded history.
    pub async fn estimate_price(&self, product: &str) -> Result<PriceEstimate, DomainError> {
        let csv = self.history_context(product).await?;
        let estimate = self.analyst.estimate_price(product, &csv).await?;
        info!(
            product,
            estimated_price = estimate.estimated_price,
            "price estimate complete"
        );
        Ok(estimate)
    }

    /// Summarize rate trends and outliers for a product.
    pub async fn summarize_trends(&self, product: &str) -> Result<TrendSummary, DomainError> {
        let csv = self.history_context(product).await?;
        let summary = self.analyst.summarize_trends(product, &csv).await?;
        info!(
            product,
            outliers = summary.outliers.len(),
            "trend summary complete"
        );
        Ok(summary)
    }

    async fn history_context(&self, product: &str) -> Result<String, DomainError> {
        let rates = self.repo.get_rates(product, HISTORY_LIMIT).await?;
        if rates.is_empty() {
            return Err(DomainError::Input(format!(
                "no recorded rates for {product:?}"
            )));
        }
        info!(product, rows = rates.len(), "building rate history context");
        Self::rates_to_csv_string(&rates)
    }

    fn rates_to_csv_string(rates: &[PurchaseRate]) -> Result<String, DomainError> {
        rates_to_csv(rates).map_err(|e| DomainError::Input(format!("failed to generate CSV: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerDocument;
    use chrono::NaiveDate;
    use tokio::sync::mpsc;

    struct OneProductRepo {
        rates: Vec<PurchaseRate>,
    }

    #[async_trait::async_trait]
    impl RateRepoPort for OneProductRepo {
        async fn save_rate(&self, _rate: &PurchaseRate) -> Result<(), DomainError> {
            Ok(())
        }

        async fn list_products(&self) -> Result<Vec<String>, DomainError> {
            Ok(vec![])
        }

        async fn get_rates(
            &self,
            product: &str,
            _limit: u32,
        ) -> Result<Vec<PurchaseRate>, DomainError> {
            Ok(self
                .rates
                .iter()
                .filter(|r| r.product == product)
                .cloned()
                .collect())
        }
    }

    /// Records the CSV context it was handed.
    struct CapturingAnalyst {
        seen_csv: std::sync::Mutex<String>,
    }

    #[async_trait::async_trait]
    impl LedgerAnalystPort for CapturingAnalyst {
        async fn reconcile(
            &self,
            _party_a: &LedgerDocument,
            _party_b: &LedgerDocument,
            _chunk_tx: mpsc::Sender<String>,
        ) -> Result<(), DomainError> {
            unreachable!("not used by these tests")
        }

        async fn estimate_price(
            &self,
            product: &str,
            history_csv: &str,
        ) -> Result<PriceEstimate, DomainError> {
            *self.seen_csv.lock().unwrap() = history_csv.to_string();
            Ok(PriceEstimate {
                product: product.to_string(),
                estimated_price: 13.0,
                horizon: "next 30 days".to_string(),
                rationale: "steady upward drift".to_string(),
            })
        }

        async fn summarize_trends(
            &self,
            _product: &str,
            history_csv: &str,
        ) -> Result<TrendSummary, DomainError> {
            *self.seen_csv.lock().unwrap() = history_csv.to_string();
            Ok(TrendSummary {
                summary: "prices climbed".to_string(),
                outliers: vec!["2024-02-01 spike".to_string()],
            })
        }
    }

    fn rate(date: &str, price: f64) -> PurchaseRate {
        PurchaseRate {
            product: "Steel rod".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            unit_price: price,
            supplier: None,
        }
    }

    #[tokio::test]
    async fn estimate_builds_csv_context_from_history() {
        let analyst = Arc::new(CapturingAnalyst {
            seen_csv: std::sync::Mutex::new(String::new()),
        });
        let repo = Arc::new(OneProductRepo {
            rates: vec![rate("2024-01-01", 11.0), rate("2024-02-01", 12.5)],
        });
        let service = InsightService::new(
            Arc::clone(&analyst) as Arc<dyn LedgerAnalystPort>,
            repo,
        );

        let estimate = service.estimate_price("Steel rod").await.unwrap();
        assert_eq!(estimate.estimated_price, 13.0);

        let csv = analyst.seen_csv.lock().unwrap().clone();
        assert!(csv.starts_with("Date;Product;UnitPrice;Supplier"));
        assert!(csv.contains("2024-01-01"));
        assert!(csv.contains("12.5"));
    }

    #[tokio::test]
    async fn empty_history_is_an_input_error() {
        let analyst = Arc::new(CapturingAnalyst {
            seen_csv: std::sync::Mutex::new(String::new()),
        });
        let repo = Arc::new(OneProductRepo { rates: vec![] });
        let service = InsightService::new(analyst, repo);

        assert!(matches!(
            service.summarize_trends("Unknown").await,
            Err(DomainError::Input(_))
        ));
    }
}
