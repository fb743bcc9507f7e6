//! Purchase-rate recording. Thin validation over the repository port.

use crate::domain::{DomainError, PurchaseRate};
use crate::ports::RateRepoPort;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Upper bound on history rows handed to listings and LLM context.
pub const HISTORY_LIMIT: u32 = 500;

pub struct RateService {
    repo: Arc<dyn RateRepoPort>,
}

impl RateService {
    pub fn new(repo: Arc<dyn RateRepoPort>) -> Self {
        Self { repo }
    }

    /// Record one purchase rate after basic validation.
    pub async fn record_rate(
        &self,
        product: &str,
        date: NaiveDate,
        unit_price: f64,
        supplier: Option<String>,
    ) -> Result<(), DomainError> {
        let product = product.trim();
        if product.is_empty() {
            return Err(DomainError::Input("product name is empty".to_string()));
        }
        if !unit_price.is_finite() || unit_price <= 0.0 {
            return Err(DomainError::Input(format!(
                "unit price must be positive, got {unit_price}"
            )));
        }

        let rate = PurchaseRate {
            product: product.to_string(),
            date,
            unit_price,
            supplier: supplier.filter(|s| !s.trim().is_empty()),
        };
        self.repo.save_rate(&rate).await?;
        info!(product = %rate.product, price = rate.unit_price, "purchase rate recorded");
        Ok(())
    }

    /// All products with recorded rates.
    pub async fn products(&self) -> Result<Vec<String>, DomainError> {
        self.repo.list_products().await
    }

    /// Rate history for one product, oldest first.
    pub async fn price_history(&self, product: &str) -> Result<Vec<PurchaseRate>, DomainError> {
        self.repo.get_rates(product, HISTORY_LIMIT).await
    }
}
