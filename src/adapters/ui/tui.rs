//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Main menu loops over the application use cases; service failures are
//! printed and the menu continues.

use crate::domain::{
    DomainError, LedgerDocument, PartyLabel, PurchaseRate, ReconcileEvent, ReconciliationResult,
};
use crate::usecases::{ExportService, InsightService, RateService, ReconcileService};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, InquireError, Password, Select, Text};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const MENU_RECORD: &str = "Record purchase rate";
const MENU_HISTORY: &str = "Price history";
const MENU_ESTIMATE: &str = "Estimate future price";
const MENU_TRENDS: &str = "Summarize trends";
const MENU_RECONCILE: &str = "Reconcile ledgers";
const MENU_EXIT: &str = "Exit";

/// TUI adapter. Inquire prompts over the application services.
pub struct TuiInputPort {
    rates: Arc<RateService>,
    insight: Arc<InsightService>,
    reconcile: Arc<ReconcileService>,
    export: Arc<ExportService>,
    /// Pre-configured spreadsheet credential; prompted for when absent.
    sheets_token: Option<String>,
}

impl TuiInputPort {
    pub fn new(
        rates: Arc<RateService>,
        insight: Arc<InsightService>,
        reconcile: Arc<ReconcileService>,
        export: Arc<ExportService>,
        sheets_token: Option<String>,
    ) -> Self {
        Self {
            rates,
            insight,
            reconcile,
            export,
            sheets_token,
        }
    }

    async fn record_rate(&self) -> Result<(), DomainError> {
        let Some(product) = prompt(Text::new("Product:"))? else {
            return Ok(());
        };
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let Some(date_str) = prompt(Text::new("Purchase date (YYYY-MM-DD):").with_default(&today))?
        else {
            return Ok(());
        };
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|_| DomainError::Input(format!("not a YYYY-MM-DD date: {date_str}")))?;
        let Some(price_str) = prompt(Text::new("Unit price:"))? else {
            return Ok(());
        };
        let unit_price: f64 = price_str
            .trim()
            .parse()
            .map_err(|_| DomainError::Input(format!("not a number: {price_str}")))?;
        let Some(supplier) = prompt(Text::new("Supplier (optional):"))? else {
            return Ok(());
        };

        self.rates
            .record_rate(&product, date, unit_price, Some(supplier))
            .await?;
        println!("Recorded.");
        Ok(())
    }

    async fn pick_product(&self) -> Result<Option<String>, DomainError> {
        let products = self.rates.products().await?;
        if products.is_empty() {
            println!("No rates recorded yet.");
            return Ok(None);
        }
        prompt(Select::new("Product:", products))
    }

    async fn show_history(&self) -> Result<(), DomainError> {
        let Some(product) = self.pick_product().await? else {
            return Ok(());
        };
        let history = self.rates.price_history(&product).await?;
        println!("{:<12} {:>12}  {}", "Date", "Unit price", "Supplier");
        for PurchaseRate {
            date,
            unit_price,
            supplier,
            ..
        } in &history
        {
            println!(
                "{:<12} {:>12.2}  {}",
                date.format("%Y-%m-%d"),
                unit_price,
                supplier.as_deref().unwrap_or("-")
            );
        }
        println!("{} rows", history.len());
        Ok(())
    }

    async fn estimate(&self) -> Result<(), DomainError> {
        let Some(product) = self.pick_product().await? else {
            return Ok(());
        };
        let spinner = spinner("Estimating...");
        let outcome = self.insight.estimate_price(&product).await;
        spinner.finish_and_clear();

        let estimate = outcome?;
        println!(
            "{}: ~{:.2} over the {}",
            estimate.product, estimate.estimated_price, estimate.horizon
        );
        println!("{}", estimate.rationale);
        Ok(())
    }

    async fn trends(&self) -> Result<(), DomainError> {
        let Some(product) = self.pick_product().await? else {
            return Ok(());
        };
        let spinner = spinner("Summarizing...");
        let outcome = self.insight.summarize_trends(&product).await;
        spinner.finish_and_clear();

        let summary = outcome?;
        println!("{}", summary.summary);
        if !summary.outliers.is_empty() {
            println!("Outliers:");
            for outlier in &summary.outliers {
                println!("  - {outlier}");
            }
        }
        Ok(())
    }

    async fn reconcile_flow(&self) -> Result<(), DomainError> {
        let Some(path_a) = prompt(Text::new("Party A ledger PDF path:"))? else {
            return Ok(());
        };
        let Some(path_b) = prompt(Text::new("Party B ledger PDF path:"))? else {
            return Ok(());
        };

        let party_a = load_ledger(PartyLabel::PartyA, path_a.trim()).await?;
        let party_b = load_ledger(PartyLabel::PartyB, path_b.trim()).await?;

        let mut stream = self.reconcile.analyze(party_a, party_b);
        let spinner = spinner("Reconciling...");

        let mut result: Option<ReconciliationResult> = None;
        loop {
            match stream.next_event().await {
                Ok(Some(ReconcileEvent::Progress(text))) => {
                    spinner.set_message(text.clone());
                    spinner.println(format!("  {text}"));
                }
                Ok(Some(ReconcileEvent::Result(r))) => {
                    result = Some(r);
                }
                Ok(None) => break,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e);
                }
            }
        }
        spinner.finish_and_clear();

        let result = match result {
            Some(result) => result,
            // Unreachable in practice: a clean end without a result surfaces
            // DomainError::NoResult above. Kept so the match is total.
            None => return Err(DomainError::NoResult),
        };

        println!("{}", result.summary);
        println!(
            "{} matches, {} Party A discrepancies, {} Party B discrepancies",
            result.matches.len(),
            result.party_a_discrepancies.len(),
            result.party_b_discrepancies.len()
        );

        let Some(wants_export) =
            prompt(Confirm::new("Export to spreadsheet?").with_default(true))?
        else {
            return Ok(());
        };
        if !wants_export {
            return Ok(());
        }

        let credential = match &self.sheets_token {
            Some(token) => token.clone(),
            None => {
                match prompt(Password::new("Spreadsheet access token:").without_confirmation())? {
                    Some(token) => token,
                    None => return Ok(()),
                }
            }
        };

        let report = self.export.export(&result, &credential).await?;
        println!("Report created: {}", report.sheet_url);
        Ok(())
    }
}

#[async_trait]
impl crate::ports::InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let options = vec![
                MENU_RECORD,
                MENU_HISTORY,
                MENU_ESTIMATE,
                MENU_TRENDS,
                MENU_RECONCILE,
                MENU_EXIT,
            ];
            let Some(choice) = prompt(Select::new("What next?", options))? else {
                return Ok(());
            };

            let outcome = match choice {
                MENU_RECORD => self.record_rate().await,
                MENU_HISTORY => self.show_history().await,
                MENU_ESTIMATE => self.estimate().await,
                MENU_TRENDS => self.trends().await,
                MENU_RECONCILE => self.reconcile_flow().await,
                _ => return Ok(()),
            };

            if let Err(e) = outcome {
                warn!(error = %e, "menu action failed");
                println!("Error: {e}");
            }
        }
    }
}

/// Run an inquire prompt; Esc/Ctrl-C returns `None` (back to menu), other
/// failures map to DomainError.
fn prompt<T, P>(prompt: P) -> Result<Option<T>, DomainError>
where
    P: PromptOnce<T>,
{
    match prompt.prompt_once() {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Input(e.to_string())),
    }
}

/// Unifies the inquire prompt types behind one call.
trait PromptOnce<T> {
    fn prompt_once(self) -> Result<T, InquireError>;
}

impl PromptOnce<String> for Text<'_, '_> {
    fn prompt_once(self) -> Result<String, InquireError> {
        self.prompt()
    }
}

impl PromptOnce<String> for Password<'_> {
    fn prompt_once(self) -> Result<String, InquireError> {
        self.prompt()
    }
}

impl PromptOnce<bool> for Confirm<'_> {
    fn prompt_once(self) -> Result<bool, InquireError> {
        self.prompt()
    }
}

impl<T: std::fmt::Display> PromptOnce<T> for Select<'_, T> {
    fn prompt_once(self) -> Result<T, InquireError> {
        self.prompt()
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message(message);
    bar
}

async fn load_ledger(label: PartyLabel, path: &str) -> Result<LedgerDocument, DomainError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| DomainError::Document(format!("cannot read {path}: {e}")))?;
    if data.is_empty() {
        return Err(DomainError::Document(format!("{path} is empty")));
    }
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(LedgerDocument::new(label, filename, data))
}
