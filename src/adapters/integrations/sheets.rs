//! Spreadsheet adapter. Implements SheetExportPort by creating one
//! spreadsheet per call via the export service's REST API.

use crate::domain::{DomainError, ReconciliationResult, SheetReport, Transaction};
use crate::ports::SheetExportPort;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Spreadsheet REST adapter.
///
/// Each call creates a new spreadsheet titled "Ledger Reconciliation" with
/// one grid: summary first, then matched transactions and per-party
/// discrepancy sections. The bearer credential is supplied by the caller
/// per call; this adapter stores only the endpoint.
pub struct SheetsAdapter {
    client: Client,
    api_url: String,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "spreadsheetUrl")]
    spreadsheet_url: String,
}

impl SheetsAdapter {
    pub fn new(api_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.unwrap_or_else(|| DEFAULT_SHEETS_URL.to_string()),
        }
    }

    /// Flatten a result into grid rows.
    fn report_rows(result: &ReconciliationResult) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["Ledger Reconciliation Report".to_string()],
            vec!["Summary".to_string(), result.summary.clone()],
            vec![],
        ];

        Self::push_section(&mut rows, "Matched Transactions", &result.matches);
        Self::push_section(
            &mut rows,
            "Party A Discrepancies",
            &result.party_a_discrepancies,
        );
        Self::push_section(
            &mut rows,
            "Party B Discrepancies",
            &result.party_b_discrepancies,
        );
        rows
    }

    fn push_section(rows: &mut Vec<Vec<String>>, title: &str, transactions: &[Transaction]) {
        rows.push(vec![title.to_string()]);
        rows.push(vec![
            "Date".to_string(),
            "Description".to_string(),
            "Amount".to_string(),
        ]);
        if transactions.is_empty() {
            rows.push(vec!["(none)".to_string()]);
        }
        for tx in transactions {
            rows.push(vec![
                tx.date.format("%Y-%m-%d").to_string(),
                tx.description.clone(),
                format!("{:.2}", tx.amount),
            ]);
        }
        rows.push(vec![]);
    }

    fn grid_body(result: &ReconciliationResult) -> serde_json::Value {
        let row_data: Vec<serde_json::Value> = Self::report_rows(result)
            .into_iter()
            .map(|row| {
                let values: Vec<serde_json::Value> = row
                    .into_iter()
                    .map(|cell| {
                        serde_json::json!({"userEnteredValue": {"stringValue": cell}})
                    })
                    .collect();
                serde_json::json!({"values": values})
            })
            .collect();

        serde_json::json!({
            "properties": {"title": "Ledger Reconciliation"},
            "sheets": [{
                "properties": {"title": "Report"},
                "data": [{"startRow": 0, "startColumn": 0, "rowData": row_data}]
            }]
        })
    }
}

#[async_trait::async_trait]
impl SheetExportPort for SheetsAdapter {
    async fn create_report(
        &self,
        result: &ReconciliationResult,
        credential: &str,
    ) -> Result<SheetReport, DomainError> {
        let body = Self::grid_body(result);

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::ExportService(format!("request failed: {e}")))?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, "spreadsheet service rejected credential");
            return Err(DomainError::ExportAuth(format!(
                "credential rejected ({}); re-authenticate and retry: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::ExportService(format!(
                "spreadsheet API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let created: CreateResponse = res
            .json()
            .await
            .map_err(|e| DomainError::ExportService(format!("unexpected response body: {e}")))?;

        info!(url = %created.spreadsheet_url, "spreadsheet created");
        Ok(SheetReport {
            sheet_url: created.spreadsheet_url,
        })
    }
}
