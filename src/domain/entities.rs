//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/database types here — these are mapped from adapters.

use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded purchase rate for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRate {
    pub product: String,
    pub date: NaiveDate,
    pub unit_price: f64,
    pub supplier: Option<String>,
}

/// Which side of the reconciliation a ledger belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyLabel {
    PartyA,
    PartyB,
}

impl std::fmt::Display for PartyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyLabel::PartyA => write!(f, "Party A"),
            PartyLabel::PartyB => write!(f, "Party B"),
        }
    }
}

/// An uploaded ledger: opaque PDF bytes plus a party label.
///
/// Created transiently per reconciliation request, never persisted.
#[derive(Debug, Clone)]
pub struct LedgerDocument {
    pub label: PartyLabel,
    pub filename: String,
    data: Vec<u8>,
}

impl LedgerDocument {
    pub fn new(label: PartyLabel, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            label,
            filename: filename.into(),
            data,
        }
    }

    /// Encode the payload as a `data:` URI for transport to the generation
    /// backend.
    pub fn as_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:application/pdf;base64,{encoded}")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single ledger transaction as reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// The structured outcome of one reconciliation run.
///
/// `matches` conceptually exist in both ledgers; discrepancy lists are
/// single-sided. The model is trusted for cross-referential correctness —
/// this type only pins the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub summary: String,
    pub matches: Vec<Transaction>,
    pub party_a_discrepancies: Vec<Transaction>,
    pub party_b_discrepancies: Vec<Transaction>,
}

/// One event of the analyze stream, in the wire shape the caller parses:
/// `{"progress": "..."}` while analysis proceeds, then at most one
/// `{"result": {...}}` terminal event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileEvent {
    Progress(String),
    Result(ReconciliationResult),
}

/// AI price estimate for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub product: String,
    pub estimated_price: f64,
    pub horizon: String,
    pub rationale: String,
}

/// AI trend/outlier summary over recorded rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub summary: String,
    pub outliers: Vec<String>,
}

/// Handle to an exported spreadsheet report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetReport {
    pub sheet_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> ReconciliationResult {
        ReconciliationResult {
            summary: "2 matches".to_string(),
            matches: vec![Transaction {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: "Invoice 1".to_string(),
                amount: 500.0,
            }],
            party_a_discrepancies: vec![],
            party_b_discrepancies: vec![],
        }
    }

    #[test]
    fn result_serializes_with_wire_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert!(json.get("partyADiscrepancies").is_some());
        assert!(json.get("partyBDiscrepancies").is_some());
        assert_eq!(json["matches"][0]["date"], "2024-01-01");
        assert_eq!(json["matches"][0]["amount"], 500.0);
    }

    #[test]
    fn progress_event_wire_shape() {
        let ev = ReconcileEvent::Progress("Analyzing...".to_string());
        assert_eq!(
            serde_json::to_value(&ev).unwrap(),
            serde_json::json!({"progress": "Analyzing..."})
        );
    }

    #[test]
    fn result_event_wire_shape() {
        let ev = ReconcileEvent::Result(sample_result());
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["result"]["summary"], "2 matches");
    }

    #[test]
    fn data_uri_has_pdf_prefix() {
        let doc = LedgerDocument::new(PartyLabel::PartyA, "a.pdf", vec![0x25, 0x50, 0x44, 0x46]);
        let uri = doc.as_data_uri();
        assert!(uri.starts_with("data:application/pdf;base64,"));
        assert!(uri.len() > "data:application/pdf;base64,".len());
    }
}
