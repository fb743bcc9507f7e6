//! Chunk classification for the reconciliation stream.
//!
//! Each raw text chunk from the generation backend is either progress
//! narration or a candidate for the final structured result. The decision
//! is a heuristic: a trimmed chunk wrapped in a brace pair is parsed as
//! JSON and validated against the result shape; anything that falls short
//! degrades to narration. Mis-classification is never an error.

use crate::domain::entities::{ReconciliationResult, Transaction};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// Outcome of classifying one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkClass {
    /// Narration to forward to the caller as-is (original chunk text,
    /// untrimmed).
    Progress(String),
    /// A chunk that parsed and validated as a full reconciliation result.
    ResultCandidate(ReconciliationResult),
}

/// Classify one raw chunk. Pure function; no side effects.
///
/// Rule: trim whitespace; a chunk that starts with `{` and ends with `}` is
/// parsed as JSON and validated. Parse failure (incidental braces) and
/// valid-JSON-wrong-shape both fall back to progress. Everything else is
/// progress unconditionally.
pub fn classify_chunk(chunk: &str) -> ChunkClass {
    let trimmed = chunk.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return ChunkClass::Progress(chunk.to_string());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => match validate_result(&value) {
            Ok(result) => ChunkClass::ResultCandidate(result),
            Err(reason) => {
                debug!(%reason, "JSON-shaped chunk failed result validation, treating as narration");
                ChunkClass::Progress(chunk.to_string())
            }
        },
        Err(_) => ChunkClass::Progress(chunk.to_string()),
    }
}

/// Validate a parsed object graph against the reconciliation-result shape.
///
/// Required: `summary` string and the three transaction arrays. Unknown
/// extra fields are ignored. No partial acceptance: any missing field or
/// wrong type rejects the whole object. Coercion is limited to what the
/// schema allows — numeric strings for `amount`, scalar-to-string for
/// `description`.
pub fn validate_result(value: &Value) -> Result<ReconciliationResult, String> {
    let obj = value.as_object().ok_or("not a JSON object")?;

    let summary = obj
        .get("summary")
        .ok_or("missing field `summary`")?
        .as_str()
        .ok_or("`summary` is not a string")?
        .to_string();

    let matches = transactions_field(obj, "matches")?;
    let party_a_discrepancies = transactions_field(obj, "partyADiscrepancies")?;
    let party_b_discrepancies = transactions_field(obj, "partyBDiscrepancies")?;

    Ok(ReconciliationResult {
        summary,
        matches,
        party_a_discrepancies,
        party_b_discrepancies,
    })
}

fn transactions_field(
    obj: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Vec<Transaction>, String> {
    let arr = obj
        .get(field)
        .ok_or_else(|| format!("missing field `{field}`"))?
        .as_array()
        .ok_or_else(|| format!("`{field}` is not an array"))?;

    arr.iter()
        .enumerate()
        .map(|(i, v)| {
            parse_transaction(v).map_err(|reason| format!("`{field}[{i}]`: {reason}"))
        })
        .collect()
}

fn parse_transaction(value: &Value) -> Result<Transaction, String> {
    let obj = value.as_object().ok_or("not an object")?;

    let date_str = obj
        .get("date")
        .ok_or("missing `date`")?
        .as_str()
        .ok_or("`date` is not a string")?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| format!("`date` is not YYYY-MM-DD: {date_str:?}"))?;

    let description = coerce_description(obj.get("description").ok_or("missing `description`")?)?;
    let amount = coerce_amount(obj.get("amount").ok_or("missing `amount`")?)?;

    Ok(Transaction {
        date,
        description,
        amount,
    })
}

/// Scalar-to-string coercion for `description`.
fn coerce_description(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err("`description` is not a string".to_string()),
    }
}

/// Numeric coercion for `amount`: a JSON number, or a string that parses as
/// one.
fn coerce_amount(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or("`amount` is not finite".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("`amount` is not numeric: {s:?}")),
        _ => Err("`amount` is not a number".to_string()),
    }
}
