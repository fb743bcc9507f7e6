//! OpenAI-compatible adapter for ledger analysis.
//!
//! Supports OpenAI API, Azure OpenAI, and local OpenAI-compatible servers.
//! Implements `LedgerAnalystPort`: a streamed (SSE) reconciliation request
//! carrying both ledger PDFs, and non-streaming JSON calls for price
//! estimation and trend summaries.

use crate::domain::{DomainError, LedgerDocument, PriceEstimate, TrendSummary};
use crate::ports::LedgerAnalystPort;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// OpenAI-compatible analyst adapter.
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    /// Create a new adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://api.openai.com/v1/chat/completions")
    /// * `api_key` - API key (can be empty for local servers)
    /// * `model` - Model name (e.g., "gpt-4o-mini")
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    /// Fixed instruction prompt for reconciliation runs.
    ///
    /// Line discipline matters downstream: each progress update goes on its
    /// own line, and the run must end with exactly one single-line JSON
    /// object and no trailing text.
    fn reconcile_system_prompt() -> &'static str {
        r#"You are an experienced accountant reconciling two business ledgers.

You are given two ledger PDFs: "Party A" and "Party B". Match transactions
that appear in both ledgers and identify transactions present in only one.

## How to respond
1. While you work, narrate your progress in short human-readable updates.
   Write each update on its own line. Do not wrap updates in JSON.
2. When you are done, output EXACTLY ONE JSON object on a single line,
   matching this schema, and then stop. No markdown fences, no text after
   the JSON.

{
  "summary": "One-paragraph reconciliation summary",
  "matches": [
    {"date": "YYYY-MM-DD", "description": "string", "amount": 123.45}
  ],
  "partyADiscrepancies": [
    {"date": "YYYY-MM-DD", "description": "string", "amount": 123.45}
  ],
  "partyBDiscrepancies": [
    {"date": "YYYY-MM-DD", "description": "string", "amount": 123.45}
  ]
}

Transactions in "matches" must exist in both ledgers. Each discrepancy list
holds transactions found only in that party's ledger. Use empty arrays when
a list has no entries."#
    }

    fn estimate_system_prompt() -> &'static str {
        r#"You are a purchasing analyst. You receive a product's purchase-rate
history as semicolon-delimited CSV (Date;Product;UnitPrice;Supplier), oldest
first. Estimate the unit price the buyer should expect over the next 30 days.

You MUST respond with valid JSON only. No markdown, no explanations outside
JSON:

{
  "estimated_price": 123.45,
  "horizon": "next 30 days",
  "rationale": "Short justification grounded in the observed series"
}"#
    }

    fn trends_system_prompt() -> &'static str {
        r#"You are a purchasing analyst. You receive a product's purchase-rate
history as semicolon-delimited CSV (Date;Product;UnitPrice;Supplier), oldest
first. Summarize the price trend and call out outlier purchases.

You MUST respond with valid JSON only. No markdown, no explanations outside
JSON:

{
  "summary": "2-3 sentence trend summary",
  "outliers": ["one entry per outlier purchase, citing date and price"]
}

If there are no outliers, return an empty array."#
    }

    /// Sanitize JSON response from LLM.
    ///
    /// LLMs sometimes wrap JSON in markdown code blocks. This strips them.
    fn sanitize_json(raw_text: &str) -> String {
        let trimmed = raw_text.trim();

        if trimmed.starts_with("```") {
            let without_prefix = if trimmed.starts_with("```json") {
                trimmed.strip_prefix("```json").unwrap_or(trimmed)
            } else {
                trimmed.strip_prefix("```").unwrap_or(trimmed)
            };

            if let Some(end_idx) = without_prefix.rfind("```") {
                return without_prefix[..end_idx].trim().to_string();
            }
            return without_prefix.trim().to_string();
        }

        if let Some(start) = trimmed.find('{') {
            if let Some(end) = trimmed.rfind('}') {
                if start < end {
                    return trimmed[start..=end].to_string();
                }
            }
        }

        trimmed.to_string()
    }

    /// One non-streaming completion call; returns the first choice's content.
    async fn completion(&self, request: &ChatRequest) -> Result<String, DomainError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::Generation(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API returned error");
            return Err(DomainError::Generation(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Generation(format!("failed to parse API response: {e}")))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DomainError::Generation("no response choices returned".to_string()))
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart {
    Text { text: String },
    File { file: FileData },
}

#[derive(Serialize)]
struct FileData {
    filename: String,
    file_data: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API response structure (non-streaming).
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageBody,
}

#[derive(Deserialize)]
struct MessageBody {
    content: String,
}

/// One SSE event payload of a streamed completion.
#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parsed estimate response (matches our JSON schema).
#[derive(Deserialize)]
struct LlmEstimate {
    estimated_price: f64,
    #[serde(default)]
    horizon: Option<String>,
    rationale: String,
}

#[derive(Deserialize)]
struct LlmTrends {
    summary: String,
    #[serde(default)]
    outliers: Vec<String>,
}

/// Reassembles SSE delta fragments into newline-delimited chunks.
///
/// The instruction prompt pins one narration per line and a single-line
/// final JSON object, so complete lines are the natural chunk unit to hand
/// to the classifier. Blank lines are dropped.
struct LineAssembler {
    buf: String,
}

impl LineAssembler {
    fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Feed a delta fragment; returns the complete lines it closed.
    fn push(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.trim().is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Remaining text after the stream ends (final line often has no
    /// trailing newline).
    fn finish(self) -> Option<String> {
        if self.buf.trim().is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

#[async_trait::async_trait]
impl LedgerAnalystPort for OpenAiAdapter {
    async fn reconcile(
        &self,
        party_a: &LedgerDocument,
        party_b: &LedgerDocument,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        info!(
            model = %self.model,
            party_a_bytes = party_a.len(),
            party_b_bytes = party_b.len(),
            "opening reconciliation stream"
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(Self::reconcile_system_prompt().to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: format!(
                                "Reconcile these two ledgers. The first file is {} ({}), \
                                 the second is {} ({}).",
                                party_a.label, party_a.filename, party_b.label, party_b.filename
                            ),
                        },
                        ContentPart::File {
                            file: FileData {
                                filename: party_a.filename.clone(),
                                file_data: party_a.as_data_uri(),
                            },
                        },
                        ContentPart::File {
                            file: FileData {
                                filename: party_b.filename.clone(),
                                file_data: party_b.as_data_uri(),
                            },
                        },
                    ]),
                },
            ],
            temperature: 0.2,
            response_format: None,
            stream: true,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Generation(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "AI API refused the stream");
            return Err(DomainError::Generation(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let mut body = response.bytes_stream();
        let mut sse_buf: Vec<u8> = Vec::new();
        let mut assembler = LineAssembler::new();
        let mut chunks_sent = 0usize;

        'stream: while let Some(piece) = body.next().await {
            let piece = piece
                .map_err(|e| DomainError::Generation(format!("stream transport failed: {e}")))?;
            sse_buf.extend_from_slice(&piece);

            while let Some(pos) = sse_buf.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = sse_buf.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim_end_matches(['\n', '\r']);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim_start();
                if data.is_empty() {
                    continue;
                }
                if data == "[DONE]" {
                    break 'stream;
                }

                let event: StreamChunk = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        debug!(error = %e, "skipping unparseable SSE event");
                        continue;
                    }
                };

                let Some(content) = event
                    .choices
                    .first()
                    .and_then(|c| c.delta.content.as_deref())
                else {
                    continue;
                };

                for chunk in assembler.push(content) {
                    if chunk_tx.send(chunk).await.is_err() {
                        debug!("chunk receiver dropped, stopping stream read");
                        return Ok(());
                    }
                    chunks_sent += 1;
                }
            }
        }

        if let Some(rest) = assembler.finish() {
            if chunk_tx.send(rest).await.is_ok() {
                chunks_sent += 1;
            }
        }

        info!(chunks_sent, "reconciliation stream finished");
        Ok(())
    }

    async fn estimate_price(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<PriceEstimate, DomainError> {
        info!(product, csv_len = history_csv.len(), "requesting price estimate");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(Self::estimate_system_prompt().to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Text(format!(
                        "Estimate the future unit price of {product:?} from this history:\n\n{history_csv}"
                    )),
                },
            ],
            temperature: 0.3,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: false,
        };

        let raw = self.completion(&request).await?;
        let clean = Self::sanitize_json(&raw);
        let estimate: LlmEstimate = serde_json::from_str(&clean).map_err(|e| {
            warn!(error = %e, json = %clean.chars().take(200).collect::<String>(), "estimate JSON parse failed");
            DomainError::Generation(format!("failed to parse estimate JSON: {e}"))
        })?;

        Ok(PriceEstimate {
            product: product.to_string(),
            estimated_price: estimate.estimated_price,
            horizon: estimate.horizon.unwrap_or_else(|| "next 30 days".to_string()),
            rationale: estimate.rationale,
        })
    }

    async fn summarize_trends(
        &self,
        product: &str,
        history_csv: &str,
    ) -> Result<TrendSummary, DomainError> {
        info!(product, csv_len = history_csv.len(), "requesting trend summary");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(Self::trends_system_prompt().to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Text(format!(
                        "Summarize the rate trend for {product:?}:\n\n{history_csv}"
                    )),
                },
            ],
            temperature: 0.3,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: false,
        };

        let raw = self.completion(&request).await?;
        let clean = Self::sanitize_json(&raw);
        let trends: LlmTrends = serde_json::from_str(&clean).map_err(|e| {
            warn!(error = %e, json = %clean.chars().take(200).collect::<String>(), "trends JSON parse failed");
            DomainError::Generation(format!("failed to parse trend JSON: {e}"))
        })?;

        Ok(TrendSummary {
            summary: trends.summary,
            outliers: trends.outliers,
        })
    }
}
