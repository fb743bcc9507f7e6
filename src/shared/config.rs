//! Application configuration. API credentials, paths.

use serde::Deserialize;

/// Default capacity for the reconciliation chunk channel. Bounded channel
/// provides backpressure: when full, the generation adapter suspends on
/// send().await until the classifier consumes.
pub const DEFAULT_CHUNK_QUEUE_SIZE: usize = 64;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key (e.g., OpenAI). Read from RATEBOOK_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from RATEBOOK_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from RATEBOOK_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Max chunks buffered between the generation adapter and the classifier
    /// (backpressure). Read from RATEBOOK_CHUNK_QUEUE_SIZE.
    #[serde(default)]
    pub chunk_queue_size: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Spreadsheet Export Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Spreadsheet-creation endpoint. Defaults to the Google Sheets API.
    /// Read from RATEBOOK_SHEETS_API_URL.
    #[serde(default)]
    pub sheets_api_url: Option<String>,

    /// Optional stored bearer token for exports. When unset the UI prompts
    /// per export. Read from RATEBOOK_SHEETS_TOKEN.
    #[serde(default)]
    pub sheets_token: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("RATEBOOK"));
        if let Ok(path) = std::env::var("RATEBOOK_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let cfg: Self = c.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Returns the chunk queue buffer size. Defaults to
    /// DEFAULT_CHUNK_QUEUE_SIZE if unset or invalid.
    pub fn chunk_queue_size_or_default(&self) -> usize {
        self.chunk_queue_size.unwrap_or(DEFAULT_CHUNK_QUEUE_SIZE)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured. Reads from config or
    /// RATEBOOK_AI_API_KEY env.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var("RATEBOOK_AI_API_KEY").ok())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .or_else(|| std::env::var("RATEBOOK_AI_API_URL").ok())
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .or_else(|| std::env::var("RATEBOOK_AI_MODEL").ok())
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Spreadsheet Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the spreadsheet endpoint override, if any.
    pub fn sheets_api_url(&self) -> Option<String> {
        self.sheets_api_url
            .clone()
            .or_else(|| std::env::var("RATEBOOK_SHEETS_API_URL").ok())
    }

    /// Returns the stored export token, if any.
    pub fn sheets_token(&self) -> Option<String> {
        self.sheets_token
            .clone()
            .or_else(|| std::env::var("RATEBOOK_SHEETS_TOKEN").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.chunk_queue_size_or_default(), DEFAULT_CHUNK_QUEUE_SIZE);
        assert_eq!(cfg.ai_model_or_default(), "gpt-4o-mini");
        assert!(cfg
            .ai_api_url_or_default()
            .contains("api.openai.com/v1/chat/completions"));
    }
}
