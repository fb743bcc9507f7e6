//! AI adapter module. Implements LedgerAnalystPort for LLM integration.
//!
//! Provides an OpenAI-compatible adapter and a mock adapter for testing.

pub mod csv_utils;
pub mod mock_adapter;
pub mod openai_adapter;

pub use csv_utils::rates_to_csv;
pub use mock_adapter::MockAnalystAdapter;
pub use openai_adapter::OpenAiAdapter;
