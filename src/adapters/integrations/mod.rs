//! External service integrations.

pub mod sheets;

pub use sheets::SheetsAdapter;
