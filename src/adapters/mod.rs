//! Infrastructure adapters. Implement outbound ports.
//!
//! Generation backend, spreadsheet service, persistence, terminal UI.
//! Map infrastructure errors to DomainError.

pub mod ai;
pub mod integrations;
pub mod persistence;
pub mod ui;
