//! ratebook: purchase-rate tracking and AI-assisted ledger reconciliation
//! with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
