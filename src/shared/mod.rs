//! Shared application plumbing (configuration).

pub mod config;

pub use config::AppConfig;
