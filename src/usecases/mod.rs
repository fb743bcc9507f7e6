//! Application use cases. Orchestrate domain logic via ports.

pub mod export_service;
pub mod insight_service;
pub mod rate_service;
pub mod reconcile_service;

pub use export_service::ExportService;
pub use insight_service::InsightService;
pub use rate_service::RateService;
pub use reconcile_service::{ReconcileService, ReconciliationStream, DEFAULT_CHUNK_QUEUE_SIZE};
