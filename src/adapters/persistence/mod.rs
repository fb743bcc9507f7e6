//! Persistence adapters.

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRateRepo;
