//! SQLite-backed rate repository via libsql.
//!
//! Single `rates` table; appends run in transactions, history queries are
//! date-ordered per product. One database file (rates.db) shared by all
//! products.

use crate::domain::{DomainError, PurchaseRate};
use crate::ports::RateRepoPort;
use chrono::NaiveDate;
use libsql::{params, Database};
use std::path::{Path, PathBuf};
use tracing::info;

const RATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product TEXT NOT NULL,
    date TEXT NOT NULL,
    unit_price REAL NOT NULL,
    supplier TEXT
)"#;
const RATES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_rates_product_date ON rates (product, date)";

/// SQLite repository. One database file (rates.db) in the given base
/// directory; safe to share via Arc.
pub struct SqliteRateRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRateRepo {
    /// Connect to (or create) the database and ensure the schema exists.
    ///
    /// WAL mode and synchronous=NORMAL: concurrent readers with one writer,
    /// durable enough for an append-mostly ledger of rates.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("rates.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Repo(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows
        // (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("WAL pragma failed: {e}")))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
            .is_some()
        {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::Repo(format!("synchronous pragma failed: {e}")))?;
        while sync_rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
            .is_some()
        {}

        conn.execute(RATES_TABLE, ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        conn.execute(RATES_INDEX, ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait::async_trait]
impl RateRepoPort for SqliteRateRepo {
    async fn save_rate(&self, rate: &PurchaseRate) -> Result<(), DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        conn.execute(
            "INSERT INTO rates (product, date, unit_price, supplier) VALUES (?1, ?2, ?3, ?4)",
            params![
                rate.product.as_str(),
                rate.date.format("%Y-%m-%d").to_string(),
                rate.unit_price,
                rate.supplier.as_deref()
            ],
        )
        .await
        .map_err(|e| DomainError::Repo(e.to_string()))?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<String>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut rows = conn
            .query("SELECT DISTINCT product FROM rates ORDER BY product", ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut products = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            let product: String = row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?;
            products.push(product);
        }
        Ok(products)
    }

    async fn get_rates(&self, product: &str, limit: u32) -> Result<Vec<PurchaseRate>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut rows = conn
            .query(
                r#"
                SELECT product, date, unit_price, supplier
                FROM rates
                WHERE product = ?1
                ORDER BY date ASC
                LIMIT ?2
                "#,
                params![product, limit as i64],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        let mut rates = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            let product: String = row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?;
            let date_str: String = row.get(1).map_err(|e| DomainError::Repo(e.to_string()))?;
            let unit_price: f64 = row.get(2).map_err(|e| DomainError::Repo(e.to_string()))?;
            let supplier: Option<String> = row.get(3).ok();

            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| DomainError::Repo(format!("bad date in rates table: {e}")))?;

            rates.push(PurchaseRate {
                product,
                date,
                unit_price,
                supplier,
            });
        }
        Ok(rates)
    }
}
