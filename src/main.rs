//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use ratebook::adapters::ai::{MockAnalystAdapter, OpenAiAdapter};
use ratebook::adapters::integrations::SheetsAdapter;
use ratebook::adapters::persistence::SqliteRateRepo;
use ratebook::adapters::ui::tui::TuiInputPort;
use ratebook::ports::{InputPort, LedgerAnalystPort, RateRepoPort, SheetExportPort};
use ratebook::shared::config::AppConfig;
use ratebook::usecases::{ExportService, InsightService, RateService, ReconcileService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    ratebook::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_default();

    let data_dir = cfg.data_dir.as_deref().unwrap_or("./data").to_string();
    let data_path = PathBuf::from(&data_dir);
    info!(path = %data_path.display(), "data directory");

    // --- Persistence ---
    let repo: Arc<dyn RateRepoPort> = Arc::new(
        SqliteRateRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );

    // --- Generation backend ---
    let analyst: Arc<dyn LedgerAnalystPort> = if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "AI analysis enabled with OpenAI adapter"
        );
        Arc::new(OpenAiAdapter::new(
            cfg.ai_api_url_or_default(),
            cfg.ai_api_key().unwrap_or_default(),
            cfg.ai_model_or_default(),
        ))
    } else {
        warn!("RATEBOOK_AI_API_KEY not set, using mock analyst adapter");
        Arc::new(MockAnalystAdapter::new())
    };

    // --- Spreadsheet export ---
    let sheets: Arc<dyn SheetExportPort> = Arc::new(SheetsAdapter::new(cfg.sheets_api_url()));

    // --- Services ---
    let rate_service = Arc::new(RateService::new(Arc::clone(&repo)));
    let insight_service = Arc::new(InsightService::new(
        Arc::clone(&analyst),
        Arc::clone(&repo),
    ));
    let chunk_queue_size = cfg.chunk_queue_size_or_default();
    info!(chunk_queue_size, "chunk queue buffer (backpressure)");
    let reconcile_service = Arc::new(ReconcileService::with_chunk_queue(
        Arc::clone(&analyst),
        chunk_queue_size,
    ));
    let export_service = Arc::new(ExportService::new(sheets));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        rate_service,
        insight_service,
        reconcile_service,
        export_service,
        cfg.sheets_token(),
    ));

    // --- Run (main menu -> rates / insight / reconciliation) ---
    input_port.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
