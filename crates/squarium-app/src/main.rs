//! Squarium application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Open SQLite storage
//! 3. Wire the source, text-generation and embedding clients into the
//!    ingestion orchestrator
//! 4. Either run one ingestion cycle, or serve the API with scheduled runs

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use squarium_api::auth::load_or_generate_secret;
use squarium_api::{start_server, AppState};
use squarium_core::config::SquariumConfig;
use squarium_ingest::{IngestionOrchestrator, ProductHuntClient};
use squarium_insight::{ClusterSummarizer, GeminiClient, ProblemExtractor, TextGenerator};
use squarium_storage::Database;
use squarium_vector::{DynEmbeddingService, EmbeddingProvider, GeminiEmbedding, MockEmbedding};

use cli::{CliArgs, Command};

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn build_orchestrator(
    config: &SquariumConfig,
    db: Arc<Database>,
    lookback_days: u32,
) -> IngestionOrchestrator {
    let source = Arc::new(ProductHuntClient::new(&config.source));

    let gemini = &config.gemini;
    let gemini_key = gemini.api_key.clone().filter(|k| !k.is_empty());
    if gemini_key.is_none() {
        tracing::warn!(
            "GEMINI_API_KEY not set; extraction will yield nothing and embeddings use the local hasher"
        );
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        &gemini.base_url,
        &gemini.model,
        gemini_key.as_deref().unwrap_or_default(),
    ));

    let embedding: Arc<dyn DynEmbeddingService> = match gemini_key.as_deref() {
        Some(key) => Arc::new(GeminiEmbedding::new(
            &gemini.base_url,
            &gemini.embedding_model,
            key,
            gemini.embedding_dim,
        )),
        None => Arc::new(MockEmbedding::with_dimensions(gemini.embedding_dim)),
    };

    IngestionOrchestrator::new(
        db,
        source,
        ProblemExtractor::new(Arc::clone(&generator)),
        EmbeddingProvider::new(embedding),
        ClusterSummarizer::new(generator),
    )
    .with_lookback_days(lookback_days)
}

/// Run one ingestion cycle every `interval_hours`, starting immediately.
async fn scheduled_ingest_loop(orchestrator: Arc<IngestionOrchestrator>, interval_hours: u32) {
    let period = Duration::from_secs(u64::from(interval_hours.max(1)) * 3600);
    tracing::info!(interval_hours, "Scheduled ingestion loop started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match orchestrator.run().await {
            Ok(report) => tracing::info!(message = %report.message(), "Scheduled ingestion finished"),
            Err(e) => tracing::warn!(error = %e, "Scheduled ingestion failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SquariumConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Squarium v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("squarium.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let lookback_days = args.resolve_days_back(config.ingest.lookback_days);
    let orchestrator = Arc::new(build_orchestrator(&config, Arc::clone(&db), lookback_days));

    match args.command() {
        Command::Ingest => {
            let report = orchestrator.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Serve => {
            let cron_secret = match config.api.cron_secret.clone().filter(|s| !s.is_empty()) {
                Some(secret) => secret,
                None => load_or_generate_secret(&data_dir.join("cron_secret")),
            };

            if config.ingest.schedule_enabled {
                let scheduled = Arc::clone(&orchestrator);
                let hours = config.ingest.interval_hours;
                tokio::spawn(async move {
                    scheduled_ingest_loop(scheduled, hours).await;
                });
            } else {
                tracing::info!("Scheduled ingestion disabled in config");
            }

            let host = args.resolve_host(&config.general.host);
            let port = args.resolve_port(config.general.port);
            let state = AppState::new(db, orchestrator, &cron_secret, port);

            start_server(&host, state).await?;
            Ok(())
        }
    }
}
