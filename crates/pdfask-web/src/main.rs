use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pdfask_core::{Config, GeminiBackend, config_file};
use pdfask_pdf_mupdf::MupdfBackend;

mod app;
mod handlers;
mod models;
mod settings;
mod state;
mod upload;

use settings::ServerSettings;
use state::AppState;

const DEFAULT_LOG_FILTER: &str = "info,pdfask_core=debug,pdfask_web=debug,tower_http=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let file = config_file::load_config();
    let config = Config::from_file(&file, std::env::var("GOOGLE_API_KEY").ok());
    let settings = ServerSettings::from_file(&file);

    if !config.has_credential() {
        tracing::warn!(
            "GOOGLE_API_KEY is not set; every question will be answered with an error message"
        );
    }
    tracing::info!(config = ?config, "configuration loaded");

    let generator = GeminiBackend::new(&config)?;
    let state = Arc::new(AppState {
        pdf_backend: Arc::new(MupdfBackend::new()),
        model: generator.model().to_string(),
        generator: Arc::new(generator),
        credential_configured: config.has_credential(),
        extraction_timeout: settings.extraction_timeout(),
        extraction_permits: Arc::new(Semaphore::new(settings.max_concurrent_extractions)),
    });

    let app = app::build_router(state, &settings);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
