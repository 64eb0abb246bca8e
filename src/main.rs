//! cardiorisk: Cardiovascular risk assessment service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::http::{router, AppState};
use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::adapters::SharedModel;
use cardiorisk::config::{LogMode, Settings};
use cardiorisk::AssessmentService;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the process environment.
    let _ = dotenvy::dotenv();
    let settings = Settings::from_env()?;

    let (writer, _guard) = match settings.log_mode {
        LogMode::File => {
            if let Some(parent) = settings.log_file.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.log_file)
                .with_context(|| format!("Cannot open log file {:?}", settings.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting cardiorisk...");

    let model = Arc::new(SharedModel::logistic(
        settings.model_path.clone(),
        settings.integrity(),
    ));
    if settings.eager_model_load {
        let preload = Arc::clone(&model);
        let loaded = tokio::task::spawn_blocking(move || preload.get().map(|_| ())).await?;
        if let Err(e) = loaded {
            // Not fatal: the first request retries the load.
            tracing::warn!("Eager model load failed: {e}");
        }
    }

    let service = AssessmentService::new(
        model,
        settings.encoder(),
        settings.recommendation_engine(),
    );
    let app = router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("Cannot bind {}", settings.bind_addr))?;
    tracing::info!("Listening on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("cardiorisk shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
