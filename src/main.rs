//! Label Lens Server
//!
//! Accepts food-label images, extracts text and labels with Google Cloud
//! Vision, and returns an OpenAI-generated nutrition summary.

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use label_lens_server::analysis::LabelAnalyzer;
use label_lens_server::config::Config;
use label_lens_server::state::AppState;
use label_lens_server::{routes, summary, vision};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading RUST_LOG or any credentials
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "label_lens_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Starting Label Lens Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Vision endpoint: {}", config.vision.endpoint);
    tracing::info!("Completion model: {}", config.completion.model);

    // Both clients are built exactly once; failures leave the handle absent
    let vision_handle = vision::connect(&config.vision).await;
    let completion_handle = summary::connect(&config.completion);

    let analyzer = LabelAnalyzer::new(vision_handle, completion_handle);
    let bind_host = config.server.host.clone();
    let bind_port = config.server.port;

    let state = AppState::new(config, analyzer);
    let app = routes::router(state.clone());

    let listener = tokio::net::TcpListener::bind((bind_host.as_str(), bind_port))
        .await
        .with_context(|| format!("failed to bind {}:{}", bind_host, bind_port))?;

    tracing::info!("Label Lens Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let analyzer = state.analyzer();
    tracing::info!(
        vision_ready = analyzer.vision_ready(),
        completion_ready = analyzer.completion_ready(),
        "Server shutdown complete, releasing clients"
    );
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A signal that cannot be installed is logged and never fires, so the
/// server keeps running on the remaining one.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!("Received {}, draining in-flight label analyses", signal_name);
}
