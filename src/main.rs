use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rating_engine::{
    config::Config,
    engine::PredictionService,
    model_store::ModelStore,
    routes::{self, AppState},
    storage::PredictionStore,
    telemetry,
    types::{Artist, Label, LabelKind, Rating},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rating_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let metrics = match telemetry::install() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    let app = match config.model.label {
        LabelKind::Rating => build_app::<Rating>(&config, metrics).await?,
        LabelKind::Artist => build_app::<Artist>(&config, metrics).await?,
    };

    let addr = config.bind_addr()?;
    info!("Starting rating engine on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Loads the model first so a bad artifact set fails before the database is
/// touched.
async fn build_app<L: Label>(
    config: &Config,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<Router> {
    let model = ModelStore::load::<L>(&config.model)?;

    let store = PredictionStore::connect(&config.database).await?;
    if config.database.reset_on_start {
        store.reset().await?;
    }

    let state = AppState {
        service: Arc::new(PredictionService::new(model, store)),
        metrics,
        page_size: config.server.page_size,
    };

    Ok(routes::build_router(state, config.server.max_body_bytes))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, starting graceful shutdown");
}
