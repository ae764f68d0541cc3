//! HTTP surface: `GET /health` and `POST /predict`.

mod error;
mod handlers;
pub mod types;

pub use error::ApiError;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::inference::ModelStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process-wide model handle.
    pub store: Arc<ModelStore>,
    /// Version string echoed in responses.
    pub version: Arc<str>,
}

impl AppState {
    /// Create handler state.
    pub fn new(store: Arc<ModelStore>, version: &str) -> Self {
        Self {
            store,
            version: Arc::from(version),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin may call the service; the web frontends live elsewhere.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Preload the model (if enabled), then serve until interrupted.
///
/// A failed preload is logged and serving continues, unless `fail_fast` is
/// set, in which case the load error is returned.
pub async fn serve(config: &Config, store: Arc<ModelStore>, fail_fast: bool) -> Result<()> {
    if config.server.preload
        && let Err(e) = store.try_load().await
    {
        if fail_fast {
            return Err(e);
        }
        warn!("Model not loaded at startup, will retry on first prediction: {e}");
    }

    let state = AppState::new(store, &config.model.version);
    let app = router(state, config.server.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal {
            message: format!("failed to bind {addr}: {e}"),
        })?;

    info!(
        "Listening on http://{} (model version {})",
        listener.local_addr()?,
        config.model.version
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
