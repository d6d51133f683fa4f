//! HTTP API over the batch pipeline.
//!
//! | Method | Path              | Body                                  | Response                     |
//! |--------|-------------------|---------------------------------------|------------------------------|
//! | POST   | `/upload-template`| multipart `file`                      | template data URI + size     |
//! | POST   | `/preview`        | multipart `template_data`, `config_data` | first page data URI + count |
//! | POST   | `/generate-pdf`   | multipart `template_data`, `config_data` | `application/pdf` attachment |
//! | GET    | `/config`         |                                       | page ceiling + formats       |
//! | GET    | `/health`         |                                       | `{"status": "healthy"}`      |
//!
//! The server is stateless between requests: the client re-sends the
//! template with every preview and export.

pub mod error;
pub mod handlers;

use crate::config::ServiceConfig;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use error::{ApiError, Stage};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceConfig>,
}

/// Build the application router.
pub fn build_router(service: Arc<ServiceConfig>) -> Router {
    let cors = cors_layer(&service.allowed_origins);
    let body_limit = DefaultBodyLimit::max(service.max_body_bytes);
    let state = AppState { service };

    Router::new()
        .route("/upload-template", post(handlers::upload_template))
        .route("/preview", post(handlers::preview))
        .route("/generate-pdf", post(handlers::generate_pdf))
        .route("/config", get(handlers::config))
        .route("/health", get(handlers::health))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, service: ServiceConfig) -> std::io::Result<()> {
    let app = build_router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
