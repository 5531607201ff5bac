//! Read-only REST API over the variant store.
//!
//! ## Endpoints
//!
//! - `GET /` - API name and version
//! - `GET /health` - Database connectivity
//! - `GET /snps` - Paginated variant list
//! - `GET /snps/search` - Search by `chrom:pos` or rs-id
//! - `GET /snps/:id` - Variant detail with nearest gene
//! - `GET /snps/:id/region` - Genome-browser window around a variant
//! - `GET /targets` - Targets ordered by id
//! - `GET /stats` - Row counts

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::store::Database;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Build the router with all endpoints.
pub fn create_router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/snps", get(handlers::list_snps))
        .route("/snps/search", get(handlers::search_snps))
        .route("/snps/:id", get(handlers::get_snp))
        .route("/snps/:id/region", get(handlers::get_snp_region))
        .route("/targets", get(handlers::list_targets))
        .route("/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config, db: Database) -> Result<()> {
    let app = create_router(AppState::new(db), config.cors);
    let addr = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
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
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down...");
        },
    }
}
