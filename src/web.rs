//! Web layer for CVE Manager
//!
//! This module provides the HTTP server and API endpoints.
//!
//! # Module Structure
//! - `handlers`: HTTP request handlers
//! - `endpoints`: Filter allow-lists and arguments per list endpoint
//! - `identity`: Account resolution middleware
//! - `state`: Application state
//! - `types`: Request and response types

mod endpoints;
mod handlers;
mod identity;
mod state;
mod types;

// Re-export public types
pub use handlers::{healthz, list_clusters, list_cves, list_exposed_clusters};
pub use identity::{AccountId, IDENTITY_HEADER, decode_org_id, require_identity};
pub use state::AppState;
pub use types::{ErrorResponse, HealthResponse, ListResponse, Meta};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;

use crate::config::Config;
use crate::filter::{AppliedFilter, AppliedFilters, Severity};
use crate::health::HealthServer;
use crate::storage::{ClusterItem, CveItem, Database, ExposedClusterItem};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CVE Manager API",
        description = "CVE exposure of an account's clusters and images",
        version = env!("CARGO_PKG_VERSION"),
        license(name = "MIT")
    ),
    paths(
        handlers::healthz,
        handlers::list_cves,
        handlers::list_exposed_clusters,
        handlers::list_clusters,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        Meta,
        AppliedFilter,
        AppliedFilters,
        Severity,
        CveItem,
        ExposedClusterItem,
        ClusterItem,
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "CVEs", description = "CVE listing endpoints"),
        (name = "Clusters", description = "Cluster listing endpoints"),
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(IDENTITY_HEADER)]);

    let api = Router::new()
        .route("/cves", get(list_cves))
        .route("/cves/{cve_name}/exposed_clusters", get(list_exposed_clusters))
        .route("/clusters", get(list_clusters))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api-docs/openapi.json", get(serve_openapi))
        .nest("/api/v1", api)
        .layer(cors)
        .with_state(state)
}

pub async fn run(
    config: Config,
    health_server: HealthServer,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    info!(
        port = config.server_port,
        storage_path = %config.storage_path,
        max_connections = config.db_max_connections,
        "Starting API server"
    );

    let db = Database::new(&config.get_db_path(), config.db_max_connections).await?;
    let app = router(AppState::new(db));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    info!(addr = %addr, "Server listening");

    // Mark as ready
    health_server.set_ready(true);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
            info!("Server shutting down");
        })
        .await
        .context("API server failed")?;

    health_server.set_ready(false);
    Ok(())
}

async fn serve_openapi() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        ApiDoc::openapi().to_json().unwrap_or_default(),
    )
}
