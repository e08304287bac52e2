//! HTTP request handlers for API endpoints

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::filter::{AppliedFilters, RequestedFilters, apply_filters};
use crate::query::QuerySpec;
use crate::storage::{
    ClusterItem, CveItem, Database, ExposedClusterItem, clusters_query, cves_query,
    exposed_clusters_query,
};

use super::endpoints::{CLUSTERS, CVES, EXPOSED_CLUSTERS, Endpoint};
use super::identity::AccountId;
use super::state::AppState;
use super::types::{ErrorResponse, HealthResponse, ListResponse, Meta};

/// Health check endpoint for load balancers
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}

/// List CVEs affecting the account's clusters
#[utoipa::path(
    get,
    path = "/api/v1/cves",
    tag = "CVEs",
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated columns, '-' prefix for descending", example = "-cvss_score,synopsis"),
        ("limit" = Option<u64>, Query, description = "Maximum number of rows"),
        ("offset" = Option<u64>, Query, description = "Rows to skip"),
        ("search" = Option<String>, Query, description = "Case-sensitive substring of CVE name or description"),
        ("published" = Option<String>, Query, description = "Inclusive date range FROM,TO (YYYY-MM-DD)", example = "2022-01-01,2022-12-31"),
        ("severity" = Option<String>, Query, description = "Comma-separated severities", example = "critical,important"),
        ("cvss_score" = Option<String>, Query, description = "Inclusive score range FROM,TO", example = "7.0,10.0"),
        ("affected_clusters" = Option<String>, Query, description = "ONE_OR_MORE,NONE switches", example = "true,false"),
        ("affected_images" = Option<String>, Query, description = "ONE_OR_MORE,NONE switches", example = "true,false"),
    ),
    responses(
        (status = 200, description = "Page of CVEs", body = ListResponse<CveItem>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse)
    )
)]
pub async fn list_cves(
    State(state): State<AppState>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<CveItem>>, ApiError> {
    list(&state.db, &CVES, cves_query(account_id), &params).await
}

/// List the account's clusters exposed to one CVE
#[utoipa::path(
    get,
    path = "/api/v1/cves/{cve_name}/exposed_clusters",
    tag = "CVEs",
    params(
        ("cve_name" = String, Path, description = "CVE identifier", example = "CVE-2022-0778"),
        ("sort" = Option<String>, Query, description = "Comma-separated columns, '-' prefix for descending"),
        ("limit" = Option<u64>, Query, description = "Maximum number of rows"),
        ("offset" = Option<u64>, Query, description = "Rows to skip"),
        ("search" = Option<String>, Query, description = "Case-sensitive substring of the cluster UUID"),
    ),
    responses(
        (status = 200, description = "Page of exposed clusters", body = ListResponse<ExposedClusterItem>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse),
        (status = 404, description = "CVE not found", body = ErrorResponse)
    )
)]
pub async fn list_exposed_clusters(
    State(state): State<AppState>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(cve_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<ExposedClusterItem>>, ApiError> {
    if !state.db.cve_exists(&cve_name).await? {
        return Err(ApiError::NotFound(format!("CVE not found: {}", cve_name)));
    }
    list(
        &state.db,
        &EXPOSED_CLUSTERS,
        exposed_clusters_query(account_id, &cve_name),
        &params,
    )
    .await
}

/// List the account's clusters with CVE counts per severity
#[utoipa::path(
    get,
    path = "/api/v1/clusters",
    tag = "Clusters",
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated columns, '-' prefix for descending"),
        ("limit" = Option<u64>, Query, description = "Maximum number of rows"),
        ("offset" = Option<u64>, Query, description = "Rows to skip"),
        ("search" = Option<String>, Query, description = "Case-sensitive substring of the cluster UUID"),
        ("cluster_severity" = Option<String>, Query, description = "Severities every returned cluster must be exposed to", example = "critical"),
    ),
    responses(
        (status = 200, description = "Page of clusters", body = ListResponse<ClusterItem>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or unknown identity", body = ErrorResponse)
    )
)]
pub async fn list_clusters(
    State(state): State<AppState>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<ClusterItem>>, ApiError> {
    list(&state.db, &CLUSTERS, clusters_query(account_id), &params).await
}

async fn list<T>(
    db: &Database,
    endpoint: &Endpoint,
    base: QuerySpec,
    params: &HashMap<String, String>,
) -> Result<Json<ListResponse<T>>, ApiError>
where
    T: for<'r> FromRow<'r, SqliteRow> + Serialize + ToSchema + Send + Unpin,
{
    let mut requested = RequestedFilters::parse(params, endpoint.allowed)?;
    let query = apply_filters(base, endpoint.allowed, &mut requested, &endpoint.args)?;
    let filters = AppliedFilters::collect(&requested, endpoint.allowed);
    debug!(filters = %filters.to_query_string(), "Applied filters");

    let page = db.fetch_page::<T>(&query).await?;
    Ok(Json(ListResponse {
        data: page.rows,
        meta: Meta {
            total_items: page.total,
            filters,
        },
    }))
}
