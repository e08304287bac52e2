//! Row projections returned by the query endpoints

use serde::Serialize;
use utoipa::ToSchema;

use crate::filter::Severity;

/// CVE affecting at least one of the account's clusters
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct CveItem {
    #[schema(example = "CVE-2022-0778")]
    pub synopsis: String,
    pub description: String,
    /// Publication date (RFC 3339 or YYYY-MM-DD)
    #[schema(example = "2022-03-15")]
    pub publish_date: Option<String>,
    pub severity: Severity,
    pub cvss2_score: Option<f64>,
    pub cvss3_score: Option<f64>,
    pub clusters_exposed: i64,
    pub images_exposed: i64,
}

/// Cluster exposed to a single CVE
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct ExposedClusterItem {
    #[schema(example = "b0b7c0a2-54f6-4ef4-9b3a-8f1f3a2f0c11")]
    pub uuid: String,
    pub status: String,
    pub version: String,
    pub provider: Option<String>,
    pub images_exposed: i64,
}

/// Cluster with per-severity CVE counts
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct ClusterItem {
    pub uuid: String,
    pub status: String,
    pub version: String,
    pub provider: Option<String>,
    pub cves_critical: i64,
    pub cves_important: i64,
    pub cves_moderate: i64,
    pub cves_low: i64,
}
