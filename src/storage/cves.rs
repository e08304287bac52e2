//! Account-scoped CVE queries

use anyhow::{Context, Result};

use crate::query::{BindValue, Condition, QuerySpec};

use super::database::Database;

const CVES_SELECT: &str = "cve.name AS synopsis, cve.description, cve.public_date AS publish_date, \
     cve.severity, cve.cvss2_score, cve.cvss3_score, \
     COUNT(DISTINCT cluster_image.cluster_id) AS clusters_exposed, \
     COUNT(DISTINCT cluster_image.image_id) AS images_exposed";

const CVES_FROM: &str = "cve \
     JOIN image_cve ON cve.id = image_cve.cve_id \
     JOIN cluster_image ON image_cve.image_id = cluster_image.image_id \
     JOIN cluster ON cluster_image.cluster_id = cluster.id";

const EXPOSED_CLUSTERS_SELECT: &str = "cluster.uuid, cluster.status, cluster.version, \
     cluster.provider, COUNT(DISTINCT cluster_image.image_id) AS images_exposed";

const EXPOSED_CLUSTERS_FROM: &str = "cluster \
     JOIN cluster_image ON cluster.id = cluster_image.cluster_id \
     JOIN image_cve ON cluster_image.image_id = image_cve.image_id \
     JOIN cve ON image_cve.cve_id = cve.id";

/// CVEs present in images running on the account's clusters, one row per CVE
pub fn cves_query(account_id: i64) -> QuerySpec {
    QuerySpec::new(CVES_SELECT, CVES_FROM)
        .filter(account_scope(account_id))
        .group_by("cve.id")
}

/// The account's clusters running images affected by `cve_name`, one row per cluster
pub fn exposed_clusters_query(account_id: i64, cve_name: &str) -> QuerySpec {
    QuerySpec::new(EXPOSED_CLUSTERS_SELECT, EXPOSED_CLUSTERS_FROM)
        .filter(account_scope(account_id))
        .filter(Condition::new(
            "cve.name = ?",
            vec![BindValue::Text(cve_name.to_string())],
        ))
        .group_by("cluster.id")
}

pub(super) fn account_scope(account_id: i64) -> Condition {
    Condition::new(
        "cluster.account_id = ?",
        vec![BindValue::Integer(account_id)],
    )
}

impl Database {
    pub async fn cve_exists(&self, cve_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cve WHERE name = ?)")
            .bind(cve_name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to look up CVE")?;
        Ok(exists)
    }
}
