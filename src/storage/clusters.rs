//! Account-scoped cluster queries

use crate::query::QuerySpec;

use super::cves::account_scope;

const CLUSTERS_SELECT: &str = "cluster.uuid, cluster.status, cluster.version, cluster.provider, \
     COUNT(DISTINCT CASE WHEN cve.severity = 'critical' THEN cve.id END) AS cves_critical, \
     COUNT(DISTINCT CASE WHEN cve.severity = 'important' THEN cve.id END) AS cves_important, \
     COUNT(DISTINCT CASE WHEN cve.severity = 'moderate' THEN cve.id END) AS cves_moderate, \
     COUNT(DISTINCT CASE WHEN cve.severity = 'low' THEN cve.id END) AS cves_low";

// LEFT JOINs keep clusters without any vulnerable image
const CLUSTERS_FROM: &str = "cluster \
     LEFT JOIN cluster_image ON cluster.id = cluster_image.cluster_id \
     LEFT JOIN image_cve ON cluster_image.image_id = image_cve.image_id \
     LEFT JOIN cve ON image_cve.cve_id = cve.id";

/// All clusters of the account with CVE counts per severity, one row per cluster
pub fn clusters_query(account_id: i64) -> QuerySpec {
    QuerySpec::new(CLUSTERS_SELECT, CLUSTERS_FROM)
        .filter(account_scope(account_id))
        .group_by("cluster.id")
}
