//! Filter configuration of each list endpoint

use std::sync::LazyLock;

use crate::filter::{FilterArgs, FilterName, SearchTarget, SortArgs, SortItem};

const SEVERITY_RANK: &str = "CASE cve.severity \
     WHEN 'low' THEN 1 WHEN 'moderate' THEN 2 WHEN 'important' THEN 3 WHEN 'critical' THEN 4 \
     ELSE 0 END";

/// Which filters an endpoint honours and the arguments they run with
pub struct Endpoint {
    pub allowed: &'static [FilterName],
    pub args: FilterArgs,
}

pub static CVES: LazyLock<Endpoint> = LazyLock::new(|| Endpoint {
    allowed: &[
        FilterName::Sort,
        FilterName::Limit,
        FilterName::Offset,
        FilterName::Search,
        FilterName::Published,
        FilterName::Severity,
        FilterName::CvssScore,
        FilterName::AffectedClusters,
        FilterName::AffectedImages,
    ],
    args: FilterArgs::new().with_search(SearchTarget::Cve).with_sort(SortArgs::new(
        &[
            ("id", "cve.id"),
            ("synopsis", "cve.name"),
            ("severity", SEVERITY_RANK),
            ("cvss_score", "COALESCE(cve.cvss3_score, cve.cvss2_score, 0.0)"),
            ("publish_date", "cve.public_date"),
            ("clusters_exposed", "clusters_exposed"),
            ("images_exposed", "images_exposed"),
        ],
        vec![SortItem::asc("id")],
    )),
});

pub static EXPOSED_CLUSTERS: LazyLock<Endpoint> = LazyLock::new(|| Endpoint {
    allowed: &[
        FilterName::Sort,
        FilterName::Limit,
        FilterName::Offset,
        FilterName::Search,
    ],
    args: FilterArgs::new()
        .with_search(SearchTarget::ExposedClusters)
        .with_sort(SortArgs::new(
            &[
                ("id", "cluster.id"),
                ("uuid", "cluster.uuid"),
                ("status", "cluster.status"),
                ("version", "cluster.version"),
                ("provider", "cluster.provider"),
                ("images_exposed", "images_exposed"),
            ],
            vec![SortItem::asc("id")],
        )),
});

pub static CLUSTERS: LazyLock<Endpoint> = LazyLock::new(|| Endpoint {
    allowed: &[
        FilterName::Sort,
        FilterName::Limit,
        FilterName::Offset,
        FilterName::Search,
        FilterName::ClusterSeverity,
    ],
    args: FilterArgs::new()
        .with_search(SearchTarget::ExposedClusters)
        .with_sort(SortArgs::new(
            &[
                ("id", "cluster.id"),
                ("uuid", "cluster.uuid"),
                ("status", "cluster.status"),
                ("version", "cluster.version"),
                ("provider", "cluster.provider"),
                ("cves_critical", "cves_critical"),
                ("cves_important", "cves_important"),
                ("cves_moderate", "cves_moderate"),
                ("cves_low", "cves_low"),
            ],
            vec![SortItem::asc("id")],
        )),
});
