//! Per-endpoint filter arguments

use crate::query::{BindValue, Condition};

use super::sort::SortArgs;

/// Which columns the `search` filter matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    /// CVE name or description
    Cve,
    /// Cluster UUID
    ExposedClusters,
}

impl SearchTarget {
    /// LIKE predicate for `pattern`. Wildcards inside the user value are not escaped.
    pub fn condition(&self, pattern: &str) -> Condition {
        match self {
            SearchTarget::Cve => Condition::new(
                "cve.name LIKE ? OR cve.description LIKE ?",
                vec![
                    BindValue::Text(pattern.to_string()),
                    BindValue::Text(pattern.to_string()),
                ],
            ),
            SearchTarget::ExposedClusters => Condition::new(
                "cluster.uuid LIKE ?",
                vec![BindValue::Text(pattern.to_string())],
            ),
        }
    }
}

/// Endpoint-scoped configuration handed to every filter
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub search: Option<SearchTarget>,
    pub sort: Option<SortArgs>,
}

impl FilterArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, target: SearchTarget) -> Self {
        self.search = Some(target);
        self
    }

    pub fn with_sort(mut self, sort: SortArgs) -> Self {
        self.sort = Some(sort);
        self
    }
}
