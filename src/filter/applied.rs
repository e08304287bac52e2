//! Effective filter values echoed back to the client

use serde::Serialize;
use utoipa::ToSchema;

use super::kinds::FilterName;
use super::registry::RequestedFilters;

/// One filter that took part in building the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AppliedFilter {
    /// Query parameter name
    #[schema(example = "sort")]
    pub name: String,
    /// Effective raw value, including injected defaults
    #[schema(example = "-cvss_score,id")]
    pub value: String,
}

/// Applied filters in endpoint allow-list order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AppliedFilters(pub Vec<AppliedFilter>);

impl AppliedFilters {
    /// Collect the allowed filters present in `requested`.
    ///
    /// A sort filter that ended up with no value (nothing requested, no usable default) is
    /// left out.
    pub fn collect(requested: &RequestedFilters, allowed: &[FilterName]) -> Self {
        let filters = allowed
            .iter()
            .filter_map(|name| requested.get(*name))
            .map(|filter| filter.raw())
            .filter(|raw| !raw.values().is_empty())
            .map(|raw| AppliedFilter {
                name: raw.name().to_string(),
                value: raw.value(),
            })
            .collect();
        Self(filters)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedFilter> {
        self.0.iter()
    }

    /// `name=value&...` with values percent-encoded; stable for cache keys and links
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|f| format!("{}={}", f.name, urlencoding::encode(&f.value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
