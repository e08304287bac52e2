//! Parsing request parameters into filters

use std::collections::HashMap;

use tracing::debug;

use crate::error::FilterError;

use super::kinds::{Filter, FilterName};

/// Filters requested by one HTTP request, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestedFilters {
    filters: HashMap<FilterName, Filter>,
}

impl RequestedFilters {
    /// Parse the parameters in `params` that `allowed` names.
    ///
    /// Unknown parameters and parameters outside `allowed` are ignored without looking at
    /// their values. The first malformed allowed value fails the whole request. When no
    /// `sort` parameter is present an empty sort filter is registered, so endpoint default
    /// ordering is still applied and echoed.
    pub fn parse(
        params: &HashMap<String, String>,
        allowed: &[FilterName],
    ) -> Result<Self, FilterError> {
        let mut filters = HashMap::new();

        // Fixed order keeps the reported error stable when several values are malformed
        for name in FilterName::ALL {
            if !allowed.contains(&name) {
                continue;
            }
            if let Some(value) = params.get(name.as_str()) {
                filters.insert(name, Filter::parse(name, value)?);
            }
        }

        for param in params.keys() {
            match param.parse::<FilterName>() {
                Ok(name) if !allowed.contains(&name) => {
                    debug!(param = %param, "Ignoring filter not supported by this endpoint");
                }
                Ok(_) => {}
                Err(()) => debug!(param = %param, "Ignoring unknown query parameter"),
            }
        }

        filters
            .entry(FilterName::Sort)
            .or_insert_with(Filter::default_sort);

        Ok(Self { filters })
    }

    pub fn get(&self, name: FilterName) -> Option<&Filter> {
        self.filters.get(&name)
    }

    pub(super) fn get_mut(&mut self, name: FilterName) -> Option<&mut Filter> {
        self.filters.get_mut(&name)
    }

    pub fn contains(&self, name: FilterName) -> bool {
        self.filters.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
