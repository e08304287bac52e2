//! Sort resolution: user-selected columns first, then endpoint defaults

use std::collections::HashMap;

use crate::error::FilterError;
use crate::query::{OrderClause, QuerySpec};

use super::value::RawFilter;

/// One requested sort column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub column: String,
    pub descending: bool,
}

impl SortItem {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: true,
        }
    }

    /// Parse `column` or `-column`
    pub fn parse(raw: &str) -> Option<Self> {
        let (column, descending) = match raw.strip_prefix('-') {
            Some(column) => (column, true),
            None => (raw, false),
        };
        if column.is_empty() {
            return None;
        }
        Some(Self {
            column: column.to_string(),
            descending,
        })
    }

    /// Query-string form, `-` prefixed when descending
    pub fn to_raw(&self) -> String {
        if self.descending {
            format!("-{}", self.column)
        } else {
            self.column.clone()
        }
    }
}

/// Endpoint sort configuration.
///
/// `sortable_columns` maps the column names clients may use to SQL expressions and is the
/// only source of truth for which columns are legal, defaults included.
#[derive(Debug, Clone, Default)]
pub struct SortArgs {
    pub sortable_columns: HashMap<String, String>,
    pub default_sortable: Vec<SortItem>,
}

impl SortArgs {
    pub fn new(columns: &[(&str, &str)], default_sortable: Vec<SortItem>) -> Self {
        Self {
            sortable_columns: columns
                .iter()
                .map(|(name, expr)| (name.to_string(), expr.to_string()))
                .collect(),
            default_sortable,
        }
    }

    pub fn resolve(&self, column: &str) -> Option<&str> {
        self.sortable_columns.get(column).map(String::as_str)
    }
}

/// Apply requested ordering followed by the endpoint defaults.
///
/// Every requested column must resolve before any ordering is added. Resolvable defaults
/// are always appended, and their raw form is pushed onto `raw` so the echoed value shows
/// the complete effective ordering.
pub(super) fn apply(
    raw: &mut RawFilter,
    items: &[SortItem],
    query: QuerySpec,
    sort_args: Option<&SortArgs>,
) -> Result<QuerySpec, FilterError> {
    let Some(sort_args) = sort_args else {
        return Ok(query);
    };

    let mut clauses = Vec::with_capacity(items.len() + sort_args.default_sortable.len());
    for item in items {
        let expr = sort_args
            .resolve(&item.column)
            .ok_or_else(|| FilterError::InvalidSortColumn(item.column.clone()))?;
        clauses.push(OrderClause::new(expr, item.descending));
    }

    for item in &sort_args.default_sortable {
        // Misconfigured defaults are skipped, they are not the client's fault
        if let Some(expr) = sort_args.resolve(&item.column) {
            clauses.push(OrderClause::new(expr, item.descending));
            raw.push_value(item.to_raw());
        }
    }

    Ok(clauses.into_iter().fold(query, QuerySpec::order_by))
}
