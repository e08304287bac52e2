//! Request filters and their composition into a query
//!
//! # Module Structure
//! - `value`: Raw parameter name and values
//! - `severity`: CVE severity enum
//! - `kinds`: Filter variants, parsing and application
//! - `sort`: Sort resolution against endpoint columns and defaults
//! - `args`: Per-endpoint filter arguments
//! - `registry`: Parsing request parameters into filters
//! - `applied`: Effective filter values reported back to the client

mod applied;
mod args;
mod kinds;
mod registry;
mod severity;
mod sort;
mod value;

pub use applied::{AppliedFilter, AppliedFilters};
pub use args::{FilterArgs, SearchTarget};
pub use kinds::{DATE_FORMAT, Exposure, Filter, FilterKind, FilterName};
pub use registry::RequestedFilters;
pub use severity::Severity;
pub use sort::{SortArgs, SortItem};
pub use value::RawFilter;

use crate::error::FilterError;
use crate::query::QuerySpec;

/// Apply the requested filters an endpoint allows, in allow-list order.
///
/// Requested filters missing from `allowed` are never evaluated. The first failing filter
/// aborts composition and its error is returned; the partially built query is dropped.
pub fn apply_filters(
    query: QuerySpec,
    allowed: &[FilterName],
    requested: &mut RequestedFilters,
    args: &FilterArgs,
) -> Result<QuerySpec, FilterError> {
    allowed.iter().try_fold(query, |query, name| {
        match requested.get_mut(*name) {
            Some(filter) => filter.apply(query, args),
            None => Ok(query),
        }
    })
}
