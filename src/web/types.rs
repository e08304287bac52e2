//! Request and response types for API endpoints

use serde::Serialize;
use utoipa::ToSchema;

use crate::filter::AppliedFilters;

/// Response envelope for list endpoints
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T: ToSchema> {
    /// Rows of the requested page
    pub data: Vec<T>,
    pub meta: Meta,
}

/// Paging and filter information for a list response
#[derive(Debug, Serialize, ToSchema)]
pub struct Meta {
    /// Rows matching the filters, ignoring limit and offset
    #[schema(example = 42)]
    pub total_items: i64,
    /// Filters that shaped the query, with their effective values
    pub filters: AppliedFilters,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "invalid sort column selected: bogus")]
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}
