//! Storage layer for CVE Manager
//!
//! This module provides SQLite-based persistence for clusters, images and CVEs,
//! and executes the query specifications composed by the filter engine.
//!
//! # Module Structure
//! - `database`: Connection pool and query execution
//! - `schema`: Database schema initialization
//! - `models`: Row projections returned by the API
//! - `cves`: Base queries for CVE listings
//! - `clusters`: Base query for the cluster listing

mod clusters;
mod cves;
mod database;
mod models;
mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export public types
pub use clusters::clusters_query;
pub use cves::{cves_query, exposed_clusters_query};
pub use database::{Database, Page};
pub use models::{ClusterItem, CveItem, ExposedClusterItem};
