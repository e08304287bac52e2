pub mod config;
pub mod error;
pub mod filter;
pub mod health;
pub mod logging;
pub mod query;
pub mod storage;
pub mod web;
