//! themeharvest - theme-driven multi-source data collection pipeline.
//!
//! Core library exposing domain modules: a user-defined "theme" becomes a
//! standardized dataset with per-source extraction configurations, crawl
//! tasks fan out over a durable queue, and extraction workers persist
//! records into dynamically provisioned tables.

pub mod config;
pub mod extract;
pub mod models;
pub mod queue;
pub mod render;
pub mod repository;
pub mod schema;
pub mod services;
pub mod worker;
