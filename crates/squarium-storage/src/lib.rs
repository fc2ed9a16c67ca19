//! Squarium Storage crate - SQLite persistence for the problem pipeline.
//!
//! Provides a WAL-mode SQLite database with versioned migrations,
//! idempotent repositories for products and comments, append-only problem
//! storage, cluster upserts, and the filtered cluster read query.

pub mod db;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use db::Database;
pub use queries::{ClusterFilters, ClusterQueryService, DateRange, DbStats, PAGE_SIZE};
pub use repository::{
    ClusterRepository, CommentRepository, ProblemRepository, ProductRepository, Upsert,
};
