//! Squarium API crate - axum HTTP server and route handlers.
//!
//! Serves the ranked problem clusters, a health check, and the
//! secret-protected trigger that runs one ingestion cycle.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
