//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check (wired in main)
//! GET  /health/ready             - Readiness check, MongoDB ping (wired in main)
//!
//! # Migrations (bearer-token protected)
//! POST /api/migrations/catalog   - Run the catalog hierarchy migration
//! ```

use axum::Router;
use axum::routing::post;

use crate::state::AppState;

pub mod migrations;

/// All admin API routes. Health endpoints are wired directly in `main`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/migrations/catalog", post(migrations::run_catalog))
}
