//! Catalog migration endpoint.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::info;

use kirana_core::MigrationReport;

use crate::db::MongoCatalog;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::services::migration::{HierarchyMigrator, MigratorOptions};
use crate::state::AppState;

/// Query parameters for a migration run.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MigrationParams {
    /// Classify and report without persisting.
    pub dry_run: bool,
    /// Override the configured batch size.
    pub batch_size: Option<usize>,
}

/// Run the catalog hierarchy migration and return its report.
///
/// Runs are serialized per process: a second request waits for the current
/// run to finish rather than interleaving writes. Orphaned references do not
/// fail the request - they come back in the report for the operator to fix
/// in the source data before re-running.
pub async fn run_catalog(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Query(params): Query<MigrationParams>,
) -> Result<Json<MigrationReport>> {
    let batch_size = params.batch_size.unwrap_or(state.config().batch_size);
    if batch_size == 0 {
        return Err(AppError::BadRequest(
            "batch_size must be at least 1".to_owned(),
        ));
    }

    let _guard = state.migration_lock().lock().await;

    let migrator = HierarchyMigrator::new(
        MongoCatalog::new(state.db().clone()),
        MigratorOptions {
            batch_size,
            dry_run: params.dry_run,
        },
    );
    let report = migrator.run().await?;

    info!(
        updated = report.total_updated(),
        errors = report.total_errors(),
        dry_run = report.dry_run,
        "catalog migration finished"
    );
    Ok(Json(report))
}
