//! Catalog migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Run the catalog hierarchy migration
//! kirana-cli migrate catalog
//!
//! # Preview without writing
//! kirana-cli migrate catalog --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `KIRANA_MONGODB_URI` - MongoDB connection string (falls back to
//!   `MONGODB_URI`)
//! - `KIRANA_MONGODB_DB` - Database name (default: kirana)
//! - `KIRANA_MIGRATION_BATCH_SIZE` - Default batch size when `--batch-size`
//!   is not given (default: 100)
//!
//! # Interrupts
//!
//! Ctrl-C requests a graceful stop: the in-flight batch is completed and
//! flushed, the partial report is printed, and a re-run resumes safely
//! because already-migrated links are skipped.

use secrecy::SecretString;
use thiserror::Error;

use kirana_admin::db::{self, MongoCatalog, RepositoryError};
use kirana_admin::services::migration::{
    DEFAULT_BATCH_SIZE, HierarchyMigrator, MigratorOptions, ShutdownFlag,
};
use kirana_core::{LinkErrorKind, MigrationReport};

/// How many error entries to print per level; the full count is always shown.
const ERROR_PREVIEW_LIMIT: usize = 20;

/// Errors from the migrate commands.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Connection error: {0}")]
    Connect(#[from] mongodb::error::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] RepositoryError),

    #[error("Report serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Arguments for the catalog migration command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogArgs {
    /// Batch size override; environment/default otherwise.
    pub batch_size: Option<usize>,
    /// Classify and report without writing anything.
    pub dry_run: bool,
    /// Print the full report as JSON instead of a summary.
    pub json: bool,
}

/// Run the catalog hierarchy migration.
///
/// # Errors
///
/// Returns `MigrateError` on configuration problems or store failures.
/// Orphaned references are not errors - they are part of the report.
pub async fn catalog(args: CatalogArgs) -> Result<(), MigrateError> {
    dotenvy::dotenv().ok();

    let uri = mongodb_uri()?;
    let database =
        std::env::var("KIRANA_MONGODB_DB").unwrap_or_else(|_| "kirana".to_owned());
    let batch_size = match args.batch_size {
        Some(size) => size,
        None => batch_size_from_env()?,
    };
    if batch_size == 0 {
        return Err(MigrateError::InvalidBatchSize);
    }

    tracing::info!(database = %database, "Connecting to MongoDB...");
    let db = db::connect(&uri, &database).await?;

    let shutdown = ShutdownFlag::new();
    spawn_interrupt_handler(shutdown.clone());

    tracing::info!(
        batch_size,
        dry_run = args.dry_run,
        "Running catalog hierarchy migration..."
    );
    let migrator = HierarchyMigrator::new(
        MongoCatalog::new(db),
        MigratorOptions {
            batch_size,
            dry_run: args.dry_run,
        },
    )
    .with_shutdown(shutdown);
    let report = migrator.run().await.map_err(MigrateError::Migration)?;

    if args.json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Read the MongoDB URI with fallback to generic `MONGODB_URI`.
fn mongodb_uri() -> Result<SecretString, MigrateError> {
    std::env::var("KIRANA_MONGODB_URI")
        .or_else(|_| std::env::var("MONGODB_URI"))
        .map(SecretString::from)
        .map_err(|_| MigrateError::MissingEnvVar("KIRANA_MONGODB_URI"))
}

/// Read the default batch size from the environment.
fn batch_size_from_env() -> Result<usize, MigrateError> {
    match std::env::var("KIRANA_MIGRATION_BATCH_SIZE") {
        Ok(value) => value.parse::<usize>().map_err(|e| {
            MigrateError::InvalidEnvVar("KIRANA_MIGRATION_BATCH_SIZE", e.to_string())
        }),
        Err(_) => Ok(DEFAULT_BATCH_SIZE),
    }
}

/// Trigger a graceful stop on the first Ctrl-C.
fn spawn_interrupt_handler(shutdown: ShutdownFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current batch before stopping");
            shutdown.trigger();
        }
    });
}

/// Print the full report as JSON for scripting.
fn print_json(report: &MigrationReport) -> Result<(), MigrateError> {
    let json = serde_json::to_string_pretty(report)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

/// Print a per-level summary with a bounded error preview.
#[allow(clippy::print_stdout)]
fn print_summary(report: &MigrationReport) {
    if report.dry_run {
        println!("DRY RUN - nothing was written");
    }

    for level in &report.levels {
        println!(
            "{}: {} total, {} updated, {} skipped, {} errored",
            level.level, level.total, level.updated, level.skipped, level.errored
        );

        if !level.errors.is_empty() {
            println!(
                "  {} unresolved links (showing up to {ERROR_PREVIEW_LIMIT}):",
                level.errors.len()
            );
            for error in level.preview(ERROR_PREVIEW_LIMIT) {
                match &error.kind {
                    LinkErrorKind::Orphan { legacy_id } => println!(
                        "  - {} [{}] {}: no parent with legacy id {legacy_id:?}",
                        error.entity_name, error.entity_id, error.field
                    ),
                    LinkErrorKind::UnexpectedType { found } => println!(
                        "  - {} [{}] {}: unexpected {found} value",
                        error.entity_name, error.entity_id, error.field
                    ),
                }
            }
            let hidden = level.errors.len().saturating_sub(ERROR_PREVIEW_LIMIT);
            if hidden > 0 {
                println!("  ... and {hidden} more (use --json for the full report)");
            }
        }
    }

    if report.interrupted {
        println!("Interrupted - run again to finish the remaining entities.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_batch_size_matches_engine() {
        // --batch-size omitted and no env var set falls back to the engine default
        assert_eq!(DEFAULT_BATCH_SIZE, 100);
    }

    #[test]
    fn test_invalid_batch_size_message() {
        assert_eq!(
            MigrateError::InvalidBatchSize.to_string(),
            "batch size must be at least 1"
        );
    }
}
