//! Business-logic services for admin.

pub mod migration;

pub use migration::{DEFAULT_BATCH_SIZE, HierarchyMigrator, MigratorOptions, ShutdownFlag};
