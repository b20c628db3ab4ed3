//! Database operations for the Kirana catalog MongoDB.
//!
//! # Database: `kirana`
//!
//! The catalog hierarchy lives in four collections:
//!
//! ## Collections
//!
//! - `departments` - Top level; legacy key `department_id`
//! - `categories` - Legacy key `idcategory_master`, parent link `dept_id`
//! - `sub_categories` - Legacy key `idsub_category_master`, parent link
//!   `category_id`
//! - `products` - Legacy key `p_code`, parent links `dept_id`,
//!   `category_id`, `sub_category_id`
//!
//! Catalog entities are created and managed elsewhere in the backend; this
//! crate only rewrites the parent-link fields during migration.

use std::time::Duration;

use bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub mod catalog;

pub use catalog::MongoCatalog;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from the MongoDB driver.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Connect to MongoDB and select the application database.
///
/// # Arguments
///
/// * `uri` - MongoDB connection string (wrapped in `SecretString`)
/// * `database` - Database name
///
/// # Errors
///
/// Returns `mongodb::error::Error` if the URI is malformed. Connectivity is
/// verified lazily; use [`ping`] to check it eagerly.
pub async fn connect(
    uri: &SecretString,
    database: &str,
) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(uri.expose_secret()).await?;
    options.app_name = Some("kirana-admin".to_owned());
    options.server_selection_timeout = Some(Duration::from_secs(10));

    let client = Client::with_options(options)?;
    Ok(client.database(database))
}

/// Verify connectivity with a server ping.
///
/// # Errors
///
/// Returns `mongodb::error::Error` if the server is unreachable.
pub async fn ping(db: &Database) -> Result<(), mongodb::error::Error> {
    db.run_command(doc! { "ping": 1 }).await.map(|_| ())
}
