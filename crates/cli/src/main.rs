//! Kirana CLI - Catalog migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Rewrite legacy catalog parent links as native references
//! kirana-cli migrate catalog
//!
//! # Preview the run without writing anything
//! kirana-cli migrate catalog --dry-run
//!
//! # Smaller batches, full report as JSON
//! kirana-cli migrate catalog --batch-size 50 --json
//! ```
//!
//! # Commands
//!
//! - `migrate catalog` - Run the catalog hierarchy migration

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::migrate::CatalogArgs;

#[derive(Parser)]
#[command(name = "kirana-cli")]
#[command(author, version, about = "Kirana CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run catalog data migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Rewrite legacy string parent links as native references
    Catalog {
        /// Child rows fetched per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Classify and report without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Catalog {
                batch_size,
                dry_run,
                json,
            } => {
                commands::migrate::catalog(CatalogArgs {
                    batch_size,
                    dry_run,
                    json,
                })
                .await?;
            }
        },
    }
    Ok(())
}
