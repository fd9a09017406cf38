//! # Catalog Sync CLI
//!
//! Command-line driver for the catalog sync engine.
//!
//! ## Commands
//!
//! - `sync` - Incremental run: stop once the remote catalog is covered
//! - `seed-categories` - Fill the category table if it is empty
//! - `crawl --start N --end M` - Re-pull a detail page range with retries
//! - `crawl-all` - Re-pull every detail page
//! - `listing --start N --end M` - Append list-mode pages to the listing table
//! - `status` - Row counts and the current watermark
//! - `init-config` - Write a default `sync.toml`
//!
//! Every command prints a JSON summary on stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use catalog_db::{Database, DbConfig};
use catalog_sync::{CatalogCrawler, HttpPageSource, SyncConfig, SyncScheduler};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Incremental movie-catalog sync.
#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to sync.toml (defaults to the platform config directory)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(global = true, long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one incremental sync
    Sync,

    /// Seed the category table from the list endpoint
    SeedCategories,

    /// Crawl an explicit range of detail pages
    Crawl {
        /// First page (1-based)
        #[arg(long, default_value = "1")]
        start: u32,

        /// Last page, inclusive
        #[arg(long)]
        end: u32,
    },

    /// Crawl every detail page
    CrawlAll,

    /// Crawl list-mode pages into the listing table
    Listing {
        /// First page (1-based)
        #[arg(long, default_value = "1")]
        start: u32,

        /// Last page, inclusive
        #[arg(long)]
        end: u32,
    },

    /// Show row counts and the current watermark
    Status,

    /// Write a sync.toml with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Sets up the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=catalog=trace` - Show trace for catalog crates only
/// - Default: INFO, DEBUG for catalog crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalog=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes default settings, with the `--db` override applied.
fn init_config(path: Option<PathBuf>, db: Option<PathBuf>, force: bool) -> Result<()> {
    let target = match path.or_else(SyncConfig::default_config_path) {
        Some(target) => target,
        None => bail!("no config directory for this platform; pass --config"),
    };
    if target.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", target.display());
    }

    let mut config = SyncConfig::default();
    if let Some(db) = db {
        config.database.path = db;
    }

    let written = config.save(Some(target)).context("writing configuration")?;
    print_json(&serde_json::json!({ "config": written }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Commands::InitConfig { force } = cli.command {
        return init_config(cli.config, cli.db, force);
    }

    let mut config = SyncConfig::load(cli.config).context("loading configuration")?;
    if let Some(path) = cli.db {
        config.database.path = path;
    }

    info!(
        api = %config.api.base_url,
        db = %config.database.path.display(),
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database.path))
        .await
        .context("opening database")?;
    let source = HttpPageSource::new(&config.api)?;
    let crawler = CatalogCrawler::new(source.clone(), db.clone(), config.crawl);

    match cli.command {
        Commands::Sync => {
            let report = SyncScheduler::new(source, db.catalog()).run().await?;
            print_json(&report)?;
        }
        Commands::SeedCategories => {
            let inserted = crawler.seed_categories().await?;
            print_json(&serde_json::json!({ "inserted": inserted }))?;
        }
        Commands::Crawl { start, end } => print_json(&crawler.crawl_range(start, end).await?)?,
        Commands::CrawlAll => print_json(&crawler.crawl_all().await?)?,
        Commands::Listing { start, end } => print_json(&crawler.crawl_listing(start, end).await?)?,
        Commands::Status => print_json(&crawler.status().await?)?,
        // Handled before the database is opened.
        Commands::InitConfig { .. } => {}
    }

    db.close().await;
    Ok(())
}
