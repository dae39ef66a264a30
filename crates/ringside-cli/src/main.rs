//! Ringside CLI - sync and query the local card catalog
//!
//! Thin wrapper over ringside-core: checks for catalog updates, runs the
//! catalog and image sync, and searches the local store.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ringside_core::api::{ApiClient, DEFAULT_BASE_URL};
use ringside_core::db::{CardQuery, CardRepository, SqliteCardRepository, Store};
use ringside_core::images::ImageCache;
use ringside_core::state::{JsonStateFile, VersionStore};
use ringside_core::sync::{CatalogSync, ImageSync, SyncOutcome, SyncPhase};
use ringside_core::CardType;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "ringside")]
#[command(about = "Offline-first companion for the SRG Supershow card game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory holding the store, sync state, and image cache
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Optional path to the local database file
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Catalog service base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a newer catalog has been published
    Check,
    /// Download and merge the latest catalog
    Sync,
    /// Sync card images against the published image manifest
    Images {
        /// Report pending work without downloading
        #[arg(long)]
        status: bool,
    },
    /// Search the local catalog
    Search {
        /// Free-text term matched against name and rules text
        query: Option<String>,
        /// Filter by card type, e.g. MainDeckCard
        #[arg(long)]
        card_type: Option<String>,
        /// Filter by competitor division
        #[arg(long)]
        division: Option<String>,
        /// Only banned (or with =false, only legal) cards
        #[arg(long)]
        banned: Option<bool>,
        /// Maximum rows to print
        #[arg(short, long, default_value = "25")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] ringside_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown card type: {0}")]
    UnknownCardType(String),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ringside=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);
    let db_path = cli.db_path.unwrap_or_else(|| data_dir.join("cards.db"));

    match cli.command {
        Commands::Check => run_check(&cli.base_url, &data_dir).await,
        Commands::Sync => run_sync(&cli.base_url, &data_dir, &db_path).await,
        Commands::Images { status } => run_images(&cli.base_url, &data_dir, status).await,
        Commands::Search {
            query,
            card_type,
            division,
            banned,
            limit,
            json,
        } => run_search(
            &db_path, &data_dir, query.as_deref(), card_type.as_deref(),
            division.as_deref(), banned, limit, json,
        ),
    }
}

async fn run_check(base_url: &str, data_dir: &Path) -> Result<(), CliError> {
    let client = ApiClient::new(base_url)?;
    let state = JsonStateFile::load(data_dir.join("sync_state.json"))?;
    let sync = CatalogSync::new(client, state);

    let check = sync.check_for_updates().await?;
    if check.available {
        println!(
            "Update available: v{} -> v{}",
            check.current_version,
            check.latest_version.unwrap_or_default()
        );
    } else {
        println!("Catalog is up to date (v{})", check.current_version);
    }
    Ok(())
}

async fn run_sync(base_url: &str, data_dir: &Path, db_path: &Path) -> Result<(), CliError> {
    let client = ApiClient::new(base_url)?;
    let state = JsonStateFile::load(data_dir.join("sync_state.json"))?;
    let mut store = Store::open(db_path, data_dir.join("cards_initial.db"))?;
    let mut sync = CatalogSync::new(client, state);

    let outcome = sync
        .sync_database(&mut store, |phase, fraction| {
            let label = match phase {
                SyncPhase::CheckingManifest => "checking manifest",
                SyncPhase::Downloading => "downloading",
                SyncPhase::Merging => "merging",
                SyncPhase::Done => "done",
            };
            print!("\r{label} ({:.0}%)          ", fraction * 100.0);
            let _ = io::stdout().flush();
        })
        .await?;
    println!();

    match outcome {
        SyncOutcome::UpToDate => {
            println!("Already current (v{})", sync.state().catalog_version());
        }
        SyncOutcome::Updated { version, cards } => {
            println!("Merged catalog v{version} ({cards} cards)");
        }
    }
    Ok(())
}

async fn run_images(base_url: &str, data_dir: &Path, status_only: bool) -> Result<(), CliError> {
    let client = ApiClient::new(base_url)?;
    let cache = ImageCache::new(
        data_dir.join("images"),
        data_dir.join("bundled_manifest.json"),
    );
    let sync = ImageSync::new(client, cache);

    if status_only {
        let status = sync.sync_status().await?;
        println!("{} of {} images pending", status.pending, status.total);
        return Ok(());
    }

    let report = sync
        .sync_images(|downloaded, total| {
            print!("\r{downloaded}/{total} images          ");
            let _ = io::stdout().flush();
        })
        .await?;
    println!();

    if report.downloaded < report.total {
        println!(
            "Downloaded {} of {} images ({} failed)",
            report.downloaded,
            report.total,
            report.total - report.downloaded
        );
    } else {
        println!("Downloaded {} images", report.downloaded);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_search(
    db_path: &Path,
    data_dir: &Path,
    text: Option<&str>,
    card_type: Option<&str>,
    division: Option<&str>,
    banned: Option<bool>,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let store = Store::open(db_path, data_dir.join("cards_initial.db"))?;
    let repo = SqliteCardRepository::new(store.connection());

    let mut query = CardQuery::new();
    if let Some(text) = text {
        query = query.text(text);
    }
    if let Some(raw) = card_type {
        let parsed: CardType = raw
            .parse()
            .map_err(|_| CliError::UnknownCardType(raw.to_string()))?;
        query = query.card_type(parsed);
    }
    if let Some(division) = division {
        query = query.division(division);
    }
    if let Some(banned) = banned {
        query = query.banned(banned);
    }

    let cards = repo.search(&query, limit)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else {
        for card in &cards {
            let marker = if card.is_banned { " [banned]" } else { "" };
            println!("{}  {} ({}){marker}", card.uuid, card.name, card.card_type);
        }
        println!("{} cards", cards.len());
    }
    Ok(())
}

fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os("RINGSIDE_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ringside")
        })
}
