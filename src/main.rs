use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mysticdeals::logging::init_tracing;
use mysticdeals::scrape::{self, orchestrator};
use mysticdeals::store::Db;
use mysticdeals::util::env as env_util;
use mysticdeals::{freebies, util::env::env_parse};

#[derive(Parser)]
#[command(name = "mysticdeals", about = "Storefront deal scraper and tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the current specials rotation and persist the listings.
    Specials {
        /// How many promoted items to take from the rotation.
        #[arg(long)]
        limit: Option<usize>,
        /// Print the listings as JSON without writing to the store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch and print a single listing by its store page URL.
    Lookup {
        url: String,
        /// Also persist the listing.
        #[arg(long)]
        save: bool,
    },
    /// Print the current free-game offers.
    Freebies,
    /// Create the database schema (idempotent).
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info,sqlx=warn")?;

    let cli = Cli::parse();
    match cli.command {
        Command::Specials { limit, dry_run } => {
            let limit = limit
                .unwrap_or_else(|| env_parse("SPECIALS_LIMIT", scrape::DEFAULT_SPECIALS_LIMIT));
            let client = scrape::http_client()?;
            let outcome = orchestrator::fetch_specials(&client, limit)
                .await
                .context("specials batch failed")?;

            for (id, err) in &outcome.skipped {
                warn!(id = %id, error = %err, "promoted item skipped");
            }
            println!("{}", serde_json::to_string_pretty(&outcome.listings)?);

            if !dry_run {
                let db = Db::connect(&env_util::db_url()).await?;
                db.init_schema().await?;
                for listing in &outcome.listings {
                    db.upsert_listing(listing)
                        .await
                        .with_context(|| format!("storing listing {}", listing.id))?;
                }
                info!(stored = outcome.listings.len(), "specials persisted");
            }
        }
        Command::Lookup { url, save } => {
            let client = scrape::http_client()?;
            let listing = orchestrator::lookup(&client, &url)
                .await
                .with_context(|| format!("looking up {url}"))?;
            println!("{}", serde_json::to_string_pretty(&listing)?);

            if save {
                let db = Db::connect(&env_util::db_url()).await?;
                db.init_schema().await?;
                db.upsert_listing(&listing).await?;
                info!(id = %listing.id, "listing persisted");
            }
        }
        Command::Freebies => {
            let client = scrape::http_client()?;
            let games = freebies::fetch_free_games(&client).await?;
            println!("{}", serde_json::to_string_pretty(&games)?);
        }
        Command::InitDb => {
            let db = Db::connect(&env_util::db_url()).await?;
            db.init_schema().await?;
            info!("schema ready");
        }
    }
    Ok(())
}
