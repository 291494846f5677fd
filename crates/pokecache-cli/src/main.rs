//! pokecache - command-line front end for the offline Pokémon cache.
//!
//! Looks Pokémon up by name or id, serving from the local store when it can
//! and from PokeAPI when it must, and can pre-populate the whole catalog for
//! offline use.

mod config;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pokecache_core::{ApiClient, CachedData, PokemonStore, Query, Record, Resolver};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;

#[derive(Parser)]
#[command(name = "pokecache")]
#[command(version)]
#[command(about = "Offline-first Pokémon lookups backed by a local cache")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// PokeAPI base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a Pokémon by name or id, fetching and caching it on a miss
    Resolve {
        /// Name or id
        query: String,
    },

    /// Fetch and cache the entire catalog
    Populate,

    /// Show a cached Pokémon without touching the network
    Get {
        /// Name or id
        query: String,
    },

    /// Remove one cached Pokémon
    Delete {
        /// Pokémon id
        id: i64,
    },

    /// Remove every cached Pokémon
    Clear,

    /// Print the number of cached Pokémon
    Count,

    /// Show store location, schema version and size
    Info,

    /// Update and save configuration values
    Config {
        /// Default PokeAPI base URL
        #[arg(long)]
        set_api_url: Option<String>,

        /// Entries fetched concurrently during populate
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between populate batches, in milliseconds
        #[arg(long)]
        batch_delay_ms: Option<u64>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // RUST_LOG wins when set (e.g., RUST_LOG=pokecache_core=debug)
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("Failed to load config")?;
    if cli.database.is_some() {
        config.database_path = cli.database;
    }
    if cli.api_url.is_some() {
        config.api_base_url = cli.api_url;
    }

    match cli.command {
        Commands::Resolve { query } => {
            let resolver = build_resolver(&config, open_store(&config)?)?;
            let resolved = resolver
                .resolve(&query)
                .await
                .ok_or_else(|| anyhow::anyhow!("Pokémon not found: {}", query.trim()))?;
            eprintln!(
                "#{} {} (from {:?})",
                resolved.id().unwrap_or_default(),
                resolved.name().unwrap_or_default(),
                resolved.source
            );
            println!("{}", serde_json::to_string_pretty(&resolved.into_json())?);
        }
        Commands::Populate => {
            let resolver = build_resolver(&config, open_store(&config)?)?;
            populate(&resolver).await;
        }
        Commands::Get { query } => {
            let store = open_store(&config)?;
            let cached = lookup_cached(&store, &query)
                .ok_or_else(|| anyhow::anyhow!("Not cached: {}", query.trim()))?;
            eprintln!("Cached {}", cached.age_display());
            let resolved = cached.into_inner().into_resolved();
            println!("{}", serde_json::to_string_pretty(&resolved.into_json())?);
        }
        Commands::Delete { id } => {
            open_store(&config)?.delete_by_id(id);
            eprintln!("Deleted #{}", id);
        }
        Commands::Clear => {
            open_store(&config)?.clear();
            eprintln!("Cache cleared");
        }
        Commands::Count => {
            println!("{}", open_store(&config)?.count());
        }
        Commands::Info => {
            let store = open_store(&config)?;
            println!("Database:       {}", config.database_path()?.display());
            println!("Schema version: {}", store.schema_version());
            println!("Cached Pokémon: {}", store.count());
            println!("API base URL:   {}", config.api_base_url());
        }
        Commands::Config {
            set_api_url,
            batch_size,
            batch_delay_ms,
        } => {
            // Start from the saved file so one-off flag overrides are not persisted
            let saved = Config::load().context("Failed to load config")?;
            update_config(saved, set_api_url, batch_size, batch_delay_ms)?;
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<PokemonStore>> {
    let db_path = config.database_path()?;
    let store = PokemonStore::open(&db_path)
        .with_context(|| format!("Failed to open store at {}", db_path.display()))?;
    info!(path = %db_path.display(), "Store opened");
    Ok(Arc::new(store))
}

fn build_resolver(config: &Config, store: Arc<PokemonStore>) -> Result<Resolver<ApiClient>> {
    let client = ApiClient::with_base_url(config.api_base_url())
        .context("Failed to build HTTP client")?;
    Ok(Resolver::new(store, client).with_settings(config.populate_settings()))
}

fn lookup_cached(store: &PokemonStore, raw_query: &str) -> Option<CachedData<Record>> {
    Query::parse(raw_query).and_then(|query| store.get_cached(&query))
}

async fn populate(resolver: &Resolver<ApiClient>) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let summary = resolver
        .populate_all(|progress| {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.processed as u64);
            bar.set_message(format!("{} failed", progress.failed));
            Ok(())
        })
        .await;
    bar.finish_and_clear();

    eprintln!(
        "Done! {} of {} Pokémon cached, {} failed.",
        summary.cached, summary.total, summary.failed
    );
}

fn update_config(
    mut config: Config,
    api_url: Option<String>,
    batch_size: Option<usize>,
    batch_delay_ms: Option<u64>,
) -> Result<()> {
    if api_url.is_some() {
        config.api_base_url = api_url;
    }
    if batch_size.is_some() {
        config.batch_size = batch_size;
    }
    if batch_delay_ms.is_some() {
        config.batch_delay_ms = batch_delay_ms;
    }
    config.save().context("Failed to save config")?;

    eprintln!("Saved {}", Config::config_path()?.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
