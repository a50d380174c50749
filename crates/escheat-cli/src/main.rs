//! Escheat - unclaimed property toolkit CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use escheat_common::logging::{init_logging, LogConfig};
use escheat_server::config::{Config, TIERED_ARCHIVES};
use escheat_server::db;
use escheat_server::ingest::{BatchLoader, SourceFetcher, SyncOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "escheat")]
#[command(author, version, about = "CA unclaimed property toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download source archives and build the database
    Sync {
        /// Ingest the four amount-tiered archives instead of the full dump
        #[arg(long)]
        tiered: bool,

        /// Explicit archive locations, in order (overrides configuration)
        #[arg(long = "archive")]
        archives: Vec<String>,
    },

    /// Search records by owner or holder text
    Search {
        /// Query text (two characters minimum)
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },

    /// Fetch one record by property id
    Get {
        property_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,escheat_server=debug,escheat_cli=debug"
    } else {
        "info"
    };
    init_logging(&LogConfig::from_env(default_filter, "escheat"))?;

    let config = Config::load()?;
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    match cli.command {
        Command::Sync { tiered, archives } => {
            let locations: Vec<String> = if !archives.is_empty() {
                archives
            } else if tiered {
                TIERED_ARCHIVES.iter().map(|s| s.to_string()).collect()
            } else {
                config.source.archives.clone()
            };

            let fetcher = SourceFetcher::new(&config.source)?;
            let loader = BatchLoader::new(pool.clone());
            let orchestrator = SyncOrchestrator::new(fetcher, loader, config.ingest.chunk_size);

            let summary = orchestrator.run(&locations).await?;
            info!(db = %config.database.path, "Sync complete - database ready");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        },
        Command::Search { query, limit } => {
            let results = db::search::search(&pool, &query, limit).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        },
        Command::Get { property_id } => {
            let property = db::search::lookup(&pool, &property_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("property not found: {property_id}"))?;
            println!("{}", serde_json::to_string_pretty(&property)?);
        },
    }

    Ok(())
}
