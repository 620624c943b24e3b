//! rustscopus - Scopus publication harvester
//!
//! Collects a year's (or a quarter's) affiliated publications from the
//! Scopus API and writes them as an RIS file for reference managers.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! rustscopus harvest --year 2023 --quarter 2
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! rustscopus serve --port 5000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustscopus::{
    config::ScopusConfig,
    pipeline::{HarvestOutcome, Harvester},
    query::{Quarter, SearchQuery},
    server::{self, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scopus publication harvester - RIS citation export
#[derive(Parser)]
#[command(name = "rustscopus")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that talks to Scopus
#[derive(clap::Args)]
struct ApiArgs {
    /// Elsevier API key (falls back to SCOPUS_API_KEY, then the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Config file (default: <config dir>/rustscopus/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for RIS files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Results requested per search page
    #[arg(long)]
    page_size: Option<usize>,
}

impl ApiArgs {
    fn resolve(self) -> Result<ScopusConfig> {
        ScopusConfig::resolve(self.api_key, self.config.as_deref(), self.output, self.page_size)
            .context("Failed to load configuration")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest one year or quarter into an RIS file
    Harvest {
        /// Publication year
        #[arg(short, long)]
        year: i32,

        /// Quarter (1-4); omit for the whole year
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=4))]
        quarter: Option<i64>,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (the web form)
        #[arg(long, default_value = server::DEFAULT_ORIGIN)]
        origin: String,

        #[command(flatten)]
        api: ApiArgs,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Harvest { year, quarter, api } => run_harvest(year, quarter, api).await,
        Commands::Serve {
            port,
            host,
            origin,
            api,
        } => run_server(host, port, origin, api).await,
    }
}

// ============================================================================
// Harvest
// ============================================================================

async fn run_harvest(year: i32, quarter: Option<i64>, api: ApiArgs) -> Result<()> {
    let query = match quarter {
        Some(q) => SearchQuery::quarterly(year, Quarter::from_index(q)?),
        None => SearchQuery::annual(year),
    };

    let harvester = Harvester::new(api.resolve()?)?;
    println!("Harvesting {} ...", query);

    let outcome = harvester
        .run(&query)
        .await
        .context("Harvest failed")?;
    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &HarvestOutcome) {
    let summary = &outcome.summary;
    let counts = &summary.counts;

    println!("\nRetrieved {} records.", summary.retrieved);
    if summary.pagination_interrupted {
        println!("Search stopped early; results are partial.");
    }
    println!(
        "Successfully generated references for {} journal articles.",
        counts.journal_articles
    );
    if counts.abstract_fallbacks > 0 {
        println!(
            "{} journal articles used search data because abstract retrieval failed.",
            counts.abstract_fallbacks
        );
    }
    if counts.missing_identifier > 0 {
        println!(
            "{} journal articles had no DOI and were handled separately. Check manually:",
            counts.missing_identifier
        );
        for item in &summary.review {
            println!(
                "\nTitle: {}\nAuthors: {}\nType: {}\nSubtype: {}\nPublication Name: {}",
                item.title,
                item.authors,
                item.aggregation_type,
                item.subtype_description,
                item.publication_name
            );
        }
    }
    if counts.books > 0 || counts.chapters > 0 {
        println!(
            "Generated {} book references and {} book chapter references.",
            counts.books, counts.chapters
        );
    }

    println!(
        "\nStarted {}; time to complete the search: {}s",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.elapsed.as_secs()
    );
    println!("✓ Output: {}", outcome.path.display());
    if let Some(review) = &outcome.review_path {
        println!("✓ Review list: {}", review.display());
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, origin: String, api: ApiArgs) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let harvester = Harvester::new(api.resolve()?)?;
    let state = Arc::new(AppState::new(harvester));
    let app = server::router(state, &origin)?;

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
