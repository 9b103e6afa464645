mod crawl;
mod logging;

use clap::{Parser, Subcommand};
use jeansdb_core::AppConfig;

use crate::crawl::{CrawlOptions, RecordSink, TracingReporter};

#[derive(Debug, Parser)]
#[command(name = "jeansdb-cli")]
#[command(about = "Crawl the men's jeans catalog into a local SQLite store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl every product and color variant and reconcile them into the store
    Crawl {
        /// Process only the first N products from the listing
        #[arg(long)]
        limit: Option<usize>,

        /// Fetch and normalize without writing to the store
        #[arg(long)]
        dry_run: bool,

        /// Print run totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the full listing URL and the number of products it lists
    Discover,
    /// Create the products table if it does not exist
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = jeansdb_core::load_app_config()?;
    let _log_guard = logging::init_logging(&config.resolved_log_dir(), &config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    let result = match cli.command {
        Commands::Crawl {
            limit,
            dry_run,
            json,
        } => run_crawl_command(&config, limit, dry_run, json).await,
        Commands::Discover => run_discover_command(&config).await,
        Commands::InitDb => run_init_db_command(&config).await,
    };

    if let Err(e) = &result {
        tracing::error!(critical = true, error = %format!("{e:#}"), "jeansdb-cli aborted");
    }
    result
}

async fn run_crawl_command(
    config: &AppConfig,
    limit: Option<usize>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = crawl::build_client(config)?;
    let options = CrawlOptions::from_app_config(config, limit, chrono::Local::now().date_naive());

    let totals = if dry_run {
        crawl::run_crawl(&client, RecordSink::DryRun, &options, &TracingReporter).await?
    } else {
        let (pool, table) = crawl::open_store(config).await?;
        let sink = RecordSink::Store {
            pool: &pool,
            table: &table,
        };
        let totals = crawl::run_crawl(&client, sink, &options, &TracingReporter).await;
        pool.close().await;
        totals?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        println!("{totals}");
    }
    Ok(())
}

async fn run_discover_command(config: &AppConfig) -> anyhow::Result<()> {
    let client = crawl::build_client(config)?;
    let (listing_url, product_ids) = crawl::discover_catalog(&client, &config.base_url).await?;
    println!("{listing_url}");
    println!("{} products", product_ids.len());
    Ok(())
}

async fn run_init_db_command(config: &AppConfig) -> anyhow::Result<()> {
    let (pool, table) = crawl::open_store(config).await?;
    let count = jeansdb_db::count_products(&pool, &table).await?;
    pool.close().await;
    println!(
        "table {table} ready in {} ({count} products)",
        config.resolved_database_path().display()
    );
    Ok(())
}
