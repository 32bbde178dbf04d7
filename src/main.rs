use access_usage::aggregator::{Aggregator, AggregatorOptions};
use access_usage::config::{Config, DatabaseCredentials};
use access_usage::coordinator::FileCoordinator;
use access_usage::display::DisplayManager;
use access_usage::file_discovery::FileDiscovery;
use access_usage::logging;
use access_usage::store::{MemoryStore, PostgresStore, UsageStore};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};

#[derive(Parser)]
#[command(name = "access-usage")]
#[command(about = "Analyse access logs and store per-platform usage statistics")]
#[command(version)]
struct Cli {
    /// Access log files to analyse
    files: Vec<PathBuf>,

    /// Analyse every access log in the scan directory
    #[arg(short = 'a', long)]
    all: bool,

    /// Only save overall log statistics; per-record and per-address rows are not written
    #[arg(short = 'l', long = "log-only")]
    log_only: bool,

    /// Directory scanned by --all
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the pipeline without a database
    #[arg(long)]
    dry_run: bool,

    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = logging::with_bootstrap_logging(|| Config::load(cli.config.as_deref()))?;
    let _log_guard = logging::init_logging(&config.logging);

    run(cli, config).instrument(logging::run_span()).await
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let discovered = if cli.all {
        FileDiscovery::new(config.discovery.name_contains.as_str()).find_access_logs(&cli.dir)?
    } else {
        Vec::new()
    };
    let files = FileDiscovery::merge(cli.files, discovered);

    let store: Arc<dyn UsageStore> = if cli.dry_run {
        info!("Dry run, rows are kept in memory");
        Arc::new(MemoryStore::new())
    } else {
        let credentials = DatabaseCredentials::load(&config.database.credentials_file)?;
        Arc::new(PostgresStore::connect(&credentials, &config.database).await?)
    };
    store
        .create_schema()
        .await
        .context("Failed to prepare usage tables")?;

    let options = AggregatorOptions::from_config(&config.processing, cli.log_only);
    let coordinator = FileCoordinator::new(Aggregator::new(store, options), config.platforms);

    let started = Instant::now();
    let file_count = files.len();
    let outcomes = coordinator.process_files(files).await;

    info!(
        files = file_count,
        failed = outcomes.iter().filter(|o| !o.is_completed()).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Finished run"
    );

    DisplayManager::new().display_run(&outcomes, cli.json);
    Ok(())
}
