use anyhow::Context;
use clap::{Parser, Subcommand};
use fact_archive::config::{LogFormat, LoggingConfig};
use fact_archive::metrics::METRICS;
use fact_archive::{
    ArchiveStore, Config, CycleOutcome, FactCollector, Scheduler, UselessFactsClient,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fact-archive",
    version,
    about = "Collect random facts into a deduplicated archive"
)]
struct Cli {
    /// Configuration file (defaults to ./fact-archive.toml when present)
    #[arg(long, short, env = "FACT_ARCHIVE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Archive file, overriding the configured path
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one fact and store it if it is new (default)
    Fetch,
    /// Fetch a fact on a fixed interval until interrupted
    Watch {
        /// Seconds between fetches
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many fetches
        #[arg(long)]
        max_cycles: Option<u64>,
    },
    /// Print the stored facts
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.archive {
        config.archive.path = path;
    }
    if let Some(Command::Watch { interval, max_cycles }) = &cli.command {
        if let Some(secs) = interval {
            config.scheduler.interval_secs = *secs;
        }
        if max_cycles.is_some() {
            config.scheduler.max_cycles = *max_cycles;
        }
    }
    config.validate()?;

    init_tracing(&config.logging);
    debug!("Effective configuration: {:?}", config);

    let store = ArchiveStore::new(config.archive.clone());

    match cli.command.unwrap_or(Command::Fetch) {
        Command::List => print_archive(&store)?,
        Command::Fetch => {
            let client = UselessFactsClient::new(config.fetcher.clone())?;
            let collector = FactCollector::new(Arc::new(client), store);
            let outcome = collector.run_cycle().await?;
            report(&outcome, collector.store().path());
        }
        Command::Watch { .. } => {
            let client = UselessFactsClient::new(config.fetcher.clone())?;
            let collector = FactCollector::new(Arc::new(client), store);
            let scheduler = Scheduler::new(collector, config.scheduler.clone());

            println!("Press Ctrl+C to stop.");
            let summary = scheduler.run(shutdown_signal()).await;

            println!(
                "Stopped after {} fetches: {} added, {} duplicates, {} failed.",
                summary.cycles(),
                summary.added,
                summary.duplicates,
                summary.fetch_failures + summary.write_failures + summary.read_failures
            );
            debug!("Metrics:\n{}", METRICS.export_prometheus());
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Resolves on Ctrl+C. Without a signal handler the scheduler runs until
/// `max_cycles` or forever.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn report(outcome: &CycleOutcome, archive: &Path) {
    match outcome {
        CycleOutcome::Added { fact, total } => {
            println!("Added: \"{}\"", fact.text);
            println!("{} now holds {} facts.", archive.display(), total);
        }
        CycleOutcome::Duplicate(fact) => {
            println!("Duplicate, skipped: \"{}\"", fact.text);
        }
        CycleOutcome::FetchFailed(e) if e.is_format_error() => {
            println!("Fetch failed, unexpected API response: {}", e);
        }
        CycleOutcome::FetchFailed(e) => {
            println!("Fetch failed, could not reach the API: {}", e);
        }
    }
}

fn print_archive(store: &ArchiveStore) -> anyhow::Result<()> {
    let archive = store.load()?;
    info!("Listing {} facts from {}", archive.len(), store.path().display());

    if archive.is_empty() {
        println!("Archive is empty.");
        return Ok(());
    }
    for (i, fact) in archive.iter().enumerate() {
        println!("{}. {}", i + 1, fact.text);
        println!("   {}", fact.source);
    }
    Ok(())
}
