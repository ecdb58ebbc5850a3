// Command-line entry point for Ripples.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ripples::infrastructure::{ChangeLoader, SnapshotProvider, TraceCache};
use ripples::{Config, ImpactAnalyzer, OutputFormat, Reporter};

/// Environment variable that overrides `--log-level`.
const LOG_ENV: &str = "RIPPLES_LOG";

#[derive(Parser, Debug)]
#[command(name = "ripples", author, version, about = "Find the binaries a change can reach", long_about = None)]
struct Cli {
    /// Repository root; config and cache paths resolve against it
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    /// Changed symbols (JSON)
    #[arg(short, long)]
    changes: PathBuf,

    /// Analysis snapshot (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Simple)]
    output: OutputFormat,

    /// Config file (default: <repo>/ripples.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persistent cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the trace cache
    #[arg(long)]
    no_cache: bool,

    /// Trace workers (0 = half the cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log filter, e.g. `warn` or `ripples=debug`
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log progress and step timings
    #[arg(short, long)]
    verbose: bool,

    /// Colorize text output
    #[arg(long)]
    color: bool,
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose && cli.log_level == "warn" {
        "info"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::discover(&cli.repo, cli.config.as_deref())?;
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    if let Some(workers) = cli.workers {
        config.concurrency.workers = workers;
    }
    Ok(config)
}

fn open_cache(config: &Config, repo: &std::path::Path) -> Option<Arc<TraceCache>> {
    if !config.cache.enabled {
        return None;
    }
    let dir = config.cache_dir(repo);
    match TraceCache::open(&dir, &config.trace_fingerprint()) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "persistent cache unavailable, using memory only");
            Some(Arc::new(TraceCache::in_memory_only()))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let config = load_config(cli)?;

    let provider = SnapshotProvider::from_file(&cli.snapshot).context("Failed to load analysis snapshot")?;
    info!(
        declarations = provider.declaration_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "snapshot loaded"
    );

    let changes = ChangeLoader::load(&cli.changes).context("Failed to load change set")?;
    info!(symbols = changes.len(), "change set loaded");

    let cache = open_cache(&config, &cli.repo);
    let analyzer = ImpactAnalyzer::new(Arc::new(provider), cache.clone(), &config)?;
    info!(workers = analyzer.worker_count(), "analyzing");

    let affected = analyzer.analyze(&changes)?;

    if let Some(cache) = &cache {
        cache.flush();
        let stats = cache.stats();
        info!(
            persistent_hits = stats.persistent_hits,
            memory_hits = stats.memory_hits,
            misses = stats.misses,
            "trace cache"
        );
    }

    let report = Reporter::new(&affected)
        .with_color(cli.color)
        .render(cli.output)
        .context("Failed to render report")?;
    if !report.is_empty() {
        println!("{}", report);
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
