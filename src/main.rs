// Songbook - Terminal song catalog browser
// Pick a disc, search it, favorite what you sing, find it again later

use anyhow::Result;
use clap::Parser;
use songbook::{catalog::CatalogStore, open_store, ui::App, Config, Ledger, Session, SourceFetcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "songbook")]
#[command(about = "Browse song catalogs: search, sort, favorite and revisit songs")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog root (directory or http(s) URL), overrides the config
    #[arg(long)]
    source: Option<String>,

    /// Keep favorites, recents and theme in memory only
    #[arg(long)]
    no_persist: bool,
}

fn init_logging(log_dir: &Path, dev: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(log_dir, "songbook.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Base filter: info level for general logs, debug for songbook
    let base_filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,songbook=debug"));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_filter(base_filter());

    // Dev mode mirrors everything to stderr as well
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr).with_filter(base_filter()));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if dev {
        eprintln!("🔧 Dev mode: Debug output enabled to stderr + file");
    }

    // Prevent the guard from being dropped
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - written with defaults on first run
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(source) = args.source {
        config.catalog.source_root = source;
    }

    init_logging(&config.ui.log_dir, args.dev)?;
    info!("🎤 Songbook starting up");
    debug!("Catalog root: {}", config.catalog.source_root);

    let store = open_store(&config.storage.database_path, !args.no_persist)?;
    let fetcher = SourceFetcher::for_root(&config.catalog.source_root)?;

    let catalogs = CatalogStore::new(store.clone(), config.catalog.disc_dir.clone());
    let legacy_id = config.catalog.legacy_csv.as_deref().unwrap_or_default();
    let ledger = Ledger::load(store.clone(), legacy_id, config.ui.recent_limit);
    let session = Session::new(catalogs, ledger, fetcher, config.ui.random_sample_size);

    let mut app = App::new(session, store, &config)?;
    app.run().await?;

    Ok(())
}
