// Songbook catalog dump - non-interactive smoke test for catalog sources
// Loads the manifest, prints every catalog with its song count, optionally runs a search

use anyhow::Result;
use clap::Parser;
use songbook::{catalog::CatalogStore, Config, KeyValueStore, Ledger, MemoryStore, SearchScope, Session, SourceFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "songbook_dump")]
#[command(about = "Print the catalogs a songbook source provides")]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog root (directory or http(s) URL), overrides the config
    #[arg(long)]
    source: Option<String>,

    /// Search every catalog for this text and print the matches
    #[arg(long)]
    search: Option<String>,

    /// Which fields the search looks at: title, artist or all
    #[arg(long, default_value = "all")]
    scope: String,
}

fn parse_scope(scope: &str) -> Result<SearchScope> {
    match scope {
        "all" => Ok(SearchScope::All),
        "title" => Ok(SearchScope::Title),
        "artist" => Ok(SearchScope::Artist),
        other => anyhow::bail!("unknown search scope '{}' (expected title, artist or all)", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,songbook=info")))
        .init();

    let args = Args::parse();
    let scope = parse_scope(&args.scope)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(source) = args.source {
        config.catalog.source_root = source;
    }

    // Never touch the user's ledger from here
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let fetcher = SourceFetcher::for_root(&config.catalog.source_root)?;
    let catalogs = CatalogStore::new(store.clone(), config.catalog.disc_dir.clone());
    let ledger = Ledger::load(store, "", config.ui.recent_limit);
    let mut session = Session::new(catalogs, ledger, fetcher, config.ui.random_sample_size);

    // A failing first catalog still leaves the list to walk through
    match session
        .start(&config.catalog.manifest, config.catalog.legacy_csv.as_deref())
        .await
    {
        Ok(source) => info!("Catalog list from {:?}", source),
        Err(e) if session.catalogs().is_empty() => return Err(e.into()),
        Err(e) => warn!("First catalog failed to load: {}", e),
    }

    println!("📀 {}", config.catalog.source_root);
    println!("===================================");

    let ids: Vec<(String, String)> = session
        .catalogs()
        .iter()
        .map(|c| (c.id.clone(), c.display_name.clone()))
        .collect();

    let mut failures = 0;
    for (id, name) in &ids {
        if let Err(e) = session.switch_catalog(id).await {
            warn!("Skipping {}: {}", id, e);
            println!("❌ {:<30} {}", name, e);
            failures += 1;
            continue;
        }

        match &args.search {
            Some(query) => {
                session.search(query, scope);
                println!("✅ {:<30} {}", name, session.results_label());
                for song in &session.state().last_displayed {
                    println!("   {:<7} {}", song.code, song.display_title());
                }
            }
            None => {
                println!("✅ {:<30} {} songs", name, session.state().last_displayed.len());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} catalogs failed to load", failures, ids.len());
    }
    Ok(())
}
