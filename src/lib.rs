// Songbook Library - Core modules for the terminal song catalog browser
// Catalog loading, the favorites/recents ledger and the view controller live
// here; the binaries only wire them to a terminal or stdout

pub mod catalog; // parsing, fetching and caching song catalogs
pub mod config;  // settings and preferences
pub mod error;   // error taxonomy
pub mod ledger;  // favorites and recently viewed
pub mod store;   // durable key/value persistence
pub mod view;    // search, sort and the session state machine

#[cfg(feature = "tui")]
pub mod ui;      // terminal interface

// Export the stuff other modules actually use
pub use catalog::{CatalogInfo, CatalogStore, Fetcher, ManifestEntry, Song, SourceFetcher};
pub use config::Config;
pub use error::{CatalogError, StoreError};
pub use ledger::Ledger;
pub use store::{open_store, KeyValueStore, MemoryStore};
pub use view::{SearchScope, Session, SortField, ViewMode};
