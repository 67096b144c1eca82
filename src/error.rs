// Error taxonomy for songbook
// Every failure here is non-fatal to a running session; callers log and carry on

use thiserror::Error;

/// Failures while selecting or loading a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Fetch or parse of a catalog source failed
    #[error("catalog source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// Selection of an id the manifest doesn't know about
    #[error("unknown catalog: {0}")]
    UnknownCatalog(String),
}

/// Failures talking to the persistence adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "persist")]
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}
