// Favorites + recently viewed - the part of the session that outlives it
// Entries are (code, catalog) pairs so the same code on two discs stays independent

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::Song;
use crate::store::{JsonStoreExt, KeyValueStore, FAVORITES_KEY, RECENTLY_VIEWED_KEY};

pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// A song reference that survives catalog reloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub code: String,
    #[serde(rename = "disc")]
    pub catalog_id: String,
}

impl LedgerEntry {
    pub fn new(code: &str, catalog_id: &str) -> Self {
        Self {
            code: code.to_string(),
            catalog_id: catalog_id.to_string(),
        }
    }

    pub fn matches(&self, song: &Song) -> bool {
        self.code == song.code && self.catalog_id == song.catalog_id
    }
}

/// Persisted shape: current `{code, disc}` objects, or bare codes from the
/// single-catalog days
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Pair(LedgerEntry),
    Bare(String),
}

impl StoredEntry {
    fn into_entry(self, legacy_catalog_id: &str) -> LedgerEntry {
        match self {
            StoredEntry::Pair(entry) => entry,
            StoredEntry::Bare(code) => LedgerEntry::new(&code, legacy_catalog_id),
        }
    }
}

pub struct Ledger {
    favorites: Vec<LedgerEntry>,
    recent: Vec<LedgerEntry>,
    recent_limit: usize,
    store: Arc<dyn KeyValueStore>,
}

impl Ledger {
    /// Load both lists from the store. Bare legacy codes are attributed to
    /// `legacy_catalog_id`; duplicates and overflow from older data are dropped.
    pub fn load(store: Arc<dyn KeyValueStore>, legacy_catalog_id: &str, recent_limit: usize) -> Self {
        let favorites = dedup(Self::load_entries(store.as_ref(), FAVORITES_KEY, legacy_catalog_id));
        let mut recent = dedup(Self::load_entries(store.as_ref(), RECENTLY_VIEWED_KEY, legacy_catalog_id));
        recent.truncate(recent_limit);

        info!(
            "Ledger loaded: {} favorites, {} recently viewed",
            favorites.len(),
            recent.len()
        );

        Self {
            favorites,
            recent,
            recent_limit,
            store,
        }
    }

    fn load_entries(store: &dyn KeyValueStore, key: &str, legacy_catalog_id: &str) -> Vec<LedgerEntry> {
        match store.load::<Vec<StoredEntry>>(key) {
            Ok(Some(entries)) => entries
                .into_iter()
                .map(|entry| entry.into_entry(legacy_catalog_id))
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable '{}' ledger data: {}", key, e);
                Vec::new()
            }
        }
    }

    pub fn is_favorite(&self, code: &str, catalog_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|e| e.code == code && e.catalog_id == catalog_id)
    }

    pub fn is_recent(&self, code: &str, catalog_id: &str) -> bool {
        self.recent
            .iter()
            .any(|e| e.code == code && e.catalog_id == catalog_id)
    }

    /// Flip membership of the pair and persist. Returns the new state.
    pub fn toggle_favorite(&mut self, code: &str, catalog_id: &str) -> bool {
        let now_favorite = match self
            .favorites
            .iter()
            .position(|e| e.code == code && e.catalog_id == catalog_id)
        {
            Some(pos) => {
                self.favorites.remove(pos);
                false
            }
            None => {
                self.favorites.push(LedgerEntry::new(code, catalog_id));
                true
            }
        };

        info!(
            "Favorite {} in '{}' -> {}",
            code,
            catalog_id,
            if now_favorite { "added" } else { "removed" }
        );
        self.persist(FAVORITES_KEY, &self.favorites);
        now_favorite
    }

    /// Move (or insert) the pair to the front of the recent list, cap it, persist
    pub fn record_view(&mut self, code: &str, catalog_id: &str) {
        if let Some(pos) = self
            .recent
            .iter()
            .position(|e| e.code == code && e.catalog_id == catalog_id)
        {
            self.recent.remove(pos);
        }
        self.recent.insert(0, LedgerEntry::new(code, catalog_id));
        self.recent.truncate(self.recent_limit);

        debug!("Viewed {} in '{}' ({} recent)", code, catalog_id, self.recent.len());
        self.persist(RECENTLY_VIEWED_KEY, &self.recent);
    }

    /// Favorited songs of one catalog, in catalog order
    pub fn favorites_for(&self, catalog_id: &str, songs: &[Song]) -> Vec<Song> {
        let projected: Vec<Song> = songs
            .iter()
            .filter(|song| song.catalog_id == catalog_id && self.is_favorite(&song.code, catalog_id))
            .cloned()
            .collect();

        let wanted = self.favorites.iter().filter(|e| e.catalog_id == catalog_id).count();
        if projected.len() < wanted {
            debug!(
                "Dropped {} favorites no longer present in '{}'",
                wanted - projected.len(),
                catalog_id
            );
        }
        projected
    }

    /// Recently viewed songs of one catalog, most recent first
    pub fn recent_for(&self, catalog_id: &str, songs: &[Song]) -> Vec<Song> {
        let by_code: HashMap<&str, &Song> = songs
            .iter()
            .filter(|song| song.catalog_id == catalog_id)
            .map(|song| (song.code.as_str(), song))
            .collect();

        self.recent
            .iter()
            .filter(|e| e.catalog_id == catalog_id)
            .filter_map(|e| {
                let song = by_code.get(e.code.as_str()).copied();
                if song.is_none() {
                    debug!("Recent entry {} no longer resolves in '{}'", e.code, catalog_id);
                }
                song.cloned()
            })
            .collect()
    }

    pub fn favorites(&self) -> &[LedgerEntry] {
        &self.favorites
    }

    pub fn recent(&self) -> &[LedgerEntry] {
        &self.recent
    }

    fn persist(&self, key: &str, entries: &[LedgerEntry]) {
        if let Err(e) = self.store.save(key, entries) {
            warn!("Failed to persist '{}': {}", key, e);
        }
    }
}

fn dedup(entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    let mut seen = std::collections::HashSet::new();
    entries.into_iter().filter(|e| seen.insert(e.clone())).collect()
}
