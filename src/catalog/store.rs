use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{CatalogInfo, Fetcher, ManifestEntry, RecordParser, Song};
use crate::error::CatalogError;
use crate::store::{JsonStoreExt, KeyValueStore, DISCS_KEY};

/// Where the current list of catalogs came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSource {
    Fetched,
    Cached,
    Legacy,
}

/// Holds every known catalog, the parsed songs of those loaded so far, and the
/// pointer to the active one. Parsed catalogs are cached for the lifetime of
/// the process and never re-fetched.
pub struct CatalogStore {
    catalogs: Vec<CatalogInfo>,
    loaded: HashMap<String, Vec<Song>>,
    active_id: Option<String>,
    parser: RecordParser,
    store: Arc<dyn KeyValueStore>,
    disc_dir: String,
}

impl CatalogStore {
    pub fn new(store: Arc<dyn KeyValueStore>, disc_dir: impl Into<String>) -> Self {
        Self {
            catalogs: Vec::new(),
            loaded: HashMap::new(),
            active_id: None,
            parser: RecordParser::new(),
            store,
            disc_dir: disc_dir.into(),
        }
    }

    /// Replace the set of known catalogs and persist the manifest for reuse
    pub fn register_manifest(&mut self, entries: &[ManifestEntry]) {
        self.catalogs = entries
            .iter()
            .map(|entry| CatalogInfo::from_manifest(entry, &self.disc_dir))
            .collect();

        if let Err(e) = self.store.save(DISCS_KEY, entries) {
            warn!("Failed to persist catalog manifest: {}", e);
        }
        info!("Registered {} catalogs from manifest", self.catalogs.len());
    }

    /// Fall back to a single catalog backed by the legacy CSV file
    pub fn register_legacy(&mut self, csv_path: &str) {
        self.catalogs = vec![CatalogInfo::legacy(csv_path)];
        info!("Registered legacy catalog {}", csv_path);
    }

    /// The manifest persisted by the last successful `register_manifest`
    pub fn cached_manifest(&self) -> Option<Vec<ManifestEntry>> {
        match self.store.load::<Vec<ManifestEntry>>(DISCS_KEY) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable cached manifest: {}", e);
                None
            }
        }
    }

    /// Discover the catalog list: fetched manifest, then the cached copy, then
    /// the legacy CSV file when one is configured.
    pub async fn discover<F: Fetcher>(
        &mut self,
        fetcher: &F,
        manifest_path: &str,
        legacy_csv: Option<&str>,
    ) -> Result<ManifestSource, CatalogError> {
        let fetched = fetcher
            .fetch_text(manifest_path)
            .await
            .and_then(|text| Ok(serde_json::from_str::<Vec<ManifestEntry>>(&text)?));

        let failure = match fetched {
            Ok(entries) => {
                self.register_manifest(&entries);
                return Ok(ManifestSource::Fetched);
            }
            Err(e) => {
                warn!("Manifest {} unavailable: {:#}", manifest_path, e);
                e
            }
        };

        if let Some(entries) = self.cached_manifest() {
            info!("Using cached manifest ({} catalogs)", entries.len());
            self.catalogs = entries
                .iter()
                .map(|entry| CatalogInfo::from_manifest(entry, &self.disc_dir))
                .collect();
            return Ok(ManifestSource::Cached);
        }

        if let Some(csv_path) = legacy_csv {
            self.register_legacy(csv_path);
            return Ok(ManifestSource::Legacy);
        }

        Err(CatalogError::SourceUnavailable {
            path: manifest_path.to_string(),
            reason: format!("{:#}", failure),
        })
    }

    pub fn catalogs(&self) -> &[CatalogInfo] {
        &self.catalogs
    }

    pub fn find(&self, catalog_id: &str) -> Option<&CatalogInfo> {
        self.catalogs.iter().find(|c| c.id == catalog_id)
    }

    pub fn is_loaded(&self, catalog_id: &str) -> bool {
        self.loaded.contains_key(catalog_id)
    }

    /// Parsed songs for a catalog, fetching and parsing on first use only
    pub async fn load_catalog<F: Fetcher>(
        &mut self,
        fetcher: &F,
        catalog_id: &str,
    ) -> Result<&[Song], CatalogError> {
        let info = self
            .find(catalog_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCatalog(catalog_id.to_string()))?;

        if !self.loaded.contains_key(catalog_id) {
            let raw = fetcher.fetch_text(&info.source_path).await.map_err(|e| {
                CatalogError::SourceUnavailable {
                    path: info.source_path.clone(),
                    reason: format!("{:#}", e),
                }
            })?;
            let songs = self.parser.parse(&raw, &info.context());
            info!("Loaded catalog '{}': {} songs", info.display_name, songs.len());
            self.loaded.insert(info.id.clone(), songs);
        } else {
            debug!("Catalog '{}' served from cache", info.display_name);
        }

        Ok(self
            .loaded
            .get(catalog_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Point at a catalog that has already been loaded. Anything else is refused
    /// so nothing downstream ever sees a half-loaded catalog.
    pub fn set_active(&mut self, catalog_id: &str) -> Result<(), CatalogError> {
        if self.find(catalog_id).is_none() || !self.loaded.contains_key(catalog_id) {
            return Err(CatalogError::UnknownCatalog(catalog_id.to_string()));
        }
        self.active_id = Some(catalog_id.to_string());
        Ok(())
    }

    pub fn active(&self) -> Option<&CatalogInfo> {
        self.active_id.as_deref().and_then(|id| self.find(id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Songs of the active catalog, empty when nothing is active yet
    pub fn active_songs(&self) -> &[Song] {
        self.active_id
            .as_deref()
            .and_then(|id| self.loaded.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
