use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn};

use super::{filter, sort, SearchScope, SortField, ViewMode, ViewState};
use crate::catalog::store::ManifestSource;
use crate::catalog::{CatalogInfo, CatalogStore, Fetcher, Song};
use crate::error::CatalogError;
use crate::ledger::Ledger;

pub const DEFAULT_RANDOM_SAMPLE: usize = 10;

/// Why the list is empty. Each one gets its own message on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoCatalog,
    NoResults,
    NoFavorites,
    NoRecent,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyState::NoCatalog => "No catalog loaded yet.",
            EmptyState::NoResults => "No songs found. Try a different search!",
            EmptyState::NoFavorites => "You haven't added any favorites yet! Press space on songs you love.",
            EmptyState::NoRecent => "You haven't viewed any songs yet. Press enter on a song to add it here!",
        }
    }
}

/// Load failure shown in place of the list until the user navigates again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub catalog: String,
    pub message: String,
}

/// One line of the rendered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow<'a> {
    pub song: &'a Song,
    pub is_favorite: bool,
    pub is_recent: bool,
}

/// The view controller. Owns the catalogs, the ledger, the fetcher and the
/// single `ViewState`; every user action goes through one of its methods.
pub struct Session<F: Fetcher> {
    catalogs: CatalogStore,
    ledger: Ledger,
    fetcher: F,
    state: ViewState,
    query: String,
    scope: SearchScope,
    notice: Option<Notice>,
    random_sample_size: usize,
}

impl<F: Fetcher> Session<F> {
    pub fn new(catalogs: CatalogStore, ledger: Ledger, fetcher: F, random_sample_size: usize) -> Self {
        Self {
            catalogs,
            ledger,
            fetcher,
            state: ViewState::default(),
            query: String::new(),
            scope: SearchScope::All,
            notice: None,
            random_sample_size,
        }
    }

    /// Discover the catalog list and activate the first catalog
    pub async fn start(
        &mut self,
        manifest_path: &str,
        legacy_csv: Option<&str>,
    ) -> Result<ManifestSource, CatalogError> {
        let source = match self
            .catalogs
            .discover(&self.fetcher, manifest_path, legacy_csv)
            .await
        {
            Ok(source) => source,
            Err(e) => {
                self.fail(manifest_path, &e);
                return Err(e);
            }
        };

        if let Some(first) = self.catalogs.catalogs().first().map(|c| c.id.clone()) {
            self.switch_catalog(&first).await?;
        } else {
            warn!("Manifest lists no catalogs");
        }
        Ok(source)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Run a search over the active catalog and stay in (or enter) Search
    pub fn search(&mut self, query: &str, scope: SearchScope) {
        self.query = query.to_string();
        self.scope = scope;
        self.enter(ViewMode::Search);
    }

    /// Clear the query, reset the scope and show the whole catalog
    pub fn show_all(&mut self) {
        self.search("", SearchScope::All);
    }

    pub fn show_favorites(&mut self) {
        self.enter(ViewMode::Favorites);
    }

    pub fn show_recent(&mut self) {
        self.enter(ViewMode::Recent);
    }

    /// Draw a fresh sample without replacement and freeze it for later re-sorts
    pub fn show_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.notice = None;
        let mut sample: Vec<Song> = self
            .catalogs
            .active_songs()
            .choose_multiple(rng, self.random_sample_size)
            .cloned()
            .collect();
        sort(&mut sample, self.state.sort_field, self.state.sort_direction);

        debug!("Random sample of {} songs drawn", sample.len());
        self.state.mode = ViewMode::Random;
        self.state.last_displayed = sample;
    }

    /// Sort request from the user. Random reorders its frozen sample, every
    /// other mode is re-derived and then ordered.
    pub fn sort_by(&mut self, field: SortField) {
        self.state.apply_sort_request(field);
        info!(
            "Sorting {} by {:?} {:?}",
            self.state.mode.label(),
            self.state.sort_field,
            self.state.sort_direction
        );

        if self.state.mode == ViewMode::Random {
            sort(
                &mut self.state.last_displayed,
                self.state.sort_field,
                self.state.sort_direction,
            );
            return;
        }

        let mut songs = self.derive(self.state.mode);
        sort(&mut songs, self.state.sort_field, self.state.sort_direction);
        self.state.last_displayed = songs;
    }

    /// Load (if needed) and activate another catalog. On failure the previous
    /// catalog stays active and a notice replaces the list.
    pub async fn switch_catalog(&mut self, catalog_id: &str) -> Result<(), CatalogError> {
        if self.catalogs.find(catalog_id).is_none() {
            let e = CatalogError::UnknownCatalog(catalog_id.to_string());
            warn!("{}", e);
            return Err(e);
        }

        let loaded = self
            .catalogs
            .load_catalog(&self.fetcher, catalog_id)
            .await
            .map(|songs| songs.len());
        if let Err(e) = loaded {
            self.fail(catalog_id, &e);
            return Err(e);
        }
        self.catalogs.set_active(catalog_id)?;

        info!("Active catalog is now '{}'", catalog_id);
        self.state.active_catalog_id = Some(catalog_id.to_string());
        self.state.last_displayed.clear();
        self.query.clear();
        self.enter(ViewMode::Search);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ledger actions
    // ------------------------------------------------------------------

    /// Flip a favorite; the Favorites view is recomputed when it is showing
    pub fn toggle_favorite(&mut self, song: &Song) -> bool {
        let now_favorite = self.ledger.toggle_favorite(&song.code, &song.catalog_id);
        if self.state.mode == ViewMode::Favorites {
            self.enter(ViewMode::Favorites);
        }
        now_favorite
    }

    pub fn record_view(&mut self, song: &Song) {
        self.ledger.record_view(&song.code, &song.catalog_id);
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalogs(&self) -> &[CatalogInfo] {
        self.catalogs.catalogs()
    }

    pub fn active_catalog(&self) -> Option<&CatalogInfo> {
        self.catalogs.active()
    }

    pub fn is_loaded(&self, catalog_id: &str) -> bool {
        self.catalogs.is_loaded(catalog_id)
    }

    /// The current sequence with favorite/recent flags attached
    pub fn rows(&self) -> Vec<DisplayRow<'_>> {
        if self.notice.is_some() {
            return Vec::new();
        }
        self.state
            .last_displayed
            .iter()
            .map(|song| DisplayRow {
                is_favorite: self.ledger.is_favorite(&song.code, &song.catalog_id),
                is_recent: self.ledger.is_recent(&song.code, &song.catalog_id),
                song,
            })
            .collect()
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.state.last_displayed.is_empty() {
            return None;
        }
        Some(match self.state.mode {
            ViewMode::Favorites => EmptyState::NoFavorites,
            ViewMode::Recent => EmptyState::NoRecent,
            _ if self.catalogs.active().is_none() => EmptyState::NoCatalog,
            _ => EmptyState::NoResults,
        })
    }

    /// "All songs" for an unfiltered search, otherwise `<n> <mode>`
    pub fn results_label(&self) -> String {
        let count = self.state.last_displayed.len();
        match self.state.mode {
            ViewMode::Search if count == self.catalogs.active_songs().len() => "All songs".to_string(),
            ViewMode::Search => format!("{} Results", count),
            mode => format!("{} {}", count, mode.label()),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Entering a mode recomputes it from scratch. Recent keeps recency order
    /// and an empty search keeps catalog order; only a typed query or an
    /// explicit sort request orders the whole catalog.
    fn enter(&mut self, mode: ViewMode) {
        self.notice = None;
        self.state.mode = mode;

        let mut songs = self.derive(mode);
        let keeps_source_order = match mode {
            ViewMode::Recent => true,
            ViewMode::Search => self.query.trim().is_empty(),
            ViewMode::Favorites | ViewMode::Random => false,
        };
        if !keeps_source_order {
            sort(&mut songs, self.state.sort_field, self.state.sort_direction);
        }
        debug!("{} view: {} songs", mode.label(), songs.len());
        self.state.last_displayed = songs;
    }

    /// Unsorted sequence for a mode. Random has nothing to derive; it is
    /// whatever sample is frozen.
    fn derive(&self, mode: ViewMode) -> Vec<Song> {
        let songs = self.catalogs.active_songs();
        let catalog_id = self.catalogs.active_id().unwrap_or_default();

        match mode {
            ViewMode::Search => filter(songs, &self.query, self.scope),
            ViewMode::Favorites => self.ledger.favorites_for(catalog_id, songs),
            ViewMode::Recent => self.ledger.recent_for(catalog_id, songs),
            ViewMode::Random => self.state.last_displayed.clone(),
        }
    }

    fn fail(&mut self, what: &str, e: &CatalogError) {
        error!("Error loading songs from {}: {}", what, e);
        self.notice = Some(Notice {
            catalog: what.to_string(),
            message: "Error loading songs. Please try again later.".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryFetcher, ManifestEntry};
    use crate::ledger::DEFAULT_RECENT_LIMIT;
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::view::SortDirection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn fetcher() -> MemoryFetcher {
        let mut disc2 = String::new();
        for i in 1..=30 {
            disc2.push_str(&format!("{}|Song {:02}|Artist {}\n", i, i, i % 3));
        }
        MemoryFetcher::new()
            .with_source("discs/disc1", "1|Yesterday|Beatles\n2|Hey Jude|Beatles\n3|Thriller|Michael Jackson\n")
            .with_source("discs/disc2", &disc2)
    }

    async fn session() -> Session<MemoryFetcher> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut catalogs = CatalogStore::new(store.clone(), "discs");
        catalogs.register_manifest(&[
            ManifestEntry { name: "Disc 1".into(), file: "disc1".into() },
            ManifestEntry { name: "Disc 2".into(), file: "disc2".into() },
            ManifestEntry { name: "Disc 3".into(), file: "disc3".into() },
        ]);
        let ledger = Ledger::load(store, "songs.csv", DEFAULT_RECENT_LIMIT);
        let mut session = Session::new(catalogs, ledger, fetcher(), DEFAULT_RANDOM_SAMPLE);
        session.switch_catalog("disc1").await.unwrap();
        session
    }

    fn titles(session: &Session<MemoryFetcher>) -> Vec<String> {
        session.state().last_displayed.iter().map(|s| s.title.clone()).collect()
    }

    #[tokio::test]
    async fn test_search_then_sort_by_title() {
        let mut session = session().await;
        session.search("beatles", SearchScope::Artist);
        assert_eq!(titles(&session), vec!["Hey Jude", "Yesterday"]);
        assert_eq!(session.results_label(), "2 Results");

        session.sort_by(SortField::Title);
        assert_eq!(session.state().sort_direction, SortDirection::Desc);
        assert_eq!(titles(&session), vec!["Yesterday", "Hey Jude"]);
    }

    #[tokio::test]
    async fn test_empty_query_shows_all_songs() {
        let mut session = session().await;
        session.search("", SearchScope::All);
        assert_eq!(session.state().last_displayed.len(), 3);
        assert_eq!(session.results_label(), "All songs");

        session.search("zzz", SearchScope::All);
        assert_eq!(session.empty_state(), Some(EmptyState::NoResults));
    }

    #[tokio::test]
    async fn test_unfiltered_views_keep_catalog_order() {
        let mut session = session().await;
        let catalog_order = vec!["Yesterday", "Hey Jude", "Thriller"];
        assert_eq!(titles(&session), catalog_order);

        session.search("", SearchScope::All);
        assert_eq!(titles(&session), catalog_order);

        // A typed query is sorted, clearing it goes back to catalog order
        session.search("e", SearchScope::Title);
        assert_eq!(titles(&session), vec!["Hey Jude", "Thriller", "Yesterday"]);
        session.show_all();
        assert_eq!(titles(&session), catalog_order);

        // An explicit sort still orders the whole catalog
        session.sort_by(SortField::Artist);
        assert_eq!(titles(&session), vec!["Yesterday", "Hey Jude", "Thriller"]);
        session.sort_by(SortField::Artist);
        assert_eq!(titles(&session), vec!["Thriller", "Yesterday", "Hey Jude"]);

        session.switch_catalog("disc2").await.unwrap();
        let codes: Vec<&str> = session.state().last_displayed.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes.first(), Some(&"00001"));
        assert_eq!(codes.last(), Some(&"00030"));
    }

    #[tokio::test]
    async fn test_favorites_view_and_empty_state() {
        let mut session = session().await;
        session.show_favorites();
        assert_eq!(session.empty_state(), Some(EmptyState::NoFavorites));

        let yesterday = session.catalogs.active_songs()[0].clone();
        session.search("", SearchScope::All);
        assert!(session.toggle_favorite(&yesterday));
        session.show_favorites();
        assert_eq!(titles(&session), vec!["Yesterday"]);
        assert_eq!(session.results_label(), "1 Favorites");

        // Un-favoriting while looking at favorites recomputes the view
        assert!(!session.toggle_favorite(&yesterday));
        assert!(session.state().last_displayed.is_empty());
        assert_eq!(session.empty_state(), Some(EmptyState::NoFavorites));
    }

    #[tokio::test]
    async fn test_recent_keeps_recency_order_until_sorted() {
        let mut session = session().await;
        let songs = session.catalogs.active_songs().to_vec();
        session.record_view(&songs[0]);
        session.record_view(&songs[2]);
        session.record_view(&songs[1]);

        session.show_recent();
        assert_eq!(titles(&session), vec!["Hey Jude", "Thriller", "Yesterday"]);

        session.sort_by(SortField::Artist);
        assert_eq!(titles(&session), vec!["Hey Jude", "Yesterday", "Thriller"]);

        session.show_recent();
        assert_eq!(titles(&session), vec!["Hey Jude", "Thriller", "Yesterday"]);
    }

    #[tokio::test]
    async fn test_random_sample_is_frozen_across_sorts() {
        let mut session = session().await;
        session.switch_catalog("disc2").await.unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        session.show_random(&mut rng);
        let mut drawn: Vec<String> = session.state().last_displayed.iter().map(|s| s.code.clone()).collect();
        assert_eq!(drawn.len(), DEFAULT_RANDOM_SAMPLE);

        let mut unique = drawn.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), DEFAULT_RANDOM_SAMPLE);

        session.sort_by(SortField::Title);
        session.sort_by(SortField::Artist);
        let mut resorted: Vec<String> = session.state().last_displayed.iter().map(|s| s.code.clone()).collect();
        drawn.sort();
        resorted.sort();
        assert_eq!(drawn, resorted);
        assert_eq!(session.results_label(), "10 Random");
    }

    #[tokio::test]
    async fn test_switch_resets_mode_and_clears_sample() {
        let mut session = session().await;
        let mut rng = StdRng::seed_from_u64(1);
        session.show_random(&mut rng);
        assert_eq!(session.mode(), ViewMode::Random);

        session.search("hey", SearchScope::All);
        session.show_random(&mut rng);
        session.switch_catalog("disc2").await.unwrap();

        assert_eq!(session.mode(), ViewMode::Search);
        assert_eq!(session.query(), "");
        assert_eq!(session.state().active_catalog_id.as_deref(), Some("disc2"));
        assert_eq!(session.state().last_displayed.len(), 30);
        assert!(session.state().last_displayed.iter().all(|s| s.catalog_id == "disc2"));
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_previous_catalog() {
        let mut session = session().await;

        let result = session.switch_catalog("disc3").await;
        assert!(matches!(result, Err(CatalogError::SourceUnavailable { .. })));
        assert_eq!(session.active_catalog().map(|c| c.id.as_str()), Some("disc1"));
        assert!(session.notice().is_some());
        assert!(session.rows().is_empty());

        session.show_all();
        assert!(session.notice().is_none());
        assert_eq!(session.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_catalog_is_a_no_op() {
        let mut session = session().await;
        session.search("hey", SearchScope::All);

        let result = session.switch_catalog("nope").await;
        assert!(matches!(result, Err(CatalogError::UnknownCatalog(_))));
        assert_eq!(session.query(), "hey");
        assert!(session.notice().is_none());
    }

    #[tokio::test]
    async fn test_rows_carry_flags() {
        let mut session = session().await;
        let songs = session.catalogs.active_songs().to_vec();
        session.toggle_favorite(&songs[1]);
        session.record_view(&songs[2]);
        session.show_all();

        let rows = session.rows();
        let hey_jude = rows.iter().find(|r| r.song.title == "Hey Jude").unwrap();
        assert!(hey_jude.is_favorite && !hey_jude.is_recent);
        let thriller = rows.iter().find(|r| r.song.title == "Thriller").unwrap();
        assert!(!thriller.is_favorite && thriller.is_recent);

        // Rows point at the displayed songs instead of copying them
        for (row, song) in rows.iter().zip(&session.state().last_displayed) {
            assert!(std::ptr::eq(row.song, song));
        }
    }
}
