use songbook::catalog::store::ManifestSource;
use songbook::catalog::{CatalogStore, MemoryFetcher};
use songbook::store::{JsonStoreExt, FAVORITES_KEY, RECENTLY_VIEWED_KEY};
use songbook::view::EmptyState;
use songbook::{CatalogError, KeyValueStore, Ledger, MemoryStore, SearchScope, Session, SortField, ViewMode};
use std::sync::Arc;

const MANIFEST: &str = r#"[{"name":"Pop Hits","file":"pop"},{"name":"Rock Classics","file":"rock"}]"#;

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_source("discs.json", MANIFEST)
        .with_source(
            "discs/pop",
            "12|Dancing Queen|ABBA\n7|Yesterday|Beatles\n\n3|Hey Jude|Beatles\n",
        )
        .with_source("discs/rock", "12|Bohemian Rhapsody|Queen\n40|Back in Black|AC/DC\n")
        .with_source(
            "songs.csv",
            "code,title,artist\n1,\"Hello, Goodbye\",Beatles\n2,Imagine,John Lennon\n",
        )
}

fn session_over(store: Arc<dyn KeyValueStore>, fetcher: MemoryFetcher) -> Session<MemoryFetcher> {
    let catalogs = CatalogStore::new(store.clone(), "discs");
    let ledger = Ledger::load(store, "songs.csv", 20);
    Session::new(catalogs, ledger, fetcher, 10)
}

fn titles(session: &Session<MemoryFetcher>) -> Vec<String> {
    session.rows().into_iter().map(|row| row.song.title.clone()).collect()
}

#[tokio::test]
async fn test_browse_favorite_and_restart() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let mut session = session_over(store.clone(), fetcher());
    let source = session.start("discs.json", Some("songs.csv")).await.unwrap();
    assert_eq!(source, ManifestSource::Fetched);
    assert_eq!(session.active_catalog().unwrap().display_name, "Pop Hits");
    // Opening a disc shows it in file order
    assert_eq!(titles(&session), vec!["Dancing Queen", "Yesterday", "Hey Jude"]);
    assert_eq!(session.results_label(), "All songs");

    session.search("BEATLES", SearchScope::Artist);
    let hey_jude = session.rows()[0].song.clone();
    assert_eq!(hey_jude.code, "00003");
    session.toggle_favorite(&hey_jude);
    session.record_view(&hey_jude);

    // Same code on another disc is a different song
    session.switch_catalog("rock").await.unwrap();
    session.show_favorites();
    assert_eq!(session.empty_state(), Some(EmptyState::NoFavorites));
    assert!(session.rows().is_empty());

    session.show_all();
    let queen = session.rows().into_iter().find(|r| r.song.code == "00012").unwrap();
    assert!(!queen.is_favorite);
    let queen = queen.song.clone();
    session.toggle_favorite(&queen);

    drop(session);

    let mut restarted = session_over(store.clone(), fetcher());
    restarted.start("discs.json", None).await.unwrap();
    restarted.show_favorites();
    assert_eq!(titles(&restarted), vec!["Hey Jude"]);
    assert_eq!(restarted.results_label(), "1 Favorites");

    restarted.show_recent();
    assert_eq!(titles(&restarted), vec!["Hey Jude"]);

    restarted.switch_catalog("rock").await.unwrap();
    restarted.show_favorites();
    assert_eq!(titles(&restarted), vec!["Bohemian Rhapsody"]);

    let stored = store.get_raw(FAVORITES_KEY).unwrap().unwrap();
    assert!(stored.contains(r#"{"code":"00003","disc":"pop"}"#));
}

#[tokio::test]
async fn test_cached_manifest_is_used_when_fetch_fails() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    session_over(store.clone(), fetcher())
        .start("discs.json", None)
        .await
        .unwrap();

    let offline = MemoryFetcher::new().with_source("discs/pop", "1|Only Song|Someone\n");
    let mut session = session_over(store, offline);
    let source = session.start("discs.json", Some("songs.csv")).await.unwrap();

    assert_eq!(source, ManifestSource::Cached);
    assert_eq!(session.catalogs().len(), 2);
    assert_eq!(titles(&session), vec!["Only Song"]);

    let result = session.switch_catalog("rock").await;
    assert!(matches!(result, Err(CatalogError::SourceUnavailable { .. })));
    assert_eq!(session.active_catalog().unwrap().id, "pop");
    assert!(session.notice().is_some());
}

#[tokio::test]
async fn test_legacy_csv_with_bare_code_ledger() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.save(FAVORITES_KEY, &["2"]).unwrap();
    store.save(RECENTLY_VIEWED_KEY, &["1", "2"]).unwrap();

    let legacy_only = MemoryFetcher::new().with_source(
        "songs.csv",
        "code,title,artist\n1,\"Hello, Goodbye\",Beatles\n2,Imagine,John Lennon\n",
    );
    let mut session = session_over(store, legacy_only);
    let source = session.start("discs.json", Some("songs.csv")).await.unwrap();
    assert_eq!(source, ManifestSource::Legacy);
    assert_eq!(titles(&session), vec!["Hello, Goodbye", "Imagine"]);

    session.show_favorites();
    assert_eq!(titles(&session), vec!["Imagine"]);

    session.show_recent();
    assert_eq!(titles(&session), vec!["Hello, Goodbye", "Imagine"]);
}

#[tokio::test]
async fn test_nothing_to_load_is_an_error() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut session = session_over(store, MemoryFetcher::new());

    let result = session.start("discs.json", None).await;
    assert!(matches!(result, Err(CatalogError::SourceUnavailable { .. })));
    assert!(session.catalogs().is_empty());
    assert_eq!(session.empty_state(), Some(EmptyState::NoCatalog));
}

#[tokio::test]
async fn test_recent_list_is_capped() {
    let mut disc = String::new();
    for i in 1..=25 {
        disc.push_str(&format!("{}|Track {:02}|Band\n", i, i));
    }
    let fetcher = MemoryFetcher::new()
        .with_source("discs.json", r#"[{"name":"Big","file":"big"}]"#)
        .with_source("discs/big", &disc);

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut session = session_over(store, fetcher);
    session.start("discs.json", None).await.unwrap();

    let songs: Vec<_> = session.rows().into_iter().map(|r| r.song.clone()).collect();
    for song in &songs {
        session.record_view(song);
    }
    // Viewing an old one again moves it to the front instead of duplicating
    session.record_view(&songs[10]);

    session.show_recent();
    let recent = titles(&session);
    assert_eq!(recent.len(), 20);
    assert_eq!(recent[0], "Track 11");
    assert_eq!(recent[1], "Track 25");
    assert!(!recent.contains(&"Track 05".to_string()));
    assert_eq!(session.results_label(), "20 Recent");

    // Title is already the active field, so this flips to descending
    session.sort_by(SortField::Title);
    assert_eq!(session.mode(), ViewMode::Recent);
    let sorted = titles(&session);
    assert_eq!(sorted.first().map(String::as_str), Some("Track 25"));
    assert_eq!(sorted.last().map(String::as_str), Some("Track 06"));
}

#[tokio::test]
async fn test_show_all_keeps_file_order() {
    let fetcher = MemoryFetcher::new()
        .with_source("discs.json", r#"[{"name":"Mixed","file":"mixed"}]"#)
        .with_source("discs/mixed", "1|Yesterday|Beatles\n2|Hey Jude|Beatles\n3|Africa|Toto\n");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut session = session_over(store, fetcher);
    session.start("discs.json", None).await.unwrap();
    let file_order = vec!["Yesterday", "Hey Jude", "Africa"];
    assert_eq!(titles(&session), file_order);

    session.search("", SearchScope::All);
    assert_eq!(titles(&session), file_order);

    session.search("a", SearchScope::Title);
    assert_eq!(titles(&session), vec!["Africa", "Hey Jude", "Yesterday"]);

    session.show_all();
    assert_eq!(titles(&session), file_order);
    assert_eq!(session.results_label(), "All songs");
}
