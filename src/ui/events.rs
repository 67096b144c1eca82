use crossterm::event::{KeyCode, KeyEvent};

/// Where keystrokes are going right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Search,
    CatalogPicker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,

    // Navigation Events
    Up,
    Down,
    ShowAll,
    ShowFavorites,
    ShowRecent,
    ShowRandom,

    // Search Events
    EnterSearch,
    ExitSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    CycleScope,

    // Sort Events
    SortByTitle,
    SortByArtist,

    // Song Events
    ToggleFavorite,
    ViewSong,

    // Catalog Events
    OpenCatalogPicker,
    CloseCatalogPicker,
    PickCatalog,

    ToggleTheme,
}

pub fn key_to_app_event(mode: InputMode, key: KeyEvent) -> Option<AppEvent> {
    match mode {
        InputMode::Browse => browse_key(key),
        InputMode::Search => search_key(key),
        InputMode::CatalogPicker => picker_key(key),
    }
}

fn browse_key(key: KeyEvent) -> Option<AppEvent> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),

        KeyCode::Up | KeyCode::Char('k') => Some(AppEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(AppEvent::Down),

        KeyCode::Char('/') => Some(AppEvent::EnterSearch),
        KeyCode::Tab => Some(AppEvent::CycleScope),
        KeyCode::Char('s') => Some(AppEvent::ShowAll),
        KeyCode::Char('f') => Some(AppEvent::ShowFavorites),
        KeyCode::Char('r') => Some(AppEvent::ShowRecent),
        KeyCode::Char('x') => Some(AppEvent::ShowRandom),

        KeyCode::Char('t') | KeyCode::Char('1') => Some(AppEvent::SortByTitle),
        KeyCode::Char('a') | KeyCode::Char('2') => Some(AppEvent::SortByArtist),

        KeyCode::Char(' ') => Some(AppEvent::ToggleFavorite),
        KeyCode::Enter => Some(AppEvent::ViewSong),

        KeyCode::Char('d') => Some(AppEvent::OpenCatalogPicker),
        KeyCode::Char('T') => Some(AppEvent::ToggleTheme),

        _ => None,
    }
}

fn search_key(key: KeyEvent) -> Option<AppEvent> {
    match key.code {
        KeyCode::Esc => Some(AppEvent::ExitSearch),
        KeyCode::Enter => Some(AppEvent::SubmitSearch),
        KeyCode::Backspace => Some(AppEvent::SearchBackspace),
        KeyCode::Tab => Some(AppEvent::CycleScope),
        KeyCode::Up => Some(AppEvent::Up),
        KeyCode::Down => Some(AppEvent::Down),
        KeyCode::Char(c) => Some(AppEvent::SearchInput(c)),
        _ => None,
    }
}

fn picker_key(key: KeyEvent) -> Option<AppEvent> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(AppEvent::CloseCatalogPicker),
        KeyCode::Enter => Some(AppEvent::PickCatalog),
        KeyCode::Up | KeyCode::Char('k') => Some(AppEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(AppEvent::Down),
        _ => None,
    }
}
