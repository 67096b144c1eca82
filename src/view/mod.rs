// View layer - turns the active catalog + ledger into the sequence on screen
// search/sort are pure engines; session owns the one mutable view state

pub mod search;
pub mod session;
pub mod sort;

pub use search::filter;
pub use session::{DisplayRow, EmptyState, Notice, Session};
pub use sort::sort;

use std::fmt;

use crate::catalog::Song;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Search,
    Favorites,
    Recent,
    Random,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Search => "Search",
            ViewMode::Favorites => "Favorites",
            ViewMode::Recent => "Recent",
            ViewMode::Random => "Random",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Artist,
}

impl SortField {
    pub fn value<'a>(&self, song: &'a Song) -> &'a str {
        match self {
            SortField::Title => &song.title,
            SortField::Artist => &song.artist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Which fields a query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Title,
    Artist,
    #[default]
    All,
}

impl SearchScope {
    /// all -> title -> artist -> all
    pub fn next(self) -> Self {
        match self {
            SearchScope::All => SearchScope::Title,
            SearchScope::Title => SearchScope::Artist,
            SearchScope::Artist => SearchScope::All,
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchScope::Title => "title",
            SearchScope::Artist => "artist",
            SearchScope::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// Process-wide view state. Never persisted; every session starts from
/// `ViewState::default()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub active_catalog_id: Option<String>,
    /// What is on screen right now. Random mode re-sorts this instead of drawing again.
    pub last_displayed: Vec<Song>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Search,
            sort_field: SortField::Title,
            sort_direction: SortDirection::Asc,
            active_catalog_id: None,
            last_displayed: Vec::new(),
        }
    }
}

impl ViewState {
    /// Same field flips direction, a new field starts ascending
    pub fn apply_sort_request(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }
}
