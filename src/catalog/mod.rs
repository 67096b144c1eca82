// Catalogs ("discs") - named song collections loaded from static text sources
// Parsing lives in `parser`, fetching in `fetch`, caching + active pointer in `store`

pub mod fetch;
pub mod parser;
pub mod store;

pub use fetch::{FileFetcher, Fetcher, MemoryFetcher, SourceFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use parser::{parse, ParseContext, RecordParser};
pub use store::CatalogStore;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width codes are zero-padded to in the pipe dialect
pub const CODE_WIDTH: usize = 5;

/// A single song record. Never mutated after the parser hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub code: String,
    pub title: String,
    pub artist: String,
    pub catalog_id: String,
    pub catalog_label: String,
}

impl Song {
    pub fn display_title(&self) -> String {
        if self.artist.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

/// Which line format a catalog source uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Header line + `code,title,artist`, quoted fields allowed
    Csv,
    /// `code|title|artist`, code padded to `CODE_WIDTH`
    Pipe,
}

impl Dialect {
    /// Pick the dialect from the source file extension
    pub fn for_source(file: &str) -> Self {
        if file.to_ascii_lowercase().ends_with(".csv") {
            Dialect::Csv
        } else {
            Dialect::Pipe
        }
    }
}

/// One manifest row as it appears in the fetched JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
}

/// A known catalog. `id` is the source file name, which is also the key the
/// ledger stores next to each song code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogInfo {
    pub id: String,
    pub display_name: String,
    pub source_path: String,
    pub dialect: Dialect,
}

impl CatalogInfo {
    /// Build from a manifest row; pipe files live under `disc_dir`
    pub fn from_manifest(entry: &ManifestEntry, disc_dir: &str) -> Self {
        let disc_dir = disc_dir.trim_end_matches('/');
        let source_path = if disc_dir.is_empty() {
            entry.file.clone()
        } else {
            format!("{}/{}", disc_dir, entry.file)
        };

        Self {
            id: entry.file.clone(),
            display_name: entry.name.clone(),
            dialect: Dialect::for_source(&entry.file),
            source_path,
        }
    }

    /// The single implicit catalog backed by the legacy CSV file
    pub fn legacy(csv_path: &str) -> Self {
        Self {
            id: csv_path.to_string(),
            display_name: "All songs".to_string(),
            source_path: csv_path.to_string(),
            dialect: Dialect::Csv,
        }
    }

    pub fn context(&self) -> ParseContext<'_> {
        ParseContext {
            catalog_id: &self.id,
            catalog_label: &self.display_name,
            dialect: self.dialect,
        }
    }
}

impl fmt::Display for CatalogInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_entry_becomes_disc_catalog() {
        let entry = ManifestEntry {
            name: "Disc One".to_string(),
            file: "disc1.txt".to_string(),
        };
        let info = CatalogInfo::from_manifest(&entry, "discs/");

        assert_eq!(info.id, "disc1.txt");
        assert_eq!(info.source_path, "discs/disc1.txt");
        assert_eq!(info.dialect, Dialect::Pipe);
        assert_eq!(info.to_string(), "Disc One");
    }

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::for_source("songs.CSV"), Dialect::Csv);
        assert_eq!(Dialect::for_source("disc2.txt"), Dialect::Pipe);
        assert_eq!(Dialect::for_source("disc3"), Dialect::Pipe);
    }

    #[test]
    fn test_display_title_without_artist() {
        let song = Song {
            code: "00001".to_string(),
            title: "Yesterday".to_string(),
            artist: " ".to_string(),
            catalog_id: "disc1".to_string(),
            catalog_label: "Disc 1".to_string(),
        };
        assert_eq!(song.display_title(), "Yesterday");
    }
}
