use super::SearchScope;
use crate::catalog::Song;

/// Case-insensitive substring filter. An empty (or all-whitespace) query keeps
/// every song; results stay in input order.
pub fn filter(songs: &[Song], query: &str, scope: SearchScope) -> Vec<Song> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return songs.to_vec();
    }

    songs
        .iter()
        .filter(|song| matches(song, &needle, scope))
        .cloned()
        .collect()
}

fn matches(song: &Song, needle: &str, scope: SearchScope) -> bool {
    let in_title = || song.title.to_lowercase().contains(needle);
    let in_artist = || song.artist.to_lowercase().contains(needle);

    match scope {
        SearchScope::Title => in_title(),
        SearchScope::Artist => in_artist(),
        SearchScope::All => in_title() || in_artist(),
    }
}
