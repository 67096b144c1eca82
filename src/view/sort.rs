use std::cmp::Reverse;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{SortDirection, SortField};
use crate::catalog::Song;

/// Stable sort on a collation key of the field. `Desc` flips the key, so songs
/// with equal keys keep their original relative order in both directions.
pub fn sort(songs: &mut [Song], field: SortField, direction: SortDirection) {
    match direction {
        SortDirection::Asc => songs.sort_by_cached_key(|song| collation_key(field.value(song))),
        SortDirection::Desc => songs.sort_by_cached_key(|song| Reverse(collation_key(field.value(song)))),
    }
}

/// Primary key is the case-folded text with accents stripped ("Ángel" sorts
/// with "angel"); the folded text with accents breaks ties between the two.
fn collation_key(value: &str) -> (String, String) {
    let folded: String = value.chars().flat_map(char::to_lowercase).collect();
    let base = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    (base, folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(code: &str, title: &str, artist: &str) -> Song {
        Song {
            code: code.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            catalog_id: "disc1".to_string(),
            catalog_label: "Disc 1".to_string(),
        }
    }

    fn titles(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_title_ascending() {
        let mut songs = vec![song("1", "Yesterday", "Beatles"), song("2", "Hey Jude", "Beatles")];
        sort(&mut songs, SortField::Title, SortDirection::Asc);
        assert_eq!(titles(&songs), vec!["Hey Jude", "Yesterday"]);
    }

    #[test]
    fn test_case_is_ignored() {
        let mut songs = vec![song("1", "banana", "x"), song("2", "Apple", "x"), song("3", "cherry", "x")];
        sort(&mut songs, SortField::Title, SortDirection::Asc);
        assert_eq!(titles(&songs), vec!["Apple", "banana", "cherry"]);

        sort(&mut songs, SortField::Title, SortDirection::Desc);
        assert_eq!(titles(&songs), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_ties_keep_input_order_in_both_directions() {
        let input = vec![
            song("1", "Yesterday", "Beatles"),
            song("2", "Thriller", "Michael Jackson"),
            song("3", "Hey Jude", "beatles"),
            song("4", "Abba Song", "ABBA"),
        ];

        let mut asc = input.clone();
        sort(&mut asc, SortField::Artist, SortDirection::Asc);
        let codes: Vec<&str> = asc.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["4", "1", "3", "2"]);

        let mut desc = input;
        sort(&mut desc, SortField::Artist, SortDirection::Desc);
        let codes: Vec<&str> = desc.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["2", "1", "3", "4"]);
    }

    #[test]
    fn test_accented_titles_sort_with_their_base_letter() {
        let mut songs = vec![
            song("1", "Zapato", "x"),
            song("2", "Ángel", "x"),
            song("3", "Beso", "x"),
            song("4", "Él", "x"),
            song("5", "niña", "x"),
        ];
        sort(&mut songs, SortField::Title, SortDirection::Asc);
        assert_eq!(titles(&songs), vec!["Ángel", "Beso", "Él", "niña", "Zapato"]);

        sort(&mut songs, SortField::Title, SortDirection::Desc);
        assert_eq!(titles(&songs), vec!["Zapato", "niña", "Él", "Beso", "Ángel"]);
    }

    #[test]
    fn test_unaccented_spelling_comes_first_on_ties() {
        let mut songs = vec![song("1", "Canción", "x"), song("2", "cancion", "x")];
        sort(&mut songs, SortField::Title, SortDirection::Asc);
        assert_eq!(titles(&songs), vec!["cancion", "Canción"]);
    }
}
