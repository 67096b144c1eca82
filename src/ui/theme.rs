use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{JsonStoreExt, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colors the renderer pulls from the active theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub favorite: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Theme {
    /// Stored theme, light when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load::<Theme>(THEME_KEY) {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring stored theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        if let Err(e) = store.save(THEME_KEY, self) {
            warn!("Failed to persist theme: {}", e);
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Light => "☾",
            Theme::Dark => "☀",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                favorite: Color::Magenta,
                highlight_bg: Color::Gray,
                error: Color::Red,
            },
            Theme::Dark => Palette {
                text: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                favorite: Color::LightMagenta,
                highlight_bg: Color::DarkGray,
                error: Color::LightRed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_theme_defaults_to_light_and_persists() {
        let store = MemoryStore::new();
        assert_eq!(Theme::load(&store), Theme::Light);

        Theme::Light.toggled().save(&store);
        assert_eq!(store.get_raw(THEME_KEY).unwrap().as_deref(), Some(r#""dark""#));
        assert_eq!(Theme::load(&store), Theme::Dark);
    }
}
