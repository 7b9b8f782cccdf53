use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VOLUME_KEY: &str = "thasinn_volume";

/// One catalog entry. Carries both the playback fields and the album-table
/// display fields, so a position in the catalog names a single logical song.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub source: String,
    #[serde(default)]
    pub genre_label: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub cover: String,
}

impl Song {
    pub fn new(title: &str, artist: &str, source: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            source: source.to_string(),
            genre_label: String::new(),
            year: String::new(),
            cover: String::new(),
        }
    }

    pub fn with_album(mut self, genre_label: &str, year: &str, cover: &str) -> Self {
        self.genre_label = genre_label.to_string();
        self.year = year.to_string();
        self.cover = cover.to_string();
        self
    }
}

/// Flat string key/value store persisted between sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Preferences {
    entries: BTreeMap<String, String>,
}

impl Preferences {
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Stored volume, or 1.0 when missing, unparsable or non-finite.
    pub fn volume(&self) -> f32 {
        self.get_item(VOLUME_KEY)
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .map_or(1.0, |value| value.clamp(0.0, 1.0))
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.set_item(VOLUME_KEY, volume.to_string());
    }
}
