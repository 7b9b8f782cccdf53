use crate::model::Song;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

const ARTIST: &str = "THASINN69";

/// Ordered, read-only song list. A song is identified by its position.
#[derive(Debug, Clone)]
pub struct Catalog {
    songs: Vec<Song>,
}

impl Catalog {
    pub fn new(songs: Vec<Song>) -> Result<Self> {
        if songs.is_empty() {
            bail!("catalog must contain at least one song");
        }
        Ok(Self { songs })
    }

    pub fn builtin() -> Self {
        let songs = vec![
            Song::new("Sakchu ra", ARTIST, "src/Sakchu ra.mp3").with_album(
                "Pop / Independent",
                "2024",
                "src/Sakchu ra.jpg",
            ),
            Song::new("Navanerai", ARTIST, "src/Navanerai.mp3").with_album(
                "R&B / Independent",
                "2023",
                "https://placehold.co/120x80/2a2a2a/FFF?text=ALBUM+2",
            ),
            Song::new("Pardaina", ARTIST, "src/pardaina.mp3").with_album(
                "Soul / Independent",
                "2022",
                "https://placehold.co/120x80/3a3a3a/FFF?text=ALBUM+3",
            ),
            Song::new("Maya", ARTIST, "src/Maya.wav").with_album(
                "Acoustic / Independent",
                "2021",
                "https://placehold.co/120x80/4a4a4a/FFF?text=ALBUM+4",
            ),
            Song::new("Mitho samjhana", ARTIST, "src/Mithosamjhana.mp3").with_album(
                "Folk / Independent",
                "2020",
                "https://placehold.co/120x80/5a5a5a/FFF?text=ALBUM+5",
            ),
            Song::new("Dhilo", ARTIST, "src/Dhilo.mp3").with_album(
                "Ballad / Independent",
                "2019",
                "https://placehold.co/120x80/6a6a6a/FFF?text=ALBUM+6",
            ),
        ];
        Self { songs }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let songs: Vec<Song> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        Self::new(songs).with_context(|| format!("catalog {} is empty", path.display()))
    }

    /// Panics on an out-of-range index: callers only pass indices derived
    /// from `len()`, so a miss means the natural/shuffled mapping is broken.
    pub fn get(&self, index: usize) -> &Song {
        assert!(
            index < self.songs.len(),
            "catalog index {index} out of range (len {})",
            self.songs.len()
        );
        &self.songs[index]
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Natural index a "top songs" entry maps onto.
    pub fn top_song_index(&self, entry: usize) -> usize {
        entry % self.songs.len()
    }

    /// Rewrites relative local locators against `media_root`.
    pub fn resolve_sources(mut self, media_root: &Path) -> Self {
        for song in &mut self.songs {
            song.source = resolve_locator(media_root, &song.source);
            if !song.cover.is_empty() {
                song.cover = resolve_locator(media_root, &song.cover);
            }
        }
        self
    }
}

fn resolve_locator(media_root: &Path, locator: &str) -> String {
    if is_remote(locator) || Path::new(locator).is_absolute() {
        return locator.to_string();
    }
    media_root.join(locator).to_string_lossy().to_string()
}

pub fn is_remote(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
