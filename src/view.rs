use crate::catalog::Catalog;
use crate::player::{NowPlaying, Player, PlayerState};
use crate::progress::ProgressTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportGlyph {
    Play,
    Pause,
}

impl TransportGlyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Play => "▶",
            Self::Pause => "⏸",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeGlyph {
    Muted,
    Low,
    High,
}

impl VolumeGlyph {
    pub fn for_level(level: f32) -> Self {
        if level <= 0.0 {
            Self::Muted
        } else if level <= 0.5 {
            Self::Low
        } else {
            Self::High
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Muted => "🔇",
            Self::Low => "🔉",
            Self::High => "🔊",
        }
    }
}

/// Visible state of every control, derived from the player state alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affordances {
    pub transport: TransportGlyph,
    pub volume: VolumeGlyph,
    pub slider_level: f32,
    pub shuffle_active: bool,
    pub loop_active: bool,
}

impl Affordances {
    pub fn from_state(state: &PlayerState) -> Self {
        let level = state.audible_volume();
        Self {
            // Shows the action the button performs next.
            transport: if state.is_playing {
                TransportGlyph::Pause
            } else {
                TransportGlyph::Play
            },
            volume: VolumeGlyph::for_level(level),
            slider_level: level,
            shuffle_active: state.is_shuffling,
            loop_active: state.is_looping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRow {
    pub index: usize,
    pub cover: String,
    pub title: String,
    pub artist: String,
    pub genre_label: String,
    pub year: String,
    pub active: bool,
}

/// One row per catalog song, exactly one of them active.
#[derive(Debug, Clone)]
pub struct AlbumTable {
    rows: Vec<AlbumRow>,
    active: usize,
}

impl AlbumTable {
    pub fn render(catalog: &Catalog) -> Self {
        let rows = catalog
            .songs()
            .iter()
            .enumerate()
            .map(|(index, song)| AlbumRow {
                index,
                cover: song.cover.clone(),
                title: song.title.clone(),
                artist: song.artist.clone(),
                genre_label: song.genre_label.clone(),
                year: song.year.clone(),
                active: index == 0,
            })
            .collect();
        Self { rows, active: 0 }
    }

    /// Moves the active flag, touching only the previous and the new row.
    /// Returns whether anything changed.
    pub fn mark_active(&mut self, index: usize) -> bool {
        assert!(
            index < self.rows.len(),
            "album row {index} out of range (len {})",
            self.rows.len()
        );
        if index == self.active {
            return false;
        }
        self.rows[self.active].active = false;
        self.rows[index].active = true;
        self.active = index;
        true
    }

    pub fn rows(&self) -> &[AlbumRow] {
        &self.rows
    }

    pub fn active(&self) -> usize {
        self.active
    }
}

/// Everything the screen shows, kept in step with the player.
#[derive(Debug, Clone)]
pub struct View {
    pub table: AlbumTable,
    pub now_playing: NowPlaying,
    pub affordances: Affordances,
    pub progress: ProgressTracker,
    loaded_source: Option<String>,
}

impl View {
    pub fn new(player: &Player) -> Self {
        let mut view = Self {
            table: AlbumTable::render(player.catalog()),
            now_playing: player.now_playing().clone(),
            affordances: Affordances::from_state(player.state()),
            progress: ProgressTracker::new(),
            loaded_source: None,
        };
        view.sync(player);
        view
    }

    /// Called after every dispatched trigger.
    pub fn sync(&mut self, player: &Player) {
        if self.table.mark_active(player.active_row()) {
            tracing::trace!(row = player.active_row(), "active row moved");
        }
        self.now_playing = player.now_playing().clone();
        self.affordances = Affordances::from_state(player.state());

        let source = player.audio().current_source().map(ToOwned::to_owned);
        if source != self.loaded_source {
            self.progress.reset();
            self.progress.on_metadata_ready(player.duration());
            self.loaded_source = source;
        }
    }

    /// Periodic media position update.
    pub fn on_time_update(&mut self, player: &Player) {
        self.progress
            .on_time_update(player.position(), player.duration());
    }
}
