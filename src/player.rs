use crate::audio::AudioEngine;
use crate::catalog::Catalog;
use crate::config::PreferenceStore;
use crate::model::{Preferences, Song};
use crate::progress::{BarBounds, seek_target};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, warn};

const UNMUTE_FALLBACK_VOLUME: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Position in the active sequence: the shuffle order while shuffling,
    /// natural catalog order otherwise.
    pub current_index: usize,
    pub is_playing: bool,
    pub is_shuffling: bool,
    pub is_looping: bool,
    pub volume: f32,
    pub is_muted: bool,
    pub previous_volume: f32,
    /// Natural indices in play order. Empty unless shuffling.
    pub shuffle_order: Vec<usize>,
}

impl PlayerState {
    /// Level the listener actually hears.
    pub fn audible_volume(&self) -> f32 {
        if self.is_muted { 0.0 } else { self.volume }
    }
}

/// Named user-facing controls plus the engine's end-of-track signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    TogglePlayback,
    Previous,
    Next,
    ToggleShuffle,
    ToggleLoop,
    SetVolume(f32),
    ToggleMute,
    Scrub { pointer_x: f64, bar: BarBounds },
    /// Title link of an album row.
    PlayAlbum(usize),
    /// Anywhere else on an album row.
    PlayRow(usize),
    PlayTopSong(usize),
    TrackEnded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
}

pub struct Player {
    catalog: Catalog,
    state: PlayerState,
    now_playing: NowPlaying,
    audio: Box<dyn AudioEngine>,
    prefs: Preferences,
    store: Box<dyn PreferenceStore>,
    rng: SmallRng,
    last_error: Option<String>,
}

impl Player {
    pub fn new(
        catalog: Catalog,
        audio: Box<dyn AudioEngine>,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        Self::with_rng(catalog, audio, store, SmallRng::from_os_rng())
    }

    pub fn with_rng(
        catalog: Catalog,
        audio: Box<dyn AudioEngine>,
        store: Box<dyn PreferenceStore>,
        rng: SmallRng,
    ) -> Self {
        let prefs = store.load().unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "preferences unavailable, using defaults");
            Preferences::default()
        });
        let volume = prefs.volume();

        let mut player = Self {
            catalog,
            state: PlayerState {
                current_index: 0,
                is_playing: false,
                is_shuffling: false,
                is_looping: false,
                volume,
                is_muted: false,
                previous_volume: 1.0,
                shuffle_order: Vec::new(),
            },
            now_playing: NowPlaying::default(),
            audio,
            prefs,
            store,
            rng,
            last_error: None,
        };
        player.audio.set_volume(volume);
        player.audio.set_muted(false);
        player.load(0);
        player
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.now_playing
    }

    pub fn audio(&self) -> &dyn AudioEngine {
        &*self.audio
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn position(&self) -> Option<Duration> {
        self.audio.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.audio.duration()
    }

    pub fn active_len(&self) -> usize {
        if self.state.is_shuffling {
            self.state.shuffle_order.len()
        } else {
            self.catalog.len()
        }
    }

    /// Catalog index of the song at `position` in the active sequence.
    pub fn natural_index(&self, position: usize) -> usize {
        if !self.state.is_shuffling {
            return position;
        }
        assert!(
            position < self.state.shuffle_order.len(),
            "shuffle position {position} out of range (len {})",
            self.state.shuffle_order.len()
        );
        self.state.shuffle_order[position]
    }

    /// Position of catalog song `natural` in the active sequence.
    pub fn active_position(&self, natural: usize) -> usize {
        if !self.state.is_shuffling {
            return natural;
        }
        match self.state.shuffle_order.iter().position(|idx| *idx == natural) {
            Some(position) => position,
            None => panic!("song {natural} missing from shuffle order"),
        }
    }

    /// Catalog index of the current song; the album row marked active.
    pub fn active_row(&self) -> usize {
        self.natural_index(self.state.current_index)
    }

    pub fn current_song(&self) -> &Song {
        self.catalog.get(self.active_row())
    }

    pub fn load(&mut self, index: usize) {
        assert!(
            index < self.active_len(),
            "active index {index} out of range (len {})",
            self.active_len()
        );
        self.state.current_index = index;

        let song = self.catalog.get(self.natural_index(index));
        self.now_playing = NowPlaying {
            title: song.title.clone(),
            artist: song.artist.clone(),
        };
        let source = song.source.clone();
        debug!(index, source = %source, "loading track");

        match self.audio.load(&source) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                warn!(error = %format!("{err:#}"), source = %source, "track failed to load");
                self.last_error = Some(format!("{err:#}"));
            }
        }
    }

    pub fn play(&mut self) {
        self.state.is_playing = true;
        self.audio.play();
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
        self.audio.pause();
    }

    pub fn toggle_transport(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        let index = (self.state.current_index + 1) % len;
        self.load(index);
        self.play();
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        let index = (self.state.current_index + len - 1) % len;
        self.load(index);
        self.play();
    }

    pub fn toggle_shuffle(&mut self) {
        let natural = self.active_row();
        self.state.is_shuffling = !self.state.is_shuffling;

        if self.state.is_shuffling {
            let mut order: Vec<usize> = (0..self.catalog.len()).collect();
            order.shuffle(&mut self.rng);
            self.state.shuffle_order = order;
        } else {
            self.state.shuffle_order.clear();
        }
        debug!(shuffling = self.state.is_shuffling, "shuffle toggled");

        let index = self.active_position(natural);
        self.load(index);
        if self.state.is_playing {
            self.play();
        }
    }

    pub fn toggle_loop(&mut self) {
        self.state.is_looping = !self.state.is_looping;
        debug!(looping = self.state.is_looping, "loop toggled");
    }

    /// Non-finite input is ignored; everything else is clamped to [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.state.volume = volume;
        self.state.is_muted = false;
        self.state.previous_volume = volume;
        self.audio.set_volume(volume);
        self.audio.set_muted(false);
        self.persist_volume();
    }

    pub fn toggle_mute(&mut self) {
        if self.state.is_muted || self.state.volume == 0.0 {
            self.state.is_muted = false;
            self.state.volume = if self.state.previous_volume > 0.0 {
                self.state.previous_volume
            } else {
                UNMUTE_FALLBACK_VOLUME
            };
            self.audio.set_volume(self.state.volume);
            self.audio.set_muted(false);
        } else {
            self.state.previous_volume = self.state.volume;
            self.state.is_muted = true;
            self.audio.set_muted(true);
        }
        self.persist_volume();
    }

    pub fn seek(&mut self, position: Duration) {
        if let Err(err) = self.audio.seek_to(position) {
            warn!(error = %format!("{err:#}"), "seek failed");
            self.last_error = Some(format!("{err:#}"));
        }
    }

    pub fn scrub(&mut self, pointer_x: f64, bar: BarBounds) {
        let duration = self.audio.duration().map_or(0.0, |value| value.as_secs_f64());
        if let Some(target) = seek_target(pointer_x, bar, duration) {
            self.seek(Duration::from_secs_f64(target));
        }
    }

    /// Album row / top song affordance: start the catalog song `natural`
    /// wherever it sits in the active sequence.
    pub fn select_song(&mut self, natural: usize) {
        let index = self.active_position(natural);
        self.load(index);
        self.play();
    }

    pub fn play_top_song(&mut self, entry: usize) {
        self.select_song(self.catalog.top_song_index(entry));
    }

    pub fn on_track_end(&mut self) {
        if self.state.is_looping {
            self.load(self.state.current_index);
            self.play();
        } else {
            self.next();
        }
    }

    /// Feeds the engine's end-of-track signal back into the machine.
    pub fn poll_track_end(&mut self) -> bool {
        if !self.state.is_playing || !self.audio.is_finished() {
            return false;
        }
        self.on_track_end();
        true
    }

    pub fn dispatch(&mut self, trigger: Trigger) {
        debug!(?trigger, "dispatch");
        match trigger {
            Trigger::TogglePlayback => self.toggle_transport(),
            Trigger::Previous => self.previous(),
            Trigger::Next => self.next(),
            Trigger::ToggleShuffle => self.toggle_shuffle(),
            Trigger::ToggleLoop => self.toggle_loop(),
            Trigger::SetVolume(volume) => self.set_volume(volume),
            Trigger::ToggleMute => self.toggle_mute(),
            Trigger::Scrub { pointer_x, bar } => self.scrub(pointer_x, bar),
            Trigger::PlayAlbum(index) | Trigger::PlayRow(index) => {
                if index < self.catalog.len() {
                    self.select_song(index);
                }
            }
            Trigger::PlayTopSong(entry) => self.play_top_song(entry),
            Trigger::TrackEnded => self.on_track_end(),
        }
    }

    fn persist_volume(&mut self) {
        self.prefs.set_volume(self.state.volume);
        if let Err(err) = self.store.save(&self.prefs) {
            warn!(error = %format!("{err:#}"), "failed to persist volume");
        }
    }
}
