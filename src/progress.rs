use std::time::Duration;

/// `m:ss`, with non-finite input rendered as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return String::from("0:00");
    }
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{secs:02}")
}

/// Elapsed share of the track in percent; zero while the duration is unknown.
pub fn progress_percent(position: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
        return 0.0;
    }
    (position / duration * 100.0).clamp(0.0, 100.0)
}

/// Horizontal extent of the scrub bar in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarBounds {
    pub left: f64,
    pub width: f64,
}

/// Seek position (seconds) for a pointer press at `pointer_x`, or `None`
/// when there is nothing to seek into.
pub fn seek_target(pointer_x: f64, bar: BarBounds, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 || bar.width <= 0.0 || !pointer_x.is_finite() {
        return None;
    }
    let click_x = (pointer_x - bar.left).clamp(0.0, bar.width);
    Some(click_x / bar.width * duration)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f64,
    pub elapsed: String,
    pub total: String,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            percent: 0.0,
            elapsed: format_time(0.0),
            total: format_time(0.0),
        }
    }
}

/// Derived view of the media position. Fed by the periodic time update and
/// the metadata-ready signal; never talks to the engine itself.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    snapshot: ProgressSnapshot,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_time_update(&mut self, position: Option<Duration>, duration: Option<Duration>) {
        let position = position.map_or(0.0, |value| value.as_secs_f64());
        let duration = duration.map_or(0.0, |value| value.as_secs_f64());
        self.snapshot = ProgressSnapshot {
            percent: progress_percent(position, duration),
            elapsed: format_time(position),
            total: format_time(duration),
        };
    }

    pub fn on_metadata_ready(&mut self, duration: Option<Duration>) {
        if let Some(duration) = duration {
            self.snapshot.total = format_time(duration.as_secs_f64());
        }
    }

    pub fn reset(&mut self) {
        self.snapshot = ProgressSnapshot::default();
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }
}
