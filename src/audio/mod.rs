use crate::catalog::is_remote;
use anyhow::{Context, Result, bail};
use rodio::Source;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

/// The media engine. Exactly one instance exists per session and the player
/// is its only caller.
pub trait AudioEngine {
    /// Stops whatever is playing and loads `source` paused at position zero.
    fn load(&mut self, source: &str) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_source(&self) -> Option<&str>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn output_name(&self) -> Option<String>;
    /// True once a loaded, unpaused source has played to its end.
    fn is_finished(&self) -> bool;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    current: Option<String>,
    track_duration: Option<Duration>,
    volume: f32,
    muted: bool,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let (stream, sink) = Self::open_output_stream()?;
        sink.pause();

        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
            volume: 1.0,
            muted: false,
        })
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn open_output_stream() -> Result<(OutputStream, Sink)> {
        let mut stream = with_silenced_stderr(|| {
            OutputStreamBuilder::from_default_device()
                .context("failed to open default system output device")?
                .with_error_callback(|err| tracing::warn!(%err, "audio output stream error"))
                .open_stream_or_fallback()
                .context("failed to start default output stream")
        })?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok((stream, sink))
    }
}

impl AudioEngine for RodioAudioEngine {
    fn load(&mut self, source: &str) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.pause();
        self.sink.set_volume(self.effective_volume());
        self.current = None;
        self.track_duration = None;

        if is_remote(source) {
            bail!("remote sources are not supported by the local output: {source}");
        }

        let file = File::open(Path::new(source))
            .with_context(|| format!("failed to open track {source}"))?;
        let decoded =
            Decoder::try_from(file).with_context(|| format!("failed to decode {source}"))?;
        self.track_duration = decoded
            .total_duration()
            .filter(|duration| !duration.is_zero());
        self.sink.append(decoded);
        self.current = Some(source.to_string());
        Ok(())
    }

    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_source(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            bail!("no active track");
        }

        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.effective_volume());
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_volume(self.effective_volume());
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("System default output"))
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

// ALSA and JACK probing print to stderr, which would tear the terminal UI.
#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Engine without an output device. Keeps a logical clock so the progress
/// bar and end-of-track handling behave as they would with real output.
pub struct NullAudioEngine {
    paused: bool,
    current: Option<String>,
    volume: f32,
    muted: bool,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self {
            paused: true,
            current: None,
            volume: 1.0,
            muted: false,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    fn estimate_duration(source: &str) -> Option<Duration> {
        if is_remote(source) {
            return None;
        }
        let file = File::open(source).ok()?;
        let decoded = Decoder::try_from(file).ok()?;
        decoded
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for NullAudioEngine {
    fn load(&mut self, source: &str) -> Result<()> {
        self.paused = true;
        self.current = Some(source.to_string());
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = Self::estimate_duration(source);
        Ok(())
    }

    fn play(&mut self) {
        if self.paused && self.current.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_source(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            bail!("no active track");
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("Null audio engine"))
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioEngine, NullAudioEngine};
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_test_wav(path: &Path, duration_ms: u32) {
        let sample_rate: u32 = 8_000;
        let bytes_per_sample: u32 = 2;
        let total_samples = (u64::from(sample_rate) * u64::from(duration_ms) / 1_000) as u32;
        let data_size = total_samples * bytes_per_sample;

        let mut bytes = Vec::with_capacity((44 + data_size) as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * bytes_per_sample).to_le_bytes());
        bytes.extend_from_slice(&(bytes_per_sample as u16).to_le_bytes());
        bytes.extend_from_slice(&16_u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_size.to_le_bytes());
        bytes.resize((44 + data_size) as usize, 0);

        fs::write(path, bytes).expect("wav fixture should be written");
    }

    #[test]
    fn load_leaves_engine_paused_at_zero() {
        let mut engine = NullAudioEngine::new();
        engine.load("missing.flac").expect("null load never fails");
        assert!(engine.is_paused());
        assert_eq!(engine.position(), Some(Duration::ZERO));
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.position(), Some(Duration::ZERO));
    }

    #[test]
    fn position_advances_only_while_playing() {
        let mut engine = NullAudioEngine::new();
        engine.load("missing.flac").expect("load");
        engine.play();
        thread::sleep(Duration::from_millis(20));

        engine.pause();
        let paused = engine.position().expect("position");
        assert!(paused > Duration::ZERO);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.position().expect("position"), paused);

        engine.play();
        thread::sleep(Duration::from_millis(20));
        assert!(engine.position().expect("position") > paused);
    }

    #[test]
    fn seek_moves_logical_position() {
        let mut engine = NullAudioEngine::new();
        assert!(engine.seek_to(Duration::from_secs(1)).is_err());

        engine.load("missing.flac").expect("load");
        engine.seek_to(Duration::from_secs(12)).expect("seek");
        assert_eq!(engine.position(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn finishes_once_known_duration_elapses() {
        let dir = tempdir().expect("tempdir");
        let track = dir.path().join("fixture.wav");
        write_test_wav(&track, 80);

        let mut engine = NullAudioEngine::new();
        engine.load(&track.to_string_lossy()).expect("load");
        let duration = engine.duration().expect("duration should be detected");
        assert!(duration >= Duration::from_millis(70));
        assert!(!engine.is_finished(), "paused engine never finishes");

        engine.play();
        thread::sleep(Duration::from_millis(120));
        assert!(engine.is_finished());
    }

    #[test]
    fn unknown_duration_never_finishes() {
        let mut engine = NullAudioEngine::new();
        engine.load("https://cdn.example/remote.mp3").expect("load");
        engine.play();
        assert_eq!(engine.duration(), None);
        thread::sleep(Duration::from_millis(30));
        assert!(!engine.is_finished());
    }

    #[test]
    fn mute_does_not_touch_volume() {
        let mut engine = NullAudioEngine::new();
        engine.set_volume(0.6);
        engine.set_muted(true);
        assert!(engine.is_muted());
        assert!((engine.volume() - 0.6).abs() < f32::EPSILON);
        engine.set_volume(3.0);
        assert_eq!(engine.volume(), 1.0);
    }
}
