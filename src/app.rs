use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::catalog::Catalog;
use crate::config::{FilePreferences, MemoryPreferences, PreferenceStore};
use crate::decor::{NoiseField, PointerIndicator, Section, SmoothScroll};
use crate::player::{Player, Trigger};
use crate::ui::{self, Hit, HitMap, PageAnchors, Screen};
use crate::view::View;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);
const VOLUME_STEP: f32 = 0.05;
const FULL_ALBUM_HREF: &str = "#music";

pub struct AppStartupOptions {
    pub catalog: Catalog,
    pub force_null_audio: bool,
    pub seed: Option<u64>,
}

pub struct App {
    pub player: Player,
    pub view: View,
    pub noise: NoiseField,
    pub pointer: PointerIndicator,
    pub scroll: SmoothScroll,
    pub hits: HitMap,
    anchors: PageAnchors,
    page_height: u16,
    rng: SmallRng,
    quit: bool,
}

impl App {
    pub fn new(player: Player, rng: SmallRng) -> Self {
        let view = View::new(&player);
        let (_, anchors) = ui::page_lines(&view, player.catalog());
        Self {
            player,
            view,
            noise: NoiseField::default(),
            pointer: PointerIndicator::default(),
            scroll: SmoothScroll::default(),
            hits: HitMap::default(),
            anchors,
            page_height: 0,
            rng,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn dispatch(&mut self, trigger: Trigger) {
        self.player.dispatch(trigger);
        self.view.sync(&self.player);
    }

    /// Media-engine signals: end of track and the periodic position update.
    pub fn pump_media(&mut self, time_update: bool) {
        if self.player.poll_track_end() {
            self.view.sync(&self.player);
        }
        if time_update {
            self.view.on_time_update(&self.player);
        }
    }

    /// One animation frame of the decorative layer.
    pub fn animate(&mut self) {
        self.noise.regenerate(&mut self.rng);
        if !self.scroll.is_settled() {
            self.scroll.step();
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.noise.resize(width, height, &mut self.rng);
        let [page, _, _] = ui::split(ratatui::layout::Rect::new(0, 0, width, height));
        self.page_height = page.height;
    }

    pub fn scroll_to_section(&mut self, section: Section) {
        self.follow_link(section.href());
    }

    /// In-page link. Unknown targets leave the scroll where it is.
    pub fn follow_link(&mut self, href: &str) -> bool {
        let anchors = self.anchors;
        let max = self.max_scroll();
        let followed = self
            .scroll
            .scroll_to_anchor(href, |section| anchors.section(section).min(max));
        if !followed {
            warn!(href, "link target not found");
        }
        followed
    }

    fn max_scroll(&self) -> u16 {
        self.anchors.total.saturating_sub(self.page_height)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char(' ') => self.dispatch(Trigger::TogglePlayback),
            KeyCode::Char('n') | KeyCode::Right => self.dispatch(Trigger::Next),
            KeyCode::Char('p') | KeyCode::Left => self.dispatch(Trigger::Previous),
            KeyCode::Char('s') => self.dispatch(Trigger::ToggleShuffle),
            KeyCode::Char('l') => self.dispatch(Trigger::ToggleLoop),
            KeyCode::Char('m') => self.dispatch(Trigger::ToggleMute),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = self.view.affordances.slider_level + VOLUME_STEP;
                self.dispatch(Trigger::SetVolume(next));
            }
            KeyCode::Char('-') => {
                let next = self.view.affordances.slider_level - VOLUME_STEP;
                self.dispatch(Trigger::SetVolume(next));
            }
            KeyCode::Char('1') => self.scroll_to_section(Section::Home),
            KeyCode::Char('2') => self.scroll_to_section(Section::TopSongs),
            KeyCode::Char('3') => self.scroll_to_section(Section::Music),
            KeyCode::Down => self.scroll.scroll_by(1, self.max_scroll()),
            KeyCode::Up => self.scroll.scroll_by(-1, self.max_scroll()),
            KeyCode::PageDown => self
                .scroll
                .scroll_by(i32::from(self.page_height / 2), self.max_scroll()),
            KeyCode::PageUp => self
                .scroll
                .scroll_by(-i32::from(self.page_height / 2), self.max_scroll()),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let hit = self.hits.at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => {
                self.pointer.move_to(mouse.column, mouse.row, hit.is_some());
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.pointer.move_to(mouse.column, mouse.row, hit.is_some());
                if let Some(hit) = hit {
                    self.activate(hit, mouse.column);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.pointer.move_to(mouse.column, mouse.row, hit.is_some());
                if let Some(hit @ Hit::Volume { .. }) = hit {
                    self.activate(hit, mouse.column);
                }
            }
            MouseEventKind::ScrollDown => self.scroll.scroll_by(3, self.max_scroll()),
            MouseEventKind::ScrollUp => self.scroll.scroll_by(-3, self.max_scroll()),
            _ => {}
        }
    }

    fn activate(&mut self, hit: Hit, column: u16) {
        match hit {
            Hit::Control(trigger) => self.dispatch(trigger),
            Hit::Nav(section) => self.scroll_to_section(section),
            Hit::FullAlbum => {
                self.follow_link(FULL_ALBUM_HREF);
            }
            Hit::Scrub(bar) => self.dispatch(Trigger::Scrub {
                pointer_x: f64::from(column),
                bar,
            }),
            Hit::Volume { left, width } => {
                self.dispatch(Trigger::SetVolume(ui::slider_level(column, left, width)));
            }
        }
    }
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let store: Box<dyn PreferenceStore> = match FilePreferences::in_config_root() {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "no config root, volume will not persist");
            Box::new(MemoryPreferences::default())
        }
    };

    let audio: Box<dyn AudioEngine> = if options.force_null_audio {
        Box::new(NullAudioEngine::new())
    } else {
        match RodioAudioEngine::new() {
            Ok(engine) => Box::new(engine),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "audio output unavailable, using null engine");
                Box::new(NullAudioEngine::new())
            }
        }
    };
    info!(
        output = audio.output_name().as_deref().unwrap_or("-"),
        songs = options.catalog.len(),
        "starting"
    );

    let (shuffle_rng, noise_rng) = startup_rngs(options.seed);
    let player = Player::with_rng(options.catalog, audio, store, shuffle_rng);
    let mut app = App::new(player, noise_rng);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    info!("shutting down");
    result
}

/// Independent streams for the shuffle order and the noise frames.
fn startup_rngs(seed: Option<u64>) -> (SmallRng, SmallRng) {
    let mut shuffle_rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let noise_rng = SmallRng::from_rng(&mut shuffle_rng);
    (shuffle_rng, noise_rng)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut last_time_update = Instant::now();
    let mut last_frame = Instant::now();

    while !app.should_quit() {
        let time_update = last_time_update.elapsed() >= TIME_UPDATE_INTERVAL;
        if time_update {
            last_time_update = Instant::now();
        }
        app.pump_media(time_update);

        if last_frame.elapsed() >= FRAME_INTERVAL {
            app.animate();
            last_frame = Instant::now();
        }

        terminal.draw(|frame| {
            let screen = Screen {
                view: &app.view,
                catalog: app.player.catalog(),
                noise: &app.noise,
                pointer: &app.pointer,
                scroll_offset: app.scroll.offset(),
                status: app.player.last_error(),
            };
            app.hits = ui::draw(frame, &screen);
        })?;

        if !event::poll(FRAME_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => app.handle_key(key),
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::Resize(width, height) => app.resize(width, height),
            _ => {}
        }
    }

    Ok(())
}
