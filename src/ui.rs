use crate::catalog::Catalog;
use crate::decor::{self, NoiseField, PointerIndicator, Section};
use crate::player::Trigger;
use crate::progress::BarBounds;
use crate::view::View;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub const TOP_SONG_COUNT: usize = 5;
const PLAYER_BAR_HEIGHT: u16 = 5;
const VOLUME_SLIDER_WIDTH: u16 = 12;

const BG: Color = Color::Rgb(10, 10, 12);
const TEXT: Color = Color::Rgb(232, 230, 226);
const MUTED: Color = Color::Rgb(140, 138, 134);
const ACCENT: Color = Color::Rgb(226, 88, 62);
const BORDER: Color = Color::Rgb(70, 68, 66);
const ACTIVE_BG: Color = Color::Rgb(44, 30, 28);

/// What a screen cell does when clicked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Control(Trigger),
    Nav(Section),
    FullAlbum,
    Scrub(BarBounds),
    Volume { left: u16, width: u16 },
}

#[derive(Debug, Clone, Default)]
pub struct HitMap {
    regions: Vec<(Rect, Hit)>,
}

impl HitMap {
    pub fn push(&mut self, rect: Rect, hit: Hit) {
        if rect.width > 0 && rect.height > 0 {
            self.regions.push((rect, hit));
        }
    }

    /// Topmost region under the point.
    pub fn at(&self, column: u16, row: u16) -> Option<Hit> {
        self.regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(Position::new(column, row)))
            .map(|(_, hit)| *hit)
    }
}

/// Line offsets of the section anchors inside the scrollable page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageAnchors {
    pub home: u16,
    pub full_album: u16,
    pub top_songs: u16,
    pub first_top_song: u16,
    pub music: u16,
    pub first_album_row: u16,
    pub total: u16,
}

impl PageAnchors {
    pub fn section(&self, section: Section) -> u16 {
        match section {
            Section::Home => self.home,
            Section::TopSongs => self.top_songs,
            Section::Music => self.music,
        }
    }
}

pub struct Screen<'a> {
    pub view: &'a View,
    pub catalog: &'a Catalog,
    pub noise: &'a NoiseField,
    pub pointer: &'a PointerIndicator,
    pub scroll_offset: u16,
    pub status: Option<&'a str>,
}

pub fn page_lines(view: &View, catalog: &Catalog) -> (Vec<Line<'static>>, PageAnchors) {
    let mut lines = Vec::new();
    let mut anchors = PageAnchors {
        home: 0,
        ..PageAnchors::default()
    };

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  T H A S I N N 6 9",
        Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "  independent songs, recorded at home",
        Style::default().fg(MUTED),
    )));
    lines.push(Line::from(""));
    anchors.full_album = lines.len() as u16;
    lines.push(Line::from(Span::styled(
        "  [ Full album ]",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    anchors.top_songs = lines.len() as u16;
    lines.push(section_heading("Top Songs"));
    anchors.first_top_song = lines.len() as u16;
    for entry in 0..TOP_SONG_COUNT {
        let song = catalog.get(catalog.top_song_index(entry));
        lines.push(Line::from(vec![
            Span::styled(format!("  {:02}  ", entry + 1), Style::default().fg(MUTED)),
            Span::styled(song.title.clone(), Style::default().fg(TEXT)),
            Span::styled(format!("  {}", song.artist), Style::default().fg(MUTED)),
        ]));
    }
    lines.push(Line::from(""));

    anchors.music = lines.len() as u16;
    lines.push(section_heading("Music"));
    lines.push(Line::from(Span::styled(
        format!(
            "  {:<3} {:<22} {:<14} {:<24} {}",
            "#", "Title", "Artist", "Genre", "Year"
        ),
        Style::default().fg(MUTED),
    )));
    anchors.first_album_row = lines.len() as u16;
    for row in view.table.rows() {
        let marker = if row.active { "> " } else { "  " };
        let style = if row.active {
            Style::default()
                .fg(ACCENT)
                .bg(ACTIVE_BG)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, style),
            Span::styled(format!("{:<3} ", row.index + 1), style),
            Span::styled(
                format!("{:<22} ", row.title),
                style.add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled(
                format!("{:<14} {:<24} {}", row.artist, row.genre_label, row.year),
                style,
            ),
        ]));
    }
    lines.push(Line::from(""));

    anchors.total = lines.len() as u16;
    (lines, anchors)
}

fn section_heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  :: {title} ::"),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

pub fn split(area: Rect) -> [Rect; 3] {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(PLAYER_BAR_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);
    [vertical[0], vertical[1], vertical[2]]
}

pub fn draw(frame: &mut Frame, screen: &Screen) -> HitMap {
    let mut hits = HitMap::default();
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(BG)), area);
    frame.render_widget(NoiseBackground(screen.noise), area);

    let [page_area, bar_area, footer_area] = split(area);
    draw_page(frame, screen, page_area, &mut hits);
    draw_player_bar(frame, screen, bar_area, &mut hits);
    draw_footer(frame, footer_area, &mut hits);

    if let Some((x, y)) = screen.pointer.position
        && let Some(cell) = frame.buffer_mut().cell_mut((x, y))
    {
        let style = if screen.pointer.hovered {
            Style::default().bg(ACCENT).fg(BG)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        };
        cell.set_style(style);
    }

    hits
}

fn draw_page(frame: &mut Frame, screen: &Screen, area: Rect, hits: &mut HitMap) {
    let (lines, anchors) = page_lines(screen.view, screen.catalog);
    let offset = screen.scroll_offset;
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);

    let line_rect = |line: u16, x: u16, width: u16| -> Rect {
        if line < offset || line - offset >= area.height {
            return Rect::default();
        }
        Rect {
            x: area.x.saturating_add(x),
            y: area.y + (line - offset),
            width: width.min(area.width.saturating_sub(x)),
            height: 1,
        }
    };

    hits.push(line_rect(anchors.full_album, 2, 14), Hit::FullAlbum);
    for entry in 0..TOP_SONG_COUNT {
        hits.push(
            line_rect(anchors.first_top_song + entry as u16, 0, area.width),
            Hit::Control(Trigger::PlayTopSong(entry)),
        );
    }
    for row in screen.view.table.rows() {
        let line = anchors.first_album_row + row.index as u16;
        hits.push(
            line_rect(line, 0, area.width),
            Hit::Control(Trigger::PlayRow(row.index)),
        );
        // Title link sits on top of the whole-row fallback.
        hits.push(
            line_rect(line, 6, 22),
            Hit::Control(Trigger::PlayAlbum(row.index)),
        );
    }
}

fn draw_player_bar(frame: &mut Frame, screen: &Screen, area: Rect, hits: &mut HitMap) {
    let view = screen.view;
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(BORDER))
        .style(Style::default().bg(BG));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 3 {
        return;
    }

    let mut info = vec![
        Span::styled(
            format!(" {}", view.now_playing.title),
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", view.now_playing.artist),
            Style::default().fg(MUTED),
        ),
    ];
    if let Some(status) = screen.status {
        info.push(Span::styled(
            format!("  ! {status}"),
            Style::default().fg(ACCENT),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(info)),
        Rect { height: 1, ..inner },
    );

    let affordances = view.affordances;
    let toggle_style = |active: bool| {
        if active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        }
    };
    let controls: Vec<(Span, Option<Hit>)> = vec![
        (Span::raw(" "), None),
        (
            Span::styled("[|<]", Style::default().fg(TEXT)),
            Some(Hit::Control(Trigger::Previous)),
        ),
        (Span::raw(" "), None),
        (
            Span::styled(
                format!("[ {} ]", affordances.transport.symbol()),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Some(Hit::Control(Trigger::TogglePlayback)),
        ),
        (Span::raw(" "), None),
        (
            Span::styled("[>|]", Style::default().fg(TEXT)),
            Some(Hit::Control(Trigger::Next)),
        ),
        (Span::raw("   "), None),
        (
            Span::styled("[shuffle]", toggle_style(affordances.shuffle_active)),
            Some(Hit::Control(Trigger::ToggleShuffle)),
        ),
        (Span::raw(" "), None),
        (
            Span::styled("[loop]", toggle_style(affordances.loop_active)),
            Some(Hit::Control(Trigger::ToggleLoop)),
        ),
        (Span::raw("   "), None),
        (
            Span::styled(
                format!("[{}]", affordances.volume.symbol()),
                Style::default().fg(TEXT),
            ),
            Some(Hit::Control(Trigger::ToggleMute)),
        ),
        (Span::raw(" "), None),
    ];

    let controls_row = inner.y + 1;
    let mut x = inner.x;
    let mut spans = Vec::with_capacity(controls.len() + 1);
    for (span, hit) in controls {
        let width = span.width() as u16;
        if let Some(hit) = hit {
            hits.push(
                Rect {
                    x,
                    y: controls_row,
                    width,
                    height: 1,
                },
                hit,
            );
        }
        x = x.saturating_add(width);
        spans.push(span);
    }
    let slider = level_bar(affordances.slider_level, VOLUME_SLIDER_WIDTH as usize);
    hits.push(
        Rect {
            x,
            y: controls_row,
            width: VOLUME_SLIDER_WIDTH,
            height: 1,
        },
        Hit::Volume {
            left: x,
            width: VOLUME_SLIDER_WIDTH,
        },
    );
    spans.push(Span::styled(slider, Style::default().fg(TEXT)));
    frame.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect {
            y: controls_row,
            height: 1,
            ..inner
        },
    );

    let progress = view.progress.snapshot();
    let elapsed = format!(" {} ", progress.elapsed);
    let total = format!(" {}", progress.total);
    // Clickable width excludes the brackets drawn around the bar.
    let bar_width = inner
        .width
        .saturating_sub((elapsed.len() + total.len()) as u16 + 2);
    let bar_left = inner.x + elapsed.len() as u16 + 1;
    let progress_row = inner.y + 2;
    hits.push(
        Rect {
            x: bar_left,
            y: progress_row,
            width: bar_width,
            height: 1,
        },
        Hit::Scrub(BarBounds {
            left: f64::from(bar_left),
            width: f64::from(bar_width),
        }),
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(elapsed, Style::default().fg(MUTED)),
            Span::styled(
                scrub_bar(progress.percent, bar_width as usize + 2),
                Style::default().fg(ACCENT),
            ),
            Span::styled(total, Style::default().fg(MUTED)),
        ])),
        Rect {
            y: progress_row,
            height: 1,
            ..inner
        },
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, hits: &mut HitMap) {
    let mut spans = vec![Span::raw(" ")];
    let mut x = area.x + 1;
    for section in Section::ALL {
        let label = section.label();
        hits.push(
            Rect {
                x,
                y: area.y,
                width: label.len() as u16,
                height: 1,
            },
            Hit::Nav(section),
        );
        spans.push(Span::styled(
            label,
            Style::default().fg(TEXT).add_modifier(Modifier::UNDERLINED),
        ));
        spans.push(Span::raw("   "));
        x += label.len() as u16 + 3;
    }
    spans.push(Span::styled(
        "space play  n/p skip  s shuffle  l loop  m mute  +/- vol  1-3 jump  q quit",
        Style::default().fg(MUTED),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

/// `[=====o-----]` with the thumb at `percent`.
pub fn scrub_bar(percent: f64, width: usize) -> String {
    if width < 3 {
        return String::new();
    }
    let inner = width - 2;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * inner as f64).round() as usize;
    let thumb = filled.min(inner - 1);
    let mut bar = String::with_capacity(width);
    bar.push('[');
    for idx in 0..inner {
        bar.push(if idx == thumb {
            'o'
        } else if idx < thumb {
            '='
        } else {
            '-'
        });
    }
    bar.push(']');
    bar
}

fn level_bar(level: f32, width: usize) -> String {
    let inner = width.saturating_sub(2);
    let filled = (f64::from(level.clamp(0.0, 1.0)) * inner as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(inner - filled))
}

/// Volume level for a press on the slider at `column`. `left` is the column
/// of the opening bracket; the level fills up to and including the pressed cell.
pub fn slider_level(column: u16, left: u16, width: u16) -> f32 {
    let inner = width.saturating_sub(2);
    if inner == 0 {
        return 0.0;
    }
    let filled = column.saturating_sub(left).min(inner);
    f32::from(filled) / f32::from(inner)
}

struct NoiseBackground<'a>(&'a NoiseField);

impl Widget for NoiseBackground<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let Some(pixel) = self.0.pixel(x - area.x, y - area.y) else {
                    continue;
                };
                let intensity = u16::from(decor::grey(pixel)) * u16::from(decor::alpha(pixel)) / 255;
                let glyph = match intensity {
                    0..=11 => continue,
                    12..=17 => '.',
                    _ => '·',
                };
                let shade = 30 + (intensity as u8) * 2;
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(glyph).set_fg(Color::Rgb(shade, shade, shade));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudioEngine;
    use crate::config::MemoryPreferences;
    use crate::player::Player;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn player() -> Player {
        Player::with_rng(
            Catalog::builtin(),
            Box::new(NullAudioEngine::new()),
            Box::new(MemoryPreferences::default()),
            SmallRng::seed_from_u64(5),
        )
    }

    #[test]
    fn scrub_bar_places_thumb() {
        assert_eq!(scrub_bar(0.0, 7), "[o----]");
        assert_eq!(scrub_bar(50.0, 12), "[=====o----]");
        assert_eq!(scrub_bar(100.0, 7), "[====o]");
        assert_eq!(scrub_bar(40.0, 2), "");
    }

    #[test]
    fn slider_maps_columns_to_levels() {
        assert_eq!(slider_level(10, 10, 12), 0.0);
        assert_eq!(slider_level(11, 10, 12), 0.1);
        assert_eq!(slider_level(15, 10, 12), 0.5);
        assert_eq!(slider_level(20, 10, 12), 1.0);
        assert_eq!(slider_level(40, 10, 12), 1.0);
        assert_eq!(slider_level(3, 10, 12), 0.0);
    }

    #[test]
    fn anchors_point_at_headings() {
        let player = player();
        let view = View::new(&player);
        let (lines, anchors) = page_lines(&view, player.catalog());
        assert_eq!(lines.len() as u16, anchors.total);
        let heading: String = lines[anchors.music as usize]
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(heading.contains("Music"));
        assert!(heading.is_ascii());
        let first_row: String = lines[anchors.first_album_row as usize]
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(first_row.starts_with("> "));
        assert!(first_row.contains("Sakchu ra"));
    }

    #[test]
    fn draw_registers_clickable_regions() {
        let player = player();
        let view = View::new(&player);
        let mut rng = SmallRng::seed_from_u64(9);
        let noise = NoiseField::new(100, 40, &mut rng);
        let pointer = PointerIndicator::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");

        let mut hits = HitMap::default();
        terminal
            .draw(|frame| {
                hits = draw(
                    frame,
                    &Screen {
                        view: &view,
                        catalog: player.catalog(),
                        noise: &noise,
                        pointer: &pointer,
                        scroll_offset: 0,
                        status: None,
                    },
                )
            })
            .expect("draw");

        let (_, anchors) = page_lines(&view, player.catalog());
        let row_y = anchors.first_album_row + 2;
        assert_eq!(hits.at(60, row_y), Some(Hit::Control(Trigger::PlayRow(2))));
        assert_eq!(hits.at(8, row_y), Some(Hit::Control(Trigger::PlayAlbum(2))));
        assert_eq!(hits.at(3, anchors.full_album), Some(Hit::FullAlbum));
        assert_eq!(hits.at(1, 39), Some(Hit::Nav(Section::Home)));
        assert!(matches!(hits.at(50, 37), Some(Hit::Scrub(_))));
        assert_eq!(hits.at(2, 36), Some(Hit::Control(Trigger::Previous)));
    }

    fn render(view: &View, catalog: &Catalog) -> (Buffer, HitMap) {
        let mut rng = SmallRng::seed_from_u64(9);
        let noise = NoiseField::new(100, 40, &mut rng);
        let pointer = PointerIndicator::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        let mut hits = HitMap::default();
        terminal
            .draw(|frame| {
                hits = draw(
                    frame,
                    &Screen {
                        view,
                        catalog,
                        noise: &noise,
                        pointer: &pointer,
                        scroll_offset: 0,
                        status: None,
                    },
                )
            })
            .expect("draw");
        (terminal.backend().buffer().clone(), hits)
    }

    #[test]
    fn volume_slider_hits_line_up_with_drawn_cells() {
        let mut player = player();
        player.dispatch(Trigger::SetVolume(0.3));
        let view = View::new(&player);
        let (buffer, hits) = render(&view, player.catalog());

        let controls_row = 36;
        let row: Vec<String> = (0..100)
            .map(|x| buffer[(x, controls_row)].symbol().to_string())
            .collect();
        let open = row
            .iter()
            .rposition(|symbol| symbol == "[")
            .expect("slider opening bracket") as u16;
        let close = row
            .iter()
            .rposition(|symbol| symbol == "]")
            .expect("slider closing bracket") as u16;
        assert_eq!(close - open + 1, VOLUME_SLIDER_WIDTH);
        let fill: String = row[usize::from(open) + 1..usize::from(close)].concat();
        assert_eq!(fill, "###-------");

        let Some(Hit::Volume { left, width }) = hits.at(open + 1, controls_row) else {
            panic!("slider cells should be clickable");
        };
        assert_eq!(left, open);
        assert_eq!(hits.at(open, controls_row), Some(Hit::Volume { left, width }));
        assert_eq!(hits.at(close, controls_row), Some(Hit::Volume { left, width }));
        assert_eq!(hits.at(close + 1, controls_row), None);

        assert_eq!(slider_level(open + 3, left, width), 0.3);
        assert_eq!(slider_level(close - 1, left, width), 1.0);
        assert_eq!(slider_level(open, left, width), 0.0);
    }
}
