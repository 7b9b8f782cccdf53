//! Decorative layer: animated film noise, the pointer indicator and smooth
//! section scrolling. None of it touches the player.

use rand::Rng;

/// Grey ARGB noise, one pixel per terminal cell.
#[derive(Debug, Clone, Default)]
pub struct NoiseField {
    width: u16,
    height: u16,
    pixels: Vec<u32>,
}

impl NoiseField {
    pub fn new(width: u16, height: u16, rng: &mut impl Rng) -> Self {
        let mut field = Self::default();
        field.resize(width, height, rng);
        field
    }

    pub fn resize(&mut self, width: u16, height: u16, rng: &mut impl Rng) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; usize::from(width) * usize::from(height)];
        self.regenerate(rng);
    }

    /// One animation frame.
    pub fn regenerate(&mut self, rng: &mut impl Rng) {
        for pixel in &mut self.pixels {
            let value: u32 = rng.random_range(0..255);
            let alpha: u32 = rng.random_range(5..25);
            *pixel = (alpha << 24) | (value << 16) | (value << 8) | value;
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }
}

pub fn alpha(pixel: u32) -> u8 {
    (pixel >> 24) as u8
}

pub fn grey(pixel: u32) -> u8 {
    (pixel & 0xff) as u8
}

/// Follows the mouse; `hovered` while over something clickable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerIndicator {
    pub position: Option<(u16, u16)>,
    pub hovered: bool,
}

impl PointerIndicator {
    pub fn move_to(&mut self, column: u16, row: u16, over_interactive: bool) {
        self.position = Some((column, row));
        self.hovered = over_interactive;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    TopSongs,
    Music,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Home, Section::TopSongs, Section::Music];

    pub fn anchor(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::TopSongs => "top-songs",
            Self::Music => "music",
        }
    }

    pub fn href(self) -> &'static str {
        match self {
            Self::Home => "#home",
            Self::TopSongs => "#top-songs",
            Self::Music => "#music",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::TopSongs => "Top Songs",
            Self::Music => "Music",
        }
    }

    pub fn from_href(href: &str) -> Option<Self> {
        let id = href.strip_prefix('#').unwrap_or(href);
        Self::ALL.into_iter().find(|section| section.anchor() == id)
    }
}

/// Eased page scroll toward a section anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothScroll {
    offset: f32,
    target: f32,
}

impl SmoothScroll {
    const EASING: f32 = 0.35;

    /// Starts scrolling so that `row` becomes the first visible line.
    pub fn scroll_to(&mut self, row: u16) {
        self.target = f32::from(row);
    }

    /// Unknown anchors are ignored.
    pub fn scroll_to_anchor(&mut self, href: &str, anchor_row: impl Fn(Section) -> u16) -> bool {
        let Some(section) = Section::from_href(href) else {
            return false;
        };
        self.scroll_to(anchor_row(section));
        true
    }

    pub fn scroll_by(&mut self, delta: i32, max: u16) {
        let next = (self.target + delta as f32).clamp(0.0, f32::from(max));
        self.target = next;
        self.offset = next;
    }

    /// Advances one frame; returns whether the offset moved.
    pub fn step(&mut self) -> bool {
        let remaining = self.target - self.offset;
        if remaining.abs() < 0.5 {
            let moved = self.offset != self.target;
            self.offset = self.target;
            return moved;
        }
        self.offset += remaining * Self::EASING;
        true
    }

    pub fn offset(&self) -> u16 {
        self.offset.round().max(0.0) as u16
    }

    pub fn is_settled(&self) -> bool {
        self.offset == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn noise_pixels_are_faint_grey() {
        let mut rng = SmallRng::seed_from_u64(11);
        let field = NoiseField::new(16, 4, &mut rng);
        for y in 0..4 {
            for x in 0..16 {
                let pixel = field.pixel(x, y).expect("in bounds");
                assert!((5..25).contains(&alpha(pixel)));
                let value = grey(pixel);
                assert_eq!((pixel >> 8) & 0xff, u32::from(value));
                assert_eq!((pixel >> 16) & 0xff, u32::from(value));
            }
        }
        assert_eq!(field.pixel(16, 0), None);
    }

    #[test]
    fn resize_reallocates_the_buffer() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut field = NoiseField::new(2, 2, &mut rng);
        field.resize(10, 3, &mut rng);
        assert_eq!((field.width(), field.height()), (10, 3));
        assert!(field.pixel(9, 2).is_some());
    }

    #[test]
    fn pointer_follows_mouse_and_tracks_hover() {
        let mut pointer = PointerIndicator::default();
        pointer.move_to(4, 7, true);
        assert_eq!(pointer.position, Some((4, 7)));
        assert!(pointer.hovered);
        pointer.move_to(5, 7, false);
        assert!(!pointer.hovered);
    }

    #[test]
    fn anchor_scroll_eases_to_target() {
        let mut scroll = SmoothScroll::default();
        assert!(scroll.scroll_to_anchor("#music", |section| match section {
            Section::Music => 20,
            _ => 0,
        }));

        let mut frames = 0;
        let mut last = scroll.offset();
        while scroll.step() {
            assert!(scroll.offset() >= last);
            last = scroll.offset();
            frames += 1;
            assert!(frames < 100);
        }
        assert!(frames > 1, "scroll should take more than one frame");
        assert_eq!(scroll.offset(), 20);
        assert!(scroll.is_settled());
    }

    #[test]
    fn hrefs_resolve_back_to_their_section() {
        for section in Section::ALL {
            assert_eq!(Section::from_href(section.href()), Some(section));
            assert_eq!(Section::from_href(section.anchor()), Some(section));
        }
        assert_eq!(Section::from_href("#contact"), None);
    }

    #[test]
    fn unknown_anchor_is_ignored() {
        let mut scroll = SmoothScroll::default();
        assert!(!scroll.scroll_to_anchor("#contact", |_| 9));
        assert!(!scroll.step());
        assert_eq!(scroll.offset(), 0);
    }
}
