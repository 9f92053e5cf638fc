//! Style handles and the color palette.
//!
//! A [`StyleHandle`] is a dense index derived from a [`ColorSpec`] by a pure
//! function, so widgets and canvases never consult process-wide color state.
//! [`StylePalette`] holds the crossterm style for every handle and is built
//! once at startup.
//!
//! Encoding: `fg.index() + 9 * bg_slot` where `bg_slot` is 0 for "inherit
//! terminal background" and `bg.index() + 1` otherwise, giving 90 handles.

use core_markup::{Color, ColorSpec};
use crossterm::style::{Color as TermColor, ContentStyle};

const PALETTE_COLORS: usize = Color::ALL.len();
const BG_SLOTS: usize = PALETTE_COLORS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleHandle(u8);

impl StyleHandle {
    pub const COUNT: usize = PALETTE_COLORS * BG_SLOTS;

    pub const fn of(spec: ColorSpec) -> Self {
        let bg_slot = match spec.bg {
            Some(bg) => bg.index() + 1,
            None => 0,
        };
        Self((spec.fg.index() + PALETTE_COLORS * bg_slot) as u8)
    }

    /// Inverse of [`StyleHandle::of`].
    pub const fn spec(self) -> ColorSpec {
        let idx = self.0 as usize;
        let fg = Color::ALL[idx % PALETTE_COLORS];
        let bg = match idx / PALETTE_COLORS {
            0 => None,
            slot => Some(Color::ALL[slot - 1]),
        };
        ColorSpec { fg, bg }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for StyleHandle {
    fn default() -> Self {
        Self::of(ColorSpec::PLAIN)
    }
}

impl From<ColorSpec> for StyleHandle {
    fn from(spec: ColorSpec) -> Self {
        Self::of(spec)
    }
}

/// Resolved crossterm styles for every handle.
#[derive(Debug, Clone)]
pub struct StylePalette {
    styles: Vec<ContentStyle>,
}

impl StylePalette {
    pub fn build() -> Self {
        let styles = (0..StyleHandle::COUNT)
            .map(|i| content_style(StyleHandle(i as u8).spec()))
            .collect();
        Self { styles }
    }

    pub fn resolve(&self, handle: StyleHandle) -> ContentStyle {
        self.styles
            .get(handle.index())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for StylePalette {
    fn default() -> Self {
        Self::build()
    }
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
        Color::Default => TermColor::Reset,
    }
}

fn content_style(spec: ColorSpec) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(term_color(spec.fg));
    // Always set the background so a previous run's color does not bleed.
    style.background_color = Some(spec.bg.map_or(TermColor::Reset, term_color));
    style
}
