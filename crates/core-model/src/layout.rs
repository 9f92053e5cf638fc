//! Two-column screen geometry.
//!
//! The terminal is split into an index column on the left (a quarter of the
//! width, rounded down), a one-cell separator, and the detail column taking
//! the rest. Both columns span the full height.
//!
//! Invariants:
//! * `index.width + separator.width + detail.width == total width` whenever
//!   the terminal is at least two cells wide.
//! * All regions have origin row 0.
//! * Degenerate sizes (0 or 1 columns) yield zero-width regions rather than
//!   underflowing.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl LayoutRegion {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    index: LayoutRegion,
    separator: LayoutRegion,
    detail: LayoutRegion,
}

impl Layout {
    /// Share of the width given to the index column, in percent.
    pub const INDEX_PERCENT: u32 = 25;

    pub fn two_column(width: u16, height: u16) -> Self {
        let index_width = (u32::from(width) * Self::INDEX_PERCENT / 100) as u16;
        let remaining = width - index_width;
        let separator_width = remaining.min(1);
        let detail_width = remaining - separator_width;
        Self {
            index: LayoutRegion::new(0, 0, index_width, height),
            separator: LayoutRegion::new(index_width, 0, separator_width, height),
            detail: LayoutRegion::new(index_width + separator_width, 0, detail_width, height),
        }
    }

    pub fn index(&self) -> LayoutRegion {
        self.index
    }

    pub fn separator(&self) -> LayoutRegion {
        self.separator
    }

    pub fn detail(&self) -> LayoutRegion {
        self.detail
    }

    pub fn width(&self) -> u16 {
        self.index.width + self.separator.width + self.detail.width
    }

    pub fn height(&self) -> u16 {
        self.index.height
    }
}
