//! Note detail pane.
//!
//! Renders a header (creation time, topics, optional due date) followed by the
//! body. The body passes through the keyword highlighter, is reflowed to the
//! pane width with the markup-aware wrapper, and is then written. Header lines
//! are wrapped the same way so long topic lists never run off the pane.

use crate::highlight::highlight;
use anyhow::Result;
use core_markup::{Color, ColorSpec, strip_control, tagged};
use core_model::{DisplayItem, KeywordSet, LayoutRegion};
use core_render::{Surface, WriteOpts};
use tracing::debug;

pub const LABEL_SPEC: ColorSpec = ColorSpec::fg(Color::Yellow);
pub const VALUE_SPEC: ColorSpec = ColorSpec::fg(Color::Green);
pub const BODY_SPEC: ColorSpec = ColorSpec::fg(Color::Blue);
pub const ACCENT: Color = Color::Red;

const DATE_FORMAT: &str = "%c";
const NO_TOPICS: &str = "[None]";

pub struct DetailWidget {
    surface: Surface,
    highlight: bool,
}

impl DetailWidget {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            highlight: true,
        }
    }

    /// Toggle keyword highlighting for subsequent renders.
    pub fn set_highlight(&mut self, on: bool) {
        self.highlight = on;
    }

    pub fn region(&self) -> LayoutRegion {
        self.surface.region()
    }

    pub fn resize(&mut self, region: LayoutRegion) {
        self.surface.resize(region);
    }

    /// Replace the pane contents with `item`.
    pub fn render(&mut self, item: &DisplayItem, keywords: &KeywordSet) -> Result<()> {
        self.surface.erase();
        self.surface.move_to(0, 0);
        self.surface.set_attr(ColorSpec::PLAIN);

        let header = header_lines(item);
        let header = self.surface.wrap_marked(&header, ColorSpec::PLAIN);
        self.surface.write(&header, WriteOpts::PLAIN);
        self.surface.move_to(self.surface.cursor().0 + 1, 0);

        let body = if self.highlight {
            highlight(item.body(), keywords, BODY_SPEC, ACCENT)
        } else {
            tagged(BODY_SPEC, &strip_control(item.body()))
        };
        let body = self.surface.wrap_marked(&body, BODY_SPEC);
        self.surface.write(&body, WriteOpts::PLAIN);

        debug!(
            target: "render.detail",
            body_len = item.body().len(),
            topics = item.topics().len(),
            highlight = self.highlight,
            "render"
        );
        self.surface.refresh()
    }

    /// Blank the pane.
    pub fn clear(&mut self) -> Result<()> {
        self.surface.erase();
        self.surface.refresh()
    }
}

fn header_lines(item: &DisplayItem) -> String {
    let topics = if item.topics().is_empty() {
        NO_TOPICS.to_string()
    } else {
        item.topics()
            .iter()
            .map(|t| strip_control(t).into_owned())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut out = format!(
        "{}{}\n{}{}",
        tagged(LABEL_SPEC, "Note made on: "),
        tagged(VALUE_SPEC, &item.created().format(DATE_FORMAT).to_string()),
        tagged(LABEL_SPEC, "Listed under topics: "),
        tagged(VALUE_SPEC, &topics),
    );
    if let Some(due) = item.due() {
        out.push('\n');
        out.push_str(&tagged(LABEL_SPEC, "Due: "));
        out.push_str(&tagged(VALUE_SPEC, &due.format("%Y-%m-%d").to_string()));
    }
    out
}
