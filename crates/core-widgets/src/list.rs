//! Selectable note index.
//!
//! State: `(items, current, previous_rendered, scroll)`.
//!
//! Row mapping: surface row 0 holds the "Notes:" title and is never
//! selectable; item `i` is drawn on surface row `i + 1`.
//!
//! Repaint policy:
//! * `append` draws only the new row.
//! * `insert` / `delete` shift every row below the edit point, so they clear
//!   the pane and redraw the rows inside the window (repopulate).
//! * `render` after a selection change repaints at most two rows: the row that
//!   was highlighted and the row that now is. When the selected row would fall
//!   outside the window the scroll offset moves and the list repopulates.
//!
//! Invariants:
//! * `current` is `None` iff `items` is empty; otherwise `current < len`.
//! * After any public call returns, exactly one item row (the current one) is
//!   drawn highlighted when the list is non-empty.
//! * Out-of-range operations are no-ops.

use anyhow::Result;
use core_markup::{Color, ColorSpec, strip_control, tagged};
use core_model::{DisplayItem, LayoutRegion};
use core_render::{Surface, WriteOpts};
use tracing::{debug, trace};

const TITLE: &str = "Notes:";
pub const TITLE_SPEC: ColorSpec = ColorSpec::on(Color::Blue, Color::Red);
pub const NORMAL_SPEC: ColorSpec = ColorSpec::fg(Color::Green);
pub const SELECTED_SPEC: ColorSpec = ColorSpec::on(Color::Black, Color::Green);

pub struct ListWidget {
    surface: Surface,
    items: Vec<DisplayItem>,
    current: Option<usize>,
    previous_rendered: Option<usize>,
    repainted: Vec<usize>,
    last_repaint: Vec<usize>,
}

impl ListWidget {
    /// Take ownership of `surface` and draw the title row.
    pub fn new(surface: Surface) -> Result<Self> {
        let mut list = Self {
            surface,
            items: Vec::new(),
            current: None,
            previous_rendered: None,
            repainted: Vec::new(),
            last_repaint: Vec::new(),
        };
        list.repopulate()?;
        Ok(list)
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn previous_rendered(&self) -> Option<usize> {
        self.previous_rendered
    }

    pub fn current_item(&self) -> Option<&DisplayItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Surface rows painted by the most recent pass.
    pub fn last_repaint(&self) -> &[usize] {
        &self.last_repaint
    }

    pub fn scroll(&self) -> u16 {
        self.surface.scroll()
    }

    pub fn region(&self) -> LayoutRegion {
        self.surface.region()
    }

    /// Push to the end and draw just the new row.
    pub fn append(&mut self, item: DisplayItem) -> Result<()> {
        self.items.push(item);
        let idx = self.items.len() - 1;
        if self.current.is_none() {
            self.current = Some(idx);
        }
        let selected = self.current == Some(idx);
        if selected && !self.surface.is_visible(surface_row(idx)) {
            return self.render();
        }
        self.draw_row(idx, selected);
        if selected {
            self.previous_rendered = self.current;
        }
        debug!(target: "render.list", index = idx, len = self.items.len(), "append");
        self.finish_pass()
    }

    /// Insert at `at` (clamped to the end) and repopulate.
    pub fn insert(&mut self, item: DisplayItem, at: usize) -> Result<()> {
        let at = at.min(self.items.len());
        self.items.insert(at, item);
        self.current = match self.current {
            None => Some(0),
            Some(c) if at <= c => Some(c + 1),
            keep => keep,
        };
        debug!(target: "render.list", index = at, len = self.items.len(), "insert");
        self.scroll_into_view();
        self.repopulate()
    }

    /// Remove the item at `at`. Out of range is a no-op returning `None`.
    pub fn delete(&mut self, at: usize) -> Result<Option<DisplayItem>> {
        if at >= self.items.len() {
            trace!(target: "render.list", index = at, len = self.items.len(), "delete_out_of_range");
            return Ok(None);
        }
        let removed = self.items.remove(at);
        self.current = match self.current {
            _ if self.items.is_empty() => None,
            Some(c) if at <= c && c > 0 => Some(c - 1),
            Some(c) => Some(c.min(self.items.len() - 1)),
            None => Some(0),
        };
        debug!(target: "render.list", index = at, len = self.items.len(), "delete");
        self.scroll_into_view();
        self.repopulate()?;
        Ok(Some(removed))
    }

    /// Select the previous item. Returns whether the selection moved.
    pub fn move_up(&mut self) -> Result<bool> {
        match self.current {
            Some(c) if c > 0 => {
                self.current = Some(c - 1);
                self.render()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Select the next item. Returns whether the selection moved.
    pub fn move_down(&mut self) -> Result<bool> {
        match self.current {
            Some(c) if c + 1 < self.items.len() => {
                self.current = Some(c + 1);
                self.render()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Bring the highlighted row in line with `current`.
    pub fn render(&mut self) -> Result<()> {
        if self.current == self.previous_rendered {
            return Ok(());
        }
        if self.scroll_into_view() {
            return self.repopulate();
        }
        if let Some(prev) = self.previous_rendered
            && prev < self.items.len()
        {
            self.draw_row(prev, false);
        }
        if let Some(cur) = self.current {
            self.draw_row(cur, true);
        }
        trace!(
            target: "render.list",
            previous = ?self.previous_rendered,
            current = ?self.current,
            "selection_repaint"
        );
        self.previous_rendered = self.current;
        self.finish_pass()
    }

    /// Clear the pane and redraw the title and every row inside the window.
    pub fn repopulate(&mut self) -> Result<()> {
        self.surface.erase();
        if self.surface.is_visible(0) {
            self.draw_title();
        }
        for idx in self.visible_items() {
            let selected = self.current == Some(idx);
            self.draw_row(idx, selected);
        }
        self.previous_rendered = self.current;
        self.finish_pass()
    }

    /// Move to a new region and redraw.
    pub fn resize(&mut self, region: LayoutRegion) -> Result<()> {
        self.surface.resize(region);
        self.scroll_into_view();
        self.repopulate()
    }

    /// Adjust the scroll offset so the selected row is visible. Returns whether
    /// the offset changed.
    fn scroll_into_view(&mut self) -> bool {
        let height = usize::from(self.surface.height());
        if height == 0 {
            return false;
        }
        let scroll = usize::from(self.surface.scroll());
        let target = match self.current {
            None => 0,
            // Keep the title visible while the first item is selected.
            Some(0) => 0,
            Some(c) => {
                let row = c + 1;
                if row < scroll {
                    row
                } else if row >= scroll + height {
                    row + 1 - height
                } else {
                    scroll
                }
            }
        };
        let target = u16::try_from(target).unwrap_or(u16::MAX);
        if target == self.surface.scroll() {
            return false;
        }
        debug!(target: "render.list", from = scroll, to = target, "scroll");
        self.surface.set_scroll(target);
        true
    }

    /// Indices of the items whose rows fall inside the window.
    fn visible_items(&self) -> std::ops::Range<usize> {
        let scroll = usize::from(self.surface.scroll());
        let height = usize::from(self.surface.height());
        let first = scroll.saturating_sub(1).min(self.items.len());
        let end = (scroll + height).saturating_sub(1).min(self.items.len());
        first..end.max(first)
    }

    fn draw_title(&mut self) {
        self.surface.move_to(0, 0);
        self.surface.write(&tagged(TITLE_SPEC, TITLE), WriteOpts::CENTERED);
        self.repainted.push(0);
    }

    fn draw_row(&mut self, idx: usize, selected: bool) {
        let Some(item) = self.items.get(idx) else {
            return;
        };
        let row = surface_row(idx);
        let spec = if selected { SELECTED_SPEC } else { NORMAL_SPEC };
        let line = tagged(spec, &strip_control(item.summary()));
        self.surface.clear_row(row);
        self.surface.write(&line, WriteOpts::PADDED);
        self.repainted.push(usize::from(row));
    }

    fn finish_pass(&mut self) -> Result<()> {
        self.repainted.sort_unstable();
        self.repainted.dedup();
        self.last_repaint = std::mem::take(&mut self.repainted);
        self.surface.refresh()
    }
}

fn surface_row(idx: usize) -> u16 {
    u16::try_from(idx + 1).unwrap_or(u16::MAX)
}
