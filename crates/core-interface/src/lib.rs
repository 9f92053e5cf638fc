//! Interface controller: owns both panes and runs the input loop.
//!
//! Screen layout is the two-column split from [`Layout`]: the note index on
//! the left, a one-cell separator, and the detail pane on the right.
//!
//! Each cycle of [`Interface::handle_events`]:
//! 1. Wait on the event source for at most the poll timeout.
//! 2. A bound key runs its [`Action`]. Moves re-render the detail pane for the
//!    newly selected note.
//! 3. `Delete` hands the selected item to the delete callback *before* the
//!    list changes; if the callback fails the item stays.
//! 4. The tick callback runs and anything it returns is appended.
//! 5. `Exit` (or a closed source) ends the loop.
//!
//! Resize events re-layout both panes and hard-redraw. A failed read counts as
//! a cycle without a key and also triggers a hard redraw.

use anyhow::Result;
use core_events::{EventSource, InputEvent, KeyToken};
use core_keymap::{Action, Keymap};
use core_markup::{Color, ColorSpec, tagged};
use core_model::{DisplayItem, KeywordSet, Layout};
use core_render::{Canvas, Surface, WriteOpts};
use core_widgets::{DetailWidget, ListWidget};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

const SEPARATOR: char = '│';
const SEPARATOR_SPEC: ColorSpec = ColorSpec::fg(Color::Blue);

pub type DeleteCallback = Box<dyn FnMut(&DisplayItem) -> Result<()>>;
pub type TickCallback = Box<dyn FnMut() -> Result<TickOutcome>>;

/// What a tick produced: notes to append and keywords to learn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub items: Vec<DisplayItem>,
    pub keywords: Vec<String>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.keywords.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceOptions {
    pub poll_timeout: Duration,
    pub highlight_keywords: bool,
    pub keymap: Keymap,
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            highlight_keywords: true,
            keymap: Keymap::with_defaults(),
        }
    }
}

/// Whether the input loop keeps running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Interface {
    layout: Layout,
    list: ListWidget,
    detail: DetailWidget,
    separator: Surface,
    keywords: KeywordSet,
    keymap: Keymap,
    poll_timeout: Duration,
    on_delete: Option<DeleteCallback>,
    on_tick: Option<TickCallback>,
}

impl Interface {
    /// Lay out a `width` x `height` screen on `canvas` and draw the empty
    /// panes.
    pub fn new(
        width: u16,
        height: u16,
        canvas: &dyn Canvas,
        options: InterfaceOptions,
    ) -> Result<Self> {
        let layout = Layout::two_column(width, height);
        let list = ListWidget::new(Surface::new(layout.index(), canvas.fork()))?;
        let mut detail = DetailWidget::new(Surface::new(layout.detail(), canvas.fork()));
        detail.set_highlight(options.highlight_keywords);
        let separator = Surface::new(layout.separator(), canvas.fork());
        let mut iface = Self {
            layout,
            list,
            detail,
            separator,
            keywords: KeywordSet::new(),
            keymap: options.keymap,
            poll_timeout: options.poll_timeout,
            on_delete: None,
            on_tick: None,
        };
        iface.draw_separator()?;
        info!(target: "interface", width, height, "init");
        Ok(iface)
    }

    /// Called with the selected item before it is removed from the list.
    pub fn with_delete_callback(
        mut self,
        f: impl FnMut(&DisplayItem) -> Result<()> + 'static,
    ) -> Self {
        self.on_delete = Some(Box::new(f));
        self
    }

    /// Called once per poll cycle.
    pub fn with_tick_callback(mut self, f: impl FnMut() -> Result<TickOutcome> + 'static) -> Self {
        self.on_tick = Some(Box::new(f));
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn list(&self) -> &ListWidget {
        &self.list
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn current_item(&self) -> Option<&DisplayItem> {
        self.list.current_item()
    }

    /// Append a note at the end of the index.
    pub fn add_note(&mut self, item: DisplayItem) -> Result<()> {
        let was_empty = self.list.is_empty();
        self.list.append(item)?;
        if was_empty {
            self.render_detail()?;
        }
        Ok(())
    }

    /// Insert a note at `at` (clamped to the end).
    pub fn insert_note(&mut self, item: DisplayItem, at: usize) -> Result<()> {
        self.list.insert(item, at)?;
        self.render_detail()
    }

    /// Learn a keyword. The detail pane is refreshed when the set grows.
    pub fn add_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.keywords.insert(keyword) {
            self.render_detail()?;
        }
        Ok(())
    }

    pub fn add_keywords<I, S>(&mut self, keywords: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grew = false;
        for k in keywords {
            grew |= self.keywords.insert(k.as_ref());
        }
        if grew {
            self.render_detail()?;
        }
        Ok(())
    }

    /// Run the input loop until `Exit` or the source closes.
    pub fn handle_events(&mut self, source: &mut dyn EventSource) -> Result<()> {
        loop {
            let flow = match source.poll(self.poll_timeout) {
                Ok(Some(InputEvent::Key(token))) => self.handle_key(&token)?,
                Ok(Some(InputEvent::Resize(w, h))) => {
                    self.resize(w, h)?;
                    Flow::Continue
                }
                Ok(Some(InputEvent::Closed)) => {
                    debug!(target: "interface", "source_closed");
                    Flow::Exit
                }
                Ok(None) => Flow::Continue,
                Err(e) => {
                    warn!(target: "interface", error = %e, "read_failed");
                    self.hard_redraw()?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                info!(target: "interface", "exit");
                return Ok(());
            }
            self.tick()?;
        }
    }

    /// Resolve a key through the keymap. Unbound keys are ignored.
    pub fn handle_key(&mut self, token: &KeyToken) -> Result<Flow> {
        match self.keymap.resolve(token) {
            Some(action) => self.dispatch(action),
            None => Ok(Flow::Continue),
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Flow> {
        debug!(target: "interface", ?action, current = ?self.list.current(), "dispatch");
        match action {
            Action::MoveUp => {
                if self.list.move_up()? {
                    self.render_detail()?;
                }
            }
            Action::MoveDown => {
                if self.list.move_down()? {
                    self.render_detail()?;
                }
            }
            Action::Delete => self.delete_current()?,
            Action::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn delete_current(&mut self) -> Result<()> {
        let Some(index) = self.list.current() else {
            return Ok(());
        };
        let Some(item) = self.list.current_item().cloned() else {
            return Ok(());
        };
        if let Some(cb) = self.on_delete.as_mut()
            && let Err(e) = cb(&item)
        {
            warn!(target: "interface", index, error = %e, "delete_rejected");
            return Ok(());
        }
        self.list.delete(index)?;
        info!(target: "interface", index, remaining = self.list.len(), "delete");
        self.render_detail()
    }

    /// Run the tick callback and merge its outcome.
    pub fn tick(&mut self) -> Result<()> {
        let Some(cb) = self.on_tick.as_mut() else {
            return Ok(());
        };
        let outcome = match cb() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(target: "interface", error = %e, "tick_failed");
                return Ok(());
            }
        };
        if outcome.is_empty() {
            return Ok(());
        }
        debug!(
            target: "interface",
            items = outcome.items.len(),
            keywords = outcome.keywords.len(),
            "tick"
        );
        self.add_keywords(&outcome.keywords)?;
        for item in outcome.items {
            self.add_note(item)?;
        }
        Ok(())
    }

    /// Re-layout for a new terminal size and redraw everything.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.layout = Layout::two_column(width, height);
        self.list.resize(self.layout.index())?;
        self.detail.resize(self.layout.detail());
        self.separator.resize(self.layout.separator());
        info!(target: "interface", width, height, "resize");
        self.hard_redraw()
    }

    /// Repaint every pane from state.
    pub fn hard_redraw(&mut self) -> Result<()> {
        self.list.repopulate()?;
        self.draw_separator()?;
        self.render_detail()
    }

    fn render_detail(&mut self) -> Result<()> {
        match self.list.current_item() {
            Some(item) => self.detail.render(item, &self.keywords),
            None => self.detail.clear(),
        }
    }

    fn draw_separator(&mut self) -> Result<()> {
        self.separator.erase();
        let line = tagged(SEPARATOR_SPEC, &SEPARATOR.to_string());
        for row in 0..self.separator.height() {
            self.separator.move_to(row, 0);
            self.separator.write(&line, WriteOpts::PLAIN);
        }
        self.separator.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use core_render::MemoryCanvas;
    use pretty_assertions::assert_eq;

    fn item(body: &str) -> DisplayItem {
        DisplayItem::new(body, Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    fn iface() -> (Interface, MemoryCanvas) {
        let canvas = MemoryCanvas::new(80, 10);
        let iface = Interface::new(80, 10, &canvas, InterfaceOptions::default()).unwrap();
        (iface, canvas)
    }

    #[test]
    fn separator_fills_column() {
        let (iface, canvas) = iface();
        let x = iface.layout().separator().x;
        for y in 0..10 {
            assert_eq!(canvas.row_text(x, y, 1), "│");
            assert_eq!(canvas.spec_at(x, y), Some(SEPARATOR_SPEC));
        }
    }

    #[test]
    fn first_note_is_shown_in_detail() {
        let (mut iface, canvas) = iface();
        iface.add_note(item("buy milk")).unwrap();
        let detail = iface.layout().detail();
        assert_eq!(canvas.row_text(detail.x, 2, detail.width), "buy milk");
    }

    #[test]
    fn actions_on_empty_list_are_noops() {
        let (mut iface, _) = iface();
        for action in [Action::MoveUp, Action::MoveDown, Action::Delete] {
            assert_eq!(iface.dispatch(action).unwrap(), Flow::Continue);
        }
        assert!(iface.current_item().is_none());
        assert_eq!(iface.dispatch(Action::Exit).unwrap(), Flow::Exit);
    }

    #[test]
    fn unbound_key_is_ignored() {
        let (mut iface, _) = iface();
        let flow = iface.handle_key(&KeyToken::Char('z')).unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn new_keyword_rehighlights_current_note() {
        let (mut iface, canvas) = iface();
        iface.add_note(item("learn rust")).unwrap();
        let x = iface.layout().detail().x;
        assert_eq!(canvas.spec_at(x + 6, 2), Some(ColorSpec::fg(Color::Blue)));
        iface.add_keyword("Rust").unwrap();
        assert_eq!(canvas.spec_at(x + 6, 2), Some(ColorSpec::fg(Color::Red)));
        assert!(iface.keywords().contains("rust"));
    }
}
