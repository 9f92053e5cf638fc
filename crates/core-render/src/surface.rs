//! Rectangular drawing surface.
//!
//! A `Surface` owns a region of the terminal, a canvas handle, a cursor
//! (logical row, column) and the attribute of the last run written. Rows are
//! logical: the externally managed scroll offset is subtracted before
//! addressing the canvas, and rows outside `[scroll, scroll + height)` are
//! clipped. The surface never scrolls on its own.
//!
//! Text is clipped at the right edge; the terminal never wraps for us. Use
//! [`Surface::wrap_marked`] to reflow content first.

use crate::style::StyleHandle;
use crate::wrap;
use crate::writer::{Canvas, Command};
use anyhow::Result;
use core_markup::{ColorSpec, MarkupSpan, decode};
use core_model::LayoutRegion;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Layout options for [`Surface::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOpts {
    /// Right-fill the row with spaces in the current attribute.
    pub pad: bool,
    /// Center the visible text in the remaining width.
    pub center: bool,
}

impl WriteOpts {
    pub const PLAIN: WriteOpts = WriteOpts {
        pad: false,
        center: false,
    };
    pub const PADDED: WriteOpts = WriteOpts {
        pad: true,
        center: false,
    };
    pub const CENTERED: WriteOpts = WriteOpts {
        pad: true,
        center: true,
    };
}

pub struct Surface {
    region: LayoutRegion,
    canvas: Box<dyn Canvas>,
    row: u16,
    col: u16,
    attr: ColorSpec,
    scroll: u16,
}

impl Surface {
    pub fn new(region: LayoutRegion, canvas: Box<dyn Canvas>) -> Self {
        Self {
            region,
            canvas,
            row: 0,
            col: 0,
            attr: ColorSpec::PLAIN,
            scroll: 0,
        }
    }

    pub fn region(&self) -> LayoutRegion {
        self.region
    }

    pub fn width(&self) -> u16 {
        self.region.width
    }

    pub fn height(&self) -> u16 {
        self.region.height
    }

    /// Attribute of the last run written.
    pub fn attr(&self) -> ColorSpec {
        self.attr
    }

    pub fn set_attr(&mut self, attr: ColorSpec) {
        self.attr = attr;
    }

    /// Logical (row, column) of the cursor.
    pub fn cursor(&self) -> (u16, u16) {
        (self.row, self.col)
    }

    pub fn move_to(&mut self, row: u16, col: u16) {
        self.row = row;
        self.col = col.min(self.region.width);
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn set_scroll(&mut self, offset: u16) {
        self.scroll = offset;
    }

    /// Move or resize the region. Content is not preserved.
    pub fn resize(&mut self, region: LayoutRegion) {
        tracing::trace!(
            target: "render.surface",
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            "resize"
        );
        self.region = region;
        self.row = self.scroll;
        self.col = 0;
    }

    /// Whether logical `row` is inside the visible window.
    pub fn is_visible(&self, row: u16) -> bool {
        self.screen_row(row).is_some()
    }

    fn screen_row(&self, row: u16) -> Option<u16> {
        let rel = row.checked_sub(self.scroll)?;
        (rel < self.region.height).then(|| self.region.y + rel)
    }

    /// Write marked-up text at the cursor. Newlines move to column 0 of the
    /// next row; each line is decoded against the attribute left by the
    /// previous one.
    pub fn write(&mut self, text: &str, opts: WriteOpts) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.row = self.row.saturating_add(1);
                self.col = 0;
            }
            self.write_line(line, opts);
        }
    }

    fn write_line(&mut self, line: &str, opts: WriteOpts) {
        let spans = decode(line, self.attr);
        if opts.center {
            let visible: usize = spans.iter().map(|s| s.text.width()).sum();
            let avail = usize::from(self.remaining());
            let slack = avail.saturating_sub(visible);
            let left = slack / 2;
            let lead = spans.first().map_or(self.attr, |s| s.spec);
            self.emit(lead, &" ".repeat(left));
        }
        for MarkupSpan { spec, text } in &spans {
            self.emit(*spec, text);
        }
        if opts.pad {
            let fill = " ".repeat(usize::from(self.remaining()));
            let attr = self.attr;
            self.emit(attr, &fill);
        }
    }

    fn remaining(&self) -> u16 {
        self.region.width.saturating_sub(self.col)
    }

    /// Queue one run at the cursor, clipped to the region.
    fn emit(&mut self, spec: ColorSpec, text: &str) {
        self.attr = spec;
        if text.is_empty() {
            return;
        }
        let avail = usize::from(self.remaining());
        let mut clipped = String::new();
        let mut used = 0usize;
        for ch in text.chars() {
            // Control characters would move the terminal cursor on their own.
            let ch = if ch.is_control() { ' ' } else { ch };
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w > avail {
                break;
            }
            used += w;
            clipped.push(ch);
        }
        if let Some(y) = self.screen_row(self.row)
            && !clipped.is_empty()
        {
            self.canvas
                .queue(Command::MoveTo(self.region.x + self.col, y));
            self.canvas.queue(Command::SetStyle(StyleHandle::of(spec)));
            self.canvas.queue(Command::Print(clipped));
        }
        self.col = self.col.saturating_add(used as u16);
    }

    /// Erase logical `row` and park the cursor at its start.
    pub fn clear_row(&mut self, row: u16) {
        if let Some(y) = self.screen_row(row) {
            self.canvas.queue(Command::ClearLine {
                x: self.region.x,
                y,
                width: self.region.width,
            });
        }
        self.row = row;
        self.col = 0;
    }

    /// Erase every visible row; cursor returns to the top of the window.
    pub fn erase(&mut self) {
        for rel in 0..self.region.height {
            self.canvas.queue(Command::ClearLine {
                x: self.region.x,
                y: self.region.y + rel,
                width: self.region.width,
            });
        }
        self.row = self.scroll;
        self.col = 0;
    }

    /// Flush queued output.
    pub fn refresh(&mut self) -> Result<()> {
        self.canvas.flush()
    }

    /// Reflow marked-up text to the surface width. Every output line opens
    /// with an explicit color tag, starting from `current`.
    pub fn wrap_marked(&self, text: &str, current: ColorSpec) -> String {
        wrap::wrap_marked(text, usize::from(self.region.width), current).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemoryCanvas;
    use core_markup::Color;
    use pretty_assertions::assert_eq;

    fn surface(x: u16, width: u16, height: u16) -> (Surface, MemoryCanvas) {
        let canvas = MemoryCanvas::new(x + width + 2, height);
        let region = LayoutRegion::new(x, 0, width, height);
        (Surface::new(region, canvas.fork()), canvas)
    }

    #[test]
    fn write_decodes_markup_and_tracks_attr() {
        let (mut s, canvas) = surface(0, 20, 3);
        s.write("\x03R\x03red \x03G\x03green", WriteOpts::PLAIN);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 20), "red green");
        assert_eq!(canvas.spec_at(0, 0), Some(ColorSpec::fg(Color::Red)));
        assert_eq!(canvas.spec_at(4, 0), Some(ColorSpec::fg(Color::Green)));
        assert_eq!(s.attr(), ColorSpec::fg(Color::Green));
        assert_eq!(s.cursor(), (0, 9));
    }

    #[test]
    fn continuation_line_keeps_color() {
        let (mut s, canvas) = surface(0, 20, 3);
        s.write("\x03M\x03first\nsecond", WriteOpts::PLAIN);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 1, 20), "second");
        assert_eq!(canvas.spec_at(0, 1), Some(ColorSpec::fg(Color::Magenta)));
    }

    #[test]
    fn pad_erases_stale_tail() {
        let (mut s, canvas) = surface(0, 12, 1);
        s.write("\x03G\x03a long line", WriteOpts::PLAIN);
        s.move_to(0, 0);
        s.write("\x03G\x03short", WriteOpts::PADDED);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 12), "short");
        assert_eq!(s.cursor(), (0, 12));
    }

    #[test]
    fn center_uses_plain_width() {
        let (mut s, canvas) = surface(0, 10, 1);
        s.write("\x03BR\x03Notes:", WriteOpts::CENTERED);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 10), "  Notes:");
        let spans = canvas.row_spans(0, 0, 10);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].spec, ColorSpec::on(Color::Blue, Color::Red));
    }

    #[test]
    fn writes_clip_to_region() {
        let (mut s, canvas) = surface(3, 4, 2);
        s.write("abcdefgh", WriteOpts::PLAIN);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 12), "   abcd");
        s.move_to(5, 0);
        s.write("below", WriteOpts::PLAIN);
        s.refresh().unwrap();
        assert_eq!(canvas.take_touched(), vec![0]);
    }

    #[test]
    fn clear_row_honours_scroll() {
        let (mut s, canvas) = surface(0, 6, 3);
        s.write("r0\nr1\nr2", WriteOpts::PLAIN);
        s.refresh().unwrap();
        s.set_scroll(1);
        s.clear_row(2);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 6), "r0");
        assert_eq!(canvas.row_text(0, 1, 6), "");
        assert_eq!(canvas.row_text(0, 2, 6), "r2");
        assert_eq!(s.cursor(), (2, 0));
    }

    #[test]
    fn erase_clears_only_region() {
        let canvas = MemoryCanvas::new(10, 1);
        let mut left = Surface::new(LayoutRegion::new(0, 0, 5, 1), canvas.fork());
        let mut right = Surface::new(LayoutRegion::new(5, 0, 5, 1), canvas.fork());
        left.write("left", WriteOpts::PLAIN);
        right.write("right", WriteOpts::PLAIN);
        left.refresh().unwrap();
        right.refresh().unwrap();
        left.erase();
        left.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 10), "     right");
    }

    #[test]
    fn control_chars_never_reach_canvas() {
        let (mut s, canvas) = surface(0, 20, 1);
        s.write("\x03Q\x03odd\x03", WriteOpts::PLAIN);
        s.refresh().unwrap();
        assert_eq!(canvas.row_text(0, 0, 20), "Qodd");
    }

    #[derive(Clone, Default)]
    struct Recording(std::rc::Rc<std::cell::RefCell<Vec<Command>>>);

    impl Canvas for Recording {
        fn queue(&mut self, cmd: Command) {
            self.0.borrow_mut().push(cmd);
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn fork(&self) -> Box<dyn Canvas> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn terminal_controls_are_blanked_and_counted() {
        let rec = Recording::default();
        let mut s = Surface::new(LayoutRegion::new(0, 0, 10, 1), rec.fork());
        s.write("\x03G\x03a\tb\x1b[2Jc", WriteOpts::PADDED);
        let prints: Vec<String> = rec
            .0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Command::Print(p) => Some(p.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(prints, vec!["a b [2Jc".to_string(), "  ".to_string()]);
        assert!(prints.iter().all(|p| !p.chars().any(char::is_control)));
        assert_eq!(s.cursor(), (0, 10));
    }
}
