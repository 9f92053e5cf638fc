//! Canvas abstraction: the seam between surfaces and the terminal.
//!
//! Surfaces queue primitive [`Command`]s and flush once per refresh.
//!
//! Design invariants:
//! * Commands preserve ordering; nothing is emitted before `flush`.
//! * All positions are absolute terminal cells; surfaces clip before queueing.
//! * `ClearLine` is region-bounded (x, y, width) so clearing one pane never
//!   touches the neighbouring column.
//! * Canvases hold no global state. `fork` hands out another handle onto the
//!   same output so each surface can own its canvas.

use crate::style::{StyleHandle, StylePalette};
use anyhow::Result;
use core_markup::{ColorSpec, MarkupSpan};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, ResetColor, SetStyle},
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::{Write, stdout};
use std::rc::Rc;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    SetStyle(StyleHandle),
    /// Blank `width` cells starting at (x, y) using the plain style.
    ClearLine { x: u16, y: u16, width: u16 },
    Print(String),
}

pub trait Canvas {
    fn queue(&mut self, cmd: Command);
    fn flush(&mut self) -> Result<()>;
    /// Another handle writing to the same output.
    fn fork(&self) -> Box<dyn Canvas>;
}

/// Canvas writing to stdout through crossterm.
pub struct CrosstermCanvas {
    palette: Rc<StylePalette>,
    cmds: Vec<Command>,
}

impl CrosstermCanvas {
    pub fn new(palette: Rc<StylePalette>) -> Self {
        Self {
            palette,
            cmds: Vec::new(),
        }
    }
}

impl Canvas for CrosstermCanvas {
    fn queue(&mut self, cmd: Command) {
        if matches!(&cmd, Command::Print(s) if s.is_empty()) {
            return;
        }
        self.cmds.push(cmd);
    }

    fn flush(&mut self) -> Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let mut out = stdout();
        let plain = self.palette.resolve(StyleHandle::of(ColorSpec::PLAIN));
        for c in self.cmds.drain(..) {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::SetStyle(handle) => {
                    queue!(out, SetStyle(self.palette.resolve(handle)))?;
                }
                Command::ClearLine { x, y, width } => {
                    queue!(
                        out,
                        MoveTo(x, y),
                        SetStyle(plain),
                        Print(" ".repeat(usize::from(width)))
                    )?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        queue!(out, ResetColor)?;
        out.flush()?;
        Ok(())
    }

    fn fork(&self) -> Box<dyn Canvas> {
        Box::new(CrosstermCanvas::new(self.palette.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    style: StyleHandle,
}

// Second column of a wide character.
const CONTINUATION: char = '\0';

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: StyleHandle::of(ColorSpec::PLAIN),
        }
    }
}

#[derive(Debug)]
struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    x: u16,
    y: u16,
    style: StyleHandle,
    touched: BTreeSet<u16>,
    flushes: u64,
}

impl Grid {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            x: 0,
            y: 0,
            style: StyleHandle::default(),
            touched: BTreeSet::new(),
            flushes: 0,
        }
    }

    fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.cells.get_mut(idx)
    }

    fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.cells.get(idx).copied()
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::MoveTo(x, y) => {
                self.x = x;
                self.y = y;
            }
            Command::SetStyle(handle) => self.style = handle,
            Command::ClearLine { x, y, width } => {
                for col in x..x.saturating_add(width) {
                    if let Some(cell) = self.cell_mut(col, y) {
                        *cell = Cell::default();
                    }
                }
                self.touched.insert(y);
                self.x = x;
                self.y = y;
            }
            Command::Print(s) => {
                let (y, style) = (self.y, self.style);
                for ch in s.chars() {
                    let w = UnicodeWidthChar::width(ch).unwrap_or(0) as u16;
                    if w == 0 {
                        continue;
                    }
                    let x = self.x;
                    if x.saturating_add(w) > self.width {
                        self.x = self.x.saturating_add(w);
                        continue;
                    }
                    if let Some(cell) = self.cell_mut(x, y) {
                        *cell = Cell { ch, style };
                    }
                    for extra in 1..w {
                        if let Some(cell) = self.cell_mut(x + extra, y) {
                            *cell = Cell {
                                ch: CONTINUATION,
                                style,
                            };
                        }
                    }
                    self.x = self.x.saturating_add(w);
                }
                self.touched.insert(y);
            }
        }
    }
}

/// In-memory canvas keeping a cell grid of the whole screen.
///
/// Commands become visible on `flush`, mirroring a real terminal. Clones and
/// forks share the grid.
#[derive(Clone)]
pub struct MemoryCanvas {
    grid: Rc<RefCell<Grid>>,
    cmds: Vec<Command>,
}

impl MemoryCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: Rc::new(RefCell::new(Grid::new(width, height))),
            cmds: Vec::new(),
        }
    }

    /// Text of row `y` between columns `[x, x + width)`, trailing blanks
    /// trimmed.
    pub fn row_text(&self, x: u16, y: u16, width: u16) -> String {
        let grid = self.grid.borrow();
        let mut out = String::new();
        for col in x..x.saturating_add(width) {
            match grid.cell(col, y) {
                Some(cell) if cell.ch != CONTINUATION => out.push(cell.ch),
                _ => {}
            }
        }
        out.trim_end().to_string()
    }

    /// Color of a single cell.
    pub fn spec_at(&self, x: u16, y: u16) -> Option<ColorSpec> {
        self.grid.borrow().cell(x, y).map(|c| c.style.spec())
    }

    /// Row contents grouped into same-color runs.
    pub fn row_spans(&self, x: u16, y: u16, width: u16) -> Vec<MarkupSpan> {
        let grid = self.grid.borrow();
        let mut spans: Vec<MarkupSpan> = Vec::new();
        for col in x..x.saturating_add(width) {
            let Some(cell) = grid.cell(col, y) else {
                break;
            };
            if cell.ch == CONTINUATION {
                continue;
            }
            let spec = cell.style.spec();
            match spans.last_mut() {
                Some(last) if last.spec == spec => last.text.push(cell.ch),
                _ => spans.push(MarkupSpan::new(spec, cell.ch.to_string())),
            }
        }
        spans
    }

    /// Rows written or cleared since the last call.
    pub fn take_touched(&self) -> Vec<u16> {
        std::mem::take(&mut self.grid.borrow_mut().touched)
            .into_iter()
            .collect()
    }

    pub fn flush_count(&self) -> u64 {
        self.grid.borrow().flushes
    }
}

impl Canvas for MemoryCanvas {
    fn queue(&mut self, cmd: Command) {
        self.cmds.push(cmd);
    }

    fn flush(&mut self) -> Result<()> {
        let mut grid = self.grid.borrow_mut();
        for cmd in self.cmds.drain(..) {
            grid.apply(cmd);
        }
        grid.flushes += 1;
        Ok(())
    }

    fn fork(&self) -> Box<dyn Canvas> {
        Box::new(MemoryCanvas {
            grid: self.grid.clone(),
            cmds: Vec::new(),
        })
    }
}
