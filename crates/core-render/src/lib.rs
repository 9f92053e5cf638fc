//! Terminal drawing primitives for the note browser.
//!
//! Layers, bottom up:
//! - `style`: pure mapping from a markup [`ColorSpec`](core_markup::ColorSpec)
//!   to a [`StyleHandle`], plus the [`StylePalette`] that resolves handles to
//!   crossterm styles. The palette is built once at startup and handed to the
//!   terminal canvas explicitly.
//! - `writer`: the [`Canvas`] seam. Surfaces queue [`Command`]s and flush them
//!   on refresh. [`CrosstermCanvas`] targets stdout, [`MemoryCanvas`] keeps an
//!   inspectable cell grid.
//! - `surface`: a rectangular region with cursor, current attribute and an
//!   externally managed scroll offset. Decodes markup on write.
//! - `wrap`: word wrapping for plain and marked-up text via `textwrap`.
//!
//! Invariants:
//! - Nothing written through a `Surface` lands outside its region.
//! - No control character reaches a canvas.

pub mod style;
pub mod surface;
pub mod wrap;
pub mod writer;

pub use style::{StyleHandle, StylePalette};
pub use surface::{Surface, WriteOpts};
pub use writer::{Canvas, Command, CrosstermCanvas, MemoryCanvas};
