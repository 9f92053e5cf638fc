//! Note browser widgets.
//!
//! Widgets own their [`Surface`](core_render::Surface) outright; there is no
//! widget hierarchy. `list` is the selectable index column, `detail` the note
//! pane, and `highlight` the pure keyword annotation pass used by `detail`.

pub mod detail;
pub mod highlight;
pub mod list;

pub use detail::DetailWidget;
pub use highlight::highlight;
pub use list::ListWidget;
