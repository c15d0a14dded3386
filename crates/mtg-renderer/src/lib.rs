//! HTML rendering for meeting-note documents with graph blocks.
//!
//! Takes the output of [`mtg_blocks::GraphBlockExtractor`], renders the body
//! as markdown with `pulldown-cmark` and swaps each placeholder for a tab set
//! of graph grids.
//!
//! # Architecture
//!
//! - [`DocumentRenderer`]: markdown to HTML with in-order block substitution
//! - [`GraphGrid`]: column-per-group layout of one tab
//!
//! Substitution never fails. A placeholder without a block renders a
//! "GraphBlock not Found" notice and is reported in [`RenderResult::warnings`].

mod grid;
mod renderer;
mod tabs;
mod util;

pub use grid::{GraphGrid, GridColumn};
pub use renderer::{DocumentRenderer, RenderResult};
pub use util::escape_html;
