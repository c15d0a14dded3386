//! Graph-block extraction for meeting-note documents.
//!
//! A document body is plain markdown interspersed with graph blocks delimited
//! by `$$$` markers. Each block describes tabs of grouped images:
//!
//! ```text
//! $$$
//! [Overview]
//! (Sales)
//! "Q1 Revenue" {q1.png}
//! (Costs)
//! "Q1 Spend" {spend.png}
//! $$$
//! ```
//!
//! # Architecture
//!
//! - [`GraphBlockExtractor`]: finds every block, replaces it with
//!   [`PLACEHOLDER`] and collects the parsed [`TabGroup`]s in source order
//! - [`parse_block`]: single forward pass over one block interior
//! - [`ImageResolver`]: maps an image name to a URL through own images, the
//!   [`SharedImageCache`] and finally an [`ImageLookup`]
//!
//! Nothing in this crate fails: unknown lines are ignored, orphaned groups and
//! graphs are dropped, and unresolved images get the [`UNKNOWN_SRC`] sentinel.
//!
//! # Example
//!
//! ```
//! use mtg_blocks::{GraphBlockExtractor, ImageRef, NullImageLookup, SharedImageCache};
//!
//! let own = vec![ImageRef::new("1", "u1/q1.png", "https://x/q1")];
//! let cache = SharedImageCache::new();
//! let lookup = NullImageLookup;
//!
//! let result = GraphBlockExtractor::new("u1", &own, &cache, &lookup)
//!     .extract("Intro\n\n$$$\n[Overview]\n(Sales)\n\"Q1\" {q1.png}\n$$$\n");
//!
//! assert_eq!(result.body, "Intro\n\n!!GraphBlock!!\n");
//! assert_eq!(result.blocks[0][0].groups[0].graphs[0].src, "https://x/q1");
//! ```

mod cache;
mod extractor;
mod image;
mod lookup;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod model;
mod parser;
mod resolver;

pub use cache::SharedImageCache;
pub use extractor::{ExtractResult, GraphBlockExtractor, PLACEHOLDER, extract_graph_blocks};
pub use image::{ImageRef, image_name, image_path};
pub use lookup::{ImageLookup, NullImageLookup};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockImageLookup;
pub use model::{Graph, GraphGroup, TabGroup, UNKNOWN_SRC};
pub use parser::parse_block;
pub use resolver::ImageResolver;
