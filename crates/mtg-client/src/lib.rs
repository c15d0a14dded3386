//! Blocking client for the meeting-notes image API.
//!
//! Wraps the two read endpoints the renderer needs:
//!
//! - `GET /images`: images uploaded by the authenticated user
//! - `GET /images/{path}`: a single image by `<ownerId>/<name>` path
//!
//! [`ApiClient`] implements [`mtg_blocks::ImageLookup`], so it can be handed
//! straight to the graph-block extractor as the fallback lookup.

mod client;
mod error;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::ClientError;
