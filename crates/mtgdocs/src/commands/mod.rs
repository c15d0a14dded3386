//! CLI command implementations.

pub(crate) mod extract;
pub(crate) mod render;
mod session;

pub(crate) use extract::ExtractArgs;
pub(crate) use render::RenderArgs;
