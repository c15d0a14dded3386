//! Parsed graph-block structure.

use serde::Serialize;

/// Source used for a graph whose image could not be resolved.
pub const UNKNOWN_SRC: &str = "unknown";

/// A single titled image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Graph {
    /// Caption shown above the image.
    pub title: String,
    /// Resolved image URL, or [`UNKNOWN_SRC`].
    pub src: String,
}

impl Graph {
    /// Whether the image reference could not be resolved.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.src == UNKNOWN_SRC
    }
}

/// Named subsection of a tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphGroup {
    /// Group name from a `(Name)` header.
    pub name: String,
    /// Graphs in source order.
    pub graphs: Vec<Graph>,
}

/// Top-level named section of a graph block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabGroup {
    /// Tab name from a `[Name]` header.
    pub name: String,
    /// Groups in source order.
    pub groups: Vec<GraphGroup>,
}

impl TabGroup {
    /// Largest number of graphs in any group of this tab.
    #[must_use]
    pub fn max_graphs_per_group(&self) -> usize {
        self.groups.iter().map(|g| g.graphs.len()).max().unwrap_or(0)
    }
}
