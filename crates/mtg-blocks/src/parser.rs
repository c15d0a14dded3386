//! Line-oriented parser for a single graph-block interior.
//!
//! Recognized lines (after trimming):
//!
//! - `[Name]` opens a tab
//! - `(Name)` opens a group inside the current tab
//! - `"Title" {image.png}` adds a graph to the current group
//!
//! Everything else is ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Graph, GraphGroup, TabGroup};
use crate::resolver::ImageResolver;

/// `"title" {name}`, first occurrence anywhere in the line.
static GRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.*?)"\s*\{(.*?)\}"#).unwrap());

/// Classified block line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Tab(&'a str),
    Group(&'a str),
    Graph { title: &'a str, name: &'a str },
    Other,
}

/// Where graphs of the current line go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupCursor {
    /// No group opened since the last tab header.
    None,
    /// The last group of the open tab.
    Attached,
    /// A group opened before any tab; its graphs are discarded.
    Orphan,
}

/// Parse one graph-block interior into tabs.
///
/// Lines are handled in a single forward pass. Each graph's image is resolved
/// before the next line is looked at, so lookups happen strictly in source
/// order.
///
/// # Example
///
/// ```
/// use mtg_blocks::{ImageResolver, NullImageLookup, SharedImageCache, parse_block};
///
/// let cache = SharedImageCache::new();
/// let mut resolver = ImageResolver::new("u1", &[], &cache, &NullImageLookup);
/// let tabs = parse_block("[Overview]\n(Sales)\n\"Q1\" {q1.png}", &mut resolver);
///
/// assert_eq!(tabs.len(), 1);
/// assert_eq!(tabs[0].groups[0].graphs[0].src, "unknown");
/// ```
pub fn parse_block(interior: &str, resolver: &mut ImageResolver<'_>) -> Vec<TabGroup> {
    let mut tabs = Vec::new();
    let mut current_tab: Option<TabGroup> = None;
    let mut current_group = GroupCursor::None;

    for line in interior.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match classify_line(line) {
            Line::Tab(name) => {
                if let Some(tab) = current_tab.take() {
                    tabs.push(tab);
                }
                current_tab = Some(TabGroup {
                    name: name.to_owned(),
                    groups: Vec::new(),
                });
                current_group = GroupCursor::None;
            }
            Line::Group(name) => {
                let group = GraphGroup {
                    name: name.to_owned(),
                    graphs: Vec::new(),
                };
                if let Some(tab) = current_tab.as_mut() {
                    tab.groups.push(group);
                    current_group = GroupCursor::Attached;
                } else {
                    tracing::debug!(group = name, "Dropping group declared before any tab");
                    current_group = GroupCursor::Orphan;
                }
            }
            Line::Graph { title, name } => {
                let src = resolver.resolve(name);
                let target = match current_group {
                    GroupCursor::Attached => current_tab
                        .as_mut()
                        .and_then(|tab| tab.groups.last_mut()),
                    GroupCursor::None | GroupCursor::Orphan => None,
                };
                if let Some(group) = target {
                    group.graphs.push(Graph {
                        title: title.to_owned(),
                        src,
                    });
                } else {
                    tracing::debug!(title, "Dropping graph outside of a group");
                }
            }
            Line::Other => {}
        }
    }

    if let Some(tab) = current_tab {
        tabs.push(tab);
    }

    tabs
}

/// Classify a trimmed, non-empty line.
///
/// Tab headers take precedence over group headers, which take precedence
/// over graph references.
fn classify_line(line: &str) -> Line<'_> {
    if let Some(name) = strip_delimiters(line, '[', ']') {
        return Line::Tab(name);
    }
    if let Some(name) = strip_delimiters(line, '(', ')') {
        return Line::Group(name);
    }
    if let Some(caps) = GRAPH_RE.captures(line) {
        let (_, [title, name]) = caps.extract();
        return Line::Graph { title, name };
    }
    Line::Other
}

/// Inner text of `line` when it starts with `open` and ends with `close`.
fn strip_delimiters(line: &str, open: char, close: char) -> Option<&str> {
    line.strip_prefix(open)?.strip_suffix(close)
}
