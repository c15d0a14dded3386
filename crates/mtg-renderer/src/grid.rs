//! Grid layout of one tab's graphs.
//!
//! Each group is a column and the n-th graph of every group shares row n.
//! Groups shorter than the longest one leave empty cells.

use std::fmt::Write;

use mtg_blocks::{Graph, GraphGroup, TabGroup};

use crate::util::escape_html;

/// Colour used when the palette is empty.
const FALLBACK_COLOR: &str = "currentColor";

/// A group placed in the grid with its display colour.
#[derive(Debug)]
pub struct GridColumn<'a> {
    /// The group shown in this column.
    pub group: &'a GraphGroup,
    /// CSS colour marking the group.
    pub color: &'a str,
}

/// Column-per-group layout of a [`TabGroup`].
///
/// # Example
///
/// ```
/// use mtg_blocks::{Graph, GraphGroup, TabGroup};
/// use mtg_renderer::GraphGrid;
///
/// let graph = |t: &str| Graph { title: t.to_owned(), src: "unknown".to_owned() };
/// let tab = TabGroup {
///     name: "Overview".to_owned(),
///     groups: vec![
///         GraphGroup { name: "Sales".to_owned(), graphs: vec![graph("Q1"), graph("Q2")] },
///         GraphGroup { name: "Costs".to_owned(), graphs: vec![graph("Q1")] },
///     ],
/// };
/// let palette = vec!["red".to_owned(), "blue".to_owned()];
/// let grid = GraphGrid::new(&tab, &palette);
///
/// assert_eq!(grid.row_count(), 2);
/// assert_eq!(grid.columns()[1].color, "blue");
/// assert!(grid.cell(1, 1).is_none());
/// ```
#[derive(Debug)]
pub struct GraphGrid<'a> {
    columns: Vec<GridColumn<'a>>,
    rows: usize,
}

impl<'a> GraphGrid<'a> {
    /// Lay out `tab`, colouring groups from `palette` by index.
    #[must_use]
    pub fn new(tab: &'a TabGroup, palette: &'a [String]) -> Self {
        let columns = tab
            .groups
            .iter()
            .enumerate()
            .map(|(idx, group)| GridColumn {
                group,
                color: palette_color(palette, idx),
            })
            .collect();

        Self {
            columns,
            rows: tab.max_graphs_per_group(),
        }
    }

    /// Columns in group order.
    #[must_use]
    pub fn columns(&self) -> &[GridColumn<'a>] {
        &self.columns
    }

    /// Number of rows (the longest group's graph count).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Graph at `row` in column `col`, if that group has one.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&'a Graph> {
        self.columns.get(col)?.group.graphs.get(row)
    }

    /// Render the grid as an HTML table.
    ///
    /// Images are limited to `max_width` pixels; unresolved images show a
    /// "No Image" box instead.
    #[must_use]
    pub fn to_html(&self, max_width: u32) -> String {
        let mut out = String::from(r#"<table class="graph-grid"><tbody>"#);

        for row in 0..self.rows {
            out.push_str("<tr>");
            for (col, column) in self.columns.iter().enumerate() {
                match self.cell(row, col) {
                    Some(graph) => {
                        out.push_str(r#"<td class="graph-cell">"#);
                        push_graph(&mut out, column, graph, max_width);
                        out.push_str("</td>");
                    }
                    None => out.push_str(r#"<td class="graph-cell graph-cell-empty"></td>"#),
                }
            }
            out.push_str("</tr>");
        }

        out.push_str("</tbody></table>");
        out
    }
}

fn palette_color(palette: &[String], idx: usize) -> &str {
    if palette.is_empty() {
        FALLBACK_COLOR
    } else {
        &palette[idx % palette.len()]
    }
}

fn push_graph(out: &mut String, column: &GridColumn<'_>, graph: &Graph, max_width: u32) {
    let title = escape_html(&graph.title);
    let _ = write!(
        out,
        r#"<figure class="graph"><figcaption><span class="graph-group-color" style="background-color: {}"></span>{} - {}</figcaption>"#,
        escape_html(column.color),
        escape_html(&column.group.name),
        title,
    );

    if graph.is_unknown() {
        out.push_str(r#"<div class="graph-missing">No Image</div>"#);
    } else {
        let _ = write!(
            out,
            r#"<img src="{}" alt="{title}" style="max-width: {max_width}px">"#,
            escape_html(&graph.src),
        );
    }

    out.push_str("</figure>");
}
