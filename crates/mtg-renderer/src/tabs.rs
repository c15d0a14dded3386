//! Accessible tab markup for a parsed graph block.
//!
//! # Output HTML Structure
//!
//! ```html
//! <div class="graph-block" id="graph-block-0">
//!   <div class="graph-tabs" role="tablist">
//!     <button role="tab" id="graph-tab-0-0" aria-controls="graph-panel-0-0"
//!             aria-selected="true" tabindex="0">Overview</button>
//!     <button role="tab" id="graph-tab-0-1" aria-controls="graph-panel-0-1"
//!             aria-selected="false" tabindex="-1">Details</button>
//!   </div>
//!   <div role="tabpanel" id="graph-panel-0-0" aria-labelledby="graph-tab-0-0">
//!     <!-- grid -->
//!   </div>
//!   <div role="tabpanel" id="graph-panel-0-1" aria-labelledby="graph-tab-0-1" hidden>
//!     <!-- grid -->
//!   </div>
//! </div>
//! ```

use std::fmt::Write;

use mtg_blocks::TabGroup;

use crate::grid::GraphGrid;
use crate::util::escape_html;

/// Render graph block number `block_id` as a tab set with one grid per tab.
pub(crate) fn render_block(
    block_id: usize,
    tabs: &[TabGroup],
    palette: &[String],
    max_width: u32,
) -> String {
    let mut output = String::with_capacity(512);

    if tabs.is_empty() {
        let _ = write!(
            output,
            r#"<div class="graph-block graph-block-empty" id="graph-block-{block_id}"></div>"#
        );
        return output;
    }

    let _ = write!(output, r#"<div class="graph-block" id="graph-block-{block_id}">"#);

    output.push_str(r#"<div class="graph-tabs" role="tablist">"#);
    for (idx, tab) in tabs.iter().enumerate() {
        let selected = idx == 0;
        let _ = write!(
            output,
            r#"<button role="tab" id="graph-tab-{block_id}-{idx}" aria-controls="graph-panel-{block_id}-{idx}" aria-selected="{selected}" tabindex="{}">{}</button>"#,
            if selected { "0" } else { "-1" },
            escape_html(&tab.name)
        );
    }
    output.push_str("</div>");

    for (idx, tab) in tabs.iter().enumerate() {
        let hidden = if idx == 0 { "" } else { " hidden" };
        let grid = GraphGrid::new(tab, palette).to_html(max_width);
        let _ = write!(
            output,
            r#"<div role="tabpanel" id="graph-panel-{block_id}-{idx}" aria-labelledby="graph-tab-{block_id}-{idx}"{hidden}>{grid}</div>"#
        );
    }

    output.push_str("</div>");
    output
}
