//! Markdown rendering with graph-block substitution.

use std::ops::Range;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use mtg_blocks::{ExtractResult, PLACEHOLDER, TabGroup};
use mtg_config::{GraphSize, RenderConfig};

use crate::tabs::render_block;

/// Result of rendering a document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Title extracted from the first H1 heading (if title extraction was enabled).
    pub title: Option<String>,
    /// Warnings generated during rendering (e.g., placeholders without a block).
    pub warnings: Vec<String>,
    /// Number of graph blocks rendered into the HTML.
    pub blocks: usize,
}

/// Renders an extracted document body to HTML.
///
/// The body is parsed as markdown. Every [`PLACEHOLDER`] inside paragraph
/// text is replaced by the tab set of its graph block; text around a
/// placeholder stays in its own paragraph. The n-th placeholder of the body
/// always gets the n-th block. Placeholders anywhere else (headings, code,
/// raw HTML, link destinations, tight list items, table cells) are left as
/// they are and their blocks are reported in [`RenderResult::warnings`].
///
/// # Example
///
/// ```
/// use mtg_blocks::{GraphBlockExtractor, NullImageLookup, SharedImageCache};
/// use mtg_renderer::DocumentRenderer;
///
/// let cache = SharedImageCache::new();
/// let extracted = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup)
///     .extract("# Weekly\n\n$$$\n[Overview]\n(Sales)\n\"Q1\" {q1.png}\n$$$\n");
///
/// let result = DocumentRenderer::new().with_title_extraction().render(&extracted);
///
/// assert_eq!(result.title.as_deref(), Some("Weekly"));
/// assert_eq!(result.blocks, 1);
/// assert!(result.html.contains(r#"role="tablist""#));
/// assert!(result.html.contains("No Image"));
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    graph_size: GraphSize,
    palette: Vec<String>,
    gfm: bool,
    extract_title: bool,
}

impl DocumentRenderer {
    /// Create a renderer with default settings (GFM enabled, small graphs).
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&RenderConfig::default())
    }

    /// Create a renderer from rendering configuration.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            graph_size: config.graph_size,
            palette: config.palette.clone(),
            gfm: config.gfm,
            extract_title: false,
        }
    }

    /// Enable title extraction from the first H1 heading.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.extract_title = true;
        self
    }

    /// Set the graph image size preset.
    #[must_use]
    pub fn with_graph_size(mut self, size: GraphSize) -> Self {
        self.graph_size = size;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render an extracted document.
    #[must_use]
    pub fn render(&self, extracted: &ExtractResult<'_>) -> RenderResult {
        let parser =
            Parser::new_ext(&extracted.body, self.parser_options()).into_offset_iter();
        let mut blocks = BlockSubstitution::new(self, &extracted.body, &extracted.blocks);
        let mut title = TitleCapture::new(self.extract_title);
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut paragraph: Option<Vec<(Event<'_>, Range<usize>)>> = None;

        for (event, range) in merge_text(parser) {
            title.observe(&event);
            match event {
                Event::Start(Tag::Paragraph) => paragraph = Some(Vec::new()),
                Event::End(TagEnd::Paragraph) => match paragraph.take() {
                    Some(inner) => blocks.substitute_paragraph(inner, &mut events),
                    None => events.push(event),
                },
                other => match paragraph.as_mut() {
                    Some(inner) => inner.push((other, range)),
                    None => events.push(other),
                },
            }
        }

        let mut html = String::with_capacity(extracted.body.len() * 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        let (warnings, rendered) = blocks.finish();
        RenderResult {
            html,
            title: title.into_title(),
            warnings,
            blocks: rendered,
        }
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Join consecutive text events, widening the source range to cover both.
///
/// The parser splits text at characters that might start markup (`!` among
/// them), so a placeholder can arrive in several pieces.
fn merge_text<'a>(
    events: impl Iterator<Item = (Event<'a>, Range<usize>)>,
) -> Vec<(Event<'a>, Range<usize>)> {
    let mut merged: Vec<(Event<'a>, Range<usize>)> = Vec::new();

    for (event, range) in events {
        if let (Event::Text(text), Some((Event::Text(prev), prev_range))) =
            (&event, merged.last_mut())
        {
            let mut joined = String::from(&**prev);
            joined.push_str(text);
            *prev = CowStr::from(joined);
            prev_range.end = range.end;
            continue;
        }
        merged.push((event, range));
    }

    merged
}

/// Matches placeholders to graph blocks by their position in the body.
///
/// The n-th placeholder occurrence owns block n. A placeholder is claimed
/// when it is rendered; unclaimed ones are reported by [`finish`](Self::finish).
struct BlockSubstitution<'r> {
    renderer: &'r DocumentRenderer,
    blocks: &'r [Vec<TabGroup>],
    /// Byte offsets of every placeholder in the body.
    positions: Vec<usize>,
    claimed: Vec<bool>,
    rendered: usize,
    warnings: Vec<String>,
}

impl<'r> BlockSubstitution<'r> {
    fn new(renderer: &'r DocumentRenderer, body: &str, blocks: &'r [Vec<TabGroup>]) -> Self {
        let positions: Vec<usize> = body.match_indices(PLACEHOLDER).map(|(at, _)| at).collect();
        let claimed = vec![false; positions.len()];
        Self {
            renderer,
            blocks,
            positions,
            claimed,
            rendered: 0,
            warnings: Vec::new(),
        }
    }

    /// Block indices for `count` placeholders found in text parsed from `range`.
    ///
    /// `None` marks a placeholder with no matching occurrence in the source
    /// (e.g., one spelled with character references).
    fn claim(&mut self, range: &Range<usize>, count: usize) -> Vec<Option<usize>> {
        let mut ids = Vec::with_capacity(count);
        for (idx, &at) in self.positions.iter().enumerate() {
            if ids.len() == count {
                break;
            }
            if at >= range.start && at + PLACEHOLDER.len() <= range.end && !self.claimed[idx] {
                self.claimed[idx] = true;
                ids.push(Some(idx));
            }
        }
        ids.resize(count, None);
        ids
    }

    /// Emit a paragraph's inline events, splitting it around placeholders.
    ///
    /// Placeholders in top-level text become block HTML at their position.
    /// Placeholders nested in inline markup (emphasis, link text, code spans)
    /// are removed from the text and their blocks follow the paragraph.
    fn substitute_paragraph<'a>(
        &mut self,
        inner: Vec<(Event<'a>, Range<usize>)>,
        out: &mut Vec<Event<'a>>,
    ) {
        let mut segment: Vec<Event<'a>> = Vec::new();
        let mut depth = 0usize;
        let mut deferred: Vec<Option<usize>> = Vec::new();

        for (event, range) in inner {
            match event {
                Event::Start(_) => {
                    depth += 1;
                    segment.push(event);
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    segment.push(event);
                }
                Event::Text(text) if depth == 0 && text.contains(PLACEHOLDER) => {
                    let ids = self.claim(&range, text.matches(PLACEHOLDER).count());
                    let mut parts = text.split(PLACEHOLDER);
                    if let Some(first) = parts.next() {
                        push_text(&mut segment, first);
                    }
                    for (part, id) in parts.zip(ids) {
                        flush_paragraph(&mut segment, out);
                        out.push(self.block_event(id));
                        push_text(&mut segment, part);
                    }
                }
                Event::Text(text) if text.contains(PLACEHOLDER) => {
                    deferred.extend(self.claim(&range, text.matches(PLACEHOLDER).count()));
                    push_text(&mut segment, &text.replace(PLACEHOLDER, ""));
                }
                Event::Code(code) if code.contains(PLACEHOLDER) => {
                    deferred.extend(self.claim(&range, code.matches(PLACEHOLDER).count()));
                    let stripped = code.replace(PLACEHOLDER, "");
                    if !stripped.is_empty() {
                        segment.push(Event::Code(CowStr::from(stripped)));
                    }
                }
                other => segment.push(other),
            }
        }

        flush_paragraph(&mut segment, out);
        for id in deferred {
            out.push(self.block_event(id));
        }
    }

    /// HTML event for block `id`, or a "not found" notice.
    fn block_event(&mut self, id: Option<usize>) -> Event<'static> {
        let tabs = id.and_then(|id| self.blocks.get(id).map(|tabs| (id, tabs)));

        let html = if let Some((id, tabs)) = tabs {
            self.rendered += 1;
            render_block(
                id,
                tabs,
                &self.renderer.palette,
                self.renderer.graph_size.pixels(),
            )
        } else {
            self.warnings.push(match id {
                Some(id) => format!("graph block {id} not found for placeholder"),
                None => "placeholder does not match a graph block".to_owned(),
            });
            r#"<p class="graph-block-missing">GraphBlock not Found</p>"#.to_owned()
        };

        Event::Html(CowStr::from(html + "\n"))
    }

    /// Report unrendered blocks; returns the warnings and the rendered count.
    fn finish(mut self) -> (Vec<String>, usize) {
        for (id, claimed) in self.claimed.iter().enumerate() {
            if !claimed && id < self.blocks.len() {
                self.warnings.push(format!(
                    "graph block {id} left unrendered: placeholder is not in paragraph text"
                ));
            }
        }
        if self.positions.len() < self.blocks.len() {
            self.warnings.push(format!(
                "{} graph block(s) without a placeholder",
                self.blocks.len() - self.positions.len()
            ));
        }
        for warning in &self.warnings {
            tracing::debug!(warning = %warning, "Render warning");
        }
        (self.warnings, self.rendered)
    }
}

fn push_text(segment: &mut Vec<Event<'_>>, text: &str) {
    if !text.is_empty() {
        segment.push(Event::Text(CowStr::from(text.to_owned())));
    }
}

/// Emit `segment` as a paragraph if it holds anything besides whitespace.
fn flush_paragraph<'a>(segment: &mut Vec<Event<'a>>, out: &mut Vec<Event<'a>>) {
    let meaningful = segment.iter().any(|event| match event {
        Event::Text(text) => !text.trim().is_empty(),
        Event::SoftBreak | Event::HardBreak => false,
        _ => true,
    });

    if meaningful {
        out.push(Event::Start(Tag::Paragraph));
        out.append(segment);
        out.push(Event::End(TagEnd::Paragraph));
    } else {
        segment.clear();
    }
}

/// Collects the text of the first H1 heading.
struct TitleCapture {
    enabled: bool,
    buffer: Option<String>,
    title: Option<String>,
}

impl TitleCapture {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            buffer: None,
            title: None,
        }
    }

    fn observe(&mut self, event: &Event<'_>) {
        if !self.enabled {
            return;
        }
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if self.title.is_none() => self.buffer = Some(String::new()),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(buffer) = self.buffer.take() {
                    self.title = Some(buffer.trim().to_owned());
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = self.buffer.as_mut() {
                    buffer.push_str(text);
                }
            }
            _ => {}
        }
    }

    fn into_title(self) -> Option<String> {
        self.title
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use mtg_blocks::{
        Graph, GraphBlockExtractor, GraphGroup, ImageRef, MockImageLookup, NullImageLookup,
        SharedImageCache,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> RenderResult {
        let cache = SharedImageCache::new();
        let extracted = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup).extract(markdown);
        DocumentRenderer::new().render(&extracted)
    }

    fn tab(name: &str) -> TabGroup {
        TabGroup {
            name: name.to_owned(),
            groups: vec![GraphGroup {
                name: "G".to_owned(),
                graphs: vec![Graph {
                    title: "T".to_owned(),
                    src: "unknown".to_owned(),
                }],
            }],
        }
    }

    #[test]
    fn test_plain_markdown() {
        let result = render("# Title\n\nSome **bold** text.\n");

        assert_eq!(result.html, "<h1>Title</h1>\n<p>Some <strong>bold</strong> text.</p>\n");
        assert!(result.warnings.is_empty());
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_gfm_table() {
        let result = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(result.html.contains("<table>"));
    }

    #[test]
    fn test_gfm_disabled() {
        let cache = SharedImageCache::new();
        let extracted = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup)
            .extract("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let config = RenderConfig {
            gfm: false,
            ..RenderConfig::default()
        };
        let result = DocumentRenderer::from_config(&config).render(&extracted);
        assert!(!result.html.contains("<table>"));
    }

    #[test]
    fn test_block_replaces_paragraph() {
        let result = render("Intro\n\n$$$\n[Overview]\n(Sales)\n\"Q1\" {q1.png}\n$$$\n\nOutro\n");

        assert!(result.html.starts_with("<p>Intro</p>\n"));
        assert!(result.html.contains(r#"<div class="graph-block" id="graph-block-0">"#));
        assert!(result.html.ends_with("<p>Outro</p>\n"));
        assert!(!result.html.contains(PLACEHOLDER));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_blocks_substituted_in_order() {
        let result = render("$$$\n[First]\n$$$\n\nbetween\n\n$$$\n[Second]\n$$$\n");

        let first = result.html.find("First").unwrap();
        let between = result.html.find("between").unwrap();
        let second = result.html.find("Second").unwrap();
        assert!(first < between && between < second);
        assert!(result.html.contains(r#"id="graph-block-1""#));
        assert_eq!(result.blocks, 2);
        assert!(result.warnings.is_empty());
    }

    fn first_tab_button(block: usize, name: &str) -> String {
        format!(
            r#"<button role="tab" id="graph-tab-{block}-0" aria-controls="graph-panel-{block}-0" aria-selected="true" tabindex="0">{name}</button>"#
        )
    }

    #[test]
    fn test_placeholder_in_html_block_keeps_alignment() {
        let result = render("<div>\n$$$[InHtml]$$$\n</div>\n\n$$$[Second]$$$\n");

        assert!(result.html.contains("<div>\n!!GraphBlock!!\n</div>"));
        assert!(!result.html.contains("InHtml"));
        assert!(result.html.contains(&first_tab_button(1, "Second")));
        assert_eq!(result.blocks, 1);
        assert_eq!(
            result.warnings,
            vec!["graph block 0 left unrendered: placeholder is not in paragraph text".to_owned()]
        );
    }

    #[test]
    fn test_placeholder_in_link_destination_keeps_alignment() {
        let result = render("[see](x$$$[InLink]$$$)\n\n$$$[Second]$$$\n");

        assert!(result.html.contains(">see</a>"));
        assert!(!result.html.contains("InLink"));
        assert!(result.html.contains(&first_tab_button(1, "Second")));
        assert_eq!(result.blocks, 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_placeholder_in_inline_html_keeps_alignment() {
        let result = render(r#"<img alt="$$$[InAttr]$$$"> then $$$[Second]$$$"#);

        assert!(!result.html.contains("InAttr"));
        assert!(result.html.contains(&first_tab_button(1, "Second")));
        assert_eq!(result.blocks, 1);
    }

    #[test]
    fn test_unused_reference_definition_keeps_alignment() {
        let result = render("[ref]: x$$$[InDef]$$$\n\n$$$[Second]$$$\n");

        assert!(!result.html.contains("InDef"));
        assert!(result.html.contains(&first_tab_button(1, "Second")));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_nested_placeholder_before_top_level_keeps_alignment() {
        let result = render("*$$$[A]$$$* then $$$[B]$$$\n");

        assert!(result.html.contains(&first_tab_button(0, "A")));
        assert!(result.html.contains(&first_tab_button(1, "B")));
        assert_eq!(result.blocks, 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_text_around_placeholder_kept() {
        let result = render("See the charts: $$$[Tab]$$$ and notes after.\n");

        assert!(result.html.contains("<p>See the charts: </p>"));
        assert!(result.html.contains("<p> and notes after.</p>"));
        let chart = result.html.find("graph-block-0").unwrap();
        let before = result.html.find("See the charts").unwrap();
        let after = result.html.find("notes after").unwrap();
        assert!(before < chart && chart < after);
    }

    #[test]
    fn test_adjacent_placeholders_in_one_paragraph() {
        let cache = SharedImageCache::new();
        let extracted = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup)
            .extract("$$$[A]$$$$$$[B]$$$");
        assert_eq!(extracted.blocks.len(), 2);

        let result = DocumentRenderer::new().render(&extracted);
        assert!(result.html.contains("graph-block-0"));
        assert!(result.html.contains("graph-block-1"));
        assert!(!result.html.contains("<p></p>"));
    }

    #[test]
    fn test_placeholder_inside_emphasis_is_deferred() {
        let result = render("*look: $$$[Tab]$$$*\n");

        assert!(result.html.contains("<p><em>look: </em></p>"));
        assert!(result.html.contains("graph-block-0"));
        assert!(!result.html.contains(PLACEHOLDER));
    }

    #[test]
    fn test_missing_block_renders_notice() {
        let extracted = ExtractResult {
            body: Cow::Borrowed("!!GraphBlock!!\n"),
            blocks: vec![],
        };
        let result = DocumentRenderer::new().render(&extracted);

        assert!(result.html.contains(r#"<p class="graph-block-missing">GraphBlock not Found</p>"#));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_unused_block_warns() {
        let extracted = ExtractResult {
            body: Cow::Borrowed("no placeholder here\n"),
            blocks: vec![vec![tab("Orphan")]],
        };
        let result = DocumentRenderer::new().render(&extracted);

        assert!(!result.html.contains("Orphan"));
        assert!(result.warnings[0].contains("without a placeholder"));
    }

    #[test]
    fn test_placeholder_in_heading_skips_block() {
        let extracted = ExtractResult {
            body: Cow::Borrowed("# !!GraphBlock!!\n\n!!GraphBlock!!\n"),
            blocks: vec![vec![tab("InHeading")], vec![tab("InParagraph")]],
        };
        let result = DocumentRenderer::new().render(&extracted);

        assert!(result.html.contains("<h1>!!GraphBlock!!</h1>"));
        assert!(!result.html.contains("InHeading"));
        assert!(result.html.contains("InParagraph"));
        assert!(result.html.contains("graph-block-1"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_title_extraction() {
        let cache = SharedImageCache::new();
        let extracted = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup)
            .extract("Preface\n\n# Weekly `sync`\n\n# Second\n");
        let result = DocumentRenderer::new().with_title_extraction().render(&extracted);

        assert_eq!(result.title.as_deref(), Some("Weekly sync"));
    }

    #[test]
    fn test_graph_size_applied() {
        let own = vec![ImageRef::new("1", "u1/q1.png", "https://x/q1")];
        let cache = SharedImageCache::new();
        let lookup = MockImageLookup::new();
        let extracted = GraphBlockExtractor::new("u1", &own, &cache, &lookup)
            .extract("$$$\n[T]\n(G)\n\"Q1\" {q1.png}\n$$$\n");

        let result = DocumentRenderer::new()
            .with_graph_size(GraphSize::Large)
            .render(&extracted);

        assert!(result.html.contains(r#"<img src="https://x/q1" alt="Q1" style="max-width: 640px">"#));
    }
}
