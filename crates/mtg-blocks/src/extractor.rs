//! Graph-block extraction from document bodies.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::cache::SharedImageCache;
use crate::image::ImageRef;
use crate::lookup::ImageLookup;
use crate::model::TabGroup;
use crate::parser::parse_block;
use crate::resolver::ImageResolver;

/// Token substituted for every extracted graph block.
pub const PLACEHOLDER: &str = "!!GraphBlock!!";

/// `$$$ ... $$$`, non-greedy, spanning lines.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\$\$\$(.*?)\$\$\$").unwrap());

/// Result of extracting graph blocks from a document body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractResult<'a> {
    /// Body with each block replaced by [`PLACEHOLDER`].
    ///
    /// Borrowed from the input when the body contains no blocks.
    pub body: Cow<'a, str>,
    /// Parsed blocks, one per placeholder, in body order.
    pub blocks: Vec<Vec<TabGroup>>,
}

impl ExtractResult<'_> {
    /// Number of placeholders in [`body`](Self::body).
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.body.matches(PLACEHOLDER).count()
    }

    /// Number of graphs whose image could not be resolved.
    #[must_use]
    pub fn unknown_graph_count(&self) -> usize {
        self.blocks
            .iter()
            .flatten()
            .flat_map(|tab| &tab.groups)
            .flat_map(|group| &group.graphs)
            .filter(|graph| graph.is_unknown())
            .count()
    }

    /// Detach the result from the input body.
    #[must_use]
    pub fn into_owned(self) -> ExtractResult<'static> {
        ExtractResult {
            body: Cow::Owned(self.body.into_owned()),
            blocks: self.blocks,
        }
    }
}

/// Extracts graph blocks on behalf of one user.
///
/// Blocks are found left to right; each block is parsed completely (including
/// every image lookup) before the next one is started. Images fetched through
/// the [`ImageLookup`] are prepended to the shared cache, so later extractions
/// in the same session find them without another lookup.
///
/// # Example
///
/// ```
/// use mtg_blocks::{GraphBlockExtractor, NullImageLookup, SharedImageCache};
///
/// let cache = SharedImageCache::new();
/// let extractor = GraphBlockExtractor::new("u1", &[], &cache, &NullImageLookup)
///     .with_author(Some("bob"));
///
/// let result = extractor.extract("$$$[A]$$$ and $$$[B]$$$");
/// assert_eq!(result.body, "!!GraphBlock!! and !!GraphBlock!!");
/// assert_eq!(result.blocks[0][0].name, "A");
/// assert_eq!(result.blocks[1][0].name, "B");
/// ```
pub struct GraphBlockExtractor<'a> {
    user_id: &'a str,
    own_images: &'a [ImageRef],
    author_id: Option<&'a str>,
    cache: &'a SharedImageCache,
    lookup: &'a dyn ImageLookup,
}

impl<'a> GraphBlockExtractor<'a> {
    /// Create an extractor for `user_id` with their own images.
    #[must_use]
    pub fn new(
        user_id: &'a str,
        own_images: &'a [ImageRef],
        cache: &'a SharedImageCache,
        lookup: &'a dyn ImageLookup,
    ) -> Self {
        Self {
            user_id,
            own_images,
            author_id: None,
            cache,
            lookup,
        }
    }

    /// Set the author of the documents being extracted.
    ///
    /// Images missing from the user's own collection are then searched in the
    /// author's scope.
    #[must_use]
    pub fn with_author(mut self, author_id: Option<&'a str>) -> Self {
        self.author_id = author_id;
        self
    }

    /// Extract every graph block from `content`.
    #[must_use]
    pub fn extract<'c>(&self, content: &'c str) -> ExtractResult<'c> {
        let mut resolver = ImageResolver::new(self.user_id, self.own_images, self.cache, self.lookup)
            .with_author(self.author_id);

        let mut blocks = Vec::new();
        let mut body = String::new();
        let mut last_end = 0;

        for caps in BLOCK_RE.captures_iter(content) {
            let (Some(full), Some(interior)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            blocks.push(parse_block(interior.as_str(), &mut resolver));
            body.push_str(&content[last_end..full.start()]);
            body.push_str(PLACEHOLDER);
            last_end = full.end();
        }

        if blocks.is_empty() {
            return ExtractResult {
                body: Cow::Borrowed(content),
                blocks,
            };
        }

        body.push_str(&content[last_end..]);
        tracing::debug!(blocks = blocks.len(), "Extracted graph blocks");

        ExtractResult {
            body: Cow::Owned(body),
            blocks,
        }
    }
}

/// Extract graph blocks from `content` in a single call.
///
/// Shorthand for [`GraphBlockExtractor::new`] followed by
/// [`with_author`](GraphBlockExtractor::with_author) and
/// [`extract`](GraphBlockExtractor::extract).
#[must_use]
pub fn extract_graph_blocks<'c>(
    content: &'c str,
    user_id: &str,
    own_images: &[ImageRef],
    cache: &SharedImageCache,
    author_id: Option<&str>,
    lookup: &dyn ImageLookup,
) -> ExtractResult<'c> {
    GraphBlockExtractor::new(user_id, own_images, cache, lookup)
        .with_author(author_id)
        .extract(content)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lookup::NullImageLookup;
    use crate::mock::MockImageLookup;
    use crate::model::UNKNOWN_SRC;

    fn extract(content: &str) -> ExtractResult<'_> {
        let cache = SharedImageCache::new();
        extract_graph_blocks(content, "u1", &[], &cache, None, &NullImageLookup)
    }

    #[test]
    fn test_no_blocks_passthrough() {
        let content = "# Notes\n\nNothing to see, only $$ and $ signs.\n";
        let result = extract(content);

        assert!(matches!(result.body, Cow::Borrowed(_)));
        assert_eq!(result.body, content);
        assert!(result.blocks.is_empty());
    }

    #[test]
    fn test_single_marker_is_not_a_block() {
        let content = "price: $$$ unmatched";
        let result = extract(content);

        assert_eq!(result.body, content);
        assert!(result.blocks.is_empty());
    }

    #[test]
    fn test_block_replaced_with_placeholder() {
        let result = extract("Before\n\n$$$\n[Tab]\n(G)\n\"T\" {t.png}\n$$$\n\nAfter\n");

        assert_eq!(result.body, "Before\n\n!!GraphBlock!!\n\nAfter\n");
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0][0].name, "Tab");
    }

    #[test]
    fn test_non_greedy_matching() {
        let result = extract("$$$\n[A]\n$$$\ntext between\n$$$\n[B]\n$$$");

        assert_eq!(result.body, "!!GraphBlock!!\ntext between\n!!GraphBlock!!");
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.blocks[0][0].name, "A");
        assert_eq!(result.blocks[1][0].name, "B");
    }

    #[test]
    fn test_placeholder_count_matches_blocks() {
        let inputs = [
            "",
            "no blocks",
            "$$$$$$",
            "$$$[A]$$$ $$$[B]$$$ $$$[C]$$$",
            "$$$\n(orphan)\n$$$ trailing $$$",
        ];
        for input in inputs {
            let result = extract(input);
            assert_eq!(result.placeholder_count(), result.blocks.len(), "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_block_still_replaced() {
        let result = extract("a $$$$$$ b");

        assert_eq!(result.body, "a !!GraphBlock!! b");
        assert_eq!(result.blocks, vec![Vec::<TabGroup>::new()]);
    }

    #[test]
    fn test_identical_blocks_each_replaced_in_order() {
        let block = "$$$\n[Same]\n$$$";
        let content = format!("{block}\nmiddle\n{block}");
        let result = extract(&content);

        assert_eq!(result.body, "!!GraphBlock!!\nmiddle\n!!GraphBlock!!");
        assert_eq!(result.blocks.len(), 2);
    }

    #[test]
    fn test_tabs_with_same_name_across_blocks_are_not_merged() {
        let result = extract("$$$\n[Tab]\n(A)\n$$$\n$$$\n[Tab]\n(B)\n$$$");

        assert_eq!(result.blocks[0].len(), 1);
        assert_eq!(result.blocks[0][0].groups[0].name, "A");
        assert_eq!(result.blocks[1].len(), 1);
        assert_eq!(result.blocks[1][0].groups[0].name, "B");
    }

    #[test]
    fn test_multibyte_content_preserved() {
        let content = "会議メモ 📈\n$$$\n[概要]\n$$$\n終わり";
        let result = extract(content);

        assert_eq!(result.body, "会議メモ 📈\n!!GraphBlock!!\n終わり");
        assert_eq!(result.blocks[0][0].name, "概要");
    }

    #[test]
    fn test_own_image_resolution() {
        let own = vec![ImageRef::new("1", "u1/q1.png", "https://x/q1")];
        let cache = SharedImageCache::new();
        let lookup = MockImageLookup::new();

        let result = extract_graph_blocks(
            "$$$\n[T]\n(G)\n\"Q1\" {q1.png}\n$$$",
            "u1",
            &own,
            &cache,
            Some("bob"),
            &lookup,
        );

        assert_eq!(result.blocks[0][0].groups[0].graphs[0].src, "https://x/q1");
        assert_eq!(lookup.request_count(), 0);
    }

    #[test]
    fn test_fallback_to_unknown() {
        let cache = SharedImageCache::new();
        let lookup = MockImageLookup::new();

        let result = extract_graph_blocks(
            "$$$\n[T]\n(G)\n\"Missing\" {missing.png}\n$$$",
            "u1",
            &[],
            &cache,
            Some("bob"),
            &lookup,
        );

        assert_eq!(result.blocks[0][0].groups[0].graphs[0].src, UNKNOWN_SRC);
        assert_eq!(result.unknown_graph_count(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_growth_across_extractions() {
        let cache = SharedImageCache::new();
        let lookup =
            MockImageLookup::new().with_image(ImageRef::new("9", "bob/a.png", "https://x/a"));
        let extractor =
            GraphBlockExtractor::new("u1", &[], &cache, &lookup).with_author(Some("bob"));
        let doc = "$$$\n[T]\n(G)\n\"A\" {a.png}\n$$$";

        let first = extractor.extract(doc);
        let second = extractor.extract(doc);

        assert_eq!(first.blocks[0][0].groups[0].graphs[0].src, "https://x/a");
        assert_eq!(second.blocks[0][0].groups[0].graphs[0].src, "https://x/a");
        assert_eq!(lookup.request_count(), 1);
        assert_eq!(cache.snapshot(), vec![ImageRef::new("9", "bob/a.png", "https://x/a")]);
    }

    #[test]
    fn test_miss_not_retried_within_one_extraction() {
        let cache = SharedImageCache::new();
        let lookup = MockImageLookup::new();
        let extractor =
            GraphBlockExtractor::new("u1", &[], &cache, &lookup).with_author(Some("bob"));

        let _ = extractor.extract("$$$\n[T]\n(G)\n\"A\" {x.png}\n$$$\n$$$\n[U]\n(H)\n\"B\" {x.png}\n$$$");
        assert_eq!(lookup.request_count(), 1);

        // A new extraction is a new pass and may try again.
        let _ = extractor.extract("$$$\n[T]\n(G)\n\"A\" {x.png}\n$$$");
        assert_eq!(lookup.request_count(), 2);
    }

    #[test]
    fn test_into_owned_keeps_content() {
        let owned = {
            let content = String::from("x $$$[T]$$$ y");
            extract(&content).into_owned()
        };
        assert_eq!(owned.body, "x !!GraphBlock!! y");
        assert_eq!(owned.blocks.len(), 1);
    }

    #[test]
    fn test_serialize_result() {
        let result = extract("$$$\n[T]\n(G)\n\"A\" {a.png}\n$$$");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["body"], "!!GraphBlock!!");
        assert_eq!(json["blocks"][0][0]["name"], "T");
        assert_eq!(json["blocks"][0][0]["groups"][0]["graphs"][0]["src"], "unknown");
    }
}
