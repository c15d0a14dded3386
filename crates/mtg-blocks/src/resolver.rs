//! Image name resolution.

use std::collections::HashSet;

use crate::cache::SharedImageCache;
use crate::image::{ImageRef, image_path};
use crate::lookup::ImageLookup;
use crate::model::UNKNOWN_SRC;

/// Resolves bare image names to URLs for one extraction pass.
///
/// Resolution order, first hit wins:
///
/// 1. `{user_id}/{name}` among the caller's own images
/// 2. `{author_id}/{name}` in the shared cache (only with an author)
/// 3. `{author_id}/{name}` through the [`ImageLookup`] (only with an author);
///    a hit is prepended to the shared cache
/// 4. [`UNKNOWN_SRC`]
///
/// A path the lookup failed to find is not requested again by the same
/// resolver.
pub struct ImageResolver<'a> {
    user_id: &'a str,
    own_images: &'a [ImageRef],
    author_id: Option<&'a str>,
    cache: &'a SharedImageCache,
    lookup: &'a dyn ImageLookup,
    misses: HashSet<String>,
}

impl<'a> ImageResolver<'a> {
    /// Create a resolver for the current user.
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
            misses: HashSet::new(),
        }
    }

    /// Set the author of the document being rendered.
    ///
    /// Without an author only the caller's own images are searched.
    #[must_use]
    pub fn with_author(mut self, author_id: Option<&'a str>) -> Self {
        self.author_id = author_id;
        self
    }

    /// Resolve `name` to an image URL, or [`UNKNOWN_SRC`].
    pub fn resolve(&mut self, name: &str) -> String {
        self.find_image(name)
            .map_or_else(|| UNKNOWN_SRC.to_owned(), |image| image.url)
    }

    fn find_image(&mut self, name: &str) -> Option<ImageRef> {
        let own_path = image_path(self.user_id, name);
        if let Some(image) = self.own_images.iter().find(|img| img.path == own_path) {
            return Some(image.clone());
        }

        let author_id = self.author_id?;
        let author_path = image_path(author_id, name);

        if let Some(image) = self.cache.find(&author_path) {
            tracing::debug!(path = %author_path, "Shared cache hit");
            return Some(image);
        }

        if self.misses.contains(&author_path) {
            return None;
        }

        if let Some(image) = self.lookup.fetch_image_by_path(&author_path) {
            self.cache.prepend(image.clone());
            return Some(image);
        }

        tracing::debug!(path = %author_path, "Image not found");
        self.misses.insert(author_path);
        None
    }
}
