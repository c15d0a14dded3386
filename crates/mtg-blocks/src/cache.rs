//! Session-scoped image cache.

use std::collections::VecDeque;
use std::sync::RwLock;

use crate::image::ImageRef;

/// Append-only cache of images fetched on behalf of other authors.
///
/// The cache lives as long as the session that owns it and is shared by
/// reference between extractions. Entries are inserted at the front
/// (newest first) and are never evicted or deduplicated.
///
/// # Example
///
/// ```
/// use mtg_blocks::{ImageRef, SharedImageCache};
///
/// let cache = SharedImageCache::new();
/// cache.prepend(ImageRef::new("1", "bob/a.png", "https://x/a"));
/// cache.prepend(ImageRef::new("2", "bob/b.png", "https://x/b"));
///
/// assert_eq!(cache.len(), 2);
/// assert_eq!(cache.snapshot()[0].path, "bob/b.png");
/// assert_eq!(cache.find("bob/a.png").unwrap().url, "https://x/a");
/// ```
#[derive(Debug, Default)]
pub struct SharedImageCache {
    entries: RwLock<VecDeque<ImageRef>>,
}

impl SharedImageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the first (newest) entry whose path equals `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<ImageRef> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|img| img.path == path)
            .cloned()
    }

    /// Insert `image` at the front of the cache.
    ///
    /// This is the only mutation the cache supports.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn prepend(&self, image: ImageRef) {
        tracing::debug!(path = %image.path, "Caching fetched image");
        self.entries.write().unwrap().push_front(image);
    }

    /// Number of cached entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries, newest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ImageRef> {
        self.entries.read().unwrap().iter().cloned().collect()
    }
}
