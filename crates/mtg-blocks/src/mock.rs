//! Mock image lookup for testing.
//!
//! Provides [`MockImageLookup`] for exercising the resolver without a network.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::image::ImageRef;
use crate::lookup::ImageLookup;

/// In-memory [`ImageLookup`] that records every requested path.
///
/// # Example
///
/// ```ignore
/// use mtg_blocks::{ImageLookup, ImageRef, MockImageLookup};
///
/// let lookup = MockImageLookup::new()
///     .with_image(ImageRef::new("1", "bob/a.png", "https://x/a"));
///
/// assert!(lookup.fetch_image_by_path("bob/a.png").is_some());
/// assert_eq!(lookup.requests(), vec!["bob/a.png".to_owned()]);
/// ```
#[derive(Debug, Default)]
pub struct MockImageLookup {
    images: HashMap<String, ImageRef>,
    requests: RwLock<Vec<String>>,
}

impl MockImageLookup {
    /// Create a lookup that knows no images.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `image` available under its path.
    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.images.insert(image.path.clone(), image);
        self
    }

    /// Paths requested so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }

    /// Number of lookups performed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

impl ImageLookup for MockImageLookup {
    fn fetch_image_by_path(&self, path: &str) -> Option<ImageRef> {
        self.requests.write().unwrap().push(path.to_owned());
        self.images.get(path).cloned()
    }
}
