//! Fallback image lookup.

use crate::image::ImageRef;

/// Fetch an image by its storage path from an external service.
///
/// Called only when an image is neither among the caller's own images nor in
/// the [`SharedImageCache`](crate::SharedImageCache). Implementations must
/// normalize every failure (network, authorization, decoding) to `None`;
/// the resolver treats `None` as "not found".
pub trait ImageLookup: Send + Sync {
    /// Look up the image stored at `path` (`<ownerId>/<name>`).
    fn fetch_image_by_path(&self, path: &str) -> Option<ImageRef>;
}

/// [`ImageLookup`] that never finds anything.
///
/// Used when running offline.
pub struct NullImageLookup;

impl ImageLookup for NullImageLookup {
    fn fetch_image_by_path(&self, _path: &str) -> Option<ImageRef> {
        None
    }
}
