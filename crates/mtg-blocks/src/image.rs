//! Image references as returned by the document service.

use serde::{Deserialize, Serialize};

/// An uploaded image.
///
/// `path` is always `<ownerId>/<name>`; `url` is a (typically signed,
/// time-limited) download URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image identifier.
    pub id: String,
    /// Storage path, `<ownerId>/<name>`.
    pub path: String,
    /// Download URL.
    pub url: String,
}

impl ImageRef {
    /// Create an image reference.
    #[must_use]
    pub fn new(id: impl Into<String>, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            url: url.into(),
        }
    }

    /// Image name without the owner prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        image_name(&self.path)
    }
}

/// Build the storage path of image `name` owned by `owner`.
///
/// # Examples
///
/// ```
/// assert_eq!(mtg_blocks::image_path("u1", "q1.png"), "u1/q1.png");
/// ```
#[must_use]
pub fn image_path(owner: &str, name: &str) -> String {
    format!("{owner}/{name}")
}

/// Strip the owner segment from a storage path.
///
/// Everything after the first `/` is the name, so names may themselves
/// contain slashes. A path without `/` has an empty name.
///
/// # Examples
///
/// ```
/// use mtg_blocks::image_name;
///
/// assert_eq!(image_name("u1/q1.png"), "q1.png");
/// assert_eq!(image_name("u1/charts/q1.png"), "charts/q1.png");
/// assert_eq!(image_name("orphan"), "");
/// ```
#[must_use]
pub fn image_name(path: &str) -> &str {
    path.split_once('/').map_or("", |(_, name)| name)
}
