//! URLs for images served from the backend's static storage prefix.

use crate::types::PropertyImage;

#[derive(Debug, Clone)]
pub struct AssetUrls {
    storage_base: String,
}

impl AssetUrls {
    pub fn new(storage_base: &str) -> Self {
        Self {
            storage_base: storage_base.trim_end_matches('/').to_string(),
        }
    }

    /// `None` when the backend has no stored path for the image.
    pub fn image_url(&self, image: &PropertyImage) -> Option<String> {
        image
            .image_path
            .as_deref()
            .map(|path| format!("{}/{}", self.storage_base, path.trim_start_matches('/')))
    }
}
