//! Image acquisition for listings.
//!
//! Downloads listing photos into a per-property folder under the images
//! root and records store-relative paths. Map tiles are recognized by URL
//! and never fetched. A failed URL is logged and skipped; only filesystem
//! errors on the property folder abort the whole listing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

/// Marker that identifies divar map-tile renders among the image URLs.
pub const MAP_IMAGE_MARKER: &str = "api.divar.ir/v8/mapimage";

/// Whether a URL points at a map-tile render rather than a photo.
pub fn is_map_image(url: &str) -> bool {
    url.contains(MAP_IMAGE_MARKER)
}

/// Derive a stored filename for the nth image of a property.
///
/// Keeps the source extension when the URL path has one, otherwise falls
/// back to `.jpg`.
pub fn image_filename(url: &str, index: usize) -> String {
    let extension = url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            Path::new(parsed.path())
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
        })
        .unwrap_or_else(|| ".jpg".to_string());

    format!("img_{}{}", index + 1, extension)
}

/// Filesystem store for listing images.
pub struct ImageStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl ImageStore {
    /// Create a store rooted at `root` with a per-request timeout.
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            root: root.into(),
            client,
        }
    }

    /// The images root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Download every photo URL into `property_<key>/` under the root.
    ///
    /// Map-tile URLs are skipped without a request. Returns the relative
    /// paths (`images/property_<key>/img_<n>.<ext>`) of the files that were
    /// actually written, in source order.
    pub async fn download_all(&self, urls: &[String], key: &str) -> std::io::Result<Vec<String>> {
        let photos: Vec<&String> = urls.iter().filter(|u| !is_map_image(u)).collect();
        if photos.is_empty() {
            return Ok(Vec::new());
        }

        let folder = format!("property_{}", key);
        let folder_path = self.root.join(&folder);
        tokio::fs::create_dir_all(&folder_path).await?;

        let mut saved = Vec::with_capacity(photos.len());
        for (index, url) in photos.iter().enumerate() {
            let filename = image_filename(url, index);
            match self.fetch_one(url).await {
                Ok(content) => {
                    let path = folder_path.join(&filename);
                    if let Err(e) = tokio::fs::write(&path, &content).await {
                        warn!("Failed to write {}: {}", path.display(), e);
                        continue;
                    }
                    debug!("Saved {} ({} bytes)", filename, content.len());
                    saved.push(format!("images/{}/{}", folder, filename));
                }
                Err(e) => {
                    warn!("Failed to download image {}: {}", url, e);
                }
            }
        }

        Ok(saved)
    }

    async fn fetch_one(&self, url: &str) -> reqwest::Result<Vec<u8>> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_map_image_detection() {
        assert!(is_map_image(
            "https://api.divar.ir/v8/mapimage?lat=35.7&lng=51.4"
        ));
        assert!(!is_map_image("https://s100.divarcdn.com/static/photo/1.jpg"));
    }

    #[test]
    fn test_image_filename_keeps_extension() {
        assert_eq!(
            image_filename("https://s100.divarcdn.com/static/photo/abc.webp", 0),
            "img_1.webp"
        );
        assert_eq!(
            image_filename("https://s100.divarcdn.com/static/photo/abc.jpg?w=80", 2),
            "img_3.jpg"
        );
    }

    #[test]
    fn test_image_filename_defaults_to_jpg() {
        assert_eq!(
            image_filename("https://s100.divarcdn.com/static/photo/abc", 0),
            "img_1.jpg"
        );
        assert_eq!(image_filename("not a url", 4), "img_5.jpg");
    }

    #[tokio::test]
    async fn test_download_all_skips_map_urls_without_folder() {
        let dir = tempdir().unwrap();
        let store = ImageStore::new(dir.path(), Duration::from_secs(1));

        let urls = vec!["https://api.divar.ir/v8/mapimage?lat=1&lng=2".to_string()];
        let saved = store.download_all(&urls, "123_0").await.unwrap();

        assert!(saved.is_empty());
        // No property folder should exist when nothing was downloadable.
        assert!(!dir.path().join("property_123_0").exists());
    }

    #[tokio::test]
    async fn test_download_all_empty_input() {
        let dir = tempdir().unwrap();
        let store = ImageStore::new(dir.path(), Duration::from_secs(1));

        let saved = store.download_all(&[], "123_0").await.unwrap();
        assert!(saved.is_empty());
    }

    #[tokio::test]
    async fn test_download_all_fails_when_root_is_a_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("images");
        std::fs::write(&root, b"not a directory").unwrap();

        let store = ImageStore::new(&root, Duration::from_secs(1));
        let urls = vec!["https://s100.divarcdn.com/static/photo/a.jpg".to_string()];
        assert!(store.download_all(&urls, "123_0").await.is_err());
    }
}
