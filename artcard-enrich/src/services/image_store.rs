//! Artist portrait downloads
//!
//! Portraits live in one folder as `<sanitized>.<ext>`. Cards reference them
//! through a vault-relative link (`<prefix>/<file>`), so the returned value is
//! the link, not the filesystem path.

use crate::error::{EnrichError, EnrichResult};
use artcard_common::naming::sanitize_filename;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const KNOWN_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// File extension for an image content type (jpg when unknown)
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let content_type = content_type.to_lowercase();
    if content_type.contains("png") {
        "png"
    } else if content_type.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}

pub struct ImageStore {
    http_client: reqwest::Client,
    images_dir: PathBuf,
    link_prefix: String,
    dry_run: bool,
}

impl ImageStore {
    pub fn new(images_dir: PathBuf, link_prefix: String, dry_run: bool) -> EnrichResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            images_dir,
            link_prefix: link_prefix.trim_end_matches('/').to_string(),
            dry_run,
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    fn link(&self, file_name: &str) -> String {
        if self.link_prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.link_prefix, file_name)
        }
    }

    /// File name of an already-downloaded portrait for `artist`
    pub fn existing_image(&self, artist: &str) -> Option<String> {
        let stem = sanitize_filename(artist);
        KNOWN_EXTENSIONS
            .iter()
            .map(|ext| format!("{}.{}", stem, ext))
            .find(|file_name| self.images_dir.join(file_name).is_file())
    }

    /// Vault link to the artist's portrait, downloading it when missing
    ///
    /// Dry runs never touch the network or the disk and report the link the
    /// download would have produced.
    pub async fn ensure_portrait(&self, artist: &str, image_url: &str) -> EnrichResult<String> {
        if let Some(file_name) = self.existing_image(artist) {
            info!(image = %file_name, "Image already exists");
            return Ok(self.link(&file_name));
        }

        let stem = sanitize_filename(artist);
        if self.dry_run {
            info!(artist = %artist, "[DRY RUN] Would download image");
            return Ok(self.link(&format!("{}.jpg", stem)));
        }

        let response = self.http_client.get(image_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Api(
                status.as_u16(),
                format!("image download failed: {}", image_url),
            ));
        }

        let extension = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(extension_for_content_type)
            .unwrap_or("jpg");
        let bytes = response.bytes().await?;

        std::fs::create_dir_all(&self.images_dir)?;
        let file_name = format!("{}.{}", stem, extension);
        let path = self.images_dir.join(&file_name);
        std::fs::write(&path, &bytes)?;

        info!(path = %path.display(), bytes = bytes.len(), "Downloaded image");
        Ok(self.link(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type("image/PNG"), "png");
        assert_eq!(extension_for_content_type("image/webp"), "webp");
        assert_eq!(extension_for_content_type("application/octet-stream"), "jpg");
    }

    #[tokio::test]
    async fn test_existing_image_is_reused_without_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dr_john.png"), b"png").unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), "Portraits/".to_string(), false).unwrap();

        let link = store
            .ensure_portrait("Dr. John", "http://unreachable.invalid/x.png")
            .await
            .unwrap();
        assert_eq!(link, "Portraits/dr_john.png");
    }

    #[tokio::test]
    async fn test_dry_run_reports_link_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), "Portraits".to_string(), true).unwrap();

        let link = store
            .ensure_portrait("Professor Longhair", "http://unreachable.invalid/x.jpg")
            .await
            .unwrap();
        assert_eq!(link, "Portraits/professor_longhair.jpg");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
