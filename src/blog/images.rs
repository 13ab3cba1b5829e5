//! Image publishing through the repository contents API.
//!
//! Uploads are validated, recompressed to a compact format, and committed
//! to the content repository under a dated, collision-resistant path. The
//! public URL points at the raw-content host for the configured branch.

use std::io::Cursor;

use base64::Engine;
use chrono::Utc;
use image::ImageOutputFormat;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Error;

use super::BlogService;

/// Uploads larger than this are rejected before any processing.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Quality setting for the lossy re-encode.
const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, Serialize)]
pub struct PublishedImage {
    pub url: String,
    pub path: String,
    pub sha: String,
}

impl BlogService {
    /// Validate, recompress, and publish an image, returning its public
    /// URL. Size and MIME checks run before any decoding or network call.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for oversized, non-image, or
    /// undecodable content; `Error::Permission` when the token cannot
    /// write to the repository.
    pub async fn publish_image(
        &self,
        bytes: &[u8],
        content_type: &str,
        file_name: &str,
    ) -> Result<PublishedImage, Error> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::Validation(format!(
                "File size exceeds {}",
                format_file_size(MAX_IMAGE_BYTES)
            )));
        }
        if !content_type.starts_with("image/") {
            return Err(Error::Validation(
                "Only image files are allowed".to_string(),
            ));
        }

        debug!(
            file = file_name,
            size = bytes.len(),
            content_type,
            "processing image"
        );

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::Validation(format!("Unsupported or corrupt image: {e}")))?;
        let mut compressed = Cursor::new(Vec::new());
        decoded
            .write_to(&mut compressed, ImageOutputFormat::Jpeg(JPEG_QUALITY))
            .map_err(|e| Error::Validation(format!("Failed to re-encode image: {e}")))?;
        let compressed = compressed.into_inner();

        let encoded = base64::engine::general_purpose::STANDARD.encode(&compressed);
        let path = generate_image_path();
        let message = format!("Upload image: {file_name}");

        let written = self.client.put_content(&path, &encoded, &message).await?;
        let url = self.client.raw_content_url(&path);

        info!(path = %path, size = compressed.len(), "image published");

        Ok(PublishedImage {
            url,
            path,
            sha: written.content.sha,
        })
    }
}

/// Dated path with a millisecond timestamp and random suffix so concurrent
/// uploads cannot collide.
fn generate_image_path() -> String {
    let now = Utc::now();
    let mut rng = rand::thread_rng();
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let suffix: String = (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!(
        "images/{}/{}-{suffix}.jpg",
        now.format("%Y/%m/%d"),
        now.timestamp_millis()
    )
}

fn format_file_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} Bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_image_path_shape() {
        let re = regex::Regex::new(r"^images/\d{4}/\d{2}/\d{2}/\d+-[a-z0-9]{6}\.jpg$").unwrap();
        for _ in 0..16 {
            let path = generate_image_path();
            assert!(re.is_match(&path), "unexpected path: {path}");
        }
    }

    #[test]
    fn test_generate_image_path_is_collision_resistant() {
        let a = generate_image_path();
        let b = generate_image_path();
        // Same millisecond is possible; the random suffix still separates them.
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(2048), "2 KB");
        assert_eq!(format_file_size(100), "100 Bytes");
    }
}
