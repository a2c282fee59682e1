use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest image the upload form and endpoint accept.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Smallest part S3 accepts for any part but the last.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Snapshot of an upload in flight.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        self.bytes_sent as f64 / self.total_bytes as f64
    }
}

/// A part the blob store has acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedChunk {
    pub part_number: i32,
    pub etag: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadOptions {
    pub part_size: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            part_size: MIN_PART_SIZE,
        }
    }
}

/// What the upload endpoint hands back to the admin editor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub path: String,
    pub url: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Accept only `image/*` content of at most `MAX_IMAGE_BYTES`.
pub fn check_image(content_type: &str, size: u64) -> Result<(), ValidationError> {
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(ValidationError::new("image", "Please select an image file"));
    }
    if size == 0 {
        return Err(ValidationError::new("image", "Please select an image"));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::new("image", "Image size should be less than 5MB"));
    }
    Ok(())
}
