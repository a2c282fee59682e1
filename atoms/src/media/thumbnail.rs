use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;

use crate::error::UploadError;

/// Longest edge of a rendered thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 480;

/// Decode `bytes` and re-encode a JPEG no larger than `max_edge` on either side.
/// Images already small enough are re-encoded at their own size.
pub fn render_thumbnail(bytes: &[u8], max_edge: u32) -> Result<Vec<u8>, UploadError> {
    let source = image::load_from_memory(bytes)
        .map_err(|e| UploadError::Rejected(format!("not a decodable image: {}", e)))?;

    let scaled = if source.width() > max_edge || source.height() > max_edge {
        source.thumbnail(max_edge, max_edge)
    } else {
        source
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());

    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Jpeg(82))
        .map_err(|e| UploadError::Backend(format!("thumbnail encoding failed: {}", e)))?;

    Ok(out)
}
