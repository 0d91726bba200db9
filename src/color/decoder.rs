//! Image decoding.
//!
//! The container format is detected from the leading bytes of the payload,
//! never from a declared content type. Input is an in-memory buffer read
//! through a [`Cursor`], which gives the decoder the `BufRead + Seek` access
//! some formats need.

use std::io::Cursor;

use image::{DynamicImage, ImageError, ImageReader};

use crate::error::DecodeError;

/// Decode an image, detecting its format from content.
///
/// # Errors
///
/// - [`DecodeError::UnsupportedFormat`] if the content matches no enabled format
/// - [`DecodeError::Corrupt`] if the format is known but decoding fails
/// - [`DecodeError::EmptyImage`] if the image has zero width or height
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::UnsupportedFormat(
            "unrecognized image content".to_string(),
        ));
    }

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => DecodeError::UnsupportedFormat(e.to_string()),
        other => DecodeError::Corrupt(other.to_string()),
    })?;

    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::EmptyImage {
            width: img.width(),
            height: img.height(),
        });
    }

    Ok(img)
}
