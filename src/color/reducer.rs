//! Dominant color reduction.
//!
//! # Algorithm
//!
//! 1. Convert to 16-bit RGB (alpha is dropped)
//! 2. Resize to [`REDUCED_WIDTH`] pixels wide, keeping the aspect ratio up to
//!    [`MAX_REDUCED_HEIGHT`] rows, with a Lanczos3 filter
//! 3. Sum each channel over every pixel in `u64` and divide once by the pixel
//!    count
//! 4. Normalize the 0-65535 averages to 0.0-1.0 and round to 8 bits

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Width of the grid the image is resampled to before averaging.
pub const REDUCED_WIDTH: u32 = 50;

/// Upper bound on the height of the reduced grid.
///
/// Very tall, thin images are squashed rather than stretched past this.
pub const MAX_REDUCED_HEIGHT: u32 = 1000;

// =============================================================================
// Color Value
// =============================================================================

/// An 8-bit-per-channel RGB color, written as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorValue {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from channels normalized to `0.0..=1.0`.
    ///
    /// Out-of-range inputs are clamped.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        fn channel(v: f64) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        }
        Self::new(channel(r), channel(g), channel(b))
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error parsing a `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct ParseColorError(String);

impl FromStr for ColorValue {
    type Err = ParseColorError;

    /// Parse `#rrggbb` (either case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseColorError(s.to_string());

        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Reduction
// =============================================================================

/// Height of the reduced grid for a source of `width` x `height`.
///
/// Always at least 1 so that very wide images still produce pixels, and at
/// most [`MAX_REDUCED_HEIGHT`].
pub fn reduced_height(width: u32, height: u32) -> u32 {
    let scaled = (u64::from(height) * u64::from(REDUCED_WIDTH) + u64::from(width) / 2)
        / u64::from(width.max(1));
    scaled.clamp(1, u64::from(MAX_REDUCED_HEIGHT)) as u32
}

/// Compute the representative color of an image.
///
/// Deterministic and pure. The caller must pass a non-empty image; the
/// decoder guarantees this for anything it returns.
pub fn reduce(img: &DynamicImage) -> ColorValue {
    let rgb16 = DynamicImage::ImageRgb16(img.to_rgb16());
    let height = reduced_height(img.width(), img.height());
    let small = rgb16
        .resize_exact(REDUCED_WIDTH, height, FilterType::Lanczos3)
        .into_rgb16();

    let mut sums = [0u64; 3];
    for pixel in small.pixels() {
        for (sum, &value) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += u64::from(value);
        }
    }

    let count = (u64::from(small.width()) * u64::from(small.height())).max(1) as f64;
    let unit = |sum: u64| sum as f64 / count / f64::from(u16::MAX);

    ColorValue::from_unit(unit(sums[0]), unit(sums[1]), unit(sums[2]))
}
