//! Color extraction layer.
//!
//! This module turns image bytes into a single representative color and
//! memoizes the result through the [`ColorStore`](crate::store::ColorStore).
//!
//! # Components
//!
//! - [`ColorService`]: Main entry point, runs the cache-aside pipeline
//! - [`decode_image`]: Bytes to pixel grid, format detected from content
//! - [`reduce`]: Pixel grid to one [`ColorValue`]
//!
//! # Example
//!
//! ```
//! use img2color::color::{reduce, ColorValue};
//! use image::{DynamicImage, Rgb, RgbImage};
//!
//! let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
//! assert_eq!(reduce(&img), ColorValue::new(255, 0, 0));
//! assert_eq!(reduce(&img).to_hex(), "#ff0000");
//! ```

mod decoder;
mod reducer;
mod service;

pub use decoder::decode_image;
pub use reducer::{
    reduce, reduced_height, ColorValue, ParseColorError, MAX_REDUCED_HEIGHT, REDUCED_WIDTH,
};
pub use service::{ColorResponse, ColorService};
