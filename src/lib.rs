//! # gifmill
//!
//! A 100% Rust encoder for static and animated GIF files.
//!
//! ## Features
//!
//! - **Quantization**: Three interchangeable strategies (median cut, k-means,
//!   uniform) for reducing a frame to the 256 colors GIF allows
//! - **Dithering**: Floyd-Steinberg error diffusion onto the quantized palette
//! - **Compression**: GIF-variant LZW with variable code widths
//!
//! ## Quick Start
//!
//! ### Encoding an animated GIF
//!
//! ```ignore
//! use gifmill::{GifEncoder, Image, ImageOptions};
//!
//! // 0xRRGGBB pixel data, row-major
//! let frame = Image::from_rgb(&[0xFF0000, 0xFF0000, 0x00FF00, 0x0000FF], 2)?;
//!
//! let mut options = ImageOptions::default();
//! options.delay_centiseconds = 10;
//!
//! let mut encoder = GifEncoder::new(Vec::new(), 2, 2, 0)?;
//! encoder.add_image(&frame, &options)?;
//! let gif_bytes = encoder.finish()?;
//! ```

use thiserror::Error;

pub mod color;
pub mod color_table;
pub mod dither;
pub mod encoder;
pub mod image;
pub mod lzw;
pub mod quant;

pub use color::{Color, ColorHistogram};
pub use color_table::ColorTable;
pub use dither::Ditherer;
pub use encoder::{DisposalMethod, GifEncoder, ImageOptions};
pub use image::Image;
pub use lzw::LzwEncoder;
pub use quant::Quantizer;

/// Errors that can occur while building a GIF stream.
#[derive(Debug, Error)]
pub enum GifError {
    /// Invalid image dimensions (width or height is zero)
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Rows of a pixel grid have unequal lengths
    #[error("row lengths do not match in pixel grid")]
    RaggedRows,

    /// A flat pixel buffer is not a whole number of rows
    #[error("width {width} does not divide the pixel count {pixels}")]
    WidthMismatch { width: usize, pixels: usize },

    /// A frame placed at its offset does not fit the logical screen
    #[error("image of {width}x{height} at ({left}, {top}) does not fit the {screen_width}x{screen_height} screen")]
    ImageOutOfBounds {
        left: u16,
        top: u16,
        width: usize,
        height: usize,
        screen_width: u16,
        screen_height: u16,
    },

    /// LZW color table size must be a power of two, at least 2
    #[error("invalid color table size: {0} (must be a power of two, at least 2)")]
    InvalidColorTableSize(usize),

    /// A palette index fed to the LZW encoder exceeds the color table
    #[error("palette index {index} out of range for color table of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Writing to the output sink failed
    #[error("failed to write GIF stream")]
    Io(#[from] std::io::Error),
}

/// Result type for GIF operations.
pub type Result<T> = core::result::Result<T, GifError>;

/// The most colors a single GIF color table can hold.
pub const MAX_COLOR_COUNT: usize = 256;
