//! Immutable pixel grids.

use crate::color::{Color, ColorHistogram};
use crate::{GifError, Result};

/// An immutable grid of pixels, stored row-major.
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Image {
    /// Builds an image from a row-major pixel buffer.
    pub fn from_pixels(width: usize, pixels: Vec<Color>) -> Result<Self> {
        if width == 0 || pixels.is_empty() {
            return Err(GifError::InvalidDimensions {
                width,
                height: if width == 0 { 0 } else { pixels.len() / width },
            });
        }
        if pixels.len() % width != 0 {
            return Err(GifError::WidthMismatch {
                width,
                pixels: pixels.len(),
            });
        }
        let height = pixels.len() / width;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image from a flat buffer of packed `0xRRGGBB` pixels.
    pub fn from_rgb(rgb: &[u32], width: usize) -> Result<Self> {
        Self::from_pixels(width, rgb.iter().map(|&p| Color::from_rgb(p)).collect())
    }

    /// Builds an image from rows of packed `0xRRGGBB` pixels. All rows must
    /// have the same length.
    pub fn from_rgb_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(GifError::InvalidDimensions {
                width: 0,
                height: 0,
            });
        };
        let width = first.len();
        let mut pixels = Vec::with_capacity(width * rows.len());
        for row in rows {
            if row.len() != width {
                return Err(GifError::RaggedRows);
            }
            pixels.extend(row.iter().map(|&p| Color::from_rgb(p)));
        }
        Self::from_pixels(width, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Color at coordinates `(x, y)`.
    pub fn color_at(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    /// Color at a row-major flat index.
    pub fn color_at_index(&self, index: usize) -> Color {
        self.pixels[index]
    }

    pub(crate) fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Counts every pixel into a weighted color histogram, in row-major
    /// first-seen order.
    pub fn color_histogram(&self) -> ColorHistogram {
        let mut histogram = ColorHistogram::new();
        for &pixel in &self.pixels {
            histogram.add(pixel);
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_rgb_shapes_pixels_row_major() {
        let image = Image::from_rgb(&[0xFF0000, 0x00FF00, 0x0000FF, 0xFFFFFF], 2).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        assert_eq!(image.color_at(0, 0), Color::RED);
        assert_eq!(image.color_at(1, 0), Color::GREEN);
        assert_eq!(image.color_at(0, 1), Color::BLUE);
        assert_eq!(image.color_at_index(3), Color::WHITE);
    }

    #[test]
    fn from_rgb_rejects_partial_rows() {
        assert!(matches!(
            Image::from_rgb(&[0, 0, 0], 2),
            Err(GifError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn from_rgb_rows_rejects_ragged_rows() {
        let rows = vec![vec![0, 0], vec![0]];
        assert!(matches!(
            Image::from_rgb_rows(&rows),
            Err(GifError::RaggedRows)
        ));
    }

    #[test]
    fn histogram_counts_duplicates() {
        let image = Image::from_rgb(&[0xFF0000, 0xFF0000, 0x00FF00, 0x0000FF], 2).unwrap();
        let histogram = image.color_histogram();
        assert_eq!(histogram.distinct_len(), 3);
        assert_eq!(histogram.count(Color::RED), 2);
        assert_eq!(histogram.total(), 4);
    }
}
