//! The index <-> color bijection backing a GIF color table.

use std::collections::HashMap;
use std::io::Write;

use crate::color::Color;
use crate::image::Image;
use crate::{Result, MAX_COLOR_COUNT};

/// A palette with stable indices, padded to the power-of-two sizes the GIF
/// format can express. Immutable once built.
#[derive(Debug, Clone)]
pub struct ColorTable {
    colors: Vec<Color>,
    index_of: HashMap<Color, usize>,
}

impl ColorTable {
    /// Builds a table from colors in a defined order; indices follow the
    /// first appearance of each distinct color. Passing an ordered sequence
    /// (rather than an unordered set) is what keeps output bytes
    /// reproducible.
    ///
    /// # Panics
    ///
    /// Panics on more than 256 distinct colors. The format cannot index
    /// past 255, so a larger input means an unquantized population reached
    /// the table, which is a pipeline bug.
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        let mut table = Self {
            colors: Vec::new(),
            index_of: HashMap::new(),
        };
        for color in colors {
            if !table.index_of.contains_key(&color) {
                table.index_of.insert(color, table.colors.len());
                table.colors.push(color);
            }
        }
        assert!(
            table.colors.len() <= MAX_COLOR_COUNT,
            "{} distinct colors exceed the format's {MAX_COLOR_COUNT}-entry color table",
            table.colors.len()
        );
        table
    }

    /// Number of distinct colors actually present.
    pub fn unpadded_size(&self) -> usize {
        self.colors.len()
    }

    /// Size after padding up to a power of two. The minimum is 2 because
    /// the image descriptor's 2^(n+1) size field cannot encode a table of
    /// size 1.
    pub fn padded_size(&self) -> usize {
        self.colors.len().next_power_of_two().max(2)
    }

    /// Serializes the palette as 3-byte RGB triples followed by black
    /// padding entries up to the padded size.
    pub fn write<W: Write>(&self, sink: &mut W) -> Result<()> {
        for color in &self.colors {
            sink.write_all(&color.to_rgb_bytes())?;
        }
        for _ in self.unpadded_size()..self.padded_size() {
            sink.write_all(&[0, 0, 0])?;
        }
        Ok(())
    }

    /// Looks up every pixel of `image` in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if a pixel's color is absent from the table. That can only
    /// happen when the table was not built from the image's own (post-
    /// dither) color set, which is a pipeline bug rather than a recoverable
    /// condition.
    pub fn indices(&self, image: &Image) -> Vec<u8> {
        let mut indices = Vec::with_capacity(image.pixel_count());
        for i in 0..image.pixel_count() {
            let color = image.color_at_index(i);
            match self.index_of.get(&color) {
                Some(&index) => indices.push(index as u8),
                None => panic!("color {color:?} is absent from the color table"),
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn indices_follow_first_appearance_order() {
        let table = ColorTable::from_colors([Color::RED, Color::GREEN, Color::RED, Color::BLUE]);
        assert_eq!(table.unpadded_size(), 3);
        let image = Image::from_rgb(&[0x0000FF, 0x00FF00, 0xFF0000, 0xFF0000], 2).unwrap();
        assert_eq!(table.indices(&image), vec![2, 1, 0, 0]);
    }

    #[test]
    fn padded_size_rounds_up_to_a_power_of_two() {
        let colors = [
            Color::BLACK,
            Color::WHITE,
            Color::RED,
            Color::GREEN,
            Color::BLUE,
        ];
        for (count, padded) in [(1, 2), (2, 2), (3, 4), (4, 4), (5, 8)] {
            let table = ColorTable::from_colors(colors[..count].iter().copied());
            assert_eq!(table.padded_size(), padded, "for {count} colors");
        }
    }

    #[test]
    fn write_emits_triples_then_zero_padding() {
        let table = ColorTable::from_colors([Color::RED, Color::GREEN, Color::BLUE]);
        let mut bytes = Vec::new();
        table.write(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0]
        );
        assert_eq!(bytes.len(), table.padded_size() * 3);
    }

    #[test]
    fn accepts_a_full_256_color_table() {
        let colors = (0..256u32).map(|v| Color::from_rgb(v << 8 | v));
        let table = ColorTable::from_colors(colors);
        assert_eq!(table.unpadded_size(), 256);
        assert_eq!(table.padded_size(), 256);
    }

    #[test]
    #[should_panic(expected = "exceed the format's 256-entry color table")]
    fn oversized_palette_is_a_pipeline_bug() {
        // Index 256 would wrap to 0 if this were allowed through.
        ColorTable::from_colors((0..257u32).map(Color::from_rgb));
    }

    #[test]
    #[should_panic(expected = "absent from the color table")]
    fn foreign_color_lookup_is_a_pipeline_bug() {
        let table = ColorTable::from_colors([Color::RED]);
        let image = Image::from_rgb(&[0x00FF00], 1).unwrap();
        table.indices(&image);
    }
}
