//! Error-diffusion dithering onto a fixed palette.

use crate::color::Color;
use crate::image::Image;

/// Fractions of the quantization error handed to not-yet-processed
/// neighbors: right, lower-left, below, lower-right.
const ERROR_DISTRIBUTION: [(isize, isize, f64); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Strategy for remapping a pixel grid onto a fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ditherer {
    /// Floyd-Steinberg error diffusion.
    #[default]
    FloydSteinberg,
}

impl Ditherer {
    /// Remaps every pixel of `image` to a member of `palette`, diffusing the
    /// per-pixel quantization error to neighboring pixels. The result has
    /// the same dimensions as the input.
    ///
    /// # Panics
    ///
    /// Panics if `palette` is empty.
    pub fn dither(self, image: &Image, palette: &[Color]) -> Image {
        match self {
            Ditherer::FloydSteinberg => floyd_steinberg(image, palette),
        }
    }
}

fn floyd_steinberg(image: &Image, palette: &[Color]) -> Image {
    assert!(!palette.is_empty(), "cannot dither onto an empty palette");
    let width = image.width();
    let height = image.height();
    let mut working: Vec<Color> = image.pixels().to_vec();

    // Strictly sequential: each pixel's replacement depends on the error
    // diffused by every earlier pixel in row-major order.
    for y in 0..height {
        for x in 0..width {
            let original = working[y * width + x];
            let replacement = original.nearest(palette);
            working[y * width + x] = replacement;
            let error = original - replacement;
            for (dx, dy, fraction) in ERROR_DISTRIBUTION {
                let sibling_x = x as isize + dx;
                let sibling_y = y as isize + dy;
                if sibling_x >= 0
                    && sibling_y >= 0
                    && (sibling_x as usize) < width
                    && (sibling_y as usize) < height
                {
                    let sibling = sibling_y as usize * width + sibling_x as usize;
                    working[sibling] = working[sibling] + error.scaled(fraction);
                }
            }
        }
    }

    Image::from_pixels(width, working).expect("dithered image keeps the input dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_output_pixel_is_a_palette_member() {
        let rgb: Vec<u32> = (0..64)
            .map(|i| {
                let v = (i * 4) as u32;
                v << 16 | v << 8 | v
            })
            .collect();
        let image = Image::from_rgb(&rgb, 8).unwrap();
        let palette = [Color::BLACK, Color::new(0.5, 0.5, 0.5), Color::WHITE];

        let dithered = Ditherer::FloydSteinberg.dither(&image, &palette);
        assert_eq!(dithered.width(), 8);
        assert_eq!(dithered.height(), 8);
        for i in 0..dithered.pixel_count() {
            let pixel = dithered.color_at_index(i);
            assert!(
                palette.contains(&pixel),
                "pixel {i} ({pixel:?}) is not in the palette"
            );
        }
    }

    #[test]
    fn exact_palette_colors_pass_through_unchanged() {
        let image = Image::from_rgb(&[0xFF0000, 0x0000FF, 0x0000FF, 0xFF0000], 2).unwrap();
        let palette = [Color::RED, Color::BLUE];
        let dithered = Ditherer::FloydSteinberg.dither(&image, &palette);
        assert_eq!(dithered.color_at(0, 0), Color::RED);
        assert_eq!(dithered.color_at(1, 0), Color::BLUE);
        assert_eq!(dithered.color_at(0, 1), Color::BLUE);
        assert_eq!(dithered.color_at(1, 1), Color::RED);
    }

    #[test]
    fn error_diffuses_to_the_right_neighbor() {
        // A mid gray against a black-and-white palette: the first pixel
        // rounds down to black and pushes 7/16 of the remainder rightward,
        // lifting the second pixel above the halfway mark.
        let image = Image::from_rgb(&[0x7F7F7F, 0x7F7F7F], 2).unwrap();
        let palette = [Color::BLACK, Color::WHITE];
        let dithered = Ditherer::FloydSteinberg.dither(&image, &palette);
        assert_eq!(dithered.color_at(0, 0), Color::BLACK);
        assert_eq!(dithered.color_at(1, 0), Color::WHITE);
    }
}
