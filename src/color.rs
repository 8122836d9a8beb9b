//! Color values and the weighted color population of a frame.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

/// An RGB color storing each component as an `f64`, nominally in `[0, 1]`.
///
/// Components outside `[0, 1]` are permitted; error diffusion and centroid
/// arithmetic produce them transiently. Equality and hashing go by component
/// bit patterns so a `Color` can key a hash map.
#[derive(Debug, Clone, Copy)]
pub struct Color {
    red: f64,
    green: f64,
    blue: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Builds a color from a packed `0xRRGGBB` value.
    pub fn from_rgb(rgb: u32) -> Self {
        let red = (rgb >> 16 & 0xFF) as f64 / 255.0;
        let green = (rgb >> 8 & 0xFF) as f64 / 255.0;
        let blue = (rgb & 0xFF) as f64 / 255.0;
        Self { red, green, blue }
    }

    /// Returns one component by index: 0 = red, 1 = green, 2 = blue.
    ///
    /// # Panics
    ///
    /// Panics on any other index; that is a caller bug, not a runtime
    /// condition.
    pub fn component(self, index: usize) -> f64 {
        match index {
            0 => self.red,
            1 => self.green,
            2 => self.blue,
            _ => panic!("unexpected component index: {index}"),
        }
    }

    /// Multiplies every component by `s`.
    pub fn scaled(self, s: f64) -> Self {
        Self::new(s * self.red, s * self.green, s * self.blue)
    }

    /// Euclidean distance between two colors in RGB space.
    pub fn distance_to(self, other: Color) -> f64 {
        let d = self - other;
        (d.red * d.red + d.green * d.green + d.blue * d.blue).sqrt()
    }

    /// Finds this color's nearest neighbor, by Euclidean distance, among some
    /// candidate colors. Ties keep the earliest candidate.
    ///
    /// # Panics
    ///
    /// Panics if `candidates` is empty.
    pub fn nearest(self, candidates: &[Color]) -> Color {
        let mut nearest = None;
        let mut nearest_distance = f64::INFINITY;
        for &candidate in candidates {
            let distance = self.distance_to(candidate);
            if distance < nearest_distance {
                nearest = Some(candidate);
                nearest_distance = distance;
            }
        }
        match nearest {
            Some(color) => color,
            None => panic!("nearest neighbor lookup against an empty candidate set"),
        }
    }

    /// Quantizes each component to 8 bits by truncating `component * 255`,
    /// saturating at the ends of the range.
    pub fn to_rgb_bytes(self) -> [u8; 3] {
        [
            (self.red * 255.0) as u8,
            (self.green * 255.0) as u8,
            (self.blue * 255.0) as u8,
        ]
    }

    /// Packs the 8-bit quantized components into a `0xRRGGBB` value.
    pub fn to_rgb(self) -> u32 {
        let [r, g, b] = self.to_rgb_bytes();
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// Key with a total order over color values, used to break exact ties
    /// deterministically when sorting by a single component.
    pub(crate) fn bit_key(self) -> [u64; 3] {
        [
            self.red.to_bits(),
            self.green.to_bits(),
            self.blue.to_bits(),
        ]
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.red + rhs.red, self.green + rhs.green, self.blue + rhs.blue)
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        Color::new(self.red - rhs.red, self.green - rhs.green, self.blue - rhs.blue)
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.bit_key() == other.bit_key()
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bit_key().hash(state);
    }
}

/// A weighted multiset of colors: each distinct color maps to a positive
/// occurrence count.
///
/// Entries keep their insertion order, and every enumeration walks that
/// order. The encoding pipeline relies on this for reproducible output
/// bytes; nothing downstream may depend on hash-map iteration order.
#[derive(Debug, Clone, Default)]
pub struct ColorHistogram {
    entries: Vec<(Color, u32)>,
    index: HashMap<Color, usize>,
    total: u64,
}

impl ColorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `color`.
    pub fn add(&mut self, color: Color) {
        self.add_n(color, 1);
    }

    /// Adds `n` occurrences of `color`.
    pub fn add_n(&mut self, color: Color, n: u32) {
        if n == 0 {
            return;
        }
        match self.index.get(&color) {
            Some(&slot) => self.entries[slot].1 += n,
            None => {
                self.index.insert(color, self.entries.len());
                self.entries.push((color, n));
            }
        }
        self.total += u64::from(n);
    }

    /// Removes up to `n` occurrences of `color`, returning how many were
    /// removed. A color whose count reaches zero leaves the histogram.
    pub fn remove_n(&mut self, color: Color, n: u32) -> u32 {
        let Some(&slot) = self.index.get(&color) else {
            return 0;
        };
        let count = self.entries[slot].1;
        if n < count {
            self.entries[slot].1 = count - n;
            self.total -= u64::from(n);
            return n;
        }
        // Last occurrence removed: drop the entry, patching the index of
        // whichever entry gets swapped into its slot.
        self.index.remove(&color);
        self.entries.swap_remove(slot);
        if let Some(&(moved, _)) = self.entries.get(slot) {
            self.index.insert(moved, slot);
        }
        self.total -= u64::from(count);
        count
    }

    /// Occurrence count for `color`, zero if absent.
    pub fn count(&self, color: Color) -> u32 {
        match self.index.get(&color) {
            Some(&slot) => self.entries[slot].1,
            None => 0,
        }
    }

    /// Total occurrences across all colors.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct colors present.
    pub fn distinct_len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct colors in insertion order.
    pub fn distinct(&self) -> impl Iterator<Item = Color> + '_ {
        self.entries.iter().map(|&(color, _)| color)
    }

    /// `(color, count)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Color, u32)> + '_ {
        self.entries.iter().copied()
    }

    /// The occurrence-weighted mean of all colors present.
    ///
    /// # Panics
    ///
    /// Panics if the histogram is empty.
    pub fn centroid(&self) -> Color {
        assert!(!self.is_empty(), "centroid of an empty color histogram");
        let mut sum = Color::BLACK;
        for &(color, count) in &self.entries {
            sum = sum + color.scaled(f64::from(count));
        }
        sum.scaled(1.0 / self.total as f64)
    }
}

impl FromIterator<Color> for ColorHistogram {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for color in iter {
            histogram.add(color);
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rgb_round_trip() {
        let color = Color::from_rgb(0x4080C0);
        assert_eq!(color.to_rgb(), 0x4080C0);
        assert_eq!(color.to_rgb_bytes(), [0x40, 0x80, 0xC0]);
    }

    #[test]
    fn rgb_bytes_saturate_out_of_range_components() {
        assert_eq!(Color::new(-0.5, 0.0, 1.5).to_rgb_bytes(), [0, 0, 255]);
    }

    #[test]
    fn arithmetic() {
        let sum = Color::RED + Color::BLUE;
        assert_eq!(sum, Color::new(1.0, 0.0, 1.0));
        assert_eq!(sum - Color::RED, Color::BLUE);
        assert_eq!(Color::WHITE.scaled(0.5), Color::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Color::BLACK.distance_to(Color::new(3.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_prefers_first_on_ties() {
        let candidates = [Color::RED, Color::BLUE];
        let midpoint = Color::new(0.5, 0.0, 0.5);
        assert_eq!(midpoint.nearest(&candidates), Color::RED);
    }

    #[test]
    fn histogram_counts_and_removal() {
        let mut histogram = ColorHistogram::new();
        histogram.add_n(Color::RED, 3);
        histogram.add(Color::GREEN);
        assert_eq!(histogram.count(Color::RED), 3);
        assert_eq!(histogram.total(), 4);

        assert_eq!(histogram.remove_n(Color::RED, 2), 2);
        assert_eq!(histogram.count(Color::RED), 1);

        // Removing more than remain removes the key entirely.
        assert_eq!(histogram.remove_n(Color::RED, 5), 1);
        assert_eq!(histogram.count(Color::RED), 0);
        assert_eq!(histogram.distinct_len(), 1);
        assert_eq!(histogram.total(), 1);
    }

    #[test]
    fn histogram_keeps_insertion_order() {
        let histogram: ColorHistogram =
            [Color::BLUE, Color::RED, Color::BLUE, Color::GREEN].into_iter().collect();
        let order: Vec<Color> = histogram.distinct().collect();
        assert_eq!(order, vec![Color::BLUE, Color::RED, Color::GREEN]);
    }

    #[test]
    fn centroid_is_weighted() {
        let mut histogram = ColorHistogram::new();
        histogram.add_n(Color::BLACK, 3);
        histogram.add(Color::WHITE);
        assert_eq!(histogram.centroid(), Color::new(0.25, 0.25, 0.25));
    }
}
