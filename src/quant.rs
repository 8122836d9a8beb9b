//! Color quantization strategies.
//!
//! A quantizer reduces an arbitrary weighted color population to at most
//! `max_color_count` representative colors. The returned palette keeps a
//! stable order so downstream color table construction is reproducible.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::color::{Color, ColorHistogram};

/// Strategy for reducing a color population to a bounded palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantizer {
    /// Median cut: recursively splits the color population along the
    /// component with the widest spread. Good quality at moderate cost;
    /// the default.
    #[default]
    MedianCut,
    /// K-means clustering. Tends to give the best palettes, but convergence
    /// can be slow on frames with many distinct colors.
    KMeans,
    /// Uniform partitioning of the RGB cube, ignoring the actual pixel
    /// content. Fast and quality-agnostic.
    Uniform,
}

impl Quantizer {
    /// Quantizes the given color population, returning at most
    /// `max_color_count` distinct colors in a stable order.
    ///
    /// The output is representative of the population but carries no
    /// stronger guarantee; centroid-based strategies emit synthetic colors
    /// not present in the input.
    ///
    /// # Panics
    ///
    /// Panics if `max_color_count` is zero or `original_colors` is empty.
    pub fn quantize(self, original_colors: &ColorHistogram, max_color_count: usize) -> Vec<Color> {
        assert!(max_color_count >= 1, "max_color_count must be at least 1");
        assert!(
            !original_colors.is_empty(),
            "cannot quantize an empty color population"
        );
        match self {
            Quantizer::MedianCut => median_cut(original_colors, max_color_count),
            Quantizer::KMeans => k_means(original_colors, max_color_count),
            Quantizer::Uniform => uniform(max_color_count),
        }
    }
}

/// A median-cut working cluster: a color sub-population with its memoized
/// per-component spread.
struct Cluster {
    colors: ColorHistogram,
    largest_spread: f64,
    spread_component: usize,
}

impl Cluster {
    fn new(colors: ColorHistogram) -> Self {
        let mut largest_spread = -1.0;
        let mut spread_component = 0;
        for component in 0..3 {
            let spread = component_spread(&colors, component);
            if spread > largest_spread {
                largest_spread = spread;
                spread_component = component;
            }
        }
        Self {
            colors,
            largest_spread,
            spread_component,
        }
    }

    fn is_splittable(&self) -> bool {
        self.colors.distinct_len() >= 2
    }

    /// Splits this cluster in two at the distinct-color boundary nearest the
    /// weight-expanded median of the widest component.
    fn split(self) -> (Cluster, Cluster) {
        let mut entries: Vec<(Color, u32)> = self.colors.iter().collect();
        entries.sort_by(|&(a, _), &(b, _)| {
            a.component(self.spread_component)
                .total_cmp(&b.component(self.spread_component))
                .then_with(|| a.bit_key().cmp(&b.bit_key()))
        });

        let half = self.colors.total() / 2;
        let mut cut = 1;
        let mut best_gap = u64::MAX;
        let mut prefix = 0u64;
        for (i, &(_, count)) in entries.iter().enumerate().take(entries.len() - 1) {
            prefix += u64::from(count);
            let gap = prefix.abs_diff(half);
            if gap < best_gap {
                best_gap = gap;
                cut = i + 1;
            }
        }

        let upper = entries.split_off(cut);
        (
            Cluster::new(collect_histogram(entries)),
            Cluster::new(collect_histogram(upper)),
        )
    }
}

fn collect_histogram(entries: Vec<(Color, u32)>) -> ColorHistogram {
    let mut histogram = ColorHistogram::new();
    for (color, count) in entries {
        histogram.add_n(color, count);
    }
    histogram
}

fn component_spread(colors: &ColorHistogram, component: usize) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for color in colors.distinct() {
        let value = color.component(component);
        min = min.min(value);
        max = max.max(value);
    }
    max - min
}

fn median_cut(original_colors: &ColorHistogram, max_color_count: usize) -> Vec<Color> {
    let mut clusters = vec![Cluster::new(original_colors.clone())];
    while clusters.len() < max_color_count {
        // Pick the splittable cluster with the widest spread; exact ties go
        // to the oldest cluster in the working set.
        let mut target = None;
        let mut widest = -1.0;
        for (i, cluster) in clusters.iter().enumerate() {
            if cluster.is_splittable() && cluster.largest_spread > widest {
                widest = cluster.largest_spread;
                target = Some(i);
            }
        }
        let Some(target) = target else {
            break; // every remaining cluster holds a single distinct color
        };
        let (lower, upper) = clusters.remove(target).split();
        clusters.push(lower);
        clusters.push(upper);
    }
    dedup_colors(clusters.iter().map(|cluster| cluster.colors.centroid()))
}

/// A k-means cluster: current centroid plus the colors homed to it.
struct KMeansCluster {
    centroid: Color,
    members: ColorHistogram,
}

fn k_means(original_colors: &ColorHistogram, max_color_count: usize) -> Vec<Color> {
    // Forgy initialization: distinct colors chosen uniformly at random
    // become the starting centroids.
    let mut distinct: Vec<Color> = original_colors.distinct().collect();
    distinct.shuffle(&mut thread_rng());
    distinct.truncate(max_color_count);

    let mut clusters: Vec<KMeansCluster> = distinct
        .into_iter()
        .map(|centroid| KMeansCluster {
            centroid,
            members: ColorHistogram::new(),
        })
        .collect();

    let centroids: Vec<Color> = clusters.iter().map(|c| c.centroid).collect();
    for (color, count) in original_colors.iter() {
        let home = nearest_centroid(color, &centroids);
        clusters[home].members.add_n(color, count);
    }

    let mut dirty = vec![true; clusters.len()];
    loop {
        for (i, cluster) in clusters.iter_mut().enumerate() {
            // A cluster emptied by re-homing keeps its previous centroid.
            if dirty[i] && !cluster.members.is_empty() {
                cluster.centroid = cluster.members.centroid();
            }
        }

        // Read-only pass over the current clustering; moves apply afterwards
        // so no histogram is mutated while being walked.
        let centroids: Vec<Color> = clusters.iter().map(|c| c.centroid).collect();
        let mut moves: Vec<(usize, usize, Color, u32)> = Vec::new();
        for (home, cluster) in clusters.iter().enumerate() {
            for (color, count) in cluster.members.iter() {
                let nearest = nearest_centroid(color, &centroids);
                if nearest != home {
                    moves.push((home, nearest, color, count));
                }
            }
        }
        if moves.is_empty() {
            break;
        }

        dirty = vec![false; clusters.len()];
        for (from, to, color, count) in moves {
            clusters[from].members.remove_n(color, count);
            clusters[to].members.add_n(color, count);
            dirty[from] = true;
            dirty[to] = true;
        }
    }

    dedup_colors(clusters.iter().map(|cluster| cluster.centroid))
}

fn nearest_centroid(color: Color, centroids: &[Color]) -> usize {
    let mut nearest = 0;
    let mut nearest_distance = f64::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = color.distance_to(centroid);
        if distance < nearest_distance {
            nearest = i;
            nearest_distance = distance;
        }
    }
    nearest
}

fn uniform(max_color_count: usize) -> Vec<Color> {
    // Start from the cube root, then see if one or two channels can take an
    // extra segment while staying within budget.
    let base = ((max_color_count as f64).cbrt() + 1e-9).floor().max(1.0) as usize;
    let blue_segments = base;
    let mut green_segments = base;
    let mut red_segments = base;
    if red_segments * (green_segments + 1) * blue_segments <= max_color_count {
        green_segments += 1;
    }
    if (red_segments + 1) * green_segments * blue_segments <= max_color_count {
        red_segments += 1;
    }

    let mut colors = Vec::with_capacity(red_segments * green_segments * blue_segments);
    for red in 0..red_segments {
        for green in 0..green_segments {
            for blue in 0..blue_segments {
                colors.push(Color::new(
                    segment_coordinate(red, red_segments),
                    segment_coordinate(green, green_segments),
                    segment_coordinate(blue, blue_segments),
                ));
            }
        }
    }
    colors
}

fn segment_coordinate(segment: usize, segment_count: usize) -> f64 {
    if segment_count == 1 {
        0.0
    } else {
        segment as f64 / (segment_count - 1) as f64
    }
}

fn dedup_colors(colors: impl Iterator<Item = Color>) -> Vec<Color> {
    let mut seen = HashSet::new();
    colors.filter(|&color| seen.insert(color)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gradient_population(count: usize) -> ColorHistogram {
        let mut histogram = ColorHistogram::new();
        for i in 0..count {
            let v = i as f64 / count as f64;
            histogram.add_n(Color::new(v, 1.0 - v, v * v), 1 + (i % 3) as u32);
        }
        histogram
    }

    #[test]
    fn all_strategies_respect_the_size_bound() {
        let population = gradient_population(500);
        for quantizer in [Quantizer::MedianCut, Quantizer::KMeans, Quantizer::Uniform] {
            for max in [1, 7, 64, 256] {
                let palette = quantizer.quantize(&population, max);
                assert!(
                    palette.len() <= max,
                    "{quantizer:?} returned {} colors for a budget of {max}",
                    palette.len()
                );
                assert!(!palette.is_empty());
            }
        }
    }

    #[test]
    fn median_cut_returns_small_populations_exactly() {
        let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
        let population: ColorHistogram = colors.into_iter().collect();
        let mut palette = Quantizer::MedianCut.quantize(&population, 256);
        palette.sort_by(|a, b| a.bit_key().cmp(&b.bit_key()));
        let mut expected = colors.to_vec();
        expected.sort_by(|a, b| a.bit_key().cmp(&b.bit_key()));
        assert_eq!(palette, expected);
    }

    #[test]
    fn median_cut_splits_along_the_widest_component() {
        // Two tight groups far apart in red; a budget of 2 must separate them.
        let mut population = ColorHistogram::new();
        population.add_n(Color::new(0.0, 0.5, 0.5), 10);
        population.add_n(Color::new(0.1, 0.5, 0.5), 10);
        population.add_n(Color::new(0.9, 0.5, 0.5), 10);
        population.add_n(Color::new(1.0, 0.5, 0.5), 10);

        let mut palette = Quantizer::MedianCut.quantize(&population, 2);
        palette.sort_by(|a, b| a.component(0).total_cmp(&b.component(0)));
        assert_eq!(palette.len(), 2);
        assert!((palette[0].component(0) - 0.05).abs() < 1e-12);
        assert!((palette[1].component(0) - 0.95).abs() < 1e-12);
    }

    #[test]
    fn median_cut_centroids_are_weighted() {
        let mut population = ColorHistogram::new();
        population.add_n(Color::BLACK, 3);
        population.add_n(Color::WHITE, 1);
        let palette = Quantizer::MedianCut.quantize(&population, 1);
        assert_eq!(palette, vec![Color::new(0.25, 0.25, 0.25)]);
    }

    #[test]
    fn k_means_keeps_small_populations() {
        let colors = [Color::RED, Color::GREEN, Color::BLUE];
        let population: ColorHistogram = colors.into_iter().collect();
        let mut palette = Quantizer::KMeans.quantize(&population, 16);
        palette.sort_by(|a, b| a.bit_key().cmp(&b.bit_key()));
        let mut expected = colors.to_vec();
        expected.sort_by(|a, b| a.bit_key().cmp(&b.bit_key()));
        // With at least as many centroids as colors, every color is its own
        // cluster and the centroids converge onto the inputs.
        assert_eq!(palette, expected);
    }

    #[test]
    fn uniform_eight_colors_form_the_cube_corners() {
        let population = gradient_population(50);
        let palette = Quantizer::Uniform.quantize(&population, 8);
        assert_eq!(palette.len(), 8);
        for color in &palette {
            for component in 0..3 {
                let value = color.component(component);
                assert!(value == 0.0 || value == 1.0);
            }
        }
        assert_eq!(dedup_colors(palette.into_iter()).len(), 8);
    }

    #[test]
    fn uniform_single_color_budget_collapses_to_black() {
        let population = gradient_population(10);
        assert_eq!(
            Quantizer::Uniform.quantize(&population, 1),
            vec![Color::BLACK]
        );
    }

    #[test]
    fn uniform_grows_green_before_red() {
        let population = gradient_population(10);
        // Budget 12 fits 2x3x2 but not 3x3x2.
        let palette = Quantizer::Uniform.quantize(&population, 12);
        assert_eq!(palette.len(), 12);
        let greens: HashSet<u64> = palette
            .iter()
            .map(|c| c.component(1).to_bits())
            .collect();
        assert_eq!(greens.len(), 3);
    }
}
