//! Feature extraction from raster snapshots.
//!
//! A snapshot is resampled to a fixed 28x28 grid, reduced to the unweighted
//! mean of its color channels, and inverted so that ink reads as 1.0 and
//! paper as 0.0.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Edge length of the resampled grid.
pub const TARGET_SIZE: u32 = 28;

/// Number of values in every feature vector.
pub const FEATURE_LEN: usize = (TARGET_SIZE * TARGET_SIZE) as usize;

/// Shade ramp for ASCII previews, lightest first.
const PREVIEW_RAMP: &[u8] = b" .:-=+*#%@";

/// Interpolation used when shrinking a snapshot to the target grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Box filter: every output pixel is the mean of the source area it covers
    #[default]
    Area,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    fn filter_type(self) -> Option<FilterType> {
        match self {
            ResampleFilter::Area => None,
            ResampleFilter::Triangle => Some(FilterType::Triangle),
            ResampleFilter::CatmullRom => Some(FilterType::CatmullRom),
            ResampleFilter::Gaussian => Some(FilterType::Gaussian),
            ResampleFilter::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "area" | "box" => Ok(ResampleFilter::Area),
            "triangle" | "bilinear" => Ok(ResampleFilter::Triangle),
            "catmull-rom" | "catmull_rom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "gaussian" => Ok(ResampleFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResampleFilter::Lanczos3),
            other => Err(format!("unknown resample filter '{other}'")),
        }
    }
}

/// Normalized ink-density values in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// A vector for an empty canvas.
    pub fn blank() -> Self {
        Self(vec![0.0; FEATURE_LEN])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Value at a grid position.
    pub fn get(&self, row: u32, col: u32) -> Option<f32> {
        if row >= TARGET_SIZE || col >= TARGET_SIZE {
            return None;
        }
        self.0.get((row * TARGET_SIZE + col) as usize).copied()
    }

    /// Mean value across the grid.
    pub fn ink_coverage(&self) -> f32 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().sum::<f32>() / self.0.len() as f32
    }

    /// True when no cell carries any ink.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Render the grid as text, one line per row.
    pub fn preview(&self) -> String {
        let last = (PREVIEW_RAMP.len() - 1) as f32;
        let mut out = String::with_capacity(FEATURE_LEN + TARGET_SIZE as usize);
        for row in self.0.chunks(TARGET_SIZE as usize) {
            for &value in row {
                let idx = (value.clamp(0.0, 1.0) * last).round() as usize;
                out.push(PREVIEW_RAMP[idx] as char);
            }
            out.push('\n');
        }
        out
    }

    /// One grid row per line, comma separated.
    pub fn to_csv(&self) -> String {
        self.0
            .chunks(TARGET_SIZE as usize)
            .map(|row| {
                row.iter()
                    .map(|v| format!("{v:.4}"))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Deterministic raster-to-vector transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    filter: ResampleFilter,
}

impl FeatureExtractor {
    pub fn new(filter: ResampleFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    /// Extract a [`FEATURE_LEN`]-value vector from a raster.
    ///
    /// A raster with a zero dimension has nothing drawn on it and yields
    /// [`FeatureVector::blank`].
    pub fn extract(&self, raster: &RgbaImage) -> FeatureVector {
        if raster.width() == 0 || raster.height() == 0 {
            return FeatureVector::blank();
        }

        let resampled = self.resample(raster);
        let values = resampled
            .pixels()
            .map(|p| {
                let [r, g, b, _] = p.0;
                let gray = (r as f32 + g as f32 + b as f32) / 3.0;
                ((255.0 - gray) / 255.0).clamp(0.0, 1.0)
            })
            .collect();

        FeatureVector(values)
    }

    fn resample(&self, raster: &RgbaImage) -> RgbaImage {
        match self.filter.filter_type() {
            Some(filter) => imageops::resize(raster, TARGET_SIZE, TARGET_SIZE, filter),
            None => imageops::thumbnail(raster, TARGET_SIZE, TARGET_SIZE),
        }
    }
}

/// Extract features with the default area filter.
pub fn extract_features(raster: &RgbaImage) -> FeatureVector {
    FeatureExtractor::default().extract(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_white_raster_is_all_zeros() {
        let raster = RgbaImage::from_pixel(280, 280, WHITE);
        let features = extract_features(&raster);
        assert_eq!(features.len(), FEATURE_LEN);
        assert!(features.is_blank());
    }

    #[test]
    fn test_black_raster_is_all_ones() {
        let raster = RgbaImage::from_pixel(280, 280, BLACK);
        let features = extract_features(&raster);
        assert!(features.as_slice().iter().all(|&v| v == 1.0));
        assert_eq!(features.ink_coverage(), 1.0);
    }

    #[test]
    fn test_gray_is_unweighted_mean_ignoring_alpha() {
        // (255 + 0 + 0) / 3 = 85 -> (255 - 85) / 255
        let raster = RgbaImage::from_pixel(56, 56, Rgba([255, 0, 0, 10]));
        let features = extract_features(&raster);
        let expected = (255.0 - 85.0) / 255.0;
        assert!(features
            .as_slice()
            .iter()
            .all(|&v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn test_area_filter_averages_blocks() {
        // Left half of each 10x10 block black -> 0.5 everywhere
        let raster = RgbaImage::from_fn(280, 280, |x, _| if x % 10 < 5 { BLACK } else { WHITE });
        let features = extract_features(&raster);
        for &v in features.as_slice() {
            assert!((v - 0.5).abs() < 0.01, "got {v}");
        }
    }

    #[test]
    fn test_row_major_order() {
        // Ink only in the top-right 10x10 block -> grid cell (0, 27)
        let raster = RgbaImage::from_fn(280, 280, |x, y| {
            if x >= 270 && y < 10 {
                BLACK
            } else {
                WHITE
            }
        });
        let features = extract_features(&raster);
        assert_eq!(features.as_slice()[27], 1.0);
        assert_eq!(features.get(0, 27), Some(1.0));
        assert_eq!(features.get(27, 0), Some(0.0));
        assert_eq!(features.get(28, 0), None);
        assert_eq!(features.as_slice().iter().filter(|&&v| v > 0.0).count(), 1);
    }

    #[test]
    fn test_length_is_fixed_for_any_size() {
        for filter in [
            ResampleFilter::Area,
            ResampleFilter::Triangle,
            ResampleFilter::CatmullRom,
            ResampleFilter::Gaussian,
            ResampleFilter::Lanczos3,
        ] {
            let extractor = FeatureExtractor::new(filter);
            for (w, h) in [(28, 28), (100, 37), (280, 280), (513, 301)] {
                let raster = RgbaImage::from_fn(w, h, |x, y| {
                    if (x + y) % 3 == 0 {
                        BLACK
                    } else {
                        WHITE
                    }
                });
                let features = extractor.extract(&raster);
                assert_eq!(features.len(), FEATURE_LEN);
                assert!(features
                    .as_slice()
                    .iter()
                    .all(|&v| (0.0..=1.0).contains(&v)));
            }
        }
    }

    #[test]
    fn test_zero_sized_raster_is_blank() {
        let raster = RgbaImage::new(0, 0);
        assert_eq!(extract_features(&raster), FeatureVector::blank());
    }

    #[test]
    fn test_deterministic() {
        let raster = RgbaImage::from_fn(280, 280, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgba([v, v / 2, 255 - v, 255])
        });
        let copy = raster.clone();
        let a = extract_features(&raster);
        let b = extract_features(&copy);
        let bits = |f: &FeatureVector| f.as_slice().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("area".parse::<ResampleFilter>(), Ok(ResampleFilter::Area));
        assert_eq!(
            "Bicubic".parse::<ResampleFilter>(),
            Ok(ResampleFilter::CatmullRom)
        );
        assert_eq!(
            " lanczos3 ".parse::<ResampleFilter>(),
            Ok(ResampleFilter::Lanczos3)
        );
        assert!("nearest".parse::<ResampleFilter>().is_err());
    }

    #[test]
    fn test_preview_shape() {
        let mut values = vec![0.0; FEATURE_LEN];
        values[0] = 1.0;
        let preview = FeatureVector(values).preview();
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), TARGET_SIZE as usize);
        assert!(lines.iter().all(|l| l.len() == TARGET_SIZE as usize));
        assert!(lines[0].starts_with('@'));
        assert!(lines[1].trim().is_empty());
    }

    #[test]
    fn test_csv_rows() {
        let csv = FeatureVector::blank().to_csv();
        assert_eq!(csv.lines().count(), TARGET_SIZE as usize);
        assert_eq!(csv.lines().next().unwrap().split(',').count(), TARGET_SIZE as usize);
    }
}
