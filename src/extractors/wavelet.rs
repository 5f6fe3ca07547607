//! Single-level Haar wavelet sub-band summaries.

use crate::core::error::ExtractionError;
use crate::core::stats;
use crate::core::types::{FeatureMap, Plane};
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;

const BANDS: [&str; 4] = ["LL", "LH", "HL", "HH"];
const SUMMARIES: [&str; 4] = ["mean", "std", "energy", "entropy"];

/// The four sub-bands of a single-level 2-D DWT.
#[derive(Debug, Clone, PartialEq)]
pub struct SubBands {
    /// Approximation
    pub ll: Plane,
    /// Horizontal detail (high-pass down the columns)
    pub lh: Plane,
    /// Vertical detail (high-pass along the rows)
    pub hl: Plane,
    /// Diagonal detail
    pub hh: Plane,
}

impl SubBands {
    /// Bands paired with their column-name tags, in output order.
    pub fn named(&self) -> [(&'static str, &Plane); 4] {
        [
            (BANDS[0], &self.ll),
            (BANDS[1], &self.lh),
            (BANDS[2], &self.hl),
            (BANDS[3], &self.hh),
        ]
    }
}

/// Orthonormal 2-D Haar transform.
///
/// Odd dimensions are handled by repeating the last row/column, so the
/// bands are `ceil(w/2) x ceil(h/2)`.
pub fn haar_dwt2(plane: &Plane) -> SubBands {
    let (w, h) = (plane.width(), plane.height());
    let (bw, bh) = (w.div_ceil(2), h.div_ceil(2));

    let mut ll = Plane::new(bw, bh);
    let mut lh = Plane::new(bw, bh);
    let mut hl = Plane::new(bw, bh);
    let mut hh = Plane::new(bw, bh);

    for by in 0..bh {
        let y0 = 2 * by;
        let y1 = (y0 + 1).min(h - 1);
        for bx in 0..bw {
            let x0 = 2 * bx;
            let x1 = (x0 + 1).min(w - 1);

            let a = plane.get(x0, y0);
            let b = plane.get(x1, y0);
            let c = plane.get(x0, y1);
            let d = plane.get(x1, y1);

            ll.set(bx, by, (a + b + c + d) / 2.0);
            lh.set(bx, by, (a + b - c - d) / 2.0);
            hl.set(bx, by, (a - b + c - d) / 2.0);
            hh.set(bx, by, (a - b - c + d) / 2.0);
        }
    }

    SubBands { ll, lh, hl, hh }
}

/// Entropy of a band after stretching it onto 256 integer levels.
///
/// Constant bands have no spread to quantize and report 0.
fn quantized_entropy(values: &[f64]) -> f64 {
    let lo = stats::min(values);
    let span = stats::max(values) - lo;
    if span <= 0.0 {
        return 0.0;
    }

    let mut counts = vec![0.0; 256];
    for v in values {
        let q = ((v - lo) / span * 255.0) as usize;
        counts[q.min(255)] += 1.0;
    }
    stats::safe_entropy(&stats::normalized_histogram(&counts))
}

/// Haar wavelet extractor.
#[derive(Debug, Clone, Default)]
pub struct WaveletExtractor;

impl WaveletExtractor {
    /// Create the extractor.
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for WaveletExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("wavelet", "Haar Wavelet")
            .description("Mean, std, energy and quantized entropy of the four single-level Haar sub-bands")
            .family(FeatureFamily::Wavelet)
            .parameter("wavelet", "haar")
            .parameter("levels", 1)
            .column_count(BANDS.len() * SUMMARIES.len())
            .build()
    }

    fn column_names(&self) -> Vec<String> {
        BANDS
            .iter()
            .flat_map(|band| SUMMARIES.iter().map(move |s| format!("wav_{}_{}", band, s)))
            .collect()
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("wavelet", image, 1)?;

        let bands = haar_dwt2(&Plane::from_gray(image, 1.0));
        let mut feat = FeatureMap::new();
        for (name, band) in bands.named() {
            let values = band.as_slice();
            feat.insert(format!("wav_{}_mean", name), stats::mean(values));
            feat.insert(format!("wav_{}_std", name), stats::std_dev(values));
            feat.insert(format!("wav_{}_energy", name), stats::energy(values));
            feat.insert(format!("wav_{}_entropy", name), quantized_entropy(values));
        }
        Ok(feat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_single_block() {
        let plane = Plane::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let bands = haar_dwt2(&plane);
        assert_eq!(bands.ll.as_slice(), &[5.0]);
        assert_eq!(bands.lh.as_slice(), &[-2.0]);
        assert_eq!(bands.hl.as_slice(), &[-1.0]);
        assert_eq!(bands.hh.as_slice(), &[0.0]);
    }

    #[test]
    fn test_odd_size_repeats_edge() {
        let plane = Plane::from_vec(3, 1, vec![1.0, 2.0, 4.0]).unwrap();
        let bands = haar_dwt2(&plane);
        assert_eq!(bands.ll.width(), 2);
        assert_eq!(bands.ll.height(), 1);
        // Last block is [[4, 4], [4, 4]]
        assert_eq!(bands.ll.get(1, 0), 8.0);
        assert_eq!(bands.hl.get(1, 0), 0.0);
    }

    #[test]
    fn test_constant_image() {
        let img = GrayImage::from_pixel(8, 8, Luma([10]));
        let feat = WaveletExtractor.extract(&img).unwrap();

        assert_eq!(feat["wav_LL_mean"], 20.0);
        assert_eq!(feat["wav_LL_std"], 0.0);
        assert_eq!(feat["wav_LL_energy"], 400.0);
        for band in BANDS {
            assert_eq!(feat[&format!("wav_{}_entropy", band)], 0.0);
        }
        assert_eq!(feat["wav_HH_energy"], 0.0);
    }

    #[test]
    fn test_checkerboard_is_diagonal() {
        let img = GrayImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 { Luma([200]) } else { Luma([0]) }
        });
        let feat = WaveletExtractor.extract(&img).unwrap();

        assert_eq!(feat["wav_HH_mean"], 200.0);
        assert_eq!(feat["wav_LH_energy"], 0.0);
        assert_eq!(feat["wav_HL_energy"], 0.0);
    }

    #[test]
    fn test_quantized_entropy_two_levels() {
        let values = [0.0, 0.0, 1.0, 1.0];
        assert!((quantized_entropy(&values) - 1.0).abs() < 1e-9);
        assert_eq!(quantized_entropy(&[3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_column_names() {
        let names = WaveletExtractor.column_names();
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "wav_LL_mean");
        assert_eq!(names[15], "wav_HH_entropy");
    }
}
