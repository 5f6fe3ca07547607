//! Numeric reductions used by every extractor.
//!
//! Variances are population variances (divide by `n`). All functions return
//! `0.0` on empty input instead of NaN.

/// Guard added to denominators that may be zero.
pub const EPSILON: f64 = 1e-12;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Smallest value, `0.0` when empty.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Largest value, `0.0` when empty.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Mean of squared values.
pub fn energy(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64
}

/// Skewness and excess kurtosis of standardized values.
///
/// Standardizes with `std + EPSILON`, so constant input yields `(0, -3)`.
pub fn skew_kurtosis(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, -3.0);
    }
    let m = mean(values);
    let s = std_dev(values) + EPSILON;
    let n = values.len() as f64;

    let (mut z3, mut z4) = (0.0, 0.0);
    for v in values {
        let z = (v - m) / s;
        let z2 = z * z;
        z3 += z2 * z;
        z4 += z2 * z2;
    }
    (z3 / n, z4 / n - 3.0)
}

/// Shannon entropy in bits of a probability vector.
///
/// Non-positive entries are ignored.
pub fn safe_entropy(probabilities: &[f64]) -> f64 {
    let h: f64 = probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum();
    // -0.0 would leak into the output files
    h + 0.0
}

/// Turn bin counts into probabilities.
pub fn normalized_histogram(counts: &[f64]) -> Vec<f64> {
    let total = counts.iter().sum::<f64>() + EPSILON;
    counts.iter().map(|c| c / total).collect()
}

/// 256-bin histogram of 8-bit samples.
pub fn byte_histogram<'a>(samples: impl IntoIterator<Item = &'a u8>) -> Vec<f64> {
    let mut counts = vec![0.0; 256];
    for &s in samples {
        counts[s as usize] += 1.0;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(std_dev(&values), 2.0);
        assert_eq!(min(&values), 2.0);
        assert_eq!(max(&values), 9.0);
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
        assert_eq!(energy(&[]), 0.0);
    }

    #[test]
    fn test_skew_kurtosis_constant() {
        let (skew, kurt) = skew_kurtosis(&[3.0; 10]);
        assert_eq!(skew, 0.0);
        assert_eq!(kurt, -3.0);
    }

    #[test]
    fn test_skew_sign() {
        let (skew, _) = skew_kurtosis(&[0.0, 0.0, 0.0, 0.0, 10.0]);
        assert!(skew > 0.0);
        let (skew, _) = skew_kurtosis(&[10.0, 10.0, 10.0, 10.0, 0.0]);
        assert!(skew < 0.0);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(safe_entropy(&[1.0, 0.0]), 0.0);
        assert!((safe_entropy(&[0.25; 4]) - 2.0).abs() < 1e-12);
        assert_eq!(safe_entropy(&[]), 0.0);
    }

    #[test]
    fn test_byte_histogram() {
        let hist = byte_histogram(&[0u8, 0, 255]);
        assert_eq!(hist.len(), 256);
        assert_eq!(hist[0], 2.0);
        assert_eq!(hist[255], 1.0);
        let p = normalized_histogram(&hist);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_entropy_bounded(counts in prop::collection::vec(0u32..100, 1..64)) {
            let counts: Vec<f64> = counts.into_iter().map(f64::from).collect();
            let p = normalized_histogram(&counts);
            let h = safe_entropy(&p);
            prop_assert!(h >= 0.0);
            prop_assert!(h <= (counts.len() as f64).log2() + 1e-9);
        }

        #[test]
        fn prop_variance_non_negative(values in prop::collection::vec(-1e6f64..1e6, 0..100)) {
            prop_assert!(variance(&values) >= 0.0);
        }
    }
}
