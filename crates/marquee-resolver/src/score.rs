//! Raw-similarity → confidence score transform.
//!
//! Raw trigram similarity clusters in the 0.3–0.7 band for realistic
//! catalog names, which is too flat for downstream confidence decisions.
//! The transform stretches that band into `[0.5, 1.0]`:
//!
//! - raw ≥ 0.7          → 1.0
//! - 0.5 ≤ raw < 0.7    → 0.8 + (raw − 0.5)
//! - 0.3 ≤ raw < 0.5    → 0.5 + (raw − 0.3) × 0.75
//! - raw < 0.3          → unchanged (the threshold filter excludes these)
//!
//! Monotonic in raw, with exact fixed points 0.3→0.5, 0.5→0.8, 0.7→1.0.

/// Transform a raw similarity score into the discriminative range.
pub fn transform(raw: f64) -> f64 {
    if raw >= 0.7 {
        1.0
    } else if raw >= 0.5 {
        0.8 + (raw - 0.5)
    } else if raw >= 0.3 {
        0.5 + (raw - 0.3) * 0.75
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_points_are_exact() {
        assert_eq!(transform(0.7), 1.0);
        assert_eq!(transform(0.5), 0.8);
        assert_eq!(transform(0.3), 0.5);
    }

    #[test]
    fn below_threshold_passes_through() {
        assert_eq!(transform(0.0), 0.0);
        assert_eq!(transform(0.29), 0.29);
    }

    #[test]
    fn high_band_saturates() {
        assert_eq!(transform(0.95), 1.0);
        assert_eq!(transform(1.0), 1.0);
    }

    #[test]
    fn mid_bands_interpolate() {
        assert!((transform(0.6) - 0.9).abs() < 1e-12);
        assert!((transform(0.4) - 0.575).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn monotonic_non_decreasing(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(transform(lo) <= transform(hi) + 1e-12);
        }

        #[test]
        fn output_stays_in_unit_interval(raw in 0.0f64..=1.0) {
            let t = transform(raw);
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }
}
