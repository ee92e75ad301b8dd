/// Maps a seed to a repeatable value in `[0, 1)`.
///
/// Any finite seed is accepted, including zero and negative values.
#[inline]
pub fn seeded(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.545_3;
    let v = x - x.floor();
    if v.is_finite() && v < 1.0 {
        v
    } else {
        0.0
    }
}

/// Like [`seeded`] but mapped into `[min, max)`.
#[inline]
pub fn seeded_range(seed: f64, min: f64, max: f64) -> f64 {
    min + seeded(seed) * (max - min)
}

/// Signed variant in `[-1, 1)`.
#[inline]
pub fn seeded_signed(seed: f64) -> f64 {
    (seeded(seed) - 0.5) * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_unit_interval() {
        for i in -500..500 {
            let v = seeded(i as f64 * 0.731);
            assert!((0.0..1.0).contains(&v), "seed {i} gave {v}");
        }
    }

    #[test]
    fn is_repeatable() {
        assert_eq!(seeded(42.0), seeded(42.0));
        assert_ne!(seeded(42.0), seeded(43.0));
    }

    #[test]
    fn degenerate_seeds_are_finite() {
        for seed in [0.0, -1.0, -1e9, 1e12] {
            assert!(seeded(seed).is_finite());
        }
        assert_eq!(seeded(f64::NAN), 0.0);
    }

    #[test]
    fn range_respects_bounds() {
        for i in 0..200 {
            let v = seeded_range(i as f64, 0.25, 0.6);
            assert!((0.25..0.6).contains(&v));
            let s = seeded_signed(i as f64);
            assert!((-1.0..1.0).contains(&s));
        }
    }
}
