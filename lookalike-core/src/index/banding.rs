//! Band/row parameter selection for the candidate index.
//!
//! A signature of length `N` is cut into `b` bands of `r` components
//! (`b * r = N`). Two signatures with Jaccard similarity `s` share at least
//! one band with probability `1 - (1 - s^r)^b`, an S-curve whose midpoint
//! sits near `(1/b)^(1/r)`.

use serde::{Deserialize, Serialize};

use crate::error::{LookalikeError, Result};

/// Number of bands and rows per band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandingParams {
    pub bands: usize,
    pub rows: usize,
}

impl BandingParams {
    pub fn new(bands: usize, rows: usize) -> Result<Self> {
        if bands == 0 || rows == 0 {
            return Err(LookalikeError::InvalidParameter(
                "bands and rows must both be >= 1".into(),
            ));
        }
        Ok(Self { bands, rows })
    }

    /// Pick the exact factorisation `b * r = signature_len` whose S-curve
    /// midpoint lies closest to `threshold`.
    ///
    /// Ties resolve towards fewer rows per band, which favours recall.
    pub fn optimal(threshold: f64, signature_len: usize) -> Result<Self> {
        if signature_len == 0 {
            return Err(LookalikeError::InvalidParameter(
                "signature length must be >= 1".into(),
            ));
        }
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(LookalikeError::InvalidParameter(format!(
                "threshold must be in (0, 1], got {threshold}"
            )));
        }

        let mut best: Option<(f64, Self)> = None;
        for rows in (1..=signature_len).filter(|r| signature_len % r == 0) {
            let candidate = Self {
                bands: signature_len / rows,
                rows,
            };
            let gap = (candidate.threshold_point() - threshold).abs();
            match best {
                Some((best_gap, _)) if gap >= best_gap => {}
                _ => best = Some((gap, candidate)),
            }
        }

        best.map(|(_, params)| params).ok_or_else(|| {
            LookalikeError::InvalidParameter("no banding factorisation found".into())
        })
    }

    /// Signature length these parameters partition.
    pub fn signature_len(&self) -> usize {
        self.bands * self.rows
    }

    /// Approximate similarity at which the collision probability crosses 50%.
    pub fn threshold_point(&self) -> f64 {
        (1.0 / self.bands as f64).powf(1.0 / self.rows as f64)
    }

    /// Probability that two signatures with Jaccard similarity `similarity`
    /// share at least one band.
    pub fn collision_probability(&self, similarity: f64) -> f64 {
        let s = similarity.clamp(0.0, 1.0);
        1.0 - (1.0 - s.powi(self.rows as i32)).powi(self.bands as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_for_default_threshold() {
        let params = BandingParams::optimal(0.2, 128).unwrap();
        assert_eq!(params, BandingParams { bands: 64, rows: 2 });
        assert_eq!(params.signature_len(), 128);
    }

    #[test]
    fn test_optimal_for_high_threshold() {
        let params = BandingParams::optimal(0.8, 128).unwrap();
        assert_eq!(params.signature_len(), 128);
        assert!(params.rows > 2);
        assert!((params.threshold_point() - 0.8).abs() < 0.15);
    }

    #[test]
    fn test_optimal_prime_length() {
        let params = BandingParams::optimal(0.5, 7).unwrap();
        assert_eq!(params.signature_len(), 7);
    }

    #[test]
    fn test_optimal_rejects_bad_input() {
        assert!(BandingParams::optimal(0.0, 128).is_err());
        assert!(BandingParams::optimal(1.5, 128).is_err());
        assert!(BandingParams::optimal(0.5, 0).is_err());
        assert!(BandingParams::new(0, 4).is_err());
    }

    #[test]
    fn test_collision_probability_is_monotonic() {
        let params = BandingParams::new(64, 2).unwrap();
        assert_eq!(params.collision_probability(0.0), 0.0);
        assert_eq!(params.collision_probability(1.0), 1.0);
        let low = params.collision_probability(0.1);
        let mid = params.collision_probability(0.25);
        let high = params.collision_probability(0.5);
        assert!(low < mid && mid < high);
        assert!(mid > 0.95);
    }
}
