//! Distance and similarity math.
//!
//! Two independent measures are used by the classifier:
//!
//! - **Hamming distance** between 64-bit structural (perceptual) hashes,
//!   where smaller means more similar.
//! - **Jaccard estimate** between two set-similarity signatures, the
//!   fraction of positions holding the same component, where larger means
//!   more similar.

use serde::{Deserialize, Serialize};

use crate::error::{LookalikeError, Result};

/// Number of differing bits between two structural hashes.
pub fn hamming_distance(h1: u64, h2: u64) -> u32 {
    (h1 ^ h2).count_ones()
}

/// Estimate the Jaccard similarity of the sets behind two signatures.
///
/// Both signatures must have the same, non-zero length.
pub fn jaccard_estimate(sig1: &[u64], sig2: &[u64]) -> Result<f64> {
    if sig1.len() != sig2.len() {
        return Err(LookalikeError::IncompatibleSignature {
            expected: sig1.len(),
            got: sig2.len(),
        });
    }
    if sig1.is_empty() {
        return Err(LookalikeError::InvalidSignature(
            "cannot compare empty signatures".into(),
        ));
    }

    let matching = sig1.iter().zip(sig2).filter(|(a, b)| a == b).count();
    Ok(matching as f64 / sig1.len() as f64)
}

/// Classification thresholds.
///
/// `max_hamming` and `min_jaccard` are separate knobs for separate measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Largest Hamming distance still considered structurally similar.
    pub max_hamming: u32,
    /// Smallest Jaccard estimate still considered a signature match.
    pub min_jaccard: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_hamming: 5,
            min_jaccard: 0.2,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_jaccard > 0.0 && self.min_jaccard <= 1.0) {
            return Err(LookalikeError::InvalidParameter(format!(
                "min_jaccard must be in (0, 1], got {}",
                self.min_jaccard
            )));
        }
        if self.max_hamming > u64::BITS {
            return Err(LookalikeError::InvalidParameter(format!(
                "max_hamming must be at most {}, got {}",
                u64::BITS,
                self.max_hamming
            )));
        }
        Ok(())
    }

    pub fn is_structurally_similar(&self, distance: u32) -> bool {
        distance <= self.max_hamming
    }

    pub fn is_signature_similar(&self, similarity: f64) -> bool {
        similarity >= self.min_jaccard
    }
}
