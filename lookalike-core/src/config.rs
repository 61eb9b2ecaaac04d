//! Detector configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::BandingParams;
use crate::key::KeySpace;
use crate::similarity::Thresholds;

/// Default signature length (number of hash components).
pub const DEFAULT_SIGNATURE_LEN: usize = 128;

/// Default key prefix for the persisted keyspace.
pub const DEFAULT_KEY_PREFIX: &str = "lookalike";

/// Deployment-time parameters of the duplicate detector.
///
/// `signature_len` must stay constant for the lifetime of a keyspace:
/// persisted signatures of another length are skipped at bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub signature_len: usize,
    pub thresholds: Thresholds,
    pub key_prefix: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            signature_len: DEFAULT_SIGNATURE_LEN,
            thresholds: Thresholds::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.keyspace()?;
        self.banding()?;
        Ok(())
    }

    pub fn keyspace(&self) -> Result<KeySpace> {
        KeySpace::new(self.key_prefix.clone())
    }

    /// Banding derived from the signature threshold and length.
    pub fn banding(&self) -> Result<BandingParams> {
        BandingParams::optimal(self.thresholds.min_jaccard, self.signature_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.signature_len, 128);
        assert_eq!(config.thresholds.max_hamming, 5);
        assert_eq!(config.thresholds.min_jaccard, 0.2);
        assert!(config.validate().is_ok());
        assert_eq!(config.banding().unwrap(), BandingParams { bands: 64, rows: 2 });
    }

    #[test]
    fn test_invalid_config() {
        let config = DetectorConfig {
            signature_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            key_prefix: "bad:prefix".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
