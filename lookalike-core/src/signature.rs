//! Set-similarity signatures and their portable binary encoding.
//!
//! # Wire format
//!
//! ```text
//! +-----+----------------------------------------+
//! | tag | N components, little-endian, fixed width |
//! +-----+----------------------------------------+
//! ```
//!
//! | tag    | component width |
//! |--------|-----------------|
//! | `0x01` | 32-bit          |
//! | `0x02` | 64-bit          |
//!
//! The encoder uses the narrow form whenever every component fits in 32 bits.

use serde::{Deserialize, Serialize};

use crate::error::{LookalikeError, Result};

/// Tag for 32-bit components.
pub const TAG_U32: u8 = 0x01;
/// Tag for 64-bit components.
pub const TAG_U64: u8 = 0x02;

/// Fixed-length ordered sequence of hash components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    values: Vec<u64>,
}

impl Signature {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Reject signatures whose length differs from the deployment's `expected`.
    pub fn ensure_len(&self, expected: usize) -> Result<()> {
        if self.values.len() != expected {
            return Err(LookalikeError::IncompatibleSignature {
                expected,
                got: self.values.len(),
            });
        }
        Ok(())
    }

    /// Serialize to the tagged binary format.
    pub fn encode(&self) -> Vec<u8> {
        let narrow = self.values.iter().all(|&v| v <= u32::MAX as u64);
        if narrow {
            let mut out = Vec::with_capacity(1 + self.values.len() * 4);
            out.push(TAG_U32);
            for &v in &self.values {
                out.extend_from_slice(&(v as u32).to_le_bytes());
            }
            out
        } else {
            let mut out = Vec::with_capacity(1 + self.values.len() * 8);
            out.push(TAG_U64);
            for &v in &self.values {
                out.extend_from_slice(&v.to_le_bytes());
            }
            out
        }
    }

    /// Parse the tagged binary format.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&tag, payload) = bytes
            .split_first()
            .ok_or_else(|| LookalikeError::InvalidSignature("empty input".into()))?;

        let width = match tag {
            TAG_U32 => 4,
            TAG_U64 => 8,
            other => {
                return Err(LookalikeError::InvalidSignature(format!(
                    "unknown format tag 0x{other:02x}"
                )))
            }
        };

        if payload.is_empty() {
            return Err(LookalikeError::InvalidSignature("no components".into()));
        }
        if payload.len() % width != 0 {
            return Err(LookalikeError::InvalidSignature(format!(
                "payload of {} bytes is not a multiple of {width}",
                payload.len()
            )));
        }

        let values = if width == 4 {
            payload
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as u64)
                .collect()
        } else {
            payload
                .chunks_exact(8)
                .map(|c| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(c);
                    u64::from_le_bytes(buf)
                })
                .collect()
        };

        Ok(Self { values })
    }
}

impl From<Vec<u64>> for Signature {
    fn from(values: Vec<u64>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_narrow() {
        let sig = Signature::new(vec![1, 2, u32::MAX as u64]);
        let bytes = sig.encode();
        assert_eq!(bytes[0], TAG_U32);
        assert_eq!(bytes.len(), 1 + 3 * 4);
        assert_eq!(&bytes[1..5], &[1, 0, 0, 0]);
        assert_eq!(Signature::decode(&bytes).unwrap(), sig);
    }

    #[test]
    fn test_encode_wide() {
        let sig = Signature::new(vec![1, u32::MAX as u64 + 1]);
        let bytes = sig.encode();
        assert_eq!(bytes[0], TAG_U64);
        assert_eq!(bytes.len(), 1 + 2 * 8);
        assert_eq!(Signature::decode(&bytes).unwrap(), sig);
    }

    #[test]
    fn test_decode_hand_built_u64() {
        let mut bytes = vec![TAG_U64];
        bytes.extend_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        let sig = Signature::decode(&bytes).unwrap();
        assert_eq!(sig.values(), &[0x0102_0304_0506_0708]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Signature::decode(&[]).is_err());
        assert!(Signature::decode(&[TAG_U32]).is_err());
        assert!(Signature::decode(&[0x7f, 0, 0, 0, 0]).is_err());
        assert!(Signature::decode(&[TAG_U32, 1, 2, 3]).is_err());
        assert!(Signature::decode(&[TAG_U64, 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_ensure_len() {
        let sig = Signature::new(vec![0; 128]);
        assert!(sig.ensure_len(128).is_ok());
        assert!(matches!(
            sig.ensure_len(64),
            Err(LookalikeError::IncompatibleSignature {
                expected: 64,
                got: 128
            })
        ));
    }
}
