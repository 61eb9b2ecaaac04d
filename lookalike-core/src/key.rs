//! Record key encoding.
//!
//! A record is identified by a flat string built from five fields joined by
//! [`DELIMITER`]:
//!
//! ```text
//! <content_hash>:<structural_hash as 16 hex digits>:<group_id>:<user_id>:<timestamp>
//! ```
//!
//! [`KeySpace`] namespaces these encoded keys inside the backing store and
//! builds the scan patterns used by the detector and the bootstrapper.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LookalikeError, Result};
use crate::store::WILDCARD;

/// Reserved field delimiter. No field value may contain it.
pub const DELIMITER: char = ':';

const FIELD_COUNT: usize = 5;

/// The five identifying fields of a stored image record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub content_hash: String,
    pub structural_hash: u64,
    pub group_id: String,
    pub user_id: String,
    pub timestamp: i64,
}

impl RecordKey {
    /// Reject field values that would corrupt the key encoding or a scan pattern.
    pub fn validate(&self) -> Result<()> {
        validate_field("content_hash", &self.content_hash)?;
        validate_field("group_id", &self.group_id)?;
        validate_field("user_id", &self.user_id)?;
        Ok(())
    }

    /// Structural hash rendered the way it appears inside an encoded key.
    pub fn structural_hex(&self) -> String {
        format!("{:016x}", self.structural_hash)
    }

    /// Parse a structural hash given as 1-16 hex digits, with optional `0x`.
    pub fn parse_structural_hex(value: &str) -> Result<u64> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 16 {
            return Err(LookalikeError::Validation(format!(
                "structural hash must be 1-16 hex digits, got '{value}'"
            )));
        }
        u64::from_str_radix(digits, 16).map_err(|e| {
            LookalikeError::Validation(format!("structural hash '{value}' is not hex: {e}"))
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&KeyCodec::encode(self))
    }
}

/// Stateless encoder/decoder for [`RecordKey`].
pub struct KeyCodec;

impl KeyCodec {
    /// Join the five fields with the delimiter.
    pub fn encode(key: &RecordKey) -> String {
        format!(
            "{content}{d}{structural:016x}{d}{group}{d}{user}{d}{ts}",
            content = key.content_hash,
            structural = key.structural_hash,
            group = key.group_id,
            user = key.user_id,
            ts = key.timestamp,
            d = DELIMITER,
        )
    }

    /// Split an encoded key back into its fields.
    pub fn decode(encoded: &str) -> Result<RecordKey> {
        let parts: Vec<&str> = encoded.split(DELIMITER).collect();
        if parts.len() != FIELD_COUNT {
            return Err(LookalikeError::MalformedKey(format!(
                "expected {} fields, got {} in '{}'",
                FIELD_COUNT,
                parts.len(),
                encoded
            )));
        }

        let structural_hash = u64::from_str_radix(parts[1], 16).map_err(|e| {
            LookalikeError::MalformedKey(format!("invalid structural hash '{}': {}", parts[1], e))
        })?;
        let timestamp = parts[4].parse::<i64>().map_err(|e| {
            LookalikeError::MalformedKey(format!("invalid timestamp '{}': {}", parts[4], e))
        })?;

        Ok(RecordKey {
            content_hash: parts[0].to_string(),
            structural_hash,
            group_id: parts[2].to_string(),
            user_id: parts[3].to_string(),
            timestamp,
        })
    }
}

/// Check a single opaque field before it is embedded in a key.
pub fn validate_field(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LookalikeError::Validation(format!("{name} must not be empty")));
    }
    if value.contains(DELIMITER) {
        return Err(LookalikeError::Validation(format!(
            "{name} must not contain the reserved delimiter '{DELIMITER}'"
        )));
    }
    if value.contains(WILDCARD) {
        return Err(LookalikeError::Validation(format!(
            "{name} must not contain the wildcard character '{WILDCARD}'"
        )));
    }
    Ok(())
}

/// Layout of the persisted keyspace under a fixed prefix.
///
/// - `<prefix>:content:<content_hash>` holds the encoded key of the first
///   record seen with that content.
/// - `<prefix>:record:<encoded key>` holds the record's signature.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_field("key_prefix", &prefix)?;
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn content_key(&self, content_hash: &str) -> String {
        format!("{}{d}content{d}{}", self.prefix, content_hash, d = DELIMITER)
    }

    pub fn record_key(&self, key: &RecordKey) -> String {
        format!(
            "{}{d}record{d}{}",
            self.prefix,
            KeyCodec::encode(key),
            d = DELIMITER
        )
    }

    /// Strip the record namespace from a store key, leaving the encoded record key.
    pub fn record_id<'a>(&self, store_key: &'a str) -> Option<&'a str> {
        store_key
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(DELIMITER)?
            .strip_prefix("record")?
            .strip_prefix(DELIMITER)
    }

    /// Every record of one group, any content, structure, user or time.
    pub fn group_pattern(&self, group_id: &str) -> String {
        self.record_pattern([WILDCARD, WILDCARD, group_id, WILDCARD, WILDCARD])
    }

    /// Every record in the store.
    pub fn all_records_pattern(&self) -> String {
        self.record_pattern([WILDCARD; FIELD_COUNT])
    }

    fn record_pattern(&self, fields: [&str; FIELD_COUNT]) -> String {
        let mut pattern = format!("{}{d}record", self.prefix, d = DELIMITER);
        for field in fields {
            pattern.push(DELIMITER);
            pattern.push_str(field);
        }
        pattern
    }
}
