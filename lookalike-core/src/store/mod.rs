//! Persistent key-value store boundary.
//!
//! The detector only needs a narrow contract from its backing store:
//!
//! - point reads and writes,
//! - a conditional write that succeeds only when the key is absent,
//! - a pattern scan where a segment consisting of [`WILDCARD`] matches any
//!   single segment value.
//!
//! Scans are linear in the number of matching keys; callers must not expect
//! better.

mod memory;

pub use memory::MemoryRecordStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::key::DELIMITER;

/// Segment wildcard used in scan patterns.
pub const WILDCARD: &str = "*";

/// Errors raised by a [`RecordStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached. Safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed a query.
    #[error("Query error: {0}")]
    Query(String),

    /// A stored value could not be read back.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Narrow get/set/scan interface over the persistent store.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Write `value` under `key` only if the key does not exist yet.
    ///
    /// Returns `true` when this call performed the write.
    async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// All keys matching `pattern`, in ascending order.
    async fn scan_by_pattern(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// Match `key` against a delimiter-separated `pattern`.
///
/// Segments equal to [`WILDCARD`] match any single segment (never spanning a
/// delimiter); every other segment must match literally.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut pattern_parts = pattern.split(DELIMITER);
    let mut key_parts = key.split(DELIMITER);
    loop {
        match (pattern_parts.next(), key_parts.next()) {
            (None, None) => return true,
            (Some(p), Some(k)) => {
                if !segment_matches(p, k) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    pattern == WILDCARD || pattern == segment
}
