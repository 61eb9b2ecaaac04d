//! Lookalike Core - group-scoped duplicate and near-duplicate image detection
//!
//! Clients submit a fingerprint of an image (an exact content hash, a 64-bit
//! structural hash and a set-similarity signature). The detector classifies
//! the image against everything previously seen and reports who first
//! submitted a match.
//!
//! # Components
//!
//! - [`KeyCodec`] / [`KeySpace`]: record key encoding and store layout
//! - [`similarity`]: Hamming distance, Jaccard estimate, thresholds
//! - [`CandidateIndex`]: banded signature index for approximate lookup
//! - [`RecordStore`]: narrow async get/set/scan boundary to persistence
//! - [`DuplicateDetector`]: the classification pipeline
//! - [`Bootstrapper`]: rebuilds the index from the store at startup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lookalike_core::{
//!     DetectorConfig, DuplicateDetector, MemoryRecordStore, RecordKey, Signature, Status,
//!     Submission,
//! };
//!
//! # async fn example() -> lookalike_core::Result<()> {
//! let store = Arc::new(MemoryRecordStore::new());
//! let (detector, _report) = DuplicateDetector::bootstrap(store, DetectorConfig::default()).await?;
//!
//! let submission = Submission {
//!     key: RecordKey {
//!         content_hash: "9e107d9d372bb6826bd81d3542a419d6".into(),
//!         structural_hash: 0x8f37_1c0e_a5d2_6b49,
//!         group_id: "room-1".into(),
//!         user_id: "alice".into(),
//!         timestamp: 1_700_000_000,
//!     },
//!     signature: Signature::new((0..128).collect()),
//! };
//!
//! let outcome = detector.submit(&submission).await?;
//! assert_eq!(outcome.status(), Status::New);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod detector;
pub mod error;
pub mod index;
pub mod key;
pub mod signature;
pub mod similarity;
pub mod store;

// Re-export main types for convenience
pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use config::{DetectorConfig, DEFAULT_KEY_PREFIX, DEFAULT_SIGNATURE_LEN};
pub use detector::{Classification, DuplicateDetector, Provenance, Status, Submission};
pub use error::{LookalikeError, Result};
pub use index::{BandingParams, CandidateIndex};
pub use key::{KeyCodec, KeySpace, RecordKey, DELIMITER};
pub use signature::Signature;
pub use similarity::{hamming_distance, jaccard_estimate, Thresholds};
pub use store::{MemoryRecordStore, RecordStore, StoreError};
