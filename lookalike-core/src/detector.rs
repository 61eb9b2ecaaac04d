//! Submission classification.
//!
//! A submission is checked in a fixed order; the first check that fires
//! decides the outcome:
//!
//! 1. **Exact** content-hash match anywhere, regardless of group
//!    ([`Status::Same`] for the same submitter, [`Status::Duplicate`]
//!    otherwise).
//! 2. **Structural** match: smallest Hamming distance to any record of the
//!    same group is within `max_hamming` ([`Status::Similar`]).
//! 3. **Signature** match: best candidate from the banded index reaches
//!    `min_jaccard` and belongs to the same group ([`Status::Like`]).
//! 4. Otherwise the submission is [`Status::New`]; [`DuplicateDetector::submit`]
//!    persists it and indexes its signature.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::bootstrap::{BootstrapReport, Bootstrapper};
use crate::config::DetectorConfig;
use crate::error::{LookalikeError, Result};
use crate::index::CandidateIndex;
use crate::key::{KeyCodec, KeySpace, RecordKey};
use crate::signature::Signature;
use crate::similarity::hamming_distance;
use crate::store::{RecordStore, StoreError};

/// Fingerprint of one image as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub key: RecordKey,
    pub signature: Signature,
}

/// Who first submitted a matched image, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub group_id: String,
    pub user_id: String,
    pub timestamp: i64,
}

impl From<&RecordKey> for Provenance {
    fn from(key: &RecordKey) -> Self {
        Self {
            group_id: key.group_id.clone(),
            user_id: key.user_id.clone(),
            timestamp: key.timestamp,
        }
    }
}

/// Outcome status reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Duplicate,
    Similar,
    Like,
    Same,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Duplicate => "duplicate",
            Self::Similar => "similar",
            Self::Like => "like",
            Self::Same => "same",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    New,
    /// Same content previously submitted by the same group and user.
    Same(Provenance),
    /// Same content previously submitted elsewhere.
    Duplicate(Provenance),
    Similar {
        provenance: Provenance,
        hamming_distance: u32,
    },
    Like {
        provenance: Provenance,
        similarity: f64,
        structural_hash: u64,
    },
}

impl Classification {
    pub fn status(&self) -> Status {
        match self {
            Self::New => Status::New,
            Self::Same(_) => Status::Same,
            Self::Duplicate(_) => Status::Duplicate,
            Self::Similar { .. } => Status::Similar,
            Self::Like { .. } => Status::Like,
        }
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            Self::New => None,
            Self::Same(p) | Self::Duplicate(p) => Some(p),
            Self::Similar { provenance, .. } | Self::Like { provenance, .. } => Some(provenance),
        }
    }
}

/// Orchestrates the exact, structural and signature checks over a
/// [`RecordStore`] and a shared [`CandidateIndex`].
pub struct DuplicateDetector {
    store: Arc<dyn RecordStore>,
    index: RwLock<CandidateIndex>,
    keyspace: KeySpace,
    config: DetectorConfig,
}

impl DuplicateDetector {
    /// Wrap an already populated index.
    pub fn new(
        store: Arc<dyn RecordStore>,
        index: CandidateIndex,
        config: DetectorConfig,
    ) -> Result<Self> {
        config.validate()?;
        if index.params().signature_len() != config.signature_len {
            return Err(LookalikeError::InvalidParameter(format!(
                "index partitions {} components but signature_len is {}",
                index.params().signature_len(),
                config.signature_len
            )));
        }

        Ok(Self {
            store,
            index: RwLock::new(index),
            keyspace: config.keyspace()?,
            config,
        })
    }

    /// Rebuild the candidate index from the store, then construct the detector.
    ///
    /// Fails if the store cannot be scanned; individual unreadable entries are
    /// skipped and counted in the report.
    pub async fn bootstrap(
        store: Arc<dyn RecordStore>,
        config: DetectorConfig,
    ) -> Result<(Self, BootstrapReport)> {
        let (index, report) = Bootstrapper::new(store.clone(), &config)?.run().await?;
        Ok((Self::new(store, index, config)?, report))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Number of signatures currently indexed.
    pub async fn indexed_count(&self) -> usize {
        self.index.read().await.len()
    }

    /// Classify without persisting anything.
    pub async fn classify(&self, submission: &Submission) -> Result<Classification> {
        self.validate(submission)?;

        if let Some(found) = self.exact_match(submission).await? {
            return Ok(found);
        }
        if let Some(found) = self.structural_match(submission).await? {
            return Ok(found);
        }
        if let Some(found) = self.signature_match(submission).await? {
            return Ok(found);
        }
        Ok(Classification::New)
    }

    /// Classify and, when the image is new, persist and index it.
    pub async fn submit(&self, submission: &Submission) -> Result<Classification> {
        let classification = match self.classify(submission).await? {
            Classification::New => self.persist(submission).await?,
            other => other,
        };

        info!(
            status = %classification.status(),
            group_id = %submission.key.group_id,
            user_id = %submission.key.user_id,
            "Submission classified"
        );
        Ok(classification)
    }

    fn validate(&self, submission: &Submission) -> Result<()> {
        submission.key.validate()?;
        submission.signature.ensure_len(self.config.signature_len)
    }

    /// Look up who holds the content hash of `submission`.
    async fn content_claim(&self, submission: &Submission) -> Result<ContentClaim> {
        let content_key = self.keyspace.content_key(&submission.key.content_hash);
        let Some(raw) = self.store.get(&content_key).await? else {
            return Ok(ContentClaim::Absent);
        };

        let stored = decode_stored_key(&content_key, &raw)?;
        if stored == submission.key {
            let record_key = self.keyspace.record_key(&stored);
            if self.store.get(&record_key).await?.is_none() {
                return Ok(ContentClaim::Unfinished);
            }
        }
        Ok(ContentClaim::Held(stored))
    }

    async fn exact_match(&self, submission: &Submission) -> Result<Option<Classification>> {
        let stored = match self.content_claim(submission).await? {
            ContentClaim::Held(stored) => stored,
            ContentClaim::Absent | ContentClaim::Unfinished => return Ok(None),
        };

        debug!(content_hash = %submission.key.content_hash, "Exact content match");
        Ok(Some(exact_classification(submission, &stored)))
    }

    async fn structural_match(&self, submission: &Submission) -> Result<Option<Classification>> {
        let pattern = self.keyspace.group_pattern(&submission.key.group_id);
        let keys = self.store.scan_by_pattern(&pattern).await?;

        // First record reaching the running minimum wins ties.
        let mut closest: Option<(u32, RecordKey)> = None;
        for store_key in &keys {
            let Some(stored) = self.decode_record_store_key(store_key) else {
                continue;
            };
            let distance = hamming_distance(submission.key.structural_hash, stored.structural_hash);
            if closest.as_ref().map_or(true, |(best, _)| distance < *best) {
                closest = Some((distance, stored));
            }
        }

        match closest {
            Some((distance, stored)) if self.config.thresholds.is_structurally_similar(distance) => {
                debug!(
                    group_id = %submission.key.group_id,
                    distance,
                    scanned = keys.len(),
                    "Structural match"
                );
                Ok(Some(Classification::Similar {
                    provenance: Provenance::from(&stored),
                    hamming_distance: distance,
                }))
            }
            _ => Ok(None),
        }
    }

    async fn signature_match(&self, submission: &Submission) -> Result<Option<Classification>> {
        let best = {
            let index = self.index.read().await;
            index
                .query_with_similarity(&submission.signature)?
                .first()
                .map(|(id, similarity)| (id.to_string(), *similarity))
        };

        let Some((id, similarity)) = best else {
            return Ok(None);
        };
        if !self.config.thresholds.is_signature_similar(similarity) {
            return Ok(None);
        }

        let stored = KeyCodec::decode(&id)?;
        if stored.group_id != submission.key.group_id {
            debug!(
                similarity,
                matched_group = %stored.group_id,
                "Best signature match belongs to another group"
            );
            return Ok(None);
        }

        debug!(group_id = %stored.group_id, similarity, "Signature match");
        Ok(Some(Classification::Like {
            provenance: Provenance::from(&stored),
            similarity,
            structural_hash: stored.structural_hash,
        }))
    }

    async fn persist(&self, submission: &Submission) -> Result<Classification> {
        let record_id = KeyCodec::encode(&submission.key);
        let content_key = self.keyspace.content_key(&submission.key.content_hash);

        // Claim the content hash first so two concurrent uploads of the same
        // bytes cannot both become new records.
        if !self
            .store
            .set_if_absent(&content_key, record_id.as_bytes())
            .await?
        {
            match self.content_claim(submission).await? {
                // An earlier attempt of this exact submission claimed the
                // content but never wrote its record.
                ContentClaim::Unfinished => {
                    warn!(
                        content_hash = %submission.key.content_hash,
                        "Completing interrupted persist"
                    );
                }
                ContentClaim::Held(stored) => {
                    info!(
                        content_hash = %submission.key.content_hash,
                        "Content claimed concurrently, reporting exact match"
                    );
                    return Ok(exact_classification(submission, &stored));
                }
                ContentClaim::Absent => {
                    return Err(StoreError::Query(format!(
                        "{content_key} vanished after a failed claim"
                    ))
                    .into());
                }
            }
        }

        let record_key = self.keyspace.record_key(&submission.key);
        self.store
            .set(&record_key, &submission.signature.encode())
            .await?;

        let mut index = self.index.write().await;
        index.insert(record_id, submission.signature.clone())?;
        Ok(Classification::New)
    }

    fn decode_record_store_key(&self, store_key: &str) -> Option<RecordKey> {
        let decoded = self
            .keyspace
            .record_id(store_key)
            .ok_or_else(|| LookalikeError::MalformedKey(store_key.to_string()))
            .and_then(KeyCodec::decode);
        match decoded {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(key = %store_key, error = %e, "Skipping malformed record key");
                None
            }
        }
    }
}

/// `Same` for the original submitter, `Duplicate` for anyone else.
fn exact_classification(submission: &Submission, stored: &RecordKey) -> Classification {
    let provenance = Provenance::from(stored);
    if stored.group_id == submission.key.group_id && stored.user_id == submission.key.user_id {
        Classification::Same(provenance)
    } else {
        Classification::Duplicate(provenance)
    }
}

/// State of the content-hash index entry for a submission.
enum ContentClaim {
    Absent,
    /// Claimed by this exact submission, but its record was never written.
    Unfinished,
    Held(RecordKey),
}

fn decode_stored_key(store_key: &str, raw: &[u8]) -> Result<RecordKey> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        StoreError::Serialization(format!("{store_key} holds non UTF-8 data: {e}"))
    })?;
    KeyCodec::decode(text)
        .map_err(|e| StoreError::Serialization(format!("{store_key} holds a bad key: {e}")).into())
}

impl fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("backend", &self.store.backend_name())
            .field("config", &self.config)
            .finish()
    }
}
