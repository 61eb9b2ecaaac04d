//! Startup reconstruction of the candidate index.
//!
//! Every persisted record holds its signature, so the in-memory index can be
//! rebuilt from a single scan of the record keyspace. Entries that cannot be
//! read back (bad key, missing value, undecodable or wrong-length signature)
//! are skipped and counted rather than aborting startup. A store that cannot
//! be scanned at all is a hard error.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::DetectorConfig;
use crate::error::{LookalikeError, Result};
use crate::index::{BandingParams, CandidateIndex};
use crate::key::{KeyCodec, KeySpace};
use crate::signature::Signature;
use crate::store::RecordStore;

/// Counters describing one bootstrap pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Record keys returned by the scan.
    pub scanned: usize,
    /// Signatures newly added to the index.
    pub indexed: usize,
    /// Entries that were unreadable and left out.
    pub skipped: usize,
}

pub struct Bootstrapper {
    store: Arc<dyn RecordStore>,
    keyspace: KeySpace,
    banding: BandingParams,
}

impl Bootstrapper {
    pub fn new(store: Arc<dyn RecordStore>, config: &DetectorConfig) -> Result<Self> {
        Ok(Self {
            store,
            keyspace: config.keyspace()?,
            banding: config.banding()?,
        })
    }

    /// Build a fresh index from the store.
    pub async fn run(&self) -> Result<(CandidateIndex, BootstrapReport)> {
        let mut index = CandidateIndex::new(self.banding);
        let report = self.populate(&mut index).await?;
        Ok((index, report))
    }

    /// Insert every readable persisted signature into `index`.
    ///
    /// Ids already present are left untouched, so repeated passes converge on
    /// the same index.
    pub async fn populate(&self, index: &mut CandidateIndex) -> Result<BootstrapReport> {
        let keys = self
            .store
            .scan_by_pattern(&self.keyspace.all_records_pattern())
            .await?;

        let mut report = BootstrapReport {
            scanned: keys.len(),
            ..Default::default()
        };

        for store_key in &keys {
            match self.load(store_key).await {
                Ok(Some((id, signature))) => match index.insert(id, signature) {
                    Ok(true) => report.indexed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(key = %store_key, error = %e, "Skipping unindexable signature");
                        report.skipped += 1;
                    }
                },
                Ok(None) => {
                    warn!(key = %store_key, "Record vanished during bootstrap, skipping");
                    report.skipped += 1;
                }
                Err(LookalikeError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(key = %store_key, error = %e, "Skipping unreadable record");
                    report.skipped += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            indexed = report.indexed,
            skipped = report.skipped,
            "Candidate index bootstrapped"
        );
        Ok(report)
    }

    async fn load(&self, store_key: &str) -> Result<Option<(String, Signature)>> {
        let id = self
            .keyspace
            .record_id(store_key)
            .ok_or_else(|| LookalikeError::MalformedKey(store_key.to_string()))?;
        KeyCodec::decode(id)?;

        let Some(raw) = self.store.get(store_key).await? else {
            return Ok(None);
        };
        let signature = Signature::decode(&raw)?;
        Ok(Some((id.to_string(), signature)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RecordKey;
    use crate::store::MemoryRecordStore;

    fn config() -> DetectorConfig {
        DetectorConfig {
            signature_len: 4,
            key_prefix: "boot".into(),
            ..Default::default()
        }
    }

    fn record(content: &str) -> RecordKey {
        RecordKey {
            content_hash: content.into(),
            structural_hash: 1,
            group_id: "g".into(),
            user_id: "u".into(),
            timestamp: 10,
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let (index, report) = Bootstrapper::new(store, &config()).unwrap().run().await.unwrap();
        assert!(index.is_empty());
        assert_eq!(report, BootstrapReport::default());
    }

    #[tokio::test]
    async fn test_skips_bad_entries_and_keeps_going() {
        let store = Arc::new(MemoryRecordStore::new());
        let space = config().keyspace().unwrap();

        let good = Signature::new(vec![1, 2, 3, 4]);
        store.set(&space.record_key(&record("a")), &good.encode()).await.unwrap();
        store.set(&space.record_key(&record("b")), b"\x7fgarbage").await.unwrap();
        let short = Signature::new(vec![1, 2]);
        store.set(&space.record_key(&record("c")), &short.encode()).await.unwrap();
        store.set("boot:record:x:nothex:g:u:1", &good.encode()).await.unwrap();

        let (index, report) = Bootstrapper::new(store, &config()).unwrap().run().await.unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped, 3);
        assert!(index.contains(&KeyCodec::encode(&record("a"))));
    }

    #[tokio::test]
    async fn test_populate_is_idempotent() {
        let store = Arc::new(MemoryRecordStore::new());
        let space = config().keyspace().unwrap();
        for content in ["a", "b"] {
            store
                .set(
                    &space.record_key(&record(content)),
                    &Signature::new(vec![1, 2, 3, 4]).encode(),
                )
                .await
                .unwrap();
        }

        let bootstrapper = Bootstrapper::new(store, &config()).unwrap();
        let (mut index, first) = bootstrapper.run().await.unwrap();
        let second = bootstrapper.populate(&mut index).await.unwrap();

        assert_eq!(first.indexed, 2);
        assert_eq!(second.indexed, 0);
        assert_eq!(second.skipped, 0);
        assert_eq!(index.len(), 2);
    }
}
