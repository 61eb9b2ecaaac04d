//! In-memory banded signature index.
//!
//! Every inserted signature is cut into bands according to
//! [`BandingParams`]; each band's component values form a bucket key. A query
//! returns every id that shares at least one whole band with the query
//! signature. These are *candidates*: the true similarity still has to be
//! checked with [`jaccard_estimate`](crate::similarity::jaccard_estimate).
//!
//! The index does no I/O and no locking of its own. Callers that share it
//! across tasks wrap it in a read-write lock (see
//! [`DuplicateDetector`](crate::detector::DuplicateDetector)).

pub mod banding;

pub use banding::BandingParams;

use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::signature::Signature;
use crate::similarity::jaccard_estimate;

/// Approximate-similarity index keyed by opaque string ids.
#[derive(Debug)]
pub struct CandidateIndex {
    params: BandingParams,
    /// One bucket table per band: band values -> entry slots.
    buckets: Vec<HashMap<Vec<u64>, Vec<usize>>>,
    ids: Vec<String>,
    signatures: Vec<Signature>,
    slots: HashMap<String, usize>,
}

impl CandidateIndex {
    pub fn new(params: BandingParams) -> Self {
        Self {
            params,
            buckets: (0..params.bands).map(|_| HashMap::new()).collect(),
            ids: Vec::new(),
            signatures: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn params(&self) -> BandingParams {
        self.params
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Signature stored under `id`, if any.
    pub fn signature(&self, id: &str) -> Option<&Signature> {
        self.slots.get(id).map(|&slot| &self.signatures[slot])
    }

    /// Register `signature` under `id`.
    ///
    /// Returns `Ok(false)` without touching the index when `id` is already
    /// present; the first signature registered for an id is kept.
    pub fn insert(&mut self, id: impl Into<String>, signature: Signature) -> Result<bool> {
        signature.ensure_len(self.params.signature_len())?;

        let id = id.into();
        if self.slots.contains_key(&id) {
            tracing::debug!(id = %id, "Signature already indexed, skipping");
            return Ok(false);
        }

        let slot = self.ids.len();
        for (band, values) in signature.values().chunks(self.params.rows).enumerate() {
            self.buckets[band]
                .entry(values.to_vec())
                .or_default()
                .push(slot);
        }

        self.slots.insert(id.clone(), slot);
        self.ids.push(id);
        self.signatures.push(signature);
        Ok(true)
    }

    /// Ids sharing at least one band with `signature`, in ascending order.
    pub fn query(&self, signature: &Signature) -> Result<Vec<&str>> {
        Ok(self
            .candidate_slots(signature)?
            .into_iter()
            .map(|slot| self.ids[slot].as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    /// Candidates paired with their Jaccard estimate, best first.
    ///
    /// Equal similarities are ordered by id so the result is deterministic.
    pub fn query_with_similarity(&self, signature: &Signature) -> Result<Vec<(&str, f64)>> {
        let mut scored = Vec::new();
        for slot in self.candidate_slots(signature)? {
            let similarity = jaccard_estimate(signature.values(), self.signatures[slot].values())?;
            scored.push((self.ids[slot].as_str(), similarity));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        Ok(scored)
    }

    fn candidate_slots(&self, signature: &Signature) -> Result<BTreeSet<usize>> {
        signature.ensure_len(self.params.signature_len())?;

        let mut slots = BTreeSet::new();
        for (band, values) in signature.values().chunks(self.params.rows).enumerate() {
            if let Some(hits) = self.buckets[band].get(values) {
                slots.extend(hits.iter().copied());
            }
        }
        Ok(slots)
    }
}
