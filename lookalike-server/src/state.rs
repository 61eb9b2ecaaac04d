//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use lookalike_core::DuplicateDetector;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Detector owning the candidate index and the record store handle
    pub detector: Arc<DuplicateDetector>,
}

impl AppState {
    pub fn new(detector: DuplicateDetector) -> Self {
        Self {
            detector: Arc::new(detector),
        }
    }
}
