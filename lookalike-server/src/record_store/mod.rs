//! Persistent record store backends for the server.
//!
//! The in-memory backend lives in `lookalike-core`; this module adds the
//! PostgreSQL backend used in production deployments.

mod postgres;

pub use postgres::{pattern_to_regex, PostgresRecordStore};
