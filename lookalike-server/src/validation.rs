//! Submission validation module
//!
//! Decodes and bounds-checks the wire representation of a fingerprint before
//! it reaches the detector. Field-level rules that depend on the key layout
//! (empty values, delimiter collisions) are enforced by the core library.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lookalike_core::{RecordKey, Signature};

use crate::error::ApiError;

/// Upper bound on any identifier field, in bytes.
pub const MAX_FIELD_LEN: usize = 256;

/// Parse a hex structural hash, reporting failures as a bad request.
pub fn parse_structural_hash(value: &str) -> Result<u64, ApiError> {
    RecordKey::parse_structural_hex(value).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Content hashes are hex digests; anything else is rejected up front.
pub fn validate_content_hash(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ApiError::bad_request(
            "content_hash must be a non-empty hex string",
        ));
    }
    validate_field_len("content_hash", value)
}

/// Decode a base64 signature blob into a [`Signature`].
pub fn decode_signature(value: &str) -> Result<Signature, ApiError> {
    let bytes = BASE64
        .decode(value.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid base64 signature: {}", e)))?;
    Ok(Signature::decode(&bytes)?)
}

/// Reject identifier fields that are unreasonably long.
pub fn validate_field_len(name: &str, value: &str) -> Result<(), ApiError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(ApiError::bad_request(format!(
            "{} exceeds {} bytes",
            name, MAX_FIELD_LEN
        )));
    }
    Ok(())
}
