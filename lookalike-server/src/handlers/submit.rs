//! Submission handler
//!
//! Handles POST /submit requests: classify a fingerprint and record it when new.

use axum::{extract::State, Json};
use lookalike_core::{Classification, RecordKey, Submission};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{
    decode_signature, parse_structural_hash, validate_content_hash, validate_field_len,
};

/// Fingerprint of one uploaded image.
#[derive(Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Exact content hash of the image bytes.
    #[schema(example = "9e107d9d372bb6826bd81d3542a419d6")]
    pub content_hash: String,

    /// 64-bit structural hash: a hex string (up to 16 digits) or a decimal JSON integer.
    #[schema(example = "8f371c0ea5d26b49")]
    pub structural_hash: StructuralHashInput,

    /// Base64-encoded signature blob (format tag followed by little-endian components).
    #[schema(example = "AQAAAAABAAAA...")]
    pub signature: String,

    /// Scope within which near-duplicates are reported.
    #[schema(example = "room-1")]
    pub group_id: String,

    /// Submitter identity.
    #[schema(example = "alice")]
    pub user_id: String,

    /// Submission time in seconds since the epoch (default: now).
    #[serde(default)]
    #[schema(example = 1767225600)]
    pub timestamp: Option<i64>,
}

/// Structural hash as sent on the wire.
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum StructuralHashInput {
    /// Decimal integer
    Decimal(u64),
    /// Hex string, optional `0x` prefix
    Hex(String),
}

impl StructuralHashInput {
    fn resolve(&self) -> Result<u64, ApiError> {
        match self {
            Self::Decimal(value) => Ok(*value),
            Self::Hex(text) => parse_structural_hash(text),
        }
    }
}

/// Classification outcome.
///
/// Provenance fields are present for every status except `new`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// One of `new`, `same`, `duplicate`, `similar`, `like`.
    #[schema(example = "similar")]
    pub status: String,

    /// Group of the first submission of the matched image.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "room-1")]
    pub group_id: Option<String>,

    /// User who first submitted the matched image.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "bob")]
    pub user_id: Option<String>,

    /// Timestamp of the matched submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 1767225000)]
    pub timestamp: Option<i64>,

    /// Structural Hamming distance (`similar` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 3)]
    pub hamming_distance: Option<u32>,

    /// Estimated signature similarity (`like` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.25)]
    pub similarity: Option<f64>,

    /// Structural hash of the matched record, hex-encoded (`like` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "8f371c0ea5d26b49")]
    pub structural_hash: Option<String>,
}

impl From<Classification> for SubmitResponse {
    fn from(classification: Classification) -> Self {
        let mut response = Self {
            status: classification.status().to_string(),
            group_id: None,
            user_id: None,
            timestamp: None,
            hamming_distance: None,
            similarity: None,
            structural_hash: None,
        };

        if let Some(provenance) = classification.provenance() {
            response.group_id = Some(provenance.group_id.clone());
            response.user_id = Some(provenance.user_id.clone());
            response.timestamp = Some(provenance.timestamp);
        }

        match classification {
            Classification::Similar {
                hamming_distance, ..
            } => response.hamming_distance = Some(hamming_distance),
            Classification::Like {
                similarity,
                structural_hash,
                ..
            } => {
                response.similarity = Some(similarity);
                response.structural_hash = Some(format!("{:016x}", structural_hash));
            }
            _ => {}
        }

        response
    }
}

/// Classify an image fingerprint and record it if it has not been seen.
///
/// Checks run in order and the first hit wins:
/// 1. exact content hash anywhere (`same` / `duplicate`)
/// 2. structural hash within the group (`similar`)
/// 3. signature similarity within the group (`like`)
///
/// Otherwise the image is stored and `new` is returned.
#[utoipa::path(
    post,
    path = "/submit",
    tag = "Detection",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Classification result", body = SubmitResponse),
        (status = 400, description = "Invalid fingerprint (bad encoding, wrong signature length, reserved characters)"),
        (status = 503, description = "Record store unavailable, safe to retry")
    )
)]
pub async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    validate_content_hash(&request.content_hash)?;
    validate_field_len("group_id", &request.group_id)?;
    validate_field_len("user_id", &request.user_id)?;

    let submission = Submission {
        key: RecordKey {
            content_hash: request.content_hash,
            structural_hash: request.structural_hash.resolve()?,
            group_id: request.group_id,
            user_id: request.user_id,
            timestamp: request
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
        },
        signature: decode_signature(&request.signature)?,
    };

    let classification = state.detector.submit(&submission).await?;
    Ok(Json(classification.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookalike_core::Provenance;

    fn provenance() -> Provenance {
        Provenance {
            group_id: "g".into(),
            user_id: "u".into(),
            timestamp: 7,
        }
    }

    #[test]
    fn test_structural_hash_accepts_hex_and_decimal() {
        let hex: StructuralHashInput = serde_json::from_str(r#""ff""#).unwrap();
        assert_eq!(hex.resolve().unwrap(), 255);

        let decimal: StructuralHashInput = serde_json::from_str("255").unwrap();
        assert_eq!(decimal.resolve().unwrap(), 255);

        let max: StructuralHashInput = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(max.resolve().unwrap(), u64::MAX);
    }

    #[test]
    fn test_new_has_no_provenance() {
        let json = serde_json::to_value(SubmitResponse::from(Classification::New)).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "new" }));
    }

    #[test]
    fn test_like_response_fields() {
        let response = SubmitResponse::from(Classification::Like {
            provenance: provenance(),
            similarity: 0.25,
            structural_hash: 0xabc,
        });
        assert_eq!(response.status, "like");
        assert_eq!(response.similarity, Some(0.25));
        assert_eq!(response.structural_hash.as_deref(), Some("0000000000000abc"));
        assert_eq!(response.hamming_distance, None);
        assert_eq!(response.group_id.as_deref(), Some("g"));
    }

    #[test]
    fn test_similar_response_fields() {
        let response = SubmitResponse::from(Classification::Similar {
            provenance: provenance(),
            hamming_distance: 3,
        });
        assert_eq!(response.status, "similar");
        assert_eq!(response.hamming_distance, Some(3));
        assert_eq!(response.timestamp, Some(7));
        assert!(response.similarity.is_none());
    }
}
