//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 document for the lookalike detection API.

use utoipa::OpenApi;

use crate::handlers::submit::StructuralHashInput;
use crate::handlers::{HealthResponse, ReadyResponse, SubmitRequest, SubmitResponse};

/// Lookalike detection API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lookalike - Duplicate Image Detection API",
        version = "0.1.0",
        description = r#"
## Group-scoped duplicate and near-duplicate image detection

Clients compute a fingerprint for each uploaded image and submit it here:

- **Content hash** - exact byte-level identity
- **Structural hash** - 64-bit hash compared by Hamming distance
- **Signature** - fixed-length set-similarity signature compared by estimated Jaccard similarity

### Statuses

| Status | Meaning |
|---|---|
| `new` | Nothing matched; the image is now recorded |
| `same` | Exact content, previously submitted by the same user in the same group |
| `duplicate` | Exact content, previously submitted by someone else (any group) |
| `similar` | Structural hash within the distance threshold, same group |
| `like` | Signature similarity above the threshold, same group |
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Detection", description = "Classify and record image fingerprints"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::submit::submit_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            SubmitRequest,
            StructuralHashInput,
            SubmitResponse,
        )
    )
)]
pub struct ApiDoc;
