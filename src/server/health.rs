//! Status endpoint for liveness probes.

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Body of `GET /_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Status handler.
///
/// Always returns 200 with `{"status": "OK"}`. No authentication.
///
/// # Example
///
/// ```ignore
/// GET /_status HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"status":"OK"}
/// ```
pub async fn status_handler() -> (StatusCode, Json<StatusBody>) {
    (
        StatusCode::OK,
        Json(StatusBody {
            status: "OK".to_string(),
        }),
    )
}
