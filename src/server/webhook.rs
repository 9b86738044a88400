//! Webhook endpoint handler.
//!
//! Authenticates the delivery, classifies it, and applies it to the working
//! copies before responding. The response reports the outcome of the git
//! operations, so GitHub's delivery log shows whether the sync worked.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::AppState;
use crate::effects::GitInterpreter;
use crate::sync::SyncError;
use crate::webhooks::{AuthError, ParseError, check_auth, classify};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";

/// Query parameters of the webhook URL.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookQuery {
    /// Shared secret.
    pub auth: Option<String>,
}

/// JSON body of every webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        MessageBody {
            message: message.into(),
        }
    }
}

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or wrong `auth` token.
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Push payload could not be interpreted.
    #[error("invalid push payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// A git operation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Sync(e) => e.status(),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageBody::new(self.to_string()))).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Query: `auth=<token>`
/// - Header `X-GitHub-Event`: event type; anything but `push` is ignored
/// - Body: JSON push payload (`ref`, `deleted`, `repository.clone_url`)
///
/// # Response
///
/// All responses are `{"message": ...}`.
///
/// - 200 OK: event applied (or ignored)
/// - 400 Bad Request: malformed push payload
/// - 401 Unauthorized: bad token (`Access Denied`)
/// - 500 Internal Server Error: a git step failed (`Failed to <Op> <branch>`)
///
/// # Example
///
/// ```ignore
/// POST /puppet-webhook?auth=s3cret HTTP/1.1
/// X-GitHub-Event: push
/// Content-Type: application/json
///
/// {"ref": "refs/heads/feature-x", "deleted": false, "repository": {"clone_url": "..."}}
///
/// HTTP/1.1 200 OK
///
/// {"message": "Git Clone and Checkout of feature-x Successful"}
/// ```
pub async fn webhook_handler<G>(
    State(app_state): State<AppState<G>>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageBody>, WebhookError>
where
    G: GitInterpreter + Send + Sync + 'static,
{
    // Authenticate before parsing anything.
    if let Err(e) = check_auth(query.auth.as_deref(), app_state.auth_token()) {
        warn!("Rejected webhook with invalid auth token");
        return Err(e.into());
    }

    let event_type = headers.get(HEADER_EVENT).and_then(|v| v.to_str().ok());
    debug!(event_type = ?event_type, "Received webhook");
    trace!(body = %String::from_utf8_lossy(&body), "Webhook body");

    let request = classify(event_type, &body, app_state.environments_dir())
        .inspect_err(|e| warn!(error = %e, "Malformed push payload"))?;

    if let Some(repo) = request.repository() {
        debug!(
            branch = %repo.branch,
            path = %repo.path.display(),
            url = %repo.url,
            "Push target"
        );
    }

    let outcome = app_state
        .syncer()
        .apply(request)
        .await
        .inspect_err(|e| warn!(error = %e, "Sync failed"))?;

    info!(message = %outcome, "Webhook handled");
    Ok(Json(MessageBody::new(outcome.message())))
}
