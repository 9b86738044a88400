//! GitHub webhook payload parser.
//!
//! Turns an event type and raw JSON body into a [`SyncRequest`].
//!
//! # Parsing Strategy
//!
//! 1. The event type comes from the `X-GitHub-Event` header
//! 2. Anything other than `push` (including a missing header) is `Ignore`, and
//!    the body is not looked at
//! 3. Push payloads must carry `ref` and `repository.clone_url`; otherwise
//!    parsing fails with details

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sync::SyncRequest;
use crate::types::{Branch, RepositoryRef};

/// The event type GitHub sends for branch pushes, creations and deletions.
pub const PUSH_EVENT: &str = "push";

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The ref has no usable third segment.
    #[error("invalid ref: {0:?}")]
    InvalidRef(String),
}

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    /// Only an explicit `true` marks a deletion.
    #[serde(default)]
    deleted: Option<bool>,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    clone_url: String,
}

/// Classifies a webhook delivery.
///
/// Working copies live under `base`, one directory per branch.
///
/// # Returns
///
/// * `Ok(SyncRequest::Ignore)` - not a push event
/// * `Ok(SyncRequest::Delete(_))` - push with `deleted: true`
/// * `Ok(SyncRequest::Update(_))` - any other push
/// * `Err(e)` - push with a malformed payload
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use puppet_webhook::sync::SyncRequest;
/// use puppet_webhook::webhooks::classify;
///
/// let body = br#"{
///     "ref": "refs/heads/production",
///     "deleted": false,
///     "repository": { "clone_url": "https://github.com/acme/puppet.git" }
/// }"#;
///
/// let request = classify(Some("push"), body, Path::new("/code/environments")).unwrap();
/// assert!(matches!(request, SyncRequest::Update(_)));
///
/// let ignored = classify(Some("ping"), b"{}", Path::new("/code/environments")).unwrap();
/// assert_eq!(ignored, SyncRequest::Ignore);
/// ```
pub fn classify(
    event_type: Option<&str>,
    body: &[u8],
    base: &Path,
) -> Result<SyncRequest, ParseError> {
    if event_type != Some(PUSH_EVENT) {
        return Ok(SyncRequest::Ignore);
    }

    let raw: RawPushPayload = serde_json::from_slice(body)?;
    let branch = Branch::from_ref(&raw.git_ref).ok_or(ParseError::InvalidRef(raw.git_ref))?;
    let repo = RepositoryRef::new(base, branch, raw.repository.clone_url);

    if raw.deleted == Some(true) {
        Ok(SyncRequest::Delete(repo))
    } else {
        Ok(SyncRequest::Update(repo))
    }
}
