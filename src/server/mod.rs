//! HTTP server for the webhook receiver.
//!
//! # Endpoints
//!
//! - `POST /puppet-webhook?auth=<token>` - Applies a GitHub push to the working copies
//! - `GET /_status` - Returns `{"status": "OK"}` if the server is running

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

use crate::config::Config;
use crate::effects::GitInterpreter;
use crate::sync::Syncer;

pub mod health;
pub mod webhook;

pub use health::{StatusBody, status_handler};
pub use webhook::{MessageBody, WebhookError, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

// Manual impl: cloning shares the Arc and must not require `G: Clone`.
impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<G> {
    /// Shared secret expected in the `auth` query parameter.
    auth_token: String,

    /// Base directory of the branch working copies.
    /// Structure: `<environments_dir>/<branch>/`
    environments_dir: PathBuf,

    /// Applies sync requests; owns the per-branch locks.
    syncer: Syncer<G>,
}

impl<G> AppState<G>
where
    G: GitInterpreter + Sync,
{
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `auth_token` - Secret callers must present
    /// * `environments_dir` - Base directory for working copies
    /// * `syncer` - Sync state machine (shared with the startup bootstrap)
    pub fn new(
        auth_token: impl Into<String>,
        environments_dir: impl Into<PathBuf>,
        syncer: Syncer<G>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                auth_token: auth_token.into(),
                environments_dir: environments_dir.into(),
                syncer,
            }),
        }
    }

    /// Creates the state from validated configuration.
    pub fn from_config(config: &Config, syncer: Syncer<G>) -> Self {
        Self::new(
            config.auth_token.clone(),
            config.environments_dir.clone(),
            syncer,
        )
    }

    pub fn auth_token(&self) -> &str {
        &self.inner.auth_token
    }

    pub fn environments_dir(&self) -> &Path {
        &self.inner.environments_dir
    }

    pub fn syncer(&self) -> &Syncer<G> {
        &self.inner.syncer
    }
}

/// Span for one request in the access log.
///
/// Only the path is recorded: the query string carries the `auth` token.
fn access_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G>(app_state: AppState<G>) -> axum::Router
where
    G: GitInterpreter + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/puppet-webhook", post(webhook_handler::<G>))
        .route("/_status", get(status_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(access_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(app_state)
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::log_filter;
    use crate::effects::{GitEffect, GitEffectKind};
    use crate::test_utils::RecordingGitInterpreter;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;
    use tracing_subscriber::EnvFilter;

    const SECRET: &str = "test-secret";
    const URL: &str = "https://example.com/r.git";

    /// Creates a router backed by a recording interpreter and a temporary base directory.
    fn test_app(git: RecordingGitInterpreter) -> (axum::Router, TempDir) {
        let base = tempdir().unwrap();
        let state = AppState::new(SECRET, base.path(), Syncer::new(git));
        (build_router(state), base)
    }

    fn webhook_request(auth: Option<&str>, event_type: Option<&str>, body: &serde_json::Value) -> Request<Body> {
        let uri = match auth {
            Some(token) => format!("/puppet-webhook?auth={}", token),
            None => "/puppet-webhook".to_string(),
        };
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(event_type) = event_type {
            builder = builder.header("x-github-event", event_type);
        }
        builder
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn push_body(branch: &str, deleted: bool) -> serde_json::Value {
        json!({
            "ref": format!("refs/heads/{}", branch),
            "deleted": deleted,
            "repository": { "clone_url": URL }
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ─── Status endpoint ───

    #[tokio::test]
    async fn status_returns_ok_json() {
        let (app, _base) = test_app(RecordingGitInterpreter::new());

        let request = Request::builder()
            .uri("/_status")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "OK" }));
    }

    // ─── Access log ───

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Sends `request` with a subscriber filtered like the default `LOG_LEVEL=info`.
    async fn logs_at_default_level(request: Request<Body>) -> (StatusCode, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(log_filter("info").unwrap()))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (app, _base) = test_app(RecordingGitInterpreter::new());
        let status = app.oneshot(request).await.unwrap().status();
        (status, logs.contents())
    }

    #[tokio::test]
    async fn requests_are_logged_at_default_level() {
        let request = Request::builder()
            .uri("/_status")
            .body(Body::empty())
            .unwrap();
        let (status, logs) = logs_at_default_level(request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.contains("finished processing request"), "logs: {logs}");
        assert!(logs.contains("path=/_status"), "logs: {logs}");
        assert!(logs.contains("status=200"), "logs: {logs}");
    }

    #[tokio::test]
    async fn access_log_omits_auth_token() {
        let request = webhook_request(Some(SECRET), Some("ping"), &json!({}));
        let (status, logs) = logs_at_default_level(request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.contains("path=/puppet-webhook"), "logs: {logs}");
        assert!(!logs.contains(SECRET), "logs: {logs}");
    }

    // ─── Authentication ───

    #[tokio::test]
    async fn wrong_token_is_denied_without_git() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some("wrong"), Some("push"), &push_body("main", false));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({ "message": "Access Denied" }));
        assert!(git.effects().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_denied() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(None, Some("push"), &push_body("main", true));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(git.effects().is_empty());
    }

    #[tokio::test]
    async fn auth_is_checked_before_body_parsing() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/puppet-webhook?auth=wrong")
            .header("x-github-event", "push")
            .body(Body::from("not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ─── Event handling ───

    #[tokio::test]
    async fn push_to_new_branch_clones_and_checks_out() {
        let git = RecordingGitInterpreter::new();
        let (app, base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("push"), &push_body("feature-x", false));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Git Clone and Checkout of feature-x Successful" })
        );
        let path = base.path().join("feature-x");
        assert_eq!(
            git.effects(),
            vec![
                GitEffect::Clone {
                    url: URL.to_string(),
                    path: path.clone()
                },
                GitEffect::Checkout {
                    path,
                    target: "feature-x".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn push_to_existing_branch_pulls() {
        let git = RecordingGitInterpreter::new();
        let (app, base) = test_app(git.clone());
        std::fs::create_dir(base.path().join("feature-x")).unwrap();

        let request = webhook_request(Some(SECRET), Some("push"), &push_body("feature-x", false));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Git Pull of feature-x Successful" })
        );
        assert_eq!(
            git.effects(),
            vec![GitEffect::Pull {
                path: base.path().join("feature-x")
            }]
        );
    }

    #[tokio::test]
    async fn deleted_push_removes_working_copy() {
        let git = RecordingGitInterpreter::new();
        let (app, base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("push"), &push_body("old", true));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "old Delete Successful" })
        );
        assert_eq!(
            git.effects(),
            vec![GitEffect::Remove {
                path: base.path().join("old")
            }]
        );
    }

    #[tokio::test]
    async fn clone_failure_returns_500_and_skips_checkout() {
        let git = RecordingGitInterpreter::failing_on(GitEffectKind::Clone);
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("push"), &push_body("feature-x", false));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Failed to Clone feature-x" })
        );
        assert_eq!(git.kinds(), vec![GitEffectKind::Clone]);
    }

    #[tokio::test]
    async fn delete_failure_returns_500() {
        let git = RecordingGitInterpreter::failing_on(GitEffectKind::Remove);
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("push"), &push_body("old", true));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Failed to Delete old" })
        );
    }

    #[tokio::test]
    async fn non_push_event_is_a_no_op() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("ping"), &json!({ "zen": "Keep it logically awesome." }));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Not a push message. Doing nothing." })
        );
        assert!(git.effects().is_empty());
    }

    #[tokio::test]
    async fn missing_event_header_is_a_no_op() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), None, &push_body("main", false));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(git.effects().is_empty());
    }

    #[tokio::test]
    async fn malformed_push_returns_400_without_git() {
        let git = RecordingGitInterpreter::new();
        let (app, _base) = test_app(git.clone());

        let request = webhook_request(Some(SECRET), Some("push"), &json!({ "ref": "refs/heads/main" }));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().starts_with("invalid push payload"));
        assert!(git.effects().is_empty());
    }
}
