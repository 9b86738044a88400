//! Branch synchronization state machine.
//!
//! There is no stored state: the action for a request depends only on its
//! disposition and on whether the working copy exists when the branch lock is
//! taken.
//!
//! | Disposition | Path exists? | Action                 |
//! |-------------|--------------|------------------------|
//! | Deleted     | -            | remove recursively     |
//! | Changed     | yes          | pull                   |
//! | Changed     | no           | clone, then checkout   |
//! | Ignore      | -            | nothing                |
//!
//! Every git operation is attempted once. A failure ends the request and
//! nothing already done is rolled back (a failed checkout leaves the clone on
//! disk).

mod locks;

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::effects::{GitEffect, GitInterpreter};
use crate::types::{Branch, RepositoryRef, SyncDisposition};

pub use locks::BranchLocks;

/// Message returned for events that are not pushes.
pub const NOT_A_PUSH_MESSAGE: &str = "Not a push message. Doing nothing.";

/// A classified inbound event, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// Not a push; no git work.
    Ignore,
    /// Remove the branch's working copy.
    Delete(RepositoryRef),
    /// Clone or pull the branch's working copy.
    Update(RepositoryRef),
}

impl SyncRequest {
    pub fn disposition(&self) -> SyncDisposition {
        match self {
            SyncRequest::Ignore => SyncDisposition::Ignore,
            SyncRequest::Delete(_) => SyncDisposition::Deleted,
            SyncRequest::Update(_) => SyncDisposition::Changed,
        }
    }

    pub fn repository(&self) -> Option<&RepositoryRef> {
        match self {
            SyncRequest::Ignore => None,
            SyncRequest::Delete(repo) | SyncRequest::Update(repo) => Some(repo),
        }
    }
}

/// Success message of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome(pub String);

impl SyncOutcome {
    pub fn message(&self) -> &str {
        &self.0
    }

    fn ignored() -> Self {
        SyncOutcome(NOT_A_PUSH_MESSAGE.to_string())
    }

    fn deleted(branch: &Branch) -> Self {
        SyncOutcome(format!("{} Delete Successful", branch))
    }

    fn cloned(branch: &Branch) -> Self {
        SyncOutcome(format!("Git Clone and Checkout of {} Successful", branch))
    }

    fn pulled(branch: &Branch) -> Self {
        SyncOutcome(format!("Git Pull of {} Successful", branch))
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOperation {
    Clone,
    Checkout,
    Pull,
    Delete,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncOperation::Clone => "Clone",
            SyncOperation::Checkout => "Checkout",
            SyncOperation::Pull => "Pull",
            SyncOperation::Delete => "Delete",
        };
        f.write_str(s)
    }
}

/// A failed sync step.
///
/// The display text is the message shown to webhook callers; the underlying
/// git error is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {operation} {branch}")]
pub struct SyncError {
    pub operation: SyncOperation,
    pub branch: Branch,
}

impl SyncError {
    fn new(operation: SyncOperation, branch: &Branch) -> Self {
        SyncError {
            operation,
            branch: branch.clone(),
        }
    }

    /// HTTP status for this failure. All sync failures are server errors.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Applies sync requests through a git interpreter, one branch at a time.
#[derive(Debug)]
pub struct Syncer<G> {
    git: G,
    locks: BranchLocks,
}

impl<G> Syncer<G>
where
    G: GitInterpreter + Sync,
{
    pub fn new(git: G) -> Self {
        Syncer {
            git,
            locks: BranchLocks::new(),
        }
    }

    /// Returns the interpreter this syncer drives.
    pub fn git(&self) -> &G {
        &self.git
    }

    /// Applies a classified event.
    #[instrument(skip_all, fields(disposition = ?request.disposition()))]
    pub async fn apply(&self, request: SyncRequest) -> Result<SyncOutcome, SyncError> {
        match request {
            SyncRequest::Ignore => {
                debug!("Ignoring non-push event");
                Ok(SyncOutcome::ignored())
            }
            SyncRequest::Delete(repo) => {
                let _guard = self.locks.lock(&repo.branch).await;
                self.delete(&repo).await
            }
            SyncRequest::Update(repo) => self.ensure_synced(&repo).await,
        }
    }

    /// Brings the working copy for `repo` up to date: pull if it exists,
    /// otherwise clone and check out the branch.
    ///
    /// Shared by the webhook path and the startup bootstrap.
    #[instrument(skip_all, fields(branch = %repo.branch, path = %repo.path.display()))]
    pub async fn ensure_synced(&self, repo: &RepositoryRef) -> Result<SyncOutcome, SyncError> {
        let _guard = self.locks.lock(&repo.branch).await;

        if repo.path.exists() {
            debug!("Working copy exists - pull");
            self.pull(repo).await
        } else {
            debug!("Working copy does not exist - clone and checkout");
            self.clone_and_checkout(repo).await
        }
    }

    async fn delete(&self, repo: &RepositoryRef) -> Result<SyncOutcome, SyncError> {
        self.run(
            GitEffect::Remove {
                path: repo.path.clone(),
            },
            SyncOperation::Delete,
            &repo.branch,
        )
        .await?;
        info!(branch = %repo.branch, "Delete successful");
        Ok(SyncOutcome::deleted(&repo.branch))
    }

    async fn clone_and_checkout(&self, repo: &RepositoryRef) -> Result<SyncOutcome, SyncError> {
        self.run(
            GitEffect::Clone {
                url: repo.url.clone(),
                path: repo.path.clone(),
            },
            SyncOperation::Clone,
            &repo.branch,
        )
        .await?;
        debug!(branch = %repo.branch, "Git clone successful");

        self.run(
            GitEffect::Checkout {
                path: repo.path.clone(),
                target: repo.branch.as_str().to_string(),
            },
            SyncOperation::Checkout,
            &repo.branch,
        )
        .await?;
        info!(branch = %repo.branch, "Git clone and checkout successful");
        Ok(SyncOutcome::cloned(&repo.branch))
    }

    async fn pull(&self, repo: &RepositoryRef) -> Result<SyncOutcome, SyncError> {
        self.run(
            GitEffect::Pull {
                path: repo.path.clone(),
            },
            SyncOperation::Pull,
            &repo.branch,
        )
        .await?;
        info!(branch = %repo.branch, "Git pull successful");
        Ok(SyncOutcome::pulled(&repo.branch))
    }

    async fn run(
        &self,
        effect: GitEffect,
        operation: SyncOperation,
        branch: &Branch,
    ) -> Result<(), SyncError> {
        self.git.interpret(effect).await.map_err(|e| {
            debug!(%branch, %operation, error = %e, "Git operation failed");
            SyncError::new(operation, branch)
        })
    }
}
