//! Startup synchronization of the initial branch.
//!
//! Runs once before the listener binds:
//! 1. Point git's credential helper at the store file
//! 2. Write the GitHub token into that file
//! 3. Clone or pull the initial branch, exactly as a push for it would
//!
//! Any failure is fatal; the caller logs it and exits.

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::effects::{GitEffect, GitInterpreter};
use crate::git::{GitError, write_credentials};
use crate::sync::{SyncError, SyncOutcome, Syncer};
use crate::types::RepositoryRef;

/// Errors from the startup sequence.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuring the credential helper failed.
    #[error("failed to configure git credential helper: {0}")]
    CredentialHelper(String),

    /// Writing the credential store failed.
    #[error("failed to write git credentials: {0}")]
    Credentials(#[from] GitError),

    /// Synchronizing the initial branch failed.
    #[error("{0}")]
    Sync(#[from] SyncError),
}

/// Returns the startup synchronization target.
pub fn initial_repository(config: &Config) -> RepositoryRef {
    RepositoryRef::new(
        &config.environments_dir,
        config.initial_branch.clone(),
        config.initial_repo_url.clone(),
    )
}

/// Runs the startup sequence.
pub async fn bootstrap<G>(config: &Config, syncer: &Syncer<G>) -> Result<SyncOutcome, BootstrapError>
where
    G: GitInterpreter + Sync,
{
    info!("Setting up Git Configuration");
    syncer
        .git()
        .interpret(GitEffect::ConfigureCredentialStore {
            file: config.credentials_file.clone(),
        })
        .await
        .map_err(|e| BootstrapError::CredentialHelper(e.to_string()))?;

    info!("Setting up Git Credentials");
    write_credentials(&config.credentials_file, &config.github_token)?;

    let repo = initial_repository(config);
    info!(url = %repo.url, branch = %repo.branch, "Getting initial catalog");
    let outcome = syncer.ensure_synced(&repo).await?;
    Ok(outcome)
}
