//! Local git operations on branch working copies.
//!
//! Each operation takes the working-copy path as an argument and runs `git`
//! with that directory set on the child process only, so concurrent
//! operations on different branches never share a "current directory".

pub mod credentials;

use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;
use tracing::{debug, trace};

use crate::effects::{GitEffect, GitInterpreter};

pub use credentials::{credentials_line, write_credentials};

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command exited unsuccessfully.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Path is not valid UTF-8 and cannot be passed to git.
    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(String),

    /// IO error (spawning git, removing a directory, writing credentials).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running the operation panicked or was cancelled.
    #[error("git task failed: {0}")]
    TaskFailed(String),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Create a git Command, optionally running inside `workdir`.
///
/// Terminal prompts are disabled: a missing credential must fail the command
/// rather than hang the request waiting on stdin.
pub(crate) fn git_command(workdir: Option<&Path>) -> Command {
    let mut cmd = Command::new("git");
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Run a git command, returning its output on success.
pub fn run_git_sync(workdir: Option<&Path>, args: &[&str]) -> GitResult<Output> {
    trace!(?workdir, ?args, "Running git");
    let output = git_command(workdir).args(args).output()?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

fn path_str(path: &Path) -> GitResult<&str> {
    path.to_str()
        .ok_or_else(|| GitError::InvalidPath(path.display().to_string()))
}

/// Clone `url` into `path`. The parent of `path` is created if missing.
///
/// `url` comes from the webhook payload and is never read as an option.
pub fn clone(url: &str, path: &Path) -> GitResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    run_git_sync(None, &["clone", "--", url, path_str(path)?])?;
    Ok(())
}

/// Pull the current branch's upstream into the working copy at `path`.
pub fn pull(path: &Path) -> GitResult<()> {
    run_git_sync(Some(path), &["pull"])?;
    Ok(())
}

/// Check out `target` in the working copy at `path`.
pub fn checkout(path: &Path, target: &str) -> GitResult<()> {
    run_git_sync(Some(path), &["checkout", target])?;
    Ok(())
}

/// Recursively remove the working copy at `path`.
///
/// Unlike `rm -rf`, a missing path is an error.
pub fn remove(path: &Path) -> GitResult<()> {
    std::fs::remove_dir_all(path)?;
    Ok(())
}

/// Point the global git credential helper at a store file.
pub fn configure_credential_store(file: &Path) -> GitResult<()> {
    let helper = format!("store --file {}", path_str(file)?);
    run_git_sync(None, &["config", "--global", "credential.helper", &helper])?;
    Ok(())
}

/// Execute one effect synchronously.
pub fn execute(effect: &GitEffect) -> GitResult<()> {
    match effect {
        GitEffect::Clone { url, path } => clone(url, path),
        GitEffect::Pull { path } => pull(path),
        GitEffect::Checkout { path, target } => checkout(path, target),
        GitEffect::Remove { path } => remove(path),
        GitEffect::ConfigureCredentialStore { file } => configure_credential_store(file),
    }
}

/// Interpreter that runs effects with the `git` binary.
///
/// Git is blocking, so each effect runs on tokio's blocking pool and the
/// calling request awaits it. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandGitInterpreter;

impl CommandGitInterpreter {
    pub fn new() -> Self {
        CommandGitInterpreter
    }
}

impl GitInterpreter for CommandGitInterpreter {
    type Error = GitError;

    async fn interpret(&self, effect: GitEffect) -> Result<(), Self::Error> {
        debug!(?effect, "Executing git effect");
        tokio::task::spawn_blocking(move || execute(&effect))
            .await
            .map_err(|e| GitError::TaskFailed(e.to_string()))?
    }
}
