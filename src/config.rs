//! Process configuration.
//!
//! Every setting can come from a command-line flag or its environment
//! variable. [`Cli`] is the raw clap view; [`Config`] is the validated form
//! built once at startup and passed by reference to everything else.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::types::Branch;

/// Branch synchronized at startup when none is configured.
pub const DEFAULT_INITIAL_BRANCH: &str = "production";

/// Directory holding one working copy per branch.
pub const DEFAULT_ENVIRONMENTS_DIR: &str = "/code/environments";

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Credential store file name inside the home directory.
const CREDENTIALS_FILE_NAME: &str = ".git-credentials";

/// GitHub push webhook receiver for Puppet environments.
#[derive(Parser, Debug, Clone)]
#[command(name = "puppet-webhook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared secret callers must pass as `?auth=<token>`
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// GitHub token written to the git credential store
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Repository cloned for the initial branch
    #[arg(long, env = "INITIAL_GIT_REPO_URL")]
    pub initial_git_repo_url: Option<String>,

    /// Branch synchronized before accepting webhooks
    #[arg(long, env = "INITIAL_GIT_BRANCH", default_value = DEFAULT_INITIAL_BRANCH)]
    pub initial_git_branch: String,

    /// Log verbosity (error, warn, info, verbose, debug, silly, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Base directory for branch working copies
    #[arg(long, env = "PUPPET_ENVIRONMENTS_DIR", default_value = DEFAULT_ENVIRONMENTS_DIR)]
    pub environments_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Git credential store file (defaults to ~/.git-credentials)
    #[arg(long, env = "GIT_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("{which} required")]
    Missing { which: &'static str },

    /// No credentials file was given and the home directory is unknown.
    #[error("GIT_CREDENTIALS_FILE required (home directory unknown)")]
    NoHomeDirectory,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_token: String,
    pub github_token: String,
    pub initial_repo_url: String,
    pub initial_branch: Branch,
    pub environments_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub credentials_file: PathBuf,
}

impl Config {
    /// Validates the raw settings.
    ///
    /// Required values are checked in a fixed order (`AUTH_TOKEN`,
    /// `GITHUB_TOKEN`, `INITIAL_GIT_REPO_URL`) and the first missing one is
    /// reported. Empty strings count as missing.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let auth_token = required(cli.auth_token, "AUTH_TOKEN")?;
        let github_token = required(cli.github_token, "GITHUB_TOKEN")?;
        let initial_repo_url = required(cli.initial_git_repo_url, "INITIAL_GIT_REPO_URL")?;

        let initial_branch = if cli.initial_git_branch.is_empty() {
            Branch::new(DEFAULT_INITIAL_BRANCH)
        } else {
            Branch::new(cli.initial_git_branch)
        };

        let credentials_file = match cli.credentials_file {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join(CREDENTIALS_FILE_NAME),
        };

        Ok(Config {
            auth_token,
            github_token,
            initial_repo_url,
            initial_branch,
            environments_dir: cli.environments_dir,
            listen_addr: cli.listen_addr,
            credentials_file,
        })
    }
}

fn required(value: Option<String>, which: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { which }),
    }
}

/// Maps a `LOG_LEVEL` value to a tracing filter directive for this crate and
/// the HTTP access log.
///
/// Accepts tracing's level names plus the `verbose` and `silly` names used by
/// winston-style configurations. Returns `None` for anything else.
pub fn log_filter(level: &str) -> Option<String> {
    let level = match level.to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "info" => "info",
        "verbose" | "debug" => "debug",
        "silly" | "trace" => "trace",
        _ => return None,
    };
    Some(format!("puppet_webhook={0},tower_http={0}", level))
}
