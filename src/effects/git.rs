//! Git operation effect types.
//!
//! These types describe git operations as data, without executing them. Every
//! effect names the working copy it targets explicitly; nothing depends on the
//! process's current directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A git (or working-copy) operation effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitEffect {
    /// Clone `url` into a new working copy at `path`.
    Clone {
        url: String,
        path: PathBuf,
    },

    /// Fetch and merge the upstream of the branch checked out at `path`.
    Pull {
        path: PathBuf,
    },

    /// Switch the working copy at `path` to `target`.
    Checkout {
        path: PathBuf,
        /// Branch name, tag, or SHA.
        target: String,
    },

    /// Recursively remove the working copy at `path`.
    ///
    /// Fails if `path` does not exist.
    Remove {
        path: PathBuf,
    },

    /// Configure git to read credentials from a plain-text store file.
    ///
    /// Applies to the invoking user's global git configuration, so later
    /// clones and pulls pick the credentials up.
    ConfigureCredentialStore {
        file: PathBuf,
    },
}

impl GitEffect {
    /// Returns the kind of operation, without its arguments.
    pub fn kind(&self) -> GitEffectKind {
        match self {
            GitEffect::Clone { .. } => GitEffectKind::Clone,
            GitEffect::Pull { .. } => GitEffectKind::Pull,
            GitEffect::Checkout { .. } => GitEffectKind::Checkout,
            GitEffect::Remove { .. } => GitEffectKind::Remove,
            GitEffect::ConfigureCredentialStore { .. } => GitEffectKind::ConfigureCredentialStore,
        }
    }
}

/// The kind of a [`GitEffect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitEffectKind {
    Clone,
    Pull,
    Checkout,
    Remove,
    ConfigureCredentialStore,
}

impl fmt::Display for GitEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GitEffectKind::Clone => "clone",
            GitEffectKind::Pull => "pull",
            GitEffectKind::Checkout => "checkout",
            GitEffectKind::Remove => "remove",
            GitEffectKind::ConfigureCredentialStore => "configure credential store",
        };
        f.write_str(s)
    }
}
