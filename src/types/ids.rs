//! Newtype wrappers for domain identifiers.
//!
//! These keep branch names from being confused with arbitrary strings (clone
//! URLs, paths, refs) as they flow from the webhook payload to the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A branch name, used verbatim as a directory name under the environments base.
///
/// No sanitization is applied: a branch containing `..` or further `/`
/// characters maps to a path outside (or below) its own directory. Callers are
/// expected to supply names taken from well-formed git refs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Branch(pub String);

impl Branch {
    pub fn new(s: impl Into<String>) -> Self {
        Branch(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the branch from a ref such as `refs/heads/main`.
    ///
    /// The branch is the third `/`-delimited segment, so `refs/heads/feature/x`
    /// yields `feature`. Returns `None` when there is no third segment or it is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use puppet_webhook::types::Branch;
    ///
    /// assert_eq!(Branch::from_ref("refs/heads/main"), Some(Branch::new("main")));
    /// assert_eq!(Branch::from_ref("refs/heads/"), None);
    /// assert_eq!(Branch::from_ref("main"), None);
    /// ```
    pub fn from_ref(git_ref: &str) -> Option<Self> {
        let segment = git_ref.split('/').nth(2)?;
        if segment.is_empty() {
            return None;
        }
        Some(Branch(segment.to_string()))
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Branch {
    fn from(s: &str) -> Self {
        Branch(s.to_string())
    }
}

impl From<String> for Branch {
    fn from(s: String) -> Self {
        Branch(s)
    }
}
