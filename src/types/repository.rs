//! Synchronization targets and event dispositions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::Branch;

/// Returns the working-copy path for a branch: `<base>/<branch>`.
///
/// This is a pure function of its inputs. No table of known branches is kept;
/// whether a branch has been seen before is decided by checking this path on
/// disk.
pub fn resolve_path(base: &Path, branch: &Branch) -> PathBuf {
    base.join(branch.as_str())
}

/// One synchronization target: a branch, its working copy, and where to clone it from.
///
/// Built fresh for every webhook delivery and for the startup run, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub branch: Branch,
    pub path: PathBuf,
    /// Clone URL of the remote. Only read when the working copy must be cloned.
    pub url: String,
}

impl RepositoryRef {
    pub fn new(base: &Path, branch: Branch, url: impl Into<String>) -> Self {
        let path = resolve_path(base, &branch);
        RepositoryRef {
            branch,
            path,
            url: url.into(),
        }
    }
}

/// How an inbound event should be applied to the working copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDisposition {
    /// Not a push; nothing to do.
    Ignore,
    /// The branch was deleted upstream.
    Deleted,
    /// The branch was created or updated upstream.
    Changed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::arb_branch;
    use proptest::prelude::*;

    #[test]
    fn resolve_path_joins_base_and_branch() {
        assert_eq!(
            resolve_path(Path::new("/base"), &Branch::new("feature-x")),
            PathBuf::from("/base/feature-x")
        );
    }

    #[test]
    fn repository_ref_uses_resolved_path() {
        let repo = RepositoryRef::new(
            Path::new("/code/environments"),
            Branch::new("production"),
            "https://example.com/r.git",
        );
        assert_eq!(repo.path, PathBuf::from("/code/environments/production"));
        assert_eq!(repo.url, "https://example.com/r.git");
    }

    #[test]
    fn disposition_serializes_snake_case() {
        let json = serde_json::to_string(&SyncDisposition::Deleted).unwrap();
        assert_eq!(json, "\"deleted\"");
    }

    proptest! {
        #[test]
        fn resolve_path_is_base_slash_branch(branch in arb_branch()) {
            let base = Path::new("/base");
            let path = resolve_path(base, &branch);
            prop_assert_eq!(path.to_str().unwrap(), format!("/base/{}", branch));
        }

        #[test]
        fn resolve_path_is_deterministic(branch in arb_branch()) {
            let base = Path::new("/srv/envs");
            prop_assert_eq!(resolve_path(base, &branch), resolve_path(base, &branch));
        }
    }
}
