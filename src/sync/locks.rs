//! Per-branch mutual exclusion.
//!
//! Two deliveries for the same branch must not interleave their
//! existence check and git operations (both would see "absent" and both
//! clone). Deliveries for different branches proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::types::Branch;

/// Async locks keyed by branch name.
///
/// Entries are created on first use and never evicted.
#[derive(Debug, Default)]
pub struct BranchLocks {
    locks: Mutex<HashMap<Branch, Arc<AsyncMutex<()>>>>,
}

impl BranchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `branch`. Released when the guard drops.
    pub async fn lock(&self, branch: &Branch) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(branch.clone()).or_default())
        };
        trace!(%branch, "Waiting for branch lock");
        lock.lock_owned().await
    }

    /// Number of branches that have ever been locked.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
