//! Puppet Webhook - keeps per-branch Puppet environment checkouts in sync with GitHub.
//!
//! Push notifications are authenticated, mapped from branch to working copy,
//! and applied as a clone, pull, or delete. The same clone-or-pull logic runs
//! once at startup for the configured initial branch.

pub mod bootstrap;
pub mod config;
pub mod effects;
pub mod git;
pub mod server;
pub mod sync;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
