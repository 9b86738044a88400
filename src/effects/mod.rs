//! Effects-as-data for git operations.
//!
//! Sync decisions are expressed as [`GitEffect`] values and executed through a
//! [`GitInterpreter`]. This keeps the decision logic testable with a spy
//! interpreter that records what would have run.

pub mod git;
pub mod interpreter;

pub use git::{GitEffect, GitEffectKind};
pub use interpreter::GitInterpreter;
