//! Shared test utilities: a recording git interpreter and arbitrary generators.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::effects::{GitEffect, GitEffectKind, GitInterpreter};
use crate::types::Branch;

/// A [`GitInterpreter`] spy that records every effect instead of running git.
///
/// Clones share the same record, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingGitInterpreter {
    effects: Arc<Mutex<Vec<GitEffect>>>,
    fail_on: Option<GitEffectKind>,
    create_dirs_on_clone: bool,
}

impl RecordingGitInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spy whose effects of `kind` fail (after being recorded).
    pub fn failing_on(kind: GitEffectKind) -> Self {
        RecordingGitInterpreter {
            fail_on: Some(kind),
            ..Self::default()
        }
    }

    /// Makes successful clones create the target directory, as real git would.
    pub fn creating_dirs_on_clone(mut self) -> Self {
        self.create_dirs_on_clone = true;
        self
    }

    pub fn effects(&self) -> Vec<GitEffect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<GitEffectKind> {
        self.effects().iter().map(GitEffect::kind).collect()
    }
}

impl GitInterpreter for RecordingGitInterpreter {
    type Error = String;

    async fn interpret(&self, effect: GitEffect) -> Result<(), Self::Error> {
        let kind = effect.kind();
        self.effects.lock().unwrap().push(effect.clone());

        // Give other tasks a chance to interleave, like a real subprocess would.
        tokio::task::yield_now().await;

        if self.fail_on == Some(kind) {
            return Err(format!("simulated {} failure", kind));
        }
        if let GitEffect::Clone { path, .. } = &effect {
            if self.create_dirs_on_clone {
                std::fs::create_dir_all(path).map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }
}

pub fn arb_branch() -> impl Strategy<Value = Branch> {
    "[a-z][a-z0-9_-]{0,30}".prop_map(Branch::from)
}

pub fn arb_clone_url() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", "[a-z][a-z0-9-]{0,15}")
        .prop_map(|(owner, repo)| format!("https://github.com/{}/{}.git", owner, repo))
}
