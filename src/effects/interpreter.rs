//! Effect interpreter trait.
//!
//! The sync logic describes what it wants done as [`GitEffect`] values and
//! hands them to an interpreter. Production uses
//! [`CommandGitInterpreter`](crate::git::CommandGitInterpreter); tests use a
//! recording spy.

use std::future::Future;

use super::git::GitEffect;

/// Interprets git effects against the local filesystem.
///
/// Each call either completes the whole operation or fails; the caller decides
/// what a failure means. Interpreters never retry.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct FailingInterpreter;
///
/// impl GitInterpreter for FailingInterpreter {
///     type Error = String;
///
///     async fn interpret(&self, effect: GitEffect) -> Result<(), Self::Error> {
///         Err(format!("refusing {:?}", effect))
///     }
/// }
/// ```
pub trait GitInterpreter {
    /// The error type returned by this interpreter.
    type Error: std::fmt::Display + Send;

    /// Execute a git effect.
    fn interpret(&self, effect: GitEffect) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
