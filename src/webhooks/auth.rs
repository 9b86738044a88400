//! Shared-secret authentication for webhook requests.
//!
//! The caller passes the token in the `auth` query parameter of the webhook
//! URL configured on GitHub. Authentication is the first step of handling a
//! delivery; nothing is parsed or touched on disk before it passes.

use thiserror::Error;

/// Message returned to callers that fail authentication.
pub const ACCESS_DENIED_MESSAGE: &str = "Access Denied";

/// Authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Access Denied")]
    Unauthorized,
}

/// Checks a caller-supplied token against the configured secret.
///
/// A missing token never matches. The comparison is a plain byte equality.
///
/// # Examples
///
/// ```
/// use puppet_webhook::webhooks::{AuthError, check_auth};
///
/// assert!(check_auth(Some("s3cret"), "s3cret").is_ok());
/// assert_eq!(check_auth(Some("guess"), "s3cret"), Err(AuthError::Unauthorized));
/// assert_eq!(check_auth(None, "s3cret"), Err(AuthError::Unauthorized));
/// ```
pub fn check_auth(supplied: Option<&str>, expected: &str) -> Result<(), AuthError> {
    match supplied {
        Some(token) if token == expected => Ok(()),
        _ => Err(AuthError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matching_token_passes() {
        assert_eq!(check_auth(Some("abc"), "abc"), Ok(()));
    }

    #[test]
    fn empty_token_does_not_match_secret() {
        assert_eq!(check_auth(Some(""), "abc"), Err(AuthError::Unauthorized));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert_eq!(check_auth(Some("ABC"), "abc"), Err(AuthError::Unauthorized));
    }

    #[test]
    fn error_message_is_fixed() {
        assert_eq!(AuthError::Unauthorized.to_string(), ACCESS_DENIED_MESSAGE);
    }

    proptest! {
        #[test]
        fn differing_tokens_are_rejected(secret in ".{1,40}", supplied in ".{0,40}") {
            prop_assume!(secret != supplied);
            prop_assert_eq!(check_auth(Some(supplied.as_str()), &secret), Err(AuthError::Unauthorized));
        }

        #[test]
        fn equal_tokens_are_accepted(secret in ".{0,40}") {
            prop_assert!(check_auth(Some(secret.as_str()), &secret).is_ok());
        }
    }
}
