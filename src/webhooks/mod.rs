//! Webhook handling for GitHub push events.
//!
//! This module provides:
//! - Shared-secret authentication of incoming deliveries
//! - Classification of deliveries into sync requests

pub mod auth;
pub mod parser;

pub use auth::{ACCESS_DENIED_MESSAGE, AuthError, check_auth};
pub use parser::{PUSH_EVENT, ParseError, classify};
