//! Core domain types for the webhook receiver.

pub mod ids;
pub mod repository;

pub use ids::Branch;
pub use repository::{RepositoryRef, SyncDisposition, resolve_path};
