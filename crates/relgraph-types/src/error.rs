//! Error types for link handling.

use thiserror::Error;

/// Errors that can occur while reading links out of a representation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The `links` member is present but is not an array of link objects.
    #[error("invalid links: {0}")]
    InvalidLinks(String),
}

/// Convenience type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
