//! Error types for the Galaxy3D BVH
//!
//! Every failure of a tree operation is local and recoverable: the tree is
//! left unchanged and the caller decides what to do next.

use std::fmt;

/// Result type for Galaxy3D BVH operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D BVH errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Handle is unknown to this tree, already deleted, or refers to an internal node
    InvalidHandle(String),

    /// Box with a minimum greater than its maximum (or a NaN bound)
    MalformedBox(String),

    /// Construction-time configuration rejected (negative margin, NaN tolerance, ...)
    InvalidConfig(String),

    /// Internal consistency check failed (reported by `validate()`)
    InvariantViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::MalformedBox(msg) => write!(f, "Malformed box: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
