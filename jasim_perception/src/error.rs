//! Error types for the Jasim perception library
//!
//! Only recoverable conditions are reported through `Error`. Caller contract
//! violations (inverted bounds, negative frustum distances) are assertions,
//! and expected absences (removing an unknown entity, perceiving from an
//! entity that is no longer indexed) are silent no-ops.

use std::fmt;

/// Result type for Jasim perception operations
pub type Result<T> = std::result::Result<T, Error>;

/// Jasim perception errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A tree or environment configuration cannot be used
    InvalidConfig(String),

    /// A tree was requested from an empty entity set without a world area
    EmptyBoundingBox,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::EmptyBoundingBox => write!(f, "Cannot build a tree without entities or world area"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
