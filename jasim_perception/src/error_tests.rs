//! Unit tests for error.rs

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_config_display() {
    let err = Error::InvalidConfig("split_count must be positive".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid configuration"));
    assert!(display.contains("split_count must be positive"));
}

#[test]
fn test_empty_bounding_box_display() {
    let err = Error::EmptyBoundingBox;
    assert_eq!(
        format!("{}", err),
        "Cannot build a tree without entities or world area"
    );
}

#[test]
fn test_error_is_std_error() {
    let err = Error::EmptyBoundingBox;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidConfig("max_depth must be positive".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::EmptyBoundingBox);
}

// ============================================================================
// PROPAGATION
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidConfig("max_depth".to_string()))
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::InvalidConfig("max_depth".to_string())));
}
