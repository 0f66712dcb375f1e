//! Error types for the bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError (top-level wrapper)
//! ├── ConversionError - type or nullability mismatch at the boundary
//! ├── RangeError      - integer outside the signed 64-bit range
//! └── TrappedError    - foreign exception caught by run_trapped
//! ```
//!
//! [`LookupError`] is deliberately not part of `BridgeError`. A missing wrap
//! function is a binding defect, so dispatch panics with it instead of
//! returning it.
//!
//! ## Usage
//!
//! ```
//! use clownfish::{BridgeError, BridgeResult, to_foreign};
//!
//! fn store_count(count: u64) -> BridgeResult<()> {
//!     let obj = to_foreign(count, None, false)?; // RangeError -> BridgeError
//!     assert!(obj.is_some());
//!     Ok(())
//! }
//!
//! assert!(store_count(7).is_ok());
//! assert!(matches!(store_count(u64::MAX), Err(BridgeError::Range(_))));
//! ```

use std::fmt;

use thiserror::Error;

use crate::classes::ErrObj;

// ============================================================================
// Conversion Errors
// ============================================================================

/// Type or nullability mismatch while converting a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A null handle was passed where an object is required.
    #[error("cannot wrap a null handle")]
    NullHandle,

    /// A null value was passed where an object of `required` is required.
    #[error("{required} required, but value was null")]
    Null { required: String },

    /// The object is of the wrong class.
    #[error("invalid type: expected {required}, found {found}")]
    ClassMismatch { found: String, required: String },

    /// A host value of the wrong kind was extracted.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

// ============================================================================
// Range Errors
// ============================================================================

/// An integer does not fit in the target range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("integer overflow: {value} doesn't fit in {target}")]
pub struct RangeError {
    /// The rejected value, in decimal.
    pub value: String,
    /// Name of the target type.
    pub target: &'static str,
}

impl RangeError {
    pub fn new(value: impl fmt::Display, target: &'static str) -> Self {
        Self {
            value: value.to_string(),
            target,
        }
    }
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// No wrap function is registered for a class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no wrap function registered for class {class}")]
pub struct LookupError {
    pub class: String,
}

// ============================================================================
// Trapped Errors
// ============================================================================

/// A foreign exception caught at a trap boundary.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TrappedError {
    message: String,
    err: ErrObj,
}

impl TrappedError {
    pub(crate) fn new(err: ErrObj) -> Self {
        Self {
            message: err.message(),
            err,
        }
    }

    /// The exception's message at the time it was trapped.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The foreign exception object.
    pub fn err(&self) -> &ErrObj {
        &self.err
    }

    pub fn into_err(self) -> ErrObj {
        self.err
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any recoverable bridge error.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Trapped(#[from] TrappedError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
