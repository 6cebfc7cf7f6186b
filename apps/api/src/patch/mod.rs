//! Patch Validator & Applicator.
//!
//! RFC 6902 operations are applied to a resume through a strict three-phase
//! gate: every operation is validated against the current document, the whole
//! set is applied to a copy as one unit, and the result is re-validated
//! against the resume schema before anything is persisted.

pub mod apply;
pub mod gate;
pub mod operation;
pub mod pointer;
pub mod schema;

use serde::Serialize;
use thiserror::Error;

pub use gate::apply_patch_to_variant;
pub use schema::SchemaViolation;

/// Why a single operation could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchFailure {
    #[error("malformed operation: {0}")]
    Malformed(String),

    #[error("invalid JSON pointer '{0}': must be empty or start with '/'")]
    InvalidPointer(String),

    #[error("path does not exist")]
    PathNotFound,

    #[error("'{0}' is not a valid array index")]
    InvalidIndex(String),

    #[error("array index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("cannot address a child of a scalar value")]
    NotAContainer,

    #[error("test failed: value at path does not match")]
    TestFailed,

    #[error("cannot move a value into one of its own children")]
    MoveIntoChild,

    #[error("the document root cannot be removed")]
    RootRemoval,
}

/// A failed operation, identified by its position in the submitted sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("operation {index} ({op} {path}): {reason}")]
pub struct PatchError {
    pub index: usize,
    pub op: String,
    pub path: String,
    pub reason: String,
    #[serde(skip)]
    pub failure: PatchFailure,
}

impl PatchError {
    pub fn new(index: usize, op: &str, path: &str, failure: PatchFailure) -> Self {
        Self {
            index,
            op: op.to_string(),
            path: path.to_string(),
            reason: failure.to_string(),
            failure,
        }
    }
}
