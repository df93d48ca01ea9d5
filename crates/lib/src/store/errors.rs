//! Error types for option tree operations.
//!
//! Every documented failure of a store operation is one of the kinds in
//! [`ErrorKind`]. [`OptionError`] refines each kind with the path or reason
//! that caused it.

use thiserror::Error;

use super::{PathError, Rank};

/// The fixed set of failure kinds a store operation can report.
///
/// The discriminants are the status codes used at the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    PathNotFound = 1,
    TypeError = 2,
    RankError = 3,
    ShapeMismatch = 4,
    IndexOutOfRange = 5,
    AlreadyExists = 6,
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Structured error types for option tree operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// The path does not resolve to any node
    #[error("Option not found: {path}")]
    PathNotFound { path: String },

    /// The path text could not be parsed
    #[error("Invalid option path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    /// Stored type differs from the requested one, or the node has no value
    #[error("Type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A type code outside the supported set
    #[error("Unsupported type code {code}")]
    InvalidType { code: i32 },

    /// Stored rank differs from the requested one
    #[error("Rank mismatch at {path}: expected rank {expected}, found rank {actual}")]
    RankMismatch {
        path: String,
        expected: Rank,
        actual: Rank,
    },

    /// A rank outside 0..=2
    #[error("Unsupported rank {rank}")]
    InvalidRank { rank: i32 },

    /// A positional index exceeds the available count
    #[error("Index {index} out of range at {path} ({count} available)")]
    IndexOutOfRange {
        path: String,
        index: usize,
        count: usize,
    },

    /// Structural creation conflicts with an existing value-bearing node
    #[error("Option already exists: {path}")]
    AlreadyExists { path: String },

    /// Payload is not rectangular or disagrees with its declared shape
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch { reason: String },
}

impl OptionError {
    /// The failure kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptionError::PathNotFound { .. } | OptionError::InvalidPath { .. } => {
                ErrorKind::PathNotFound
            }
            OptionError::TypeMismatch { .. } | OptionError::InvalidType { .. } => {
                ErrorKind::TypeError
            }
            OptionError::RankMismatch { .. } | OptionError::InvalidRank { .. } => {
                ErrorKind::RankError
            }
            OptionError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            OptionError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            OptionError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
        }
    }

    /// Status code of this error at the C boundary.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Check if this error means the path did not resolve
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::PathNotFound
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::TypeError
    }

    /// Check if this error is related to rank mismatches
    pub fn is_rank_error(&self) -> bool {
        self.kind() == ErrorKind::RankError
    }

    /// Check if this error is related to payload shape
    pub fn is_shape_error(&self) -> bool {
        self.kind() == ErrorKind::ShapeMismatch
    }

    /// Check if this error is a positional index failure
    pub fn is_index_error(&self) -> bool {
        self.kind() == ErrorKind::IndexOutOfRange
    }

    /// Check if this error indicates a conflict (already exists)
    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    /// Get the path if this is a path-related error
    pub fn path(&self) -> Option<&str> {
        match self {
            OptionError::PathNotFound { path }
            | OptionError::InvalidPath { path, .. }
            | OptionError::TypeMismatch { path, .. }
            | OptionError::RankMismatch { path, .. }
            | OptionError::IndexOutOfRange { path, .. }
            | OptionError::AlreadyExists { path } => Some(path),
            _ => None,
        }
    }
}

// Conversion from OptionError to the main Error type
impl From<OptionError> for crate::Error {
    fn from(err: OptionError) -> Self {
        crate::Error::Option(err)
    }
}
