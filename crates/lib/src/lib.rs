//!
//! Opttree: a path-addressed tree of typed configuration options.
//! This library provides the store, its file formats, and a flat C surface for
//! embedding the store in numerical codes written in other languages.
//!
//! ## Core Concepts
//!
//! * **Store (`store::OptionStore`)**: A rooted tree of named nodes. Every operation is addressed by a path such as `/simulation/phase[1]/density`.
//! * **Nodes (`store::Node`)**: Tree elements carrying an optional typed value, string attributes, and ordered children. Same-named children are told apart by their sibling index.
//! * **Values (`store::Value`)**: Integer, double, or string payloads at rank 0 (scalar), 1 (vector), or 2 (rectangular matrix with an explicit shape).
//! * **Persistence (`persistence`)**: Lossless load and store of whole trees as JSON or as XML option files.
//! * **C surface (`ffi`)**: `extern "C"` functions taking `(pointer, length)` paths and integer type/rank codes, returning integer status codes.

pub mod ffi;
pub mod persistence;
pub mod store;

/// Re-export the `OptionStore` struct for easier access.
pub use store::{OptionError, OptionStore, SharedOptionStore};

/// Result type used throughout the Opttree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Opttree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured store errors from the store module
    #[error(transparent)]
    Option(store::OptionError),

    /// Structured load/store errors from the persistence module
    #[error(transparent)]
    Persistence(persistence::PersistenceError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Option(_) => "store",
            Error::Persistence(_) => "persistence",
        }
    }

    /// Check if this error indicates an option was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Option(option_err) => option_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a type, rank or shape mismatch.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Option(option_err) => {
                option_err.is_type_error() || option_err.is_rank_error() || option_err.is_shape_error()
            }
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Persistence(persistence_err) => persistence_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error came from reading or writing a document.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }

    /// The store error, if this is one.
    pub fn as_option_error(&self) -> Option<&store::OptionError> {
        match self {
            Error::Option(option_err) => Some(option_err),
            _ => None,
        }
    }
}
