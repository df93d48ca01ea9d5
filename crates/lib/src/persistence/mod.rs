//! Bulk load and store of option trees.
//!
//! Two lossless formats are supported:
//!
//! - **JSON**: a versioned serde envelope around the tree. Handles every
//!   node name and value except non-finite doubles.
//! - **XML**: the layout of classic option files, one element per node,
//!   node attributes as XML attributes and the value in a typed child
//!   element. See [`xml`] for the exact grammar.
//!
//! ```
//! use opttree::{persistence::{self, Format}, store::OptionStore};
//!
//! let mut store = OptionStore::new();
//! store.set_option("/simulation/timestep", 0.01)?;
//! store.set_attribute("/simulation", "name", "lock_exchange")?;
//!
//! for format in [Format::Json, Format::Xml] {
//!     let text = persistence::to_string(&store, format)?;
//!     assert_eq!(persistence::from_str(&text, format)?, store);
//! }
//! # Ok::<(), opttree::Error>(())
//! ```

use std::{fmt, path::Path, str::FromStr};

use thiserror::Error;

use crate::{
    Result,
    store::{Node, OptionStore, Segment},
};

pub mod json;
pub mod xml;

/// Errors that can occur while loading or storing option trees.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the file failed
    #[error("File I/O error on {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Converting the tree to JSON failed
    #[error("JSON serialization failed: {source}")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The JSON text could not be read as an option tree
    #[error("JSON deserialization failed: {source}")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The XML text is not well formed
    #[error("XML error: {reason}")]
    Xml { reason: String },

    /// The text parsed but does not describe a valid option tree
    #[error("Invalid options document: {reason}")]
    InvalidDocument { reason: String },

    /// A node cannot be expressed in the chosen format
    #[error("Cannot store node '{name}': {reason}")]
    Unrepresentable { name: String, reason: String },

    /// Format name not recognised
    #[error("Unknown options format '{name}'")]
    UnknownFormat { name: String },
}

impl PersistenceError {
    /// Check if this error came from the filesystem
    pub fn is_io_error(&self) -> bool {
        matches!(self, PersistenceError::FileIo { .. })
    }
}

// Conversion from PersistenceError to the main Error type
impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        crate::Error::Persistence(err)
    }
}

/// On-disk representation of an option tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    Json,
    #[default]
    Xml,
}

impl Format {
    /// Picks the format from a file extension: `.json` is JSON, anything
    /// else is XML.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Xml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = PersistenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            _ => Err(PersistenceError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// Checks that every node below the root has a name usable in a path.
pub(crate) fn validate_tree(root: &Node) -> std::result::Result<(), PersistenceError> {
    fn walk(node: &Node) -> std::result::Result<(), PersistenceError> {
        for child in node.children() {
            Segment::new(child.name()).map_err(|e| PersistenceError::InvalidDocument {
                reason: e.to_string(),
            })?;
            walk(child)?;
        }
        Ok(())
    }
    walk(root)
}

/// Renders a tree as text.
pub fn to_string(store: &OptionStore, format: Format) -> Result<String> {
    let text = match format {
        Format::Json => json::to_string(store)?,
        Format::Xml => xml::to_string(store)?,
    };
    Ok(text)
}

/// Parses a tree from text.
pub fn from_str(text: &str, format: Format) -> Result<OptionStore> {
    let store = match format {
        Format::Json => json::from_str(text)?,
        Format::Xml => xml::from_str(text)?,
    };
    Ok(store)
}

/// Loads a tree from a file, choosing the format from its extension.
pub fn load(path: impl AsRef<Path>) -> Result<OptionStore> {
    let format = Format::from_path(&path);
    load_as(path, format)
}

/// Loads a tree from a file in the given format.
pub fn load_as(path: impl AsRef<Path>, format: Format) -> Result<OptionStore> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| PersistenceError::FileIo {
        path: path.display().to_string(),
        source,
    })?;
    let store = from_str(&text, format)?;
    tracing::info!(
        path = %path.display(),
        %format,
        nodes = store.root().subtree_len(),
        "Loaded options"
    );
    Ok(store)
}

/// Writes a tree to a file, choosing the format from its extension.
pub fn store(tree: &OptionStore, path: impl AsRef<Path>) -> Result<()> {
    let format = Format::from_path(&path);
    store_as(tree, path, format)
}

/// Writes a tree to a file in the given format.
pub fn store_as(tree: &OptionStore, path: impl AsRef<Path>, format: Format) -> Result<()> {
    let path = path.as_ref();
    let text = to_string(tree, format)?;
    std::fs::write(path, text).map_err(|source| PersistenceError::FileIo {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        %format,
        nodes = tree.root().subtree_len(),
        "Wrote options"
    );
    Ok(())
}

impl OptionStore {
    /// Loads a tree from a file. See [`load`].
    pub fn load_options(path: impl AsRef<Path>) -> Result<Self> {
        load(path)
    }

    /// Writes this tree to a file. See [`store`].
    pub fn write_options(&self, path: impl AsRef<Path>) -> Result<()> {
        store(self, path)
    }
}
