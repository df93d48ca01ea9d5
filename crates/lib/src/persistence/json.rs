//! JSON form of an option tree.
//!
//! The document is an object holding the root node under `root`, plus an
//! optional `_v` format version that is omitted while it is 0.

use serde::{Deserialize, Deserializer, Serialize};

use super::{PersistenceError, validate_tree};
use crate::store::{Node, OptionStore, Value};

/// The current JSON format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const FORMAT_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the format version during deserialization.
fn validate_format_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != FORMAT_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported options format version {version}; only version {FORMAT_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "_v", skip_serializing_if = "is_v0")]
    version: u8,
    root: &'a Node,
}

#[derive(Deserialize)]
struct Document {
    #[serde(
        rename = "_v",
        default,
        deserialize_with = "validate_format_version"
    )]
    version: u8,
    root: Node,
}

fn find_non_finite(node: &Node) -> Option<&Node> {
    let non_finite = matches!(
        node.value(),
        Some(Value::Double(shaped)) if shaped.elements().iter().any(|x| !x.is_finite())
    );
    if non_finite {
        return Some(node);
    }
    node.children().iter().find_map(find_non_finite)
}

/// Renders the tree as pretty-printed JSON.
pub fn to_string(store: &OptionStore) -> Result<String, PersistenceError> {
    if let Some(node) = find_non_finite(store.root()) {
        return Err(PersistenceError::Unrepresentable {
            name: node.name().to_string(),
            reason: "JSON cannot hold NaN or infinite doubles".to_string(),
        });
    }

    let document = DocumentRef {
        version: FORMAT_VERSION,
        root: store.root(),
    };
    serde_json::to_string_pretty(&document)
        .map_err(|source| PersistenceError::SerializationFailed { source })
}

/// Parses a tree from JSON text.
pub fn from_str(text: &str) -> Result<OptionStore, PersistenceError> {
    // Version validation happens via deserialize_with on Document._v
    let document: Document = serde_json::from_str(text)
        .map_err(|source| PersistenceError::DeserializationFailed { source })?;
    tracing::trace!(version = document.version, "Parsed JSON options document");

    validate_tree(&document.root)?;
    Ok(OptionStore::from_root(document.root))
}
