//! Tree nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;

/// One element of an option tree.
///
/// A node owns its children outright; there are no back-references, so
/// removing a child detaches its whole subtree. Children keep insertion
/// order and may share names; same-named children are told apart by their
/// position among each other (their sibling index).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    /// Creates an empty container node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a node holding a value.
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns true if the node carries no value.
    pub fn is_container(&self) -> bool {
        self.value.is_none()
    }

    /// Replaces the value, returning the previous one.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Option<Value> {
        self.value.replace(value.into())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.attributes.insert(name.into(), value.into())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// All children in insertion order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child, returning a mutable reference to it.
    pub fn push_child(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Position in `children()` of the `index`-th child named `name`.
    pub fn child_position(&self, name: &str, index: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.name == name)
            .nth(index)
            .map(|(position, _)| position)
    }

    /// The `index`-th child named `name`.
    pub fn child(&self, name: &str, index: usize) -> Option<&Node> {
        self.child_position(name, index)
            .map(|position| &self.children[position])
    }

    pub fn child_mut(&mut self, name: &str, index: usize) -> Option<&mut Node> {
        self.child_position(name, index)
            .map(move |position| &mut self.children[position])
    }

    /// Number of children named `name`.
    pub fn sibling_count(&self, name: &str) -> usize {
        self.children.iter().filter(|child| child.name == name).count()
    }

    /// Distinct child names in order of first appearance.
    pub fn child_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for child in &self.children {
            if !names.contains(&child.name.as_str()) {
                names.push(&child.name);
            }
        }
        names
    }

    /// Removes and returns the child at `position` in `children()`.
    ///
    /// Later children shift down by one, so sibling indices of same-named
    /// children after it change.
    pub fn remove_child(&mut self, position: usize) -> Option<Node> {
        (position < self.children.len()).then(|| self.children.remove(position))
    }

    /// Drops value, attributes and children, keeping the name.
    pub fn clear(&mut self) {
        self.value = None;
        self.attributes.clear();
        self.children.clear();
    }

    /// Number of nodes in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}
