//! The option tree store.
//!
//! [`OptionStore`] owns a rooted tree of named [`Node`]s. Every operation is
//! addressed by a path string (see [`path`]) and returns a typed
//! [`OptionError`] for each documented failure instead of panicking.
//!
//! # Addressing
//!
//! - Segments are separated by `/`; the empty path names the root.
//! - `name[i]` selects the `i`-th child called `name` (0-based, insertion
//!   order). A bare `name` selects index 0.
//! - Deleting a node shifts the index of every later same-named sibling
//!   down by one. Indices are positions, not handles: callers holding an
//!   index into a sibling group must recompute it after a delete.
//!
//! # Usage
//!
//! ```
//! use opttree::store::{OptionStore, OptionType, Rank, Shape};
//!
//! let mut store = OptionStore::new();
//! store.set_option("/simulation/timestep", 0.01)?;
//! store.set_option("/simulation/domain/extents", vec![10.0, 20.0, 5.0])?;
//!
//! assert_eq!(store.get_type("/simulation/timestep")?, Some(OptionType::Double));
//! assert_eq!(store.get_rank("/simulation/timestep")?, Rank::Scalar);
//! assert_eq!(store.get::<f64>("/simulation/timestep")?, 0.01);
//! assert_eq!(store.get_shape("/simulation/domain/extents")?, Shape::new(3, 1));
//!
//! store.delete_node("/simulation/domain")?;
//! assert!(!store.have_option("/simulation/domain/extents"));
//! assert!(store.have_option("/simulation/timestep"));
//! # Ok::<(), opttree::store::OptionError>(())
//! ```

use std::{collections::BTreeMap, fmt};

pub mod errors;
pub mod node;
pub mod path;
pub mod shared;
pub mod value;

pub use errors::{ErrorKind, OptionError};
pub use node::Node;
pub use path::{OptionPath, PathError, Segment};
pub use shared::SharedOptionStore;
pub use value::{Matrix, OptionType, OptionValue, Rank, Shape, Shaped, Value};

/// Name given to the root node of a new store.
pub const DEFAULT_ROOT_NAME: &str = "options";

/// A mutable, path-addressed tree of typed option values.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionStore {
    root: Node,
}

impl Default for OptionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(path: &str) -> Result<OptionPath, OptionError> {
    OptionPath::parse(path).map_err(|source| OptionError::InvalidPath {
        path: path.to_string(),
        source,
    })
}

/// Text of the first `len` segments of `path`.
fn prefix(path: &OptionPath, len: usize) -> String {
    path.segments()
        .iter()
        .take(len)
        .cloned()
        .fold(OptionPath::root(), OptionPath::push)
        .to_string()
}

fn not_found(path: &OptionPath) -> OptionError {
    OptionError::PathNotFound {
        path: path.to_string(),
    }
}

impl OptionStore {
    /// Creates an empty store whose root is named [`DEFAULT_ROOT_NAME`].
    pub fn new() -> Self {
        Self::with_root_name(DEFAULT_ROOT_NAME)
    }

    /// Creates an empty store with a custom root name.
    pub fn with_root_name(name: impl Into<String>) -> Self {
        Self {
            root: Node::new(name),
        }
    }

    /// Wraps an existing tree.
    pub fn from_root(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    fn find(&self, path: &OptionPath) -> Option<&Node> {
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| {
                node.child(segment.name(), segment.index())
            })
    }

    fn find_mut(&mut self, path: &OptionPath) -> Option<&mut Node> {
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = current.child_mut(segment.name(), segment.index())?;
        }
        Some(current)
    }

    fn find_or_err(&self, path: &OptionPath) -> Result<&Node, OptionError> {
        self.find(path).ok_or_else(|| {
            tracing::trace!(path = %path, "Path did not resolve");
            not_found(path)
        })
    }

    fn find_mut_or_err(&mut self, path: &OptionPath) -> Result<&mut Node, OptionError> {
        match self.find_mut(path) {
            Some(node) => Ok(node),
            None => {
                tracing::trace!(path = %path, "Path did not resolve");
                Err(not_found(path))
            }
        }
    }

    // ===== Path resolution =====

    /// Resolves a path to its node.
    ///
    /// # Errors
    /// [`OptionError::PathNotFound`] if any segment has no matching child,
    /// [`OptionError::InvalidPath`] if the path text is malformed.
    pub fn resolve(&self, path: impl AsRef<str>) -> Result<&Node, OptionError> {
        let path = parse(path.as_ref())?;
        self.find_or_err(&path)
    }

    /// Returns true if the path resolves to a node, with or without a value.
    ///
    /// Never fails: malformed paths simply do not resolve.
    pub fn have_option(&self, path: impl AsRef<str>) -> bool {
        parse(path.as_ref())
            .ok()
            .is_some_and(|path| self.find(&path).is_some())
    }

    /// Number of distinct child names under the node at `path`.
    pub fn child_count(&self, path: impl AsRef<str>) -> Result<usize, OptionError> {
        Ok(self.resolve(path)?.child_names().len())
    }

    /// Name of the `index`-th distinct child name under the node at `path`,
    /// in order of first insertion.
    ///
    /// Iterating `0..child_count(path)` visits every child name once; use
    /// [`OptionStore::sibling_count`] to find how many children share it.
    pub fn nth_child_name(
        &self,
        path: impl AsRef<str>,
        index: usize,
    ) -> Result<String, OptionError> {
        let parsed = parse(path.as_ref())?;
        let names = self.find_or_err(&parsed)?.child_names();
        names
            .get(index)
            .map(|name| name.to_string())
            .ok_or_else(|| OptionError::IndexOutOfRange {
                path: parsed.to_string(),
                index,
                count: names.len(),
            })
    }

    /// Number of nodes under the parent of `path` that share its final
    /// segment's name. An index on the final segment is ignored.
    ///
    /// Returns 0 when the parent does not resolve or the path is malformed,
    /// and 1 for the root.
    pub fn sibling_count(&self, path: impl AsRef<str>) -> usize {
        let Ok(path) = parse(path.as_ref()) else {
            return 0;
        };
        let (Some(last), Some(parent)) = (path.file_name(), path.parent()) else {
            return 1;
        };
        self.find(&parent)
            .map_or(0, |node| node.sibling_count(last.name()))
    }

    // ===== Typed value access =====

    /// Element type stored at `path`, or `None` for a container node.
    pub fn get_type(&self, path: impl AsRef<str>) -> Result<Option<OptionType>, OptionError> {
        Ok(self.resolve(path)?.value().map(Value::option_type))
    }

    /// Rank of the value at `path`.
    ///
    /// # Errors
    /// [`OptionError::TypeMismatch`] if the node is a container.
    pub fn get_rank(&self, path: impl AsRef<str>) -> Result<Rank, OptionError> {
        Ok(self.get_value(path)?.rank())
    }

    /// Shape of the value at `path`: `[1, 1]` for scalars, `[len, 1]` for
    /// vectors, `[rows, cols]` for matrices.
    ///
    /// # Errors
    /// [`OptionError::TypeMismatch`] if the node is a container.
    pub fn get_shape(&self, path: impl AsRef<str>) -> Result<Shape, OptionError> {
        Ok(self.get_value(path)?.shape())
    }

    /// The untyped value at `path`.
    ///
    /// # Errors
    /// [`OptionError::TypeMismatch`] if the node is a container.
    pub fn get_value(&self, path: impl AsRef<str>) -> Result<&Value, OptionError> {
        let parsed = parse(path.as_ref())?;
        self.find_or_err(&parsed)?
            .value()
            .ok_or_else(|| OptionError::TypeMismatch {
                path: parsed.to_string(),
                expected: "a value".to_string(),
                actual: "none".to_string(),
            })
    }

    /// Reads the value at `path` as `T`.
    ///
    /// `T` declares the element type and rank expected; the stored value
    /// must match both exactly.
    ///
    /// ```
    /// # use opttree::store::{Matrix, OptionStore};
    /// let mut store = OptionStore::new();
    /// store.set_option("/mesh/dims", Matrix::from_rows(vec![vec![1i64, 2], vec![3, 4]])?)?;
    ///
    /// let dims: Matrix<i64> = store.get("/mesh/dims")?;
    /// assert_eq!(dims.row(1), Some(&[3, 4][..]));
    ///
    /// assert!(store.get::<Matrix<f64>>("/mesh/dims").unwrap_err().is_type_error());
    /// assert!(store.get::<Vec<i64>>("/mesh/dims").unwrap_err().is_rank_error());
    /// # Ok::<(), opttree::store::OptionError>(())
    /// ```
    pub fn get<T: OptionValue>(&self, path: impl AsRef<str>) -> Result<T, OptionError> {
        let parsed = parse(path.as_ref())?;
        let node = self.find_or_err(&parsed)?;
        let type_mismatch = |actual: &str| OptionError::TypeMismatch {
            path: parsed.to_string(),
            expected: T::TYPE.name().to_string(),
            actual: actual.to_string(),
        };

        let value = node.value().ok_or_else(|| type_mismatch("none"))?;
        if value.option_type() != T::TYPE {
            return Err(type_mismatch(value.type_name()));
        }
        if value.rank() != T::RANK {
            return Err(OptionError::RankMismatch {
                path: parsed.to_string(),
                expected: T::RANK,
                actual: value.rank(),
            });
        }
        T::from_value(value).ok_or_else(|| type_mismatch(value.type_name()))
    }

    /// Reads the value at `path`, or returns `default` if the path does not
    /// resolve. Type and rank mismatches are still errors.
    pub fn get_or<T: OptionValue>(&self, path: impl AsRef<str>, default: T) -> Result<T, OptionError> {
        match self.get(path) {
            Err(OptionError::PathNotFound { .. }) => Ok(default),
            result => result,
        }
    }

    /// Replaces the value of an existing node, returning the previous value.
    ///
    /// Type, rank and shape are taken from the new value; a different type
    /// or rank replaces the old value entirely.
    ///
    /// # Errors
    /// [`OptionError::PathNotFound`] if the node does not exist. Use
    /// [`OptionStore::set_option`] to create it on the way.
    pub fn set_value(
        &mut self,
        path: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, OptionError> {
        let parsed = parse(path.as_ref())?;
        let value = value.into();
        tracing::debug!(
            path = %parsed,
            option_type = %value.option_type(),
            rank = %value.rank(),
            "Setting option value"
        );
        Ok(self.find_mut_or_err(&parsed)?.set_value(value))
    }

    /// Creates the node at `path` if needed, then sets its value.
    ///
    /// Returns the previous value, if the node already had one.
    pub fn set_option(
        &mut self,
        path: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, OptionError> {
        let parsed = parse(path.as_ref())?;
        let (node, _) = self.ensure_node(&parsed)?;
        let value = value.into();
        tracing::debug!(
            path = %parsed,
            option_type = %value.option_type(),
            rank = %value.rank(),
            "Setting option"
        );
        Ok(node.set_value(value))
    }

    // ===== Structural mutation =====

    /// Checks that every missing segment of `path` can be created.
    ///
    /// A missing segment may only append directly after the existing
    /// same-named siblings. Runs before any mutation so a failing add leaves
    /// the tree untouched.
    fn check_creatable(&self, path: &OptionPath) -> Result<(), OptionError> {
        let mut current = Some(&self.root);
        for (depth, segment) in path.segments().iter().enumerate() {
            let count = current.map_or(0, |node| node.sibling_count(segment.name()));
            if segment.index() > count {
                return Err(OptionError::IndexOutOfRange {
                    path: prefix(path, depth + 1),
                    index: segment.index(),
                    count,
                });
            }
            current = current.and_then(|node| node.child(segment.name(), segment.index()));
        }
        Ok(())
    }

    /// Walks `path`, creating missing nodes. Returns the final node and
    /// whether it was created.
    fn ensure_node(&mut self, path: &OptionPath) -> Result<(&mut Node, bool), OptionError> {
        self.check_creatable(path)?;

        let mut current = &mut self.root;
        let mut created = false;
        for segment in path.segments() {
            let count = current.sibling_count(segment.name());
            created = segment.index() == count;
            current = if created {
                tracing::debug!(name = segment.name(), "Creating option node");
                current.push_child(Node::new(segment.name()))
            } else {
                match current.child_mut(segment.name(), segment.index()) {
                    Some(child) => child,
                    None => return Err(not_found(path)),
                }
            };
        }
        Ok((current, created))
    }

    /// Creates the node at `path`, along with any missing ancestors.
    ///
    /// Adding an existing container succeeds without change. An index one
    /// past the last same-named sibling appends a new sibling.
    ///
    /// # Errors
    /// - [`OptionError::AlreadyExists`] if the node exists and has a value.
    /// - [`OptionError::IndexOutOfRange`] if an index skips past the end of
    ///   its sibling group. Nothing is created in that case.
    pub fn add_node(&mut self, path: impl AsRef<str>) -> Result<(), OptionError> {
        let parsed = parse(path.as_ref())?;
        let (node, created) = self.ensure_node(&parsed)?;
        if !created && !node.is_container() {
            return Err(OptionError::AlreadyExists {
                path: parsed.to_string(),
            });
        }
        tracing::debug!(path = %parsed, created, "Added option");
        Ok(())
    }

    /// Removes the node at `path` and its whole subtree, returning it.
    ///
    /// Later same-named siblings shift down one index. Deleting the root
    /// clears it; the root itself always exists.
    pub fn delete_node(&mut self, path: impl AsRef<str>) -> Result<Node, OptionError> {
        let parsed = parse(path.as_ref())?;
        let (Some(last), Some(parent_path)) = (parsed.file_name(), parsed.parent()) else {
            tracing::debug!("Clearing option tree root");
            let removed = self.root.clone();
            self.root.clear();
            return Ok(removed);
        };

        let parent = self
            .find_mut(&parent_path)
            .ok_or_else(|| not_found(&parsed))?;
        let removed = parent
            .child_position(last.name(), last.index())
            .and_then(|position| parent.remove_child(position))
            .ok_or_else(|| not_found(&parsed))?;
        tracing::debug!(path = %parsed, nodes = removed.subtree_len(), "Deleted option");
        Ok(removed)
    }

    /// Attaches or overwrites a string attribute, returning the previous
    /// value. Attributes never affect type, rank or shape.
    pub fn set_attribute(
        &mut self,
        path: impl AsRef<str>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, OptionError> {
        let parsed = parse(path.as_ref())?;
        let name = name.into();
        tracing::debug!(path = %parsed, attribute = %name, "Setting attribute");
        Ok(self.find_mut_or_err(&parsed)?.set_attribute(name, value))
    }

    /// Reads one attribute of the node at `path`.
    pub fn attribute(&self, path: impl AsRef<str>, name: &str) -> Result<Option<&str>, OptionError> {
        Ok(self.resolve(path)?.attribute(name))
    }

    /// All attributes of the node at `path`.
    pub fn attributes(
        &self,
        path: impl AsRef<str>,
    ) -> Result<&BTreeMap<String, String>, OptionError> {
        Ok(self.resolve(path)?.attributes())
    }

    /// Removes one attribute, returning its value if it was set.
    pub fn remove_attribute(
        &mut self,
        path: impl AsRef<str>,
        name: &str,
    ) -> Result<Option<String>, OptionError> {
        let parsed = parse(path.as_ref())?;
        Ok(self.find_mut_or_err(&parsed)?.remove_attribute(name))
    }

    // ===== Traversal =====

    /// Canonical path of every node below the root, depth first in
    /// insertion order. Names shared by several siblings carry an index.
    pub fn option_paths(&self) -> Vec<String> {
        fn walk(node: &Node, base: &str, out: &mut Vec<String>) {
            for (position, child) in node.children().iter().enumerate() {
                let path = format!("{base}/{}", indexed_name(node, position));
                out.push(path.clone());
                walk(child, &path, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }
}

/// Name of `parent.children()[position]`, with its sibling index when the
/// name is shared.
fn indexed_name(parent: &Node, position: usize) -> String {
    let children = parent.children();
    let name = children[position].name();
    if parent.sibling_count(name) > 1 {
        let index = children[..position]
            .iter()
            .filter(|sibling| sibling.name() == name)
            .count();
        format!("{name}[{index}]")
    } else {
        name.to_string()
    }
}

impl fmt::Display for OptionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(
            f: &mut fmt::Formatter<'_>,
            node: &Node,
            label: &str,
            depth: usize,
        ) -> fmt::Result {
            write!(f, "{:indent$}{label}", "", indent = depth * 2)?;
            for (name, value) in node.attributes() {
                write!(f, " @{name}={value:?}")?;
            }
            if let Some(value) = node.value() {
                write!(f, " = {value} ({}, rank {}", value.type_name(), value.rank())?;
                if value.rank() == Rank::Matrix {
                    write!(f, ", shape {}", value.shape())?;
                }
                write!(f, ")")?;
            }
            writeln!(f)?;
            for (position, child) in node.children().iter().enumerate() {
                write_node(f, child, &indexed_name(node, position), depth + 1)?;
            }
            Ok(())
        }

        write_node(f, &self.root, self.root.name(), 0)
    }
}
