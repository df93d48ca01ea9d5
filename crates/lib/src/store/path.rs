//! Path types for addressing nodes in an option tree.
//!
//! Paths are `/`-delimited sequences of segments. Each segment names a child
//! and may carry a sibling index in brackets to pick among children that
//! share the same name:
//!
//! ```text
//! /simulation/domain/extents
//! /material_phase[1]/density
//! ```
//!
//! A segment without an index selects the first sibling with that name
//! (index 0). The empty path and `/` both name the root.
//!
//! # Usage
//!
//! ```rust
//! use opttree::store::{OptionPath, Segment};
//! use std::str::FromStr;
//!
//! let path = OptionPath::from_str("/material_phase[1]/density")?;
//! assert_eq!(path.len(), 2);
//! assert_eq!(path.file_name(), Some(&Segment::new("density")?));
//!
//! let built = OptionPath::root()
//!     .push(Segment::indexed("material_phase", 1)?)
//!     .push(Segment::new("density")?);
//! assert_eq!(built, path);
//! # Ok::<(), opttree::store::PathError>(())
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error type for malformed path text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// A segment could not be parsed.
    #[error("Invalid segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: String },
}

impl PathError {
    fn segment(segment: &str, reason: &str) -> Self {
        PathError::InvalidSegment {
            segment: segment.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One step of a path: a child name plus an optional sibling index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    name: String,
    index: Option<usize>,
}

impl Segment {
    /// Creates a segment without an explicit index.
    ///
    /// # Errors
    /// Fails if the name is empty or contains `/`, `[` or `]`.
    pub fn new(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Segment { name, index: None })
    }

    /// Creates a segment selecting the `index`-th sibling named `name`.
    pub fn indexed(name: impl Into<String>, index: usize) -> Result<Self, PathError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Segment {
            name,
            index: Some(index),
        })
    }

    /// The child name this segment selects.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit index, if one was written.
    pub fn explicit_index(&self) -> Option<usize> {
        self.index
    }

    /// The sibling index this segment selects. A bare name means index 0.
    pub fn index(&self) -> usize {
        self.index.unwrap_or(0)
    }
}

fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::segment(name, "segment names cannot be empty"));
    }
    if name.contains(['/', '[', ']']) {
        return Err(PathError::segment(
            name,
            "segment names cannot contain '/', '[' or ']'",
        ));
    }
    Ok(())
}

impl FromStr for Segment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(open) = s.find('[') else {
            return Segment::new(s);
        };
        let Some(digits) = s[open + 1..].strip_suffix(']') else {
            return Err(PathError::segment(s, "unterminated or trailing index"));
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PathError::segment(s, "index must be a non-negative integer"));
        }
        let index = digits
            .parse::<usize>()
            .map_err(|_| PathError::segment(s, "index is too large"))?;
        Segment::indexed(&s[..open], index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed path into an option tree.
///
/// `OptionPath` keeps its normalized text alongside the parsed segments so
/// it can be handed to any store operation taking `impl AsRef<str>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OptionPath {
    inner: String,
    segments: Vec<Segment>,
}

impl OptionPath {
    /// The path naming the root node.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses and normalizes path text.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(Segment::from_str)
            .try_fold(Self::root(), |path, segment| Ok(path.push(segment?)))
    }

    /// Appends a segment.
    pub fn push(mut self, segment: Segment) -> Self {
        self.inner.push('/');
        self.inner.push_str(&segment.to_string());
        self.segments.push(segment);
        self
    }

    /// Joins this path with another path.
    pub fn join(self, other: &OptionPath) -> Self {
        other
            .segments
            .iter()
            .cloned()
            .fold(self, |path, segment| path.push(segment))
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns an iterator over the segment names, ignoring indices.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(Segment::name)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if this path names the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<OptionPath> {
        let (_, init) = self.segments.split_last()?;
        Some(
            init.iter()
                .cloned()
                .fold(Self::root(), |path, segment| path.push(segment)),
        )
    }

    /// Returns the final segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns the normalized path text.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for OptionPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl FromStr for OptionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OptionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}
