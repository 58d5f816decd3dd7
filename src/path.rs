//! Slash-delimited addresses into a document tree.
use crate::error::{TreeError, TreeErrorKind, TreeResult};

/// The separator between path segments:
/// `FatturaElettronicaHeader/DatiTrasmissione/FormatoTrasmissione`
pub const SEPARATOR: char = '/';

/// A location in the tree, as an ordered sequence of one or more keys.
///
/// Segments are opaque to the tree; the only rule is that there is at least one,
/// and none are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<String>,
}
impl NodePath {
    /// Parse a slash-delimited path.
    ///
    /// # Errors
    /// Returns `InvalidPath` if the string is empty, or has a leading, trailing, or doubled separator.
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::NodePath;
    ///
    /// let path = NodePath::parse("Header/Id").unwrap();
    /// assert_eq!(path.segments(), ["Header", "Id"]);
    /// assert!(NodePath::parse("Header//Id").is_err());
    /// ```
    pub fn parse(path: &str) -> TreeResult<Self> {
        if path.is_empty() {
            return Err(TreeErrorKind::InvalidPath("path is empty".to_string()).into());
        }

        let segments = path
            .split(SEPARATOR)
            .map(str::to_string)
            .collect::<Vec<_>>();

        Self::from_segments(segments).map_err(|e| e.with_path(path))
    }

    /// Build a path from already-split segments.
    ///
    /// # Errors
    /// Returns `InvalidPath` if there are no segments, or any segment is empty.
    pub fn from_segments<I, S>(segments: I) -> TreeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TreeErrorKind::InvalidPath("path has no segments".to_string()).into());
        }

        if let Some(i) = segments.iter().position(String::is_empty) {
            return Err(TreeError::bare(TreeErrorKind::InvalidPath(format!(
                "segment {} is empty",
                i + 1
            ))));
        }

        Ok(Self { segments })
    }

    /// Returns the keys of this path, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the final key of the path; the tag name of the addressed node.
    #[must_use]
    pub fn last(&self) -> &str {
        // Never empty; enforced by the constructors
        self.segments.last().map_or("", String::as_str)
    }

    /// Returns the leading segments and the final key.
    #[must_use]
    pub fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }

    /// Returns a new path with `other` appended below this one.
    #[must_use]
    pub fn join(&self, other: &NodePath) -> NodePath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        NodePath { segments }
    }

    /// Returns true if `other` is this path, or lies below it.
    #[must_use]
    pub fn contains(&self, other: &NodePath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}
impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}
impl std::str::FromStr for NodePath {
    type Err = TreeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
impl TryFrom<&str> for NodePath {
    type Error = TreeError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Anything that can be used to address a node: a `&str`, a `String`, or a `NodePath`.
pub trait IntoNodePath {
    /// Convert into a `NodePath`.
    ///
    /// # Errors
    /// Returns `InvalidPath` if the value is not a valid path.
    fn into_node_path(self) -> TreeResult<NodePath>;
}
impl IntoNodePath for NodePath {
    fn into_node_path(self) -> TreeResult<NodePath> {
        Ok(self)
    }
}
impl IntoNodePath for &NodePath {
    fn into_node_path(self) -> TreeResult<NodePath> {
        Ok(self.clone())
    }
}
impl IntoNodePath for &str {
    fn into_node_path(self) -> TreeResult<NodePath> {
        NodePath::parse(self)
    }
}
impl IntoNodePath for String {
    fn into_node_path(self) -> TreeResult<NodePath> {
        NodePath::parse(&self)
    }
}
impl IntoNodePath for &String {
    fn into_node_path(self) -> TreeResult<NodePath> {
        NodePath::parse(self)
    }
}
