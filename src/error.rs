//! Error handling for tree mutation and XML output
use crate::NodePath;

/// A result type for tree operations, which can be either a successful value or an error.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// An error that occurred while building or writing a document tree.
#[derive(Debug)]
pub struct TreeError {
    /// The context of the error
    pub context: Box<ErrorContext>,

    /// The kind of error that occurred
    pub kind: TreeErrorKind,
}
impl TreeError {
    /// Creates a new `TreeError`
    #[must_use]
    pub fn new(kind: TreeErrorKind, context: ErrorContext) -> Self {
        Self {
            context: Box::new(context),
            kind,
        }
    }

    /// Creates a new `TreeError` with no path context.
    #[must_use]
    pub fn bare(kind: TreeErrorKind) -> Self {
        Self::new(kind, ErrorContext::default())
    }

    /// Creates a new `TreeError` pointing at the given path.
    #[must_use]
    pub fn at(kind: TreeErrorKind, path: &NodePath) -> Self {
        Self::new(kind, ErrorContext::new(path.to_string()))
    }

    /// Adds a path to the error context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.context.path = Some(path.into());
        self
    }
}
impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.context)?;

        for line in self.kind.to_string().lines() {
            writeln!(f, "= {line}")?;
        }
        Ok(())
    }
}
impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}
impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        Self::bare(TreeErrorKind::Io(err))
    }
}
impl From<TreeErrorKind> for TreeError {
    fn from(kind: TreeErrorKind) -> Self {
        Self::bare(kind)
    }
}

/// The kind of error that occurred while building or writing a document tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeErrorKind {
    /// A path was empty or contained an empty segment
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A node did not have the shape an operation required
    #[error("Invalid node shape: {0}")]
    InvalidNodeShape(String),

    /// A value required to render the document was not set
    #[error("Required value is not set")]
    MissingValue,

    /// Default rules read each other's targets in a loop
    #[error("Default rules form a dependency cycle through {0}")]
    DefaultCycle(String),

    /// Entity encoding of a value failed
    #[error("Could not encode entities: {0}")]
    Encoding(String),

    /// IO error occurred while writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Context describing where in the tree the error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The slash-delimited path being operated on, if available.
    pub path: Option<String>,
}
impl ErrorContext {
    /// Creates a new `ErrorContext` for the given path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            writeln!(f, "| {path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path_and_kind() {
        let path = NodePath::parse("A/B").unwrap();
        let err = TreeError::at(TreeErrorKind::InvalidNodeShape("leaf".into()), &path);
        let text = err.to_string();
        assert_eq!(text, "| A/B\n= Invalid node shape: leaf\n");
    }

    #[test]
    fn test_display_without_path() {
        let err = TreeError::bare(TreeErrorKind::MissingValue);
        assert_eq!(err.to_string(), "= Required value is not set\n");
    }
}
