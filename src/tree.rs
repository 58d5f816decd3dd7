use crate::{
    DefaultRules, Group, Node, Record,
    error::TreeResult,
    path::IntoNodePath,
    to_xml::{WriterOptions, write_xml},
};
use std::io::Write;

/// A document under construction: an ordered tree of named nodes, addressed by slash-delimited paths.
///
/// The root is always a [`Group`]; its children become the top-level elements when written.
/// All path operations are also available on any sub-group, for building sub-records in place.
///
/// # Example
/// ```rust
/// use fatturapa::{Group, PathTree};
///
/// let mut tree = PathTree::new();
/// tree.set("Header/Id", "IT").unwrap();
/// tree.set("Header/Code", "123").unwrap();
/// tree.add_to_group("Lines/Line", Group::new().with("desc", "A")).unwrap();
///
/// assert_eq!(tree.get_text("Header/Id"), Some("IT"));
/// println!("{}", tree.to_xml(None).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTree {
    root: Group,
}
impl PathTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root group.
    #[must_use]
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Returns the root group, mutably.
    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Returns the node at the given path, or `None` if it is not set. See [`Group::get`].
    pub fn get(&self, path: impl IntoNodePath) -> Option<&Node> {
        self.root.get(path)
    }

    /// Returns the node at the given path mutably. See [`Group::get_mut`].
    pub fn get_mut(&mut self, path: impl IntoNodePath) -> Option<&mut Node> {
        self.root.get_mut(path)
    }

    /// Returns the text at the given path, if it is set to a leaf.
    pub fn get_text(&self, path: impl IntoNodePath) -> Option<&str> {
        self.root.get_text(path)
    }

    /// Set the node at the given path. See [`Group::set`].
    ///
    /// # Errors
    /// Returns an error if the path is malformed, or passes through a leaf or repeated group.
    pub fn set(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<&mut Node> {
        self.root.set(path, value)
    }

    /// Set an empty group at the given path and return it. See [`Group::set_group`].
    ///
    /// # Errors
    /// See [`PathTree::set`].
    pub fn set_group(&mut self, path: impl IntoNodePath) -> TreeResult<&mut Group> {
        self.root.set_group(path)
    }

    /// Append an entry to the repeated group at the given path. See [`Group::add_to_group`].
    ///
    /// # Errors
    /// Returns an error if the path is malformed, or holds something other than a repeated group.
    pub fn add_to_group(
        &mut self,
        path: impl IntoNodePath,
        value: impl Into<Node>,
    ) -> TreeResult<&mut Node> {
        self.root.add_to_group(path, value)
    }

    /// Append an empty group to the repeated group at the given path. See [`Group::add_group`].
    ///
    /// # Errors
    /// See [`PathTree::add_to_group`].
    pub fn add_group(&mut self, path: impl IntoNodePath) -> TreeResult<&mut Group> {
        self.root.add_group(path)
    }

    /// Set the node at the given path only if nothing is set there. See [`Group::set_default`].
    ///
    /// # Errors
    /// See [`PathTree::set`].
    pub fn set_default(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<bool> {
        self.root.set_default(path, value)
    }

    /// Copy fields from a record into the tree. See [`Group::fill_from_mapping`].
    ///
    /// # Errors
    /// See [`PathTree::set`].
    pub fn fill_from_mapping(&mut self, mapping: &[(&str, &str)], record: &Record) -> TreeResult<()> {
        self.root.fill_from_mapping(mapping, record)
    }

    /// Apply a set of default rules to the whole tree. See [`DefaultRules::apply`].
    ///
    /// # Errors
    /// Returns an error if the rules cannot be ordered, or a target cannot be written.
    pub fn apply_defaults(&mut self, rules: &DefaultRules) -> TreeResult<usize> {
        rules.apply(&mut self.root)
    }

    /// Create a formatted XML string from this tree.
    ///
    /// `indent` is used for each level of nesting. If `None`, two spaces are used.
    ///
    /// # Errors
    /// Can fail if a node cannot be rendered. See [`crate::to_xml()`].
    pub fn to_xml(&self, indent: Option<&str>) -> TreeResult<String> {
        crate::to_xml::to_xml(&self.root, indent)
    }

    /// Write this tree as formatted XML using the given writer.
    ///
    /// # Errors
    /// Can fail if a node cannot be rendered, or the writer fails.
    pub fn to_xml_with_writer<W: Write>(
        &self,
        writer: &mut W,
        options: &WriterOptions,
    ) -> TreeResult<()> {
        write_xml(writer, &self.root, options)
    }
}
impl From<Group> for PathTree {
    fn from(root: Group) -> Self {
        Self { root }
    }
}
