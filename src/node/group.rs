use super::{Node, Record};
use crate::{
    NodePath,
    error::{TreeError, TreeErrorKind, TreeResult},
    path::IntoNodePath,
};
use indexmap::{IndexMap, map::Entry};

/// A node's named children: `<key>...</key>` for each entry, in insertion order.
///
/// Every path operation is relative to the group it is called on, so a sub-record
/// can be built in place by calling these on a child group.
///
/// Replacing the value of an existing key keeps that key's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    children: IndexMap<String, Node>,
}
impl Group {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a direct child. The key is used as-is, and is not parsed as a path.
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::Group;
    ///
    /// let line = Group::new().with("NumeroLinea", 1).with("Descrizione", "Consulenza");
    /// assert_eq!(line.len(), 2);
    /// ```
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.children.insert(key.into(), value.into());
        self
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterate over the direct children, in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Node)> + ExactSizeIterator {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the node at the given path, or `None` if it is not set.
    ///
    /// Never modifies the tree. Paths that pass through a leaf or a repeated group,
    /// and paths that cannot be parsed, are simply not set.
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::Group;
    ///
    /// let mut group = Group::new();
    /// group.set("Sede/Nazione", "IT").unwrap();
    ///
    /// assert_eq!(group.get("Sede/Nazione").and_then(|n| n.as_text()), Some("IT"));
    /// assert!(group.get("Sede/CAP").is_none());
    /// ```
    pub fn get(&self, path: impl IntoNodePath) -> Option<&Node> {
        let path = path.into_node_path().ok()?;
        let (parents, last) = path.split_last();

        let mut group = self;
        for key in parents {
            match group.children.get(key.as_str())? {
                Node::Group(child) => group = child,
                _ => return None,
            }
        }

        group.children.get(last)
    }

    /// Returns the node at the given path mutably, or `None` if it is not set.
    ///
    /// Resolution follows the same rules as [`Group::get`].
    pub fn get_mut(&mut self, path: impl IntoNodePath) -> Option<&mut Node> {
        let path = path.into_node_path().ok()?;
        let (parents, last) = path.split_last();

        let mut group = self;
        for key in parents {
            match group.children.get_mut(key.as_str())? {
                Node::Group(child) => group = child,
                _ => return None,
            }
        }

        group.children.get_mut(last)
    }

    /// Returns the text at the given path, if it is set to a leaf.
    pub fn get_text(&self, path: impl IntoNodePath) -> Option<&str> {
        self.get(path).and_then(Node::as_text)
    }

    /// Set the node at the given path, replacing anything already there.
    /// Missing groups along the path are created.
    ///
    /// Returns the node now at that path, so it can be built further in place.
    ///
    /// # Errors
    /// - `InvalidPath` if the path is empty or malformed
    /// - `InvalidNodeShape` if the path passes through a leaf or a repeated group
    pub fn set(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<&mut Node> {
        let path = path.into_node_path()?;
        let value = value.into();
        tracing::trace!(path = %path, kind = value.kind(), "set node");

        let parent = self.parent_mut(&path)?;
        match parent.children.entry(path.last().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(value);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(value)),
        }
    }

    /// Set an empty group at the given path, and return it for filling.
    ///
    /// # Errors
    /// See [`Group::set`].
    pub fn set_group(&mut self, path: impl IntoNodePath) -> TreeResult<&mut Group> {
        let path = path.into_node_path()?;
        match self.set(&path, Group::new())? {
            Node::Group(group) => Ok(group),
            other => Err(TreeError::at(
                TreeErrorKind::InvalidNodeShape(format!("expected a group, found a {}", other.kind())),
                &path,
            )),
        }
    }

    /// Append a new entry to the repeated group at the given path.
    ///
    /// If nothing is set at the path, it becomes a new repeated group.
    /// A path that should ever hold more than one entry must only be written with this method.
    ///
    /// Returns the newly appended entry.
    ///
    /// # Errors
    /// - `InvalidPath` if the path is empty or malformed
    /// - `InvalidNodeShape` if the path already holds a leaf or a single group,
    ///   or passes through one
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::{Group, Node};
    ///
    /// let mut group = Group::new();
    /// group.add_to_group("Lines/Line", Group::new().with("desc", "A")).unwrap();
    /// group.add_to_group("Lines/Line", Group::new().with("desc", "B")).unwrap();
    ///
    /// let lines = group.get("Lines/Line").and_then(Node::as_repeated).unwrap();
    /// assert_eq!(lines.len(), 2);
    /// ```
    pub fn add_to_group(
        &mut self,
        path: impl IntoNodePath,
        value: impl Into<Node>,
    ) -> TreeResult<&mut Node> {
        let path = path.into_node_path()?;
        let value = value.into();

        let parent = self.parent_mut(&path)?;
        let node = parent
            .children
            .entry(path.last().to_string())
            .or_insert_with(|| Node::Repeated(Vec::new()));

        match node {
            Node::Repeated(entries) => {
                entries.push(value);
                tracing::trace!(path = %path, entries = entries.len(), "appended entry");

                let index = entries.len() - 1;
                Ok(&mut entries[index])
            }

            other => Err(TreeError::at(
                TreeErrorKind::InvalidNodeShape(format!(
                    "cannot append to a {}; only repeated groups can hold several entries",
                    other.kind()
                )),
                &path,
            )),
        }
    }

    /// Append an empty group to the repeated group at the given path, and return it for filling.
    ///
    /// # Errors
    /// See [`Group::add_to_group`].
    pub fn add_group(&mut self, path: impl IntoNodePath) -> TreeResult<&mut Group> {
        let path = path.into_node_path()?;
        match self.add_to_group(&path, Group::new())? {
            Node::Group(group) => Ok(group),
            other => Err(TreeError::at(
                TreeErrorKind::InvalidNodeShape(format!("expected a group, found a {}", other.kind())),
                &path,
            )),
        }
    }

    /// Set the node at the given path, but only if nothing is set there yet.
    ///
    /// Returns true if the value was applied. Explicit values are never overwritten.
    ///
    /// # Errors
    /// See [`Group::set`].
    pub fn set_default(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<bool> {
        let path = path.into_node_path()?;
        if self.get(&path).is_some() {
            return Ok(false);
        }

        self.set(path, value)?;
        Ok(true)
    }

    /// For each `(field, path)` pair, set the field's value at the path if the record has it.
    ///
    /// Fields that are missing or null in the record are skipped.
    ///
    /// # Errors
    /// See [`Group::set`].
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::{Group, Record};
    ///
    /// const MAP: &[(&str, &str)] = &[("cap", "Sede/CAP"), ("comune", "Sede/Comune")];
    ///
    /// let mut group = Group::new();
    /// group.fill_from_mapping(MAP, &Record::new().with("cap", "00100")).unwrap();
    ///
    /// assert_eq!(group.get_text("Sede/CAP"), Some("00100"));
    /// assert!(group.get("Sede/Comune").is_none());
    /// ```
    pub fn fill_from_mapping(&mut self, mapping: &[(&str, &str)], record: &Record) -> TreeResult<()> {
        for (field, path) in mapping {
            if let Some(value) = record.get(field) {
                self.set(*path, value.clone())?;
            }
        }
        Ok(())
    }

    /// Walk to the group that holds the last segment of `path`, creating missing groups.
    fn parent_mut(&mut self, path: &NodePath) -> TreeResult<&mut Group> {
        let (parents, _) = path.split_last();

        let mut group = self;
        for key in parents {
            let child = group
                .children
                .entry(key.clone())
                .or_insert_with(|| Node::Group(Group::new()));

            group = match child {
                Node::Group(child) => child,
                other => {
                    return Err(TreeError::at(
                        TreeErrorKind::InvalidNodeShape(format!(
                            "cannot descend into {key}, it is a {}",
                            other.kind()
                        )),
                        path,
                    ));
                }
            };
        }

        Ok(group)
    }
}
impl<K, V> FromIterator<(K, V)> for Group
where
    K: Into<String>,
    V: Into<Node>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            children: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
