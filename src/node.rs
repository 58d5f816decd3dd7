//! The types of nodes that can appear in a document tree.

mod group;
pub use group::*;

mod record;
pub use record::*;

/// A node in the document tree. Can be any of:
/// - `Leaf` - a single pre-formatted value, rendered as element text
/// - `Group` - uniquely keyed, ordered children, rendered as nested elements
/// - `Repeated` - a sequence of siblings sharing the parent key as their tag name
///
/// The tree is not schema-typed: any node can be replaced by a node of another kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A scalar value, already formatted by the caller.
    Leaf(String),

    /// A set of named children, in insertion order.
    Group(Group),

    /// Sibling entries that all serialize under the same tag name.
    Repeated(Vec<Node>),
}
impl Node {
    /// Create a repeated node from a sequence of entries.
    pub fn repeated<I, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::Repeated(entries.into_iter().map(Into::into).collect())
    }

    /// A short name for the kind of node, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Group(_) => "group",
            Self::Repeated(_) => "repeated group",
        }
    }

    /// Returns the text of a leaf node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the children of a group node.
    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Returns the children of a group node, mutably.
    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Returns the entries of a repeated node.
    #[must_use]
    pub fn as_repeated(&self) -> Option<&[Node]> {
        match self {
            Self::Repeated(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Leaf(value)
    }
}
impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Leaf(value.to_string())
    }
}
impl From<&String> for Node {
    fn from(value: &String) -> Self {
        Self::Leaf(value.clone())
    }
}
impl From<Group> for Node {
    fn from(value: Group) -> Self {
        Self::Group(value)
    }
}

macro_rules! leaf_from_display {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Node {
                fn from(value: $t) -> Self {
                    Self::Leaf(value.to_string())
                }
            }
        )+
    };
}
leaf_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, bool, char);
