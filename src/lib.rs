//! # fatturapa
//!
//! Builds FatturaPA electronic invoices as a path-addressed tree, then writes the tree as XML.
//!
//! - [`PathTree`] is an ordered tree of [`Node`]s, written with slash-delimited paths:
//!   `set`, `add_to_group` for repeated elements, `set_default`, and `fill_from_mapping`
//! - [`DefaultRules`] declare default values and the paths they read, and apply them in one pass
//! - [`to_xml`] renders a tree with stable indentation and escaped text
//! - [`Invoice`] maps invoice fields onto the FatturaPA 1.2 layout, and [`Envelope`] wraps the result
//!
//! ```rust
//! use fatturapa::{Group, PathTree};
//!
//! let mut tree = PathTree::new();
//! tree.set("Header/Id", "IT").unwrap();
//! tree.add_to_group("Lines/Line", Group::new().with("desc", "A")).unwrap();
//! tree.add_to_group("Lines/Line", Group::new().with("desc", "B")).unwrap();
//!
//! let xml = tree.to_xml(None).unwrap();
//! assert!(xml.starts_with("<Header>\n  <Id>IT</Id>\n</Header>\n<Lines>\n  <Line>\n"));
//! ```
#![warn(missing_docs)]

mod error;
pub use error::{ErrorContext, TreeError, TreeErrorKind, TreeResult};

mod path;
pub use path::{IntoNodePath, NodePath, SEPARATOR};

mod node;
pub use node::*;

mod tree;
pub use tree::PathTree;

mod defaults;
pub use defaults::{DefaultRule, DefaultRules, DefaultSource};

mod to_xml;
pub use to_xml::{WriterOptions, to_xml, write_xml};

mod envelope;
pub use envelope::Envelope;

mod invoice;
pub use invoice::{Formato, Invoice, dec};
