//! XML formatting module
//!
//! Use [`to_xml`] unless you need to write the XML to a file or other writer.
use crate::{
    Group, Node,
    error::{TreeError, TreeErrorKind, TreeResult},
};
use htmlentity::entity::ICodedDataTrait;
use htmlentity::entity::{CharacterSet, EncodeType, encode};

const INDENT: &str = "  ";

/// Formatting options for [`write_xml`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Written once per level of nesting. Two spaces by default.
    pub indent: String,

    /// Nesting level of the top-level elements. 0 by default.
    pub depth: usize,
}
impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: INDENT.to_string(),
            depth: 0,
        }
    }
}
impl WriterOptions {
    /// Use the given string for each level of indentation.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Start the top-level elements at the given nesting level.
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// Render the children of a group as a formatted XML string.
///
/// `indent` is used for each level of nesting. If `None`, two spaces are used.
///
/// # Errors
/// - `InvalidNodeShape` if a key is not a valid element name, or a repeated group directly contains another
/// - `Encoding` if a value cannot be entity encoded
///
/// # Example
/// ```rust
/// use fatturapa::{Group, to_xml};
///
/// let mut group = Group::new();
/// group.set("Header/Id", "IT").unwrap();
/// group.set("Header/Code", "123").unwrap();
///
/// let xml = to_xml(&group, None).unwrap();
/// assert_eq!(xml, "<Header>\n  <Id>IT</Id>\n  <Code>123</Code>\n</Header>\n");
/// ```
pub fn to_xml(group: &Group, indent: Option<&str>) -> TreeResult<String> {
    let mut options = WriterOptions::default();
    if let Some(indent) = indent {
        options.indent = indent.to_string();
    }

    render(group, &options)
}

/// Write to a buffer and return it as a string.
pub(crate) fn render(group: &Group, options: &WriterOptions) -> TreeResult<String> {
    let mut buffer = vec![];
    write_xml(&mut buffer, group, options)?;

    String::from_utf8(buffer).map_err(|e| {
        TreeError::bare(TreeErrorKind::Encoding(format!(
            "Failed to convert to UTF-8: {e}"
        )))
    })
}

/// Render the children of a group as formatted XML using the given writer.
///
/// Elements are written in insertion order. A repeated group writes one element per entry,
/// all with the same tag name and at the same depth.
///
/// # Errors
/// See [`to_xml`]. Also returns `Io` if the writer fails.
///
/// The tree shape is checked before anything is written, so an `InvalidNodeShape` error leaves
/// the writer untouched. `Encoding` and `Io` errors can still occur after part of the document
/// has been written.
pub fn write_xml(
    writer: &mut dyn std::io::Write,
    group: &Group,
    options: &WriterOptions,
) -> TreeResult<()> {
    tracing::debug!(children = group.len(), depth = options.depth, "writing xml");
    check_shape(group)?;

    let mut stack = vec![];
    push_children(&mut stack, group, options.depth);

    loop {
        let Some((task, depth)) = stack.pop() else {
            break;
        };
        let tab = options.indent.repeat(depth);

        match task {
            NodeTask::Close(name) => {
                writer.write_all(format!("{tab}</{name}>\n").as_bytes())?;
            }

            NodeTask::Open { name, node } => match node {
                Node::Leaf(text) => {
                    let text = encode_entities(text)?;
                    writer.write_all(format!("{tab}<{name}>{text}</{name}>\n").as_bytes())?;
                }

                Node::Group(children) => {
                    writer.write_all(format!("{tab}<{name}>\n").as_bytes())?;
                    stack.push((NodeTask::Close(name), depth));
                    push_children(&mut stack, children, depth + 1);
                }

                Node::Repeated(entries) => {
                    for entry in entries.iter().rev() {
                        stack.push((NodeTask::Open { name, node: entry }, depth));
                    }
                }
            },
        }
    }

    Ok(())
}

/// Queue the children of a group, so that the first child is popped first.
fn push_children<'t>(stack: &mut Vec<(NodeTask<'t>, usize)>, group: &'t Group, depth: usize) {
    for (name, node) in group.iter().rev() {
        stack.push((NodeTask::Open { name, node }, depth));
    }
}

/// Find the first unrenderable node in document order.
///
/// Keys must be element names, and a repeated group cannot directly contain another.
fn check_shape(group: &Group) -> TreeResult<()> {
    let mut stack: Vec<(String, &str, &Node)> = group
        .iter()
        .rev()
        .map(|(name, node)| (name.to_string(), name, node))
        .collect();

    while let Some((path, name, node)) = stack.pop() {
        if !is_element_name(name) {
            return Err(TreeError::bare(TreeErrorKind::InvalidNodeShape(format!(
                "{name:?} is not a valid element name"
            )))
            .with_path(path));
        }

        match node {
            Node::Leaf(_) => {}

            Node::Group(children) => {
                for (child, node) in children.iter().rev() {
                    stack.push((format!("{path}/{child}"), child, node));
                }
            }

            Node::Repeated(entries) => {
                if entries.iter().any(|e| matches!(e, Node::Repeated(_))) {
                    return Err(TreeError::bare(TreeErrorKind::InvalidNodeShape(
                        "a repeated group cannot directly contain another".to_string(),
                    ))
                    .with_path(path));
                }

                for entry in entries.iter().rev() {
                    if let Node::Group(children) = entry {
                        for (child, node) in children.iter().rev() {
                            stack.push((format!("{path}/{child}"), child, node));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Element names: a letter, `_` or `:`, then letters, digits, `_`, `:`, `-` or `.`
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

/// Escape `&`, `<`, `>`, `"` and `'`, leaving every other character untouched.
pub(crate) fn encode_entities(input: &str) -> TreeResult<String> {
    encode(
        input.as_bytes(),
        &EncodeType::NamedOrHex,
        &CharacterSet::SpecialChars,
    )
    .to_string()
    .map_err(|e| TreeError::bare(TreeErrorKind::Encoding(e.to_string())))
}

enum NodeTask<'t> {
    Open { name: &'t str, node: &'t Node },
    Close(&'t str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nested_groups() {
        let mut group = Group::new();
        group.set("Header/Id", "IT").unwrap();
        group.set("Header/Code", "123").unwrap();

        let result = to_xml(&group, None).unwrap();
        assert_eq!(result, "<Header>\n  <Id>IT</Id>\n  <Code>123</Code>\n</Header>\n");
    }

    #[test]
    fn test_write_repeated_siblings() {
        let mut group = Group::new();
        group.add_to_group("Lines/Line", Group::new().with("desc", "A")).unwrap();
        group.add_to_group("Lines/Line", Group::new().with("desc", "B")).unwrap();

        let result = to_xml(&group, None).unwrap();
        assert_eq!(
            result,
            "<Lines>\n  <Line>\n    <desc>A</desc>\n  </Line>\n  <Line>\n    <desc>B</desc>\n  </Line>\n</Lines>\n"
        );
    }

    #[test]
    fn test_write_repeated_leaves() {
        let group = Group::new().with("Tag", Node::repeated(["a", "b"]));
        let result = to_xml(&group, None).unwrap();
        assert_eq!(result, "<Tag>a</Tag>\n<Tag>b</Tag>\n");
    }

    #[test]
    fn test_escapes_special_characters_only() {
        let group = Group::new().with("Text", "a <b> & \"c\" 'd' Perché €");
        let result = to_xml(&group, None).unwrap();

        let inner = result
            .strip_prefix("<Text>")
            .and_then(|s| s.strip_suffix("</Text>\n"))
            .unwrap();
        assert!(inner.starts_with("a &lt;b&gt; &amp; &quot;c&quot; "));
        assert!(inner.ends_with(" Perché €"));
        assert!(!inner.contains('\''));
        assert!(!inner.contains('<'));
        assert!(!inner.contains('"'));
    }

    #[test]
    fn test_sibling_order_is_first_insertion() {
        let mut group = Group::new();
        group.set("A", "1").unwrap();
        group.set("B", "2").unwrap();
        group.set("C", "3").unwrap();
        group.set("C", "30").unwrap();
        group.set("A", "10").unwrap();

        let result = to_xml(&group, None).unwrap();
        assert_eq!(result, "<A>10</A>\n<B>2</B>\n<C>30</C>\n");
    }

    #[test]
    fn test_empty_group_and_leaf() {
        let group = Group::new().with("Empty", Group::new()).with("Blank", "");
        let result = to_xml(&group, Some("\t")).unwrap();
        assert_eq!(result, "<Empty>\n</Empty>\n<Blank></Blank>\n");
    }

    #[test]
    fn test_custom_indent_and_depth() {
        let mut group = Group::new();
        group.set("A/B", "x").unwrap();

        let mut output = Vec::new();
        let options = WriterOptions::default().with_indent("\t").with_depth(1);
        write_xml(&mut output, &group, &options).unwrap();

        let result = String::from_utf8(output).unwrap();
        assert_eq!(result, "\t<A>\n\t\t<B>x</B>\n\t</A>\n");
    }

    #[test]
    fn test_nested_repeated_is_an_error() {
        let mut group = Group::new();
        group.add_to_group("Outer/Inner", Node::repeated(["x"])).unwrap();

        let err = to_xml(&group, None).unwrap_err();
        assert!(matches!(err.kind, TreeErrorKind::InvalidNodeShape(_)));
        assert_eq!(err.context.path.as_deref(), Some("Outer/Inner"));
    }

    #[test]
    fn test_invalid_element_name_is_an_error() {
        let group = Group::new().with("A", Group::new().with("1st", "x"));
        let err = to_xml(&group, None).unwrap_err();
        assert!(matches!(err.kind, TreeErrorKind::InvalidNodeShape(_)));
        assert_eq!(err.context.path.as_deref(), Some("A/1st"));

        assert!(to_xml(&Group::new().with("a b", "x"), None).is_err());
        assert!(to_xml(&Group::new().with("", "x"), None).is_err());
    }

    #[test]
    fn test_invalid_shape_writes_nothing() {
        let mut group = Group::new();
        group.set("Header/Id", "IT").unwrap();
        group.set("Body/Bad Name", "x").unwrap();

        let mut output = vec![];
        let err = write_xml(&mut output, &group, &WriterOptions::default()).unwrap_err();
        assert!(matches!(err.kind, TreeErrorKind::InvalidNodeShape(_)));
        assert_eq!(err.context.path.as_deref(), Some("Body/Bad Name"));
        assert!(output.is_empty());

        let mut group = Group::new().with("First", "ok");
        group.add_to_group("Outer/Inner", Node::repeated(["x"])).unwrap();

        let mut output = vec![];
        assert!(write_xml(&mut output, &group, &WriterOptions::default()).is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_element_names() {
        assert!(is_element_name("FatturaElettronicaHeader"));
        assert!(is_element_name("p:FatturaElettronica"));
        assert!(is_element_name("_x-1.2"));
        assert!(!is_element_name("-x"));
        assert!(!is_element_name("a<b"));
    }
}
