//! The fixed document wrapper written around a serialized tree.
use crate::{
    Group, NodePath,
    error::{TreeError, TreeErrorKind, TreeResult},
    invoice::FORMATO_TRASMISSIONE,
    to_xml::{WriterOptions, encode_entities, render},
};

/// The root element, XML declaration and namespace attributes around a document body.
///
/// The only variable part is the root's version attribute, read from a fixed path in the tree.
/// Attributes are written one per line after the first, as the FatturaPA samples are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Qualified name of the root element.
    pub root: &'static str,

    /// Name of the root attribute holding the version token.
    pub version_attribute: &'static str,

    /// Path of the leaf holding the version token.
    pub version_path: &'static str,

    /// Fixed attributes written after the version, as `(name, value)`.
    pub attributes: &'static [(&'static str, &'static str)],
}
impl Envelope {
    /// FatturaPA 1.2: `<p:FatturaElettronica versione="FPR12" ...>`
    pub const FATTURA_PA: Envelope = Envelope {
        root: "p:FatturaElettronica",
        version_attribute: "versione",
        version_path: FORMATO_TRASMISSIONE,
        attributes: &[
            ("xmlns:ds", "http://www.w3.org/2000/09/xmldsig#"),
            (
                "xmlns:p",
                "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2",
            ),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            (
                "xsi:schemaLocation",
                "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2 http://www.fatturapa.gov.it/export/fatturazione/sdi/fatturapa/v1.2/Schema_del_file_xml_FatturaPA_versione_1.2.xsd",
            ),
        ],
    };

    /// Render `group` inside this envelope, with the body one level deep.
    ///
    /// # Errors
    /// - `MissingValue` if the version path is not set to a leaf
    /// - any error from [`crate::write_xml`]
    pub fn wrap(&self, group: &Group, indent: Option<&str>) -> TreeResult<String> {
        let version_path = NodePath::parse(self.version_path)?;
        let version = group
            .get_text(&version_path)
            .ok_or_else(|| TreeError::at(TreeErrorKind::MissingValue, &version_path))?;

        let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str(&format!(
            "<{} {}=\"{}\"",
            self.root,
            self.version_attribute,
            encode_entities(version)?
        ));

        for (i, (name, value)) in self.attributes.iter().enumerate() {
            // First attribute shares the root's line
            let separator = if i == 0 { " " } else { "\n" };
            output.push_str(&format!("{separator}{name}=\"{}\"", encode_entities(value)?));
        }
        output.push_str(">\n");

        let mut options = WriterOptions::default().with_depth(1);
        if let Some(indent) = indent {
            options.indent = indent.to_string();
        }

        output.push_str(&render(group, &options)?);
        output.push_str(&format!("</{}>", self.root));
        Ok(output)
    }
}
