//! FatturaPA invoice builder.
//!
//! Each builder call copies named input fields into the tree through a fixed mapping table,
//! and declares the schema defaults for the section it wrote. Defaults are applied in one
//! pass when the invoice is rendered, so explicit values always win regardless of call order.
//!
//! # Example
//! ```rust
//! use fatturapa::{Formato, Invoice, Record};
//!
//! let mut invoice = Invoice::new(Formato::Fpr12);
//! invoice.set_mittente(&Record::new()
//!     .with("piva", "01234567890")
//!     .with("ragsoc", "Fornitore S.r.l.")
//!     .with("paese", "IT")).unwrap();
//! invoice.set_intestazione(&Record::new()
//!     .with("data", "2024-01-31")
//!     .with("numero", "1")).unwrap();
//!
//! assert_eq!(invoice.filename("00001").unwrap(), "IT01234567890_00001.xml");
//! let xml = invoice.get_xml().unwrap();
//! assert!(xml.contains("<TipoDocumento>TD01</TipoDocumento>"));
//! ```
use crate::{
    DefaultRule, DefaultRules, Envelope, Group, Node, NodePath, PathTree, Record,
    error::{TreeError, TreeErrorKind, TreeResult},
    path::IntoNodePath,
    to_xml::{WriterOptions, render},
};

const HEADER: &str = "FatturaElettronicaHeader";
const BODY: &str = "FatturaElettronicaBody";

pub(crate) const FORMATO_TRASMISSIONE: &str = "FatturaElettronicaHeader/DatiTrasmissione/FormatoTrasmissione";
const ID_TRASMITTENTE_PAESE: &str =
    "FatturaElettronicaHeader/DatiTrasmissione/IdTrasmittente/IdPaese";
const ID_TRASMITTENTE_CODICE: &str =
    "FatturaElettronicaHeader/DatiTrasmissione/IdTrasmittente/IdCodice";
const CODICE_DESTINATARIO: &str = "FatturaElettronicaHeader/DatiTrasmissione/CodiceDestinatario";
const PROGRESSIVO_INVIO: &str = "FatturaElettronicaHeader/DatiTrasmissione/ProgressivoInvio";

const CEDENTE: &str = "FatturaElettronicaHeader/CedentePrestatore";
const CESSIONARIO: &str = "FatturaElettronicaHeader/CessionarioCommittente";

const DATI_DOCUMENTO: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento";
const DETTAGLIO_LINEE: &str = "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee";
const DETTAGLIO_PAGAMENTO: &str = "FatturaElettronicaBody/DatiPagamento/DettaglioPagamento";

const TRASMITTENTE_MAP: &[(&str, &str)] = &[
    ("paese", ID_TRASMITTENTE_PAESE),
    ("piva", ID_TRASMITTENTE_CODICE),
];

// Relative to the party's own group
const ANAGRAFICA_MAP: &[(&str, &str)] = &[
    ("piva_paese", "DatiAnagrafici/IdFiscaleIVA/IdPaese"),
    ("piva", "DatiAnagrafici/IdFiscaleIVA/IdCodice"),
    ("codfisc", "DatiAnagrafici/CodiceFiscale"),
    ("ragsoc", "DatiAnagrafici/Anagrafica/Denominazione"),
    ("regimefisc", "DatiAnagrafici/RegimeFiscale"),
    ("indirizzo", "Sede/Indirizzo"),
    ("cap", "Sede/CAP"),
    ("comune", "Sede/Comune"),
    ("prov", "Sede/Provincia"),
    ("paese", "Sede/Nazione"),
];

const DESTINATARIO_SDI_MAP: &[(&str, &str)] = &[
    ("sdi_codice", CODICE_DESTINATARIO),
    (
        "sdi_pec",
        "FatturaElettronicaHeader/DatiTrasmissione/PECDestinatario",
    ),
];

const INTESTAZIONE_MAP: &[(&str, &str)] = &[
    (
        "tipodoc",
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/TipoDocumento",
    ),
    (
        "valuta",
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Divisa",
    ),
    (
        "data",
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Data",
    ),
    (
        "numero",
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Numero",
    ),
    ("progressivo", PROGRESSIVO_INVIO),
    (
        "causale",
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Causale",
    ),
];

// Relative to each DettaglioLinee entry
const RIGA_MAP: &[(&str, &str)] = &[
    ("num", "NumeroLinea"),
    ("descrizione", "Descrizione"),
    ("prezzo", "PrezzoUnitario"),
    ("qta", "Quantita"),
    ("importo", "PrezzoTotale"),
    ("perciva", "AliquotaIVA"),
];

const TOTALI_MAP: &[(&str, &str)] = &[
    (
        "importo",
        "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/ImponibileImporto",
    ),
    (
        "perciva",
        "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/AliquotaIVA",
    ),
    (
        "iva",
        "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/Imposta",
    ),
    (
        "esigiva",
        "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/EsigibilitaIVA",
    ),
];

const PAGAMENTO_MAP: &[(&str, &str)] = &[(
    "condizioni",
    "FatturaElettronicaBody/DatiPagamento/CondizioniPagamento",
)];

// Relative to each DettaglioPagamento entry
const MODALITA_MAP: &[(&str, &str)] = &[
    ("modalita", "ModalitaPagamento"),
    ("totale", "ImportoPagamento"),
    ("scadenza", "DataScadenzaPagamento"),
    ("iban", "IBAN"),
];

/// Transmission format, written to `FormatoTrasmissione` and the envelope's `versione`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formato {
    /// Invoices to public administrations
    Fpa12,

    /// Invoices to private parties
    #[default]
    Fpr12,
}
impl Formato {
    /// Returns the token as written in the document.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fpa12 => "FPA12",
            Self::Fpr12 => "FPR12",
        }
    }
}
impl std::fmt::Display for Formato {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format an amount with two decimals, `.` as the separator and no grouping: `1234.50`
///
/// Halves round away from zero. The scaled value is first settled at six decimals, so an
/// amount like `1.005` whose binary value sits just under the half still rounds up.
#[must_use]
pub fn dec(value: f64) -> String {
    let scaled = ((value * 100.0) * 1e6).round() / 1e6;
    let rounded = scaled.round() / 100.0;
    // Avoid printing "-0.00"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.2}")
}

/// An electronic invoice under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    tree: PathTree,
    defaults: DefaultRules,
}
impl Invoice {
    /// Create an invoice with the given transmission format.
    #[must_use]
    pub fn new(formato: Formato) -> Self {
        let trasmissione = Group::new().with("FormatoTrasmissione", formato.as_str());
        let root = Group::new()
            .with(HEADER, Group::new().with("DatiTrasmissione", trasmissione))
            .with(BODY, Group::new());

        tracing::debug!(formato = %formato, "new invoice");
        Self {
            tree: PathTree::from(root),
            defaults: DefaultRules::new(),
        }
    }

    /// Set the transmitting party (e.g. the company, or its accountant).
    ///
    /// Fields: `paese`, `piva`. If not called, the supplier's VAT id is used.
    ///
    /// # Errors
    /// Returns an error if the tree was reshaped so the mapped paths cannot be written.
    pub fn set_trasmittente(&mut self, data: &Record) -> TreeResult<()> {
        self.tree.fill_from_mapping(TRASMITTENTE_MAP, data)
    }

    /// Set the supplier (`CedentePrestatore`), replacing any previous supplier.
    ///
    /// Fields: `piva_paese`, `piva`, `codfisc`, `ragsoc`, `regimefisc`, `indirizzo`, `cap`,
    /// `comune`, `prov`, `paese`. `regimefisc` defaults to `RF01`, and `piva_paese` to `paese`.
    ///
    /// # Errors
    /// Returns an error if the tree was reshaped so the mapped paths cannot be written.
    pub fn set_mittente(&mut self, data: &Record) -> TreeResult<()> {
        let party = self.tree.set_group(CEDENTE)?;
        party.fill_from_mapping(ANAGRAFICA_MAP, data)?;

        self.defaults.extend(anagrafica_defaults(CEDENTE)?);
        self.defaults.extend([
            DefaultRule::copy_from(
                ID_TRASMITTENTE_PAESE,
                format!("{CEDENTE}/DatiAnagrafici/IdFiscaleIVA/IdPaese"),
            )?,
            DefaultRule::copy_from(
                ID_TRASMITTENTE_CODICE,
                format!("{CEDENTE}/DatiAnagrafici/IdFiscaleIVA/IdCodice"),
            )?,
            DefaultRule::value(format!("{CEDENTE}/DatiAnagrafici/RegimeFiscale"), "RF01")?,
        ]);
        Ok(())
    }

    /// Set the customer (`CessionarioCommittente`), replacing any previous customer.
    ///
    /// Fields: as [`Invoice::set_mittente`], plus `sdi_codice` or `sdi_pec`.
    /// `sdi_codice` defaults to `0000000`.
    ///
    /// # Errors
    /// Returns an error if the tree was reshaped so the mapped paths cannot be written.
    pub fn set_destinatario(&mut self, data: &Record) -> TreeResult<()> {
        let party = self.tree.set_group(CESSIONARIO)?;
        party.fill_from_mapping(ANAGRAFICA_MAP, data)?;
        self.tree.fill_from_mapping(DESTINATARIO_SDI_MAP, data)?;

        self.defaults.extend(anagrafica_defaults(CESSIONARIO)?);
        self.defaults
            .declare(DefaultRule::value(CODICE_DESTINATARIO, "0000000")?);
        Ok(())
    }

    /// Set the document header.
    ///
    /// Fields: `tipodoc` (default `TD01`), `valuta` (default `EUR`), `data`, `numero`,
    /// `progressivo` (default: `numero`), `causale`.
    ///
    /// # Errors
    /// Returns an error if the tree was reshaped so the mapped paths cannot be written.
    pub fn set_intestazione(&mut self, data: &Record) -> TreeResult<()> {
        self.tree.fill_from_mapping(INTESTAZIONE_MAP, data)?;

        self.defaults.extend([
            DefaultRule::value(format!("{DATI_DOCUMENTO}/TipoDocumento"), "TD01")?,
            DefaultRule::value(format!("{DATI_DOCUMENTO}/Divisa"), "EUR")?,
            DefaultRule::copy_from(PROGRESSIVO_INVIO, format!("{DATI_DOCUMENTO}/Numero"))?,
        ]);
        Ok(())
    }

    /// Add an invoice line.
    ///
    /// Fields: `num`, `descrizione`, `prezzo`, `qta`, `importo`, `perciva`.
    ///
    /// # Errors
    /// Returns an error if `DettaglioLinee` was set to something other than a repeated group.
    pub fn add_riga(&mut self, data: &Record) -> TreeResult<()> {
        let line = self.tree.add_group(DETTAGLIO_LINEE)?;
        line.fill_from_mapping(RIGA_MAP, data)
    }

    /// Set the VAT summary.
    ///
    /// Fields: `importo`, `perciva`, `iva`, `esigiva`.
    ///
    /// # Errors
    /// Returns an error if the tree was reshaped so the mapped paths cannot be written.
    pub fn set_totali(&mut self, data: &Record) -> TreeResult<()> {
        self.tree.fill_from_mapping(TOTALI_MAP, data)
    }

    /// Set the payment terms, with one `DettaglioPagamento` per entry of `modes`.
    ///
    /// Fields of `data`: `condizioni`. Fields of each mode: `modalita`, `totale`, `scadenza`, `iban`.
    ///
    /// # Errors
    /// Returns an error if `DettaglioPagamento` was set to something other than a repeated group.
    pub fn set_pagamento(&mut self, data: &Record, modes: &[Record]) -> TreeResult<()> {
        self.tree.fill_from_mapping(PAGAMENTO_MAP, data)?;

        for mode in modes {
            let entry = self.tree.add_group(DETTAGLIO_PAGAMENTO)?;
            entry.fill_from_mapping(MODALITA_MAP, mode)?;
        }
        Ok(())
    }

    /// Set any node directly. See [`PathTree::set`].
    ///
    /// # Errors
    /// See [`PathTree::set`].
    pub fn set_node(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<&mut Node> {
        self.tree.set(path, value)
    }

    /// Append to any repeated group directly. See [`PathTree::add_to_group`].
    ///
    /// # Errors
    /// See [`PathTree::add_to_group`].
    pub fn add_node(&mut self, path: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<&mut Node> {
        self.tree.add_to_group(path, value)
    }

    /// Returns the node at a path, as explicitly set (defaults are not applied).
    pub fn get_node(&self, path: impl IntoNodePath) -> Option<&Node> {
        self.tree.get(path)
    }

    /// Returns the tree as explicitly set.
    #[must_use]
    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    /// Returns the default rules declared so far.
    #[must_use]
    pub fn defaults(&self) -> &DefaultRules {
        &self.defaults
    }

    /// Apply the declared defaults to the tree in place. Returns the number applied.
    ///
    /// # Errors
    /// See [`DefaultRules::apply`].
    pub fn apply_defaults(&mut self) -> TreeResult<usize> {
        self.tree.apply_defaults(&self.defaults)
    }

    /// Returns a copy of the tree with the declared defaults applied.
    ///
    /// # Errors
    /// See [`DefaultRules::apply`].
    pub fn resolved(&self) -> TreeResult<PathTree> {
        let mut tree = self.tree.clone();
        tree.apply_defaults(&self.defaults)?;
        Ok(tree)
    }

    /// Render the invoice body, indented for placement inside the document root.
    ///
    /// # Errors
    /// Returns an error if defaults cannot be applied, or the tree cannot be rendered.
    pub fn to_xml(&self) -> TreeResult<String> {
        let tree = self.resolved()?;
        render(tree.root(), &WriterOptions::default().with_depth(1))
    }

    /// Render the complete document, inside the FatturaPA envelope.
    ///
    /// # Errors
    /// Returns an error if defaults cannot be applied, or the tree cannot be rendered.
    pub fn get_xml(&self) -> TreeResult<String> {
        let tree = self.resolved()?;
        Envelope::FATTURA_PA.wrap(tree.root(), None)
    }

    /// Name of the file to send the invoice in: `<IdPaese><IdCodice>_<progressive>.xml`
    ///
    /// The transmitter's id is used, after defaults. `progressive` should be at most 5 alphanumerics.
    ///
    /// # Errors
    /// Returns `MissingValue` if the transmitter's country or code is not set.
    pub fn filename(&self, progressive: &str) -> TreeResult<String> {
        let tree = self.resolved()?;
        let required = |path: &str| -> TreeResult<String> {
            let path = NodePath::parse(path)?;
            tree.get_text(&path)
                .map(str::to_string)
                .ok_or_else(|| TreeError::at(TreeErrorKind::MissingValue, &path))
        };

        let paese = required(ID_TRASMITTENTE_PAESE)?;
        let codice = required(ID_TRASMITTENTE_CODICE)?;
        Ok(format!("{paese}{codice}_{progressive}.xml"))
    }
}
impl Default for Invoice {
    fn default() -> Self {
        Self::new(Formato::default())
    }
}

/// A party with a VAT number takes its VAT country from its address by default.
fn anagrafica_defaults(party: &str) -> TreeResult<[DefaultRule; 1]> {
    Ok([DefaultRule::copy_from(
        format!("{party}/DatiAnagrafici/IdFiscaleIVA/IdPaese"),
        format!("{party}/Sede/Nazione"),
    )?
    .when_set(format!("{party}/DatiAnagrafici/IdFiscaleIVA/IdCodice"))?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mittente() -> Record {
        Record::new()
            .with("piva", "01234567890")
            .with("ragsoc", "Fornitore S.r.l.")
            .with("indirizzo", "Via Roma 1")
            .with("cap", "00100")
            .with("comune", "Roma")
            .with("prov", "RM")
            .with("paese", "IT")
    }

    #[test]
    fn test_new_sets_format() {
        let invoice = Invoice::new(Formato::Fpa12);
        assert_eq!(
            invoice.get_node(FORMATO_TRASMISSIONE).and_then(Node::as_text),
            Some("FPA12")
        );
        assert_eq!(Envelope::FATTURA_PA.version_path, FORMATO_TRASMISSIONE);

        let top: Vec<_> = invoice.tree().root().iter().map(|(k, _)| k).collect();
        assert_eq!(top, [HEADER, BODY]);
    }

    #[test]
    fn test_mittente_defaults() {
        let mut invoice = Invoice::default();
        invoice.set_mittente(&mittente()).unwrap();

        // Nothing applied until rendering
        assert!(invoice.get_node(ID_TRASMITTENTE_PAESE).is_none());

        let tree = invoice.resolved().unwrap();
        assert_eq!(tree.get_text(ID_TRASMITTENTE_PAESE), Some("IT"));
        assert_eq!(tree.get_text(ID_TRASMITTENTE_CODICE), Some("01234567890"));
        assert_eq!(
            tree.get_text(format!("{CEDENTE}/DatiAnagrafici/RegimeFiscale")),
            Some("RF01")
        );
        assert_eq!(
            tree.get_text(format!("{CEDENTE}/DatiAnagrafici/IdFiscaleIVA/IdPaese")),
            Some("IT")
        );
    }

    #[test]
    fn test_trasmittente_wins_over_defaults() {
        let mut invoice = Invoice::default();
        invoice.set_mittente(&mittente()).unwrap();
        invoice
            .set_trasmittente(&Record::new().with("paese", "IT").with("piva", "99999999999"))
            .unwrap();

        assert_eq!(
            invoice.filename("00001").unwrap(),
            "IT99999999999_00001.xml"
        );
    }

    #[test]
    fn test_party_without_vat_gets_no_vat_country() {
        let mut invoice = Invoice::default();
        invoice
            .set_destinatario(&Record::new().with("codfisc", "RSSMRA80A01H501U").with("paese", "IT"))
            .unwrap();

        let tree = invoice.resolved().unwrap();
        assert!(tree.get(format!("{CESSIONARIO}/DatiAnagrafici/IdFiscaleIVA")).is_none());
        assert_eq!(tree.get_text(CODICE_DESTINATARIO), Some("0000000"));
    }

    #[test]
    fn test_destinatario_sdi_code() {
        let mut invoice = Invoice::default();
        invoice
            .set_destinatario(&Record::new().with("sdi_codice", "ABC1234"))
            .unwrap();
        let tree = invoice.resolved().unwrap();
        assert_eq!(tree.get_text(CODICE_DESTINATARIO), Some("ABC1234"));
    }

    #[test]
    fn test_intestazione_defaults() {
        let mut invoice = Invoice::default();
        invoice
            .set_intestazione(&Record::new().with("numero", "42").with("valuta", "USD"))
            .unwrap();

        let tree = invoice.resolved().unwrap();
        assert_eq!(tree.get_text(format!("{DATI_DOCUMENTO}/TipoDocumento")), Some("TD01"));
        assert_eq!(tree.get_text(format!("{DATI_DOCUMENTO}/Divisa")), Some("USD"));
        assert_eq!(tree.get_text(PROGRESSIVO_INVIO), Some("42"));
    }

    #[test]
    fn test_add_riga_and_pagamento() {
        let mut invoice = Invoice::default();
        invoice
            .add_riga(&Record::new().with("num", 1).with("descrizione", "A"))
            .unwrap();
        invoice
            .add_riga(&Record::new().with("num", 2).with("descrizione", "B"))
            .unwrap();
        invoice
            .set_pagamento(
                &Record::new().with("condizioni", "TP01"),
                &[
                    Record::new().with("modalita", "MP05").with("totale", dec(50.0)),
                    Record::new().with("modalita", "MP05").with("totale", dec(72.0)),
                ],
            )
            .unwrap();

        let lines = invoice
            .get_node(DETTAGLIO_LINEE)
            .and_then(Node::as_repeated)
            .unwrap();
        assert_eq!(lines.len(), 2);

        let payments = invoice
            .get_node(DETTAGLIO_PAGAMENTO)
            .and_then(Node::as_repeated)
            .unwrap();
        assert_eq!(
            payments[1].as_group().and_then(|g| g.get_text("ImportoPagamento")),
            Some("72.00")
        );
    }

    #[test]
    fn test_filename_requires_transmitter() {
        let invoice = Invoice::default();
        let err = invoice.filename("00001").unwrap_err();
        assert!(matches!(err.kind, TreeErrorKind::MissingValue));
    }

    #[test]
    fn test_apply_defaults_in_place() {
        let mut invoice = Invoice::default();
        invoice.set_intestazione(&Record::new()).unwrap();
        assert_eq!(invoice.defaults().len(), 3);
        assert_eq!(invoice.apply_defaults().unwrap(), 2);
        assert_eq!(invoice.apply_defaults().unwrap(), 0);
    }

    #[test]
    fn test_dec() {
        assert_eq!(dec(1234.5), "1234.50");
        assert_eq!(dec(0.125), "0.13");
        assert_eq!(dec(-2.0), "-2.00");
        assert_eq!(dec(-0.001), "0.00");
        assert_eq!(dec(22.0), "22.00");

        // Half cents stored just below the half
        assert_eq!(dec(1.005), "1.01");
        assert_eq!(dec(0.285), "0.29");
        assert_eq!(dec(2.675), "2.68");
        assert_eq!(dec(-1.005), "-1.01");
        assert_eq!(dec(1.004), "1.00");
    }

    #[test]
    fn test_formato_display() {
        assert_eq!(Formato::Fpr12.to_string(), "FPR12");
        assert_eq!(Formato::default(), Formato::Fpr12);
    }
}
