use fatturapa::{Formato, Invoice, Node, Record, TreeErrorKind, dec};

const CMP: &str = include_str!("invoice.xml");

fn build() -> Invoice {
    let mut invoice = Invoice::new(Formato::Fpr12);

    invoice
        .set_mittente(
            &Record::new()
                .with("piva", "01234567890")
                .with("ragsoc", "Rossi & Figli S.r.l.")
                .with("indirizzo", "Via Roma 1")
                .with("cap", "00100")
                .with("comune", "Roma")
                .with("prov", "RM")
                .with("paese", "IT"),
        )
        .unwrap();

    invoice
        .set_destinatario(
            &Record::new()
                .with("codfisc", "RSSMRA80A01H501U")
                .with("ragsoc", "Mario \"Super\" Rossi")
                .with("indirizzo", "Via Po 2")
                .with("cap", "10100")
                .with("comune", "Torino")
                .with("prov", "TO")
                .with("paese", "IT")
                .with("sdi_pec", "mario@pec.it"),
        )
        .unwrap();

    invoice
        .set_intestazione(
            &Record::new()
                .with("data", "2024-01-31")
                .with("numero", "7")
                .with("causale", "Servizi <gennaio>"),
        )
        .unwrap();

    invoice
        .add_riga(
            &Record::new()
                .with("num", 1)
                .with("descrizione", "Consulenza")
                .with("prezzo", dec(100.0))
                .with("qta", dec(1.0))
                .with("importo", dec(100.0))
                .with("perciva", dec(22.0)),
        )
        .unwrap();

    invoice
        .add_riga(
            &Record::new()
                .with("num", 2)
                .with("descrizione", "Trasferta")
                .with("prezzo", dec(50.0))
                .with("qta", dec(2.0))
                .with("importo", dec(100.0))
                .with("perciva", dec(22.0)),
        )
        .unwrap();

    invoice
        .set_totali(
            &Record::new()
                .with("importo", dec(200.0))
                .with("perciva", dec(22.0))
                .with("iva", dec(44.0))
                .with("esigiva", "I"),
        )
        .unwrap();

    invoice
        .set_pagamento(
            &Record::new().with("condizioni", "TP02"),
            &[Record::new()
                .with("modalita", "MP05")
                .with("totale", dec(244.0))
                .with("scadenza", "2024-02-29")
                .with("iban", "IT60X0542811101000000123456")],
        )
        .unwrap();

    invoice
}

fn assert_same_lines(actual: &str, expected: &str) {
    if actual == expected {
        return;
    }

    let mut actual_lines = actual.lines();
    for (i, line) in expected.lines().enumerate() {
        match actual_lines.next() {
            None => {
                panic!("Diff at line {}: Not enough rows in rendered document!", i + 1);
            }

            Some(l) => {
                if line == l {
                    continue;
                } else {
                    eprintln!("Diff at line {}", i + 1);

                    eprintln!("Expected: {line}");
                    eprintln!("Got: {l}");
                    break;
                }
            }
        }
    }

    panic!("Rendered document does not match expected output");
}

#[test]
fn test_invoice() {
    let invoice = build();
    let xml = match invoice.get_xml() {
        Ok(xml) => xml,
        Err(e) => panic!("{e}"),
    };

    //    std::fs::write("tests/invoice.xml", &xml).unwrap();
    assert_same_lines(&xml, CMP);
}

#[test]
fn test_body_is_envelope_content() {
    let invoice = build();
    let body = invoice.to_xml().unwrap();

    let start = CMP.find("  <FatturaElettronicaHeader>").unwrap();
    let end = CMP.rfind("</p:FatturaElettronica>").unwrap();
    assert_same_lines(&body, &CMP[start..end]);
}

#[test]
fn test_filename() {
    let invoice = build();
    assert_eq!(invoice.filename("00042").unwrap(), "IT01234567890_00042.xml");
}

#[test]
fn test_rendering_leaves_explicit_tree_untouched() {
    let invoice = build();
    let before = invoice.tree().clone();

    invoice.get_xml().unwrap();
    assert_eq!(invoice.tree(), &before);
    assert!(
        invoice
            .get_node("FatturaElettronicaHeader/DatiTrasmissione/CodiceDestinatario")
            .is_none()
    );
}

#[test]
fn test_raw_nodes() {
    let mut invoice = build();
    invoice
        .set_node(
            "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Causale",
            "Rettifica",
        )
        .unwrap();
    invoice
        .add_node(
            "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee",
            fatturapa::Group::new().with("NumeroLinea", 3),
        )
        .unwrap();

    let lines = invoice
        .get_node("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee")
        .and_then(Node::as_repeated)
        .unwrap();
    assert_eq!(lines.len(), 3);

    let xml = invoice.get_xml().unwrap();
    assert!(xml.contains("<Causale>Rettifica</Causale>"));
    assert_eq!(xml.matches("<DettaglioLinee>").count(), 3);
}

#[test]
fn test_mixing_set_and_add_is_rejected() {
    let mut invoice = Invoice::default();
    invoice
        .set_node(
            "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee",
            fatturapa::Group::new().with("NumeroLinea", 1),
        )
        .unwrap();

    let err = invoice
        .add_riga(&Record::new().with("num", 2))
        .unwrap_err();
    assert!(matches!(err.kind, TreeErrorKind::InvalidNodeShape(_)));
}
