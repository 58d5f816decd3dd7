//! Invoice Example
//!
//! This example builds a small invoice with the `fatturapa` crate, and prints its file name and document.
//!
//! Tree writes and applied defaults are logged at debug level.
use fatturapa::{Formato, Invoice, Record, TreeResult, dec};

fn build() -> TreeResult<Invoice> {
    //
    // Each builder call takes a flat record of named fields.
    // Fields that are missing are skipped, and the schema defaults fill in the rest.
    let mut invoice = Invoice::new(Formato::Fpr12);

    invoice.set_mittente(
        &Record::new()
            .with("piva", "01234567890")
            .with("ragsoc", "Fornitore S.r.l.")
            .with("indirizzo", "Via Roma 1")
            .with("cap", "00100")
            .with("comune", "Roma")
            .with("prov", "RM")
            .with("paese", "IT"),
    )?;

    invoice.set_destinatario(
        &Record::new()
            .with("codfisc", "RSSMRA80A01H501U")
            .with("ragsoc", "Mario Rossi")
            .with("paese", "IT")
            .with("sdi_codice", "ABC1234"),
    )?;

    invoice.set_intestazione(&Record::new().with("data", "2024-01-31").with("numero", "1"))?;

    //
    // Amounts are formatted before they enter the tree
    invoice.add_riga(
        &Record::new()
            .with("num", 1)
            .with("descrizione", "Consulenza")
            .with("prezzo", dec(100.0))
            .with("qta", dec(1.0))
            .with("importo", dec(100.0))
            .with("perciva", dec(22.0)),
    )?;

    invoice.set_totali(
        &Record::new()
            .with("importo", dec(100.0))
            .with("perciva", dec(22.0))
            .with("iva", dec(22.0))
            .with("esigiva", "I"),
    )?;

    Ok(invoice)
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    //
    // Defaults are applied to a copy of the tree when rendering, so the invoice itself
    // only ever holds what was explicitly set.
    let result = build().and_then(|invoice| Ok((invoice.filename("00001")?, invoice.get_xml()?)));
    match result {
        Ok((name, xml)) => {
            println!("{name}");
            println!("{xml}");
        }
        Err(e) => eprintln!("{e}"),
    }
}
