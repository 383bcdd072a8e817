//! Bank Statement Import Module
//!
//! Extracts trades, dividends and account movements from the text of bank
//! statements. Every bank is a rule set for the extraction engine in
//! [`parser`]; [`parse_document`] picks the right one.

mod common;
pub mod dkb;
pub mod error;
pub mod model;
pub mod parser;
pub mod postbank;
pub mod roche_connect;
pub mod securities;
pub mod units;
pub mod values;

use std::path::Path;

pub use error::{ExtractionError, ValueError};
pub use model::{Item, Money, ParsedTransaction, ParsedTransactionType, ResultItem, Security, Unit, UnitType};
pub use parser::{BankExtractor, Document, ErrorEntry, ParseResult};

/// All available bank rule sets.
pub fn get_parsers() -> Result<Vec<BankExtractor>, ExtractionError> {
    Ok(vec![
        dkb::extractor()?,
        postbank::extractor()?,
        roche_connect::extractor()?,
    ])
}

/// Run `extractors` over `document`.
///
/// Rule sets whose bank identifier occurs in the document are tried first,
/// the others afterwards. The first result with items wins; failing that,
/// the first result that recorded errors. `None` means no rule set
/// recognized anything.
pub fn parse_document(document: &Document, extractors: &[BankExtractor]) -> Option<ParseResult> {
    let (detected, others): (Vec<&BankExtractor>, Vec<&BankExtractor>) =
        extractors.iter().partition(|e| e.detect(document));

    log::info!(
        "PDF Import: {} detected as [{}]",
        document.name(),
        detected.iter().map(|e| e.name()).collect::<Vec<_>>().join(", ")
    );

    let mut first_failure = None;
    for extractor in detected.into_iter().chain(others) {
        let result = extractor.extract_document(document);
        if !result.items.is_empty() {
            return Some(result);
        }
        if !result.errors.is_empty() && first_failure.is_none() {
            first_failure = Some(result);
        }
    }

    if first_failure.is_none() {
        log::warn!("PDF Import: no rule set matched {}", document.name());
    }
    first_failure
}

/// Read a text dump from disk and run [`parse_document`] on it.
pub fn parse_file(path: &Path, extractors: &[BankExtractor]) -> Result<Option<ParseResult>, ExtractionError> {
    let document = Document::from_file(path)?;
    Ok(parse_document(&document, extractors))
}
