//! Extractor driver: runs a bank's document types over one document.

use super::context::ParseContext;
use super::document::Document;
use super::document_type::DocumentType;
use crate::pdf_import::error::ExtractionError;
use crate::pdf_import::model::{Item, ResultItem, Security};
use serde::{Serialize, Serializer};

/// A block that could not be turned into an item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub source: String,
    pub bank: String,
    pub document_type: String,
    pub block: String,
    /// 1-based line where the block instance starts.
    pub line: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: ExtractionError,
}

impl ErrorEntry {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}

fn serialize_error<S: Serializer>(error: &ExtractionError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Outcome of running one rule set over one document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub source: String,
    pub bank: String,
    pub items: Vec<ResultItem>,
    pub errors: Vec<ErrorEntry>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.errors.is_empty()
    }
}

/// Rule set of one bank: identifiers for detection plus document types.
pub struct BankExtractor {
    id: String,
    name: String,
    identifiers: Vec<String>,
    document_types: Vec<DocumentType>,
    known_securities: Vec<Security>,
}

impl BankExtractor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            identifiers: Vec::new(),
            document_types: Vec::new(),
            known_securities: Vec::new(),
        }
    }

    pub fn add_bank_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifiers.push(identifier.into());
        self
    }

    pub fn add_document_type(mut self, document_type: DocumentType) -> Self {
        self.document_types.push(document_type);
        self
    }

    /// Securities already known to the caller; they never produce new
    /// security items.
    pub fn with_known_securities(mut self, securities: Vec<Security>) -> Self {
        self.known_securities = securities;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn document_types(&self) -> &[DocumentType] {
        &self.document_types
    }

    /// True if one of the bank identifiers occurs in the document.
    pub fn detect(&self, document: &Document) -> bool {
        self.identifiers.iter().any(|id| document.contains(id))
    }

    /// Extract all items of `document`. Failing blocks are appended to
    /// `errors` and do not stop the remaining blocks.
    pub fn extract(&self, document: &Document, errors: &mut Vec<ErrorEntry>) -> Vec<ResultItem> {
        self.run(document, errors).0
    }

    /// Like [`extract`](Self::extract), collecting errors and warnings into
    /// one result.
    pub fn extract_document(&self, document: &Document) -> ParseResult {
        let mut errors = Vec::new();
        let (items, warnings) = self.run(document, &mut errors);
        ParseResult {
            source: document.name().to_string(),
            bank: self.name.clone(),
            items,
            errors,
            warnings,
        }
    }

    fn run(&self, document: &Document, errors: &mut Vec<ErrorEntry>) -> (Vec<ResultItem>, Vec<String>) {
        let lines = document.lines();
        let mut ctx = ParseContext::new(self.known_securities.clone());
        let mut items = Vec::new();

        for document_type in &self.document_types {
            if !document_type.matches(document) {
                continue;
            }
            document_type.provide_context(lines, &mut ctx);

            let instances = document_type.instances(lines);
            log::debug!(
                "PDF Import: {} '{}' matched {}, {} block instance(s)",
                self.name,
                document_type.label(),
                document.name(),
                instances.len()
            );

            for (block_idx, range) in instances {
                let Some(block) = document_type.blocks().get(block_idx) else {
                    continue;
                };
                let start = range.start;

                match block.run(lines, range, &mut ctx) {
                    Ok(item) => {
                        if let Some(security) = item.security().cloned() {
                            if let Some(created) = ctx.take_unreported_security(&security) {
                                items.push(ResultItem::new(document.name(), Item::Security(created)));
                            }
                        }
                        items.push(ResultItem::new(document.name(), item));
                    }
                    Err(error) => {
                        log::warn!(
                            "PDF Import: {} block '{}' at line {} of {} failed: {}",
                            self.name,
                            block.start_pattern(),
                            start + 1,
                            document.name(),
                            error
                        );
                        errors.push(ErrorEntry {
                            source: document.name().to_string(),
                            bank: self.name.clone(),
                            document_type: document_type.label().to_string(),
                            block: block.start_pattern().to_string(),
                            line: start + 1,
                            error,
                        });
                    }
                }
            }
        }

        log::info!(
            "PDF Import: {} extracted {} item(s) from {}",
            self.name,
            items.len(),
            document.name()
        );
        (items, ctx.into_warnings())
    }
}

impl std::fmt::Debug for BankExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankExtractor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("identifiers", &self.identifiers)
            .field("document_types", &self.document_types)
            .finish()
    }
}
