//! Per-document state shared by all blocks and sections.

use crate::pdf_import::error::ExtractionError;
use crate::pdf_import::model::Security;
use crate::pdf_import::securities::SecurityCache;
use crate::pdf_import::values::{parse_exchange_rate, NumberLocale};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Key under which rule sets store the document exchange rate.
pub const EXCHANGE_RATE: &str = "exchangeRate";

/// Parse context for one document.
///
/// Created fresh for every document and dropped when the document is done.
/// Values written by one section are visible to every later section of the
/// same document, across blocks and document types.
#[derive(Debug, Default)]
pub struct ParseContext {
    values: BTreeMap<String, String>,
    securities: SecurityCache,
    warnings: Vec<String>,
}

impl ParseContext {
    pub fn new(known_securities: Vec<Security>) -> Self {
        Self {
            values: BTreeMap::new(),
            securities: SecurityCache::new(known_securities),
            warnings: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.put(key, "true");
    }

    /// Exchange rate stored under [`EXCHANGE_RATE`], if any.
    pub fn exchange_rate(&self) -> Result<Option<Decimal>, ExtractionError> {
        match self.get(EXCHANGE_RATE) {
            Some(value) => Ok(Some(parse_exchange_rate(value, NumberLocale::English)?)),
            None => Ok(None),
        }
    }

    pub fn set_exchange_rate(&mut self, rate: Decimal) {
        self.put(EXCHANGE_RATE, rate.normalize().to_string());
    }

    pub fn get_or_create_security(&mut self, candidate: Security) -> Security {
        self.securities.get_or_create(candidate)
    }

    pub fn securities(&self) -> &SecurityCache {
        &self.securities
    }

    pub(crate) fn take_unreported_security(&mut self, security: &Security) -> Option<Security> {
        self.securities.take_unreported(security)
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("PDF Import: {}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
