//! Line tokenizer.

use crate::pdf_import::error::ExtractionError;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Text of one statement split into normalized lines.
///
/// Lines are NFC normalized so that decomposed umlauts from PDF converters
/// match the composed characters in rule patterns. Non-breaking and other
/// unicode spaces become plain spaces, and surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    lines: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        let lines = text.lines().map(normalize_line).collect();
        Self {
            name: name.into(),
            lines,
        }
    }

    /// Read a text dump from disk. Invalid UTF-8 is replaced rather than
    /// rejected, converters regularly emit stray bytes in footers.
    pub fn from_file(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, &text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

fn normalize_line(line: &str) -> String {
    line.nfc()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
