//! Single line patterns and their capture records.

use crate::pdf_import::error::ExtractionError;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;

/// Named group values captured by one section match.
///
/// Backed by an ordered map so that iteration and debug output are stable
/// between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureRecord {
    values: BTreeMap<String, String>,
}

impl CaptureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a captured group; a missing group is a format error.
    pub fn get(&self, key: &str) -> Result<&str, ExtractionError> {
        self.opt(key)
            .ok_or_else(|| ExtractionError::MissingAttribute(key.to_string()))
    }

    pub fn opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Add all values of `other`, later values replace earlier ones.
    pub fn merge(&mut self, other: CaptureRecord) {
        self.values.extend(other.values);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A compiled regular expression applied to one line at a time.
#[derive(Debug, Clone)]
pub struct LinePattern {
    source: String,
    regex: Regex,
}

impl LinePattern {
    /// Pattern that must match the whole line.
    pub fn new(pattern: &str) -> Result<Self, ExtractionError> {
        Self::compile(pattern, format!("^(?:{})$", pattern))
    }

    /// Pattern that may match anywhere inside a line.
    pub fn unanchored(pattern: &str) -> Result<Self, ExtractionError> {
        Self::compile(pattern, pattern.to_string())
    }

    fn compile(source: &str, expression: String) -> Result<Self, ExtractionError> {
        let regex = Regex::new(&expression).map_err(|e| ExtractionError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written by the rule author.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Match a single line and collect its named groups. Groups that did
    /// not participate in the match are left out.
    pub fn captures(&self, line: &str) -> Option<CaptureRecord> {
        let caps = self.regex.captures(line)?;
        let mut record = CaptureRecord::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                record.insert(name, m.as_str().trim());
            }
        }
        Some(record)
    }

    /// First line in `range` that matches, with its captures.
    pub fn find(&self, lines: &[String], range: Range<usize>) -> Option<(usize, CaptureRecord)> {
        let end = range.end.min(lines.len());
        (range.start..end).find_map(|i| self.captures(&lines[i]).map(|record| (i, record)))
    }
}
