//! Sections: ordered groups of line patterns matched together.

use super::context::ParseContext;
use super::pattern::{CaptureRecord, LinePattern};
use crate::pdf_import::error::ExtractionError;
use std::ops::Range;

/// Callback that moves captured values into the object under construction.
pub type AssignFn<T> = Box<
    dyn Fn(&mut T, &CaptureRecord, &mut ParseContext) -> Result<(), ExtractionError> + Send + Sync,
>;

/// Where a section matched inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub record: CaptureRecord,
    /// Line of the first pattern.
    pub first_line: usize,
    /// Line after the last pattern; later sections continue here.
    pub next: usize,
}

/// A list of patterns, each searched after the line matched by the
/// previous one, whose captures are merged into one record.
pub struct Section<T> {
    attributes: Vec<String>,
    patterns: Vec<LinePattern>,
    optional: bool,
    multiple_times: bool,
    stop: Option<LinePattern>,
    assign: Option<AssignFn<T>>,
}

impl<T> Section<T> {
    pub fn new(attributes: &[&str]) -> Self {
        Self {
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            patterns: Vec::new(),
            optional: false,
            multiple_times: false,
            stop: None,
            assign: None,
        }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_multiple_times(&self) -> bool {
        self.multiple_times
    }

    pub(crate) fn set_optional(&mut self) {
        self.optional = true;
    }

    pub(crate) fn set_multiple_times(&mut self) {
        self.multiple_times = true;
    }

    pub(crate) fn set_stop(&mut self, stop: LinePattern) {
        self.stop = Some(stop);
    }

    pub(crate) fn push_pattern(&mut self, pattern: LinePattern) {
        self.patterns.push(pattern);
    }

    pub(crate) fn set_assign(&mut self, assign: AssignFn<T>) {
        self.assign = Some(assign);
    }

    /// Match all patterns in order inside `range`, without backtracking: if
    /// a later pattern misses, the section misses even when an earlier
    /// pattern would also match further down.
    pub fn find(&self, lines: &[String], range: Range<usize>) -> Option<SectionMatch> {
        let mut record = CaptureRecord::new();
        let mut cursor = range.start;
        let mut first_line = None;

        for (n, pattern) in self.patterns.iter().enumerate() {
            // follow-up patterns never look past a stop line
            let end = match &self.stop {
                Some(stop) if n > 0 => stop
                    .find(lines, cursor..range.end)
                    .map_or(range.end, |(idx, _)| idx),
                _ => range.end,
            };
            let (idx, captures) = pattern.find(lines, cursor..end)?;
            first_line.get_or_insert(idx);
            record.merge(captures);
            cursor = idx + 1;
        }

        Some(SectionMatch {
            record,
            first_line: first_line?,
            next: cursor,
        })
    }

    fn missing_attribute(&self, record: &CaptureRecord) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| !record.contains(a))
            .map(String::as_str)
    }

    /// Match and run the assign callback. Returns the line after the match,
    /// or `None` if the section was not found; the caller decides whether
    /// that is an error.
    pub(crate) fn apply(
        &self,
        target: &mut T,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Option<usize>, ExtractionError> {
        self.apply_with(target, lines, range, ctx, self.optional)
    }

    /// Like [`apply`](Self::apply), but a match lacking a declared attribute
    /// counts as no match. Used for the alternatives of a `one_of` group.
    pub(crate) fn apply_alternative(
        &self,
        target: &mut T,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Option<usize>, ExtractionError> {
        self.apply_with(target, lines, range, ctx, true)
    }

    fn apply_with(
        &self,
        target: &mut T,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
        skip_incomplete: bool,
    ) -> Result<Option<usize>, ExtractionError> {
        let mut from = range.start;
        let mut next = None;

        while let Some(found) = self.find(lines, from..range.end) {
            if let Some(missing) = self.missing_attribute(&found.record) {
                // a repeated section keeps the occurrences it already ran
                if skip_incomplete || next.is_some() {
                    log::debug!(
                        "PDF Import: Section [{}] stops, '{}' not captured",
                        self.attributes.join(", "),
                        missing
                    );
                    break;
                }
                return Err(ExtractionError::MissingAttribute(missing.to_string()));
            }

            if let Some(assign) = &self.assign {
                assign(target, &found.record, ctx)?;
            }
            next = Some(found.next);

            if !self.multiple_times {
                break;
            }
            from = found.next;
        }

        Ok(next)
    }

    /// Error for a required section that found nothing.
    pub(crate) fn not_matched(&self) -> ExtractionError {
        ExtractionError::SectionNotMatched {
            attributes: self.attributes.join(", "),
            pattern: self
                .patterns
                .first()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl<T> std::fmt::Debug for Section<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Section")
            .field("attributes", &self.attributes)
            .field(
                "patterns",
                &self.patterns.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )
            .field("optional", &self.optional)
            .field("multiple_times", &self.multiple_times)
            .finish()
    }
}
