//! Block boundary detection.

use super::context::ParseContext;
use super::pattern::LinePattern;
use super::transaction::{BlockTransaction, Transaction};
use crate::pdf_import::error::ExtractionError;
use crate::pdf_import::model::Item;
use std::ops::Range;

/// A repeatable record inside a document.
///
/// Every line matching the start pattern opens an instance. The instance
/// runs up to the next start, the first line matching the end pattern
/// (inclusive, searched from the start line itself) or the end of the
/// window, whichever comes first, and is cut to `max_size` lines if set.
pub struct Block {
    start: LinePattern,
    end: Option<LinePattern>,
    max_size: Option<usize>,
    transaction: Option<Box<dyn BlockTransaction>>,
}

impl Block {
    pub fn new(start: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            start: LinePattern::new(start)?,
            end: None,
            max_size: None,
            transaction: None,
        })
    }

    pub fn end_with(mut self, end: &str) -> Result<Self, ExtractionError> {
        self.end = Some(LinePattern::new(end)?);
        Ok(self)
    }

    pub fn max_size(mut self, lines: usize) -> Self {
        self.max_size = Some(lines.max(1));
        self
    }

    pub fn set<T: 'static>(mut self, transaction: Transaction<T>) -> Self {
        self.transaction = Some(Box::new(transaction));
        self
    }

    pub fn start_pattern(&self) -> &str {
        self.start.as_str()
    }

    /// Instance ranges inside `window`, in document order. A block whose
    /// start pattern never matches has no instances.
    pub fn locate(&self, lines: &[String], window: Range<usize>) -> Vec<Range<usize>> {
        let window = window.start..window.end.min(lines.len());
        let starts: Vec<usize> = window
            .clone()
            .filter(|&i| self.start.is_match(&lines[i]))
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let mut end = starts.get(n + 1).copied().unwrap_or(window.end);
                if let Some(pattern) = &self.end {
                    if let Some(idx) = (start..end).find(|&i| pattern.is_match(&lines[i])) {
                        end = idx + 1;
                    }
                }
                if let Some(max) = self.max_size {
                    end = end.min(start.saturating_add(max));
                }
                start..end
            })
            .collect()
    }

    pub(crate) fn run(
        &self,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Item, ExtractionError> {
        match &self.transaction {
            Some(transaction) => transaction.run(lines, range, ctx),
            None => Err(ExtractionError::incomplete(
                "block",
                format!("no transaction for '{}'", self.start.as_str()),
            )),
        }
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("start", &self.start.as_str())
            .field("end", &self.end.as_ref().map(|p| p.as_str()))
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const TRADES: &str = "Kopf
Wertpapier Abrechnung Kauf
Stück 158
Ausmachender Betrag 9.978,18- EUR
Hinweis
Wertpapier Abrechnung Kauf
Stück 140
Ausmachender Betrag 6.062,19- EUR
Fuß";

    #[test]
    fn test_instances_run_to_next_start() {
        let doc = lines(TRADES);
        let block = Block::new("Wertpapier Abrechnung (Kauf|Verkauf)").unwrap();
        assert_eq!(block.locate(&doc, 0..doc.len()), vec![1..5, 5..9]);
    }

    #[test]
    fn test_end_pattern_is_inclusive() {
        let doc = lines(TRADES);
        let block = Block::new("Wertpapier Abrechnung (Kauf|Verkauf)")
            .unwrap()
            .end_with("Ausmachender Betrag .*")
            .unwrap();
        assert_eq!(block.locate(&doc, 0..doc.len()), vec![1..4, 5..8]);
    }

    #[test]
    fn test_max_size_and_window() {
        let doc = lines(TRADES);
        let block = Block::new("Stück \\d+").unwrap().max_size(1);
        assert_eq!(block.locate(&doc, 0..doc.len()), vec![2..3, 6..7]);
        assert_eq!(block.locate(&doc, 0..5), vec![2..3]);
    }

    #[test]
    fn test_unbounded_max_size() {
        let doc = lines(TRADES);
        let block = Block::new("Wertpapier Abrechnung (Kauf|Verkauf)")
            .unwrap()
            .max_size(usize::MAX);
        assert_eq!(block.locate(&doc, 0..doc.len()), vec![1..5, 5..9]);
    }

    #[test]
    fn test_no_start_no_instances() {
        let doc = lines(TRADES);
        let block = Block::new("Dividendengutschrift").unwrap();
        assert!(block.locate(&doc, 0..doc.len()).is_empty());
    }

    #[test]
    fn test_ranges_never_overlap() {
        let doc = lines(TRADES);
        let block = Block::new(".*").unwrap().end_with("Fuß").unwrap();
        let ranges = block.locate(&doc, 0..doc.len());
        assert_eq!(ranges.len(), doc.len());
        assert!(ranges.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn test_block_without_transaction() {
        let doc = lines(TRADES);
        let block = Block::new("Kopf").unwrap();
        let err = block
            .run(&doc, 0..1, &mut ParseContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), "incomplete");
    }
}
