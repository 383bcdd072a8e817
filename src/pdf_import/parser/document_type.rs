//! Document types: gate patterns plus the blocks tried on matching documents.

use super::block::Block;
use super::context::ParseContext;
use super::document::Document;
use super::pattern::LinePattern;
use crate::pdf_import::error::ExtractionError;
use std::ops::Range;

/// Seeds the context from the whole document before any block runs.
pub type ContextProvider = Box<dyn Fn(&[String], &mut ParseContext) + Send + Sync>;

pub struct DocumentType {
    gates: Vec<LinePattern>,
    trim_before: Option<LinePattern>,
    trim_after: Option<LinePattern>,
    context_provider: Option<ContextProvider>,
    blocks: Vec<Block>,
}

impl DocumentType {
    /// `gate` must occur somewhere in a line of the document.
    pub fn new(gate: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            gates: vec![LinePattern::unanchored(gate)?],
            trim_before: None,
            trim_after: None,
            context_provider: None,
            blocks: Vec::new(),
        })
    }

    /// Additional gate; all gates must be found.
    pub fn require(mut self, gate: &str) -> Result<Self, ExtractionError> {
        self.gates.push(LinePattern::unanchored(gate)?);
        Ok(self)
    }

    /// Ignore all lines before the first line matching `marker`.
    pub fn trim_before(mut self, marker: &str) -> Result<Self, ExtractionError> {
        self.trim_before = Some(LinePattern::new(marker)?);
        Ok(self)
    }

    /// Ignore the first line matching `marker` and everything after it.
    pub fn trim_after(mut self, marker: &str) -> Result<Self, ExtractionError> {
        self.trim_after = Some(LinePattern::new(marker)?);
        Ok(self)
    }

    pub fn context_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&[String], &mut ParseContext) + Send + Sync + 'static,
    {
        self.context_provider = Some(Box::new(provider));
        self
    }

    pub fn add_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Label used in logs and error entries.
    pub fn label(&self) -> &str {
        self.gates.first().map(|g| g.as_str()).unwrap_or_default()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.gates
            .iter()
            .all(|gate| document.lines().iter().any(|line| gate.is_match(line)))
    }

    /// Lines left after applying the trim markers.
    pub fn window(&self, lines: &[String]) -> Range<usize> {
        let start = self
            .trim_before
            .as_ref()
            .and_then(|p| p.find(lines, 0..lines.len()))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let end = self
            .trim_after
            .as_ref()
            .and_then(|p| p.find(lines, start..lines.len()))
            .map(|(idx, _)| idx)
            .unwrap_or(lines.len());
        start..end
    }

    pub(crate) fn provide_context(&self, lines: &[String], ctx: &mut ParseContext) {
        if let Some(provider) = &self.context_provider {
            provider(lines, ctx);
        }
    }

    /// Instances of all blocks, ordered by start line and then by block
    /// declaration order.
    pub(crate) fn instances(&self, lines: &[String]) -> Vec<(usize, Range<usize>)> {
        let window = self.window(lines);
        let mut instances: Vec<(usize, Range<usize>)> = self
            .blocks
            .iter()
            .enumerate()
            .flat_map(|(idx, block)| {
                block
                    .locate(lines, window.clone())
                    .into_iter()
                    .map(move |range| (idx, range))
            })
            .collect();
        instances.sort_by_key(|(idx, range)| (range.start, *idx));
        instances
    }
}

impl std::fmt::Debug for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentType")
            .field(
                "gates",
                &self.gates.iter().map(|g| g.as_str()).collect::<Vec<_>>(),
            )
            .field("blocks", &self.blocks)
            .finish()
    }
}
