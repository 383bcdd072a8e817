//! Declarative extraction engine.
//!
//! Rule sets are values assembled from [`DocumentType`], [`Block`],
//! [`Transaction`] and its sections. [`BankExtractor`] runs them over a
//! tokenized [`Document`].

mod block;
mod context;
mod document;
mod document_type;
mod extractor;
mod pattern;
mod section;
mod transaction;

pub use block::Block;
pub use context::{ParseContext, EXCHANGE_RATE};
pub use document::Document;
pub use document_type::{ContextProvider, DocumentType};
pub use extractor::{BankExtractor, ErrorEntry, ParseResult};
pub use pattern::{CaptureRecord, LinePattern};
pub use section::{AssignFn, Section, SectionMatch};
pub use transaction::{
    BlockTransaction, OneOf, SectionBuilder, SectionScan, SectionSink, Transaction,
};
