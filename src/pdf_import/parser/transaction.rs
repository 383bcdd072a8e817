//! Transaction builder: turns one block instance into one result item.

use super::context::ParseContext;
use super::pattern::{CaptureRecord, LinePattern};
use super::section::Section;
use crate::pdf_import::error::ExtractionError;
use crate::pdf_import::model::Item;
use std::ops::Range;

type FactoryFn<T> = Box<dyn Fn(&ParseContext) -> T + Send + Sync>;
type WrapFn<T> = Box<dyn Fn(T) -> Result<Item, ExtractionError> + Send + Sync>;

/// Where each section starts searching inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionScan {
    /// Each section continues after the line matched by the previous one.
    #[default]
    Sequential,
    /// Each section searches the whole block again. For layouts that list
    /// facts in a different order than the rule set declares them.
    FromBlockStart,
}

enum Step<T> {
    Single(Section<T>),
    OneOf {
        alternatives: Vec<Section<T>>,
        optional: bool,
    },
}

/// Receives the sections finished by a [`SectionBuilder`].
pub trait SectionSink<T>: Sized {
    fn push_section(self, section: Section<T>) -> Self;
}

/// Fluent construction of one section; `assign` hands the finished section
/// back to its owner.
pub struct SectionBuilder<T, P> {
    owner: P,
    section: Section<T>,
}

impl<T, P: SectionSink<T>> SectionBuilder<T, P> {
    pub fn optional(mut self) -> Self {
        self.section.set_optional();
        self
    }

    pub fn multiple_times(mut self) -> Self {
        self.section.set_multiple_times();
        self
    }

    /// Patterns after the first one must be found before the first line
    /// matching `stop`.
    pub fn stop_at(mut self, stop: &str) -> Result<Self, ExtractionError> {
        self.section.set_stop(LinePattern::new(stop)?);
        Ok(self)
    }

    /// Add a whole-line pattern, searched after the previous one.
    pub fn find(mut self, pattern: &str) -> Result<Self, ExtractionError> {
        self.section.push_pattern(LinePattern::new(pattern)?);
        Ok(self)
    }

    pub fn assign<F>(mut self, f: F) -> P
    where
        F: Fn(&mut T, &CaptureRecord, &mut ParseContext) -> Result<(), ExtractionError>
            + Send
            + Sync
            + 'static,
    {
        self.section.set_assign(Box::new(f));
        self.owner.push_section(self.section)
    }
}

/// Alternatives of which the first matching one is applied.
pub struct OneOf<T> {
    alternatives: Vec<Section<T>>,
}

impl<T> OneOf<T> {
    pub fn section(self, attributes: &[&str]) -> SectionBuilder<T, Self> {
        SectionBuilder {
            owner: self,
            section: Section::new(attributes),
        }
    }
}

impl<T> SectionSink<T> for OneOf<T> {
    fn push_section(mut self, section: Section<T>) -> Self {
        self.alternatives.push(section);
        self
    }
}

/// Recipe for building one target object from a block instance.
pub struct Transaction<T> {
    factory: FactoryFn<T>,
    steps: Vec<Step<T>>,
    scan: SectionScan,
    wrap: Option<WrapFn<T>>,
}

impl<T> Transaction<T> {
    /// The factory runs once per block instance and may read the context,
    /// for example to pick the transaction type.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ParseContext) -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            steps: Vec::new(),
            scan: SectionScan::default(),
            wrap: None,
        }
    }

    pub fn scan(mut self, scan: SectionScan) -> Self {
        self.scan = scan;
        self
    }

    pub fn section(self, attributes: &[&str]) -> SectionBuilder<T, Self> {
        SectionBuilder {
            owner: self,
            section: Section::new(attributes),
        }
    }

    /// Required group of alternative sections.
    pub fn one_of<F>(self, build: F) -> Result<Self, ExtractionError>
    where
        F: FnOnce(OneOf<T>) -> Result<OneOf<T>, ExtractionError>,
    {
        self.push_one_of(build, false)
    }

    pub fn optional_one_of<F>(self, build: F) -> Result<Self, ExtractionError>
    where
        F: FnOnce(OneOf<T>) -> Result<OneOf<T>, ExtractionError>,
    {
        self.push_one_of(build, true)
    }

    fn push_one_of<F>(mut self, build: F, optional: bool) -> Result<Self, ExtractionError>
    where
        F: FnOnce(OneOf<T>) -> Result<OneOf<T>, ExtractionError>,
    {
        let one_of = build(OneOf {
            alternatives: Vec::new(),
        })?;
        self.steps.push(Step::OneOf {
            alternatives: one_of.alternatives,
            optional,
        });
        Ok(self)
    }

    pub fn wrap<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> Result<Item, ExtractionError> + Send + Sync + 'static,
    {
        self.wrap = Some(Box::new(f));
        self
    }

    /// Run all sections against `range` and wrap the result.
    ///
    /// The first required section that finds nothing aborts the run.
    /// Optional sections that find nothing leave the cursor where it was.
    pub fn run(
        &self,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Item, ExtractionError> {
        let mut target = (self.factory)(ctx);
        let mut cursor = range.start;

        for step in &self.steps {
            let from = match self.scan {
                SectionScan::Sequential => cursor,
                SectionScan::FromBlockStart => range.start,
            };
            let window = from..range.end;

            let next = match step {
                Step::Single(section) => match section.apply(&mut target, lines, window, ctx)? {
                    Some(next) => Some(next),
                    None if section.is_optional() => None,
                    None => return Err(section.not_matched()),
                },
                Step::OneOf {
                    alternatives,
                    optional,
                } => {
                    let mut next = None;
                    for alternative in alternatives {
                        next = alternative.apply_alternative(&mut target, lines, window.clone(), ctx)?;
                        if next.is_some() {
                            break;
                        }
                    }
                    match (next, alternatives.first()) {
                        (Some(next), _) => Some(next),
                        (None, Some(first)) if !optional => return Err(first.not_matched()),
                        (None, _) => None,
                    }
                }
            };

            if let Some(next) = next {
                cursor = next;
            }
        }

        let wrap = self
            .wrap
            .as_ref()
            .ok_or_else(|| ExtractionError::incomplete("transaction", "no wrap step"))?;
        wrap(target)
    }
}

impl<T> SectionSink<T> for Transaction<T> {
    fn push_section(mut self, section: Section<T>) -> Self {
        self.steps.push(Step::Single(section));
        self
    }
}

/// Type-erased transaction so that blocks of one rule set can build
/// different target types.
pub trait BlockTransaction: Send + Sync {
    fn run(
        &self,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Item, ExtractionError>;
}

impl<T> BlockTransaction for Transaction<T> {
    fn run(
        &self,
        lines: &[String],
        range: Range<usize>,
        ctx: &mut ParseContext,
    ) -> Result<Item, ExtractionError> {
        Transaction::run(self, lines, range, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_import::model::{Money, ParsedTransaction, ParsedTransactionType};
    use crate::pdf_import::values::{parse_amount, parse_date_time, NumberLocale};

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn deposit() -> Transaction<ParsedTransaction> {
        Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Deposit))
    }

    fn with_amount(
        t: Transaction<ParsedTransaction>,
    ) -> Result<Transaction<ParsedTransaction>, ExtractionError> {
        Ok(t.section(&["amount", "currency"])
            .find(r"Betrag (?<amount>[\d.,]+) (?<currency>\w{3})")?
            .assign(|t, v, _| {
                t.set_money(Money::new(
                    v.get("currency")?,
                    parse_amount(v.get("amount")?, NumberLocale::German)?,
                ));
                Ok(())
            }))
    }

    fn with_date(
        t: Transaction<ParsedTransaction>,
    ) -> Result<Transaction<ParsedTransaction>, ExtractionError> {
        Ok(t.section(&["date"])
            .find(r"Valuta (?<date>[\d.]+)")?
            .assign(|t, v, _| {
                t.date = Some(parse_date_time(v.get("date")?, None)?);
                Ok(())
            }))
    }

    #[test]
    fn test_sections_run_in_order_and_wrap() {
        let doc = lines("Valuta 02.04.2024\nBetrag 500,00 EUR");
        let tx = with_amount(with_date(deposit()).unwrap())
            .unwrap()
            .wrap(Item::account);

        let item = tx.run(&doc, 0..doc.len(), &mut ParseContext::default()).unwrap();
        let t = item.transaction().unwrap();
        assert_eq!(t.amount.map(|a| a.to_string()).as_deref(), Some("500.00"));
        assert_eq!(t.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_sequential_scan_does_not_look_back() {
        let doc = lines("Betrag 500,00 EUR\nValuta 02.04.2024");
        let sequential = with_amount(with_date(deposit()).unwrap())
            .unwrap()
            .wrap(Item::account);
        let err = sequential
            .run(&doc, 0..doc.len(), &mut ParseContext::default())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SectionNotMatched { .. }));

        let from_start = with_amount(with_date(deposit().scan(SectionScan::FromBlockStart)).unwrap())
            .unwrap()
            .wrap(Item::account);
        assert!(from_start
            .run(&doc, 0..doc.len(), &mut ParseContext::default())
            .is_ok());
    }

    #[test]
    fn test_value_errors_propagate_from_assign() {
        let doc = lines("Valuta 31.02.2024\nBetrag 500,00 EUR");
        let tx = with_amount(with_date(deposit()).unwrap())
            .unwrap()
            .wrap(Item::account);
        let err = tx.run(&doc, 0..doc.len(), &mut ParseContext::default()).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn test_one_of_takes_first_matching_alternative() {
        let doc = lines("Gutschrift\nValuta 02.04.2024\nBetrag 1,00 EUR");
        let tx = deposit()
            .one_of(|alt| {
                Ok(alt
                    .section(&["kind"])
                    .find("(?<kind>Lastschrift)")?
                    .assign(|t, _, _| {
                        t.txn_type = ParsedTransactionType::Withdrawal;
                        Ok(())
                    })
                    .section(&["kind"])
                    .find("(?<kind>Gutschrift)")?
                    .assign(|t, _, _| {
                        t.note = Some("credit".to_string());
                        Ok(())
                    }))
            })
            .unwrap();
        let tx = with_amount(with_date(tx).unwrap()).unwrap().wrap(Item::account);

        let item = tx.run(&doc, 0..doc.len(), &mut ParseContext::default()).unwrap();
        let t = item.transaction().unwrap();
        assert_eq!(t.txn_type, ParsedTransactionType::Deposit);
        assert_eq!(t.note.as_deref(), Some("credit"));

        let missing = lines("Valuta 02.04.2024\nBetrag 1,00 EUR");
        let err = tx
            .run(&missing, 0..missing.len(), &mut ParseContext::default())
            .unwrap_err();
        assert!(err.to_string().contains("Lastschrift"));
    }

    #[test]
    fn test_one_of_skips_alternative_lacking_an_attribute() {
        let tx = deposit()
            .one_of(|alt| {
                Ok(alt
                    .section(&["date", "time"])
                    .find(r"Valuta (?<date>[\d.]+)( (?<time>\d+:\d+))?")?
                    .assign(|t, v, _| {
                        t.date = Some(parse_date_time(v.get("date")?, Some(v.get("time")?))?);
                        Ok(())
                    })
                    .section(&["date"])
                    .find(r"Valuta (?<date>[\d.]+).*")?
                    .assign(|t, v, _| {
                        t.date = Some(parse_date_time(v.get("date")?, None)?);
                        t.note = Some("date only".to_string());
                        Ok(())
                    }))
            })
            .unwrap();
        let tx = with_amount(tx).unwrap().wrap(Item::account);

        let doc = lines("Valuta 02.04.2024\nBetrag 1,00 EUR");
        let item = tx.run(&doc, 0..doc.len(), &mut ParseContext::default()).unwrap();
        let t = item.transaction().unwrap();
        assert_eq!(t.note.as_deref(), Some("date only"));
        assert_eq!(
            t.date.map(|d| d.to_string()).as_deref(),
            Some("2024-04-02 00:00:00")
        );

        let timed = lines("Valuta 02.04.2024 09:30\nBetrag 1,00 EUR");
        let item = tx.run(&timed, 0..timed.len(), &mut ParseContext::default()).unwrap();
        let t = item.transaction().unwrap();
        assert_eq!(t.note, None);
        assert_eq!(
            t.date.map(|d| d.to_string()).as_deref(),
            Some("2024-04-02 09:30:00")
        );

        let neither = lines("Betrag 1,00 EUR");
        let err = tx
            .run(&neither, 0..neither.len(), &mut ParseContext::default())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SectionNotMatched { .. }));
    }

    #[test]
    fn test_missing_wrap_is_incomplete() {
        let doc = lines("Betrag 1,00 EUR");
        let tx = with_amount(deposit()).unwrap();
        assert_eq!(
            tx.run(&doc, 0..doc.len(), &mut ParseContext::default())
                .unwrap_err()
                .kind(),
            "incomplete"
        );
    }
}
