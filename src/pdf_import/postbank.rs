//! Postbank rule set
//!
//! Parses broker statements from Deutsche Postbank AG. One document may
//! carry several trade confirmations back to back.

use super::common::{
    add_amount_section, add_forex_section, add_security_section, add_tax_sections, Rules,
};
use super::error::ExtractionError;
use super::model::{Item, Money, ParsedTransaction, ParsedTransactionType};
use super::parser::{BankExtractor, Block, DocumentType, SectionScan, Transaction};
use super::units::{check_and_set_fee, check_and_set_tax};
use super::values::{parse_amount, parse_currency_code, parse_date_time, NumberLocale};

/// Lines that follow the security line on trade confirmations.
const NAME_STOP: &[&str] = &["Handels-/Ausführungsplatz", "Zahlbarkeitstag", "Schlusstag"];

pub fn extractor() -> Result<BankExtractor, ExtractionError> {
    Ok(BankExtractor::new("postbank", "Postbank")
        .add_bank_identifier("Postbank")
        .add_bank_identifier("Deutsche Postbank AG")
        .add_bank_identifier("51222 Köln")
        .add_document_type(buy_sell()?)
        .add_document_type(dividend()?))
}

fn buy_sell() -> Result<DocumentType, ExtractionError> {
    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Buy))
        .section(&["type"])
        .find(r"Wertpapier Abrechnung (?<type>Kauf|Verkauf).*")?
        .assign(|t, v, _| {
            if v.get("type")? == "Verkauf" {
                t.txn_type = ParsedTransactionType::Sell;
            }
            Ok(())
        });

    let t = add_security_section(t, NAME_STOP)?
        // Schlusstag/-Zeit 04.02.2020 08:00:04 Auftraggeber Max Mustermann
        .section(&["date"])
        .find(r"Schlusstag(/-Zeit)? (?<date>\d+\.\d+\.\d{4})( (?<time>\d+:\d+(:\d+)?))?.*")?
        .assign(|t, v, _| {
            t.date = Some(parse_date_time(v.get("date")?, v.opt("time"))?);
            Ok(())
        })
        // Provision 39,95- EUR
        // Transaktionsentgelt Börse 11,82- EUR
        .section(&["fee", "currency"])
        .optional()
        .multiple_times()
        .find(r"(.* )?(Provision|Abwicklungskosten B.rse|Transaktionsentgelt B.rse|.bertragungs-/Liefergeb.hr|Handelsentgelt) (?<fee>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| {
            let fee = Money::new(
                parse_currency_code(v.get("currency")?)?,
                parse_amount(v.get("fee")?, NumberLocale::German)?,
            );
            check_and_set_fee(fee, t, ctx)
        })
        // Kapitalertragsteuer 24,51 % auf 1.000,00 EUR 245,10- EUR
        .section(&["tax", "currency"])
        .optional()
        .multiple_times()
        .find(r"(Kapitalertragsteuer|Solidarit.tszuschlag|Kirchensteuer) .* (?<tax>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| {
            let tax = Money::new(
                parse_currency_code(v.get("currency")?)?,
                parse_amount(v.get("tax")?, NumberLocale::German)?,
            );
            check_and_set_tax(tax, t, ctx)
        });
    let t = add_amount_section(t)?.wrap(Item::buy_sell);

    Ok(DocumentType::new("Wertpapier Abrechnung (Kauf|Verkauf)")?.add_block(
        Block::new(r"Wertpapier Abrechnung (Kauf|Verkauf).*")?
            .end_with(r"Ausmachender Betrag .*")?
            .set(t),
    ))
}

fn dividend() -> Result<DocumentType, ExtractionError> {
    const HEADER: &str = "(Dividendengutschrift|Ertragsgutschrift|Aussch.ttung Investmentfonds)";

    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Dividend))
        .scan(SectionScan::FromBlockStart);
    let t = add_security_section(t, NAME_STOP)?
        // Zahlbarkeitstag 09.03.2021 Dividende pro Stück 1,01 USD
        .section(&["date"])
        .find(r"Zahlbarkeitstag (?<date>\d+\.\d+\.\d{4}).*")?
        .assign(|t, v, _| {
            t.date = Some(parse_date_time(v.get("date")?, None)?);
            Ok(())
        });
    let t = add_amount_section(t)?;
    let t = add_forex_section(t)?;
    let t = add_tax_sections(t)?.wrap(Item::account);

    Ok(DocumentType::new(HEADER)?.add_block(Block::new(HEADER)?.set(t)))
}
