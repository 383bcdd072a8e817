//! Roche Connect / Equatex rule set
//!
//! Purchase plan statements list every allotment of Roche participation
//! certificates as one table row; dividend advices follow the usual German
//! "Dividendengutschrift" layout.

use super::common::{
    add_amount_section, add_fee_sections, add_forex_section, add_security_section,
    add_tax_sections, Rules,
};
use super::error::ExtractionError;
use super::model::{Item, Money, ParsedTransaction, ParsedTransactionType, Security};
use super::parser::{BankExtractor, Block, DocumentType, LinePattern, SectionScan, Transaction};
use super::values::{parse_date_time, parse_decimal, parse_shares, round_amount, NumberLocale};

// 19. Jul 2021 Roche Genussscheine 357.52 CHF 19. Jul 2024 1.58631
const TABLE_ROW: &str = r"(?<date>\d+.\s*[\wä]+\.?\s*\d+) Roche Genussscheine\s*(CHF)?\s*(?<buyin>[\d.]+)\s*(CHF)?\s*.*\d{4} (?<shares>[\d.]+)";

const SELL_HEADER: &str = r"Roche Connect (Verkauf|R.cknahme Investmentfonds).*";

/// Context key holding the trade direction of a purchase plan statement.
const TRADE_TYPE: &str = "type";

fn roche_certificate() -> Security {
    Security {
        name: Some("Roche Genussscheine".to_string()),
        isin: Some("CH0012032048".to_string()),
        wkn: Some("855167".to_string()),
        ticker: Some("ROG".to_string()),
        currency: Some("CHF".to_string()),
    }
}

pub fn extractor() -> Result<BankExtractor, ExtractionError> {
    Ok(BankExtractor::new("roche-connect", "Roche Connect")
        .add_bank_identifier("Roche Connect")
        .add_bank_identifier("Equatex AG")
        .add_document_type(purchase_plan()?)
        .add_document_type(dividend()?))
}

fn purchase_plan() -> Result<DocumentType, ExtractionError> {
    let sell_header = LinePattern::new(SELL_HEADER)?;

    let transaction = Transaction::new(|ctx| {
        let txn_type = match ctx.get(TRADE_TYPE) {
            Some("SELL") => ParsedTransactionType::Sell,
            _ => ParsedTransactionType::Buy,
        };
        ParsedTransaction::new(txn_type)
    })
    .section(&["date", "buyin", "shares"])
    .find(TABLE_ROW)?
    .assign(|t, v, ctx| {
        let price = parse_decimal(v.get("buyin")?, NumberLocale::English)?;
        let shares = parse_shares(v.get("shares")?, NumberLocale::English)?;
        let security = ctx.get_or_create_security(roche_certificate());

        t.set_money(Money::new("CHF", round_amount(price * shares)));
        t.shares = Some(shares);
        t.security = Some(security);
        t.date = Some(parse_date_time(v.get("date")?, None)?);
        Ok(())
    })
    .wrap(Item::buy_sell);

    Ok(DocumentType::new("Roche Connect")?
        // the "Verfügbar" table repeats allotments that were already listed
        .trim_after(r"Roche Connect.*- Verfügbar")?
        .context_provider(move |lines, ctx| {
            if lines.iter().any(|l| sell_header.is_match(l)) {
                ctx.put(TRADE_TYPE, "SELL");
            }
        })
        .add_block(Block::new(TABLE_ROW)?.max_size(1).set(transaction)))
}

fn dividend() -> Result<DocumentType, ExtractionError> {
    const HEADER: &str =
        "(Dividendengutschrift|Aussch.ttung Investmentfonds|Gutschrift von Investmentertr.gen|Ertragsgutschrift.*)";

    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Dividend))
        .scan(SectionScan::FromBlockStart);
    let t = add_security_section(t, &["Zahlbarkeitstag", "Ex-Tag"])?
        // Ex-Tag 22.02.2021 Art der Dividende Quartalsdividende
        .section(&["date"])
        .find(r"Ex-Tag (?<date>\d+.\d+.\d{4}).*")?
        .assign(|t, v, _| {
            t.date = Some(parse_date_time(v.get("date")?, None)?);
            Ok(())
        })
        .section(&["note"])
        .optional()
        .find(r"Ex-Tag \d+.\d+.\d{4} Art der Dividende (?<note>.*)")?
        .assign(|t, v, _| {
            t.note = Some(v.get("note")?.to_string());
            Ok(())
        });
    let t = add_amount_section(t)?;
    let t = add_forex_section(t)?;
    let t = add_tax_sections(t)?;
    let t = add_fee_sections(t)?.wrap(Item::account);

    Ok(DocumentType::new(HEADER)?.add_block(Block::new(HEADER)?.set(t)))
}
