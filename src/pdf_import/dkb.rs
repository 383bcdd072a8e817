//! DKB (Deutsche Kreditbank) rule set
//!
//! Broker statements (trades and dividends) plus the bookings of the
//! DKB-Cash account statement.

use super::common::{
    add_amount_section, add_fee_sections, add_security_section, add_tax_sections, Rules,
};
use super::error::ExtractionError;
use super::model::{Item, Money, ParsedTransaction, ParsedTransactionType};
use super::parser::{BankExtractor, Block, DocumentType, LinePattern, SectionScan, Transaction};
use super::values::{parse_amount, parse_currency_code, parse_date_time, NumberLocale};

const NAME_STOP: &[&str] = &["Handels-/Ausführungsplatz", "Zahlbarkeitstag", "Schlusstag"];

/// Context key of the account currency, taken from the balance line.
const CURRENCY: &str = "currency";

// 02.04.2024 02.04.2024 Lastschrift Stadtwerke Berlin 85,00-
const BOOKING: &str = r"(?<date>\d{2}\.\d{2}\.\d{4}) (?<valuta>\d{2}\.\d{2}\.\d{4}) (?<text>.*) (?<amount>[.,\d]+)(?<sign>[+-])";

pub fn extractor() -> Result<BankExtractor, ExtractionError> {
    Ok(BankExtractor::new("dkb", "DKB")
        .add_bank_identifier("Deutsche Kreditbank")
        .add_bank_identifier("DKB AG")
        .add_bank_identifier("DKB-Cash")
        .add_bank_identifier("DKB Broker")
        .add_bank_identifier("10919 Berlin")
        .add_document_type(buy_sell()?)
        .add_document_type(dividend()?)
        .add_document_type(account_statement()?))
}

fn buy_sell() -> Result<DocumentType, ExtractionError> {
    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Buy))
        .scan(SectionScan::FromBlockStart)
        .section(&["type"])
        .find(r"Wertpapier Abrechnung (?<type>Kauf|Verkauf).*")?
        .assign(|t, v, _| {
            if v.get("type")? == "Verkauf" {
                t.txn_type = ParsedTransactionType::Sell;
            }
            Ok(())
        });

    let t = add_security_section(t, NAME_STOP)?.one_of(|alternatives| {
        Ok(alternatives
            // Schlusstag/-Zeit 15.03.2024 10:12:44 Auftraggeber Max Mustermann
            .section(&["date", "time"])
            .find(r"Schlusstag/-Zeit (?<date>\d+\.\d+\.\d{4}) (?<time>\d+:\d+:\d+).*")?
            .assign(|t, v, _| {
                t.date = Some(parse_date_time(v.get("date")?, Some(v.get("time")?))?);
                Ok(())
            })
            // Schlusstag 15.03.2024
            .section(&["date"])
            .find(r"Schlusstag (?<date>\d+\.\d+\.\d{4}).*")?
            .assign(|t, v, _| {
                t.date = Some(parse_date_time(v.get("date")?, None)?);
                Ok(())
            }))
    })?;
    let t = add_fee_sections(t)?;
    let t = add_tax_sections(t)?;
    let t = add_amount_section(t)?.wrap(Item::buy_sell);

    Ok(DocumentType::new("Wertpapier Abrechnung (Kauf|Verkauf)")?
        .add_block(Block::new(r"Wertpapier Abrechnung (Kauf|Verkauf).*")?.set(t)))
}

fn dividend() -> Result<DocumentType, ExtractionError> {
    const HEADER: &str = "(Dividendengutschrift|Ertragsgutschrift|Aussch.ttung)";

    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Dividend));
    let t = add_security_section(t, NAME_STOP)?
        // Zahlbarkeitstag 08.05.2024 Dividende pro Stück 13,80 EUR
        .section(&["date"])
        .find(r"Zahlbarkeitstag (?<date>\d+\.\d+\.\d{4}).*")?
        .assign(|t, v, _| {
            t.date = Some(parse_date_time(v.get("date")?, None)?);
            Ok(())
        });
    let t = add_tax_sections(t)?;
    let t = add_fee_sections(t)?;
    let t = add_amount_section(t)?.wrap(Item::account);

    Ok(DocumentType::new(HEADER)?.add_block(Block::new(HEADER)?.set(t)))
}

fn account_statement() -> Result<DocumentType, ExtractionError> {
    // Kontostand am 31.03.2024 1.234,56 EUR
    let balance = LinePattern::new(r"Kontostand am \d+\.\d+\.\d{4} .* (?<currency>[A-Z]{3})")?;

    let t: Rules = Transaction::new(|_| ParsedTransaction::new(ParsedTransactionType::Deposit))
        .section(&["date", "text", "amount", "sign"])
        .find(BOOKING)?
        .assign(|t, v, ctx| {
            let text = v.get("text")?;
            let credit = v.get("sign")? == "+";
            t.txn_type = booking_type(text, credit);
            t.date = Some(parse_date_time(v.get("date")?, None)?);
            let currency = ctx.get(CURRENCY).unwrap_or("EUR").to_string();
            t.set_money(Money::new(
                currency,
                parse_amount(v.get("amount")?, NumberLocale::German)?,
            ));
            t.note = Some(text.to_string());
            Ok(())
        })
        .wrap(Item::account);

    Ok(DocumentType::new("Kontoauszug")?
        .context_provider(move |lines, ctx| {
            let found = lines.iter().find_map(|l| balance.captures(l));
            match found.as_ref().and_then(|v| v.opt(CURRENCY)).map(parse_currency_code) {
                Some(Ok(currency)) => ctx.put(CURRENCY, currency),
                Some(Err(e)) => ctx.warn(format!("DKB account statement: {}", e)),
                None => {}
            }
        })
        .add_block(Block::new(BOOKING)?.max_size(1).set(t)))
}

fn booking_type(text: &str, credit: bool) -> ParsedTransactionType {
    let lower = text.to_lowercase();
    if lower.contains("zinsen") || lower.contains("abschluss") {
        if credit {
            return ParsedTransactionType::Interest;
        }
        return ParsedTransactionType::Fee;
    }
    if !credit && (lower.contains("entgelt") || lower.contains("gebühr")) {
        return ParsedTransactionType::Fee;
    }
    if credit {
        ParsedTransactionType::Deposit
    } else {
        ParsedTransactionType::Withdrawal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_import::parser::Document;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    const BUY: &str = r#"
DKB AG · Taubenstraße 7-9 · 10117 Berlin
Wertpapier Abrechnung Kauf
Nominale Wertpapierbezeichnung ISIN (WKN)
Stück 25 APPLE INC. US0378331005 (865985)
REGISTERED SHARES O.N.
Handels-/Ausführungsplatz Tradegate
Schlusstag/-Zeit 15.03.2024 10:12:44 Auftraggeber Max Mustermann
Ausführungskurs 157,30 EUR
Kurswert 3.932,50- EUR
Provision 10,00- EUR
Ausmachender Betrag 3.942,50- EUR
"#;

    const DIVIDEND: &str = r#"
Deutsche Kreditbank AG
Dividendengutschrift
Nominale Wertpapierbezeichnung ISIN (WKN)
Stück 100 ALLIANZ SE DE0008404005 (840400)
VINK.NAMENS-AKTIEN O.N.
Zahlbarkeitstag 08.05.2024 Dividende pro Stück 13,80 EUR
Bestandsstichtag 07.05.2024
Ex-Tag 07.05.2024
Dividendengutschrift 1.380,00+ EUR
Kapitalertragsteuer 25 % auf 1.380,00 EUR 345,00- EUR
Solidaritätszuschlag 5,5 % auf 345,00 EUR 18,97- EUR
Ausmachender Betrag 1.016,03+ EUR
"#;

    const STATEMENT: &str = r#"
DKB-Cash Kontoauszug Nummer 004 / 2024
Kontostand am 31.03.2024 1.234,56 EUR
Buchungstag Wert Wir haben für Sie gebucht Belastung Gutschrift
02.04.2024 02.04.2024 Lastschrift Stadtwerke Berlin 85,00-
03.04.2024 03.04.2024 Gutschrift Gehalt April 2.500,00+
30.04.2024 30.04.2024 Abschluss Zinsen 1,23+
30.04.2024 30.04.2024 Kontoführungsentgelt 4,50-
"#;

    #[test]
    fn test_detect() {
        let extractor = extractor().unwrap();
        assert!(extractor.detect(&Document::new("a", "Deutsche Kreditbank AG")));
        assert!(extractor.detect(&Document::new("a", "DKB AG\nBerlin")));
        assert!(!extractor.detect(&Document::new("a", "ING-DiBa AG")));
    }

    #[test]
    fn test_buy() {
        let extractor = extractor().unwrap();
        let result = extractor.extract_document(&Document::new("kauf.txt", BUY));

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.items.len(), 2);
        assert_eq!(
            result.items[0].item.security().and_then(|s| s.name.as_deref()),
            Some("APPLE INC. REGISTERED SHARES O.N.")
        );

        let t = result.items[1].item.transaction().unwrap();
        assert_eq!(t.txn_type, ParsedTransactionType::Buy);
        assert_eq!(t.shares, Some(dec("25")));
        assert_eq!(t.amount, Some(dec("3942.50")));
        assert_eq!(t.fees(), dec("10.00"));
        assert_eq!(t.gross_value(), Some(dec("3932.50")));
        assert_eq!(
            t.date,
            NaiveDate::from_ymd_opt(2024, 3, 15).and_then(|d| d.and_hms_opt(10, 12, 44))
        );
    }

    #[test]
    fn test_sell_with_date_only() {
        let extractor = extractor().unwrap();
        let text = BUY
            .replace("Abrechnung Kauf", "Abrechnung Verkauf")
            .replace("Schlusstag/-Zeit 15.03.2024 10:12:44 Auftraggeber Max Mustermann", "Schlusstag 15.03.2024")
            .replace("3.942,50- EUR", "3.922,50 EUR");
        let result = extractor.extract_document(&Document::new("verkauf.txt", &text));

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let t = result.items[1].item.transaction().unwrap();
        assert_eq!(t.txn_type, ParsedTransactionType::Sell);
        assert_eq!(t.date, midnight(2024, 3, 15));
        assert_eq!(t.gross_value(), Some(dec("3932.50")));
    }

    #[test]
    fn test_dividend() {
        let extractor = extractor().unwrap();
        let result = extractor.extract_document(&Document::new("dividende.txt", DIVIDEND));

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.items.len(), 2);

        let security = result.items[0].item.security().unwrap();
        assert_eq!(security.isin.as_deref(), Some("DE0008404005"));
        assert_eq!(security.wkn.as_deref(), Some("840400"));
        assert_eq!(security.name.as_deref(), Some("ALLIANZ SE VINK.NAMENS-AKTIEN O.N."));

        let t = match &result.items[1].item {
            Item::Account(t) => t,
            other => panic!("expected dividend, got {:?}", other),
        };
        assert_eq!(t.txn_type, ParsedTransactionType::Dividend);
        assert_eq!(t.shares, Some(dec("100")));
        assert_eq!(t.date, midnight(2024, 5, 8));
        assert_eq!(t.amount, Some(dec("1016.03")));
        assert_eq!(t.taxes(), dec("363.97"));
        assert_eq!(t.gross_value(), Some(dec("1380.00")));
    }

    #[test]
    fn test_dividend_without_amount_is_an_error() {
        let extractor = extractor().unwrap();
        let text = DIVIDEND.replace("Ausmachender Betrag 1.016,03+ EUR\n", "");
        let result = extractor.extract_document(&Document::new("dividende.txt", &text));

        assert!(result.items.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind(), "format");
        assert_eq!(result.errors[0].line, 3);
    }

    #[test]
    fn test_account_statement() {
        let extractor = extractor().unwrap();
        let result = extractor.extract_document(&Document::new("auszug.txt", STATEMENT));

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let types: Vec<ParsedTransactionType> = result
            .items
            .iter()
            .filter_map(|i| i.item.transaction())
            .map(|t| t.txn_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ParsedTransactionType::Withdrawal,
                ParsedTransactionType::Deposit,
                ParsedTransactionType::Interest,
                ParsedTransactionType::Fee,
            ]
        );

        let salary = result.items[1].item.transaction().unwrap();
        assert_eq!(salary.amount, Some(dec("2500.00")));
        assert_eq!(salary.currency.as_deref(), Some("EUR"));
        assert_eq!(salary.note.as_deref(), Some("Gutschrift Gehalt April"));
        assert_eq!(salary.date, midnight(2024, 4, 3));
    }

    #[test]
    fn test_booking_type() {
        assert_eq!(booking_type("Abschluss Zinsen", true), ParsedTransactionType::Interest);
        assert_eq!(booking_type("Sollzinsen", false), ParsedTransactionType::Fee);
        assert_eq!(booking_type("Kontoführungsentgelt", false), ParsedTransactionType::Fee);
        assert_eq!(booking_type("Entgelt Erstattung", true), ParsedTransactionType::Deposit);
        assert_eq!(booking_type("Dauerauftrag Miete", false), ParsedTransactionType::Withdrawal);
    }
}
