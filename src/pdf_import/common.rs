//! Section groups shared by the German language rule sets.
//!
//! Statements of German banks print taxes, fees, exchange rates and the
//! "Stück ... ISIN (WKN)" security line the same way across issuers.

use super::error::ExtractionError;
use super::model::{Money, ParsedTransaction, Security, Unit, UnitType};
use super::parser::{CaptureRecord, ParseContext, Transaction};
use super::units::{check_and_set_fee, check_and_set_tax};
use super::values::{
    parse_amount, parse_currency_code, parse_exchange_rate, parse_shares, NumberLocale,
};
use rust_decimal::Decimal;

pub type Rules = Transaction<ParsedTransaction>;

/// Set once a withheld tax was booked; creditable tax lines are then
/// informational only.
pub const WITHHOLDING_TAX_FOUND: &str = "withholdingTaxFound";

const GERMAN: NumberLocale = NumberLocale::German;

/// Security from `name`, `isin`, `wkn` and optional `currency` captures.
pub fn security_from(v: &CaptureRecord, continuation: Option<&str>) -> Result<Security, ExtractionError> {
    let mut name = v.get("name")?.to_string();
    if let Some(more) = continuation {
        name.push(' ');
        name.push_str(more);
    }
    Ok(Security {
        name: Some(name),
        isin: v.opt("isin").map(str::to_string),
        wkn: v.opt("wkn").map(str::to_string),
        ticker: None,
        currency: v.opt("currency").map(parse_currency_code).transpose()?,
    })
}

fn money(v: &CaptureRecord, amount_key: &str) -> Result<Money, ExtractionError> {
    Ok(Money::new(
        parse_currency_code(v.get("currency")?)?,
        parse_amount(v.get(amount_key)?, GERMAN)?,
    ))
}

const SECURITY_LINE: &str =
    r"St.ck (?<shares>[\d.,]+) (?<name>.*) (?<isin>[A-Z]{2}[A-Z0-9]{9}[0-9]) \((?<wkn>[A-Z0-9]{6})\)";

/// `Stück 12 JOHNSON & JOHNSON US4781601046 (853260)` followed by the
/// second half of the name. A blank line or one starting with one of
/// `stop` is not part of the name and stays available to later sections.
pub fn add_security_section(t: Rules, stop: &[&str]) -> Result<Rules, ExtractionError> {
    let prefixes: Vec<String> = stop.iter().map(|p| regex::escape(p)).collect();
    let stop_line = if prefixes.is_empty() {
        String::new()
    } else {
        format!("(?:(?:{}).*)?", prefixes.join("|"))
    };

    t.one_of(|alternatives| {
        Ok(alternatives
            .section(&["shares", "name", "isin", "wkn", "name1"])
            .find(SECURITY_LINE)?
            .find(r"(?<name1>.*)")?
            .stop_at(&stop_line)?
            .assign(assign_security)
            .section(&["shares", "name", "isin", "wkn"])
            .find(SECURITY_LINE)?
            .assign(assign_security))
    })
}

fn assign_security(
    t: &mut ParsedTransaction,
    v: &CaptureRecord,
    ctx: &mut ParseContext,
) -> Result<(), ExtractionError> {
    t.security = Some(ctx.get_or_create_security(security_from(v, v.opt("name1"))?));
    t.shares = Some(parse_shares(v.get("shares")?, GERMAN)?);
    Ok(())
}

/// `Ausmachender Betrag 8,64+ EUR`
pub fn add_amount_section(t: Rules) -> Result<Rules, ExtractionError> {
    Ok(t.section(&["amount", "currency"])
        .find(r"Ausmachender Betrag (?<amount>[.,\d]+)[+-]? (?<currency>\w{3})")?
        .assign(|t, v, _| {
            t.set_money(money(v, "amount")?);
            Ok(())
        }))
}

/// Exchange rate block of a foreign currency payout:
///
/// ```text
/// Devisenkurs EUR / USD 1,1920
/// Devisenkursdatum 09.03.2021
/// Dividendengutschrift 12,12 USD 10,17+ EUR
/// ```
///
/// Stores the rate in the context (foreign units per unit of the
/// transaction currency) and records the gross value with its forex amount.
pub fn add_forex_section(t: Rules) -> Result<Rules, ExtractionError> {
    Ok(t.section(&["rate", "fxAmount", "fxCurrency", "grossAmount", "currency"])
        .optional()
        .find(r"Devisenkurs .* (?<rate>[.\d]+,\d+)")?
        .find(r"Devisenkursdatum .*")?
        .find(r"(Dividendengutschrift|Aussch.ttung|Ertragsgutschrift) (?<fxAmount>[.\d]+,\d+) (?<fxCurrency>\w{3}) (?<grossAmount>[.\d]+,\d+)\+ (?<currency>\w{3})")?
        .assign(|t, v, ctx| {
            let currency = t
                .currency
                .clone()
                .ok_or_else(|| ExtractionError::incomplete("account transaction", "exchange rate before amount"))?;
            let fx = Money::new(
                parse_currency_code(v.get("fxCurrency")?)?,
                parse_amount(v.get("fxAmount")?, GERMAN)?,
            );
            let gross = money(v, "grossAmount")?;

            let mut rate = parse_exchange_rate(v.get("rate")?, GERMAN)?;
            if fx.currency == currency {
                rate = Decimal::ONE / rate;
            }
            ctx.set_exchange_rate(rate.round_dp(10));

            let inverse = (Decimal::ONE / rate).round_dp(10);
            let unit = if fx.currency != currency {
                Unit::with_forex(UnitType::GrossValue, gross, fx, inverse)
            } else {
                Unit::with_forex(UnitType::GrossValue, fx, gross, inverse)
            };
            t.add_unit(unit);
            Ok(())
        }))
}

/// Withholding, capital gains, church and solidarity taxes.
pub fn add_tax_sections(t: Rules) -> Result<Rules, ExtractionError> {
    Ok(t
        // Einbehaltene Quellensteuer 15 % auf 12,12 USD 1,53- EUR
        .section(&["tax", "currency"])
        .optional()
        .find(r"Einbehalten(d)?e Quellensteuer [.,\d]+ ?% .* (?<tax>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| {
            ctx.set_flag(WITHHOLDING_TAX_FOUND);
            check_and_set_tax(money(v, "tax")?, t, ctx)
        })
        // Anrechenbare Quellensteuer 15 % auf 10,17 EUR 1,53 EUR
        .section(&["tax", "currency"])
        .optional()
        .find(r"Anrechenbare Quellensteuer [.,\d]+ ?% .* [.,\d]+ \w{3} (?<tax>[.,\d]+) (?<currency>\w{3})")?
        .assign(add_creditable_tax)
        // Anrechenbare Quellensteuer pro Stück 0,0144878 EUR 0,29 EUR
        .section(&["tax", "currency"])
        .optional()
        .find(r"Anrechenbare Quellensteuer pro St.ck [.,\d]+ \w{3} (?<tax>[.,\d]+) (?<currency>\w{3})")?
        .assign(add_creditable_tax)
        .section(&["tax", "currency"])
        .optional()
        .find(r"Kapitalertragsteuer [.,\d]+ ?% auf [.,\d]+ \w{3} (?<tax>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| check_and_set_tax(money(v, "tax")?, t, ctx))
        .section(&["tax", "currency"])
        .optional()
        .find(r"Kirchensteuer [.,\d]+ ?% auf [.,\d]+ \w{3} (?<tax>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| check_and_set_tax(money(v, "tax")?, t, ctx))
        .section(&["tax", "currency"])
        .optional()
        .find(r"Solidarit.tszuschlag [.,\d]+ ?% auf [.,\d]+ \w{3} (?<tax>[.,\d]+)- (?<currency>\w{3})")?
        .assign(|t, v, ctx| check_and_set_tax(money(v, "tax")?, t, ctx)))
}

fn add_creditable_tax(
    t: &mut ParsedTransaction,
    v: &CaptureRecord,
    ctx: &mut ParseContext,
) -> Result<(), ExtractionError> {
    if ctx.flag(WITHHOLDING_TAX_FOUND) {
        return Ok(());
    }
    check_and_set_tax(money(v, "tax")?, t, ctx)
}

/// Exchange fees and commissions, one line each.
pub fn add_fee_sections(t: Rules) -> Result<Rules, ExtractionError> {
    Ok(t
        // Provision 39,95- EUR
        .section(&["fee", "currency"])
        .optional()
        .find(r".*Provision\s+(?<fee>[.,\d]+)- (?<currency>\w{3}).*")?
        .assign(|t, v, ctx| check_and_set_fee(money(v, "fee")?, t, ctx))
        // Abwicklungskosten Börse 0,04- EUR
        .section(&["fee", "currency"])
        .optional()
        .find(r"Abwicklungskosten B.rse (?<fee>[.,\d]+)- (?<currency>\w{3}).*")?
        .assign(|t, v, ctx| check_and_set_fee(money(v, "fee")?, t, ctx))
        // Transaktionsentgelt Börse 11,82- EUR
        .section(&["fee", "currency"])
        .optional()
        .find(r"Transaktionsentgelt B.rse (?<fee>[.,\d]+)- (?<currency>\w{3}).*")?
        .assign(|t, v, ctx| check_and_set_fee(money(v, "fee")?, t, ctx))
        // Übertragungs-/Liefergebühr 0,65- EUR
        .section(&["fee", "currency"])
        .optional()
        .find(r".bertragungs-/Liefergeb.hr (?<fee>[.,\d]+)- (?<currency>\w{3}).*")?
        .assign(|t, v, ctx| check_and_set_fee(money(v, "fee")?, t, ctx)))
}
