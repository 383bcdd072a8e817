//! Conversion of captured strings into amounts, shares, dates and currencies.
//!
//! Bank documents mix number conventions (`1.234,56` vs `1,234.56` vs
//! `1'234.56`) and month spellings (`Mär`, `Mrz`, `Sept.`, `Juni`, `Jän`,
//! `Oct`). Rule sets call into this module instead of parsing ad hoc.

use super::error::ValueError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal places kept for monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;
/// Decimal places kept for share quantities.
pub const SHARE_SCALE: u32 = 6;

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.\s*(\d{1,2})\.\s*(\d{4}|\d{2})$").unwrap());
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());
// 19. Jul 2021, 20.Okt.2014, 1.März2020
static NAMED_MONTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.?\s*([^\d\s.]+)\.?\s*(\d{4}|\d{2})$").unwrap());
// Jul 19, 2021
static ENGLISH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\d\s.,]+)\.?\s*(\d{1,2}),?\s+(\d{4})$").unwrap());

/// Month name prefixes in German, Austrian and English spelling.
const MONTH_PREFIXES: &[(&str, u32)] = &[
    ("jän", 1),
    ("jaen", 1),
    ("jan", 1),
    ("feb", 2),
    ("mär", 3),
    ("maer", 3),
    ("mrz", 3),
    ("mar", 3),
    ("apr", 4),
    ("mai", 5),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("okt", 10),
    ("oct", 10),
    ("nov", 11),
    ("dez", 12),
    ("dec", 12),
];

/// Grouping and decimal separator convention of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberLocale {
    /// `1.234,56`
    #[default]
    German,
    /// `1,234.56`
    English,
    /// `1'234.56`
    Swiss,
}

/// Parse a signed decimal number.
///
/// A trailing `-` marks a negative value and a trailing `+` is ignored, as
/// in `8,64+` or `1,53-`. Whitespace inside the number is dropped.
pub fn parse_decimal(value: &str, locale: NumberLocale) -> Result<Decimal, ValueError> {
    let err = || ValueError::Number {
        value: value.to_string(),
    };

    let mut text: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let mut negative = false;

    if let Some(rest) = text.strip_suffix('-') {
        negative = true;
        text = rest.to_string();
    } else if let Some(rest) = text.strip_suffix('+') {
        text = rest.to_string();
    }
    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.to_string();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.to_string();
    }

    let normalized = match locale {
        NumberLocale::German => text.replace('.', "").replace(',', "."),
        NumberLocale::English => text.replace(',', ""),
        NumberLocale::Swiss => text.replace(['\'', '’'], ""),
    };

    let well_formed = !normalized.is_empty()
        && normalized.chars().all(|c| c.is_ascii_digit() || c == '.')
        && normalized.matches('.').count() <= 1
        && normalized.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(err());
    }

    let number = Decimal::from_str(&normalized).map_err(|_| err())?;
    Ok(if negative { -number } else { number })
}

/// Parse a monetary amount. The sign is dropped; rule sets decide direction.
pub fn parse_amount(value: &str, locale: NumberLocale) -> Result<Decimal, ValueError> {
    Ok(round_amount(parse_decimal(value, locale)?.abs()))
}

/// Parse a share quantity (unsigned, six decimal places).
pub fn parse_shares(value: &str, locale: NumberLocale) -> Result<Decimal, ValueError> {
    Ok(parse_decimal(value, locale)?
        .abs()
        .round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Parse an exchange rate, which must be strictly positive.
pub fn parse_exchange_rate(value: &str, locale: NumberLocale) -> Result<Decimal, ValueError> {
    let rate = parse_decimal(value, locale)?;
    if rate <= Decimal::ZERO {
        return Err(ValueError::Number {
            value: value.to_string(),
        });
    }
    Ok(rate)
}

/// Round to cents, half away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn expand_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    Some(if year.len() == 2 { 2000 + value } else { value })
}

/// Resolve a (possibly abbreviated) German or English month name.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    if lower.chars().count() < 3 {
        return None;
    }
    MONTH_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, month)| *month)
}

fn date_parts(text: &str) -> Option<(i32, u32, u32)> {
    if let Some(c) = NUMERIC_DATE.captures(text) {
        return Some((expand_year(&c[3])?, c[2].parse().ok()?, c[1].parse().ok()?));
    }
    if let Some(c) = ISO_DATE.captures(text) {
        return Some((c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?));
    }
    if let Some(c) = NAMED_MONTH_DATE.captures(text) {
        return Some((expand_year(&c[3])?, month_from_name(&c[2])?, c[1].parse().ok()?));
    }
    if let Some(c) = ENGLISH_DATE.captures(text) {
        return Some((c[3].parse().ok()?, month_from_name(&c[1])?, c[2].parse().ok()?));
    }
    None
}

/// Parse a date in any of the layouts seen in bank documents.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValueError> {
    date_parts(value.trim())
        .and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| ValueError::Date {
            value: value.to_string(),
        })
}

/// Parse `HH:MM:SS` or `HH:MM`.
pub fn parse_time(value: &str) -> Result<NaiveTime, ValueError> {
    let text = value.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| ValueError::Time {
            value: value.to_string(),
        })
}

/// Combine a date and an optional time; a missing time means midnight.
pub fn parse_date_time(date: &str, time: Option<&str>) -> Result<NaiveDateTime, ValueError> {
    let date = parse_date(date)?;
    match time {
        Some(time) => Ok(date.and_time(parse_time(time)?)),
        None => date.and_hms_opt(0, 0, 0).ok_or_else(|| ValueError::Date {
            value: date.to_string(),
        }),
    }
}

/// Normalize a currency code or symbol to an upper case ISO code.
pub fn parse_currency_code(value: &str) -> Result<String, ValueError> {
    let text = value.trim();
    let code = match text {
        "€" => "EUR",
        "$" | "US$" => "USD",
        "£" => "GBP",
        "Fr." | "SFr." => "CHF",
        other => other,
    };
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ValueError::Currency {
            value: value.to_string(),
        })
    }
}
