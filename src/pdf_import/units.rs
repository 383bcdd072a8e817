//! Fee and tax units, with conversion of foreign currency charges.

use super::error::ExtractionError;
use super::model::{Money, ParsedTransaction, Unit, UnitType};
use super::parser::ParseContext;
use super::values::round_amount;
use rust_decimal::Decimal;

/// Exchange rate precision for converted units.
const RATE_SCALE: u32 = 10;

/// Add a fee unit unless it is zero.
pub fn check_and_set_fee(
    fee: Money,
    t: &mut ParsedTransaction,
    ctx: &mut ParseContext,
) -> Result<(), ExtractionError> {
    check_and_set(UnitType::Fee, fee, t, ctx)
}

/// Add a tax unit unless it is zero.
pub fn check_and_set_tax(
    tax: Money,
    t: &mut ParsedTransaction,
    ctx: &mut ParseContext,
) -> Result<(), ExtractionError> {
    check_and_set(UnitType::Tax, tax, t, ctx)
}

/// A charge in the transaction currency is added as is. A charge in another
/// currency is converted with the document's exchange rate, given as units
/// of the foreign currency per unit of the transaction currency. Without a
/// rate the charge is dropped with a warning.
fn check_and_set(
    unit_type: UnitType,
    money: Money,
    t: &mut ParsedTransaction,
    ctx: &mut ParseContext,
) -> Result<(), ExtractionError> {
    if money.is_zero() {
        return Ok(());
    }

    let currency = match &t.currency {
        None => {
            t.add_unit(Unit::new(unit_type, money));
            return Ok(());
        }
        Some(currency) if *currency == money.currency => {
            t.add_unit(Unit::new(unit_type, money));
            return Ok(());
        }
        Some(currency) => currency.clone(),
    };

    match ctx.exchange_rate()? {
        Some(rate) => {
            let converted = Money::new(currency, round_amount(money.amount / rate));
            let inverse = (Decimal::ONE / rate).round_dp(RATE_SCALE);
            t.add_unit(Unit::with_forex(unit_type, converted, money, inverse));
        }
        None => {
            ctx.warn(format!(
                "{:?} {} {} dropped: no exchange rate to {}",
                unit_type, money.amount, money.currency, currency
            ));
        }
    }
    Ok(())
}
