//! Domain objects populated by the bank rule sets.

use super::error::ExtractionError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Security master data as found on a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Security {
    pub name: Option<String>,
    pub isin: Option<String>,
    pub wkn: Option<String>,
    pub ticker: Option<String>,
    pub currency: Option<String>,
}

impl Security {
    /// True when both securities name the same instrument.
    ///
    /// ISIN wins over WKN, WKN over ticker, the name is only used when no
    /// identifier is available on either side.
    pub fn same_as(&self, other: &Security) -> bool {
        fn eq(a: &Option<String>, b: &Option<String>) -> Option<bool> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a.trim().eq_ignore_ascii_case(b.trim())),
                _ => None,
            }
        }

        eq(&self.isin, &other.isin)
            .or_else(|| eq(&self.wkn, &other.wkn))
            .or_else(|| eq(&self.ticker, &other.ticker))
            .or_else(|| eq(&self.name, &other.name))
            .unwrap_or(false)
    }

    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.isin.as_deref())
            .or(self.wkn.as_deref())
            .unwrap_or("?")
    }
}

/// An amount in a given currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency: String,
    pub amount: Decimal,
}

impl Money {
    pub fn new(currency: impl Into<String>, amount: Decimal) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    Fee,
    Tax,
    GrossValue,
}

/// A fee, tax or gross value component of a transaction.
///
/// When the component was stated in a foreign currency, `forex` keeps the
/// original amount and `exchange_rate` converts it into `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub unit_type: UnitType,
    pub amount: Money,
    pub forex: Option<Money>,
    pub exchange_rate: Option<Decimal>,
}

impl Unit {
    pub fn new(unit_type: UnitType, amount: Money) -> Self {
        Self {
            unit_type,
            amount,
            forex: None,
            exchange_rate: None,
        }
    }

    pub fn with_forex(unit_type: UnitType, amount: Money, forex: Money, exchange_rate: Decimal) -> Self {
        Self {
            unit_type,
            amount,
            forex: Some(forex),
            exchange_rate: Some(exchange_rate),
        }
    }
}

/// Transaction type parsed from a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsedTransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Deposit,
    Withdrawal,
    Fee,
    Tax,
    TaxRefund,
}

impl ParsedTransactionType {
    /// Buys and sells move shares in a portfolio; everything else is an
    /// account movement.
    pub fn is_buy_sell(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    /// True when money leaves the account.
    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Buy | Self::Withdrawal | Self::Fee | Self::Tax)
    }
}

/// Trade or account movement under construction by a rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub txn_type: ParsedTransactionType,
    pub date: Option<NaiveDateTime>,
    pub security: Option<Security>,
    pub shares: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub units: Vec<Unit>,
    pub note: Option<String>,
}

impl ParsedTransaction {
    pub fn new(txn_type: ParsedTransactionType) -> Self {
        Self {
            txn_type,
            date: None,
            security: None,
            shares: None,
            amount: None,
            currency: None,
            units: Vec::new(),
            note: None,
        }
    }

    pub fn set_money(&mut self, money: Money) {
        self.amount = Some(money.amount);
        self.currency = Some(money.currency);
    }

    pub fn monetary_amount(&self) -> Option<Money> {
        match (&self.currency, self.amount) {
            (Some(currency), Some(amount)) => Some(Money::new(currency.clone(), amount)),
            _ => None,
        }
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn unit_sum(&self, unit_type: UnitType) -> Decimal {
        self.units
            .iter()
            .filter(|u| u.unit_type == unit_type)
            .map(|u| u.amount.amount)
            .sum()
    }

    pub fn fees(&self) -> Decimal {
        self.unit_sum(UnitType::Fee)
    }

    pub fn taxes(&self) -> Decimal {
        self.unit_sum(UnitType::Tax)
    }

    /// Value before fees and taxes.
    ///
    /// An explicit gross value unit (set for forex dividends) wins; otherwise
    /// fees and taxes are added back for credits and taken out for debits.
    pub fn gross_value(&self) -> Option<Decimal> {
        if let Some(unit) = self.units.iter().find(|u| u.unit_type == UnitType::GrossValue) {
            return Some(unit.amount.amount);
        }
        let amount = self.amount?;
        let charges = self.fees() + self.taxes();
        Some(if self.txn_type.is_debit() {
            amount - charges
        } else {
            amount + charges
        })
    }

    fn validate_common(&self, kind: &'static str) -> Result<(), ExtractionError> {
        if self.date.is_none() {
            return Err(ExtractionError::incomplete(kind, "no date"));
        }
        let currency = match (&self.currency, self.amount) {
            (Some(currency), Some(_)) => currency,
            _ => return Err(ExtractionError::incomplete(kind, "no amount")),
        };
        if let Some(unit) = self.units.iter().find(|u| &u.amount.currency != currency) {
            return Err(ExtractionError::incomplete(
                kind,
                format!(
                    "{:?} in {} does not match transaction currency {}",
                    unit.unit_type, unit.amount.currency, currency
                ),
            ));
        }
        Ok(())
    }
}

/// Extracted object, discriminated by target kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Item {
    Security(Security),
    BuySell(ParsedTransaction),
    Account(ParsedTransaction),
}

impl Item {
    /// Wrap a trade, which needs a security and a share count.
    pub fn buy_sell(t: ParsedTransaction) -> Result<Item, ExtractionError> {
        const KIND: &str = "buy/sell entry";
        if !t.txn_type.is_buy_sell() {
            return Err(ExtractionError::incomplete(
                KIND,
                format!("{:?} is not a trade", t.txn_type),
            ));
        }
        t.validate_common(KIND)?;
        if t.security.is_none() {
            return Err(ExtractionError::incomplete(KIND, "no security"));
        }
        if t.shares.is_none() {
            return Err(ExtractionError::incomplete(KIND, "no shares"));
        }
        Ok(Item::BuySell(t))
    }

    /// Wrap an account movement (dividend, interest, deposit, fee...).
    pub fn account(t: ParsedTransaction) -> Result<Item, ExtractionError> {
        const KIND: &str = "account transaction";
        if t.txn_type.is_buy_sell() {
            return Err(ExtractionError::incomplete(
                KIND,
                format!("{:?} is a trade", t.txn_type),
            ));
        }
        t.validate_common(KIND)?;
        if t.txn_type == ParsedTransactionType::Dividend && t.security.is_none() {
            return Err(ExtractionError::incomplete(KIND, "dividend without security"));
        }
        Ok(Item::Account(t))
    }

    pub fn security(&self) -> Option<&Security> {
        match self {
            Item::Security(security) => Some(security),
            Item::BuySell(t) | Item::Account(t) => t.security.as_ref(),
        }
    }

    pub fn transaction(&self) -> Option<&ParsedTransaction> {
        match self {
            Item::Security(_) => None,
            Item::BuySell(t) | Item::Account(t) => Some(t),
        }
    }
}

/// An extracted item plus the document it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub source: String,
    pub item: Item,
}

impl ResultItem {
    pub fn new(source: impl Into<String>, item: Item) -> Self {
        Self {
            source: source.into(),
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn dividend() -> ParsedTransaction {
        let mut t = ParsedTransaction::new(ParsedTransactionType::Dividend);
        t.date = NaiveDate::from_ymd_opt(2021, 2, 22).and_then(|d| d.and_hms_opt(0, 0, 0));
        t.security = Some(Security {
            isin: Some("US4781601046".to_string()),
            ..Default::default()
        });
        t.set_money(Money::new("EUR", dec("8.64")));
        t
    }

    #[test]
    fn test_same_as_prefers_isin() {
        let a = Security {
            isin: Some("DE0005140008".to_string()),
            name: Some("Deutsche Bank".to_string()),
            ..Default::default()
        };
        let b = Security {
            isin: Some("de0005140008".to_string()),
            name: Some("DEUTSCHE BANK AG NA O.N.".to_string()),
            ..Default::default()
        };
        let c = Security {
            isin: Some("US0378331005".to_string()),
            name: Some("Deutsche Bank".to_string()),
            ..Default::default()
        };
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }

    #[test]
    fn test_same_as_falls_back_to_wkn_and_name() {
        let a = Security {
            wkn: Some("855167".to_string()),
            ..Default::default()
        };
        let b = Security {
            wkn: Some("855167".to_string()),
            isin: Some("CH0012032048".to_string()),
            ..Default::default()
        };
        assert!(a.same_as(&b));

        let named = Security {
            name: Some("Roche".to_string()),
            ..Default::default()
        };
        assert!(named.same_as(&named.clone()));
        assert!(!named.same_as(&Security::default()));
    }

    #[test]
    fn test_gross_value_for_credit_and_debit() {
        let mut t = dividend();
        t.add_unit(Unit::new(UnitType::Tax, Money::new("EUR", dec("1.53"))));
        assert_eq!(t.taxes(), dec("1.53"));
        assert_eq!(t.gross_value(), Some(dec("10.17")));

        let mut buy = ParsedTransaction::new(ParsedTransactionType::Buy);
        buy.set_money(Money::new("EUR", dec("9978.18")));
        buy.add_unit(Unit::new(UnitType::Fee, Money::new("EUR", dec("52.46"))));
        assert_eq!(buy.gross_value(), Some(dec("9925.72")));
    }

    #[test]
    fn test_explicit_gross_value_unit_wins() {
        let mut t = dividend();
        t.add_unit(Unit::with_forex(
            UnitType::GrossValue,
            Money::new("EUR", dec("10.17")),
            Money::new("USD", dec("12.12")),
            dec("0.8389"),
        ));
        assert_eq!(t.gross_value(), Some(dec("10.17")));
    }

    #[test]
    fn test_wrap_account_validates() {
        assert!(matches!(Item::account(dividend()), Ok(Item::Account(_))));

        let mut no_date = dividend();
        no_date.date = None;
        assert!(matches!(
            Item::account(no_date),
            Err(ExtractionError::Incomplete { .. })
        ));

        let mut foreign_tax = dividend();
        foreign_tax.add_unit(Unit::new(UnitType::Tax, Money::new("USD", dec("1.82"))));
        assert!(Item::account(foreign_tax).is_err());

        assert!(Item::buy_sell(dividend()).is_err());
    }

    #[test]
    fn test_wrap_buy_sell_requires_shares() {
        let mut t = dividend();
        t.txn_type = ParsedTransactionType::Buy;
        assert!(Item::buy_sell(t.clone()).is_err());

        t.shares = Some(dec("12"));
        let item = Item::buy_sell(t).unwrap();
        assert_eq!(
            item.security().and_then(|s| s.isin.as_deref()),
            Some("US4781601046")
        );
        assert!(item.transaction().is_some());
    }
}
