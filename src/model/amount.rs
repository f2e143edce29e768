//! Amount type for signed monetary values.
//!
//! By convention a positive amount is an expense and a negative amount is income (a refund,
//! a payment, a credit). Values are held as `Decimal` so that sums do not drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Represents a signed amount of money in the transaction's own currency.
///
/// Parsing is lenient about the way exports tend to write numbers: a leading dollar sign and
/// thousands separators are accepted. Writing always produces the plain decimal form, keeping the
/// scale that was parsed, so `12.5` is written back as `12.5`.
///
/// ```
/// # use finboard::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,250.00").unwrap();
/// assert_eq!(amount.to_string(), "-1250.00");
/// assert!(amount.is_income());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// An expense is a strictly positive amount.
    pub fn is_expense(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Income is a strictly negative amount.
    pub fn is_income(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Formats the amount for people, e.g. `-$1,250.00`.
    pub fn to_currency_string(&self) -> String {
        let sign = if self.is_income() { "-" } else { "" };
        let abs = self.0.abs().round_dp(2);
        format!(
            "{sign}${}",
            format_num::format_num!(",.2", abs.to_f64().unwrap_or_default())
        )
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AmountError({:?}, {:?})", self.input, self.source)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to parse '{}' as an amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned
            .strip_prefix('$')
            .unwrap_or(unsigned)
            .replace(',', "");

        let value = Decimal::from_str(&digits)
            .or_else(|_| Decimal::from_scientific(&digits))
            .map_err(|source| AmountError {
                input: s.to_string(),
                source,
            })?;

        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |a, b| a + b)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(Amount::from_str("50.00").unwrap().value(), dec("50.00"));
        assert_eq!(Amount::from_str("-3.5").unwrap().value(), dec("-3.5"));
    }

    #[test]
    fn test_parse_dollar_and_commas() {
        assert_eq!(Amount::from_str("$1,000.00").unwrap().value(), dec("1000.00"));
        assert_eq!(
            Amount::from_str("-$60,000.00").unwrap().value(),
            dec("-60000.00")
        );
    }

    #[test]
    fn test_parse_empty_is_an_error() {
        // a blank cell is an absent amount, not zero
        assert!(Amount::from_str("   ").is_err());
    }

    #[test]
    fn test_parse_garbage() {
        let err = Amount::from_str("twelve").unwrap_err();
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn test_display_keeps_scale() {
        assert_eq!(Amount::from_str("12.5").unwrap().to_string(), "12.5");
        assert_eq!(Amount::from_str("$7.25").unwrap().to_string(), "7.25");
    }

    #[test]
    fn test_expense_and_income() {
        let expense = Amount::from_str("4.20").unwrap();
        let income = Amount::from_str("-100").unwrap();
        assert!(expense.is_expense());
        assert!(!expense.is_income());
        assert!(income.is_income());
        assert!(!Amount::ZERO.is_expense());
        assert!(!Amount::ZERO.is_income());
    }

    #[test]
    fn test_currency_string() {
        assert_eq!(
            Amount::from_str("1234.5").unwrap().to_currency_string(),
            "$1,234.50"
        );
        assert_eq!(
            Amount::from_str("-87.43").unwrap().to_currency_string(),
            "-$87.43"
        );
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Amount::from_str("1.10").unwrap(),
            Amount::from_str("2.20").unwrap(),
            Amount::from_str("-0.30").unwrap(),
        ];
        let total: Amount = amounts.iter().sum();
        assert_eq!(total.value(), dec("3.00"));
    }

    #[test]
    fn test_serde() {
        let amount = Amount::from_str("-50.25").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"-50.25\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
