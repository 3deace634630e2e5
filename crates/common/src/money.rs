//! Money value object.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing a decimal money amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid amount: {0:?}")]
    Invalid(String),

    #[error("amount {0:?} has more than 2 fractional digits")]
    TooManyFractionDigits(String),

    #[error("amount {0:?} is out of range")]
    OutOfRange(String),
}

/// Money amount represented in cents to avoid floating point issues.
///
/// At the JSON boundary the amount is a decimal number (`29.99`). Parsing
/// rejects anything with more than two fractional digits instead of rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Largest amount whose decimal form survives the `f64` JSON number
    /// exactly (15 significant digits).
    pub const MAX: Money = Money::from_cents(999_999_999_999_999);

    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole number of currency units.
    pub const fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Parses a decimal string such as `"29.99"`, `"30"` or `"-4.5"`.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(MoneyError::Invalid(input.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooManyFractionDigits(input.to_string()));
        }

        let out_of_range = || MoneyError::OutOfRange(input.to_string());
        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| out_of_range())? * 10,
            _ => fraction.parse().map_err(|_| out_of_range())?,
        };

        let cents = whole_units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or_else(out_of_range)?;

        Ok(Self::from_cents(if negative { -cents } else { cents }))
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns the number of digits in the whole-unit portion.
    pub fn integer_digits(&self) -> usize {
        self.units().unsigned_abs().to_string().len()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    ///
    /// Use [`Money::checked_mul`] where the result must stay within [`Money::MAX`].
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, or `None` when the product exceeds [`Money::MAX`].
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .and_then(Money::bounded)
    }

    /// Adds two amounts, or `None` when the sum exceeds [`Money::MAX`].
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).and_then(Money::bounded)
    }

    fn bounded(cents: i64) -> Option<Money> {
        (cents.unsigned_abs() <= Money::MAX.cents.unsigned_abs()).then_some(Money { cents })
    }

    /// Returns the amount as a floating point number of whole units.
    ///
    /// Only used for serialization; arithmetic stays in cents.
    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a decimal amount with at most 2 fractional digits")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(|| E::custom(MoneyError::OutOfRange(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(MoneyError::OutOfRange(v.to_string())))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // Display for f64 yields the shortest decimal that round-trips, which
        // is the literal the client sent for any realistic price.
        Money::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.units(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(100).to_string(), "1.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!(Money::parse("29.99").unwrap().cents(), 2999);
        assert_eq!(Money::parse("30").unwrap().cents(), 3000);
        assert_eq!(Money::parse("4.5").unwrap().cents(), 450);
        assert_eq!(Money::parse(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse("-1.25").unwrap().cents(), -125);
        assert_eq!(Money::parse(" 10.00 ").unwrap().cents(), 1000);
    }

    #[test]
    fn test_parse_rejects_malformed_amounts() {
        assert!(matches!(Money::parse(""), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("."), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("12a"), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("1.2.3"), Err(MoneyError::Invalid(_))));
        assert!(matches!(
            Money::parse("9.999"),
            Err(MoneyError::TooManyFractionDigits(_))
        ));
        assert!(matches!(
            Money::parse("99999999999999999999"),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!(a.multiply(3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_stays_within_max() {
        let price = Money::parse("9999999999.99").unwrap();

        assert_eq!(price.checked_mul(3), Some(Money::from_cents(2_999_999_999_997)));
        assert_eq!(price.checked_mul(u32::MAX), None);
        assert_eq!(price.checked_mul(100_001), None);
        assert_eq!(Money::MAX.checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::MAX.checked_add(Money::from_cents(-1)),
            Some(Money::from_cents(999_999_999_999_998))
        );
        assert_eq!(price.multiply(u32::MAX).cents(), i64::MAX);
    }

    #[test]
    fn test_integer_digits() {
        assert_eq!(Money::from_cents(99).integer_digits(), 1);
        assert_eq!(Money::from_cents(123_456).integer_digits(), 4);
        assert_eq!(Money::from_units(10_000_000_000).integer_digits(), 11);
    }

    #[test]
    fn test_json_uses_decimal_numbers() {
        let json = serde_json::to_string(&Money::from_cents(2999)).unwrap();
        assert_eq!(json, "29.99");

        let parsed: Money = serde_json::from_str("29.99").unwrap();
        assert_eq!(parsed.cents(), 2999);

        let parsed: Money = serde_json::from_str("15").unwrap();
        assert_eq!(parsed.cents(), 1500);

        let parsed: Money = serde_json::from_str("\"7.10\"").unwrap();
        assert_eq!(parsed.cents(), 710);

        assert!(serde_json::from_str::<Money>("1.999").is_err());
    }

    #[test]
    fn test_max_serializes_exactly() {
        let json = serde_json::to_string(&Money::MAX).unwrap();
        assert_eq!(json, "9999999999999.99");

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Money::MAX);
    }
}
