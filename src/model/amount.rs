//! Amount type for handling monetary values that arrive as loosely-typed input.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Values may be parsed from strings
//! that include a dollar sign and commas, or from plain numbers, and anything malformed collapses
//! to zero so that aggregates never see a non-number.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use tracing::warn;

/// Represents a dollar amount.
///
/// Equality and ordering are numeric, so `4.5` and `4.50` are the same amount. The `Display`
/// implementation always renders US currency with two decimal places and thousands separators.
///
/// # Examples
///
/// Parsing with dollar sign and commas:
/// ```
/// # use spendview::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,234.5").unwrap();
/// assert_eq!(amount.to_string(), "-$1,234.50");
/// ```
///
/// Lenient parsing never fails:
/// ```
/// # use spendview::model::Amount;
/// let amount = Amount::lenient("twelve dollars");
/// assert!(amount.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Creates an Amount from a floating point number. `NaN` and infinities become zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            warn!("Non-finite amount {value} treated as 0");
            return Self::ZERO;
        }
        match Decimal::from_f64(value) {
            Some(d) => Self(d),
            None => {
                warn!("Amount {value} is out of range, treated as 0");
                Self::ZERO
            }
        }
    }

    /// Parses `s` the way `FromStr` does, but returns zero instead of an error.
    pub fn lenient(s: &str) -> Self {
        match Amount::from_str(s) {
            Ok(amount) => amount,
            Err(e) => {
                warn!("Unable to parse amount '{s}', treated as 0: {e}");
                Self::ZERO
            }
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        // "-$50.00", "$50.00", "-50.00" or "50.00"
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned);
        let digits = unsigned.replace(',', "");

        let value = Decimal::from_str(&digits)
            .or_else(|_| Decimal::from_scientific(&digits))
            .map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = Amount(self.0.round_dp(2));
        let sign = if rounded.is_negative() { "-" } else { "" };
        let digits = format!("{:.2}", rounded.0.abs());
        let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
        write!(f, "{sign}${}.{cents}", group_thousands(whole))
    }
}

/// Inserts a comma between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (ix, c) in digits.chars().enumerate() {
        if ix > 0 && (digits.len() - ix) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl Add for Amount {
    type Output = Amount;

    /// Adds two amounts. A sum that does not fit in a `Decimal` saturates at the largest or
    /// smallest representable value.
    fn add(self, rhs: Self) -> Self::Output {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Amount(sum),
            None => {
                let saturated = if rhs.0.is_sign_negative() {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                };
                warn!(
                    "Amount overflow adding {} and {}, saturated to {saturated}",
                    self.0, rhs.0
                );
                Amount(saturated)
            }
        }
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

/// Accepts a string, a number, or nothing at all. Malformed values become zero.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string holding a dollar amount")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount::lenient(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount::from_f64(v))
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        warn!("Boolean amount {v} treated as 0");
        Ok(Amount::ZERO)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount::ZERO)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount::ZERO)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }

    fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        IgnoredAny.visit_seq(seq)?;
        warn!("Array amount treated as 0");
        Ok(Amount::ZERO)
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        IgnoredAny.visit_map(map)?;
        warn!("Object amount treated as 0");
        Ok(Amount::ZERO)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
