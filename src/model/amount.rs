//! Amount type for quantities of tokens or dollars found in bot logs.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Parsing tolerates the formatting
//! the bot sometimes writes (a dollar sign, thousands separators, surrounding whitespace). Writing
//! always produces the plain decimal form expected by tax tools, e.g. `1234.5`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a non-currency-specific amount.
///
/// Trailing zeros are not significant: `Amount::from_str("50.00")` displays as `50`.
///
/// # Examples
///
/// ```
/// # use bot_tax::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-$1,050.50").unwrap();
/// assert_eq!(amount.abs().to_string(), "1050.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero. Negative zero is not negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Divides `self` by `rhs`, returning `None` when `rhs` is zero or the result overflows.
    pub fn checked_div(&self, rhs: Amount) -> Option<Amount> {
        if rhs.is_zero() {
            return None;
        }
        self.0.checked_div(rhs.0).map(Amount)
    }

    /// Formats the amount with exactly `dp` decimal places, e.g. `12.30` for `dp = 2`. Halves round
    /// away from zero, so `2.675` becomes `2.68`.
    pub fn fixed(&self, dp: u32) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.prec$}", prec = dp as usize)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
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
            return Ok(Amount::default());
        }

        // "-$50.00", "$50.00" or "50.00"
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_dollar.replace(',', "");

        // The bot writes JavaScript numbers, which can come out in exponent form.
        let value = if without_commas.contains(['e', 'E']) {
            Decimal::from_scientific(&without_commas).map_err(AmountError)?
        } else {
            Decimal::from_str(&without_commas).map_err(AmountError)?
        };
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.normalize(), f)
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
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
