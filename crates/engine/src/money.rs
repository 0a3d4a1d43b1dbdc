use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

/// Money amount represented as an **integer number of minor units**.
///
/// Use this type for **all** monetary values in the engine (limits, spent
/// totals, expense amounts) to avoid floating-point drift.
///
/// Limits and spent totals are never negative; the only place a negative
/// value shows up is a budget's `remaining`, where it represents an overage.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(1_250_000);
/// assert_eq!(amount.minor(), 1_250_000);
/// assert_eq!(amount.to_string(), "1.250.000₫");
/// ```
///
/// Parsing from user input accepts plain digits or `.`/`,`/space grouped
/// thousands; dong has no fractional part so `12.5` is rejected:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("300000".parse::<Money>().unwrap().minor(), 300_000);
/// assert_eq!("1.000.000".parse::<Money>().unwrap().minor(), 1_000_000);
/// assert!("12.5".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Currency every amount is denominated in.
    pub const CURRENCY: Currency = Currency::Vnd;

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        Self::CURRENCY
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Sums amounts, failing instead of wrapping on overflow.
    pub fn checked_sum<I>(amounts: I) -> Result<Money, EngineError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Money::ZERO, |acc, amount| {
            acc.checked_add(amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}{grouped}{}", Self::CURRENCY.symbol())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a whole-dong string into minor units.
    ///
    /// Accepts an optional leading `+`/`-`, an optional trailing `₫`/`VND`,
    /// and thousands grouped with `.`, `,` or spaces. Every group after the
    /// first must have exactly three digits, so fractional input like `12.5`
    /// is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_suffix('₫')
            .or_else(|| trimmed.strip_suffix("VND"))
            .unwrap_or(trimmed)
            .trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let groups: Vec<&str> = rest.split(['.', ',', ' ']).collect();
        for (idx, group) in groups.iter().enumerate() {
            if group.is_empty() || !group.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if idx > 0 && group.len() != 3 {
                return Err(invalid());
            }
        }

        let digits: String = groups.concat();
        let total: i64 = digits.parse().map_err(|_| overflow())?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}
