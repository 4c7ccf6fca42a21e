//! Day quantities with decimal precision.
//!
//! CRITICAL: Never use floating-point for leave balances.
//! Half days make balances fractional, so this type wraps
//! `rust_decimal::Decimal` and every balance, debit, credit and
//! carry-forward amount in the system is a `Days`.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A quantity of leave days (e.g. `0.5`, `1`, `5`).
///
/// The value itself may be negative when it comes straight from storage,
/// but every ledger write goes through [`Days::saturating_sub`] which floors
/// the result at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Days(Decimal);

impl Days {
    /// Zero days.
    pub const ZERO: Self = Self(Decimal::ZERO);
    /// Half a day.
    pub const HALF: Self = Self(Decimal::from_parts(5, 0, 0, false, 1));
    /// One whole day.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Wraps a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a whole number of days.
    #[must_use]
    pub fn whole(days: i64) -> Self {
        Self(Decimal::from(days))
    }

    /// Returns the inner decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the quantity is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the quantity is strictly below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Subtracts `rhs`, flooring the result at zero.
    ///
    /// This is the ledger debit rule: `max(0, self - rhs)`.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let diff = self.0 - rhs.0;
        if diff < Decimal::ZERO {
            Self::ZERO
        } else {
            Self(diff)
        }
    }

    /// Adds `rhs`, returning `None` on decimal overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Clamps a negative quantity to zero.
    #[must_use]
    pub fn non_negative(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }

    /// Rounds to one decimal place, the precision balances are shown with.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self(self.0.round_dp(1).normalize())
    }
}

impl From<Decimal> for Days {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Days> for Decimal {
    fn from(days: Days) -> Self {
        days.0
    }
}

impl Add for Days {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Days {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Days {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Days> for Days {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Days {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normalized().0)
    }
}

#[cfg(test)]
#[path = "days_tests.rs"]
mod tests;
