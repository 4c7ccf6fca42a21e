//! Leave balance ledger arithmetic.
//!
//! Balances change only through [`LedgerEffect`]s produced by the leave
//! workflow and through administrative resets. A debit floors the balance
//! at zero (`GREATEST(0, b - d)` in SQL); a credit adds back exactly what a
//! previous debit actually removed.

use leavedesk_shared::types::Days;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A per-user balance column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    /// `balance_casual`.
    Casual,
    /// `balance_medical`.
    Medical,
}

impl BalanceField {
    /// The column holding this balance.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Casual => "balance_casual",
            Self::Medical => "balance_medical",
        }
    }
}

impl fmt::Display for BalanceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A single balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LedgerEffect {
    /// Remove days, flooring at zero.
    Debit {
        /// Balance column.
        field: BalanceField,
        /// Days requested.
        days: Days,
    },
    /// Add days back.
    Credit {
        /// Balance column.
        field: BalanceField,
        /// Days to add.
        days: Days,
    },
}

impl LedgerEffect {
    /// Returns the balance column.
    #[must_use]
    pub const fn field(&self) -> BalanceField {
        match self {
            Self::Debit { field, .. } | Self::Credit { field, .. } => *field,
        }
    }

    /// Returns the requested quantity.
    #[must_use]
    pub const fn days(&self) -> Days {
        match self {
            Self::Debit { days, .. } | Self::Credit { days, .. } => *days,
        }
    }

    /// Returns true for debits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Debit { .. })
    }

    /// Computes the balance after this effect.
    #[must_use]
    pub fn resulting_balance(&self, before: Days) -> Days {
        match self {
            Self::Debit { days, .. } => before.saturating_sub(*days),
            Self::Credit { days, .. } => before + *days,
        }
    }
}

/// Outcome of one applied effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedEffect {
    /// The effect.
    pub effect: LedgerEffect,
    /// Days requested.
    pub requested: Days,
    /// Days that actually moved (a clamped debit moves less than requested).
    pub applied: Days,
    /// Balance before.
    pub before: Days,
    /// Balance after.
    pub after: Days,
}

impl AppliedEffect {
    /// Builds the outcome from the balances observed before and after.
    #[must_use]
    pub fn observed(effect: LedgerEffect, before: Days, after: Days) -> Self {
        let applied = if effect.is_debit() {
            before.saturating_sub(after)
        } else {
            after.saturating_sub(before)
        };
        Self {
            effect,
            requested: effect.days(),
            applied,
            before,
            after,
        }
    }

    /// Returns true if a debit was cut short by the zero floor.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.applied < self.requested
    }
}

/// In-memory copy of one user's casual and medical balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Casual balance.
    pub casual: Days,
    /// Medical balance.
    pub medical: Days,
}

impl BalanceSheet {
    /// Creates a sheet.
    #[must_use]
    pub const fn new(casual: Days, medical: Days) -> Self {
        Self { casual, medical }
    }

    /// Reads one field.
    #[must_use]
    pub const fn get(&self, field: BalanceField) -> Days {
        match field {
            BalanceField::Casual => self.casual,
            BalanceField::Medical => self.medical,
        }
    }

    fn slot(&mut self, field: BalanceField) -> &mut Days {
        match field {
            BalanceField::Casual => &mut self.casual,
            BalanceField::Medical => &mut self.medical,
        }
    }

    /// Applies an effect with the same arithmetic the database executes.
    pub fn apply(&mut self, effect: LedgerEffect) -> AppliedEffect {
        let slot = self.slot(effect.field());
        let before = *slot;
        let after = effect.resulting_balance(before);
        *slot = after;
        AppliedEffect::observed(effect, before, after)
    }

    /// Applies effects in order.
    pub fn apply_all(&mut self, effects: &[LedgerEffect]) -> Vec<AppliedEffect> {
        effects.iter().map(|effect| self.apply(*effect)).collect()
    }
}
