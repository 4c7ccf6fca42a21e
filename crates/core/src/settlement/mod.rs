//! Year-end settlement.
//!
//! Archives each user's year, rolls balances over into the new year and
//! reports per-user failures so a run can be retried.
//!
//! # Modules
//!
//! - `engine` - Window, idempotency gate and rollover rules
//! - `error` - Settlement error types
//! - `types` - Summaries, rollover outcomes and run reports

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::SettlementEngine;
pub use error::SettlementError;
pub use types::{
    ClosingBalances, LeaveYearSummary, RolloverOutcome, RolloverPolicy, SettlementMode,
    SettlementReport, SettlementStatus, SettlementWindow, UserSettlement, UserSettlementFailure,
    YearLeave,
};
