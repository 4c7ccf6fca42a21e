//! Year-end settlement types.

use chrono::{Datelike, NaiveDate};
use leavedesk_shared::types::{Days, OrganizationId, UserId};
use serde::{Deserialize, Serialize};

use crate::leave::types::{LeaveStatus, LeaveType};

/// The days at the start of a year during which settlement may run
/// without being forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementWindow {
    /// Days from January 1st, inclusive.
    pub days: u32,
}

impl SettlementWindow {
    /// Creates a window of `days` days.
    #[must_use]
    pub const fn new(days: u32) -> Self {
        Self { days }
    }

    /// Returns true if `today` falls on January 1st ..= January `days`.
    #[must_use]
    pub fn contains(&self, today: NaiveDate) -> bool {
        today.month() == 1 && today.day() <= self.days
    }
}

/// How a run treats users that already have an archive row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// First run for the year; refused if any archive row exists.
    #[default]
    Initial,
    /// Re-run for users left without an archive row by a failed run.
    RetryFailed,
}

/// The organization's rollover template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverPolicy {
    /// New-year casual allotment.
    pub default_casual: Days,
    /// New-year medical allotment.
    pub default_medical: Days,
    /// Carry unused casual balance into the new year.
    pub carry_forward: bool,
}

/// A user's balances at the moment of settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosingBalances {
    /// Casual balance.
    pub casual: Days,
    /// Medical balance.
    pub medical: Days,
    /// Unconsumed comp-off days.
    pub comp_off: Days,
}

/// New-year balances for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverOutcome {
    /// New casual balance.
    pub new_casual: Days,
    /// New medical balance (always the default).
    pub new_medical: Days,
    /// New comp-off balance (always zero).
    pub new_comp_off: Days,
    /// Casual days carried into the new year.
    pub carried_forward_casual: Days,
    /// Comp-off days forfeited.
    pub forfeited_comp_off: Days,
}

/// One leave request as seen by settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearLeave {
    /// Leave type.
    pub leave_type: LeaveType,
    /// Status.
    pub status: LeaveStatus,
    /// First day; decides the year the request belongs to.
    pub start_date: NaiveDate,
    /// Days charged.
    pub days_count: Days,
}

/// Per-user statistics of one leave year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaveYearSummary {
    /// Requests starting in the year.
    pub total_requests: u32,
    /// Approved requests.
    pub approved: u32,
    /// Pending requests (archived without a decision).
    pub pending: u32,
    /// Rejected requests.
    pub rejected: u32,
    /// Cancelled requests.
    pub cancelled: u32,
    /// Approved casual days.
    pub casual_taken: Days,
    /// Approved medical days.
    pub medical_taken: Days,
    /// Approved comp-off days.
    pub comp_off_taken: Days,
}

impl LeaveYearSummary {
    /// Aggregates the requests starting in `year`; others are ignored.
    ///
    /// Days taken count approved requests only.
    #[must_use]
    pub fn from_leaves(year: i32, leaves: &[YearLeave]) -> Self {
        let mut summary = Self::default();
        for leave in leaves.iter().filter(|l| l.start_date.year() == year) {
            summary.total_requests += 1;
            match leave.status {
                LeaveStatus::Approved => {
                    summary.approved += 1;
                    match leave.leave_type {
                        LeaveType::Casual => summary.casual_taken += leave.days_count,
                        LeaveType::Medical => summary.medical_taken += leave.days_count,
                        LeaveType::CompOff => summary.comp_off_taken += leave.days_count,
                    }
                }
                LeaveStatus::Pending => summary.pending += 1,
                LeaveStatus::Rejected => summary.rejected += 1,
                LeaveStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }

    /// Total approved days.
    #[must_use]
    pub fn total_taken(&self) -> Days {
        self.casual_taken + self.medical_taken + self.comp_off_taken
    }
}

/// Everything settlement computes for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserSettlement {
    /// User.
    pub user_id: UserId,
    /// Year settled.
    pub year: i32,
    /// Year statistics.
    pub summary: LeaveYearSummary,
    /// Balances before the rollover.
    pub closing: ClosingBalances,
    /// Balances after the rollover.
    pub outcome: RolloverOutcome,
}

/// A user the run could not settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSettlementFailure {
    /// User.
    pub user_id: UserId,
    /// What went wrong.
    pub reason: String,
}

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Every user settled.
    Completed,
    /// Some users failed; re-run with `RetryFailed`.
    CompletedWithFailures,
}

/// Result of a settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Year settled.
    pub year: i32,
    /// Mode the run used.
    pub mode: SettlementMode,
    /// Users settled by this run.
    pub succeeded: u32,
    /// Users that failed.
    pub failed: Vec<UserSettlementFailure>,
    /// Users skipped because an earlier run already settled them.
    pub skipped: u32,
    /// Leave requests archived by this run.
    pub archived_leaves: u64,
    /// Whether the settings row was marked processed.
    pub marked_processed: bool,
}

impl SettlementReport {
    /// Starts an empty report.
    #[must_use]
    pub const fn new(organization_id: OrganizationId, year: i32, mode: SettlementMode) -> Self {
        Self {
            organization_id,
            year,
            mode,
            succeeded: 0,
            failed: Vec::new(),
            skipped: 0,
            archived_leaves: 0,
            marked_processed: false,
        }
    }

    /// Aggregate status.
    #[must_use]
    pub fn status(&self) -> SettlementStatus {
        if self.failed.is_empty() {
            SettlementStatus::Completed
        } else {
            SettlementStatus::CompletedWithFailures
        }
    }
}
