//! Year-end settlement computations.
//!
//! The engine decides whether a run may start, and what each user's
//! archive row and new-year balances are. The repository layer performs the
//! per-user writes and collects failures into a [`SettlementReport`].

use chrono::{Datelike, NaiveDate};
use leavedesk_shared::types::{Days, UserId};

use crate::settlement::error::SettlementError;
use crate::settlement::types::{
    ClosingBalances, LeaveYearSummary, RolloverOutcome, RolloverPolicy, SettlementMode,
    SettlementReport, SettlementWindow, UserSettlement, YearLeave,
};

/// Stateless year-end settlement rules.
pub struct SettlementEngine;

impl SettlementEngine {
    /// The year a run on `today` settles: the previous calendar year.
    #[must_use]
    pub fn target_year(today: NaiveDate) -> i32 {
        today.year() - 1
    }

    /// Resolves the year to settle.
    ///
    /// Without an explicit year this is [`Self::target_year`]. An explicit
    /// year needs `force` and must already have ended.
    ///
    /// # Errors
    ///
    /// - `ExplicitYearRequiresForce` for an unforced explicit year
    /// - `YearNotClosed` for the current or a future year
    pub fn resolve_year(
        today: NaiveDate,
        requested: Option<i32>,
        force: bool,
    ) -> Result<i32, SettlementError> {
        match requested {
            None => Ok(Self::target_year(today)),
            Some(_) if !force => Err(SettlementError::ExplicitYearRequiresForce),
            Some(year) if year >= today.year() => Err(SettlementError::YearNotClosed { year }),
            Some(year) => Ok(year),
        }
    }

    /// Checks the settlement window.
    ///
    /// # Errors
    ///
    /// Returns `OutsideWindow` if `today` is outside and the run is not forced.
    pub fn check_window(
        today: NaiveDate,
        window: SettlementWindow,
        force: bool,
    ) -> Result<(), SettlementError> {
        if force || window.contains(today) {
            Ok(())
        } else {
            Err(SettlementError::OutsideWindow {
                today,
                window_days: window.days,
            })
        }
    }

    /// The idempotency gate.
    ///
    /// Archive rows for (organization, year) mean settlement already ran.
    ///
    /// # Errors
    ///
    /// - `AlreadySettled` for an initial run when archives exist
    /// - `NotYetSettled` for a retry when none exist
    pub fn gate(
        year: i32,
        existing_archives: u64,
        mode: SettlementMode,
    ) -> Result<(), SettlementError> {
        match (mode, existing_archives) {
            (SettlementMode::Initial, 0) => Ok(()),
            (SettlementMode::Initial, _) => Err(SettlementError::AlreadySettled { year }),
            (SettlementMode::RetryFailed, 0) => Err(SettlementError::NotYetSettled { year }),
            (SettlementMode::RetryFailed, _) => Ok(()),
        }
    }

    /// Computes new-year balances.
    ///
    /// Medical resets to the default. Casual resets to the default plus,
    /// with carry-forward enabled, the non-negative remainder of the old
    /// casual balance. Comp-off resets to zero; unconsumed grants are
    /// forfeited.
    #[must_use]
    pub fn roll_over(closing: ClosingBalances, policy: RolloverPolicy) -> RolloverOutcome {
        let carried_forward_casual = if policy.carry_forward {
            closing.casual.non_negative()
        } else {
            Days::ZERO
        };

        RolloverOutcome {
            new_casual: policy.default_casual + carried_forward_casual,
            new_medical: policy.default_medical,
            new_comp_off: Days::ZERO,
            carried_forward_casual,
            forfeited_comp_off: closing.comp_off.non_negative(),
        }
    }

    /// Computes everything settlement writes for one user.
    #[must_use]
    pub fn settle_user(
        user_id: UserId,
        year: i32,
        leaves: &[YearLeave],
        closing: ClosingBalances,
        policy: RolloverPolicy,
    ) -> UserSettlement {
        UserSettlement {
            user_id,
            year,
            summary: LeaveYearSummary::from_leaves(year, leaves),
            closing,
            outcome: Self::roll_over(closing, policy),
        }
    }

    /// Whether a finished run may mark the settings row as processed.
    ///
    /// A run with failures only marks it when the caller explicitly accepts
    /// a partial result.
    #[must_use]
    pub fn should_mark_processed(report: &SettlementReport, allow_partial: bool) -> bool {
        report.failed.is_empty() || allow_partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::types::{LeaveStatus, LeaveType};
    use crate::settlement::types::{SettlementStatus, UserSettlementFailure};
    use leavedesk_shared::types::OrganizationId;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy(carry_forward: bool) -> RolloverPolicy {
        RolloverPolicy {
            default_casual: Days::whole(12),
            default_medical: Days::whole(12),
            carry_forward,
        }
    }

    #[test]
    fn test_target_year() {
        assert_eq!(SettlementEngine::target_year(date(2025, 1, 3)), 2024);
    }

    #[test]
    fn test_resolve_year() {
        let today = date(2025, 6, 1);
        assert_eq!(SettlementEngine::resolve_year(today, None, false).unwrap(), 2024);
        assert_eq!(
            SettlementEngine::resolve_year(today, Some(2023), true).unwrap(),
            2023
        );
        assert!(matches!(
            SettlementEngine::resolve_year(today, Some(2023), false),
            Err(SettlementError::ExplicitYearRequiresForce)
        ));
        assert!(matches!(
            SettlementEngine::resolve_year(today, Some(2025), true),
            Err(SettlementError::YearNotClosed { year: 2025 })
        ));
    }

    #[test]
    fn test_window() {
        let window = SettlementWindow::new(7);
        assert!(window.contains(date(2025, 1, 1)));
        assert!(window.contains(date(2025, 1, 7)));
        assert!(!window.contains(date(2025, 1, 8)));
        assert!(!window.contains(date(2024, 12, 31)));

        assert!(SettlementEngine::check_window(date(2025, 3, 1), window, false).is_err());
        assert!(SettlementEngine::check_window(date(2025, 3, 1), window, true).is_ok());
    }

    #[test]
    fn test_gate_second_run_is_blocked_scenario_e() {
        assert!(SettlementEngine::gate(2024, 0, SettlementMode::Initial).is_ok());
        assert!(matches!(
            SettlementEngine::gate(2024, 25, SettlementMode::Initial),
            Err(SettlementError::AlreadySettled { year: 2024 })
        ));
        assert!(SettlementEngine::gate(2024, 25, SettlementMode::RetryFailed).is_ok());
        assert!(matches!(
            SettlementEngine::gate(2024, 0, SettlementMode::RetryFailed),
            Err(SettlementError::NotYetSettled { .. })
        ));
    }

    #[test]
    fn test_carry_forward_scenario_c() {
        let closing = ClosingBalances {
            casual: Days::whole(4),
            medical: Days::whole(1),
            comp_off: Days::whole(2),
        };
        let outcome = SettlementEngine::roll_over(closing, policy(true));
        assert_eq!(outcome.new_casual, Days::whole(16));
        assert_eq!(outcome.new_medical, Days::whole(12));
        assert_eq!(outcome.new_comp_off, Days::ZERO);
        assert_eq!(outcome.carried_forward_casual, Days::whole(4));
        assert_eq!(outcome.forfeited_comp_off, Days::whole(2));
    }

    #[test]
    fn test_no_carry_forward_resets() {
        let closing = ClosingBalances {
            casual: Days::new(dec!(7.5)),
            medical: Days::whole(20),
            comp_off: Days::ZERO,
        };
        let outcome = SettlementEngine::roll_over(closing, policy(false));
        assert_eq!(outcome.new_casual, Days::whole(12));
        assert_eq!(outcome.new_medical, Days::whole(12));
        assert_eq!(outcome.carried_forward_casual, Days::ZERO);
    }

    #[test]
    fn test_negative_casual_is_not_carried() {
        let closing = ClosingBalances {
            casual: Days::new(dec!(-2)),
            ..ClosingBalances::default()
        };
        let outcome = SettlementEngine::roll_over(closing, policy(true));
        assert_eq!(outcome.new_casual, Days::whole(12));
    }

    #[test]
    fn test_summary_counts_year_and_approved_days() {
        let leaves = [
            YearLeave {
                leave_type: LeaveType::Casual,
                status: LeaveStatus::Approved,
                start_date: date(2024, 3, 4),
                days_count: Days::whole(5),
            },
            YearLeave {
                leave_type: LeaveType::Medical,
                status: LeaveStatus::Approved,
                start_date: date(2024, 6, 1),
                days_count: Days::HALF,
            },
            YearLeave {
                leave_type: LeaveType::Casual,
                status: LeaveStatus::Rejected,
                start_date: date(2024, 7, 1),
                days_count: Days::whole(2),
            },
            YearLeave {
                leave_type: LeaveType::CompOff,
                status: LeaveStatus::Pending,
                start_date: date(2024, 12, 30),
                days_count: Days::ONE,
            },
            YearLeave {
                leave_type: LeaveType::Casual,
                status: LeaveStatus::Approved,
                start_date: date(2025, 1, 2),
                days_count: Days::whole(3),
            },
        ];

        let summary = LeaveYearSummary::from_leaves(2024, &leaves);
        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.casual_taken, Days::whole(5));
        assert_eq!(summary.medical_taken, Days::HALF);
        assert_eq!(summary.comp_off_taken, Days::ZERO);
        assert_eq!(summary.total_taken().amount(), dec!(5.5));
    }

    #[test]
    fn test_report_status_and_marking() {
        let mut report =
            SettlementReport::new(OrganizationId::new(), 2024, SettlementMode::Initial);
        report.succeeded = 3;
        assert_eq!(report.status(), SettlementStatus::Completed);
        assert!(SettlementEngine::should_mark_processed(&report, false));

        report.failed.push(UserSettlementFailure {
            user_id: UserId::new(),
            reason: "deadlock detected".to_string(),
        });
        assert_eq!(report.status(), SettlementStatus::CompletedWithFailures);
        assert!(!SettlementEngine::should_mark_processed(&report, false));
        assert!(SettlementEngine::should_mark_processed(&report, true));
    }
}
