//! Property-based tests for the leave workflow and balance ledger.

use chrono::{Duration, NaiveDate, Utc};
use leavedesk_shared::types::{Days, GroupId, LeaveId, OrganizationId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::access::{Actor, Role};
use crate::balance::BalanceSheet;
use crate::leave::period::days_count;
use crate::leave::service::LeaveWorkflow;
use crate::leave::types::{LeaveRequest, LeaveStatus, LeaveType};

/// Strategy for balances between 0 and 40 days in half-day steps.
fn arb_balance() -> impl Strategy<Value = Days> {
    (0i64..=80).prop_map(|halves| Days::new(Decimal::new(halves * 5, 1)))
}

/// Strategy for leave lengths: half day or 1..=15 whole days.
fn arb_leave_days() -> impl Strategy<Value = Days> {
    prop_oneof![Just(Days::HALF), (1i64..=15).prop_map(Days::whole)]
}

fn arb_leave_type() -> impl Strategy<Value = LeaveType> {
    prop_oneof![Just(LeaveType::Casual), Just(LeaveType::Medical)]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN) + Duration::days(offset)
    })
}

fn pending(user_id: UserId, leave_type: LeaveType, days: Days) -> LeaveRequest {
    LeaveRequest {
        id: LeaveId::new(),
        user_id,
        organization_id: OrganizationId::from_uuid(uuid::Uuid::nil()),
        leave_type,
        status: LeaveStatus::Pending,
        start_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap_or(NaiveDate::MIN),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap_or(NaiveDate::MIN),
        is_half_day: days == Days::HALF,
        days_count: days,
        ledger_days: Days::ZERO,
        assigned_group_id: Some(GroupId::new()),
        is_archived: false,
        created_at: Utc::now(),
    }
}

/// Approves a request against the sheet the way the repository does,
/// recording the debit actually applied.
fn approve(sheet: &mut BalanceSheet, request: &mut LeaveRequest) {
    let transition = LeaveWorkflow::approve(request).unwrap();
    let applied = sheet.apply_all(&transition.ledger);
    request.status = transition.new_status;
    request.ledger_days = applied.iter().map(|a| a.applied).sum();
}

fn cancel(sheet: &mut BalanceSheet, request: &mut LeaveRequest) {
    let owner = Actor {
        user_id: request.user_id,
        organization_id: request.organization_id,
        role: Role::User,
    };
    let transition = LeaveWorkflow::cancel(&owner, request).unwrap();
    sheet.apply_all(&transition.ledger);
    request.status = transition.new_status;
    request.ledger_days = Days::ZERO;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approve then cancel restores the pre-approval balance exactly,
    /// even when the debit was clamped at zero.
    #[test]
    fn prop_cancel_reverses_approve(
        casual in arb_balance(),
        medical in arb_balance(),
        leave_type in arb_leave_type(),
        days in arb_leave_days(),
    ) {
        let mut sheet = BalanceSheet::new(casual, medical);
        let before = sheet;
        let mut request = pending(UserId::new(), leave_type, days);

        approve(&mut sheet, &mut request);
        prop_assert!(!sheet.casual.is_negative());
        prop_assert!(!sheet.medical.is_negative());
        prop_assert!(request.ledger_days <= days);

        cancel(&mut sheet, &mut request);
        prop_assert_eq!(sheet, before);
    }

    /// Interleaved approvals and cancellations on distinct requests of one
    /// user end at the starting balance once every approval is cancelled.
    #[test]
    fn prop_interleaved_approve_cancel(
        casual in arb_balance(),
        medical in arb_balance(),
        leaves in prop::collection::vec((arb_leave_type(), arb_leave_days()), 1..8),
        order in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let user_id = UserId::new();
        let mut sheet = BalanceSheet::new(casual, medical);
        let before = sheet;
        let mut requests: Vec<_> = leaves
            .into_iter()
            .map(|(leave_type, days)| pending(user_id, leave_type, days))
            .collect();

        for request in &mut requests {
            approve(&mut sheet, request);
        }
        for index in order {
            let i = index.index(requests.len());
            let request = &mut requests[i];
            if request.status == LeaveStatus::Approved {
                cancel(&mut sheet, request);
            }
        }
        for request in &mut requests {
            if request.status == LeaveStatus::Approved {
                cancel(&mut sheet, request);
            }
        }
        prop_assert_eq!(sheet, before);
    }

    /// Recomputing days_count from its own inputs never changes it.
    #[test]
    fn prop_days_count_is_stable(start in arb_date(), span in 0i64..60, half in any::<bool>()) {
        let end = if half { start } else { start + Duration::days(span) };
        let first = days_count(start, end, half).unwrap();
        let second = days_count(start, end, half).unwrap();
        prop_assert_eq!(first, second);
        if half {
            prop_assert_eq!(first, Days::HALF);
        } else {
            prop_assert_eq!(first, Days::whole(span + 1));
        }
    }

    /// Only pending requests can be approved or rejected.
    #[test]
    fn prop_only_pending_is_decided(
        status in prop_oneof![
            Just(LeaveStatus::Pending),
            Just(LeaveStatus::Approved),
            Just(LeaveStatus::Rejected),
            Just(LeaveStatus::Cancelled),
        ],
        days in arb_leave_days(),
    ) {
        let mut request = pending(UserId::new(), LeaveType::Casual, days);
        request.status = status;
        let decided = LeaveWorkflow::approve(&request).is_ok();
        prop_assert_eq!(decided, status == LeaveStatus::Pending);
        prop_assert_eq!(LeaveWorkflow::reject(&request, None).is_ok(), decided);
    }
}
