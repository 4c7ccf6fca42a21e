use super::*;
use chrono::Utc;
use leavedesk_shared::types::{GroupId, LeaveId, OrganizationId, UserId};
use rust_decimal_macros::dec;

use crate::access::Role;
use crate::balance::BalanceField;
use crate::leave::types::HalfDaySlot;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2025, 3, 15)
}

fn input(leave_type: LeaveType, duration: DurationMode) -> ApplyLeaveInput {
    ApplyLeaveInput {
        leave_type,
        duration,
        half_day_slot: None,
        start_date: date(2025, 3, 17),
        end_date: None,
        reason: "family event".to_string(),
        group_id: None,
    }
}

fn request(status: LeaveStatus, leave_type: LeaveType, days: Days) -> LeaveRequest {
    LeaveRequest {
        id: LeaveId::new(),
        user_id: UserId::new(),
        organization_id: OrganizationId::new(),
        leave_type,
        status,
        start_date: date(2025, 3, 17),
        end_date: date(2025, 3, 21),
        is_half_day: false,
        days_count: days,
        ledger_days: if status == LeaveStatus::Approved {
            days
        } else {
            Days::ZERO
        },
        assigned_group_id: Some(GroupId::new()),
        is_archived: false,
        created_at: Utc::now(),
    }
}

fn owner_of(request: &LeaveRequest) -> Actor {
    Actor {
        user_id: request.user_id,
        organization_id: request.organization_id,
        role: Role::User,
    }
}

fn admin_of(request: &LeaveRequest) -> Actor {
    Actor {
        user_id: UserId::new(),
        organization_id: request.organization_id,
        role: Role::Admin,
    }
}

// =========================================================================
// validate
// =========================================================================

#[test]
fn test_validate_full_day() {
    let validated =
        LeaveWorkflow::validate(&input(LeaveType::Casual, DurationMode::FullDay), today(), Days::ZERO)
            .unwrap();
    assert_eq!(validated.days_count, Days::ONE);
    assert_eq!(validated.end_date, validated.start_date);
    assert_eq!(validated.duration, LeaveDuration::FullDay);
}

#[test]
fn test_validate_half_day_requires_slot() {
    let mut form = input(LeaveType::Medical, DurationMode::HalfDay);
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::HalfDaySlotRequired)
    ));

    form.half_day_slot = Some(HalfDaySlot::Morning);
    let validated = LeaveWorkflow::validate(&form, today(), Days::ZERO).unwrap();
    assert_eq!(validated.days_count, Days::HALF);
    assert_eq!(validated.duration.half_day_slot(), Some(HalfDaySlot::Morning));
}

#[test]
fn test_validate_long_leave() {
    let mut form = input(LeaveType::Casual, DurationMode::LongLeave);
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::EndDateRequired)
    ));

    form.end_date = Some(date(2025, 3, 21));
    let validated = LeaveWorkflow::validate(&form, today(), Days::ZERO).unwrap();
    assert_eq!(validated.days_count, Days::whole(5));

    form.end_date = Some(date(2025, 3, 16));
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::EndBeforeStart { .. })
    ));
}

#[test]
fn test_validate_full_day_with_different_end_fails() {
    let mut form = input(LeaveType::Casual, DurationMode::FullDay);
    form.end_date = Some(date(2025, 3, 18));
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::SingleDayRequired { .. })
    ));
}

#[test]
fn test_validate_reason_required() {
    let mut form = input(LeaveType::Casual, DurationMode::FullDay);
    form.reason = "   ".to_string();
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::ReasonRequired)
    ));
}

#[test]
fn test_validate_rolling_floor() {
    let mut form = input(LeaveType::Casual, DurationMode::FullDay);
    form.start_date = date(2025, 2, 15);
    assert!(LeaveWorkflow::validate(&form, today(), Days::ZERO).is_ok());

    form.start_date = date(2025, 2, 14);
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::DateBeforeFloor { .. })
    ));
}

#[test]
fn test_validate_comp_off_without_balance_scenario_d() {
    let form = input(LeaveType::CompOff, DurationMode::FullDay);
    assert!(matches!(
        LeaveWorkflow::validate(&form, today(), Days::ZERO),
        Err(LeaveError::InsufficientCompOff { .. })
    ));
    assert!(LeaveWorkflow::validate(&form, today(), Days::HALF).is_ok());
}

// =========================================================================
// approve / reject
// =========================================================================

#[test]
fn test_approve_casual_debits_stored_days() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::whole(5));
    let transition = LeaveWorkflow::approve(&leave).unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Approved);
    assert_eq!(
        transition.ledger,
        vec![LedgerEffect::Debit {
            field: BalanceField::Casual,
            days: Days::whole(5)
        }]
    );
    assert!(transition.comp_off.is_none());
}

#[test]
fn test_approve_comp_off_consumes_grants() {
    let leave = request(LeaveStatus::Pending, LeaveType::CompOff, Days::ONE);
    let transition = LeaveWorkflow::approve(&leave).unwrap();
    assert!(transition.ledger.is_empty());
    assert_eq!(transition.comp_off.consume, Days::ONE);
    assert!(!transition.comp_off.release);
}

#[test]
fn test_approve_non_pending_fails() {
    for status in [
        LeaveStatus::Approved,
        LeaveStatus::Rejected,
        LeaveStatus::Cancelled,
    ] {
        let leave = request(status, LeaveType::Casual, Days::ONE);
        assert!(matches!(
            LeaveWorkflow::approve(&leave),
            Err(LeaveError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn test_archived_blocks_every_transition() {
    let mut leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::ONE);
    leave.is_archived = true;
    let owner = owner_of(&leave);
    let admin = admin_of(&leave);
    let updated =
        LeaveWorkflow::validate(&input(LeaveType::Casual, DurationMode::FullDay), today(), Days::ZERO)
            .unwrap();

    assert!(matches!(LeaveWorkflow::approve(&leave), Err(LeaveError::Archived)));
    assert!(matches!(LeaveWorkflow::reject(&leave, None), Err(LeaveError::Archived)));
    assert!(matches!(LeaveWorkflow::cancel(&owner, &leave), Err(LeaveError::Archived)));
    assert!(matches!(
        LeaveWorkflow::edit(&owner, &leave, &updated, EditOptions::default()),
        Err(LeaveError::Archived)
    ));
    assert!(matches!(LeaveWorkflow::delete(&admin, &leave), Err(LeaveError::Archived)));
}

#[test]
fn test_reject_default_reason() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::ONE);
    let transition = LeaveWorkflow::reject(&leave, Some("  ")).unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Rejected);
    assert_eq!(
        transition.rejection_reason.as_deref(),
        Some(DEFAULT_REJECTION_REASON)
    );
    assert!(transition.is_ledger_neutral());

    let transition = LeaveWorkflow::reject(&leave, Some("team offsite")).unwrap();
    assert_eq!(transition.rejection_reason.as_deref(), Some("team offsite"));
}

// =========================================================================
// cancel
// =========================================================================

#[test]
fn test_cancel_pending_has_no_effect() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::whole(3));
    let transition = LeaveWorkflow::cancel(&owner_of(&leave), &leave).unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Cancelled);
    assert!(transition.is_ledger_neutral());
}

#[test]
fn test_cancel_approved_credits_recorded_debit() {
    let mut leave = request(LeaveStatus::Approved, LeaveType::Casual, Days::whole(5));
    leave.ledger_days = Days::whole(2);
    let transition = LeaveWorkflow::cancel(&owner_of(&leave), &leave).unwrap();
    assert_eq!(
        transition.ledger,
        vec![LedgerEffect::Credit {
            field: BalanceField::Casual,
            days: Days::whole(2)
        }]
    );
}

#[test]
fn test_cancel_approved_comp_off_releases() {
    let leave = request(LeaveStatus::Approved, LeaveType::CompOff, Days::ONE);
    let transition = LeaveWorkflow::cancel(&owner_of(&leave), &leave).unwrap();
    assert!(transition.comp_off.release);
    assert!(transition.ledger.is_empty());
}

#[test]
fn test_cancel_by_stranger_fails() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::ONE);
    let stranger = Actor {
        user_id: UserId::new(),
        organization_id: leave.organization_id,
        role: Role::TeamLead,
    };
    assert!(matches!(
        LeaveWorkflow::cancel(&stranger, &leave),
        Err(LeaveError::NotOwner)
    ));
    assert!(LeaveWorkflow::cancel(&admin_of(&leave), &leave).is_ok());
}

#[test]
fn test_cancel_terminal_fails() {
    let leave = request(LeaveStatus::Rejected, LeaveType::Casual, Days::ONE);
    assert!(matches!(
        LeaveWorkflow::cancel(&owner_of(&leave), &leave),
        Err(LeaveError::InvalidTransition { .. })
    ));
}

// =========================================================================
// edit
// =========================================================================

#[test]
fn test_owner_edit_of_approved_reverts_to_pending() {
    let leave = request(LeaveStatus::Approved, LeaveType::Casual, Days::whole(5));
    let updated = LeaveWorkflow::validate(
        &input(LeaveType::Medical, DurationMode::FullDay),
        today(),
        Days::ZERO,
    )
    .unwrap();

    let transition =
        LeaveWorkflow::edit(&owner_of(&leave), &leave, &updated, EditOptions::default()).unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Pending);
    assert_eq!(
        transition.ledger,
        vec![LedgerEffect::Credit {
            field: BalanceField::Casual,
            days: Days::whole(5)
        }]
    );
}

#[test]
fn test_owner_cannot_keep_approved() {
    let leave = request(LeaveStatus::Approved, LeaveType::Casual, Days::whole(5));
    let updated =
        LeaveWorkflow::validate(&input(LeaveType::Casual, DurationMode::FullDay), today(), Days::ZERO)
            .unwrap();
    assert!(matches!(
        LeaveWorkflow::edit(
            &owner_of(&leave),
            &leave,
            &updated,
            EditOptions {
                keep_approved: true
            }
        ),
        Err(LeaveError::NotPermitted(_))
    ));
}

#[test]
fn test_admin_edit_keeping_approval_credits_old_and_debits_new() {
    let leave = request(LeaveStatus::Approved, LeaveType::Casual, Days::whole(5));
    let mut form = input(LeaveType::Medical, DurationMode::HalfDay);
    form.half_day_slot = Some(HalfDaySlot::Afternoon);
    let updated = LeaveWorkflow::validate(&form, today(), Days::ZERO).unwrap();

    let transition = LeaveWorkflow::edit(
        &admin_of(&leave),
        &leave,
        &updated,
        EditOptions {
            keep_approved: true,
        },
    )
    .unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Approved);
    assert_eq!(
        transition.ledger,
        vec![
            LedgerEffect::Credit {
                field: BalanceField::Casual,
                days: Days::whole(5)
            },
            LedgerEffect::Debit {
                field: BalanceField::Medical,
                days: Days::new(dec!(0.5))
            },
        ]
    );
}

#[test]
fn test_admin_edit_from_comp_off_to_comp_off() {
    let leave = request(LeaveStatus::Approved, LeaveType::CompOff, Days::ONE);
    let mut form = input(LeaveType::CompOff, DurationMode::LongLeave);
    form.end_date = Some(date(2025, 3, 18));
    let updated = LeaveWorkflow::validate(&form, today(), Days::ONE).unwrap();

    let transition = LeaveWorkflow::edit(
        &admin_of(&leave),
        &leave,
        &updated,
        EditOptions {
            keep_approved: true,
        },
    )
    .unwrap();
    assert!(transition.ledger.is_empty());
    assert!(transition.comp_off.release);
    assert_eq!(transition.comp_off.consume, Days::whole(2));
}

#[test]
fn test_pending_edit_has_no_effect() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::whole(5));
    let updated =
        LeaveWorkflow::validate(&input(LeaveType::Casual, DurationMode::FullDay), today(), Days::ZERO)
            .unwrap();
    let transition =
        LeaveWorkflow::edit(&owner_of(&leave), &leave, &updated, EditOptions::default()).unwrap();
    assert_eq!(transition.new_status, LeaveStatus::Pending);
    assert!(transition.is_ledger_neutral());
}

#[test]
fn test_edit_cancelled_fails() {
    let leave = request(LeaveStatus::Cancelled, LeaveType::Casual, Days::ONE);
    let updated =
        LeaveWorkflow::validate(&input(LeaveType::Casual, DurationMode::FullDay), today(), Days::ZERO)
            .unwrap();
    assert!(matches!(
        LeaveWorkflow::edit(&owner_of(&leave), &leave, &updated, EditOptions::default()),
        Err(LeaveError::InvalidTransition { .. })
    ));
}

// =========================================================================
// delete
// =========================================================================

#[test]
fn test_delete_requires_admin() {
    let leave = request(LeaveStatus::Approved, LeaveType::Casual, Days::whole(2));
    assert!(matches!(
        LeaveWorkflow::delete(&owner_of(&leave), &leave),
        Err(LeaveError::NotPermitted(_))
    ));

    let removal = LeaveWorkflow::delete(&admin_of(&leave), &leave).unwrap();
    assert_eq!(
        removal.ledger,
        vec![LedgerEffect::Credit {
            field: BalanceField::Casual,
            days: Days::whole(2)
        }]
    );
}

#[test]
fn test_delete_pending_has_no_effect() {
    let leave = request(LeaveStatus::Pending, LeaveType::Casual, Days::whole(2));
    let removal = LeaveWorkflow::delete(&admin_of(&leave), &leave).unwrap();
    assert!(removal.ledger.is_empty());
    assert!(removal.comp_off.is_none());
}

#[test]
fn test_is_valid_transition() {
    assert!(LeaveWorkflow::is_valid_transition(
        LeaveStatus::Pending,
        LeaveStatus::Approved
    ));
    assert!(LeaveWorkflow::is_valid_transition(
        LeaveStatus::Approved,
        LeaveStatus::Cancelled
    ));
    assert!(!LeaveWorkflow::is_valid_transition(
        LeaveStatus::Rejected,
        LeaveStatus::Pending
    ));
    assert!(!LeaveWorkflow::is_valid_transition(
        LeaveStatus::Approved,
        LeaveStatus::Rejected
    ));
}
