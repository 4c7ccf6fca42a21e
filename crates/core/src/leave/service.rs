//! Leave workflow service.
//!
//! Validates requests and transitions and decides their ledger side effects.
//! The repository layer executes a [`LeaveTransition`] exactly as returned.

use chrono::NaiveDate;
use leavedesk_shared::types::Days;

use crate::access::{Actor, Capability};
use crate::balance::LedgerEffect;
use crate::leave::error::LeaveError;
use crate::leave::period::{check_floor, days_count};
use crate::leave::types::{
    ApplyLeaveInput, CompOffEffect, DurationMode, LeaveDuration, LeaveRequest, LeaveStatus,
    LeaveTransition, LeaveType, ValidatedLeave,
};

/// Stored reason when an approver rejects without giving one.
pub const DEFAULT_REJECTION_REASON: &str = "Rejected by approver";

/// Side effects of hard-deleting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRemoval {
    /// Credits reversing an approval.
    pub ledger: Vec<LedgerEffect>,
    /// Comp-off release reversing an approval.
    pub comp_off: CompOffEffect,
}

/// Options for editing a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Keep an approved request approved (administrators only).
    pub keep_approved: bool,
}

/// Stateless service for leave request transitions.
pub struct LeaveWorkflow;

impl LeaveWorkflow {
    /// Validates an application (or the new content of an edit).
    ///
    /// # Arguments
    /// * `input` - The submitted form
    /// * `today` - Today's date in the organization's timezone
    /// * `comp_off_available` - Available comp-off days (only read for
    ///   `COMP_OFF` requests)
    ///
    /// # Errors
    ///
    /// Returns a validation error and creates nothing if any rule fails.
    pub fn validate(
        input: &ApplyLeaveInput,
        today: NaiveDate,
        comp_off_available: Days,
    ) -> Result<ValidatedLeave, LeaveError> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(LeaveError::ReasonRequired);
        }

        let duration = match input.duration {
            DurationMode::FullDay => LeaveDuration::FullDay,
            DurationMode::HalfDay => LeaveDuration::HalfDay(
                input
                    .half_day_slot
                    .ok_or(LeaveError::HalfDaySlotRequired)?,
            ),
            DurationMode::LongLeave => LeaveDuration::LongLeave,
        };

        let start_date = input.start_date;
        let end_date = match duration {
            LeaveDuration::LongLeave => input.end_date.ok_or(LeaveError::EndDateRequired)?,
            LeaveDuration::FullDay | LeaveDuration::HalfDay(_) => match input.end_date {
                Some(end) if end != start_date => {
                    return Err(LeaveError::SingleDayRequired {
                        start: start_date,
                        end,
                    });
                }
                _ => start_date,
            },
        };

        let days_count = days_count(start_date, end_date, duration.is_half_day())?;
        check_floor(start_date, end_date, today)?;

        if input.leave_type == LeaveType::CompOff && !comp_off_available.is_positive() {
            return Err(LeaveError::InsufficientCompOff {
                available: comp_off_available,
            });
        }

        Ok(ValidatedLeave {
            leave_type: input.leave_type,
            start_date,
            end_date,
            duration,
            days_count,
            reason: reason.to_string(),
        })
    }

    /// Approve a pending request.
    ///
    /// Trusts the stored `days_count`; nothing is recomputed.
    ///
    /// # Errors
    ///
    /// - `Archived` if the request was archived
    /// - `InvalidTransition` if the request is not pending
    pub fn approve(request: &LeaveRequest) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_live(request)?;
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Approved,
            });
        }

        let (ledger, comp_off) = charge(request.leave_type, request.days_count);
        Ok(LeaveTransition {
            new_status: LeaveStatus::Approved,
            ledger,
            comp_off,
            rejection_reason: None,
        })
    }

    /// Reject a pending request.
    ///
    /// An empty or missing reason is stored as [`DEFAULT_REJECTION_REASON`].
    ///
    /// # Errors
    ///
    /// - `Archived` if the request was archived
    /// - `InvalidTransition` if the request is not pending
    pub fn reject(
        request: &LeaveRequest,
        reason: Option<&str>,
    ) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_live(request)?;
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Rejected,
            });
        }

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON);

        Ok(LeaveTransition {
            new_status: LeaveStatus::Rejected,
            ledger: Vec::new(),
            comp_off: CompOffEffect::NONE,
            rejection_reason: Some(reason.to_string()),
        })
    }

    /// Cancel a pending or approved request.
    ///
    /// Cancelling an approved request credits back exactly what its approval
    /// debited.
    ///
    /// # Errors
    ///
    /// - `Archived` if the request was archived
    /// - `NotOwner` if the actor is neither requester nor administrator
    /// - `InvalidTransition` if the request is rejected or cancelled
    pub fn cancel(actor: &Actor, request: &LeaveRequest) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_live(request)?;
        Self::ensure_owner_or_admin(actor, request)?;

        let (ledger, comp_off) = match request.status {
            LeaveStatus::Pending => (Vec::new(), CompOffEffect::NONE),
            LeaveStatus::Approved => reversal(request),
            LeaveStatus::Rejected | LeaveStatus::Cancelled => {
                return Err(LeaveError::InvalidTransition {
                    from: request.status,
                    to: LeaveStatus::Cancelled,
                });
            }
        };

        Ok(LeaveTransition {
            new_status: LeaveStatus::Cancelled,
            ledger,
            comp_off,
            rejection_reason: None,
        })
    }

    /// Edit a pending or approved request in place.
    ///
    /// - Pending stays pending, no ledger effect.
    /// - Approved goes back to pending and the old charge is reversed,
    ///   unless an administrator keeps it approved, in which case the old
    ///   charge is reversed and the new one charged (two independent steps,
    ///   each with its own zero floor).
    ///
    /// `updated` must come from [`LeaveWorkflow::validate`].
    ///
    /// # Errors
    ///
    /// - `Archived` if the request was archived
    /// - `NotOwner` if the actor is neither requester nor administrator
    /// - `NotPermitted` if a non-administrator asks to keep approval
    /// - `InvalidTransition` if the request is rejected or cancelled
    pub fn edit(
        actor: &Actor,
        request: &LeaveRequest,
        updated: &ValidatedLeave,
        options: EditOptions,
    ) -> Result<LeaveTransition, LeaveError> {
        Self::ensure_live(request)?;
        Self::ensure_owner_or_admin(actor, request)?;
        if !request.status.is_editable() {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Pending,
            });
        }
        if options.keep_approved {
            actor.require(Capability::ManageOrg)?;
        }

        let transition = match request.status {
            LeaveStatus::Approved if options.keep_approved => {
                let (mut ledger, mut comp_off) = reversal(request);
                let (charge_ledger, charge_comp_off) = charge(updated.leave_type, updated.days_count);
                ledger.extend(charge_ledger);
                comp_off.consume = charge_comp_off.consume;
                LeaveTransition {
                    new_status: LeaveStatus::Approved,
                    ledger,
                    comp_off,
                    rejection_reason: None,
                }
            }
            LeaveStatus::Approved => {
                let (ledger, comp_off) = reversal(request);
                LeaveTransition {
                    new_status: LeaveStatus::Pending,
                    ledger,
                    comp_off,
                    rejection_reason: None,
                }
            }
            _ => LeaveTransition {
                new_status: LeaveStatus::Pending,
                ledger: Vec::new(),
                comp_off: CompOffEffect::NONE,
                rejection_reason: None,
            },
        };

        Ok(transition)
    }

    /// Hard-delete a request (administrators only).
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `Archived` if the request was archived
    pub fn delete(actor: &Actor, request: &LeaveRequest) -> Result<LeaveRemoval, LeaveError> {
        actor.require_in(Capability::ManageOrg, request.organization_id)?;
        Self::ensure_live(request)?;

        let (ledger, comp_off) = if request.status == LeaveStatus::Approved {
            reversal(request)
        } else {
            (Vec::new(), CompOffEffect::NONE)
        };
        Ok(LeaveRemoval { ledger, comp_off })
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: LeaveStatus, to: LeaveStatus) -> bool {
        matches!(
            (from, to),
            (
                LeaveStatus::Pending,
                LeaveStatus::Pending
                    | LeaveStatus::Approved
                    | LeaveStatus::Rejected
                    | LeaveStatus::Cancelled
            ) | (
                LeaveStatus::Approved,
                LeaveStatus::Approved | LeaveStatus::Pending | LeaveStatus::Cancelled
            )
        )
    }

    fn ensure_live(request: &LeaveRequest) -> Result<(), LeaveError> {
        if request.is_archived {
            Err(LeaveError::Archived)
        } else {
            Ok(())
        }
    }

    fn ensure_owner_or_admin(actor: &Actor, request: &LeaveRequest) -> Result<(), LeaveError> {
        if actor.user_id == request.user_id {
            return Ok(());
        }
        if actor.can(Capability::ManageOrg) && actor.can_access_organization(request.organization_id)
        {
            return Ok(());
        }
        Err(LeaveError::NotOwner)
    }
}

/// Effects charging `days` of `leave_type`.
fn charge(leave_type: LeaveType, days: Days) -> (Vec<LedgerEffect>, CompOffEffect) {
    match leave_type.balance_field() {
        Some(field) => (vec![LedgerEffect::Debit { field, days }], CompOffEffect::NONE),
        None => (
            Vec::new(),
            CompOffEffect {
                release: false,
                consume: days,
            },
        ),
    }
}

/// Effects undoing the current approval of `request`.
fn reversal(request: &LeaveRequest) -> (Vec<LedgerEffect>, CompOffEffect) {
    match request.leave_type.balance_field() {
        Some(field) if request.ledger_days.is_positive() => (
            vec![LedgerEffect::Credit {
                field,
                days: request.ledger_days,
            }],
            CompOffEffect::NONE,
        ),
        Some(_) => (Vec::new(), CompOffEffect::NONE),
        None => (
            Vec::new(),
            CompOffEffect {
                release: true,
                consume: Days::ZERO,
            },
        ),
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
