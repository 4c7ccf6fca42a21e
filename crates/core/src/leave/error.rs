//! Leave workflow error types.

use chrono::NaiveDate;
use leavedesk_shared::error::ErrorKind;
use leavedesk_shared::types::{Days, LeaveId};
use thiserror::Error;

use crate::access::AccessDenied;
use crate::leave::types::LeaveStatus;

/// Errors that can occur while applying for or transitioning a leave request.
#[derive(Debug, Error)]
pub enum LeaveError {
    /// Reason was empty.
    #[error("A reason is required")]
    ReasonRequired,

    /// Half-day leave without a slot.
    #[error("Select a morning or afternoon slot for half day leave")]
    HalfDaySlotRequired,

    /// Long leave without an end date.
    #[error("An end date is required for long leave")]
    EndDateRequired,

    /// End date earlier than start date.
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Full or half day leave covering more than one date.
    #[error("Full and half day leave must start and end on the same date ({start} to {end})")]
    SingleDayRequired {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Date older than one month before today.
    #[error("Date {date} is older than {floor}")]
    DateBeforeFloor {
        /// Offending date.
        date: NaiveDate,
        /// Oldest allowed date.
        floor: NaiveDate,
    },

    /// Comp-off requested without an available grant.
    #[error("No comp-off balance available (available: {available})")]
    InsufficientCompOff {
        /// Available comp-off days.
        available: Days,
    },

    /// No approval group could be resolved for the requester.
    #[error("No approval group available; join a group or choose one")]
    GroupUnresolvable,

    /// Transition not allowed from the current status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: LeaveStatus,
        /// Attempted status.
        to: LeaveStatus,
    },

    /// Request was archived by year-end settlement.
    #[error("Leave request has been archived and can no longer change")]
    Archived,

    /// Caller neither owns the request nor manages the organization.
    #[error("Only the requester or an administrator may change this request")]
    NotOwner,

    /// Caller may not act on this request.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Request not found (or not visible to the caller).
    #[error("Leave request {0} not found")]
    NotFound(LeaveId),

    /// The row changed between read and write.
    #[error("Leave request {0} was modified concurrently; retry")]
    ConcurrentModification(LeaveId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LeaveError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ReasonRequired
            | Self::HalfDaySlotRequired
            | Self::EndDateRequired
            | Self::EndBeforeStart { .. }
            | Self::SingleDayRequired { .. }
            | Self::DateBeforeFloor { .. }
            | Self::InsufficientCompOff { .. }
            | Self::GroupUnresolvable
            | Self::InvalidTransition { .. } => 400,

            Self::NotOwner | Self::NotPermitted(_) => 403,

            Self::NotFound(_) => 404,

            Self::Archived | Self::ConcurrentModification(_) => 409,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::HalfDaySlotRequired => "HALF_DAY_SLOT_REQUIRED",
            Self::EndDateRequired => "END_DATE_REQUIRED",
            Self::EndBeforeStart { .. } => "END_BEFORE_START",
            Self::SingleDayRequired { .. } => "SINGLE_DAY_REQUIRED",
            Self::DateBeforeFloor { .. } => "DATE_TOO_OLD",
            Self::InsufficientCompOff { .. } => "INSUFFICIENT_COMP_OFF",
            Self::GroupUnresolvable => "GROUP_UNRESOLVABLE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Archived => "LEAVE_ARCHIVED",
            Self::NotOwner => "NOT_OWNER",
            Self::NotPermitted(_) => "FORBIDDEN",
            Self::NotFound(_) => "LEAVE_NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner | Self::NotPermitted(_) => ErrorKind::Access,
            Self::Archived | Self::ConcurrentModification(_) => ErrorKind::Consistency,
            Self::Database(_) => ErrorKind::DataStore,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Capability, Role};

    #[test]
    fn test_validation_errors() {
        let err = LeaveError::DateBeforeFloor {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            floor: NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "DATE_TOO_OLD");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("2025-02-15"));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = LeaveError::InvalidTransition {
            from: LeaveStatus::Rejected,
            to: LeaveStatus::Approved,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("REJECTED"));
    }

    #[test]
    fn test_archived_is_consistency_error() {
        let err = LeaveError::Archived;
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_access_errors() {
        let err = LeaveError::from(AccessDenied {
            role: Role::User,
            capability: Capability::Approve,
        });
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.kind(), ErrorKind::Access);
        assert_eq!(LeaveError::NotOwner.error_code(), "NOT_OWNER");
    }

    #[test]
    fn test_database_error() {
        let err = LeaveError::Database("connection reset".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), ErrorKind::DataStore);
    }
}
