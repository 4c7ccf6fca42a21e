//! Leave request lifecycle.
//!
//! This module implements the leave request state machine and the
//! calendar rules that decide how many days a request charges.
//!
//! # Modules
//!
//! - `types` - Leave domain types (LeaveType, LeaveStatus, LeaveTransition)
//! - `error` - Leave-specific error types
//! - `period` - Day counting, rolling date floor, local "today"
//! - `service` - State transition logic

pub mod error;
pub mod period;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LeaveError;
pub use period::{days_count, local_today, rolling_floor};
pub use service::{DEFAULT_REJECTION_REASON, EditOptions, LeaveRemoval, LeaveWorkflow};
pub use types::{
    ApplyLeaveInput, CompOffEffect, DurationMode, HalfDaySlot, LeaveDuration, LeaveRequest,
    LeaveStatus, LeaveTransition, LeaveType, ValidatedLeave,
};
