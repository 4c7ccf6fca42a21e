//! Leave request domain types.

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_shared::types::{Days, GroupId, LeaveId, OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::{BalanceField, LedgerEffect};

/// Kind of leave being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    /// Casual leave, debited from `balance_casual`.
    Casual,
    /// Medical leave, debited from `balance_medical`.
    Medical,
    /// Comp-off, consumed from comp-off grants.
    CompOff,
}

impl LeaveType {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "CASUAL",
            Self::Medical => "MEDICAL",
            Self::CompOff => "COMP_OFF",
        }
    }

    /// Parses the wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASUAL" => Some(Self::Casual),
            "MEDICAL" => Some(Self::Medical),
            "COMP_OFF" => Some(Self::CompOff),
            _ => None,
        }
    }

    /// The balance column this type debits. Comp-off has none.
    #[must_use]
    pub const fn balance_field(self) -> Option<BalanceField> {
        match self {
            Self::Casual => Some(BalanceField::Casual),
            Self::Medical => Some(BalanceField::Medical),
            Self::CompOff => None,
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a leave request.
///
/// Valid transitions:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Pending | Approved → Cancelled (cancel)
/// - Approved → Pending (edit by owner, or admin edit without keeping approval)
/// - Pending → Pending, Approved → Approved (edit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved; the ledger has been charged.
    Approved,
    /// Rejected.
    Rejected,
    /// Cancelled; any charge has been reversed.
    Cancelled,
}

impl LeaveStatus {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the request may still be edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half of the day a half-day leave covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HalfDaySlot {
    /// First half.
    Morning,
    /// Second half.
    Afternoon,
}

impl HalfDaySlot {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Afternoon => "AFTERNOON",
        }
    }
}

/// Duration mode chosen on the request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationMode {
    /// A single whole day.
    FullDay,
    /// Half of a single day.
    HalfDay,
    /// An inclusive range of days.
    LongLeave,
}

/// Duration of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDuration {
    /// A single whole day.
    FullDay,
    /// Half of a single day.
    HalfDay(HalfDaySlot),
    /// An inclusive range of days.
    LongLeave,
}

impl LeaveDuration {
    /// Returns true for half-day leave.
    #[must_use]
    pub const fn is_half_day(self) -> bool {
        matches!(self, Self::HalfDay(_))
    }

    /// Returns the half-day slot, if any.
    #[must_use]
    pub const fn half_day_slot(self) -> Option<HalfDaySlot> {
        match self {
            Self::HalfDay(slot) => Some(slot),
            Self::FullDay | Self::LongLeave => None,
        }
    }
}

/// Input for applying for (or editing) a leave request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyLeaveInput {
    /// Leave type.
    pub leave_type: LeaveType,
    /// Duration mode.
    pub duration: DurationMode,
    /// Slot, required for half-day leave.
    #[serde(default)]
    pub half_day_slot: Option<HalfDaySlot>,
    /// First day (the only day for full and half day leave).
    pub start_date: NaiveDate,
    /// Last day, required for long leave.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Reason given by the requester.
    pub reason: String,
    /// Approval group; defaults to the requester's first group.
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

/// A request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLeave {
    /// Leave type.
    pub leave_type: LeaveType,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Duration.
    pub duration: LeaveDuration,
    /// Days this request will charge.
    pub days_count: Days,
    /// Trimmed reason.
    pub reason: String,
}

/// Snapshot of a stored leave request, as the workflow sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRequest {
    /// Request id.
    pub id: LeaveId,
    /// Requester.
    pub user_id: UserId,
    /// Requester's organization.
    pub organization_id: OrganizationId,
    /// Leave type.
    pub leave_type: LeaveType,
    /// Current status.
    pub status: LeaveStatus,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Half-day flag.
    pub is_half_day: bool,
    /// Days the request charges when approved.
    pub days_count: Days,
    /// Days actually charged by the current approval (zero unless approved).
    pub ledger_days: Days,
    /// Routing target.
    pub assigned_group_id: Option<GroupId>,
    /// Set once year-end settlement archived the request.
    pub is_archived: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// What a transition does to comp-off grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompOffEffect {
    /// Release everything this request consumed.
    pub release: bool,
    /// Consume this many days, oldest grant first (after any release).
    pub consume: Days,
}

impl CompOffEffect {
    /// No comp-off effect.
    pub const NONE: Self = Self {
        release: false,
        consume: Days::ZERO,
    };

    /// Returns true if nothing needs to happen.
    #[must_use]
    pub fn is_none(&self) -> bool {
        !self.release && self.consume.is_zero()
    }
}

/// A validated state transition and the side effects it requires.
///
/// The repository executes the ledger effects (in order), then the comp-off
/// effect, then writes the status. Nothing is recomputed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveTransition {
    /// Status after the transition.
    pub new_status: LeaveStatus,
    /// Balance mutations, credits before debits.
    pub ledger: Vec<LedgerEffect>,
    /// Comp-off grant mutation.
    pub comp_off: CompOffEffect,
    /// Stored rejection reason, for rejections.
    pub rejection_reason: Option<String>,
}

impl LeaveTransition {
    /// Returns true if the transition touches neither balances nor grants.
    #[must_use]
    pub fn is_ledger_neutral(&self) -> bool {
        self.ledger.is_empty() && self.comp_off.is_none()
    }
}
