//! Conversions between stored rows and core domain types.

use leavedesk_core::access::Role;
use leavedesk_core::identity::Profile;
use leavedesk_core::leave::{HalfDaySlot, LeaveRequest, LeaveStatus, LeaveType};
use leavedesk_shared::types::{Days, GroupId, LeaveId, OrganizationId, UserId};

use crate::entities::{leaves, sea_orm_active_enums as db, users};

impl From<db::UserRole> for Role {
    fn from(role: db::UserRole) -> Self {
        match role {
            db::UserRole::User => Self::User,
            db::UserRole::TeamLead => Self::TeamLead,
            db::UserRole::Hr => Self::Hr,
            db::UserRole::Admin => Self::Admin,
            db::UserRole::SuperAdmin => Self::SuperAdmin,
            db::UserRole::Ceo => Self::Ceo,
        }
    }
}

impl From<Role> for db::UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::TeamLead => Self::TeamLead,
            Role::Hr => Self::Hr,
            Role::Admin => Self::Admin,
            Role::SuperAdmin => Self::SuperAdmin,
            Role::Ceo => Self::Ceo,
        }
    }
}

impl From<db::LeaveType> for LeaveType {
    fn from(leave_type: db::LeaveType) -> Self {
        match leave_type {
            db::LeaveType::Casual => Self::Casual,
            db::LeaveType::Medical => Self::Medical,
            db::LeaveType::CompOff => Self::CompOff,
        }
    }
}

impl From<LeaveType> for db::LeaveType {
    fn from(leave_type: LeaveType) -> Self {
        match leave_type {
            LeaveType::Casual => Self::Casual,
            LeaveType::Medical => Self::Medical,
            LeaveType::CompOff => Self::CompOff,
        }
    }
}

impl From<db::LeaveStatus> for LeaveStatus {
    fn from(status: db::LeaveStatus) -> Self {
        match status {
            db::LeaveStatus::Pending => Self::Pending,
            db::LeaveStatus::Approved => Self::Approved,
            db::LeaveStatus::Rejected => Self::Rejected,
            db::LeaveStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<LeaveStatus> for db::LeaveStatus {
    fn from(status: LeaveStatus) -> Self {
        match status {
            LeaveStatus::Pending => Self::Pending,
            LeaveStatus::Approved => Self::Approved,
            LeaveStatus::Rejected => Self::Rejected,
            LeaveStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<HalfDaySlot> for db::HalfDaySlot {
    fn from(slot: HalfDaySlot) -> Self {
        match slot {
            HalfDaySlot::Morning => Self::Morning,
            HalfDaySlot::Afternoon => Self::Afternoon,
        }
    }
}

/// Builds the workflow's view of a stored leave row.
#[must_use]
pub fn leave_request(model: &leaves::Model) -> LeaveRequest {
    LeaveRequest {
        id: LeaveId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        leave_type: model.leave_type.into(),
        status: model.status.into(),
        start_date: model.start_date,
        end_date: model.end_date,
        is_half_day: model.is_half_day,
        days_count: Days::new(model.days_count),
        ledger_days: Days::new(model.ledger_days),
        assigned_group_id: model.assigned_group_id.map(GroupId::from_uuid),
        is_archived: model.is_archived,
        created_at: model.created_at.to_utc(),
    }
}

/// Builds the identity profile of a stored user row.
#[must_use]
pub fn profile(model: &users::Model) -> Profile {
    Profile {
        user_id: UserId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        role: model.role.into(),
        email: model.email.clone(),
        full_name: model.full_name.clone(),
    }
}
