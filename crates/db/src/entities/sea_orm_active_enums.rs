//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Regular employee.
    #[sea_orm(string_value = "USER")]
    User,
    /// Team lead (approver).
    #[sea_orm(string_value = "TEAM_LEAD")]
    TeamLead,
    /// Human resources.
    #[sea_orm(string_value = "HR")]
    Hr,
    /// Organization administrator.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Cross-organization administrator.
    #[sea_orm(string_value = "SUPER_ADMIN")]
    SuperAdmin,
    /// Chief executive.
    #[sea_orm(string_value = "CEO")]
    Ceo,
}

/// `leave_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_type")]
pub enum LeaveType {
    /// Casual leave.
    #[sea_orm(string_value = "CASUAL")]
    Casual,
    /// Medical leave.
    #[sea_orm(string_value = "MEDICAL")]
    Medical,
    /// Comp-off.
    #[sea_orm(string_value = "COMP_OFF")]
    CompOff,
}

/// `leave_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    /// Cancelled.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// `half_day_slot` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "half_day_slot")]
pub enum HalfDaySlot {
    /// First half of the day.
    #[sea_orm(string_value = "MORNING")]
    Morning,
    /// Second half of the day.
    #[sea_orm(string_value = "AFTERNOON")]
    Afternoon,
}

/// `holiday_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "holiday_type")]
pub enum HolidayType {
    /// Office closed for everyone.
    #[sea_orm(string_value = "MANDATORY")]
    Mandatory,
    /// Employees may choose to take it.
    #[sea_orm(string_value = "OPTIONAL")]
    Optional,
    /// Informational.
    #[sea_orm(string_value = "NORMAL")]
    Normal,
}
