//! `SeaORM` Entity for leaves table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{HalfDaySlot, LeaveStatus, LeaveType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leaves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub start_date: Date,
    pub end_date: Date,
    pub is_half_day: bool,
    pub half_day_slot: Option<HalfDaySlot>,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub days_count: Decimal,
    /// Days the current approval actually charged.
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub ledger_days: Decimal,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub assigned_group_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTimeWithTimeZone>,
    pub is_archived: bool,
    pub archived_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::AssignedGroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
    #[sea_orm(has_many = "super::comp_off_consumptions::Entity")]
    CompOffConsumptions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::comp_off_consumptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompOffConsumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
