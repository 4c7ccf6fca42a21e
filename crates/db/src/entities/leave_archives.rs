//! `SeaORM` Entity for leave_archives table.
//!
//! One row per (user, organization, year), written by year-end settlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_archives")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub year: i32,
    pub total_requests: i32,
    pub approved_count: i32,
    pub pending_count: i32,
    pub rejected_count: i32,
    pub cancelled_count: i32,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub casual_taken: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub medical_taken: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub comp_off_taken: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub closing_casual: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub closing_medical: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub closing_comp_off: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub carried_forward_casual: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub forfeited_comp_off: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub new_casual: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub new_medical: Decimal,
    pub archived_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
