//! `SeaORM` Entity for users table.
//!
//! One row per profile. The id is the identity provider's subject.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub designation: Option<String>,
    pub role: UserRole,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub balance_casual: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub balance_medical: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub balance_compoff: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(has_many = "super::leaves::Entity")]
    Leaves,
    #[sea_orm(has_many = "super::group_members::Entity")]
    GroupMembers,
    #[sea_orm(has_many = "super::leave_archives::Entity")]
    LeaveArchives,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::leaves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leaves.def()
    }
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMembers.def()
    }
}

impl Related<super::leave_archives::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveArchives.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
