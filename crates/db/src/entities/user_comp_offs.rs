//! `SeaORM` Entity for user_comp_offs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_comp_offs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub comp_off_id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub consumed_days: Decimal,
    pub is_consumed: bool,
    /// Set when year-end settlement forfeited the unconsumed remainder.
    pub forfeited_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::comp_offs::Entity",
        from = "Column::CompOffId",
        to = "super::comp_offs::Column::Id"
    )]
    CompOffs,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::comp_off_consumptions::Entity")]
    CompOffConsumptions,
}

impl Related<super::comp_offs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompOffs.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::comp_off_consumptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompOffConsumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
