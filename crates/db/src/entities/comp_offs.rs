//! `SeaORM` Entity for comp_offs table.
//!
//! One row per grant; recipients live in `user_comp_offs`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comp_offs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub work_date: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub days: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_comp_offs::Entity")]
    UserCompOffs,
}

impl Related<super::user_comp_offs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCompOffs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
