//! `SeaORM` Entity for comp_off_consumptions table.
//!
//! Records which recipient rows an approved comp-off leave consumed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comp_off_consumptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub leave_id: Uuid,
    pub user_comp_off_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((6, 1)))")]
    pub days: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leaves::Entity",
        from = "Column::LeaveId",
        to = "super::leaves::Column::Id"
    )]
    Leaves,
    #[sea_orm(
        belongs_to = "super::user_comp_offs::Entity",
        from = "Column::UserCompOffId",
        to = "super::user_comp_offs::Column::Id"
    )]
    UserCompOffs,
}

impl Related<super::leaves::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leaves.def()
    }
}

impl Related<super::user_comp_offs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCompOffs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
