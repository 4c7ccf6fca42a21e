//! `SeaORM` entity definitions.

pub mod comp_off_consumptions;
pub mod comp_offs;
pub mod group_members;
pub mod groups;
pub mod leave_archives;
pub mod leave_settings;
pub mod leaves;
pub mod organizations;
pub mod public_holidays;
pub mod sea_orm_active_enums;
pub mod user_comp_offs;
pub mod users;
