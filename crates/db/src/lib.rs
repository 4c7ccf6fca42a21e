//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Conversions between rows and core domain types
//! - Repositories that run each leave transition in one transaction
//! - Database migrations

pub mod convert;
pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    ApprovalRepository, ArchiveEntry, ArchiveRepository, BalanceRepository, CompOffRepository,
    CreateHolidayInput, DashboardError, DashboardRepository, EffectiveSettings,
    EmployeeDashboard, GrantRecord, GroupError, GroupRepository, HolidayError, HolidayRepository,
    HrDashboard, LeaveFilter, LeaveRepository, OrganizationError, OrganizationInput,
    OrganizationRepository, PendingApproval, RegisterUserInput, SaveSettingsInput, SettingsError,
    SettingsRepository, SettlementRepository, SettlementRequest, UpdateHolidayInput,
    UpdateUserInput, UserError, UserGrant, UserRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection with explicit pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_pooled(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
