//! Repository abstractions for data access.
//!
//! Repositories execute the decisions of `leavedesk-core` against
//! PostgreSQL, hiding the `SeaORM` implementation details from the rest of
//! the application.

pub mod approval;
pub mod archive;
pub mod balance;
pub mod compoff;
pub mod dashboard;
pub mod group;
pub mod holiday;
pub mod leave;
pub mod organization;
pub mod settings;
pub mod settlement;
pub mod user;

pub use approval::{ApprovalRepository, PendingApproval};
pub use archive::{ArchiveEntry, ArchiveRepository};
pub use balance::BalanceRepository;
pub use compoff::{CompOffRepository, GrantRecord, UserGrant};
pub use dashboard::{DashboardError, DashboardRepository, EmployeeDashboard, HrDashboard};
pub use group::{GroupError, GroupRepository};
pub use holiday::{CreateHolidayInput, HolidayError, HolidayRepository, UpdateHolidayInput};
pub use leave::{LeaveFilter, LeaveRepository};
pub use organization::{OrganizationError, OrganizationInput, OrganizationRepository};
pub use settings::{EffectiveSettings, SaveSettingsInput, SettingsError, SettingsRepository};
pub use settlement::{SettlementRepository, SettlementRequest};
pub use user::{RegisterUserInput, UpdateUserInput, UserError, UserRepository};
