//! Dashboard repository for employee and HR summaries.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use leavedesk_shared::types::{Days, OrganizationId, UserId};

use crate::entities::{leaves, sea_orm_active_enums::LeaveStatus, users};

use super::compoff::CompOffRepository;

/// Leaves shown on the employee dashboard.
const RECENT_LEAVES: u64 = 5;
/// Leaves shown on the HR dashboard.
const LATEST_LEAVES: u64 = 20;

/// Error types for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// An employee's own summary.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboard {
    /// Casual balance.
    pub balance_casual: Days,
    /// Medical balance.
    pub balance_medical: Days,
    /// Comp-off balance, recomputed from grants.
    pub balance_comp_off: Days,
    /// Approved requests.
    pub approved_count: u64,
    /// Pending requests.
    pub pending_count: u64,
    /// Latest requests, newest first.
    pub recent_leaves: Vec<leaves::Model>,
}

/// Organization summary for HR.
#[derive(Debug, Clone, Serialize)]
pub struct HrDashboard {
    /// Users in the organization.
    pub total_users: u64,
    /// Approved requests covering today.
    pub on_leave_today: u64,
    /// Pending requests.
    pub pending_requests: u64,
    /// Latest requests, newest first.
    pub latest_leaves: Vec<leaves::Model>,
}

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Summary for one employee.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the profile does not exist
    /// - `Database` if a query fails
    pub async fn employee(&self, user_id: UserId) -> Result<EmployeeDashboard, DashboardError> {
        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(DashboardError::UserNotFound(user_id))?;

        let own = leaves::Entity::find().filter(leaves::Column::UserId.eq(user.id));
        let approved_count = own
            .clone()
            .filter(leaves::Column::Status.eq(LeaveStatus::Approved))
            .count(&self.db)
            .await?;
        let pending_count = own
            .clone()
            .filter(leaves::Column::Status.eq(LeaveStatus::Pending))
            .count(&self.db)
            .await?;
        let recent_leaves = own
            .order_by_desc(leaves::Column::CreatedAt)
            .limit(RECENT_LEAVES)
            .all(&self.db)
            .await?;

        Ok(EmployeeDashboard {
            balance_casual: Days::new(user.balance_casual),
            balance_medical: Days::new(user.balance_medical),
            balance_comp_off: CompOffRepository::available_in(&self.db, user_id).await?,
            approved_count,
            pending_count,
            recent_leaves,
        })
    }

    /// Summary for an organization on `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn hr(
        &self,
        organization_id: OrganizationId,
        today: NaiveDate,
    ) -> Result<HrDashboard, DashboardError> {
        let organization_id = organization_id.into_inner();

        let total_users = users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id))
            .count(&self.db)
            .await?;

        let org_leaves =
            leaves::Entity::find().filter(leaves::Column::OrganizationId.eq(organization_id));
        let on_leave_today = org_leaves
            .clone()
            .filter(leaves::Column::Status.eq(LeaveStatus::Approved))
            .filter(leaves::Column::StartDate.lte(today))
            .filter(leaves::Column::EndDate.gte(today))
            .count(&self.db)
            .await?;
        let pending_requests = org_leaves
            .clone()
            .filter(leaves::Column::Status.eq(LeaveStatus::Pending))
            .filter(leaves::Column::IsArchived.eq(false))
            .count(&self.db)
            .await?;
        let latest_leaves = org_leaves
            .order_by_desc(leaves::Column::CreatedAt)
            .limit(LATEST_LEAVES)
            .all(&self.db)
            .await?;

        Ok(HrDashboard {
            total_users,
            on_leave_today,
            pending_requests,
            latest_leaves,
        })
    }
}
