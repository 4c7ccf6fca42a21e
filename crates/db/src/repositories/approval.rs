//! Approval queue queries.
//!
//! The SQL filter mirrors [`ApprovalQueue::can_act_on`].
//!
//! [`ApprovalQueue::can_act_on`]: leavedesk_core::routing::ApprovalQueue::can_act_on

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;

use leavedesk_core::access::{Actor, ApprovalScope};
use leavedesk_shared::config::ApprovalVisibility;
use leavedesk_shared::types::GroupId;

use crate::entities::{leaves, sea_orm_active_enums::LeaveStatus, users};

use super::leave::memberships_in;

/// A pending request with its requester.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    /// The request.
    #[serde(flatten)]
    pub leave: leaves::Model,
    /// Requester's name.
    pub requester_name: Option<String>,
    /// Requester's email.
    pub requester_email: Option<String>,
}

/// Approval queue repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Groups the user belongs to, oldest membership first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn memberships(&self, actor: &Actor) -> Result<Vec<GroupId>, DbErr> {
        memberships_in(&self.db, actor.user_id).await
    }

    /// Pending requests the actor may act on, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for(
        &self,
        actor: &Actor,
        visibility: ApprovalVisibility,
    ) -> Result<Vec<PendingApproval>, DbErr> {
        let base = Condition::all()
            .add(leaves::Column::Status.eq(LeaveStatus::Pending))
            .add(leaves::Column::IsArchived.eq(false));

        let condition = match actor.role.approval_scope() {
            ApprovalScope::All => match visibility {
                ApprovalVisibility::Global => base,
                ApprovalVisibility::Organization => base.add(
                    leaves::Column::OrganizationId.eq(actor.organization_id.into_inner()),
                ),
            },
            ApprovalScope::Groups => {
                let groups = self.memberships(actor).await?;
                if groups.is_empty() {
                    return Ok(Vec::new());
                }
                base.add(
                    leaves::Column::AssignedGroupId
                        .is_in(groups.into_iter().map(GroupId::into_inner)),
                )
            }
            ApprovalScope::None => return Ok(Vec::new()),
        };

        let rows = leaves::Entity::find()
            .filter(condition)
            .order_by_asc(leaves::Column::CreatedAt)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(leave, requester)| PendingApproval {
                leave,
                requester_name: requester.as_ref().and_then(|u| u.full_name.clone()),
                requester_email: requester.map(|u| u.email),
            })
            .collect())
    }
}
