//! Approval routing.
//!
//! Decides which pending requests an approver sees and may act on. Roles
//! with [`ApprovalScope::All`] see every pending request of their
//! organization (or of every organization under global visibility); team
//! leads see requests routed to groups they belong to.

use leavedesk_shared::config::ApprovalVisibility;
use leavedesk_shared::types::GroupId;

use crate::access::{Actor, ApprovalScope};
use crate::leave::types::{LeaveRequest, LeaveStatus};

/// Approval queue rules.
pub struct ApprovalQueue;

impl ApprovalQueue {
    /// Returns true if `actor` may approve or reject `request`.
    ///
    /// Only pending, non-archived requests are actionable.
    #[must_use]
    pub fn can_act_on(
        actor: &Actor,
        memberships: &[GroupId],
        visibility: ApprovalVisibility,
        request: &LeaveRequest,
    ) -> bool {
        if request.status != LeaveStatus::Pending || request.is_archived {
            return false;
        }

        match actor.role.approval_scope() {
            ApprovalScope::All => match visibility {
                ApprovalVisibility::Global => true,
                ApprovalVisibility::Organization => {
                    actor.can_access_organization(request.organization_id)
                }
            },
            ApprovalScope::Groups => request
                .assigned_group_id
                .is_some_and(|group| memberships.contains(&group)),
            ApprovalScope::None => false,
        }
    }

    /// Filters `pending` down to the requests `actor` may act on, oldest
    /// first.
    #[must_use]
    pub fn filter(
        actor: &Actor,
        memberships: &[GroupId],
        visibility: ApprovalVisibility,
        pending: Vec<LeaveRequest>,
    ) -> Vec<LeaveRequest> {
        let mut queue: Vec<_> = pending
            .into_iter()
            .filter(|request| Self::can_act_on(actor, memberships, visibility, request))
            .collect();
        queue.sort_by_key(|request| request.created_at);
        queue
    }
}
