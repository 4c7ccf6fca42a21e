//! Leave repository.
//!
//! Executes [`LeaveWorkflow`] decisions. Every mutation runs in one
//! transaction with the leave row locked `FOR UPDATE`; balances and grants
//! are written before the status that depends on them.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use tracing::{info, warn};

use leavedesk_core::access::{AccessDenied, Actor, Capability};
use leavedesk_core::balance::LedgerEffect;
use leavedesk_core::leave::{
    ApplyLeaveInput, CompOffEffect, EditOptions, LeaveError, LeaveRequest, LeaveStatus,
    LeaveTransition, LeaveType, LeaveWorkflow,
};
use leavedesk_core::routing::ApprovalQueue;
use leavedesk_shared::config::ApprovalVisibility;
use leavedesk_shared::types::{
    Days, GroupId, LeaveId, OrganizationId, PageRequest, PageResponse, UserId,
};

use crate::convert;
use crate::entities::{group_members, groups, leaves, sea_orm_active_enums as db};

use super::balance::BalanceRepository;
use super::compoff::CompOffRepository;

fn db_error(e: DbErr) -> LeaveError {
    LeaveError::Database(e.to_string())
}

/// Filters for the organization leave list.
#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    /// Only this status.
    pub status: Option<LeaveStatus>,
    /// Only this requester.
    pub user_id: Option<UserId>,
    /// Include archived requests.
    pub include_archived: bool,
}

/// Leave repository.
#[derive(Debug, Clone)]
pub struct LeaveRepository {
    db: DatabaseConnection,
}

impl LeaveRepository {
    /// Creates a new leave repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a pending request for the actor.
    ///
    /// Nothing is charged until approval.
    ///
    /// # Errors
    ///
    /// - Any validation error from [`LeaveWorkflow::validate`]
    /// - `GroupUnresolvable` if no approval group can be found
    pub async fn apply(
        &self,
        actor: &Actor,
        input: &ApplyLeaveInput,
        today: NaiveDate,
    ) -> Result<leaves::Model, LeaveError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let available = if input.leave_type == LeaveType::CompOff {
            CompOffRepository::available_in(&txn, actor.user_id)
                .await
                .map_err(db_error)?
        } else {
            Days::ZERO
        };
        let validated = LeaveWorkflow::validate(input, today, available)?;
        let group_id =
            resolve_group_in(&txn, actor.user_id, actor.organization_id, input.group_id).await?;

        let now = Utc::now().into();
        let leave = leaves::ActiveModel {
            id: Set(LeaveId::new().into_inner()),
            user_id: Set(actor.user_id.into_inner()),
            organization_id: Set(actor.organization_id.into_inner()),
            leave_type: Set(validated.leave_type.into()),
            status: Set(db::LeaveStatus::Pending),
            start_date: Set(validated.start_date),
            end_date: Set(validated.end_date),
            is_half_day: Set(validated.duration.is_half_day()),
            half_day_slot: Set(validated.duration.half_day_slot().map(Into::into)),
            days_count: Set(validated.days_count.amount()),
            ledger_days: Set(Days::ZERO.amount()),
            reason: Set(validated.reason),
            assigned_group_id: Set(Some(group_id.into_inner())),
            rejection_reason: Set(None),
            decided_by: Set(None),
            decided_at: Set(None),
            is_archived: Set(false),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave.id,
            user_id = %actor.user_id,
            leave_type = %validated.leave_type,
            days = %validated.days_count,
            group_id = %group_id,
            "Leave request created"
        );
        Ok(leave)
    }

    /// Approves a pending request and charges it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist or is foreign
    /// - `Archived` / `InvalidTransition` from the workflow
    /// - `NotPermitted` if the request is outside the actor's queue
    pub async fn approve(
        &self,
        actor: &Actor,
        visibility: ApprovalVisibility,
        leave_id: LeaveId,
    ) -> Result<leaves::Model, LeaveError> {
        actor.require(Capability::Approve)?;
        let txn = self.db.begin().await.map_err(db_error)?;

        let (model, request) = lock_in(&txn, actor, visibility, leave_id).await?;
        let transition = LeaveWorkflow::approve(&request)?;
        ensure_in_queue(&txn, actor, visibility, &request).await?;

        let updated = execute_in(&txn, model, &request, transition, Some(actor.user_id)).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave_id,
            user_id = %request.user_id,
            approved_by = %actor.user_id,
            charged = %updated.ledger_days,
            "Leave request approved"
        );
        Ok(updated)
    }

    /// Rejects a pending request.
    ///
    /// # Errors
    ///
    /// Same as [`LeaveRepository::approve`].
    pub async fn reject(
        &self,
        actor: &Actor,
        visibility: ApprovalVisibility,
        leave_id: LeaveId,
        reason: Option<&str>,
    ) -> Result<leaves::Model, LeaveError> {
        actor.require(Capability::Approve)?;
        let txn = self.db.begin().await.map_err(db_error)?;

        let (model, request) = lock_in(&txn, actor, visibility, leave_id).await?;
        let transition = LeaveWorkflow::reject(&request, reason)?;
        ensure_in_queue(&txn, actor, visibility, &request).await?;

        let updated = execute_in(&txn, model, &request, transition, Some(actor.user_id)).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave_id,
            user_id = %request.user_id,
            rejected_by = %actor.user_id,
            "Leave request rejected"
        );
        Ok(updated)
    }

    /// Cancels a pending or approved request, reversing any charge.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist or is foreign
    /// - `NotOwner`, `Archived`, `InvalidTransition` from the workflow
    pub async fn cancel(
        &self,
        actor: &Actor,
        leave_id: LeaveId,
    ) -> Result<leaves::Model, LeaveError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (model, request) =
            lock_in(&txn, actor, ApprovalVisibility::Organization, leave_id).await?;
        let transition = LeaveWorkflow::cancel(actor, &request)?;
        let updated = execute_in(&txn, model, &request, transition, None).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave_id,
            user_id = %request.user_id,
            cancelled_by = %actor.user_id,
            was = %request.status,
            "Leave request cancelled"
        );
        Ok(updated)
    }

    /// Edits a pending or approved request in place.
    ///
    /// The new content is validated as a fresh application. Leave type
    /// changes are allowed; the group is kept unless a new one is given.
    ///
    /// # Errors
    ///
    /// - Any validation error from [`LeaveWorkflow::validate`]
    /// - `NotOwner`, `NotPermitted`, `Archived`, `InvalidTransition` from the
    ///   workflow
    pub async fn edit(
        &self,
        actor: &Actor,
        leave_id: LeaveId,
        input: &ApplyLeaveInput,
        options: EditOptions,
        today: NaiveDate,
    ) -> Result<leaves::Model, LeaveError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (model, request) =
            lock_in(&txn, actor, ApprovalVisibility::Organization, leave_id).await?;

        let available = if input.leave_type == LeaveType::CompOff {
            let mut available = CompOffRepository::available_in(&txn, request.user_id)
                .await
                .map_err(db_error)?;
            // The reversal gives back what the current approval consumed.
            if request.leave_type == LeaveType::CompOff && request.status == LeaveStatus::Approved
            {
                available += request.ledger_days;
            }
            available
        } else {
            Days::ZERO
        };
        let validated = LeaveWorkflow::validate(input, today, available)?;
        let transition = LeaveWorkflow::edit(actor, &request, &validated, options)?;

        let group_id = match input.group_id {
            Some(group_id) => Some(
                resolve_group_in(&txn, request.user_id, request.organization_id, Some(group_id))
                    .await?
                    .into_inner(),
            ),
            None => model.assigned_group_id,
        };

        let mut active: leaves::ActiveModel = model.clone().into();
        active.leave_type = Set(validated.leave_type.into());
        active.start_date = Set(validated.start_date);
        active.end_date = Set(validated.end_date);
        active.is_half_day = Set(validated.duration.is_half_day());
        active.half_day_slot = Set(validated.duration.half_day_slot().map(Into::into));
        active.days_count = Set(validated.days_count.amount());
        active.reason = Set(validated.reason.clone());
        active.assigned_group_id = Set(group_id);

        // The reversal half refers to the stored request; the charge half to
        // the edited content.
        let charged = run_effects_in(&txn, &request, &transition.ledger, transition.comp_off).await?;
        let ledger_days = if transition.new_status == LeaveStatus::Approved {
            charged
        } else {
            Days::ZERO
        };
        active.status = Set(transition.new_status.into());
        active.ledger_days = Set(ledger_days.amount());
        if transition.new_status == LeaveStatus::Pending {
            active.decided_by = Set(None);
            active.decided_at = Set(None);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await.map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave_id,
            user_id = %request.user_id,
            edited_by = %actor.user_id,
            from = %request.status,
            to = %transition.new_status,
            days = %validated.days_count,
            "Leave request edited"
        );
        Ok(updated)
    }

    /// Hard-deletes a request, reversing an approval first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `Archived` if the request was archived
    pub async fn delete(&self, actor: &Actor, leave_id: LeaveId) -> Result<(), LeaveError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let (_, request) =
            lock_in(&txn, actor, ApprovalVisibility::Organization, leave_id).await?;
        let removal = LeaveWorkflow::delete(actor, &request)?;
        run_effects_in(&txn, &request, &removal.ledger, removal.comp_off).await?;

        let result = leaves::Entity::delete_by_id(leave_id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if result.rows_affected != 1 {
            return Err(LeaveError::ConcurrentModification(leave_id));
        }
        txn.commit().await.map_err(db_error)?;

        info!(
            leave_id = %leave_id,
            user_id = %request.user_id,
            deleted_by = %actor.user_id,
            was = %request.status,
            "Leave request deleted"
        );
        Ok(())
    }

    /// Finds a request visible to the actor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the request does not exist or is not visible.
    pub async fn find(&self, actor: &Actor, leave_id: LeaveId) -> Result<leaves::Model, LeaveError> {
        let model = leaves::Entity::find_by_id(leave_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(LeaveError::NotFound(leave_id))?;

        let organization_id = OrganizationId::from_uuid(model.organization_id);
        let visible = model.user_id == actor.user_id.into_inner()
            || (actor.can_access_organization(organization_id)
                && (actor.can(Capability::ViewAllLeaves) || actor.can(Capability::Approve)));
        if visible {
            Ok(model)
        } else {
            Err(LeaveError::NotFound(leave_id))
        }
    }

    /// Lists a user's own requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<leaves::Model>, DbErr> {
        leaves::Entity::find()
            .filter(leaves::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(leaves::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists an organization's requests, newest first.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot view all leaves there
    /// - `Database` if the query fails
    pub async fn list(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        filter: &LeaveFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<leaves::Model>, LeaveError> {
        actor.require_in(Capability::ViewAllLeaves, organization_id)?;

        let mut condition =
            Condition::all().add(leaves::Column::OrganizationId.eq(organization_id.into_inner()));
        if let Some(status) = filter.status {
            condition = condition.add(leaves::Column::Status.eq(db::LeaveStatus::from(status)));
        }
        if let Some(user_id) = filter.user_id {
            condition = condition.add(leaves::Column::UserId.eq(user_id.into_inner()));
        }
        if !filter.include_archived {
            condition = condition.add(leaves::Column::IsArchived.eq(false));
        }

        let query = leaves::Entity::find()
            .filter(condition)
            .order_by_desc(leaves::Column::CreatedAt);
        let total = query.clone().count(&self.db).await.map_err(db_error)?;
        let data = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Loads and locks a leave row.
///
/// Rows of other organizations are reported as missing unless approvals are
/// global and the actor approves everything.
async fn lock_in(
    txn: &DatabaseTransaction,
    actor: &Actor,
    visibility: ApprovalVisibility,
    leave_id: LeaveId,
) -> Result<(leaves::Model, LeaveRequest), LeaveError> {
    let model = leaves::Entity::find_by_id(leave_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_error)?
        .ok_or(LeaveError::NotFound(leave_id))?;

    let request = convert::leave_request(&model);
    let global = visibility == ApprovalVisibility::Global && actor.can(Capability::ViewAllLeaves);
    if !global && !actor.can_access_organization(request.organization_id) {
        return Err(LeaveError::NotFound(leave_id));
    }
    Ok((model, request))
}

/// Rejects approvers acting outside their queue.
async fn ensure_in_queue(
    txn: &DatabaseTransaction,
    actor: &Actor,
    visibility: ApprovalVisibility,
    request: &LeaveRequest,
) -> Result<(), LeaveError> {
    let memberships = memberships_in(txn, actor.user_id).await.map_err(db_error)?;
    if ApprovalQueue::can_act_on(actor, &memberships, visibility, request) {
        Ok(())
    } else {
        Err(LeaveError::NotPermitted(AccessDenied {
            role: actor.role,
            capability: Capability::Approve,
        }))
    }
}

/// Groups a user belongs to.
pub(crate) async fn memberships_in<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<GroupId>, DbErr> {
    let rows = group_members::Entity::find()
        .filter(group_members::Column::UserId.eq(user_id.into_inner()))
        .order_by_asc(group_members::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|m| GroupId::from_uuid(m.group_id))
        .collect())
}

/// Picks the approval group: the requested one if it belongs to the
/// organization, else the user's first membership.
async fn resolve_group_in(
    txn: &DatabaseTransaction,
    user_id: UserId,
    organization_id: OrganizationId,
    requested: Option<GroupId>,
) -> Result<GroupId, LeaveError> {
    if let Some(group_id) = requested {
        let group = groups::Entity::find_by_id(group_id.into_inner())
            .filter(groups::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(txn)
            .await
            .map_err(db_error)?;
        return group
            .map(|g| GroupId::from_uuid(g.id))
            .ok_or(LeaveError::GroupUnresolvable);
    }

    memberships_in(txn, user_id)
        .await
        .map_err(db_error)?
        .into_iter()
        .next()
        .ok_or(LeaveError::GroupUnresolvable)
}

/// Runs ledger and comp-off effects. Returns the days charged.
async fn run_effects_in(
    txn: &DatabaseTransaction,
    request: &LeaveRequest,
    ledger: &[LedgerEffect],
    comp_off: CompOffEffect,
) -> Result<Days, LeaveError> {
    let applied = BalanceRepository::apply_all_in(txn, request.user_id, ledger)
        .await
        .map_err(db_error)?;
    let mut charged: Days = applied
        .iter()
        .filter(|a| a.effect.is_debit())
        .map(|a| a.applied)
        .sum();

    for clamped in applied.iter().filter(|a| a.was_clamped()) {
        warn!(
            leave_id = %request.id,
            user_id = %request.user_id,
            field = %clamped.effect.field(),
            requested = %clamped.requested,
            applied = %clamped.applied,
            "Debit floored at zero"
        );
    }

    if comp_off.release {
        CompOffRepository::release_in(txn, request.id, request.user_id)
            .await
            .map_err(db_error)?;
    }
    if comp_off.consume.is_positive() {
        let plan = CompOffRepository::consume_in(txn, request.id, request.user_id, comp_off.consume)
            .await
            .map_err(db_error)?;
        if plan.shortfall.is_positive() {
            warn!(
                leave_id = %request.id,
                user_id = %request.user_id,
                requested = %comp_off.consume,
                consumed = %plan.consumed,
                shortfall = %plan.shortfall,
                "Comp-off grants exhausted"
            );
        }
        charged += plan.consumed;
    }

    Ok(charged)
}

/// Runs a transition's effects, then writes the new status.
async fn execute_in(
    txn: &DatabaseTransaction,
    model: leaves::Model,
    request: &LeaveRequest,
    transition: LeaveTransition,
    decided_by: Option<UserId>,
) -> Result<leaves::Model, LeaveError> {
    let charged = run_effects_in(txn, request, &transition.ledger, transition.comp_off).await?;
    let ledger_days = if transition.new_status == LeaveStatus::Approved {
        charged
    } else {
        Days::ZERO
    };

    let now = Utc::now().into();
    let mut active: leaves::ActiveModel = model.into();
    active.status = Set(transition.new_status.into());
    active.ledger_days = Set(ledger_days.amount());
    if let Some(reason) = transition.rejection_reason {
        active.rejection_reason = Set(Some(reason));
    }
    if let Some(decided_by) = decided_by {
        active.decided_by = Set(Some(decided_by.into_inner()));
        active.decided_at = Set(Some(now));
    }
    active.updated_at = Set(now);

    active.update(txn).await.map_err(db_error)
}
