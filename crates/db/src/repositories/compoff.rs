//! Comp-off repository: grants, revocation and FIFO consumption.
//!
//! Available balance is always recomputed from `user_comp_offs`. The
//! `users.balance_compoff` column is a cache refreshed after every change.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use leavedesk_core::access::{Actor, Capability};
use leavedesk_core::compoff::{
    CompOffError, ConsumptionPlan, GrantSlice, ValidatedGrant, available_balance, check_revocable,
    plan_consumption,
};
use leavedesk_shared::types::{CompOffId, Days, LeaveId, OrganizationId, UserCompOffId, UserId};

use crate::entities::{comp_off_consumptions, comp_offs, user_comp_offs, users};

const SLICE_COLUMNS: &str = "SELECT uc.id, uc.comp_off_id, uc.user_id, c.organization_id, \
     c.days, uc.consumed_days, uc.created_at \
     FROM user_comp_offs uc JOIN comp_offs c ON c.id = uc.comp_off_id";

const REFRESH_COUNTER_SQL: &str = r"
UPDATE users SET
    balance_compoff = COALESCE((
        SELECT SUM(GREATEST(0, c.days - uc.consumed_days))
        FROM user_comp_offs uc
        JOIN comp_offs c ON c.id = uc.comp_off_id
        WHERE uc.user_id = $1 AND NOT uc.is_consumed
    ), 0),
    updated_at = now()
WHERE id = $1
RETURNING balance_compoff
";

#[derive(Debug, FromQueryResult)]
struct SliceRow {
    id: Uuid,
    comp_off_id: Uuid,
    user_id: Uuid,
    organization_id: Uuid,
    days: Decimal,
    consumed_days: Decimal,
    created_at: DateTime<FixedOffset>,
}

impl SliceRow {
    fn slice(&self) -> GrantSlice {
        GrantSlice {
            id: UserCompOffId::from_uuid(self.id),
            comp_off_id: CompOffId::from_uuid(self.comp_off_id),
            days: Days::new(self.days),
            consumed_days: Days::new(self.consumed_days),
            granted_at: self.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CounterRow {
    balance_compoff: Decimal,
}

fn db_error(e: DbErr) -> CompOffError {
    CompOffError::Database(e.to_string())
}

/// A grant with its recipient rows.
#[derive(Debug, Clone, Serialize)]
pub struct GrantRecord {
    /// The grant.
    pub grant: comp_offs::Model,
    /// One row per recipient.
    pub recipients: Vec<user_comp_offs::Model>,
}

/// A recipient row with its grant.
#[derive(Debug, Clone, Serialize)]
pub struct UserGrant {
    /// The recipient row.
    pub share: user_comp_offs::Model,
    /// The grant it belongs to.
    pub grant: comp_offs::Model,
}

/// Comp-off repository.
#[derive(Debug, Clone)]
pub struct CompOffRepository {
    db: DatabaseConnection,
}

impl CompOffRepository {
    /// Creates a new comp-off repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Grants comp-off days to every recipient in one transaction.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot grant comp-offs
    /// - `UnknownRecipient` if a recipient is not in the actor's organization
    /// - `Database` if a write fails
    pub async fn grant(
        &self,
        actor: &Actor,
        grant: &ValidatedGrant,
    ) -> Result<GrantRecord, CompOffError> {
        actor.require(Capability::GrantCompOff)?;
        let organization_id = actor.organization_id;
        let created_by = actor.user_id;
        let txn = self.db.begin().await.map_err(db_error)?;

        let recipient_ids: Vec<Uuid> = grant.recipients.iter().map(|id| id.into_inner()).collect();
        let known: HashSet<Uuid> = users::Entity::find()
            .filter(users::Column::Id.is_in(recipient_ids.clone()))
            .filter(users::Column::OrganizationId.eq(organization_id.into_inner()))
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|u| u.id)
            .collect();
        if let Some(missing) = recipient_ids.iter().find(|id| !known.contains(id)) {
            return Err(CompOffError::UnknownRecipient(UserId::from_uuid(*missing)));
        }

        let now = Utc::now().into();
        let record = comp_offs::ActiveModel {
            id: Set(CompOffId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            title: Set(grant.title.clone()),
            description: Set(grant.description.clone()),
            work_date: Set(grant.work_date),
            days: Set(grant.days.amount()),
            created_by: Set(created_by.into_inner()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error)?;

        let mut recipients = Vec::with_capacity(recipient_ids.len());
        for user_id in &grant.recipients {
            let share = user_comp_offs::ActiveModel {
                id: Set(UserCompOffId::new().into_inner()),
                comp_off_id: Set(record.id),
                user_id: Set(user_id.into_inner()),
                consumed_days: Set(Decimal::ZERO),
                is_consumed: Set(false),
                forfeited_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_error)?;
            Self::refresh_counter_in(&txn, *user_id)
                .await
                .map_err(db_error)?;
            recipients.push(share);
        }

        txn.commit().await.map_err(db_error)?;

        info!(
            comp_off_id = %record.id,
            organization_id = %organization_id,
            created_by = %created_by,
            days = %grant.days,
            recipients = recipients.len(),
            "Comp-off granted"
        );

        Ok(GrantRecord {
            grant: record,
            recipients,
        })
    }

    /// Revokes one recipient row.
    ///
    /// # Errors
    ///
    /// - `GrantNotFound` if the row does not exist or is not visible
    /// - `NotPermitted` if the actor cannot grant comp-offs there
    /// - `AlreadyConsumed` if any part was spent
    pub async fn revoke(&self, actor: &Actor, id: UserCompOffId) -> Result<(), CompOffError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("{SLICE_COLUMNS} WHERE uc.id = $1 FOR UPDATE OF uc"),
            [id.into_inner().into()],
        );
        let row = SliceRow::find_by_statement(stmt)
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(CompOffError::GrantNotFound(id))?;

        let organization_id = OrganizationId::from_uuid(row.organization_id);
        if !actor.can_access_organization(organization_id) {
            return Err(CompOffError::GrantNotFound(id));
        }
        actor.require_in(Capability::GrantCompOff, organization_id)?;
        check_revocable(&row.slice())?;

        user_comp_offs::Entity::delete_by_id(row.id)
            .exec(&txn)
            .await
            .map_err(db_error)?;
        let user_id = UserId::from_uuid(row.user_id);
        Self::refresh_counter_in(&txn, user_id)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(
            user_comp_off_id = %id,
            user_id = %user_id,
            revoked_by = %actor.user_id,
            "Comp-off revoked"
        );
        Ok(())
    }

    /// Available comp-off days, recomputed from grant rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn available(&self, user_id: UserId) -> Result<Days, DbErr> {
        Self::available_in(&self.db, user_id).await
    }

    /// Available comp-off days on `conn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn available_in<C: ConnectionTrait>(conn: &C, user_id: UserId) -> Result<Days, DbErr> {
        let slices = Self::slices_in(conn, user_id, false).await?;
        Ok(available_balance(&slices))
    }

    /// Unconsumed recipient rows of a user, oldest first.
    async fn slices_in<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        lock: bool,
    ) -> Result<Vec<GrantSlice>, DbErr> {
        let lock_clause = if lock { " FOR UPDATE OF uc" } else { "" };
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "{SLICE_COLUMNS} WHERE uc.user_id = $1 AND NOT uc.is_consumed \
                 ORDER BY uc.created_at, uc.id{lock_clause}"
            ),
            [user_id.into_inner().into()],
        );
        let rows = SliceRow::find_by_statement(stmt).all(conn).await?;
        Ok(rows.iter().map(SliceRow::slice).collect())
    }

    /// Consumes up to `days` for `leave_id`, oldest grant first, and records
    /// what was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub async fn consume_in<C: ConnectionTrait>(
        conn: &C,
        leave_id: LeaveId,
        user_id: UserId,
        days: Days,
    ) -> Result<ConsumptionPlan, DbErr> {
        let slices = Self::slices_in(conn, user_id, true).await?;
        let plan = plan_consumption(&slices, days);
        let now = Utc::now().into();

        for take in &plan.takes {
            user_comp_offs::Entity::update_many()
                .col_expr(
                    user_comp_offs::Column::ConsumedDays,
                    Expr::col(user_comp_offs::Column::ConsumedDays).add(take.days.amount()),
                )
                .col_expr(user_comp_offs::Column::IsConsumed, Expr::value(take.exhausts))
                .filter(user_comp_offs::Column::Id.eq(take.user_comp_off_id.into_inner()))
                .exec(conn)
                .await?;

            comp_off_consumptions::ActiveModel {
                id: Set(Uuid::now_v7()),
                leave_id: Set(leave_id.into_inner()),
                user_comp_off_id: Set(take.user_comp_off_id.into_inner()),
                days: Set(take.days.amount()),
                created_at: Set(now),
            }
            .insert(conn)
            .await?;
        }

        let cached = Self::refresh_counter_in(conn, user_id).await?;
        debug!(
            leave_id = %leave_id,
            user_id = %user_id,
            requested = %days,
            consumed = %plan.consumed,
            shortfall = %plan.shortfall,
            remaining = %cached,
            "Comp-off consumed"
        );
        Ok(plan)
    }

    /// Releases everything `leave_id` consumed.
    ///
    /// Rows forfeited by year-end settlement stay closed; their share is
    /// dropped rather than given back. Returns the days given back.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub async fn release_in<C: ConnectionTrait>(
        conn: &C,
        leave_id: LeaveId,
        user_id: UserId,
    ) -> Result<Days, DbErr> {
        let consumptions = comp_off_consumptions::Entity::find()
            .filter(comp_off_consumptions::Column::LeaveId.eq(leave_id.into_inner()))
            .find_also_related(user_comp_offs::Entity)
            .all(conn)
            .await?;

        let mut released = Days::ZERO;
        let mut lapsed = Days::ZERO;
        for (consumption, share) in &consumptions {
            if share.as_ref().is_some_and(|s| s.forfeited_at.is_some()) {
                lapsed += Days::new(consumption.days);
                continue;
            }
            user_comp_offs::Entity::update_many()
                .col_expr(
                    user_comp_offs::Column::ConsumedDays,
                    Expr::col(user_comp_offs::Column::ConsumedDays).sub(consumption.days),
                )
                .col_expr(user_comp_offs::Column::IsConsumed, Expr::value(false))
                .filter(user_comp_offs::Column::Id.eq(consumption.user_comp_off_id))
                .filter(user_comp_offs::Column::ForfeitedAt.is_null())
                .exec(conn)
                .await?;
            released += Days::new(consumption.days);
        }

        comp_off_consumptions::Entity::delete_many()
            .filter(comp_off_consumptions::Column::LeaveId.eq(leave_id.into_inner()))
            .exec(conn)
            .await?;

        let cached = Self::refresh_counter_in(conn, user_id).await?;
        debug!(
            leave_id = %leave_id,
            user_id = %user_id,
            released = %released,
            lapsed = %lapsed,
            remaining = %cached,
            "Comp-off released"
        );
        Ok(released)
    }

    /// Forfeits every unconsumed row of a user (year-end rollover).
    ///
    /// Returns the days forfeited.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub async fn forfeit_in<C: ConnectionTrait>(conn: &C, user_id: UserId) -> Result<Days, DbErr> {
        let slices = Self::slices_in(conn, user_id, true).await?;
        let forfeited = available_balance(&slices);

        user_comp_offs::Entity::update_many()
            .col_expr(user_comp_offs::Column::IsConsumed, Expr::value(true))
            .col_expr(
                user_comp_offs::Column::ForfeitedAt,
                Expr::value(Some(DateTime::<FixedOffset>::from(Utc::now()))),
            )
            .filter(user_comp_offs::Column::UserId.eq(user_id.into_inner()))
            .filter(user_comp_offs::Column::IsConsumed.eq(false))
            .exec(conn)
            .await?;

        Self::refresh_counter_in(conn, user_id).await?;
        Ok(forfeited)
    }

    /// Recomputes the cached `balance_compoff` column.
    async fn refresh_counter_in<C: ConnectionTrait>(conn: &C, user_id: UserId) -> Result<Days, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            REFRESH_COUNTER_SQL,
            [user_id.into_inner().into()],
        );
        let row = CounterRow::find_by_statement(stmt)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;
        Ok(Days::new(row.balance_compoff))
    }

    /// Lists an organization's grants with recipients, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, organization_id: OrganizationId) -> Result<Vec<GrantRecord>, DbErr> {
        let rows = comp_offs::Entity::find()
            .filter(comp_offs::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(comp_offs::Column::CreatedAt)
            .find_with_related(user_comp_offs::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(grant, recipients)| GrantRecord { grant, recipients })
            .collect())
    }

    /// Lists a user's recipient rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<UserGrant>, DbErr> {
        let rows = user_comp_offs::Entity::find()
            .filter(user_comp_offs::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(user_comp_offs::Column::CreatedAt)
            .find_also_related(comp_offs::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(share, grant)| grant.map(|grant| UserGrant { share, grant }))
            .collect())
    }
}
