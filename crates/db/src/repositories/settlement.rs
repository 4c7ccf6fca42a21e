//! Year-end settlement repository.
//!
//! One run is one transaction holding an advisory lock on
//! (organization, year). Each user is settled inside a savepoint so a
//! failing user is rolled back alone and reported, while the rest of the
//! batch commits.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
    Statement, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use leavedesk_core::access::{Actor, Capability};
use leavedesk_core::settlement::{
    ClosingBalances, RolloverPolicy, SettlementEngine, SettlementError, SettlementMode,
    SettlementReport, SettlementWindow, UserSettlement, UserSettlementFailure, YearLeave,
};
use leavedesk_shared::types::{Days, OrganizationId, UserId};

use crate::entities::{leave_archives, leaves, users};

use super::compoff::CompOffRepository;
use super::settings::SettingsRepository;

const TRY_LOCK_SQL: &str = "SELECT pg_try_advisory_xact_lock(hashtext($1), $2) AS locked";

#[derive(Debug, FromQueryResult)]
struct LockRow {
    locked: bool,
}

fn db_error(e: DbErr) -> SettlementError {
    SettlementError::Database(e.to_string())
}

fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Parameters of a settlement run.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettlementRequest {
    /// Year to settle; defaults to the previous year. Requires `force`.
    #[serde(default)]
    pub year: Option<i32>,
    /// Run outside the window, or for an explicit year.
    #[serde(default)]
    pub force: bool,
    /// Initial run or retry of failed users.
    #[serde(default)]
    pub mode: SettlementMode,
    /// Mark the settings row processed even if some users failed.
    #[serde(default)]
    pub allow_partial: bool,
}

/// Year-end settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Settles the actor's organization.
    ///
    /// `fallback` is the rollover template used when the organization never
    /// saved settings.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot run settlement
    /// - `ExplicitYearRequiresForce`, `YearNotClosed`, `OutsideWindow` for
    ///   a run that may not start
    /// - `InProgress` if another run holds the lock
    /// - `AlreadySettled` / `NotYetSettled` from the archive gate
    /// - `Database` if a write outside the per-user loop fails
    pub async fn run(
        &self,
        actor: &Actor,
        request: SettlementRequest,
        today: NaiveDate,
        window: SettlementWindow,
        fallback: RolloverPolicy,
    ) -> Result<SettlementReport, SettlementError> {
        let organization_id = actor.organization_id;
        actor.require_in(Capability::RunSettlement, organization_id)?;

        let year = SettlementEngine::resolve_year(today, request.year, request.force)?;
        SettlementEngine::check_window(today, window, request.force)?;

        let txn = self.db.begin().await.map_err(db_error)?;

        let lock = LockRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            TRY_LOCK_SQL,
            [organization_id.to_string().into(), year.into()],
        ))
        .one(&txn)
        .await
        .map_err(db_error)?;
        if !lock.is_some_and(|row| row.locked) {
            return Err(SettlementError::InProgress { year });
        }

        let existing = leave_archives::Entity::find()
            .filter(leave_archives::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(leave_archives::Column::Year.eq(year))
            .count(&txn)
            .await
            .map_err(db_error)?;
        SettlementEngine::gate(year, existing, request.mode)?;

        let settings = SettingsRepository::get_in(&txn, organization_id, fallback, year + 1)
            .await
            .map_err(db_error)?;
        let policy = settings.policy();

        let settled: HashSet<Uuid> = leave_archives::Entity::find()
            .select_only()
            .column(leave_archives::Column::UserId)
            .filter(leave_archives::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(leave_archives::Column::Year.eq(year))
            .into_tuple::<Uuid>()
            .all(&txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .collect();

        // A retry covers only users that existed when the year was first
        // settled; later hires were seeded with the new year's defaults.
        let cutoff = match request.mode {
            SettlementMode::Initial => None,
            SettlementMode::RetryFailed => first_archived_at_in(&txn, organization_id, year)
                .await
                .map_err(db_error)?,
        };

        let members: Vec<Uuid> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::OrganizationId.eq(organization_id.into_inner()))
            .apply_if(cutoff, |query, at| query.filter(users::Column::CreatedAt.lte(at)))
            .order_by_asc(users::Column::CreatedAt)
            .into_tuple::<Uuid>()
            .all(&txn)
            .await
            .map_err(db_error)?;

        info!(
            organization_id = %organization_id,
            year,
            mode = ?request.mode,
            users = members.len(),
            already_settled = settled.len(),
            joined_before = ?cutoff,
            carry_forward = policy.carry_forward,
            "Year-end settlement started"
        );

        let mut report = SettlementReport::new(organization_id, year, request.mode);
        for id in members {
            if settled.contains(&id) {
                report.skipped += 1;
                continue;
            }
            let user_id = UserId::from_uuid(id);

            let savepoint = txn.begin().await.map_err(db_error)?;
            match settle_user_in(&savepoint, organization_id, user_id, year, policy).await {
                Ok((settlement, archived)) => {
                    savepoint.commit().await.map_err(db_error)?;
                    report.succeeded += 1;
                    report.archived_leaves += archived;
                    debug!(
                        user_id = %user_id,
                        year,
                        closing_casual = %settlement.closing.casual,
                        new_casual = %settlement.outcome.new_casual,
                        carried = %settlement.outcome.carried_forward_casual,
                        forfeited_comp_off = %settlement.outcome.forfeited_comp_off,
                        archived,
                        "User settled"
                    );
                }
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        year,
                        error = %e,
                        "User settlement failed"
                    );
                    savepoint.rollback().await.map_err(db_error)?;
                    report.failed.push(UserSettlementFailure {
                        user_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if SettlementEngine::should_mark_processed(&report, request.allow_partial) {
            SettingsRepository::mark_processed_in(&txn, organization_id, policy, year + 1)
                .await
                .map_err(db_error)?;
            report.marked_processed = true;
        }

        txn.commit().await.map_err(db_error)?;

        if report.failed.is_empty() {
            info!(
                organization_id = %organization_id,
                year,
                succeeded = report.succeeded,
                skipped = report.skipped,
                archived_leaves = report.archived_leaves,
                "Year-end settlement completed"
            );
        } else {
            warn!(
                organization_id = %organization_id,
                year,
                succeeded = report.succeeded,
                failed = report.failed.len(),
                skipped = report.skipped,
                marked_processed = report.marked_processed,
                "Year-end settlement completed with failures"
            );
        }
        Ok(report)
    }
}

/// When the year was first settled for the organization.
async fn first_archived_at_in<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    year: i32,
) -> Result<Option<DateTime<FixedOffset>>, DbErr> {
    leave_archives::Entity::find()
        .select_only()
        .column(leave_archives::Column::ArchivedAt)
        .filter(leave_archives::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(leave_archives::Column::Year.eq(year))
        .order_by_asc(leave_archives::Column::ArchivedAt)
        .into_tuple::<DateTime<FixedOffset>>()
        .one(conn)
        .await
}

/// Archives and rolls over one user. Returns the settlement and the number
/// of leave rows archived.
async fn settle_user_in<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    user_id: UserId,
    year: i32,
    policy: RolloverPolicy,
) -> Result<(UserSettlement, u64), DbErr> {
    let user = users::Entity::find_by_id(user_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;

    let (first, last) = year_bounds(year)?;
    let rows = leaves::Entity::find()
        .filter(leaves::Column::UserId.eq(user_id.into_inner()))
        .filter(leaves::Column::StartDate.between(first, last))
        .all(conn)
        .await?;
    let year_leaves: Vec<YearLeave> = rows
        .iter()
        .map(|l| YearLeave {
            leave_type: l.leave_type.into(),
            status: l.status.into(),
            start_date: l.start_date,
            days_count: Days::new(l.days_count),
        })
        .collect();

    let closing = ClosingBalances {
        casual: Days::new(user.balance_casual),
        medical: Days::new(user.balance_medical),
        comp_off: CompOffRepository::available_in(conn, user_id).await?,
    };
    let settlement = SettlementEngine::settle_user(user_id, year, &year_leaves, closing, policy);
    let summary = &settlement.summary;
    let outcome = &settlement.outcome;

    let now: DateTime<FixedOffset> = Utc::now().into();
    let archive = leave_archives::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id.into_inner()),
        organization_id: Set(organization_id.into_inner()),
        year: Set(year),
        total_requests: Set(count(summary.total_requests)),
        approved_count: Set(count(summary.approved)),
        pending_count: Set(count(summary.pending)),
        rejected_count: Set(count(summary.rejected)),
        cancelled_count: Set(count(summary.cancelled)),
        casual_taken: Set(summary.casual_taken.amount()),
        medical_taken: Set(summary.medical_taken.amount()),
        comp_off_taken: Set(summary.comp_off_taken.amount()),
        closing_casual: Set(closing.casual.amount()),
        closing_medical: Set(closing.medical.amount()),
        closing_comp_off: Set(closing.comp_off.amount()),
        carried_forward_casual: Set(outcome.carried_forward_casual.amount()),
        forfeited_comp_off: Set(outcome.forfeited_comp_off.amount()),
        new_casual: Set(outcome.new_casual.amount()),
        new_medical: Set(outcome.new_medical.amount()),
        archived_at: Set(now),
    };
    leave_archives::Entity::insert(archive)
        .on_conflict(
            OnConflict::columns([
                leave_archives::Column::UserId,
                leave_archives::Column::OrganizationId,
                leave_archives::Column::Year,
            ])
            .update_columns([
                leave_archives::Column::TotalRequests,
                leave_archives::Column::ApprovedCount,
                leave_archives::Column::PendingCount,
                leave_archives::Column::RejectedCount,
                leave_archives::Column::CancelledCount,
                leave_archives::Column::CasualTaken,
                leave_archives::Column::MedicalTaken,
                leave_archives::Column::CompOffTaken,
                leave_archives::Column::ClosingCasual,
                leave_archives::Column::ClosingMedical,
                leave_archives::Column::ClosingCompOff,
                leave_archives::Column::CarriedForwardCasual,
                leave_archives::Column::ForfeitedCompOff,
                leave_archives::Column::NewCasual,
                leave_archives::Column::NewMedical,
                leave_archives::Column::ArchivedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let archived = leaves::Entity::update_many()
        .col_expr(leaves::Column::IsArchived, Expr::value(true))
        .col_expr(leaves::Column::ArchivedAt, Expr::value(Some(now)))
        .col_expr(leaves::Column::UpdatedAt, Expr::value(now))
        .filter(leaves::Column::UserId.eq(user_id.into_inner()))
        .filter(leaves::Column::StartDate.between(first, last))
        .filter(leaves::Column::IsArchived.eq(false))
        .exec(conn)
        .await?
        .rows_affected;

    CompOffRepository::forfeit_in(conn, user_id).await?;

    users::Entity::update_many()
        .col_expr(users::Column::BalanceCasual, Expr::value(outcome.new_casual.amount()))
        .col_expr(users::Column::BalanceMedical, Expr::value(outcome.new_medical.amount()))
        .col_expr(users::Column::UpdatedAt, Expr::value(now))
        .filter(users::Column::Id.eq(user_id.into_inner()))
        .exec(conn)
        .await?;

    Ok((settlement, archived))
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), DbErr> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .zip(NaiveDate::from_ymd_opt(year, 12, 31))
        .ok_or_else(|| DbErr::Custom(format!("year {year} out of range")))
}
