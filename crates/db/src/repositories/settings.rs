//! Leave settings repository.
//!
//! One settings row per organization. Its defaults are the template for
//! bulk resets, new profiles and the year-end rollover; they never override
//! a user's current balance on their own.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use leavedesk_core::access::{AccessDenied, Actor, Capability};
use leavedesk_core::settlement::RolloverPolicy;
use leavedesk_shared::types::{Days, OrganizationId};

use crate::entities::leave_settings;

use super::balance::BalanceRepository;

/// Error types for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Bulk reset called without the confirmation flag.
    #[error("Bulk reset overwrites every balance; confirm to proceed")]
    ConfirmationRequired,

    /// A default allotment was negative.
    #[error("Default allotments must not be negative")]
    NegativeAllotment,

    /// Caller may not manage the organization.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Settings in effect for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    /// Organization.
    pub organization_id: OrganizationId,
    /// Display year.
    pub year: i32,
    /// Casual allotment.
    pub default_casual_leaves: Days,
    /// Medical allotment.
    pub default_medical_leaves: Days,
    /// Carry unused casual leave into the next year.
    pub carry_forward_enabled: bool,
    /// Informational: set once settlement completed.
    pub year_end_processed: bool,
    /// When settlement last completed.
    pub year_end_processed_at: Option<DateTime<FixedOffset>>,
    /// False when the values are configured fallbacks.
    pub persisted: bool,
}

impl EffectiveSettings {
    /// The rollover template.
    #[must_use]
    pub const fn policy(&self) -> RolloverPolicy {
        RolloverPolicy {
            default_casual: self.default_casual_leaves,
            default_medical: self.default_medical_leaves,
            carry_forward: self.carry_forward_enabled,
        }
    }

    fn from_model(model: leave_settings::Model) -> Self {
        Self {
            organization_id: OrganizationId::from_uuid(model.organization_id),
            year: model.year,
            default_casual_leaves: Days::new(model.default_casual_leaves),
            default_medical_leaves: Days::new(model.default_medical_leaves),
            carry_forward_enabled: model.carry_forward_enabled,
            year_end_processed: model.year_end_processed,
            year_end_processed_at: model.year_end_processed_at,
            persisted: true,
        }
    }
}

/// Input for saving settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsInput {
    /// Casual allotment.
    pub default_casual_leaves: Days,
    /// Medical allotment.
    pub default_medical_leaves: Days,
    /// Carry-forward switch.
    #[serde(default)]
    pub carry_forward_enabled: bool,
}

/// Leave settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Settings of an organization, or `fallback` when none were saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(
        &self,
        organization_id: OrganizationId,
        fallback: RolloverPolicy,
        year: i32,
    ) -> Result<EffectiveSettings, DbErr> {
        Self::get_in(&self.db, organization_id, fallback, year).await
    }

    /// [`Self::get`] on `conn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_in<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        fallback: RolloverPolicy,
        year: i32,
    ) -> Result<EffectiveSettings, DbErr> {
        let row = leave_settings::Entity::find()
            .filter(leave_settings::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(conn)
            .await?;

        Ok(row.map_or(
            EffectiveSettings {
                organization_id,
                year,
                default_casual_leaves: fallback.default_casual,
                default_medical_leaves: fallback.default_medical,
                carry_forward_enabled: fallback.carry_forward,
                year_end_processed: false,
                year_end_processed_at: None,
                persisted: false,
            },
            EffectiveSettings::from_model,
        ))
    }

    /// Creates or updates the organization's settings row.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `NegativeAllotment` if a default is negative
    pub async fn save(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        input: &SaveSettingsInput,
        year: i32,
    ) -> Result<EffectiveSettings, SettingsError> {
        actor.require_in(Capability::ManageOrg, organization_id)?;
        if input.default_casual_leaves.is_negative() || input.default_medical_leaves.is_negative()
        {
            return Err(SettingsError::NegativeAllotment);
        }

        let now = Utc::now().into();
        let row = leave_settings::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            year: Set(year),
            default_casual_leaves: Set(input.default_casual_leaves.amount()),
            default_medical_leaves: Set(input.default_medical_leaves.amount()),
            carry_forward_enabled: Set(input.carry_forward_enabled),
            year_end_processed: Set(false),
            year_end_processed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = leave_settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(leave_settings::Column::OrganizationId)
                    .update_columns([
                        leave_settings::Column::Year,
                        leave_settings::Column::DefaultCasualLeaves,
                        leave_settings::Column::DefaultMedicalLeaves,
                        leave_settings::Column::CarryForwardEnabled,
                        leave_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        info!(
            organization_id = %organization_id,
            saved_by = %actor.user_id,
            casual = %input.default_casual_leaves,
            medical = %input.default_medical_leaves,
            carry_forward = input.carry_forward_enabled,
            "Leave settings saved"
        );
        Ok(EffectiveSettings::from_model(saved))
    }

    /// Resets every user's casual and medical balance to the defaults.
    ///
    /// Returns the number of users reset.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `ConfirmationRequired` unless `confirm` is set
    pub async fn bulk_reset(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        fallback: RolloverPolicy,
        year: i32,
        confirm: bool,
    ) -> Result<u64, SettingsError> {
        actor.require_in(Capability::ManageOrg, organization_id)?;
        if !confirm {
            return Err(SettingsError::ConfirmationRequired);
        }

        let settings = self.get(organization_id, fallback, year).await?;
        let reset = BalanceRepository::new(self.db.clone())
            .reset_organization(
                organization_id,
                settings.default_casual_leaves,
                settings.default_medical_leaves,
            )
            .await?;

        info!(
            organization_id = %organization_id,
            reset_by = %actor.user_id,
            users = reset,
            casual = %settings.default_casual_leaves,
            medical = %settings.default_medical_leaves,
            "Balances reset to defaults"
        );
        Ok(reset)
    }

    /// Records that settlement completed, creating the row from `policy` if
    /// the organization never saved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn mark_processed_in<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        policy: RolloverPolicy,
        year: i32,
    ) -> Result<(), DbErr> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let row = leave_settings::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(organization_id.into_inner()),
            year: Set(year),
            default_casual_leaves: Set(policy.default_casual.amount()),
            default_medical_leaves: Set(policy.default_medical.amount()),
            carry_forward_enabled: Set(policy.carry_forward),
            year_end_processed: Set(true),
            year_end_processed_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        leave_settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(leave_settings::Column::OrganizationId)
                    .values([
                        (leave_settings::Column::YearEndProcessed, Expr::value(true)),
                        (leave_settings::Column::YearEndProcessedAt, Expr::value(now)),
                        (leave_settings::Column::UpdatedAt, Expr::value(now)),
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }
}
