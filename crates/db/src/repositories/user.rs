//! User profile repository.
//!
//! Profiles are keyed by the identity provider's subject. Sign-up happens at
//! the provider; an administrator registers the profile row here.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;

use leavedesk_core::access::{AccessDenied, Actor, Capability, Role};
use leavedesk_core::identity::Profile;
use leavedesk_core::settlement::RolloverPolicy;
use leavedesk_shared::types::{OrganizationId, UserId};

use crate::convert;
use crate::entities::{organizations, users};

use super::settings::SettingsRepository;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email was empty.
    #[error("Email is required")]
    EmailRequired,

    /// A profile already exists for this identity.
    #[error("User {0} is already registered")]
    AlreadyRegistered(UserId),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// Organization not found.
    #[error("Organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// Caller may not manage the organization.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserInput {
    /// Identity subject.
    pub id: UserId,
    /// Email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Role; defaults to `USER`.
    #[serde(default)]
    pub role: Option<Role>,
    /// Job title.
    #[serde(default)]
    pub designation: Option<String>,
    /// Organization; defaults to the registering administrator's.
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

/// Input for updating a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    /// New role.
    pub role: Option<Role>,
    /// New job title; an empty string clears it.
    pub designation: Option<String>,
    /// New display name.
    pub full_name: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only a super administrator may hand out the super administrator role.
fn require_assignable(actor: &Actor, role: Role) -> Result<(), AccessDenied> {
    if role == Role::SuperAdmin {
        actor.require(Capability::CrossOrganizations)
    } else {
        Ok(())
    }
}

/// User profile repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Loads the profile the request pipeline builds an actor from.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, DbErr> {
        Ok(self.find_by_id(id).await?.as_ref().map(convert::profile))
    }

    /// Users of an organization, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, organization_id: OrganizationId) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Registers a profile seeded with the organization's default balances.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage the target organization
    /// - `EmailRequired`, `AlreadyRegistered`, `OrganizationNotFound`
    pub async fn register(
        &self,
        actor: &Actor,
        input: RegisterUserInput,
        fallback: RolloverPolicy,
        today: NaiveDate,
    ) -> Result<users::Model, UserError> {
        let organization_id = input.organization_id.unwrap_or(actor.organization_id);
        actor.require_in(Capability::ManageOrg, organization_id)?;

        let email = input.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(UserError::EmailRequired);
        }
        if self.find_by_id(input.id).await?.is_some() {
            return Err(UserError::AlreadyRegistered(input.id));
        }
        organizations::Entity::find_by_id(organization_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(UserError::OrganizationNotFound(organization_id))?;

        let settings =
            SettingsRepository::get_in(&self.db, organization_id, fallback, today.year()).await?;

        let role = input.role.unwrap_or(Role::User);
        require_assignable(actor, role)?;
        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(input.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            email: Set(email),
            full_name: Set(non_blank(input.full_name)),
            designation: Set(non_blank(input.designation)),
            role: Set(role.into()),
            balance_casual: Set(settings.default_casual_leaves.amount()),
            balance_medical: Set(settings.default_medical_leaves.amount()),
            balance_compoff: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            user_id = %user.id,
            organization_id = %organization_id,
            role = %role,
            registered_by = %actor.user_id,
            "User registered"
        );
        Ok(user)
    }

    /// Updates role, designation or name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage the organization
    pub async fn update(
        &self,
        actor: &Actor,
        id: UserId,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(id)
            .await?
            .filter(|u| actor.can_access_organization(OrganizationId::from_uuid(u.organization_id)))
            .ok_or(UserError::NotFound(id))?;
        actor.require_in(
            Capability::ManageOrg,
            OrganizationId::from_uuid(user.organization_id),
        )?;

        if let Some(role) = input.role {
            require_assignable(actor, role)?;
        }
        let previous_role: Role = user.role.into();
        let mut active: users::ActiveModel = user.into();
        if let Some(role) = input.role {
            active.role = Set(role.into());
        }
        if let Some(designation) = input.designation {
            active.designation = Set(non_blank(Some(designation)));
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(non_blank(Some(full_name)));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        if let Some(role) = input.role.filter(|r| *r != previous_role) {
            info!(
                user_id = %id,
                from = %previous_role,
                to = %role,
                changed_by = %actor.user_id,
                "User role changed"
            );
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Engineer ".into())), Some("Engineer".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_register_input_defaults() {
        let input: RegisterUserInput = serde_json::from_str(
            r#"{"id": "0190c6d2-7a3e-7c3b-9d2f-3f1f6c1b2a10", "email": "a@b.test"}"#,
        )
        .unwrap();
        assert_eq!(input.role, None);
        assert_eq!(input.organization_id, None);
        assert_eq!(input.full_name, None);
    }
}
