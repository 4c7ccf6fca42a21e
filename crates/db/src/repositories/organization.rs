//! Organization repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;

use leavedesk_core::access::{AccessDenied, Actor, Capability};
use leavedesk_shared::types::OrganizationId;

use crate::entities::organizations;

/// Error types for organization operations.
#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    /// Name was empty.
    #[error("Organization name is required")]
    NameRequired,

    /// Organization not found.
    #[error("Organization not found: {0}")]
    NotFound(OrganizationId),

    /// Caller is not a super administrator.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or updating an organization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationInput {
    /// Name.
    pub name: Option<String>,
    /// Email domain; an empty string clears it.
    pub domain: Option<String>,
}

fn normalize_domain(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_start_matches('@').to_lowercase();
    (!domain.is_empty()).then_some(domain)
}

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: OrganizationId,
    ) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Organizations visible to the actor, by name.
    ///
    /// Super administrators see every organization; everyone else their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<organizations::Model>, DbErr> {
        let mut query = organizations::Entity::find().order_by_asc(organizations::Column::Name);
        if !actor.can(Capability::CrossOrganizations) {
            query = query.filter(organizations::Column::Id.eq(actor.organization_id.into_inner()));
        }
        query.all(&self.db).await
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` unless the actor is a super administrator
    /// - `NameRequired` if the name is missing or blank
    pub async fn create(
        &self,
        actor: &Actor,
        input: OrganizationInput,
    ) -> Result<organizations::Model, OrganizationError> {
        actor.require(Capability::CrossOrganizations)?;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(OrganizationError::NameRequired)?;

        let now = Utc::now().into();
        let organization = organizations::ActiveModel {
            id: Set(OrganizationId::new().into_inner()),
            name: Set(name.to_string()),
            domain: Set(input.domain.as_deref().and_then(normalize_domain)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(organization_id = %organization.id, created_by = %actor.user_id, "Organization created");
        Ok(organization)
    }

    /// Updates an organization's name or domain.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` unless the actor is a super administrator
    /// - `NotFound` if the organization does not exist
    /// - `NameRequired` if a blank name is given
    pub async fn update(
        &self,
        actor: &Actor,
        id: OrganizationId,
        input: OrganizationInput,
    ) -> Result<organizations::Model, OrganizationError> {
        actor.require(Capability::CrossOrganizations)?;
        let organization = self
            .find_by_id(id)
            .await?
            .ok_or(OrganizationError::NotFound(id))?;

        let mut active: organizations::ActiveModel = organization.into();
        if let Some(name) = input.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(OrganizationError::NameRequired);
            }
            active.name = Set(name.to_string());
        }
        if let Some(domain) = input.domain {
            active.domain = Set(normalize_domain(&domain));
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" @Acme.Example "), Some("acme.example".into()));
        assert_eq!(normalize_domain("  "), None);
    }
}
