//! Approval group repository.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use leavedesk_core::access::{AccessDenied, Actor, Capability};
use leavedesk_shared::types::{GroupId, OrganizationId, UserId};

use crate::entities::{group_members, groups, users};

/// Error types for group operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// Name was empty.
    #[error("Group name is required")]
    NameRequired,

    /// Group not found.
    #[error("Group not found: {0}")]
    NotFound(GroupId),

    /// User is not part of the group's organization.
    #[error("User {0} is not in this organization")]
    UserNotInOrganization(UserId),

    /// Caller may not manage the organization.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

fn required_name(name: &str) -> Result<String, GroupError> {
    let name = name.trim();
    if name.is_empty() {
        Err(GroupError::NameRequired)
    } else {
        Ok(name.to_string())
    }
}

/// Approval group repository.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Groups of an organization, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, organization_id: OrganizationId) -> Result<Vec<groups::Model>, DbErr> {
        groups::Entity::find()
            .filter(groups::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(groups::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a group in the actor's organization.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `NameRequired` if the name is blank
    pub async fn create(&self, actor: &Actor, name: &str) -> Result<groups::Model, GroupError> {
        actor.require(Capability::ManageOrg)?;
        let name = required_name(name)?;

        let now = Utc::now().into();
        let group = groups::ActiveModel {
            id: Set(GroupId::new().into_inner()),
            organization_id: Set(actor.organization_id.into_inner()),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(group_id = %group.id, organization_id = %actor.organization_id, "Group created");
        Ok(group)
    }

    /// Renames a group.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `NameRequired` if the name is blank
    pub async fn rename(
        &self,
        actor: &Actor,
        id: GroupId,
        name: &str,
    ) -> Result<groups::Model, GroupError> {
        let group = self.find_managed(actor, id).await?;
        let name = required_name(name)?;

        let mut active: groups::ActiveModel = group.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Members of a group, by name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist or is foreign
    pub async fn members(&self, actor: &Actor, id: GroupId) -> Result<Vec<users::Model>, GroupError> {
        let group = self.find_visible(actor, id).await?;

        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group.id))
            .find_also_related(users::Entity)
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().filter_map(|(_, user)| user).collect())
    }

    /// Adds a user to a group. Adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage the organization
    /// - `UserNotInOrganization` if the user belongs elsewhere
    pub async fn add_member(
        &self,
        actor: &Actor,
        id: GroupId,
        user_id: UserId,
    ) -> Result<(), GroupError> {
        let group = self.find_managed(actor, id).await?;

        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await?;
        if user.is_none_or(|u| u.organization_id != group.organization_id) {
            return Err(GroupError::UserNotInOrganization(user_id));
        }

        let member = group_members::ActiveModel {
            group_id: Set(group.id),
            user_id: Set(user_id.into_inner()),
            created_at: Set(Utc::now().into()),
        };
        group_members::Entity::insert(member)
            .on_conflict(
                OnConflict::columns([group_members::Column::GroupId, group_members::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await?;

        info!(group_id = %id, user_id = %user_id, added_by = %actor.user_id, "Group member added");
        Ok(())
    }

    /// Removes a user from a group.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage the organization
    pub async fn remove_member(
        &self,
        actor: &Actor,
        id: GroupId,
        user_id: UserId,
    ) -> Result<(), GroupError> {
        let group = self.find_managed(actor, id).await?;

        group_members::Entity::delete_many()
            .filter(group_members::Column::GroupId.eq(group.id))
            .filter(group_members::Column::UserId.eq(user_id.into_inner()))
            .exec(&self.db)
            .await?;

        info!(group_id = %id, user_id = %user_id, removed_by = %actor.user_id, "Group member removed");
        Ok(())
    }

    async fn find_visible(&self, actor: &Actor, id: GroupId) -> Result<groups::Model, GroupError> {
        groups::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .filter(|g| actor.can_access_organization(OrganizationId::from_uuid(g.organization_id)))
            .ok_or(GroupError::NotFound(id))
    }

    async fn find_managed(&self, actor: &Actor, id: GroupId) -> Result<groups::Model, GroupError> {
        let group = self.find_visible(actor, id).await?;
        actor.require_in(
            Capability::ManageOrg,
            OrganizationId::from_uuid(group.organization_id),
        )?;
        Ok(group)
    }
}
