//! Public holiday calendar repository.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;

use leavedesk_core::access::{AccessDenied, Actor, Capability};
use leavedesk_shared::types::{HolidayId, OrganizationId};

use crate::entities::{public_holidays, sea_orm_active_enums::HolidayType};

/// Error types for holiday operations.
#[derive(Debug, thiserror::Error)]
pub enum HolidayError {
    /// Name was empty.
    #[error("Holiday name is required")]
    NameRequired,

    /// Holiday not found.
    #[error("Holiday not found: {0}")]
    NotFound(HolidayId),

    /// Caller may not manage holidays.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a holiday.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHolidayInput {
    /// Holiday name.
    pub name: String,
    /// Calendar date; also decides the year.
    pub date: NaiveDate,
    /// Holiday type.
    #[serde(default = "default_holiday_type")]
    pub holiday_type: HolidayType,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for updating a holiday.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHolidayInput {
    /// New name.
    pub name: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New type.
    pub holiday_type: Option<HolidayType>,
    /// New description; an empty string clears it.
    pub description: Option<String>,
}

const fn default_holiday_type() -> HolidayType {
    HolidayType::Mandatory
}

fn required_name(name: &str) -> Result<String, HolidayError> {
    let name = name.trim();
    if name.is_empty() {
        Err(HolidayError::NameRequired)
    } else {
        Ok(name.to_string())
    }
}

/// Public holiday repository.
#[derive(Debug, Clone)]
pub struct HolidayRepository {
    db: DatabaseConnection,
}

impl HolidayRepository {
    /// Creates a new holiday repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Holidays of an organization in a year, by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        organization_id: OrganizationId,
        year: i32,
    ) -> Result<Vec<public_holidays::Model>, DbErr> {
        public_holidays::Entity::find()
            .filter(public_holidays::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(public_holidays::Column::Year.eq(year))
            .order_by_asc(public_holidays::Column::Date)
            .all(&self.db)
            .await
    }

    /// Adds a holiday to the actor's organization.
    ///
    /// # Errors
    ///
    /// - `NotPermitted` if the actor cannot manage holidays
    /// - `NameRequired` if the name is blank
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateHolidayInput,
    ) -> Result<public_holidays::Model, HolidayError> {
        actor.require(Capability::ManageHolidays)?;
        let name = required_name(&input.name)?;

        let now = Utc::now().into();
        let holiday = public_holidays::ActiveModel {
            id: Set(HolidayId::new().into_inner()),
            organization_id: Set(actor.organization_id.into_inner()),
            name: Set(name),
            date: Set(input.date),
            year: Set(input.date.year()),
            holiday_type: Set(input.holiday_type),
            description: Set(input.description),
            created_by: Set(Some(actor.user_id.into_inner())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            holiday_id = %holiday.id,
            organization_id = %actor.organization_id,
            date = %holiday.date,
            "Holiday created"
        );
        Ok(holiday)
    }

    /// Updates a holiday. Changing the date moves it to the date's year.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the holiday does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage holidays
    /// - `NameRequired` if a blank name is given
    pub async fn update(
        &self,
        actor: &Actor,
        id: HolidayId,
        input: UpdateHolidayInput,
    ) -> Result<public_holidays::Model, HolidayError> {
        let holiday = self.find_managed(actor, id).await?;

        let mut active: public_holidays::ActiveModel = holiday.into();
        if let Some(name) = &input.name {
            active.name = Set(required_name(name)?);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
            active.year = Set(date.year());
        }
        if let Some(holiday_type) = input.holiday_type {
            active.holiday_type = Set(holiday_type);
        }
        if let Some(description) = input.description {
            let description = description.trim();
            active.description =
                Set((!description.is_empty()).then(|| description.to_string()));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a holiday.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the holiday does not exist or is foreign
    /// - `NotPermitted` if the actor cannot manage holidays
    pub async fn delete(&self, actor: &Actor, id: HolidayId) -> Result<(), HolidayError> {
        let holiday = self.find_managed(actor, id).await?;
        public_holidays::Entity::delete_by_id(holiday.id)
            .exec(&self.db)
            .await?;

        info!(holiday_id = %id, deleted_by = %actor.user_id, "Holiday deleted");
        Ok(())
    }

    async fn find_managed(
        &self,
        actor: &Actor,
        id: HolidayId,
    ) -> Result<public_holidays::Model, HolidayError> {
        let holiday = public_holidays::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(HolidayError::NotFound(id))?;

        let organization_id = OrganizationId::from_uuid(holiday.organization_id);
        if !actor.can_access_organization(organization_id) {
            return Err(HolidayError::NotFound(id));
        }
        actor.require_in(Capability::ManageHolidays, organization_id)?;
        Ok(holiday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  New Year ").unwrap(), "New Year");
        assert!(matches!(required_name("   "), Err(HolidayError::NameRequired)));
    }

    #[test]
    fn test_create_input_defaults_to_mandatory() {
        let input: CreateHolidayInput =
            serde_json::from_str(r#"{"name": "Founders Day", "date": "2025-09-01"}"#).unwrap();
        assert_eq!(input.holiday_type, HolidayType::Mandatory);
        assert_eq!(input.description, None);
    }
}
