//! Public holiday routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Datelike;
use serde::Deserialize;

use leavedesk_db::entities::public_holidays;
use leavedesk_db::{CreateHolidayInput, HolidayRepository, UpdateHolidayInput};
use leavedesk_shared::types::HolidayId;

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the holiday routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/holidays", get(list_holidays).post(create_holiday))
        .route(
            "/holidays/{holiday_id}",
            patch(update_holiday).delete(delete_holiday),
        )
}

/// Query parameters for listing holidays.
#[derive(Debug, Default, Deserialize)]
pub struct ListHolidaysQuery {
    /// Calendar year; defaults to the current one.
    pub year: Option<i32>,
}

/// GET /holidays - The organization's holidays for a year, by date.
async fn list_holidays(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListHolidaysQuery>,
) -> ApiResult<Json<Vec<public_holidays::Model>>> {
    let year = query.year.unwrap_or_else(|| state.today().year());
    let holidays = HolidayRepository::new((*state.db).clone())
        .list(actor.organization_id, year)
        .await?;
    Ok(Json(holidays))
}

/// POST /holidays
async fn create_holiday(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<CreateHolidayInput>,
) -> ApiResult<(StatusCode, Json<public_holidays::Model>)> {
    let holiday = HolidayRepository::new((*state.db).clone())
        .create(&actor, input)
        .await?;
    Ok((StatusCode::CREATED, Json(holiday)))
}

/// PATCH `/holidays/{holiday_id}`
async fn update_holiday(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(holiday_id): Path<HolidayId>,
    Json(input): Json<UpdateHolidayInput>,
) -> ApiResult<Json<public_holidays::Model>> {
    let holiday = HolidayRepository::new((*state.db).clone())
        .update(&actor, holiday_id, input)
        .await?;
    Ok(Json(holiday))
}

/// DELETE `/holidays/{holiday_id}`
async fn delete_holiday(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(holiday_id): Path<HolidayId>,
) -> ApiResult<StatusCode> {
    HolidayRepository::new((*state.db).clone())
        .delete(&actor, holiday_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
