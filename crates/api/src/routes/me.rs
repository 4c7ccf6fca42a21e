//! The caller's own profile and dashboard.

use axum::{Json, Router, extract::State, routing::get};

use leavedesk_db::entities::users;
use leavedesk_db::{DashboardRepository, EmployeeDashboard, UserRepository, UserError};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the profile routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/dashboard", get(get_dashboard))
}

/// GET /me - The caller's profile with balances.
async fn get_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<users::Model>> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(actor.user_id)
        .await?
        .ok_or(UserError::NotFound(actor.user_id))?;
    Ok(Json(user))
}

/// GET /me/dashboard - Balances, counts and recent requests.
async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<EmployeeDashboard>> {
    let dashboard = DashboardRepository::new((*state.db).clone())
        .employee(actor.user_id)
        .await?;
    Ok(Json(dashboard))
}
