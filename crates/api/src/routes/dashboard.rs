//! HR dashboard route.

use axum::{Json, Router, extract::State, routing::get};

use leavedesk_core::access::Capability;
use leavedesk_db::{DashboardRepository, HrDashboard};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hr/dashboard", get(get_hr_dashboard))
}

/// GET /hr/dashboard - Organization totals for today.
async fn get_hr_dashboard(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<HrDashboard>> {
    actor.require(Capability::ViewAllLeaves)?;
    let dashboard = DashboardRepository::new((*state.db).clone())
        .hr(actor.organization_id, state.today())
        .await?;
    Ok(Json(dashboard))
}
