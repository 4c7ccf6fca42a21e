//! Organization management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};

use leavedesk_db::entities::organizations;
use leavedesk_db::{OrganizationInput, OrganizationRepository};
use leavedesk_shared::types::OrganizationId;

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the organizations router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/organizations/{org_id}", patch(update_organization))
}

/// GET /organizations - Every organization for super administrators,
/// otherwise the caller's own.
async fn list_organizations(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<organizations::Model>>> {
    let organizations = OrganizationRepository::new((*state.db).clone())
        .list(&actor)
        .await?;
    Ok(Json(organizations))
}

/// POST /organizations - Create a new organization.
async fn create_organization(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<OrganizationInput>,
) -> ApiResult<(StatusCode, Json<organizations::Model>)> {
    let organization = OrganizationRepository::new((*state.db).clone())
        .create(&actor, input)
        .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

/// PATCH `/organizations/{org_id}` - Rename or change the email domain.
async fn update_organization(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(org_id): Path<OrganizationId>,
    Json(input): Json<OrganizationInput>,
) -> ApiResult<Json<organizations::Model>> {
    let organization = OrganizationRepository::new((*state.db).clone())
        .update(&actor, org_id, input)
        .await?;
    Ok(Json(organization))
}
