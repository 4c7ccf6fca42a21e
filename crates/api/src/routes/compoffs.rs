//! Comp-off grant routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};

use leavedesk_core::access::Capability;
use leavedesk_core::compoff::{GrantInput, validate_grant};
use leavedesk_db::{CompOffRepository, GrantRecord};
use leavedesk_shared::types::{Days, UserCompOffId};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the comp-off routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comp-offs", get(list_grants).post(create_grant))
        .route("/comp-offs/balance", get(get_balance))
        .route("/comp-offs/grants/{grant_id}", delete(revoke_grant))
}

/// Query parameters for listing grants.
#[derive(Debug, Default, Deserialize)]
pub struct ListGrantsQuery {
    /// List every grant of the organization instead of the caller's own.
    #[serde(default)]
    pub all: bool,
}

/// Comp-off balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Unconsumed comp-off days.
    pub balance: Days,
}

/// GET /comp-offs - The caller's grants, or the organization's with `all`.
async fn list_grants(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListGrantsQuery>,
) -> ApiResult<Response> {
    let repo = CompOffRepository::new((*state.db).clone());
    if query.all {
        actor.require(Capability::GrantCompOff)?;
        let grants = repo.list(actor.organization_id).await?;
        return Ok(Json(grants).into_response());
    }
    let own = repo.list_for_user(actor.user_id).await?;
    Ok(Json(own).into_response())
}

/// POST /comp-offs - Grant comp-off days to a list of users.
async fn create_grant(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<GrantInput>,
) -> ApiResult<(StatusCode, Json<GrantRecord>)> {
    actor.require(Capability::GrantCompOff)?;
    let grant = validate_grant(&input)?;
    let record = CompOffRepository::new((*state.db).clone())
        .grant(&actor, &grant)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE `/comp-offs/grants/{grant_id}` - Revoke an unused recipient grant.
async fn revoke_grant(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(grant_id): Path<UserCompOffId>,
) -> ApiResult<StatusCode> {
    CompOffRepository::new((*state.db).clone())
        .revoke(&actor, grant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /comp-offs/balance - The caller's comp-off balance, derived from grants.
async fn get_balance(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = CompOffRepository::new((*state.db).clone())
        .available(actor.user_id)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}
