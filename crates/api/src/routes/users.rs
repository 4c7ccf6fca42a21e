//! User profile administration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};

use leavedesk_core::access::Capability;
use leavedesk_db::entities::users;
use leavedesk_db::{RegisterUserInput, UpdateUserInput, UserRepository};
use leavedesk_shared::types::UserId;

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register_user))
        .route("/users/{user_id}", patch(update_user))
}

/// GET /users - The organization's users, newest first.
async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<users::Model>>> {
    // Comp-off granters pick recipients from this list.
    if !actor.can(Capability::GrantCompOff) {
        actor.require(Capability::ViewAllLeaves)?;
    }
    let users = UserRepository::new((*state.db).clone())
        .list(actor.organization_id)
        .await?;
    Ok(Json(users))
}

/// POST /users - Register the profile of an existing identity.
async fn register_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<RegisterUserInput>,
) -> ApiResult<(StatusCode, Json<users::Model>)> {
    let user = UserRepository::new((*state.db).clone())
        .register(&actor, input, state.fallback_policy(), state.today())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH `/users/{user_id}` - Update role, designation or name.
async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<UserId>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<Json<users::Model>> {
    let user = UserRepository::new((*state.db).clone())
        .update(&actor, user_id, input)
        .await?;
    state.profiles.invalidate(&user_id);
    Ok(Json(user))
}
