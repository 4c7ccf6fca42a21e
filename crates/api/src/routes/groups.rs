//! Approval group routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use serde::Deserialize;

use leavedesk_db::GroupRepository;
use leavedesk_db::entities::{groups, users};
use leavedesk_shared::types::{GroupId, UserId};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the group routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{group_id}", patch(rename_group))
        .route(
            "/groups/{group_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            delete(remove_member),
        )
}

/// Request body for creating or renaming a group.
#[derive(Debug, Deserialize)]
pub struct GroupNameRequest {
    /// Group name.
    pub name: String,
}

/// Request body for adding a member.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add.
    pub user_id: UserId,
}

/// GET /groups - The organization's groups, by name.
async fn list_groups(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<groups::Model>>> {
    let groups = GroupRepository::new((*state.db).clone())
        .list(actor.organization_id)
        .await?;
    Ok(Json(groups))
}

/// POST /groups
async fn create_group(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<GroupNameRequest>,
) -> ApiResult<(StatusCode, Json<groups::Model>)> {
    let group = GroupRepository::new((*state.db).clone())
        .create(&actor, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// PATCH `/groups/{group_id}`
async fn rename_group(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<GroupNameRequest>,
) -> ApiResult<Json<groups::Model>> {
    let group = GroupRepository::new((*state.db).clone())
        .rename(&actor, group_id, &payload.name)
        .await?;
    Ok(Json(group))
}

/// GET `/groups/{group_id}/members`
async fn list_members(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<users::Model>>> {
    let members = GroupRepository::new((*state.db).clone())
        .members(&actor, group_id)
        .await?;
    Ok(Json(members))
}

/// POST `/groups/{group_id}/members`
async fn add_member(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(group_id): Path<GroupId>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<StatusCode> {
    GroupRepository::new((*state.db).clone())
        .add_member(&actor, group_id, payload.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/groups/{group_id}/members/{user_id}`
async fn remove_member(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
) -> ApiResult<StatusCode> {
    GroupRepository::new((*state.db).clone())
        .remove_member(&actor, group_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
