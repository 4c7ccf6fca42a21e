//! Leave request routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use leavedesk_core::leave::{ApplyLeaveInput, EditOptions, LeaveStatus};
use leavedesk_db::entities::leaves;
use leavedesk_db::{LeaveFilter, LeaveRepository};
use leavedesk_shared::types::{LeaveId, OrganizationId, PageRequest, UserId};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the leave routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leaves", get(list_leaves).post(apply_leave))
        .route(
            "/leaves/{leave_id}",
            get(get_leave).patch(edit_leave).delete(delete_leave),
        )
        .route("/leaves/{leave_id}/approve", post(approve_leave))
        .route("/leaves/{leave_id}/reject", post(reject_leave))
        .route("/leaves/{leave_id}/cancel", post(cancel_leave))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing leaves.
///
/// Without `all` the caller's own requests are returned, newest first.
/// With `all=true` the organization's requests are paged and filtered.
#[derive(Debug, Default, Deserialize)]
pub struct ListLeavesQuery {
    /// List the whole organization.
    #[serde(default)]
    pub all: bool,
    /// Organization to list (cross-organization administrators only).
    pub organization_id: Option<OrganizationId>,
    /// Filter by status.
    pub status: Option<LeaveStatus>,
    /// Filter by requester.
    pub user_id: Option<UserId>,
    /// Include archived requests.
    #[serde(default)]
    pub include_archived: bool,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for editing a request.
#[derive(Debug, Deserialize)]
pub struct EditLeaveRequest {
    /// The new content.
    #[serde(flatten)]
    pub input: ApplyLeaveInput,
    /// Keep an approved request approved (administrators only).
    #[serde(default)]
    pub keep_approved: bool,
}

/// Request body for rejecting a request.
#[derive(Debug, Default, Deserialize)]
pub struct RejectLeaveRequest {
    /// Reason shown to the requester.
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /leaves - The caller's requests, or the organization's with `all`.
async fn list_leaves(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListLeavesQuery>,
) -> ApiResult<Response> {
    let repo = LeaveRepository::new((*state.db).clone());

    if !query.all {
        let own = repo.list_for_user(actor.user_id).await?;
        return Ok(Json(own).into_response());
    }

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = LeaveFilter {
        status: query.status,
        user_id: query.user_id,
        include_archived: query.include_archived,
    };
    let organization_id = query.organization_id.unwrap_or(actor.organization_id);
    let listed = repo.list(&actor, organization_id, &filter, &page).await?;
    Ok(Json(listed).into_response())
}

/// POST /leaves - Apply for leave.
async fn apply_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<ApplyLeaveInput>,
) -> ApiResult<(StatusCode, Json<leaves::Model>)> {
    let leave = LeaveRepository::new((*state.db).clone())
        .apply(&actor, &input, state.today())
        .await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

/// GET `/leaves/{leave_id}` - One request.
async fn get_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
) -> ApiResult<Json<leaves::Model>> {
    let leave = LeaveRepository::new((*state.db).clone())
        .find(&actor, leave_id)
        .await?;
    Ok(Json(leave))
}

/// PATCH `/leaves/{leave_id}` - Edit a pending or approved request.
async fn edit_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
    Json(payload): Json<EditLeaveRequest>,
) -> ApiResult<Json<leaves::Model>> {
    let options = EditOptions {
        keep_approved: payload.keep_approved,
    };
    let leave = LeaveRepository::new((*state.db).clone())
        .edit(&actor, leave_id, &payload.input, options, state.today())
        .await?;
    Ok(Json(leave))
}

/// DELETE `/leaves/{leave_id}` - Hard delete (administrators).
async fn delete_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
) -> ApiResult<StatusCode> {
    LeaveRepository::new((*state.db).clone())
        .delete(&actor, leave_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/leaves/{leave_id}/approve`
async fn approve_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
) -> ApiResult<Json<leaves::Model>> {
    let leave = LeaveRepository::new((*state.db).clone())
        .approve(&actor, state.visibility(), leave_id)
        .await?;
    Ok(Json(leave))
}

/// POST `/leaves/{leave_id}/reject` - The body may be omitted.
async fn reject_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
    payload: Option<Json<RejectLeaveRequest>>,
) -> ApiResult<Json<leaves::Model>> {
    let reason = payload.and_then(|Json(payload)| payload.reason);
    let leave = LeaveRepository::new((*state.db).clone())
        .reject(&actor, state.visibility(), leave_id, reason.as_deref())
        .await?;
    Ok(Json(leave))
}

/// POST `/leaves/{leave_id}/cancel`
async fn cancel_leave(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(leave_id): Path<LeaveId>,
) -> ApiResult<Json<leaves::Model>> {
    let leave = LeaveRepository::new((*state.db).clone())
        .cancel(&actor, leave_id)
        .await?;
    Ok(Json(leave))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header::CONTENT_TYPE},
    };

    use super::*;

    #[test]
    fn test_edit_request_flattens_leave_input() {
        let payload: EditLeaveRequest = serde_json::from_str(
            r#"{
                "leave_type": "CASUAL",
                "duration": "FULL_DAY",
                "start_date": "2026-03-02",
                "reason": "Moving house",
                "keep_approved": true
            }"#,
        )
        .unwrap();
        assert!(payload.keep_approved);
        assert_eq!(payload.input.reason, "Moving house");
    }

    #[test]
    fn test_reject_reason_is_optional() {
        let payload: RejectLeaveRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.reason, None);
    }

    #[tokio::test]
    async fn test_reject_body_may_be_omitted() {
        let request = Request::builder()
            .method("POST")
            .uri("/leaves/0/reject")
            .body(Body::empty())
            .unwrap();

        let payload = Option::<Json<RejectLeaveRequest>>::from_request(request, &())
            .await
            .unwrap();
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_reject_body_carries_reason() {
        let request = Request::builder()
            .method("POST")
            .uri("/leaves/0/reject")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"reason":"Release week"}"#))
            .unwrap();

        let Some(Json(payload)) = Option::<Json<RejectLeaveRequest>>::from_request(request, &())
            .await
            .unwrap()
        else {
            panic!("expected a body");
        };
        assert_eq!(payload.reason.as_deref(), Some("Release week"));
    }
}
