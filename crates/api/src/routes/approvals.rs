//! Approval queue route.

use axum::{Json, Router, extract::State, routing::get};

use leavedesk_db::{ApprovalRepository, PendingApproval};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/approvals", get(list_pending))
}

/// GET /approvals - Pending requests the caller may decide, oldest first.
async fn list_pending(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<PendingApproval>>> {
    let pending = ApprovalRepository::new((*state.db).clone())
        .pending_for(&actor, state.visibility())
        .await?;
    Ok(Json(pending))
}
