//! Leave archive route.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Datelike;
use serde::Deserialize;

use leavedesk_core::access::Capability;
use leavedesk_db::{ArchiveEntry, ArchiveRepository};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the archive routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/archives", get(list_archives))
}

/// Query parameters for listing archives.
#[derive(Debug, Default, Deserialize)]
pub struct ListArchivesQuery {
    /// Settled year; defaults to the previous year.
    pub year: Option<i32>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

/// GET /archives - Settlement archive rows of the organization.
async fn list_archives(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListArchivesQuery>,
) -> ApiResult<Json<Vec<ArchiveEntry>>> {
    actor.require(Capability::ViewAllLeaves)?;
    let year = query.year.unwrap_or_else(|| state.today().year() - 1);
    let entries = ArchiveRepository::new((*state.db).clone())
        .list(actor.organization_id, year, query.search.as_deref())
        .await?;
    Ok(Json(entries))
}
