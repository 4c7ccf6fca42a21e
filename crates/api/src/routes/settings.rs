//! Leave settings and year-end settlement routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::info;

use leavedesk_core::settlement::{SettlementReport, SettlementStatus};
use leavedesk_db::{
    EffectiveSettings, SaveSettingsInput, SettingsRepository, SettlementRepository,
    SettlementRequest,
};

use crate::error::ApiResult;
use crate::{AppState, middleware::AuthUser};

/// Creates the settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(save_settings))
        .route("/settings/bulk-reset", post(bulk_reset))
        .route("/settlement/run", post(run_settlement))
}

/// Request body for a bulk reset.
#[derive(Debug, Default, Deserialize)]
pub struct BulkResetRequest {
    /// Must be true; the reset overwrites every balance.
    #[serde(default)]
    pub confirm: bool,
}

/// Bulk reset response.
#[derive(Debug, Serialize)]
pub struct BulkResetResponse {
    /// Users whose balances were reset.
    pub users_reset: u64,
}

/// Settlement response.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// Overall outcome.
    pub status: SettlementStatus,
    /// Per-run counters and failures.
    #[serde(flatten)]
    pub report: SettlementReport,
}

/// GET /settings - The caller's organization settings.
async fn get_settings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<EffectiveSettings>> {
    let settings = SettingsRepository::new((*state.db).clone())
        .get(
            actor.organization_id,
            state.fallback_policy(),
            state.today().year(),
        )
        .await?;
    Ok(Json(settings))
}

/// PUT /settings - Save default allotments and carry-forward.
async fn save_settings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<SaveSettingsInput>,
) -> ApiResult<Json<EffectiveSettings>> {
    let settings = SettingsRepository::new((*state.db).clone())
        .save(&actor, actor.organization_id, &input, state.today().year())
        .await?;
    Ok(Json(settings))
}

/// POST /settings/bulk-reset - Reset every balance to the defaults.
async fn bulk_reset(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<BulkResetRequest>,
) -> ApiResult<Json<BulkResetResponse>> {
    let users_reset = SettingsRepository::new((*state.db).clone())
        .bulk_reset(
            &actor,
            actor.organization_id,
            state.fallback_policy(),
            state.today().year(),
            payload.confirm,
        )
        .await?;
    Ok(Json(BulkResetResponse { users_reset }))
}

/// POST /settlement/run - Archive last year and roll balances over.
async fn run_settlement(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<SettlementRequest>,
) -> ApiResult<Json<SettlementResponse>> {
    info!(
        user_id = %actor.user_id,
        organization_id = %actor.organization_id,
        force = request.force,
        "Settlement requested"
    );
    let report = SettlementRepository::new((*state.db).clone())
        .run(
            &actor,
            request,
            state.today(),
            state.settlement_window(),
            state.fallback_policy(),
        )
        .await?;
    Ok(Json(SettlementResponse {
        status: report.status(),
        report,
    }))
}
