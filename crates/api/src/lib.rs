//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer-token authentication middleware
//! - Mapping of domain errors to JSON responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use leavedesk_core::identity::ProfileCache;
use leavedesk_core::leave::local_today;
use leavedesk_core::settlement::{RolloverPolicy, SettlementWindow};
use leavedesk_shared::config::{ApprovalVisibility, LeavePolicyConfig};
use leavedesk_shared::identity::IdentityVerifier;
use leavedesk_shared::types::Days;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Verifier for identity-provider tokens.
    pub verifier: Arc<IdentityVerifier>,
    /// Short-lived cache of user profiles.
    pub profiles: ProfileCache,
    /// Leave policy configuration.
    pub policy: Arc<LeavePolicyConfig>,
    /// Timezone "today" is computed in.
    pub tz: Tz,
}

impl AppState {
    /// Creates the state.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        verifier: IdentityVerifier,
        policy: LeavePolicyConfig,
        tz: Tz,
    ) -> Self {
        Self {
            db: Arc::new(db),
            verifier: Arc::new(verifier),
            profiles: ProfileCache::new(),
            policy: Arc::new(policy),
            tz,
        }
    }

    /// Today's date in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        local_today(Utc::now(), &self.tz)
    }

    /// Rollover template for organizations that never saved settings.
    #[must_use]
    pub fn fallback_policy(&self) -> RolloverPolicy {
        RolloverPolicy {
            default_casual: Days::whole(i64::from(self.policy.default_casual_leaves)),
            default_medical: Days::whole(i64::from(self.policy.default_medical_leaves)),
            carry_forward: false,
        }
    }

    /// Settlement window.
    #[must_use]
    pub fn settlement_window(&self) -> SettlementWindow {
        SettlementWindow::new(self.policy.settlement_window_days)
    }

    /// Approval queue visibility for full approvers.
    #[must_use]
    pub fn visibility(&self) -> ApprovalVisibility {
        self.policy.approval_scope
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
