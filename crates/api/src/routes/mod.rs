//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod approvals;
pub mod archives;
pub mod compoffs;
pub mod dashboard;
pub mod groups;
pub mod health;
pub mod holidays;
pub mod leaves;
pub mod me;
pub mod organizations;
pub mod settings;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(me::routes())
        .merge(leaves::routes())
        .merge(approvals::routes())
        .merge(compoffs::routes())
        .merge(settings::routes())
        .merge(archives::routes())
        .merge(holidays::routes())
        .merge(groups::routes())
        .merge(users::routes())
        .merge(dashboard::routes())
        .merge(organizations::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
    };
    use chrono::Duration;
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    use leavedesk_shared::config::{IdentityConfig, LeavePolicyConfig};
    use leavedesk_shared::identity::IdentityVerifier;
    use leavedesk_shared::types::UserId;

    use crate::{AppState, create_router};

    fn verifier() -> IdentityVerifier {
        IdentityVerifier::new(&IdentityConfig {
            jwt_secret: "test-secret-key-for-testing".to_string(),
            issuer: None,
            audience: None,
            leeway_secs: 0,
        })
    }

    /// State without a database; only routes that never reach it are tested.
    fn state() -> AppState {
        AppState::new(
            DatabaseConnection::Disconnected,
            verifier(),
            LeavePolicyConfig::default(),
            chrono_tz::UTC,
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/leaves")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_malformed_token_is_unauthorized() {
        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/settlement/run")
                    .header(AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let token = verifier()
            .issue(UserId::new(), None, Duration::minutes(-10))
            .unwrap();

        let response = create_router(state())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/approvals")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "TOKEN_EXPIRED");
    }
}
