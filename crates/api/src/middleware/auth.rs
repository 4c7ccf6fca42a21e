//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use leavedesk_core::access::Actor;
use leavedesk_core::identity::{AuthIdentity, IdentityError, LoadState, Profile, Session};
use leavedesk_db::UserRepository;
use leavedesk_shared::types::UserId;

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Loads a profile through the cache. Only present profiles are cached.
async fn load_profile(state: &AppState, user_id: UserId) -> Result<Option<Profile>, ApiError> {
    if let Some(profile) = state.profiles.get(&user_id) {
        return Ok(Some(profile));
    }
    let profile = UserRepository::new((*state.db).clone())
        .find_profile(user_id)
        .await?;
    if let Some(profile) = &profile {
        state.profiles.insert(profile.clone());
    }
    Ok(profile)
}

/// Authentication middleware.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Verifies the token with the identity verifier
/// 3. Loads the profile whose id is the token subject
/// 4. Stores the resulting [`Actor`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let session = match token {
        None => Session::anonymous(),
        Some(token) => {
            let claims = match state.verifier.verify(token) {
                Ok(claims) => claims,
                Err(e) => return ApiError::from(e).into_response(),
            };
            let user_id = claims.user_id();
            let profile = match load_profile(&state, user_id).await {
                Ok(profile) => profile,
                Err(e) => return e.into_response(),
            };
            Session {
                identity: LoadState::Present(AuthIdentity {
                    user_id,
                    email: claims.email,
                }),
                profile: LoadState::from_lookup(profile),
            }
        }
    };

    match session.actor() {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Request rejected by authentication");
            ApiError::from(e).into_response()
        }
    }
}

/// Extractor for the authenticated actor.
///
/// ```ignore
/// async fn handler(AuthUser(actor): AuthUser) -> impl IntoResponse {
///     let user_id = actor.user_id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Actor);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| IdentityError::Unauthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
