//! Verification of bearer tokens issued by the external identity provider.
//!
//! Sign-in and session handling belong to the provider. This service only
//! checks the signature and standard claims of the tokens it hands out and
//! reads the subject, which is also the primary key of the user profile.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::types::UserId;

/// Claims carried by an identity-provider access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (identity id, equal to the profile's user id).
    pub sub: Uuid,
    /// Email address of the identity, when the provider includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issued at timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl IdentityClaims {
    /// Returns the profile id this identity maps to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}

/// Errors that can occur while verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityTokenError {
    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is malformed, badly signed, or has unexpected claims.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Verifies (and, for tests and local development, issues) identity tokens.
#[derive(Clone)]
pub struct IdentityVerifier {
    issuer: Option<String>,
    audience: Option<String>,
    validation: Validation,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl IdentityVerifier {
    /// Creates a verifier from configuration.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            validation,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityTokenError::Expired` if the token has expired.
    /// Returns `IdentityTokenError::Invalid` for anything else.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, IdentityTokenError> {
        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityTokenError::Expired,
                _ => IdentityTokenError::Invalid(e.to_string()),
            })
    }

    /// Issues a token the way the identity provider would.
    ///
    /// Only used by tests and local development tooling.
    ///
    /// # Errors
    ///
    /// Returns `IdentityTokenError::Invalid` if encoding fails.
    pub fn issue(
        &self,
        user_id: UserId,
        email: Option<&str>,
        ttl: Duration,
    ) -> Result<String, IdentityTokenError> {
        let now = Utc::now();
        let claims = IdentityClaims {
            sub: user_id.into_inner(),
            email: email.map(str::to_string),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityTokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig {
            jwt_secret: "test-secret-key-for-testing".to_string(),
            issuer: None,
            audience: None,
            leeway_secs: 0,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let verifier = IdentityVerifier::new(&config());
        let user_id = UserId::new();

        let token = verifier
            .issue(user_id, Some("a@example.com"), Duration::minutes(5))
            .unwrap();
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_expired_token() {
        let verifier = IdentityVerifier::new(&config());
        let token = verifier
            .issue(UserId::new(), None, Duration::minutes(-10))
            .unwrap();

        assert_eq!(verifier.verify(&token), Err(IdentityTokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = IdentityVerifier::new(&IdentityConfig {
            jwt_secret: "another-secret".to_string(),
            ..config()
        });
        let token = issuer
            .issue(UserId::new(), None, Duration::minutes(5))
            .unwrap();

        let verifier = IdentityVerifier::new(&config());
        assert!(matches!(
            verifier.verify(&token),
            Err(IdentityTokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_issuer_and_audience_are_checked() {
        let strict = IdentityConfig {
            issuer: Some("https://id.example.com".to_string()),
            audience: Some("authenticated".to_string()),
            ..config()
        };
        let verifier = IdentityVerifier::new(&strict);
        let good = verifier
            .issue(UserId::new(), None, Duration::minutes(5))
            .unwrap();
        assert!(verifier.verify(&good).is_ok());

        let foreign = IdentityVerifier::new(&IdentityConfig {
            issuer: Some("https://other.example.com".to_string()),
            ..strict
        })
        .issue(UserId::new(), None, Duration::minutes(5))
        .unwrap();
        assert!(verifier.verify(&foreign).is_err());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let verifier = IdentityVerifier::new(&config());
        assert!(verifier.verify("invalid.token.here").is_err());
    }
}
