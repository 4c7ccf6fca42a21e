//! Identity and profile load state.
//!
//! The identity provider and the profile store load independently. Each
//! value is either still loading, known to be absent, or present, and
//! nothing may branch on a role until both are present.
//!
//! # Modules
//!
//! - `cache` - Short-lived profile cache

pub mod cache;

use leavedesk_shared::error::ErrorKind;
use leavedesk_shared::types::{OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::{Actor, Role};

pub use cache::ProfileCache;

/// Three-valued load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    /// Not known yet.
    Loading,
    /// Known not to exist.
    Absent,
    /// Loaded.
    Present(T),
}

impl<T> LoadState<T> {
    /// Converts a completed lookup into a load state.
    pub fn from_lookup(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }

    /// Returns true while the value is still loading.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the value if present.
    #[must_use]
    pub const fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Loading | Self::Absent => None,
        }
    }
}

/// An authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Identity subject (equal to the profile id).
    pub user_id: UserId,
    /// Email, when the provider supplies it.
    pub email: Option<String>,
}

/// A user profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile id.
    pub user_id: UserId,
    /// Organization.
    pub organization_id: OrganizationId,
    /// Role.
    pub role: Role,
    /// Email.
    pub email: String,
    /// Display name.
    pub full_name: Option<String>,
}

/// Why a session could not produce an [`Actor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Identity or profile is still loading.
    #[error("identity is still loading")]
    NotReady,

    /// No authenticated identity.
    #[error("not authenticated")]
    Unauthenticated,

    /// Authenticated, but no profile row exists for the subject.
    #[error("no profile exists for the authenticated identity")]
    ProfileMissing,
}

impl IdentityError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotReady => 503,
            Self::Unauthenticated => 401,
            Self::ProfileMissing => 403,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotReady => "IDENTITY_NOT_READY",
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::ProfileMissing => "PROFILE_MISSING",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Access
    }
}

/// The pair of independently loaded values for one caller.
#[derive(Debug, Clone)]
pub struct Session {
    /// Authenticated identity.
    pub identity: LoadState<AuthIdentity>,
    /// Profile of that identity.
    pub profile: LoadState<Profile>,
}

impl Session {
    /// A session with nothing loaded yet.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            identity: LoadState::Loading,
            profile: LoadState::Loading,
        }
    }

    /// A session for a caller that presented no valid credentials.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            identity: LoadState::Absent,
            profile: LoadState::Absent,
        }
    }

    /// Resolves the acting user.
    ///
    /// # Errors
    ///
    /// - `NotReady` if either value is still loading
    /// - `Unauthenticated` if there is no identity
    /// - `ProfileMissing` if there is no profile for the identity
    pub fn actor(&self) -> Result<Actor, IdentityError> {
        match (&self.identity, &self.profile) {
            (LoadState::Loading, _) | (_, LoadState::Loading) => Err(IdentityError::NotReady),
            (LoadState::Absent, _) => Err(IdentityError::Unauthenticated),
            (LoadState::Present(_), LoadState::Absent) => Err(IdentityError::ProfileMissing),
            (LoadState::Present(identity), LoadState::Present(profile)) => {
                if identity.user_id != profile.user_id {
                    return Err(IdentityError::ProfileMissing);
                }
                Ok(Actor {
                    user_id: profile.user_id,
                    organization_id: profile.organization_id,
                    role: profile.role,
                })
            }
        }
    }
}
