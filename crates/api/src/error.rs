//! Mapping of domain errors to JSON responses.
//!
//! Every error body has the shape `{"error": CODE, "message": text}`.
//! Database failures are logged and answered with a generic message.

use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use leavedesk_core::access::AccessDenied;
use leavedesk_core::compoff::CompOffError;
use leavedesk_core::identity::IdentityError;
use leavedesk_core::leave::LeaveError;
use leavedesk_core::settlement::SettlementError;
use leavedesk_db::{
    DashboardError, GroupError, HolidayError, OrganizationError, SettingsError, UserError,
};
use leavedesk_shared::identity::IdentityTokenError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status.
    pub status: StatusCode,
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Creates an error response.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Logs `e` and hides it behind a generic 500.
    pub fn internal(e: impl Display) -> Self {
        error!(error = %e, "Request failed with an internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    /// 400 with a custom code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 404 with a custom code.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    fn domain(status: u16, code: &'static str, message: String) -> Self {
        if status >= 500 {
            return Self::internal(message);
        }
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::internal(e)
    }
}

impl From<AccessDenied> for ApiError {
    fn from(e: AccessDenied) -> Self {
        Self::domain(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        if e.status_code() == 503 {
            return Self::new(StatusCode::SERVICE_UNAVAILABLE, e.error_code(), e.to_string());
        }
        Self::domain(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<IdentityTokenError> for ApiError {
    fn from(e: IdentityTokenError) -> Self {
        match e {
            IdentityTokenError::Expired => Self::new(
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token has expired",
            ),
            IdentityTokenError::Invalid(_) => Self::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or malformed token",
            ),
        }
    }
}

impl From<LeaveError> for ApiError {
    fn from(e: LeaveError) -> Self {
        Self::domain(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<CompOffError> for ApiError {
    fn from(e: CompOffError) -> Self {
        Self::domain(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        Self::domain(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::ConfirmationRequired => {
                Self::bad_request("CONFIRMATION_REQUIRED", e.to_string())
            }
            SettingsError::NegativeAllotment => {
                Self::bad_request("NEGATIVE_ALLOTMENT", e.to_string())
            }
            SettingsError::NotPermitted(denied) => denied.into(),
            SettingsError::Database(db) => db.into(),
        }
    }
}

impl From<HolidayError> for ApiError {
    fn from(e: HolidayError) -> Self {
        match e {
            HolidayError::NameRequired => Self::bad_request("NAME_REQUIRED", e.to_string()),
            HolidayError::NotFound(_) => Self::not_found("HOLIDAY_NOT_FOUND", e.to_string()),
            HolidayError::NotPermitted(denied) => denied.into(),
            HolidayError::Database(db) => db.into(),
        }
    }
}

impl From<GroupError> for ApiError {
    fn from(e: GroupError) -> Self {
        match e {
            GroupError::NameRequired => Self::bad_request("NAME_REQUIRED", e.to_string()),
            GroupError::NotFound(_) => Self::not_found("GROUP_NOT_FOUND", e.to_string()),
            GroupError::UserNotInOrganization(_) => {
                Self::bad_request("UNKNOWN_USER", e.to_string())
            }
            GroupError::NotPermitted(denied) => denied.into(),
            GroupError::Database(db) => db.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::EmailRequired => Self::bad_request("EMAIL_REQUIRED", e.to_string()),
            UserError::AlreadyRegistered(_) => {
                Self::new(StatusCode::CONFLICT, "ALREADY_REGISTERED", e.to_string())
            }
            UserError::NotFound(_) => Self::not_found("USER_NOT_FOUND", e.to_string()),
            UserError::OrganizationNotFound(_) => {
                Self::not_found("ORGANIZATION_NOT_FOUND", e.to_string())
            }
            UserError::NotPermitted(denied) => denied.into(),
            UserError::Database(db) => db.into(),
        }
    }
}

impl From<OrganizationError> for ApiError {
    fn from(e: OrganizationError) -> Self {
        match e {
            OrganizationError::NameRequired => Self::bad_request("NAME_REQUIRED", e.to_string()),
            OrganizationError::NotFound(_) => {
                Self::not_found("ORGANIZATION_NOT_FOUND", e.to_string())
            }
            OrganizationError::NotPermitted(denied) => denied.into(),
            OrganizationError::Database(db) => db.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::UserNotFound(_) => Self::not_found("USER_NOT_FOUND", e.to_string()),
            DashboardError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavedesk_core::access::{Capability, Role};
    use leavedesk_shared::types::LeaveId;

    #[test]
    fn test_leave_errors_keep_domain_status() {
        let archived: ApiError = LeaveError::Archived.into();
        assert_eq!(archived.status, StatusCode::CONFLICT);
        assert_eq!(archived.code, "LEAVE_ARCHIVED");

        let missing: ApiError = LeaveError::NotFound(LeaveId::new()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_errors_are_hidden() {
        let err: ApiError = LeaveError::Database("connection reset".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "INTERNAL_ERROR");
        assert!(!err.message.contains("connection reset"));
    }

    #[test]
    fn test_access_denied_is_forbidden() {
        let err: ApiError = SettingsError::NotPermitted(AccessDenied {
            role: Role::User,
            capability: Capability::ManageOrg,
        })
        .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "FORBIDDEN");
    }

    #[test]
    fn test_identity_errors() {
        let missing: ApiError = IdentityError::ProfileMissing.into();
        assert_eq!(missing.status, StatusCode::FORBIDDEN);
        assert_eq!(missing.code, "PROFILE_MISSING");

        let expired: ApiError = IdentityTokenError::Expired.into();
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired.code, "TOKEN_EXPIRED");

        let not_ready: ApiError = IdentityError::NotReady.into();
        assert_eq!(not_ready.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
