//! Settlement error types.

use chrono::NaiveDate;
use leavedesk_shared::error::ErrorKind;
use thiserror::Error;

use crate::access::AccessDenied;

/// Errors that block a settlement run before any user is touched.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Not inside the settlement window and not forced.
    #[error("Settlement may only run during the first {window_days} days of January (today is {today}); force the run to override")]
    OutsideWindow {
        /// Today's date.
        today: NaiveDate,
        /// Window length.
        window_days: u32,
    },

    /// An explicit year was given without forcing.
    #[error("Settling an explicit year requires a forced run")]
    ExplicitYearRequiresForce,

    /// The requested year has not ended.
    #[error("Year {year} has not ended yet")]
    YearNotClosed {
        /// Requested year.
        year: i32,
    },

    /// Archive rows already exist for the year.
    #[error("Year-end settlement for {year} has already been processed")]
    AlreadySettled {
        /// Settled year.
        year: i32,
    },

    /// Retry requested for a year that was never settled.
    #[error("Year {year} has not been settled yet; run an initial settlement")]
    NotYetSettled {
        /// Requested year.
        year: i32,
    },

    /// Another run holds the organization/year lock.
    #[error("A settlement run for {year} is already in progress")]
    InProgress {
        /// Year being settled.
        year: i32,
    },

    /// Caller may not run settlement.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::OutsideWindow { .. }
            | Self::ExplicitYearRequiresForce
            | Self::YearNotClosed { .. } => 400,
            Self::NotPermitted(_) => 403,
            Self::AlreadySettled { .. } | Self::NotYetSettled { .. } | Self::InProgress { .. } => {
                409
            }
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OutsideWindow { .. } => "OUTSIDE_SETTLEMENT_WINDOW",
            Self::ExplicitYearRequiresForce => "FORCE_REQUIRED",
            Self::YearNotClosed { .. } => "YEAR_NOT_CLOSED",
            Self::AlreadySettled { .. } => "ALREADY_SETTLED",
            Self::NotYetSettled { .. } => "NOT_YET_SETTLED",
            Self::InProgress { .. } => "SETTLEMENT_IN_PROGRESS",
            Self::NotPermitted(_) => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutsideWindow { .. }
            | Self::ExplicitYearRequiresForce
            | Self::YearNotClosed { .. } => ErrorKind::Validation,
            Self::NotPermitted(_) => ErrorKind::Access,
            Self::AlreadySettled { .. } | Self::NotYetSettled { .. } | Self::InProgress { .. } => {
                ErrorKind::Consistency
            }
            Self::Database(_) => ErrorKind::DataStore,
        }
    }
}
