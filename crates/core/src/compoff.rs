//! Comp-off grant tracking.
//!
//! A grant awards `days` to each recipient through one row per recipient.
//! Available balance is always recomputed from those rows: the sum of what
//! is left unconsumed. Approving a `COMP_OFF` leave consumes grants oldest
//! first, partially if a grant is larger than what is still needed.

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_shared::error::ErrorKind;
use leavedesk_shared::types::{CompOffId, Days, UserCompOffId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::AccessDenied;

/// Errors that can occur while granting, revoking or consuming comp-offs.
#[derive(Debug, Error)]
pub enum CompOffError {
    /// Grant without recipients.
    #[error("Select at least one recipient")]
    NoRecipients,

    /// Grant of zero or negative days.
    #[error("Comp-off days must be greater than zero (got {0})")]
    NonPositiveDays(Days),

    /// Grant without a title.
    #[error("A title is required")]
    TitleRequired,

    /// Recipient row not found.
    #[error("Comp-off grant {0} not found")]
    GrantNotFound(UserCompOffId),

    /// Recipient row already (partly) spent by a leave.
    #[error("Comp-off grant {0} has already been used and cannot be revoked")]
    AlreadyConsumed(UserCompOffId),

    /// Recipient is unknown or belongs to another organization.
    #[error("User {0} is not a member of this organization")]
    UnknownRecipient(UserId),

    /// Caller may not manage comp-offs.
    #[error(transparent)]
    NotPermitted(#[from] AccessDenied),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CompOffError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NoRecipients
            | Self::NonPositiveDays(_)
            | Self::TitleRequired
            | Self::UnknownRecipient(_) => 400,
            Self::NotPermitted(_) => 403,
            Self::GrantNotFound(_) => 404,
            Self::AlreadyConsumed(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::NonPositiveDays(_) => "INVALID_DAYS",
            Self::TitleRequired => "TITLE_REQUIRED",
            Self::GrantNotFound(_) => "GRANT_NOT_FOUND",
            Self::AlreadyConsumed(_) => "GRANT_ALREADY_CONSUMED",
            Self::UnknownRecipient(_) => "UNKNOWN_RECIPIENT",
            Self::NotPermitted(_) => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotPermitted(_) => ErrorKind::Access,
            Self::AlreadyConsumed(_) => ErrorKind::Consistency,
            Self::Database(_) => ErrorKind::DataStore,
            _ => ErrorKind::Validation,
        }
    }
}

/// One recipient's share of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantSlice {
    /// Recipient row id.
    pub id: UserCompOffId,
    /// Grant record.
    pub comp_off_id: CompOffId,
    /// Days awarded.
    pub days: Days,
    /// Days already consumed by leaves.
    pub consumed_days: Days,
    /// Award time; consumption order.
    pub granted_at: DateTime<Utc>,
}

impl GrantSlice {
    /// Days still available on this slice.
    #[must_use]
    pub fn remaining(&self) -> Days {
        self.days.saturating_sub(self.consumed_days)
    }

    /// Returns true once nothing is left.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        !self.remaining().is_positive()
    }
}

/// Sum of what is left across all slices.
#[must_use]
pub fn available_balance(grants: &[GrantSlice]) -> Days {
    grants.iter().map(GrantSlice::remaining).sum()
}

/// Days taken from one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionTake {
    /// Recipient row.
    pub user_comp_off_id: UserCompOffId,
    /// Days taken.
    pub days: Days,
    /// True if the slice has nothing left afterwards.
    pub exhausts: bool,
}

/// Which slices a leave consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsumptionPlan {
    /// Takes, oldest grant first.
    pub takes: Vec<ConsumptionTake>,
    /// Total consumed.
    pub consumed: Days,
    /// Requested days that no grant could cover.
    pub shortfall: Days,
}

/// Plans FIFO consumption of `days`.
///
/// `grants` must be ordered oldest first. Exhausted slices are skipped. If
/// the grants do not cover `days`, everything available is consumed and the
/// rest is reported as `shortfall`.
#[must_use]
pub fn plan_consumption(grants: &[GrantSlice], days: Days) -> ConsumptionPlan {
    let mut still_needed = days.non_negative();
    let mut plan = ConsumptionPlan::default();

    for grant in grants {
        if !still_needed.is_positive() {
            break;
        }
        let remaining = grant.remaining();
        if !remaining.is_positive() {
            continue;
        }
        let take = remaining.min(still_needed);
        still_needed = still_needed.saturating_sub(take);
        plan.consumed += take;
        plan.takes.push(ConsumptionTake {
            user_comp_off_id: grant.id,
            days: take,
            exhausts: take == remaining,
        });
    }

    plan.shortfall = still_needed;
    plan
}

/// Checks that a recipient row can be revoked.
///
/// # Errors
///
/// Returns `AlreadyConsumed` if any part of it was spent.
pub fn check_revocable(grant: &GrantSlice) -> Result<(), CompOffError> {
    if grant.consumed_days.is_positive() {
        Err(CompOffError::AlreadyConsumed(grant.id))
    } else {
        Ok(())
    }
}

/// Input for a bulk grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantInput {
    /// Short title (e.g. "Release weekend").
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Day the extra work happened.
    #[serde(default)]
    pub work_date: Option<NaiveDate>,
    /// Days awarded to each recipient.
    #[serde(default = "default_grant_days")]
    pub days: Days,
    /// Recipients.
    pub user_ids: Vec<UserId>,
}

fn default_grant_days() -> Days {
    Days::ONE
}

/// A grant that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGrant {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description, `None` if blank.
    pub description: Option<String>,
    /// Work date.
    pub work_date: Option<NaiveDate>,
    /// Days per recipient.
    pub days: Days,
    /// Recipients, duplicates removed, order kept.
    pub recipients: Vec<UserId>,
}

/// Validates a bulk grant.
///
/// # Errors
///
/// - `TitleRequired` if the title is blank
/// - `NonPositiveDays` unless `days > 0`
/// - `NoRecipients` if the recipient list is empty
pub fn validate_grant(input: &GrantInput) -> Result<ValidatedGrant, CompOffError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(CompOffError::TitleRequired);
    }
    if !input.days.is_positive() {
        return Err(CompOffError::NonPositiveDays(input.days));
    }

    let mut recipients = Vec::with_capacity(input.user_ids.len());
    for user_id in &input.user_ids {
        if !recipients.contains(user_id) {
            recipients.push(*user_id);
        }
    }
    if recipients.is_empty() {
        return Err(CompOffError::NoRecipients);
    }

    Ok(ValidatedGrant {
        title: title.to_string(),
        description: input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        work_date: input.work_date,
        days: input.days,
        recipients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn slice(days: Days, consumed: Days, age_days: i64) -> GrantSlice {
        GrantSlice {
            id: UserCompOffId::new(),
            comp_off_id: CompOffId::new(),
            days,
            consumed_days: consumed,
            granted_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_available_balance_counts_unconsumed_only() {
        let grants = [
            slice(Days::ONE, Days::ONE, 30),
            slice(Days::ONE, Days::HALF, 20),
            slice(Days::whole(2), Days::ZERO, 10),
        ];
        assert_eq!(available_balance(&grants).amount(), dec!(2.5));
        assert!(grants[0].is_consumed());
        assert!(!grants[1].is_consumed());
    }

    #[test]
    fn test_plan_consumes_oldest_first() {
        let grants = [
            slice(Days::ONE, Days::ZERO, 30),
            slice(Days::ONE, Days::ZERO, 20),
            slice(Days::ONE, Days::ZERO, 10),
        ];
        let plan = plan_consumption(&grants, Days::new(dec!(1.5)));

        assert_eq!(plan.consumed.amount(), dec!(1.5));
        assert_eq!(plan.shortfall, Days::ZERO);
        assert_eq!(plan.takes.len(), 2);
        assert_eq!(plan.takes[0].user_comp_off_id, grants[0].id);
        assert!(plan.takes[0].exhausts);
        assert_eq!(plan.takes[1].days, Days::HALF);
        assert!(!plan.takes[1].exhausts);
    }

    #[test]
    fn test_plan_skips_exhausted_and_reports_shortfall() {
        let grants = [
            slice(Days::ONE, Days::ONE, 30),
            slice(Days::ONE, Days::HALF, 20),
        ];
        let plan = plan_consumption(&grants, Days::whole(2));
        assert_eq!(plan.takes.len(), 1);
        assert_eq!(plan.consumed, Days::HALF);
        assert_eq!(plan.shortfall.amount(), dec!(1.5));
    }

    #[test]
    fn test_plan_nothing_needed() {
        let grants = [slice(Days::ONE, Days::ZERO, 1)];
        assert_eq!(plan_consumption(&grants, Days::ZERO), ConsumptionPlan::default());
    }

    #[test]
    fn test_check_revocable() {
        assert!(check_revocable(&slice(Days::ONE, Days::ZERO, 1)).is_ok());
        let err = check_revocable(&slice(Days::ONE, Days::HALF, 1)).unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_validate_grant() {
        let a = UserId::new();
        let b = UserId::new();
        let input = GrantInput {
            title: "  Release weekend ".to_string(),
            description: Some("  ".to_string()),
            work_date: None,
            days: Days::ONE,
            user_ids: vec![a, b, a],
        };
        let grant = validate_grant(&input).unwrap();
        assert_eq!(grant.title, "Release weekend");
        assert_eq!(grant.description, None);
        assert_eq!(grant.recipients, vec![a, b]);
    }

    #[test]
    fn test_validate_grant_rejects_bad_input() {
        let base = GrantInput {
            title: "Saturday support".to_string(),
            description: None,
            work_date: None,
            days: Days::ONE,
            user_ids: vec![UserId::new()],
        };
        assert!(matches!(
            validate_grant(&GrantInput {
                user_ids: vec![],
                ..base.clone()
            }),
            Err(CompOffError::NoRecipients)
        ));
        assert!(matches!(
            validate_grant(&GrantInput {
                days: Days::ZERO,
                ..base.clone()
            }),
            Err(CompOffError::NonPositiveDays(_))
        ));
        assert!(matches!(
            validate_grant(&GrantInput {
                title: String::new(),
                ..base
            }),
            Err(CompOffError::TitleRequired)
        ));
    }

    #[test]
    fn test_grant_days_default_to_one() {
        let input: GrantInput =
            serde_json::from_str(r#"{"title":"Holiday shift","user_ids":[]}"#).unwrap();
        assert_eq!(input.days, Days::ONE);
    }
}
