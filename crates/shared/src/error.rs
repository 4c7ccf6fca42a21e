//! Error classification shared by the domain errors.

use serde::Serialize;

/// Coarse classification shared by every domain error.
///
/// Validation failures are recovered locally and never partially applied,
/// data-store failures are propagated without retry, and consistency
/// failures are blocking precondition failures (e.g. settlement already ran).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed a business rule.
    Validation,
    /// The caller is not allowed to perform the operation.
    Access,
    /// A call to the data store failed.
    DataStore,
    /// A gate or guard tripped (idempotency, concurrent modification).
    Consistency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::DataStore).unwrap(),
            "\"data_store\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::Consistency).unwrap(),
            "\"consistency\""
        );
    }
}
