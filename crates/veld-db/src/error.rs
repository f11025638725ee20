//! Error types for the integration record store.

use thiserror::Error;
use veld_core::OrgId;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the integration record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The organization already has an active SSO integration.
    ///
    /// At most one integration exists per organization; callers must tear
    /// down the existing one before provisioning another.
    #[error("organization {org_id} already has an SSO integration")]
    DuplicateIntegration { org_id: OrgId },

    /// A database query failed.
    #[error("query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether this error is the uniqueness-invariant violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateIntegration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_display_names_the_organization() {
        let org_id = OrgId::new();
        let err = StoreError::DuplicateIntegration { org_id };
        assert!(err.to_string().contains(&org_id.to_string()));
        assert!(err.is_duplicate());
    }

    #[test]
    fn query_failure_is_not_duplicate() {
        let err = StoreError::QueryFailed(sqlx::Error::RowNotFound);
        assert!(!err.is_duplicate());
    }
}
