//! Capability surface the SSO workflows require from the identity broker.
//!
//! Each method is a single remote call with network/authorization failure
//! modes; none of them is transactional with any other. Workflow code depends
//! on this trait rather than a concrete client so tests can script broker
//! behavior call by call.

use async_trait::async_trait;

use crate::error::BrokerResult;
use crate::types::{ClaimDescriptor, CreateProviderRequest, GroupMembership, ProviderHandle};
use veld_core::UserId;

/// Remote operations against the identity broker.
///
/// `realm` is the broker-side tenant namespace for one organization; the
/// broker owns every entity these calls touch.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Register an OIDC provider entry in the realm.
    ///
    /// Must be safe to retry: a provider already registered under the same
    /// realm/name dedupe key is treated as the retried call succeeding, not
    /// as a conflict.
    async fn create_provider(
        &self,
        realm: &str,
        request: &CreateProviderRequest,
    ) -> BrokerResult<ProviderHandle>;

    /// Create a claim mapper binding `claim` to `group_path`.
    ///
    /// Mappers are keyed by (role, group path) on the broker side, so
    /// re-running after a partial provisioning failure creates no duplicates.
    async fn create_claim_mapper(
        &self,
        realm: &str,
        mapper_key: &str,
        claim: &ClaimDescriptor,
        group_path: &str,
    ) -> BrokerResult<()>;

    /// List all users in the realm who authenticated through the SSO provider.
    async fn list_sso_users(&self, realm: &str) -> BrokerResult<Vec<UserId>>;

    /// List a user's group memberships.
    async fn list_user_groups(
        &self,
        realm: &str,
        user: UserId,
    ) -> BrokerResult<Vec<GroupMembership>>;

    /// Remove a user from a group.
    async fn remove_user_from_group(
        &self,
        realm: &str,
        user: UserId,
        group_id: &str,
    ) -> BrokerResult<()>;

    /// Force-logout all of a user's sessions.
    async fn logout_user(&self, realm: &str, user: UserId) -> BrokerResult<()>;

    /// Delete the realm's OIDC provider entry.
    ///
    /// Deleting a provider that is already gone is a success (idempotent
    /// delete), so an interrupted teardown can be re-run.
    async fn delete_provider(&self, realm: &str) -> BrokerResult<()>;
}
