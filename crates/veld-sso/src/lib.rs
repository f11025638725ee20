//! SSO identity-provider lifecycle workflows.
//!
//! Orchestrates provisioning and deprovisioning of an organization's OIDC
//! provider across two systems that share no transaction: the identity
//! broker (realms, providers, mappers, users, sessions) and the local
//! integration record store. Workflows run their steps in a fixed order and
//! fail with the step name attached; nothing is rolled back automatically.

pub mod deprovision;
pub mod error;
pub mod provision;
pub mod roles;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use deprovision::TeardownConfig;
pub use error::{
    DeprovisioningError, ProvisionStep, ProvisioningError, TeardownStep, UserCleanupFailure,
};
pub use provision::CreateOidcProvider;
pub use roles::{InvalidRoleError, OrgRole, RoleMapping};

use veld_broker::{IdentityBroker, RetryPolicy};
use veld_core::{OrgId, UserId};
use veld_db::IntegrationStore;

/// Entry point for the SSO lifecycle workflows of one deployment.
///
/// Holds the broker client, the record store, and the shared retry policy;
/// one instance serves all organizations.
pub struct SsoLifecycle {
    broker: Arc<dyn IdentityBroker>,
    store: Arc<dyn IntegrationStore>,
    retry: RetryPolicy,
    teardown: TeardownConfig,
}

impl SsoLifecycle {
    /// Build a lifecycle service with default retry and teardown settings.
    pub fn new(broker: Arc<dyn IdentityBroker>, store: Arc<dyn IntegrationStore>) -> Self {
        Self {
            broker,
            store,
            retry: RetryPolicy::default(),
            teardown: TeardownConfig::default(),
        }
    }

    /// Replace the retry policy applied to every broker call.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the teardown fan-out configuration.
    #[must_use]
    pub fn with_teardown_config(mut self, teardown: TeardownConfig) -> Self {
        self.teardown = teardown;
        self
    }

    /// Provision an OIDC provider for an organization.
    ///
    /// Registers the provider in the organization's realm, inserts the local
    /// integration record, creates one claim mapper per role mapping, then
    /// promotes the record to active. `cancel` is honored at step boundaries;
    /// a step already in flight runs to completion.
    pub async fn create_oidc_provider(
        &self,
        org_id: OrgId,
        org_slug: &str,
        input: &CreateOidcProvider,
        cancel: &CancellationToken,
    ) -> Result<(), ProvisioningError> {
        provision::run(
            self.broker.as_ref(),
            self.store.as_ref(),
            &self.retry,
            cancel,
            org_id,
            org_slug,
            input,
        )
        .await
    }

    /// Deprovision an organization's OIDC provider.
    ///
    /// Marks the record as tearing down, cleans up every SSO user except
    /// `creator` (group removal plus forced logout), and deletes the provider
    /// and the record only once all users are clean. `cancel` is honored at
    /// step boundaries.
    pub async fn delete_oidc_provider(
        &self,
        org_id: OrgId,
        org_slug: &str,
        creator: UserId,
        cancel: &CancellationToken,
    ) -> Result<(), DeprovisioningError> {
        deprovision::run(
            Arc::clone(&self.broker),
            self.store.as_ref(),
            &self.retry,
            &self.teardown,
            cancel,
            org_id,
            org_slug,
            creator,
        )
        .await
    }
}
