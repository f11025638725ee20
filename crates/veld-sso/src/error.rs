//! Workflow error types.
//!
//! There is no transaction spanning the identity broker and the record
//! store, so a workflow that fails partway leaves the two systems divergent.
//! Every error therefore names the step reached, which is what makes the
//! divergence diagnosable from the caller side.

use thiserror::Error;

use crate::roles::InvalidRoleError;
use veld_broker::BrokerError;
use veld_core::{OrgId, UserId};
use veld_db::StoreError;

/// Steps of the provisioning workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// Register the OIDC provider on the broker.
    RegisterProvider,
    /// Insert the local integration record.
    InsertRecord,
    /// Create the role claim mappers.
    CreateMappers,
    /// Promote the record to active.
    Activate,
}

impl std::fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionStep::RegisterProvider => write!(f, "register-provider"),
            ProvisionStep::InsertRecord => write!(f, "insert-record"),
            ProvisionStep::CreateMappers => write!(f, "create-mappers"),
            ProvisionStep::Activate => write!(f, "activate"),
        }
    }
}

/// Steps of the deprovisioning workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Mark the local record as tearing down.
    MarkTearingDown,
    /// List SSO-authenticated users.
    ListUsers,
    /// Per-user group removal and logout.
    UserCleanup,
    /// Delete the broker-side provider.
    DeleteProvider,
    /// Delete the local record.
    DeleteRecord,
}

impl std::fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownStep::MarkTearingDown => write!(f, "mark-tearing-down"),
            TeardownStep::ListUsers => write!(f, "list-users"),
            TeardownStep::UserCleanup => write!(f, "user-cleanup"),
            TeardownStep::DeleteProvider => write!(f, "delete-provider"),
            TeardownStep::DeleteRecord => write!(f, "delete-record"),
        }
    }
}

/// Failure of the provisioning workflow.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// The discovery endpoint URL has no authority component to derive the
    /// host from. Raised before any mutation.
    #[error("invalid discovery endpoint '{url}': no host component")]
    InvalidDiscoveryEndpoint { url: String },

    /// A mapping entry named an unknown role. Mappers created for earlier
    /// valid entries remain in place.
    #[error("{source} ({mappers_created} mapper(s) created before the failure)")]
    InvalidRole {
        mappers_created: usize,
        #[source]
        source: InvalidRoleError,
    },

    /// The organization already has an integration record.
    #[error("organization {org_id} already has an SSO integration")]
    DuplicateIntegration { org_id: OrgId },

    /// A broker call failed terminally (or exhausted retries) at `step`.
    #[error("broker call failed at step {step} ({mappers_created} mapper(s) created): {source}")]
    Broker {
        step: ProvisionStep,
        mappers_created: usize,
        #[source]
        source: BrokerError,
    },

    /// The record store failed at `step`. If this happens after
    /// `register-provider`, the broker-side client exists without a local
    /// record — a reportable inconsistency, not auto-rolled-back.
    #[error("record store failed at step {step}: {source}")]
    Store {
        step: ProvisionStep,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the workflow before `step` started.
    #[error("provisioning cancelled before step {step}")]
    Cancelled { step: ProvisionStep },
}

/// One user whose teardown cleanup failed.
#[derive(Debug)]
pub struct UserCleanupFailure {
    /// The affected user.
    pub user: UserId,
    /// The broker error that stopped this user's cleanup.
    pub error: BrokerError,
}

fn format_failed_users(failures: &[UserCleanupFailure]) -> String {
    failures
        .iter()
        .map(|f| f.user.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of the deprovisioning workflow.
#[derive(Debug, Error)]
pub enum DeprovisioningError {
    /// One or more users failed cleanup. Already-cleaned users stay cleaned
    /// (no compensation); the provider and the local record were NOT deleted.
    #[error(
        "per-user cleanup failed for {} user(s) [{}]; provider and record were not deleted",
        .failures.len(),
        format_failed_users(.failures)
    )]
    PartialTeardown { failures: Vec<UserCleanupFailure> },

    /// A broker call failed terminally (or exhausted retries) at `step`.
    #[error("broker call failed at step {step}: {source}")]
    Broker {
        step: TeardownStep,
        #[source]
        source: BrokerError,
    },

    /// The record store failed at `step`.
    #[error("record store failed at step {step}: {source}")]
    Store {
        step: TeardownStep,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the workflow before `step` started.
    #[error("deprovisioning cancelled before step {step}")]
    Cancelled { step: TeardownStep },
}

impl DeprovisioningError {
    /// User ids whose cleanup failed, if this is a partial teardown.
    #[must_use]
    pub fn failed_users(&self) -> Vec<UserId> {
        match self {
            DeprovisioningError::PartialTeardown { failures } => {
                failures.iter().map(|f| f.user).collect()
            }
            _ => Vec::new(),
        }
    }
}
