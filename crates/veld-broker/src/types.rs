//! Wire-level types exchanged with the identity broker.

use serde::{Deserialize, Serialize};

/// The token claim key the platform injects group information under.
pub const SSO_GROUPS_CLAIM_KEY: &str = "ssoGroups";

/// A structured claim binding, serialized by the broker client when a claim
/// mapper is created.
///
/// Replaces hand-assembled JSON text with a schema the compiler checks: a
/// mapper binds `key` (always [`SSO_GROUPS_CLAIM_KEY`] today) to the group
/// claim value configured by the organization admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDescriptor {
    /// Claim key to match in incoming tokens.
    pub key: String,
    /// Expected claim value for the mapped group.
    pub value: String,
}

impl ClaimDescriptor {
    /// Descriptor binding the fixed `ssoGroups` key to a configured value.
    #[must_use]
    pub fn sso_groups(value: impl Into<String>) -> Self {
        Self {
            key: SSO_GROUPS_CLAIM_KEY.to_string(),
            value: value.into(),
        }
    }
}

/// Input for registering an OIDC provider on the broker.
#[derive(Debug, Clone)]
pub struct CreateProviderRequest {
    /// Display name chosen by the organization admin.
    pub name: String,
    /// OIDC client id issued by the external IdP.
    pub client_id: String,
    /// OIDC client secret issued by the external IdP.
    pub client_secret: String,
    /// Full discovery endpoint URL of the external IdP.
    pub discovery_endpoint: String,
}

/// Handle to a provider registered on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHandle {
    /// Broker-side alias the provider is addressed by.
    pub alias: String,
}

/// A user's membership in one broker-side group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Broker-side group id (opaque; the broker owns the id space).
    pub id: String,
    /// Slash-delimited hierarchical group path, e.g. `/acme/admin`.
    pub path: String,
}
