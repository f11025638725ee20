//! Provisioning workflow.
//!
//! Creates the broker-side OIDC provider, inserts the local integration
//! record, and wires one claim mapper per role mapping, in that fixed order.
//! Nothing is rolled back on failure; the error names the step reached and
//! how many mappers were already created.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::{ProvisionStep, ProvisioningError};
use crate::roles::{mapper_key, OrgRole, RoleMapping};
use veld_broker::{CreateProviderRequest, IdentityBroker, RetryPolicy};
use veld_core::OrgId;
use veld_db::{IntegrationStatus, IntegrationStore, NewSsoIntegration, StoreError};

/// Input for [`crate::SsoLifecycle::create_oidc_provider`].
#[derive(Debug, Clone)]
pub struct CreateOidcProvider {
    /// Provider display name chosen by the organization admin.
    pub name: String,
    /// OIDC client id issued by the external IdP.
    pub client_id: String,
    /// OIDC client secret issued by the external IdP.
    pub client_secret: String,
    /// Full discovery endpoint URL of the external IdP.
    pub discovery_endpoint: String,
    /// Ordered role-to-group claim mappings.
    pub mappings: Vec<RoleMapping>,
}

/// Host component of a discovery URL: the second `/`-separated segment.
///
/// `https://idp.example.com/realms/acme` → `idp.example.com`.
pub(crate) fn discovery_host(url: &str) -> Option<&str> {
    url.split('/').nth(2).filter(|host| !host.is_empty())
}

fn ensure_not_cancelled(
    cancel: &CancellationToken,
    step: ProvisionStep,
) -> Result<(), ProvisioningError> {
    if cancel.is_cancelled() {
        Err(ProvisioningError::Cancelled { step })
    } else {
        Ok(())
    }
}

/// Run the provisioning workflow. The realm is the organization slug.
#[instrument(skip_all, fields(org_id = %org_id, slug = org_slug, provider = %input.name))]
pub(crate) async fn run(
    broker: &dyn IdentityBroker,
    store: &dyn IntegrationStore,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
    org_id: OrgId,
    org_slug: &str,
    input: &CreateOidcProvider,
) -> Result<(), ProvisioningError> {
    // Pure input validation, before any mutation.
    let host = discovery_host(&input.discovery_endpoint).ok_or_else(|| {
        ProvisioningError::InvalidDiscoveryEndpoint {
            url: input.discovery_endpoint.clone(),
        }
    })?;

    // Step 1: register the provider. Keyed by realm alias, so a retried
    // call cannot create a duplicate client.
    ensure_not_cancelled(cancel, ProvisionStep::RegisterProvider)?;
    let request = CreateProviderRequest {
        name: input.name.clone(),
        client_id: input.client_id.clone(),
        client_secret: input.client_secret.clone(),
        discovery_endpoint: input.discovery_endpoint.clone(),
    };
    let handle = retry
        .execute("create_provider", || {
            broker.create_provider(org_slug, &request)
        })
        .await
        .map_err(|source| ProvisioningError::Broker {
            step: ProvisionStep::RegisterProvider,
            mappers_created: 0,
            source,
        })?;
    info!(alias = %handle.alias, "registered broker-side OIDC provider");

    // Step 2: insert the local record. A failure here leaves the broker-side
    // client without a local record; the step name in the error is what
    // makes that divergence diagnosable.
    ensure_not_cancelled(cancel, ProvisionStep::InsertRecord)?;
    store
        .insert(NewSsoIntegration {
            organization_id: *org_id.as_uuid(),
            name: input.name.clone(),
            discovery_host: host.to_string(),
            status: IntegrationStatus::Provisioning,
        })
        .await
        .map_err(|err| match err {
            StoreError::DuplicateIntegration { org_id } => {
                ProvisioningError::DuplicateIntegration { org_id }
            }
            other => ProvisioningError::Store {
                step: ProvisionStep::InsertRecord,
                source: other,
            },
        })?;

    // Step 3: one claim mapper per mapping, in input order. Roles are
    // validated entry by entry; mappers already created stay in place when
    // a later entry fails.
    ensure_not_cancelled(cancel, ProvisionStep::CreateMappers)?;
    let mut mappers_created = 0usize;
    for mapping in &input.mappings {
        let role: OrgRole = mapping
            .role
            .parse()
            .map_err(|source| ProvisioningError::InvalidRole {
                mappers_created,
                source,
            })?;
        let group_path = role.group_path(org_slug);
        let key = mapper_key(role, &group_path);
        let claim = mapping.claim();

        retry
            .execute("create_claim_mapper", || {
                broker.create_claim_mapper(org_slug, &key, &claim, &group_path)
            })
            .await
            .map_err(|source| ProvisioningError::Broker {
                step: ProvisionStep::CreateMappers,
                mappers_created,
                source,
            })?;
        mappers_created += 1;
    }

    // Step 4: promote the saga status. A record stuck in `provisioning`
    // marks an integration needing reconciliation.
    ensure_not_cancelled(cancel, ProvisionStep::Activate)?;
    store
        .set_status(org_id, IntegrationStatus::Active)
        .await
        .map_err(|source| ProvisioningError::Store {
            step: ProvisionStep::Activate,
            source,
        })?;

    info!(mappers = mappers_created, host, "SSO integration provisioned");
    Ok(())
}
