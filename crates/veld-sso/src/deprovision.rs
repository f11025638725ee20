//! Deprovisioning workflow.
//!
//! Marks the local record as tearing down, cleans up every SSO-authenticated
//! user (group removal and forced logout), and only once every user is clean
//! deletes the broker-side provider and the local record. Per-user cleanup
//! failures are collected, never compensated: already-cleaned users stay
//! cleaned, and the provider and record survive for a re-run.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{DeprovisioningError, TeardownStep, UserCleanupFailure};
use veld_broker::{BrokerError, IdentityBroker, RetryPolicy};
use veld_core::{OrgId, UserId};
use veld_db::{IntegrationStatus, IntegrationStore};

/// Knobs for the per-user cleanup fan-out.
#[derive(Debug, Clone)]
pub struct TeardownConfig {
    /// Maximum number of users cleaned up concurrently.
    pub concurrency: usize,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

fn ensure_not_cancelled(
    cancel: &CancellationToken,
    step: TeardownStep,
) -> Result<(), DeprovisioningError> {
    if cancel.is_cancelled() {
        Err(DeprovisioningError::Cancelled { step })
    } else {
        Ok(())
    }
}

/// Whether teardown should leave this group membership alone.
///
/// Memberships outside the organization's group subtree are not ours to
/// touch, and viewer-tier memberships are kept so the user retains read
/// access after the provider is gone.
fn keep_membership(path: &str, org_slug: &str) -> bool {
    !path.contains(org_slug) || path.contains("viewer")
}

/// Remove one user's organization group memberships, then log them out.
///
/// The logout runs even when the user had no memberships to remove; a user
/// with an SSO session and no groups still must not keep that session.
async fn cleanup_user(
    broker: &dyn IdentityBroker,
    retry: &RetryPolicy,
    realm: &str,
    user: UserId,
) -> Result<(), BrokerError> {
    let groups = retry
        .execute("list_user_groups", || broker.list_user_groups(realm, user))
        .await?;

    let mut removed = 0usize;
    for membership in &groups {
        if keep_membership(&membership.path, realm) {
            continue;
        }
        retry
            .execute("remove_user_from_group", || {
                broker.remove_user_from_group(realm, user, &membership.id)
            })
            .await?;
        removed += 1;
    }

    retry
        .execute("logout_user", || broker.logout_user(realm, user))
        .await?;

    debug!(%user, removed, "cleaned up SSO user");
    Ok(())
}

/// Run the deprovisioning workflow. The realm is the organization slug.
///
/// `creator` is the admin who initiated the teardown; their own groups and
/// session are left untouched so they are not locked out mid-operation.
#[instrument(skip_all, fields(org_id = %org_id, slug = org_slug))]
pub(crate) async fn run(
    broker: Arc<dyn IdentityBroker>,
    store: &dyn IntegrationStore,
    retry: &RetryPolicy,
    config: &TeardownConfig,
    cancel: &CancellationToken,
    org_id: OrgId,
    org_slug: &str,
    creator: UserId,
) -> Result<(), DeprovisioningError> {
    // Step 1: flip the saga status first, so a crash mid-teardown leaves a
    // record that reads `tearing_down` rather than `active`.
    ensure_not_cancelled(cancel, TeardownStep::MarkTearingDown)?;
    store
        .set_status(org_id, IntegrationStatus::TearingDown)
        .await
        .map_err(|source| DeprovisioningError::Store {
            step: TeardownStep::MarkTearingDown,
            source,
        })?;

    // Step 2: snapshot the SSO user set.
    ensure_not_cancelled(cancel, TeardownStep::ListUsers)?;
    let users = retry
        .execute("list_sso_users", || broker.list_sso_users(org_slug))
        .await
        .map_err(|source| DeprovisioningError::Broker {
            step: TeardownStep::ListUsers,
            source,
        })?;

    // Step 3: bounded fan-out. One user's failure never stops the others.
    ensure_not_cancelled(cancel, TeardownStep::UserCleanup)?;
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks: JoinSet<(UserId, Result<(), BrokerError>)> = JoinSet::new();

    for user in users {
        if user == creator {
            debug!(%user, "skipping teardown initiator");
            continue;
        }
        let broker = Arc::clone(&broker);
        let retry = retry.clone();
        let semaphore = Arc::clone(&semaphore);
        let realm = org_slug.to_string();

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        user,
                        Err(BrokerError::unavailable("cleanup worker pool closed")),
                    );
                }
            };
            let outcome = cleanup_user(broker.as_ref(), &retry, &realm, user).await;
            (user, outcome)
        });
    }

    let mut failures: Vec<UserCleanupFailure> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((user, Err(error))) => {
                warn!(%user, %error, "SSO user cleanup failed");
                failures.push(UserCleanupFailure { user, error });
            }
            Err(join_err) => {
                warn!(error = %join_err, "cleanup task aborted");
            }
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|f| f.user.to_string());
        return Err(DeprovisioningError::PartialTeardown { failures });
    }

    // Step 4: every user is clean; the provider may go.
    ensure_not_cancelled(cancel, TeardownStep::DeleteProvider)?;
    retry
        .execute("delete_provider", || broker.delete_provider(org_slug))
        .await
        .map_err(|source| DeprovisioningError::Broker {
            step: TeardownStep::DeleteProvider,
            source,
        })?;

    // Step 5: drop the local record last. A record that outlives the
    // provider is re-runnable; a missing record with a live provider is not
    // discoverable, hence this ordering.
    ensure_not_cancelled(cancel, TeardownStep::DeleteRecord)?;
    store
        .delete(org_id)
        .await
        .map_err(|source| DeprovisioningError::Store {
            step: TeardownStep::DeleteRecord,
            source,
        })?;

    info!("SSO integration deprovisioned");
    Ok(())
}
