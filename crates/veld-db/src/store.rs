//! Integration record store: collaborator trait and implementations.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::sso_integration::{IntegrationStatus, NewSsoIntegration, SsoIntegration};
use veld_core::OrgId;

/// Capability surface the SSO workflows require from the record store.
///
/// The store holds only the local mark that an organization has an active
/// integration; the broker remains the authority for all external state.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Insert the record for an organization.
    ///
    /// Fails with [`StoreError::DuplicateIntegration`] if a record already
    /// exists — at most one integration per organization.
    async fn insert(&self, input: NewSsoIntegration) -> StoreResult<SsoIntegration>;

    /// Look up the record for an organization.
    async fn find(&self, org_id: OrgId) -> StoreResult<Option<SsoIntegration>>;

    /// Update the saga status. A missing record is a no-op.
    async fn set_status(&self, org_id: OrgId, status: IntegrationStatus) -> StoreResult<()>;

    /// Delete the record. A missing record is a no-op (idempotent delete).
    async fn delete(&self, org_id: OrgId) -> StoreResult<()>;
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgIntegrationStore {
    pool: sqlx::PgPool,
}

impl PgIntegrationStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    fn map_insert_error(err: sqlx::Error, org_id: OrgId) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateIntegration { org_id };
            }
        }
        StoreError::QueryFailed(err)
    }
}

#[async_trait]
impl IntegrationStore for PgIntegrationStore {
    async fn insert(&self, input: NewSsoIntegration) -> StoreResult<SsoIntegration> {
        let org_id = OrgId::from_uuid(input.organization_id);
        SsoIntegration::insert(&self.pool, &input)
            .await
            .map_err(|e| Self::map_insert_error(e, org_id))
    }

    async fn find(&self, org_id: OrgId) -> StoreResult<Option<SsoIntegration>> {
        SsoIntegration::find_by_org(&self.pool, *org_id.as_uuid())
            .await
            .map_err(StoreError::QueryFailed)
    }

    async fn set_status(&self, org_id: OrgId, status: IntegrationStatus) -> StoreResult<()> {
        SsoIntegration::set_status(&self.pool, *org_id.as_uuid(), status)
            .await
            .map_err(StoreError::QueryFailed)?;
        Ok(())
    }

    async fn delete(&self, org_id: OrgId) -> StoreResult<()> {
        SsoIntegration::delete(&self.pool, *org_id.as_uuid())
            .await
            .map_err(StoreError::QueryFailed)?;
        Ok(())
    }
}

/// In-memory store for workflow tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryIntegrationStore {
    records: RwLock<HashMap<OrgId, SsoIntegration>>,
}

impl InMemoryIntegrationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntegrationStore for InMemoryIntegrationStore {
    async fn insert(&self, input: NewSsoIntegration) -> StoreResult<SsoIntegration> {
        let org_id = OrgId::from_uuid(input.organization_id);
        let mut records = self.records.write().await;
        if records.contains_key(&org_id) {
            return Err(StoreError::DuplicateIntegration { org_id });
        }
        let record = SsoIntegration {
            organization_id: input.organization_id,
            name: input.name,
            discovery_host: input.discovery_host,
            status: input.status.to_string(),
            created_at: Utc::now(),
        };
        records.insert(org_id, record.clone());
        Ok(record)
    }

    async fn find(&self, org_id: OrgId) -> StoreResult<Option<SsoIntegration>> {
        Ok(self.records.read().await.get(&org_id).cloned())
    }

    async fn set_status(&self, org_id: OrgId, status: IntegrationStatus) -> StoreResult<()> {
        if let Some(record) = self.records.write().await.get_mut(&org_id) {
            record.status = status.to_string();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId) -> StoreResult<()> {
        self.records.write().await.remove(&org_id);
        Ok(())
    }
}
