//! SSO integration record.
//!
//! Table `sso_integrations`, one row per organization:
//!
//! ```sql
//! CREATE TABLE sso_integrations (
//!     organization_id UUID PRIMARY KEY,
//!     name            VARCHAR NOT NULL,
//!     discovery_host  VARCHAR NOT NULL,
//!     status          VARCHAR NOT NULL DEFAULT 'provisioning',
//!     created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! The primary key doubles as the uniqueness invariant: at most one
//! integration per organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of an integration record.
///
/// A saga marker: each workflow advances it step by step, so a record left
/// in `provisioning` or `tearing_down` identifies an interrupted operation
/// that needs resumption or manual reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// The broker-side provider exists; claim mappers may be incomplete.
    Provisioning,
    /// Provisioning finished; the integration is live.
    Active,
    /// Teardown started; broker-side cleanup may be incomplete.
    TearingDown,
}

impl std::fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationStatus::Provisioning => write!(f, "provisioning"),
            IntegrationStatus::Active => write!(f, "active"),
            IntegrationStatus::TearingDown => write!(f, "tearing_down"),
        }
    }
}

impl std::str::FromStr for IntegrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(IntegrationStatus::Provisioning),
            "active" => Ok(IntegrationStatus::Active),
            "tearing_down" => Ok(IntegrationStatus::TearingDown),
            _ => Err(format!("unknown integration status: {s}")),
        }
    }
}

/// SSO integration entity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SsoIntegration {
    pub organization_id: Uuid,
    pub name: String,
    pub discovery_host: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new integration record.
#[derive(Debug, Clone)]
pub struct NewSsoIntegration {
    pub organization_id: Uuid,
    pub name: String,
    pub discovery_host: String,
    pub status: IntegrationStatus,
}

impl SsoIntegration {
    /// Insert a new record. Fails on the primary key if one already exists.
    pub async fn insert(
        pool: &sqlx::PgPool,
        input: &NewSsoIntegration,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO sso_integrations (organization_id, name, discovery_host, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(input.organization_id)
        .bind(&input.name)
        .bind(&input.discovery_host)
        .bind(input.status.to_string())
        .fetch_one(pool)
        .await
    }

    /// Find the record for an organization.
    pub async fn find_by_org(
        pool: &sqlx::PgPool,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM sso_integrations WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Update the saga status. Returns whether a record was updated.
    pub async fn set_status(
        pool: &sqlx::PgPool,
        organization_id: Uuid,
        status: IntegrationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sso_integrations SET status = $2 WHERE organization_id = $1")
            .bind(organization_id)
            .bind(status.to_string())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the record. Returns whether a record existed.
    pub async fn delete(pool: &sqlx::PgPool, organization_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sso_integrations WHERE organization_id = $1")
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Parsed saga status.
    pub fn get_status(&self) -> Result<IntegrationStatus, String> {
        self.status.parse()
    }
}
