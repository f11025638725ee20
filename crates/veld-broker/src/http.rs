//! HTTP implementation of [`IdentityBroker`] (reqwest-based).
//!
//! Talks to the broker's admin REST API. One realm per organization; the
//! realm's OIDC provider is addressed by a deterministic alias derived from
//! the realm name, which is what makes provider creation safe to retry.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::traits::IdentityBroker;
use crate::types::{ClaimDescriptor, CreateProviderRequest, GroupMembership, ProviderHandle};
use veld_core::UserId;

/// Mapper type the broker uses to inject group claims into issued tokens.
const GROUP_CLAIM_MAPPER_TYPE: &str = "oidc-advanced-group-idp-mapper";

/// Identity broker admin API client.
#[derive(Debug, Clone)]
pub struct HttpIdentityBroker {
    base_url: String,
    admin_token: String,
    http_client: Client,
}

impl HttpIdentityBroker {
    /// Build a client from configuration.
    pub fn new(config: &BrokerConfig) -> BrokerResult<Self> {
        config.validate()?;
        let http_client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.tls_verify)
            .user_agent("veld-broker/1.0")
            .build()
            .map_err(|e| BrokerError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(
            config.base_url.clone(),
            config.admin_token.clone(),
            http_client,
        ))
    }

    /// Build a client around a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(base_url: String, admin_token: String, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token,
            http_client,
        }
    }

    /// Deterministic alias of the realm's OIDC provider.
    ///
    /// At most one integration exists per organization, so the alias only
    /// needs to be stable per realm; retried creates land on the same alias.
    #[must_use]
    pub fn provider_alias(realm: &str) -> String {
        format!("{realm}-oidc")
    }

    fn realm_url(&self, realm: &str, suffix: &str) -> String {
        format!("{}/admin/realms/{realm}{suffix}", self.base_url)
    }

    // ── Internal HTTP methods ─────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> BrokerResult<T> {
        debug!(url, "broker GET");
        let mut builder = self.http_client.get(url).bearer_auth(&self.admin_token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    /// POST a JSON body, treating a 409 on the dedupe key as success.
    async fn post_idempotent<B: Serialize>(&self, url: &str, body: &B) -> BrokerResult<()> {
        debug!(url, "broker POST");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.admin_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::CONFLICT {
            debug!(url, "broker object already exists, treating retried create as success");
            return Ok(());
        }
        Err(self.error_from_response(response).await)
    }

    async fn post_empty(&self, url: &str) -> BrokerResult<()> {
        debug!(url, "broker POST");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.admin_token)
            .send()
            .await?;
        self.expect_success(response).await
    }

    /// DELETE, treating 404 as success (idempotent delete).
    async fn delete_idempotent(&self, url: &str) -> BrokerResult<()> {
        debug!(url, "broker DELETE");
        let response = self
            .http_client
            .delete(url)
            .bearer_auth(&self.admin_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(self.error_from_response(response).await)
    }

    async fn expect_success(&self, response: Response) -> BrokerResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> BrokerResult<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    /// Map a non-success response onto the broker error taxonomy.
    async fn error_from_response(&self, response: Response) -> BrokerError {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let detail = Self::error_detail(response).await;
            return BrokerError::Auth(format!("{status}: {detail}"));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return BrokerError::RateLimited { retry_after_secs };
        }
        if status.is_server_error() {
            let detail = Self::error_detail(response).await;
            return BrokerError::unavailable(format!("{status}: {detail}"));
        }

        let detail = Self::error_detail(response).await;
        BrokerError::Rejected {
            status: status.as_u16(),
            message: detail,
        }
    }

    /// Best-effort extraction of the broker's error message body.
    async fn error_detail(response: Response) -> String {
        match response.text().await {
            Ok(body) => {
                if let Ok(parsed) = serde_json::from_str::<BrokerErrorBody>(&body) {
                    parsed.error_message.or(parsed.error).unwrap_or(body)
                } else {
                    body
                }
            }
            Err(_) => String::from("(no response body)"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BrokerErrorBody {
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInstanceBody<'a> {
    alias: &'a str,
    display_name: &'a str,
    provider_id: &'static str,
    enabled: bool,
    config: ProviderInstanceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInstanceConfig<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    discovery_endpoint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimMapperBody<'a> {
    name: &'a str,
    identity_provider_alias: &'a str,
    identity_provider_mapper: &'static str,
    config: ClaimMapperConfig,
}

#[derive(Debug, Serialize)]
struct ClaimMapperConfig {
    /// Claim bindings, serialized as the JSON array the broker expects.
    claims: String,
    group: String,
    #[serde(rename = "syncMode")]
    sync_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct UserRepresentation {
    id: String,
}

#[async_trait]
impl IdentityBroker for HttpIdentityBroker {
    async fn create_provider(
        &self,
        realm: &str,
        request: &CreateProviderRequest,
    ) -> BrokerResult<ProviderHandle> {
        let alias = Self::provider_alias(realm);
        let url = self.realm_url(realm, "/identity-provider/instances");
        let body = ProviderInstanceBody {
            alias: &alias,
            display_name: &request.name,
            provider_id: "oidc",
            enabled: true,
            config: ProviderInstanceConfig {
                client_id: &request.client_id,
                client_secret: &request.client_secret,
                discovery_endpoint: &request.discovery_endpoint,
            },
        };
        self.post_idempotent(&url, &body).await?;
        Ok(ProviderHandle { alias })
    }

    async fn create_claim_mapper(
        &self,
        realm: &str,
        mapper_key: &str,
        claim: &ClaimDescriptor,
        group_path: &str,
    ) -> BrokerResult<()> {
        let alias = Self::provider_alias(realm);
        let url = self.realm_url(
            realm,
            &format!("/identity-provider/instances/{alias}/mappers"),
        );
        let claims_json = serde_json::to_string(&[claim])
            .map_err(|e| BrokerError::invalid_response(format!("claim serialization: {e}")))?;
        let body = ClaimMapperBody {
            name: mapper_key,
            identity_provider_alias: &alias,
            identity_provider_mapper: GROUP_CLAIM_MAPPER_TYPE,
            config: ClaimMapperConfig {
                claims: claims_json,
                group: group_path.to_string(),
                sync_mode: "FORCE",
            },
        };
        self.post_idempotent(&url, &body).await
    }

    async fn list_sso_users(&self, realm: &str) -> BrokerResult<Vec<UserId>> {
        let alias = Self::provider_alias(realm);
        let url = self.realm_url(realm, "/users");
        let users: Vec<UserRepresentation> =
            self.get_json(&url, &[("idpAlias", alias.as_str())]).await?;

        users
            .into_iter()
            .map(|u| {
                Uuid::from_str(&u.id)
                    .map(UserId::from_uuid)
                    .map_err(|e| BrokerError::invalid_response(format!("user id '{}': {e}", u.id)))
            })
            .collect()
    }

    async fn list_user_groups(
        &self,
        realm: &str,
        user: UserId,
    ) -> BrokerResult<Vec<GroupMembership>> {
        let url = self.realm_url(realm, &format!("/users/{user}/groups"));
        self.get_json(&url, &[]).await
    }

    async fn remove_user_from_group(
        &self,
        realm: &str,
        user: UserId,
        group_id: &str,
    ) -> BrokerResult<()> {
        let url = self.realm_url(realm, &format!("/users/{user}/groups/{group_id}"));
        self.delete_idempotent(&url).await
    }

    async fn logout_user(&self, realm: &str, user: UserId) -> BrokerResult<()> {
        let url = self.realm_url(realm, &format!("/users/{user}/logout"));
        self.post_empty(&url).await
    }

    async fn delete_provider(&self, realm: &str) -> BrokerResult<()> {
        let alias = Self::provider_alias(realm);
        let url = self.realm_url(realm, &format!("/identity-provider/instances/{alias}"));
        self.delete_idempotent(&url).await
    }
}
