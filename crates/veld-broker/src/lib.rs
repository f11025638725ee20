//! # veld-broker
//!
//! Client for the external identity broker that owns realms, OIDC clients,
//! groups, users, and sessions.
//!
//! The platform never mutates broker entities directly; every capability the
//! SSO workflows need is expressed on the [`IdentityBroker`] trait, and
//! [`HttpIdentityBroker`] implements it against the broker's admin REST API.
//! Errors are classified as transient or terminal so callers can decide what
//! to retry (see [`BrokerError::is_transient`] and [`RetryPolicy`]).

pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod traits;
pub mod types;

pub use config::BrokerConfig;
pub use error::{BrokerError, BrokerResult};
pub use http::HttpIdentityBroker;
pub use retry::RetryPolicy;
pub use traits::IdentityBroker;
pub use types::{
    ClaimDescriptor, CreateProviderRequest, GroupMembership, ProviderHandle, SSO_GROUPS_CLAIM_KEY,
};
