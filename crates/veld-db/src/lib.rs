//! # veld-db
//!
//! The local persistent record of an organization's SSO integration.
//!
//! This crate owns exactly one table: `sso_integrations`, one row per
//! organization, carrying the provider name, discovery host, and a saga
//! status that records how far a lifecycle operation got. Workflow code
//! depends on the [`IntegrationStore`] trait; production wires in
//! [`PgIntegrationStore`], tests use [`InMemoryIntegrationStore`].

pub mod error;
pub mod models;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::sso_integration::{IntegrationStatus, NewSsoIntegration, SsoIntegration};
pub use store::{InMemoryIntegrationStore, IntegrationStore, PgIntegrationStore};
