//! Database models.

pub mod sso_integration;
