//! # veld-core
//!
//! Shared identifier types for the veld organization platform.
//!
//! Every subsystem that touches an organization or a user does so through
//! the strongly typed ids defined here, so an `OrgId` can never be passed
//! where a `UserId` is expected.

pub mod ids;

pub use ids::{OrgId, ParseIdError, UserId};
