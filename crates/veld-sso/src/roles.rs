//! Role mapping resolver.
//!
//! Maps a domain role to the canonical broker-side group path for an
//! organization slug, and builds the structured claim descriptor a mapper
//! binds to that path. Pure functions, no broker calls.

use std::str::FromStr;
use thiserror::Error;
use veld_broker::ClaimDescriptor;

/// A role string that is not one of the three domain roles.
///
/// Raised before any external mutation for the offending mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the role '{role}' does not exist")]
pub struct InvalidRoleError {
    /// The offending input value.
    pub role: String,
}

/// The closed set of organization roles that can be mapped to SSO groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgRole {
    Admin,
    Member,
    Viewer,
}

impl OrgRole {
    /// Canonical broker-side group path for this role in an organization.
    ///
    /// Admin → `/{slug}/admin`, Member → `/{slug}`, Viewer → `/{slug}/viewer`.
    #[must_use]
    pub fn group_path(self, slug: &str) -> String {
        match self {
            OrgRole::Admin => format!("/{slug}/admin"),
            OrgRole::Member => format!("/{slug}"),
            OrgRole::Viewer => format!("/{slug}/viewer"),
        }
    }

    /// Lowercase name used in mapper keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
            OrgRole::Viewer => "viewer",
        }
    }
}

impl FromStr for OrgRole {
    type Err = InvalidRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(OrgRole::Admin),
            "Member" => Ok(OrgRole::Member),
            "Viewer" => Ok(OrgRole::Viewer),
            other => Err(InvalidRoleError {
                role: other.to_string(),
            }),
        }
    }
}

/// One entry of the ordered role-mapping list supplied at provisioning time.
///
/// The role is kept as raw input and validated entry by entry while mappers
/// are created, so an invalid role later in the list fails only after the
/// earlier valid entries were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    /// Domain role name as supplied by the caller.
    pub role: String,
    /// SSO group claim value configured on the external IdP.
    pub sso_group: String,
}

impl RoleMapping {
    /// Structured claim descriptor for this mapping.
    #[must_use]
    pub fn claim(&self) -> ClaimDescriptor {
        ClaimDescriptor::sso_groups(self.sso_group.clone())
    }
}

/// Broker-side dedupe key for a claim mapper.
///
/// Derived from (role, group path) so re-running provisioning after a
/// partial failure lands on the same mapper instead of creating a duplicate.
#[must_use]
pub fn mapper_key(role: OrgRole, group_path: &str) -> String {
    format!("{}-{}", role.as_str(), group_path.replace('/', "-"))
}
