//! Grant records linking users and roles to routes and languages.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waypass_core::{AppError, UserId};

use crate::{LanguageCode, Role, RoleId, RoleName, RouteId};

/// Links a user to a role.
///
/// Assignments are never hard-deleted; revocation sets `revoked_at` and
/// clears `is_active` so the audit history stays intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    /// User holding the role.
    pub user_id: UserId,
    /// Role being assigned.
    pub role_id: RoleId,
    /// Cleared when the assignment is revoked.
    pub is_active: bool,
    /// Set when the assignment is revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl UserRoleAssignment {
    /// Returns whether this assignment contributes to resolution.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_active && self.revoked_at.is_none()
    }
}

/// A role assignment joined with its role record, as fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedRole {
    /// The assignment row.
    pub assignment: UserRoleAssignment,
    /// The role the assignment points at.
    pub role: Role,
}

impl AssignedRole {
    /// Returns whether both the assignment and the role are effective.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.assignment.is_effective() && self.role.is_resolvable()
    }
}

/// Grants a role blanket access to one route.
///
/// Joined by role name, not id; role-level grants are durable policy and
/// carry no expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePermission {
    /// Role receiving the grant.
    pub role_name: RoleName,
    /// Route being granted.
    pub route_id: RouteId,
    /// Inactive grants contribute nothing.
    pub is_active: bool,
}

/// Direction of a per-user route override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    /// Adds the route to the user's allowed set.
    Grant,
    /// Removes the route from the user's allowed set; wins every conflict.
    Deny,
}

impl OverrideType {
    /// Returns a stable storage value for this override type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for OverrideType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grant" => Ok(Self::Grant),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown override type '{value}'"
            ))),
        }
    }
}

/// Per-user, per-route exception layered on top of role-derived access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRouteOverride {
    /// User the override applies to.
    pub user_id: UserId,
    /// Route the override targets.
    pub route_id: RouteId,
    /// Whether the override grants or denies access.
    pub permission_type: OverrideType,
    /// Inactive overrides are inert.
    pub is_active: bool,
    /// Optional expiry; a past timestamp makes the override inert.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserRouteOverride {
    /// Returns whether the override participates in resolution at `now`.
    ///
    /// Inactive or expired overrides are skipped silently; they are expected
    /// steady-state data, not anomalies.
    #[must_use]
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Restricts which content languages a role's members may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLanguageAccess {
    /// Role the restriction applies to.
    pub role_name: RoleName,
    /// Language the role may use.
    pub language: LanguageCode,
    /// Inactive rows contribute nothing.
    pub is_active: bool,
}
