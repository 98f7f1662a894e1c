//! Pure permission resolution over pre-fetched records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waypass_core::UserId;

use crate::{
    AssignedRole, LanguageCode, OverrideType, Role, RoleLanguageAccess, Route, RouteId,
    RoutePermission, UserRouteOverride,
};

/// Raw record sets for one user, fetched ahead of resolution.
///
/// Bundling the records keeps [`resolve`] free of I/O: the store collaborator
/// fetches, the resolver computes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecords {
    /// Role assignments joined with their role records.
    pub assigned_roles: Vec<AssignedRole>,
    /// Route grants for the user's role names.
    pub route_permissions: Vec<RoutePermission>,
    /// Per-user route overrides.
    pub overrides: Vec<UserRouteOverride>,
    /// Language restrictions for the user's role names.
    pub language_access: Vec<RoleLanguageAccess>,
    /// Every route known to the product, active or not.
    pub routes: Vec<Route>,
}

/// Aggregated access decision for one user.
///
/// A derived, request-scoped value reconstructed on each resolution; it owns
/// no persistent state. The allowed sets are fully determined by the records
/// passed to [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// User the decision applies to.
    pub user_id: UserId,
    /// Active roles held by the user.
    pub roles: Vec<Role>,
    /// Routes the user may navigate to, by id.
    pub allowed_routes: BTreeSet<RouteId>,
    /// Content languages the user may use.
    pub allowed_languages: BTreeSet<LanguageCode>,
    /// Overrides that were active and unexpired at resolution time.
    pub effective_overrides: Vec<UserRouteOverride>,
    /// Highest hierarchy level across the user's active roles, 0 when none.
    pub hierarchy_level: i32,
    /// Whether the user holds the universal-access role.
    pub is_super_admin: bool,
}

impl UserPermissions {
    /// Returns whether the user holds an active role with the given name.
    #[must_use]
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|role| role.name.as_str() == role_name)
    }

    /// Returns whether the route id is in the allowed set.
    #[must_use]
    pub fn allows_route(&self, route_id: RouteId) -> bool {
        self.allowed_routes.contains(&route_id)
    }

    /// Returns whether the language is in the allowed set.
    #[must_use]
    pub fn allows_language(&self, language: LanguageCode) -> bool {
        self.allowed_languages.contains(&language)
    }
}

/// Resolves the aggregated permission decision for one user.
///
/// Precedence, applied in order: super-admin short-circuit, role grants,
/// public routes, then per-user overrides. Overrides are evaluated last and a
/// deny wins every conflict for its route, including against the public flag
/// and against a simultaneously active grant override. Inactive or expired
/// records are skipped silently. Routes and languages fail in opposite
/// directions: no role grants means public routes only (fail-closed), while
/// no language rows means every active language (fail-open).
///
/// `now` decides override expiry; callers pass the current wall clock.
#[must_use]
pub fn resolve(
    user_id: UserId,
    records: &PermissionRecords,
    now: DateTime<Utc>,
) -> UserPermissions {
    let roles: Vec<Role> = records
        .assigned_roles
        .iter()
        .filter(|assigned| assigned.is_effective())
        .map(|assigned| assigned.role.clone())
        .collect();

    let hierarchy_level = roles
        .iter()
        .map(|role| role.hierarchy_level)
        .max()
        .unwrap_or(0);

    let is_super_admin = roles.iter().any(|role| role.name.is_super_admin());

    let resolvable_routes: BTreeSet<RouteId> = records
        .routes
        .iter()
        .filter(|route| route.is_resolvable())
        .map(|route| route.id)
        .collect();

    let effective_overrides: Vec<UserRouteOverride> = records
        .overrides
        .iter()
        .filter(|value| value.user_id == user_id && value.is_effective(now))
        .cloned()
        .collect();

    if is_super_admin {
        // Universal access is an escape hatch, not a union of grants; role
        // grants and overrides are not consulted at all.
        return UserPermissions {
            user_id,
            roles,
            allowed_routes: resolvable_routes,
            allowed_languages: LanguageCode::all().iter().copied().collect(),
            effective_overrides,
            hierarchy_level,
            is_super_admin,
        };
    }

    let role_names: BTreeSet<&str> = roles.iter().map(|role| role.name.as_str()).collect();

    let mut allowed_routes: BTreeSet<RouteId> = records
        .route_permissions
        .iter()
        .filter(|grant| {
            grant.is_active
                && role_names.contains(grant.role_name.as_str())
                && resolvable_routes.contains(&grant.route_id)
        })
        .map(|grant| grant.route_id)
        .collect();

    for route in &records.routes {
        if route.is_public && route.is_resolvable() {
            allowed_routes.insert(route.id);
        }
    }

    // Grants first, denies second, so a deny wins regardless of how many
    // grants target the same route. A grant cannot resurrect a route that is
    // inactive or soft-deleted.
    for value in &effective_overrides {
        if value.permission_type == OverrideType::Grant
            && resolvable_routes.contains(&value.route_id)
        {
            allowed_routes.insert(value.route_id);
        }
    }
    for value in &effective_overrides {
        if value.permission_type == OverrideType::Deny {
            allowed_routes.remove(&value.route_id);
        }
    }

    let allowed_languages: BTreeSet<LanguageCode> = {
        let restricted: BTreeSet<LanguageCode> = records
            .language_access
            .iter()
            .filter(|row| row.is_active && role_names.contains(row.role_name.as_str()))
            .map(|row| row.language)
            .collect();

        if restricted.is_empty() {
            LanguageCode::all().iter().copied().collect()
        } else {
            restricted
        }
    };

    UserPermissions {
        user_id,
        roles,
        allowed_routes,
        allowed_languages,
        effective_overrides,
        hierarchy_level,
        is_super_admin,
    }
}
