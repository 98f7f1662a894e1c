use async_trait::async_trait;
use tokio::sync::RwLock;
use waypass_application::PermissionStore;
use waypass_core::{AppResult, UserId};
use waypass_domain::{
    AssignedRole, RoleLanguageAccess, RoleName, Route, RoutePermission, UserRouteOverride,
};

/// In-memory permission store implementation.
///
/// Used in tests and development seeding; the record shapes mirror what the
/// Postgres adapter reads.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    assigned_roles: RwLock<Vec<AssignedRole>>,
    route_permissions: RwLock<Vec<RoutePermission>>,
    overrides: RwLock<Vec<UserRouteOverride>>,
    language_access: RwLock<Vec<RoleLanguageAccess>>,
    routes: RwLock<Vec<Route>>,
}

impl InMemoryPermissionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role assignment joined with its role record.
    pub async fn insert_assigned_role(&self, assigned_role: AssignedRole) {
        self.assigned_roles.write().await.push(assigned_role);
    }

    /// Adds a role-level route grant.
    pub async fn insert_route_permission(&self, permission: RoutePermission) {
        self.route_permissions.write().await.push(permission);
    }

    /// Adds a per-user route override.
    pub async fn insert_override(&self, value: UserRouteOverride) {
        self.overrides.write().await.push(value);
    }

    /// Adds a role language-access row.
    pub async fn insert_language_access(&self, row: RoleLanguageAccess) {
        self.language_access.write().await.push(row);
    }

    /// Adds a route record.
    pub async fn insert_route(&self, route: Route) {
        self.routes.write().await.push(route);
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn find_active_role_assignments(&self, user_id: UserId) -> AppResult<Vec<AssignedRole>> {
        Ok(self
            .assigned_roles
            .read()
            .await
            .iter()
            .filter(|assigned| {
                assigned.assignment.user_id == user_id && assigned.assignment.is_effective()
            })
            .cloned()
            .collect())
    }

    async fn find_route_permissions(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoutePermission>> {
        Ok(self
            .route_permissions
            .read()
            .await
            .iter()
            .filter(|grant| grant.is_active && role_names.contains(&grant.role_name))
            .cloned()
            .collect())
    }

    async fn find_active_overrides(&self, user_id: UserId) -> AppResult<Vec<UserRouteOverride>> {
        Ok(self
            .overrides
            .read()
            .await
            .iter()
            .filter(|value| value.user_id == user_id && value.is_active)
            .cloned()
            .collect())
    }

    async fn find_language_access(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoleLanguageAccess>> {
        Ok(self
            .language_access
            .read()
            .await
            .iter()
            .filter(|row| row.is_active && role_names.contains(&row.role_name))
            .cloned()
            .collect())
    }

    async fn find_active_routes(&self) -> AppResult<Vec<Route>> {
        Ok(self
            .routes
            .read()
            .await
            .iter()
            .filter(|route| route.deleted_at.is_none())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use waypass_application::PermissionStore;
    use waypass_core::UserId;
    use waypass_domain::{
        AssignedRole, Role, RoleId, RoleName, Route, RouteId, UserRoleAssignment,
    };

    use super::InMemoryPermissionStore;

    fn reader_role() -> Role {
        Role {
            id: RoleId::new(),
            name: RoleName::new("reader").unwrap_or_else(|_| panic!("test")),
            hierarchy_level: 1,
            is_active: true,
            is_system_role: false,
        }
    }

    #[tokio::test]
    async fn assignments_are_scoped_to_the_user() {
        let store = InMemoryPermissionStore::new();
        let user_id = UserId::new();
        let role = reader_role();
        store
            .insert_assigned_role(AssignedRole {
                assignment: UserRoleAssignment {
                    user_id,
                    role_id: role.id,
                    is_active: true,
                    revoked_at: None,
                },
                role,
            })
            .await;

        let own = store.find_active_role_assignments(user_id).await;
        let other = store.find_active_role_assignments(UserId::new()).await;

        assert_eq!(own.map(|rows| rows.len()).unwrap_or(0), 1);
        assert_eq!(other.map(|rows| rows.len()).unwrap_or(1), 0);
    }

    #[tokio::test]
    async fn revoked_assignments_are_filtered_out() {
        let store = InMemoryPermissionStore::new();
        let user_id = UserId::new();
        let role = reader_role();
        store
            .insert_assigned_role(AssignedRole {
                assignment: UserRoleAssignment {
                    user_id,
                    role_id: role.id,
                    is_active: false,
                    revoked_at: Some(Utc::now()),
                },
                role,
            })
            .await;

        let rows = store.find_active_role_assignments(user_id).await;

        assert_eq!(rows.map(|rows| rows.len()).unwrap_or(1), 0);
    }

    #[tokio::test]
    async fn soft_deleted_routes_are_not_listed() {
        let store = InMemoryPermissionStore::new();
        store
            .insert_route(Route {
                id: RouteId::new(),
                pathname: "/legacy".to_owned(),
                is_active: true,
                is_public: true,
                deleted_at: Some(Utc::now()),
            })
            .await;
        store
            .insert_route(Route {
                id: RouteId::new(),
                pathname: "/".to_owned(),
                is_active: true,
                is_public: true,
                deleted_at: None,
            })
            .await;

        let routes = store.find_active_routes().await;

        let pathnames: Vec<String> = routes
            .unwrap_or_default()
            .into_iter()
            .map(|route| route.pathname)
            .collect();
        assert_eq!(pathnames, vec!["/".to_owned()]);
    }
}
