use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use waypass_application::PermissionStore;
use waypass_core::{AppError, AppResult, UserId};
use waypass_domain::{
    AssignedRole, LanguageCode, OverrideType, Role, RoleId, RoleLanguageAccess, RoleName, Route,
    RouteId, RoutePermission, UserRoleAssignment, UserRouteOverride,
};

/// PostgreSQL-backed permission store.
///
/// The store is a passive record provider; all filtering beyond the obvious
/// row-level predicates (user scope, soft deletes) happens in the resolver.
#[derive(Clone)]
pub struct PostgresPermissionStore {
    pool: PgPool,
}

impl PostgresPermissionStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn fetch_error(context: &str, error: sqlx::Error) -> AppError {
    AppError::Unavailable(format!("failed to load {context}: {error}"))
}

fn decode_role_name(value: &str) -> AppResult<RoleName> {
    RoleName::new(value).map_err(|error| {
        AppError::Internal(format!("failed to decode role name '{value}': {error}"))
    })
}

fn decode_language(value: &str) -> AppResult<LanguageCode> {
    LanguageCode::from_str(value).map_err(|error| {
        AppError::Internal(format!("failed to decode language code '{value}': {error}"))
    })
}

#[derive(Debug, FromRow)]
struct AssignedRoleRow {
    user_id: Uuid,
    role_id: Uuid,
    is_active: bool,
    revoked_at: Option<DateTime<Utc>>,
    role_name: String,
    hierarchy_level: i32,
    role_is_active: bool,
    is_system_role: bool,
}

#[derive(Debug, FromRow)]
struct RoutePermissionRow {
    role_name: String,
    route_id: Uuid,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    user_id: Uuid,
    route_id: Uuid,
    permission_type: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct LanguageAccessRow {
    role_name: String,
    language_code: String,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct RouteRow {
    id: Uuid,
    pathname: String,
    is_active: bool,
    is_public: bool,
    deleted_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PermissionStore for PostgresPermissionStore {
    async fn find_active_role_assignments(&self, user_id: UserId) -> AppResult<Vec<AssignedRole>> {
        let rows = sqlx::query_as::<_, AssignedRoleRow>(
            r#"
            SELECT assignments.user_id,
                assignments.role_id,
                assignments.is_active,
                assignments.revoked_at,
                roles.name AS role_name,
                roles.hierarchy_level,
                roles.is_active AS role_is_active,
                roles.is_system_role
            FROM user_role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.is_active = TRUE
                AND assignments.revoked_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| fetch_error("role assignments", error))?;

        rows.into_iter()
            .map(|row| {
                Ok(AssignedRole {
                    assignment: UserRoleAssignment {
                        user_id: UserId::from_uuid(row.user_id),
                        role_id: RoleId::from_uuid(row.role_id),
                        is_active: row.is_active,
                        revoked_at: row.revoked_at,
                    },
                    role: Role {
                        id: RoleId::from_uuid(row.role_id),
                        name: decode_role_name(&row.role_name)?,
                        hierarchy_level: row.hierarchy_level,
                        is_active: row.role_is_active,
                        is_system_role: row.is_system_role,
                    },
                })
            })
            .collect()
    }

    async fn find_route_permissions(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoutePermission>> {
        if role_names.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = role_names
            .iter()
            .map(|name| name.as_str().to_owned())
            .collect();

        let rows = sqlx::query_as::<_, RoutePermissionRow>(
            r#"
            SELECT role_name, route_id, is_active
            FROM route_permissions
            WHERE is_active = TRUE
                AND role_name = ANY($1)
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| fetch_error("route permissions", error))?;

        rows.into_iter()
            .map(|row| {
                Ok(RoutePermission {
                    role_name: decode_role_name(&row.role_name)?,
                    route_id: RouteId::from_uuid(row.route_id),
                    is_active: row.is_active,
                })
            })
            .collect()
    }

    async fn find_active_overrides(&self, user_id: UserId) -> AppResult<Vec<UserRouteOverride>> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT user_id, route_id, permission_type, is_active, expires_at
            FROM user_route_overrides
            WHERE user_id = $1
                AND is_active = TRUE
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| fetch_error("route overrides", error))?;

        rows.into_iter()
            .map(|row| {
                let permission_type =
                    OverrideType::from_str(row.permission_type.as_str()).map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode override type '{}' for user '{user_id}': {error}",
                            row.permission_type
                        ))
                    })?;

                Ok(UserRouteOverride {
                    user_id: UserId::from_uuid(row.user_id),
                    route_id: RouteId::from_uuid(row.route_id),
                    permission_type,
                    is_active: row.is_active,
                    expires_at: row.expires_at,
                })
            })
            .collect()
    }

    async fn find_language_access(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoleLanguageAccess>> {
        if role_names.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = role_names
            .iter()
            .map(|name| name.as_str().to_owned())
            .collect();

        let rows = sqlx::query_as::<_, LanguageAccessRow>(
            r#"
            SELECT role_name, language_code, is_active
            FROM role_language_access
            WHERE is_active = TRUE
                AND role_name = ANY($1)
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| fetch_error("language access", error))?;

        rows.into_iter()
            .map(|row| {
                Ok(RoleLanguageAccess {
                    role_name: decode_role_name(&row.role_name)?,
                    language: decode_language(&row.language_code)?,
                    is_active: row.is_active,
                })
            })
            .collect()
    }

    async fn find_active_routes(&self) -> AppResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT id, pathname, is_active, is_public, deleted_at
            FROM routes
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| fetch_error("routes", error))?;

        Ok(rows
            .into_iter()
            .map(|row| Route {
                id: RouteId::from_uuid(row.id),
                pathname: row.pathname,
                is_active: row.is_active,
                is_public: row.is_public,
                deleted_at: row.deleted_at,
            })
            .collect())
    }
}
