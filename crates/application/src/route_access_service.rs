use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use waypass_core::{AppError, AppResult, UserId};
use waypass_domain::{
    AssignedRole, LanguageCode, PermissionRecords, RoleLanguageAccess, RoleName, Route, RouteId,
    RoutePermission, UserPermissions, UserRouteOverride, normalize_pathname, resolve,
};

/// Read-only port for permission records.
///
/// The store is a passive record provider; it performs no merge logic. Every
/// access decision is computed in-process by the resolver.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Lists the user's role assignments joined with their role records.
    async fn find_active_role_assignments(&self, user_id: UserId) -> AppResult<Vec<AssignedRole>>;

    /// Lists active route grants for the given role names.
    async fn find_route_permissions(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoutePermission>>;

    /// Lists active route overrides for the user.
    async fn find_active_overrides(&self, user_id: UserId) -> AppResult<Vec<UserRouteOverride>>;

    /// Lists active language-access rows for the given role names.
    async fn find_language_access(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoleLanguageAccess>>;

    /// Lists routes that are not soft-deleted, active or not.
    async fn find_active_routes(&self) -> AppResult<Vec<Route>>;
}

/// Port mapping a route id to its localized pathname per language.
#[async_trait]
pub trait RouteTranslator: Send + Sync {
    /// Returns the active translated path for the route and language, if any.
    async fn translated_path(
        &self,
        route_id: RouteId,
        language: LanguageCode,
    ) -> AppResult<Option<String>>;
}

/// Optional short-TTL cache for resolved permissions, keyed by user id.
///
/// Entries must be invalidated, not merely left to expire, whenever a role
/// assignment or override affecting the user is written: a stale grant is a
/// security issue, a stale denial only an inconvenience.
#[async_trait]
pub trait PermissionsCache: Send + Sync {
    /// Returns the cached decision for the user, if present and fresh.
    async fn get(&self, user_id: UserId) -> AppResult<Option<UserPermissions>>;

    /// Stores a decision with the given TTL. A zero TTL stores nothing.
    async fn set(
        &self,
        user_id: UserId,
        permissions: UserPermissions,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Drops the cached decision for the user.
    async fn invalidate(&self, user_id: UserId) -> AppResult<()>;
}

/// Façade used by route guards and navigation menus.
///
/// Store errors propagate as [`AppError::Unavailable`]; the service never
/// substitutes a default decision. Guards own the fail-closed behavior.
#[derive(Clone)]
pub struct RouteAccessService {
    store: Arc<dyn PermissionStore>,
    translator: Arc<dyn RouteTranslator>,
    cache: Option<Arc<dyn PermissionsCache>>,
    cache_ttl_seconds: u32,
}

impl RouteAccessService {
    /// Creates an uncached service from store and translator ports.
    #[must_use]
    pub fn new(store: Arc<dyn PermissionStore>, translator: Arc<dyn RouteTranslator>) -> Self {
        Self {
            store,
            translator,
            cache: None,
            cache_ttl_seconds: 0,
        }
    }

    /// Creates a service that serves resolutions from a short-TTL cache.
    #[must_use]
    pub fn with_cache(
        store: Arc<dyn PermissionStore>,
        translator: Arc<dyn RouteTranslator>,
        cache: Arc<dyn PermissionsCache>,
        cache_ttl_seconds: u32,
    ) -> Self {
        Self {
            store,
            translator,
            cache: Some(cache),
            cache_ttl_seconds,
        }
    }

    /// Resolves the aggregated permission decision for the user.
    ///
    /// Cache reads and writes are best-effort: a cache failure degrades to an
    /// uncached resolution and never fails the decision.
    pub async fn get_user_permissions(&self, user_id: UserId) -> AppResult<UserPermissions> {
        if let Some(cache) = &self.cache {
            match cache.get(user_id).await {
                Ok(Some(permissions)) => return Ok(permissions),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        %user_id, %error,
                        "permissions cache read failed; resolving from the store"
                    );
                }
            }
        }

        let permissions = self.resolve_from_store(user_id).await?;

        if let Some(cache) = &self.cache {
            if let Err(error) = cache
                .set(user_id, permissions.clone(), self.cache_ttl_seconds)
                .await
            {
                tracing::warn!(%user_id, %error, "permissions cache write failed");
            }
        }

        Ok(permissions)
    }

    /// Returns whether the user may navigate to the pathname in the language.
    ///
    /// Anonymous callers (`user_id` absent) match active public routes only.
    /// Matching is exact on the normalized path, against the canonical
    /// pathname and the translated-for-`language` pathname.
    pub async fn can_access_route(
        &self,
        user_id: Option<UserId>,
        pathname: &str,
        language: LanguageCode,
    ) -> AppResult<bool> {
        let requested = normalize_pathname(pathname);

        let Some(user_id) = user_id else {
            let routes = self.store.find_active_routes().await?;
            for route in &routes {
                if route.is_public
                    && route.is_resolvable()
                    && self.route_matches(route, &requested, language).await?
                {
                    return Ok(true);
                }
            }
            return Ok(false);
        };

        let permissions = self.get_user_permissions(user_id).await?;
        let routes = self.store.find_active_routes().await?;
        for route in &routes {
            if route.is_resolvable()
                && permissions.allows_route(route.id)
                && self.route_matches(route, &requested, language).await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Ensures the user may navigate to the pathname, or fails with
    /// [`AppError::Forbidden`].
    pub async fn require_route_access(
        &self,
        user_id: Option<UserId>,
        pathname: &str,
        language: LanguageCode,
    ) -> AppResult<()> {
        if self.can_access_route(user_id, pathname, language).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "access to '{}' is not permitted",
            normalize_pathname(pathname)
        )))
    }

    /// Lists the pathnames the user may navigate to, localized for the
    /// language, falling back to the canonical pathname when no translation
    /// row exists. Sorted and de-duplicated.
    pub async fn get_allowed_routes(
        &self,
        user_id: UserId,
        language: LanguageCode,
    ) -> AppResult<Vec<String>> {
        let permissions = self.get_user_permissions(user_id).await?;
        let routes = self.store.find_active_routes().await?;

        let mut pathnames = Vec::new();
        for route in &routes {
            if !route.is_resolvable() || !permissions.allows_route(route.id) {
                continue;
            }

            let pathname = self
                .translator
                .translated_path(route.id, language)
                .await?
                .unwrap_or_else(|| route.pathname.clone());
            pathnames.push(normalize_pathname(&pathname));
        }

        pathnames.sort();
        pathnames.dedup();
        Ok(pathnames)
    }

    /// Lists the content languages the user may use.
    pub async fn get_allowed_languages(&self, user_id: UserId) -> AppResult<Vec<LanguageCode>> {
        let permissions = self.get_user_permissions(user_id).await?;
        Ok(permissions.allowed_languages.into_iter().collect())
    }

    /// Drops the user's cached decision after a role assignment or override
    /// write. A failed invalidation propagates, since it would leave a stale
    /// grant visible.
    pub async fn invalidate_user(&self, user_id: UserId) -> AppResult<()> {
        if let Some(cache) = &self.cache {
            cache.invalidate(user_id).await?;
            tracing::debug!(%user_id, "invalidated cached permissions");
        }

        Ok(())
    }

    async fn resolve_from_store(&self, user_id: UserId) -> AppResult<UserPermissions> {
        let assigned_roles = self.store.find_active_role_assignments(user_id).await?;

        let role_names: Vec<RoleName> = assigned_roles
            .iter()
            .filter(|assigned| assigned.is_effective())
            .map(|assigned| assigned.role.name.clone())
            .collect();

        // The remaining reads are independent of each other and run
        // concurrently; the role-name join key is the only reason assignments
        // go first. A single failed fetch fails the whole resolution: a
        // partial permission set is a security hazard, not a degraded answer.
        let (route_permissions, overrides, language_access, routes) = tokio::try_join!(
            self.store.find_route_permissions(&role_names),
            self.store.find_active_overrides(user_id),
            self.store.find_language_access(&role_names),
            self.store.find_active_routes(),
        )?;

        let records = PermissionRecords {
            assigned_roles,
            route_permissions,
            overrides,
            language_access,
            routes,
        };

        Ok(resolve(user_id, &records, Utc::now()))
    }

    async fn route_matches(
        &self,
        route: &Route,
        requested: &str,
        language: LanguageCode,
    ) -> AppResult<bool> {
        if normalize_pathname(&route.pathname) == requested {
            return Ok(true);
        }

        let translated = self.translator.translated_path(route.id, language).await?;
        Ok(translated.is_some_and(|pathname| normalize_pathname(&pathname) == requested))
    }
}

#[cfg(test)]
mod tests;
