use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use waypass_core::{AppError, AppResult, UserId};
use waypass_domain::{
    AssignedRole, LanguageCode, Role, RoleId, RoleLanguageAccess, RoleName, Route, RouteId,
    RoutePermission, UserPermissions, UserRoleAssignment, UserRouteOverride,
};

use super::{PermissionStore, PermissionsCache, RouteAccessService, RouteTranslator};

#[derive(Default)]
struct FakePermissionStore {
    assigned_roles: Vec<AssignedRole>,
    route_permissions: Vec<RoutePermission>,
    overrides: Vec<UserRouteOverride>,
    language_access: Vec<RoleLanguageAccess>,
    routes: Vec<Route>,
    unavailable: bool,
    assignment_reads: AtomicUsize,
}

impl FakePermissionStore {
    fn check_available(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::Unavailable("permission store offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for FakePermissionStore {
    async fn find_active_role_assignments(&self, user_id: UserId) -> AppResult<Vec<AssignedRole>> {
        self.check_available()?;
        self.assignment_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .assigned_roles
            .iter()
            .filter(|assigned| assigned.assignment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_route_permissions(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoutePermission>> {
        self.check_available()?;
        Ok(self
            .route_permissions
            .iter()
            .filter(|grant| role_names.contains(&grant.role_name))
            .cloned()
            .collect())
    }

    async fn find_active_overrides(&self, user_id: UserId) -> AppResult<Vec<UserRouteOverride>> {
        self.check_available()?;
        Ok(self
            .overrides
            .iter()
            .filter(|value| value.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_language_access(
        &self,
        role_names: &[RoleName],
    ) -> AppResult<Vec<RoleLanguageAccess>> {
        self.check_available()?;
        Ok(self
            .language_access
            .iter()
            .filter(|row| role_names.contains(&row.role_name))
            .cloned()
            .collect())
    }

    async fn find_active_routes(&self) -> AppResult<Vec<Route>> {
        self.check_available()?;
        Ok(self.routes.clone())
    }
}

#[derive(Default)]
struct FakeRouteTranslator {
    translations: HashMap<(RouteId, LanguageCode), String>,
}

#[async_trait]
impl RouteTranslator for FakeRouteTranslator {
    async fn translated_path(
        &self,
        route_id: RouteId,
        language: LanguageCode,
    ) -> AppResult<Option<String>> {
        Ok(self.translations.get(&(route_id, language)).cloned())
    }
}

#[derive(Default)]
struct FakePermissionsCache {
    entries: Mutex<HashMap<UserId, UserPermissions>>,
    fail_reads: bool,
}

#[async_trait]
impl PermissionsCache for FakePermissionsCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<UserPermissions>> {
        if self.fail_reads {
            return Err(AppError::Unavailable("cache offline".to_owned()));
        }
        Ok(self.entries.lock().await.get(&user_id).cloned())
    }

    async fn set(
        &self,
        user_id: UserId,
        permissions: UserPermissions,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.entries.lock().await.insert(user_id, permissions);
        Ok(())
    }

    async fn invalidate(&self, user_id: UserId) -> AppResult<()> {
        self.entries.lock().await.remove(&user_id);
        Ok(())
    }
}

fn role(name: &str, hierarchy_level: i32) -> Role {
    Role {
        id: RoleId::new(),
        name: RoleName::new(name).unwrap_or_else(|_| panic!("test")),
        hierarchy_level,
        is_active: true,
        is_system_role: false,
    }
}

fn assigned(user_id: UserId, role: Role) -> AssignedRole {
    AssignedRole {
        assignment: UserRoleAssignment {
            user_id,
            role_id: role.id,
            is_active: true,
            revoked_at: None,
        },
        role,
    }
}

fn route(pathname: &str, is_public: bool) -> Route {
    Route {
        id: RouteId::new(),
        pathname: pathname.to_owned(),
        is_active: true,
        is_public,
        deleted_at: None,
    }
}

fn grant(role_name: &str, route_id: RouteId) -> RoutePermission {
    RoutePermission {
        role_name: RoleName::new(role_name).unwrap_or_else(|_| panic!("test")),
        route_id,
        is_active: true,
    }
}

fn service(store: FakePermissionStore, translator: FakeRouteTranslator) -> RouteAccessService {
    RouteAccessService::new(Arc::new(store), Arc::new(translator))
}

#[tokio::test]
async fn anonymous_caller_matches_public_routes_only() {
    let public = route("/", true);
    let private = route("/books/manage", false);
    let store = FakePermissionStore {
        routes: vec![public, private],
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let public_access = service.can_access_route(None, "/", LanguageCode::En).await;
    let private_access = service
        .can_access_route(None, "/books/manage", LanguageCode::En)
        .await;

    assert!(matches!(public_access, Ok(true)));
    assert!(matches!(private_access, Ok(false)));
}

#[tokio::test]
async fn anonymous_caller_matches_translated_public_path() {
    let diary = route("/diario", true);
    let translator = FakeRouteTranslator {
        translations: HashMap::from([((diary.id, LanguageCode::En), "/diary".to_owned())]),
    };
    let store = FakePermissionStore {
        routes: vec![diary],
        ..FakePermissionStore::default()
    };
    let service = service(store, translator);

    let translated = service
        .can_access_route(None, "/diary", LanguageCode::En)
        .await;
    let wrong_language = service
        .can_access_route(None, "/diary", LanguageCode::Es)
        .await;

    assert!(matches!(translated, Ok(true)));
    assert!(matches!(wrong_language, Ok(false)));
}

#[tokio::test]
async fn role_grant_opens_the_granted_route() {
    let user_id = UserId::new();
    let managed = route("/books/manage", false);
    let other = route("/diary/manage", false);
    let store = FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("editor", 5))],
        route_permissions: vec![grant("editor", managed.id)],
        routes: vec![managed, other],
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let granted = service
        .can_access_route(Some(user_id), "/books/manage", LanguageCode::En)
        .await;
    let ungranted = service
        .can_access_route(Some(user_id), "/diary/manage", LanguageCode::En)
        .await;

    assert!(matches!(granted, Ok(true)));
    assert!(matches!(ungranted, Ok(false)));
}

#[tokio::test]
async fn allowed_routes_are_translated_for_the_language() {
    let user_id = UserId::new();
    let diary = route("/diario", false);
    let translator = FakeRouteTranslator {
        translations: HashMap::from([((diary.id, LanguageCode::En), "/diary".to_owned())]),
    };
    let store = FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("reader", 1))],
        route_permissions: vec![grant("reader", diary.id)],
        routes: vec![diary],
        ..FakePermissionStore::default()
    };
    let service = service(store, translator);

    let english = service.get_allowed_routes(user_id, LanguageCode::En).await;
    let spanish = service.get_allowed_routes(user_id, LanguageCode::Es).await;

    assert_eq!(english.unwrap_or_default(), vec!["/diary".to_owned()]);
    // No Spanish translation row exists, so the canonical pathname is used.
    assert_eq!(spanish.unwrap_or_default(), vec!["/diario".to_owned()]);
}

#[tokio::test]
async fn requested_pathname_is_normalized_before_matching() {
    let user_id = UserId::new();
    let managed = route("/books/manage", false);
    let store = FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("editor", 5))],
        route_permissions: vec![grant("editor", managed.id)],
        routes: vec![managed],
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let trailing_slash = service
        .can_access_route(Some(user_id), "/books/manage/", LanguageCode::En)
        .await;

    assert!(matches!(trailing_slash, Ok(true)));
}

#[tokio::test]
async fn store_failure_propagates_instead_of_denying() {
    let user_id = UserId::new();
    let store = FakePermissionStore {
        unavailable: true,
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let result = service
        .can_access_route(Some(user_id), "/books/manage", LanguageCode::En)
        .await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn denial_maps_to_forbidden_for_guards() {
    let user_id = UserId::new();
    let managed = route("/books/manage", false);
    let store = FakePermissionStore {
        routes: vec![managed],
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let result = service
        .require_route_access(Some(user_id), "/books/manage", LanguageCode::En)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn allowed_languages_come_from_the_resolved_decision() {
    let user_id = UserId::new();
    let store = FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("translator", 2))],
        language_access: vec![RoleLanguageAccess {
            role_name: RoleName::new("translator").unwrap_or_else(|_| panic!("test")),
            language: LanguageCode::Es,
            is_active: true,
        }],
        ..FakePermissionStore::default()
    };
    let service = service(store, FakeRouteTranslator::default());

    let languages = service.get_allowed_languages(user_id).await;

    assert_eq!(languages.unwrap_or_default(), vec![LanguageCode::Es]);
}

#[tokio::test]
async fn cached_decision_skips_the_store() {
    let user_id = UserId::new();
    let managed = route("/books/manage", false);
    let store = Arc::new(FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("editor", 5))],
        route_permissions: vec![grant("editor", managed.id)],
        routes: vec![managed],
        ..FakePermissionStore::default()
    });
    let service = RouteAccessService::with_cache(
        store.clone(),
        Arc::new(FakeRouteTranslator::default()),
        Arc::new(FakePermissionsCache::default()),
        60,
    );

    let first = service.get_user_permissions(user_id).await;
    let second = service.get_user_permissions(user_id).await;

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(store.assignment_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalidation_forces_a_fresh_resolution() {
    let user_id = UserId::new();
    let store = Arc::new(FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("editor", 5))],
        ..FakePermissionStore::default()
    });
    let service = RouteAccessService::with_cache(
        store.clone(),
        Arc::new(FakeRouteTranslator::default()),
        Arc::new(FakePermissionsCache::default()),
        60,
    );

    let first = service.get_user_permissions(user_id).await;
    let invalidated = service.invalidate_user(user_id).await;
    let second = service.get_user_permissions(user_id).await;

    assert!(first.is_ok());
    assert!(invalidated.is_ok());
    assert!(second.is_ok());
    assert_eq!(store.assignment_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cache_read_failure_degrades_to_the_store() {
    let user_id = UserId::new();
    let store = Arc::new(FakePermissionStore {
        assigned_roles: vec![assigned(user_id, role("editor", 5))],
        ..FakePermissionStore::default()
    });
    let cache = Arc::new(FakePermissionsCache {
        fail_reads: true,
        ..FakePermissionsCache::default()
    });
    let service = RouteAccessService::with_cache(
        store.clone(),
        Arc::new(FakeRouteTranslator::default()),
        cache,
        60,
    );

    let result = service.get_user_permissions(user_id).await;

    assert!(result.is_ok());
    assert_eq!(store.assignment_reads.load(Ordering::SeqCst), 1);
}
