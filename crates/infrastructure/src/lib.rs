//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_store;
mod in_memory_permissions_cache;
mod in_memory_route_translator;
mod postgres_permission_store;
mod postgres_route_translator;

pub use in_memory_permission_store::InMemoryPermissionStore;
pub use in_memory_permissions_cache::InMemoryPermissionsCache;
pub use in_memory_route_translator::InMemoryRouteTranslator;
pub use postgres_permission_store::PostgresPermissionStore;
pub use postgres_route_translator::PostgresRouteTranslator;
