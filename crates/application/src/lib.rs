//! Application services and ports.

#![forbid(unsafe_code)]

mod route_access_service;

pub use route_access_service::{
    PermissionStore, PermissionsCache, RouteAccessService, RouteTranslator,
};
