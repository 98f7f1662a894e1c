//! Domain records and the pure permission resolver.

#![forbid(unsafe_code)]

mod access;
mod language;
mod resolver;
mod role;
mod route;

pub use access::{
    AssignedRole, OverrideType, RoleLanguageAccess, RoutePermission, UserRoleAssignment,
    UserRouteOverride,
};
pub use language::LanguageCode;
pub use resolver::{PermissionRecords, UserPermissions, resolve};
pub use role::{Role, RoleId, RoleName};
pub use route::{Route, RouteId, RouteTranslation, normalize_pathname};
