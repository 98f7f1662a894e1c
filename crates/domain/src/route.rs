//! Route records and pathname normalization.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LanguageCode;

/// Unique identifier for a route record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(Uuid);

impl RouteId {
    /// Creates a random route identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a route identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RouteId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RouteId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Normalizes a pathname for exact-match comparison.
///
/// Ensures a leading `/` and strips any trailing `/` except on the root
/// path. Routes are enumerable, finite strings; no glob or regex matching
/// is defined anywhere in the engine.
#[must_use]
pub fn normalize_pathname(pathname: &str) -> String {
    let trimmed = pathname.trim();

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    };

    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// A canonical, locale-independent navigable path in the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Stable route identifier.
    pub id: RouteId,
    /// Canonical, locale-independent pathname (normalized).
    pub pathname: String,
    /// Inactive routes are never resolvable.
    pub is_active: bool,
    /// Public routes are accessible without authentication.
    pub is_public: bool,
    /// Soft-delete marker; a deleted route is never resolvable.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Route {
    /// Returns whether this route can appear in any permission decision.
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// Localized pathname for one route and language.
///
/// Translations participate only in pathname matching and listing; permission
/// decisions always operate on the route id and canonical pathname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTranslation {
    /// Route this translation belongs to.
    pub route_id: RouteId,
    /// Language the translated path serves.
    pub language: LanguageCode,
    /// Localized pathname (normalized).
    pub translated_path: String,
    /// Inactive translations are ignored.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Route, RouteId, normalize_pathname};

    #[test]
    fn normalization_adds_leading_slash() {
        assert_eq!(normalize_pathname("books/manage"), "/books/manage");
    }

    #[test]
    fn normalization_strips_trailing_slashes() {
        assert_eq!(normalize_pathname("/diary/"), "/diary");
        assert_eq!(normalize_pathname("/diary///"), "/diary");
    }

    #[test]
    fn root_path_survives_normalization() {
        assert_eq!(normalize_pathname("/"), "/");
        assert_eq!(normalize_pathname(""), "/");
    }

    #[test]
    fn soft_deleted_route_is_not_resolvable() {
        let route = Route {
            id: RouteId::new(),
            pathname: "/books".to_owned(),
            is_active: true,
            is_public: false,
            deleted_at: Some(Utc::now()),
        };
        assert!(!route.is_resolvable());
    }

    #[test]
    fn inactive_route_is_not_resolvable() {
        let route = Route {
            id: RouteId::new(),
            pathname: "/books".to_owned(),
            is_active: false,
            is_public: true,
            deleted_at: None,
        };
        assert!(!route.is_resolvable());
    }
}
