use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use waypass_application::PermissionsCache;
use waypass_core::{AppResult, UserId};
use waypass_domain::UserPermissions;

#[derive(Debug, Clone)]
struct CacheEntry {
    permissions: UserPermissions,
    expires_at: Instant,
}

/// In-memory short-TTL cache for resolved permissions.
#[derive(Debug, Default)]
pub struct InMemoryPermissionsCache {
    entries: RwLock<HashMap<UserId, CacheEntry>>,
}

impl InMemoryPermissionsCache {
    /// Creates an empty in-memory permissions cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionsCache for InMemoryPermissionsCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<UserPermissions>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user_id) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.permissions.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&user_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(&user_id);
        }

        Ok(None)
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

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            user_id,
            CacheEntry {
                permissions,
                expires_at,
            },
        );

        Ok(())
    }

    async fn invalidate(&self, user_id: UserId) -> AppResult<()> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }
}
