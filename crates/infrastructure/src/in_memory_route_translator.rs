use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use waypass_application::RouteTranslator;
use waypass_core::AppResult;
use waypass_domain::{LanguageCode, RouteId, RouteTranslation};

/// In-memory route translator backed by translation rows.
#[derive(Debug, Default)]
pub struct InMemoryRouteTranslator {
    translations: RwLock<HashMap<(RouteId, LanguageCode), RouteTranslation>>,
}

impl InMemoryRouteTranslator {
    /// Creates an empty in-memory translator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the translation row for its (route, language) pair.
    pub async fn insert_translation(&self, translation: RouteTranslation) {
        self.translations
            .write()
            .await
            .insert((translation.route_id, translation.language), translation);
    }
}

#[async_trait]
impl RouteTranslator for InMemoryRouteTranslator {
    async fn translated_path(
        &self,
        route_id: RouteId,
        language: LanguageCode,
    ) -> AppResult<Option<String>> {
        Ok(self
            .translations
            .read()
            .await
            .get(&(route_id, language))
            .filter(|translation| translation.is_active)
            .map(|translation| translation.translated_path.clone()))
    }
}
