use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use waypass_application::RouteTranslator;
use waypass_core::{AppError, AppResult};
use waypass_domain::{LanguageCode, RouteId};

/// PostgreSQL-backed route translator.
#[derive(Clone)]
pub struct PostgresRouteTranslator {
    pool: PgPool,
}

impl PostgresRouteTranslator {
    /// Creates a translator with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TranslationRow {
    translated_path: String,
}

#[async_trait]
impl RouteTranslator for PostgresRouteTranslator {
    async fn translated_path(
        &self,
        route_id: RouteId,
        language: LanguageCode,
    ) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT translated_path
            FROM route_translations
            WHERE route_id = $1
                AND language_code = $2
                AND is_active = TRUE
            "#,
        )
        .bind(route_id.as_uuid())
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to load route translation: {error}"))
        })?;

        Ok(row.map(|row| row.translated_path))
    }
}
