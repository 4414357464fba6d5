use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use storefront_core::models::{default_content, MediaRef, TeamMember, WebsiteSettings};
use storefront_core::AppError;

/// Singleton settings document with the same versioned save as catalog entities.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Current settings, created with defaults on first access.
    async fn get_or_create(&self) -> Result<WebsiteSettings, AppError>;

    /// Versioned write; `Conflict` when the stored version moved on.
    async fn save(&self, settings: WebsiteSettings) -> Result<WebsiteSettings, AppError>;
}

pub(crate) fn settings_conflict() -> AppError {
    AppError::Conflict("Website settings were modified by another request".to_string())
}

#[derive(FromRow)]
struct SettingsRow {
    logo: Option<Json<MediaRef>>,
    about_image: Option<Json<MediaRef>>,
    content: Json<Value>,
    team_members: Json<Vec<TeamMember>>,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for WebsiteSettings {
    fn from(row: SettingsRow) -> Self {
        WebsiteSettings {
            logo: row.logo.map(|m| m.0),
            about_image: row.about_image.map(|m| m.0),
            content: row.content.0,
            team_members: row.team_members.0,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    #[tracing::instrument(skip(self), fields(db.table = "website_settings", db.operation = "select"))]
    async fn get_or_create(&self) -> Result<WebsiteSettings, AppError> {
        // The singleton row has id 1; concurrent first reads race on the insert.
        sqlx::query(
            r#"
            INSERT INTO website_settings (id, content, version, updated_at)
            VALUES (1, $1, 1, NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Json(default_content()))
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<Postgres, SettingsRow>(
            "SELECT logo, about_image, content, team_members, version, updated_at FROM website_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self, settings), fields(db.table = "website_settings", db.operation = "update", db.version = settings.version))]
    async fn save(&self, settings: WebsiteSettings) -> Result<WebsiteSettings, AppError> {
        let row = sqlx::query_as::<Postgres, SettingsRow>(
            r#"
            UPDATE website_settings
            SET logo = $2, about_image = $3, content = $4, team_members = $5,
                version = version + 1, updated_at = NOW()
            WHERE id = 1 AND version = $1
            RETURNING logo, about_image, content, team_members, version, updated_at
            "#,
        )
        .bind(settings.version)
        .bind(settings.logo.as_ref().map(Json))
        .bind(settings.about_image.as_ref().map(Json))
        .bind(Json(&settings.content))
        .bind(Json(&settings.team_members))
        .fetch_optional(&self.pool)
        .await?;

        row.map(WebsiteSettings::from).ok_or_else(settings_conflict)
    }
}
