use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use storefront_core::models::{CatalogCounts, CatalogEntity, CatalogKind, MediaRef, Price};
use storefront_core::AppError;
use uuid::Uuid;

use super::{corrupt_column, map_write_error};

const SLUG_CONFLICT: &str = "An entry with this slug already exists";

/// Catalog document store
///
/// `save` is a versioned write: it succeeds only when the stored version
/// equals `entity.version`, and the returned entity carries the bumped
/// version. A stale version yields `AppError::Conflict`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Load an entity of the given kind; `NotFound` when absent.
    async fn get(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError>;

    /// Insert a new entity as given (version 1).
    async fn create(&self, entity: CatalogEntity) -> Result<CatalogEntity, AppError>;

    /// Write back a loaded entity under optimistic concurrency.
    async fn save(&self, entity: CatalogEntity) -> Result<CatalogEntity, AppError>;

    /// Remove an entity and return the removed document.
    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError>;

    /// Admin listing: every entity of the kind, by display order then newest first.
    async fn list_by_kind(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, AppError>;

    /// Public listing: visible entities, optionally within one category.
    async fn list_visible(
        &self,
        kind: CatalogKind,
        category: Option<&str>,
    ) -> Result<Vec<CatalogEntity>, AppError>;

    /// Distinct categories of visible entities, sorted.
    async fn categories(&self, kind: CatalogKind) -> Result<Vec<String>, AppError>;

    /// Visible entity by slug.
    async fn get_by_slug(&self, kind: CatalogKind, slug: &str) -> Result<CatalogEntity, AppError>;

    /// Flip the visibility flag and return the updated entity.
    async fn toggle_visibility(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<CatalogEntity, AppError>;

    /// Entries per collection, hidden ones included.
    async fn count_by_kind(&self) -> Result<CatalogCounts, AppError>;
}

pub(crate) fn not_found(kind: CatalogKind) -> AppError {
    AppError::NotFound(format!("{} not found", kind.label()))
}

pub(crate) fn version_conflict(kind: CatalogKind) -> AppError {
    AppError::Conflict(format!(
        "{} was modified by another request",
        kind.label()
    ))
}

const CATALOG_COLUMNS: &str = "id, kind, title, slug, category, short_description, \
    full_description, description, features, price, is_visible, is_available, \
    display_order, featured_image, gallery, version, created_at, updated_at";

#[derive(FromRow)]
struct CatalogRow {
    id: Uuid,
    kind: String,
    title: String,
    slug: Option<String>,
    category: Option<String>,
    short_description: Option<String>,
    full_description: Option<String>,
    description: Option<String>,
    features: Json<Vec<String>>,
    price: Option<Json<Price>>,
    is_visible: bool,
    is_available: bool,
    display_order: i32,
    featured_image: Option<Json<MediaRef>>,
    gallery: Json<Vec<MediaRef>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CatalogRow> for CatalogEntity {
    type Error = AppError;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        Ok(CatalogEntity {
            id: row.id,
            kind: row.kind.parse().map_err(|e| corrupt_column("kind", e))?,
            title: row.title,
            slug: row.slug,
            category: row.category,
            short_description: row.short_description,
            full_description: row.full_description,
            description: row.description,
            features: row.features.0,
            price: row.price.map(|p| p.0),
            is_visible: row.is_visible,
            is_available: row.is_available,
            display_order: row.display_order,
            featured_image: row.featured_image.map(|m| m.0),
            gallery: row.gallery.0,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_entities(rows: Vec<CatalogRow>) -> Result<Vec<CatalogEntity>, AppError> {
    rows.into_iter().map(CatalogEntity::try_from).collect()
}

/// Postgres-backed catalog repository; media refs live in JSONB columns.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select", db.record_id = %id))]
    async fn get(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            "SELECT {} FROM catalog_entities WHERE id = $1 AND kind = $2",
            CATALOG_COLUMNS
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogEntity::try_from)
            .transpose()?
            .ok_or_else(|| not_found(kind))
    }

    #[tracing::instrument(skip(self, entity), fields(db.table = "catalog_entities", db.operation = "insert", db.record_id = %entity.id))]
    async fn create(&self, entity: CatalogEntity) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            r#"
            INSERT INTO catalog_entities ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            CATALOG_COLUMNS, CATALOG_COLUMNS
        ))
        .bind(entity.id)
        .bind(entity.kind.as_str())
        .bind(&entity.title)
        .bind(&entity.slug)
        .bind(&entity.category)
        .bind(&entity.short_description)
        .bind(&entity.full_description)
        .bind(&entity.description)
        .bind(Json(&entity.features))
        .bind(entity.price.as_ref().map(Json))
        .bind(entity.is_visible)
        .bind(entity.is_available)
        .bind(entity.display_order)
        .bind(entity.featured_image.as_ref().map(Json))
        .bind(Json(&entity.gallery))
        .bind(entity.version)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, SLUG_CONFLICT))?;

        CatalogEntity::try_from(row)
    }

    #[tracing::instrument(skip(self, entity), fields(db.table = "catalog_entities", db.operation = "update", db.record_id = %entity.id, db.version = entity.version))]
    async fn save(&self, entity: CatalogEntity) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            r#"
            UPDATE catalog_entities SET
                title = $4, slug = $5, category = $6, short_description = $7,
                full_description = $8, description = $9, features = $10, price = $11,
                is_visible = $12, is_available = $13, display_order = $14,
                featured_image = $15, gallery = $16,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND kind = $2 AND version = $3
            RETURNING {}
            "#,
            CATALOG_COLUMNS
        ))
        .bind(entity.id)
        .bind(entity.kind.as_str())
        .bind(entity.version)
        .bind(&entity.title)
        .bind(&entity.slug)
        .bind(&entity.category)
        .bind(&entity.short_description)
        .bind(&entity.full_description)
        .bind(&entity.description)
        .bind(Json(&entity.features))
        .bind(entity.price.as_ref().map(Json))
        .bind(entity.is_visible)
        .bind(entity.is_available)
        .bind(entity.display_order)
        .bind(entity.featured_image.as_ref().map(Json))
        .bind(Json(&entity.gallery))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, SLUG_CONFLICT))?;

        if let Some(row) = row {
            return CatalogEntity::try_from(row);
        }

        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM catalog_entities WHERE id = $1 AND kind = $2)",
        )
        .bind(entity.id)
        .bind(entity.kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        if exists {
            tracing::warn!(
                entity_id = %entity.id,
                expected_version = entity.version,
                "Catalog save rejected: version mismatch"
            );
            Err(version_conflict(entity.kind))
        } else {
            Err(not_found(entity.kind))
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            "DELETE FROM catalog_entities WHERE id = $1 AND kind = $2 RETURNING {}",
            CATALOG_COLUMNS
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogEntity::try_from)
            .transpose()?
            .ok_or_else(|| not_found(kind))
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select"))]
    async fn list_by_kind(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, AppError> {
        let rows = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            "SELECT {} FROM catalog_entities WHERE kind = $1 ORDER BY display_order ASC, created_at DESC",
            CATALOG_COLUMNS
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select"))]
    async fn list_visible(
        &self,
        kind: CatalogKind,
        category: Option<&str>,
    ) -> Result<Vec<CatalogEntity>, AppError> {
        let rows = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            r#"
            SELECT {} FROM catalog_entities
            WHERE kind = $1 AND is_visible = TRUE AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY display_order ASC, created_at DESC
            "#,
            CATALOG_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select"))]
    async fn categories(&self, kind: CatalogKind) -> Result<Vec<String>, AppError> {
        let categories = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT DISTINCT category FROM catalog_entities
            WHERE kind = $1 AND is_visible = TRUE AND category IS NOT NULL
            ORDER BY category ASC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select"))]
    async fn get_by_slug(&self, kind: CatalogKind, slug: &str) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            "SELECT {} FROM catalog_entities WHERE kind = $1 AND slug = $2 AND is_visible = TRUE",
            CATALOG_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogEntity::try_from)
            .transpose()?
            .ok_or_else(|| not_found(kind))
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "update", db.record_id = %id))]
    async fn toggle_visibility(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<CatalogEntity, AppError> {
        let row = sqlx::query_as::<Postgres, CatalogRow>(&format!(
            r#"
            UPDATE catalog_entities
            SET is_visible = NOT is_visible, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND kind = $2
            RETURNING {}
            "#,
            CATALOG_COLUMNS
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogEntity::try_from)
            .transpose()?
            .ok_or_else(|| not_found(kind))
    }

    #[tracing::instrument(skip(self), fields(db.table = "catalog_entities", db.operation = "select"))]
    async fn count_by_kind(&self) -> Result<CatalogCounts, AppError> {
        let rows = sqlx::query_as::<Postgres, (String, i64)>(
            "SELECT kind, COUNT(*) FROM catalog_entities GROUP BY kind",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CatalogCounts::default();
        for (kind, count) in rows {
            let kind: CatalogKind = kind.parse().map_err(|e| corrupt_column("kind", e))?;
            counts.set(kind, count);
        }
        Ok(counts)
    }
}
