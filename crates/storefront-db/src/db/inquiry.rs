use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres};
use storefront_core::models::{Inquiry, InquiryCounts, InquiryFilter, InquiryStatus};
use storefront_core::AppError;
use uuid::Uuid;

use super::corrupt_column;

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn create(&self, inquiry: Inquiry) -> Result<Inquiry, AppError>;

    async fn get(&self, id: Uuid) -> Result<Inquiry, AppError>;

    /// Newest first, narrowed by the filter.
    async fn list(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
        admin_notes: Option<String>,
    ) -> Result<Inquiry, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn count_by_status(&self) -> Result<InquiryCounts, AppError>;

    /// The `limit` newest inquiries.
    async fn recent(&self, limit: usize) -> Result<Vec<Inquiry>, AppError>;
}

pub(crate) fn inquiry_not_found() -> AppError {
    AppError::NotFound("Inquiry not found".to_string())
}

#[derive(FromRow)]
struct InquiryRow {
    id: Uuid,
    name: String,
    mobile: String,
    email: String,
    requirement: String,
    product_type: String,
    product_id: Option<Uuid>,
    product_title: Option<String>,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InquiryRow> for Inquiry {
    type Error = AppError;

    fn try_from(row: InquiryRow) -> Result<Self, Self::Error> {
        Ok(Inquiry {
            id: row.id,
            name: row.name,
            mobile: row.mobile,
            email: row.email,
            requirement: row.requirement,
            product_type: row
                .product_type
                .parse()
                .map_err(|e| corrupt_column("product_type", e))?,
            product_id: row.product_id,
            product_title: row.product_title,
            status: row.status.parse().map_err(|e| corrupt_column("status", e))?,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const INQUIRY_COLUMNS: &str = "id, name, mobile, email, requirement, product_type, \
    product_id, product_title, status, admin_notes, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresInquiryRepository {
    pool: PgPool,
}

impl PostgresInquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InquiryRepository for PostgresInquiryRepository {
    #[tracing::instrument(skip(self, inquiry), fields(db.table = "inquiries", db.operation = "insert"))]
    async fn create(&self, inquiry: Inquiry) -> Result<Inquiry, AppError> {
        let row = sqlx::query_as::<Postgres, InquiryRow>(&format!(
            r#"
            INSERT INTO inquiries ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            INQUIRY_COLUMNS, INQUIRY_COLUMNS
        ))
        .bind(inquiry.id)
        .bind(&inquiry.name)
        .bind(&inquiry.mobile)
        .bind(&inquiry.email)
        .bind(&inquiry.requirement)
        .bind(inquiry.product_type.as_str())
        .bind(inquiry.product_id)
        .bind(&inquiry.product_title)
        .bind(inquiry.status.as_str())
        .bind(&inquiry.admin_notes)
        .bind(inquiry.created_at)
        .bind(inquiry.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Inquiry::try_from(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inquiries", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Inquiry, AppError> {
        let row = sqlx::query_as::<Postgres, InquiryRow>(&format!(
            "SELECT {} FROM inquiries WHERE id = $1",
            INQUIRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Inquiry::try_from)
            .transpose()?
            .ok_or_else(inquiry_not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inquiries", db.operation = "select"))]
    async fn list(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>, AppError> {
        let rows = sqlx::query_as::<Postgres, InquiryRow>(&format!(
            r#"
            SELECT {} FROM inquiries
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR product_type = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)
            ORDER BY created_at DESC
            "#,
            INQUIRY_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.product_type.map(|t| t.as_str()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Inquiry::try_from).collect()
    }

    #[tracing::instrument(skip(self, admin_notes), fields(db.table = "inquiries", db.operation = "update", db.record_id = %id))]
    async fn update_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
        admin_notes: Option<String>,
    ) -> Result<Inquiry, AppError> {
        let row = sqlx::query_as::<Postgres, InquiryRow>(&format!(
            r#"
            UPDATE inquiries
            SET status = $2, admin_notes = COALESCE($3, admin_notes), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INQUIRY_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(admin_notes)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Inquiry::try_from)
            .transpose()?
            .ok_or_else(inquiry_not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inquiries", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM inquiries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(inquiry_not_found());
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "inquiries", db.operation = "select"))]
    async fn count_by_status(&self) -> Result<InquiryCounts, AppError> {
        let rows = sqlx::query_as::<Postgres, (String, i64)>(
            "SELECT status, COUNT(*) FROM inquiries GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = InquiryCounts::default();
        for (status, count) in rows {
            let status: InquiryStatus = status.parse().map_err(|e| corrupt_column("status", e))?;
            counts.add(status, count);
        }
        Ok(counts)
    }

    #[tracing::instrument(skip(self), fields(db.table = "inquiries", db.operation = "select"))]
    async fn recent(&self, limit: usize) -> Result<Vec<Inquiry>, AppError> {
        let rows = sqlx::query_as::<Postgres, InquiryRow>(&format!(
            "SELECT {} FROM inquiries ORDER BY created_at DESC LIMIT $1",
            INQUIRY_COLUMNS
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Inquiry::try_from).collect()
    }
}
