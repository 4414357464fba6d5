use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres};
use storefront_core::models::Visitor;
use storefront_core::AppError;
use uuid::Uuid;

use super::corrupt_column;

#[async_trait]
pub trait VisitorRepository: Send + Sync {
    async fn create(&self, visitor: Visitor) -> Result<Visitor, AppError>;

    /// Newest visit first.
    async fn list(&self) -> Result<Vec<Visitor>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

pub(crate) fn visitor_not_found() -> AppError {
    AppError::NotFound("Visitor not found".to_string())
}

#[derive(FromRow)]
struct VisitorRow {
    id: Uuid,
    name: String,
    email: String,
    mobile: String,
    preference: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    visited_at: DateTime<Utc>,
}

impl TryFrom<VisitorRow> for Visitor {
    type Error = AppError;

    fn try_from(row: VisitorRow) -> Result<Self, Self::Error> {
        Ok(Visitor {
            id: row.id,
            name: row.name,
            email: row.email,
            mobile: row.mobile,
            preference: row
                .preference
                .parse()
                .map_err(|e| corrupt_column("preference", e))?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            visited_at: row.visited_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresVisitorRepository {
    pool: PgPool,
}

impl PostgresVisitorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitorRepository for PostgresVisitorRepository {
    #[tracing::instrument(skip(self, visitor), fields(db.table = "visitors", db.operation = "insert"))]
    async fn create(&self, visitor: Visitor) -> Result<Visitor, AppError> {
        let row = sqlx::query_as::<Postgres, VisitorRow>(
            r#"
            INSERT INTO visitors (id, name, email, mobile, preference, ip_address, user_agent, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, email, mobile, preference, ip_address, user_agent, visited_at
            "#,
        )
        .bind(visitor.id)
        .bind(&visitor.name)
        .bind(&visitor.email)
        .bind(&visitor.mobile)
        .bind(visitor.preference.as_str())
        .bind(&visitor.ip_address)
        .bind(&visitor.user_agent)
        .bind(visitor.visited_at)
        .fetch_one(&self.pool)
        .await?;

        Visitor::try_from(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "visitors", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Visitor>, AppError> {
        let rows = sqlx::query_as::<Postgres, VisitorRow>(
            "SELECT id, name, email, mobile, preference, ip_address, user_agent, visited_at FROM visitors ORDER BY visited_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Visitor::try_from).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "visitors", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(visitor_not_found());
        }
        Ok(())
    }
}
