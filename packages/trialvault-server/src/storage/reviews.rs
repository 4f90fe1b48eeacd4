use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{ReviewStore, StorageError, StorageResult};
use trialvault_core::model::{NewReview, Review, ReviewStatus};

/// PostgreSQL implementation of ReviewStore
pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for reviews
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id UUID PRIMARY KEY,
                asset_id UUID NOT NULL REFERENCES assets(id),
                reviewer TEXT NOT NULL,
                status TEXT NOT NULL,
                comment TEXT,
                reviewed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_reviews_asset ON reviews(asset_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_review(row: sqlx::postgres::PgRow) -> StorageResult<Review> {
    let status: String = row.get("status");
    Ok(Review {
        id: row.get("id"),
        asset_id: row.get("asset_id"),
        reviewer: row.get("reviewer"),
        status: ReviewStatus::parse(&status)
            .ok_or_else(|| StorageError::Internal(format!("unknown review status: {}", status)))?,
        comment: row.get("comment"),
        reviewed_at: row.get("reviewed_at"),
    })
}

#[async_trait]
impl ReviewStore for PostgresReviewStore {
    async fn create_review(&self, asset_id: Uuid, new: &NewReview) -> StorageResult<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            asset_id,
            reviewer: new.reviewer.clone(),
            status: new.status,
            comment: new.comment.clone(),
            reviewed_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO reviews (id, asset_id, reviewer, status, comment, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(review.asset_id)
        .bind(&review.reviewer)
        .bind(review.status.as_str())
        .bind(&review.comment)
        .bind(review.reviewed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return StorageError::AssetNotFound(asset_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(review)
    }

    async fn list_for_asset(&self, asset_id: Uuid) -> StorageResult<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, reviewer, status, comment, reviewed_at
            FROM reviews
            WHERE asset_id = $1
            ORDER BY reviewed_at DESC
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_review).collect()
    }

    async fn list_reviews(
        &self,
        status: Option<ReviewStatus>,
        reviewer: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Review>, u64)> {
        let status_str = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, reviewer, status, comment, reviewed_at
            FROM reviews
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR reviewer = $2)
            ORDER BY reviewed_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status_str)
        .bind(reviewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reviews
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR reviewer = $2)
            "#,
        )
        .bind(status_str)
        .bind(reviewer)
        .fetch_one(&self.pool)
        .await?;

        let reviews = rows
            .into_iter()
            .map(row_to_review)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((reviews, total as u64))
    }
}
