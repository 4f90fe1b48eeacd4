use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{StorageError, StorageResult, TrialStore};
use trialvault_core::model::{NewTrial, Trial, TrialPhase, TrialStatus};

/// PostgreSQL implementation of TrialStore
pub struct PostgresTrialStore {
    pool: PgPool,
}

impl PostgresTrialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for trials
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trials (
                id UUID PRIMARY KEY,
                protocol_code TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                sponsor TEXT NOT NULL,
                phase TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_trial(row: sqlx::postgres::PgRow) -> StorageResult<Trial> {
    let phase: String = row.get("phase");
    let status: String = row.get("status");
    Ok(Trial {
        id: row.get("id"),
        protocol_code: row.get("protocol_code"),
        title: row.get("title"),
        sponsor: row.get("sponsor"),
        phase: TrialPhase::parse(&phase)
            .ok_or_else(|| StorageError::Internal(format!("unknown trial phase: {}", phase)))?,
        status: TrialStatus::parse(&status)
            .ok_or_else(|| StorageError::Internal(format!("unknown trial status: {}", status)))?,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl TrialStore for PostgresTrialStore {
    async fn create_trial(&self, new: &NewTrial) -> StorageResult<Trial> {
        let trial = Trial {
            id: Uuid::new_v4(),
            protocol_code: new.protocol_code.clone(),
            title: new.title.clone(),
            sponsor: new.sponsor.clone(),
            phase: new.phase,
            status: new.status,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO trials (id, protocol_code, title, sponsor, phase, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(trial.id)
        .bind(&trial.protocol_code)
        .bind(&trial.title)
        .bind(&trial.sponsor)
        .bind(trial.phase.as_str())
        .bind(trial.status.as_str())
        .bind(trial.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StorageError::DuplicateProtocolCode(new.protocol_code.clone());
                }
            }
            StorageError::Database(e)
        })?;

        Ok(trial)
    }

    async fn get_trial(&self, id: Uuid) -> StorageResult<Trial> {
        let row = sqlx::query(
            r#"
            SELECT id, protocol_code, title, sponsor, phase, status, created_at
            FROM trials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::TrialNotFound(id))?;

        row_to_trial(row)
    }

    async fn get_trial_by_code(&self, protocol_code: &str) -> StorageResult<Trial> {
        let row = sqlx::query(
            r#"
            SELECT id, protocol_code, title, sponsor, phase, status, created_at
            FROM trials
            WHERE protocol_code = $1
            "#,
        )
        .bind(protocol_code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::TrialCodeNotFound(protocol_code.to_string()))?;

        row_to_trial(row)
    }

    async fn list_trials(
        &self,
        status: Option<TrialStatus>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Trial>, u64)> {
        let status_str = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, protocol_code, title, sponsor, phase, status, created_at
            FROM trials
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM trials
            WHERE ($1::text IS NULL OR status = $1)
            "#,
        )
        .bind(status_str)
        .fetch_one(&self.pool)
        .await?;

        let trials = rows
            .into_iter()
            .map(row_to_trial)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((trials, total as u64))
    }
}
