use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{StorageError, StorageResult, SubjectStore};
use trialvault_core::model::{NewSubject, Subject, SubjectStatus};

/// PostgreSQL implementation of SubjectStore
pub struct PostgresSubjectStore {
    pool: PgPool,
}

impl PostgresSubjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for subjects
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id UUID PRIMARY KEY,
                site_id UUID NOT NULL REFERENCES sites(id),
                screening_number TEXT NOT NULL,
                study_arm TEXT NOT NULL,
                status TEXT NOT NULL,
                enrolled_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (site_id, screening_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_subjects_site ON subjects(site_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_subject(row: sqlx::postgres::PgRow) -> StorageResult<Subject> {
    let status: String = row.get("status");
    Ok(Subject {
        id: row.get("id"),
        site_id: row.get("site_id"),
        screening_number: row.get("screening_number"),
        study_arm: row.get("study_arm"),
        status: SubjectStatus::parse(&status)
            .ok_or_else(|| StorageError::Internal(format!("unknown subject status: {}", status)))?,
        enrolled_at: row.get("enrolled_at"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl SubjectStore for PostgresSubjectStore {
    async fn create_subject(&self, new: &NewSubject) -> StorageResult<Subject> {
        let subject = Subject {
            id: Uuid::new_v4(),
            site_id: new.site_id,
            screening_number: new.screening_number.clone(),
            study_arm: new.study_arm.clone(),
            status: new.status,
            enrolled_at: new.enrolled_at,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO subjects
                (id, site_id, screening_number, study_arm, status, enrolled_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subject.id)
        .bind(subject.site_id)
        .bind(&subject.screening_number)
        .bind(&subject.study_arm)
        .bind(subject.status.as_str())
        .bind(subject.enrolled_at)
        .bind(subject.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StorageError::DuplicateScreeningNumber(new.screening_number.clone());
                }
                if db_err.is_foreign_key_violation() {
                    return StorageError::SiteNotFound(new.site_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(subject)
    }

    async fn get_subject(&self, id: Uuid) -> StorageResult<Subject> {
        let row = sqlx::query(
            r#"
            SELECT id, site_id, screening_number, study_arm, status, enrolled_at, created_at
            FROM subjects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::SubjectNotFound(id))?;

        row_to_subject(row)
    }

    async fn list_subjects(
        &self,
        site_id: Option<Uuid>,
        study_arm: Option<&str>,
        status: Option<SubjectStatus>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Subject>, u64)> {
        let status_str = status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, site_id, screening_number, study_arm, status, enrolled_at, created_at
            FROM subjects
            WHERE ($1::uuid IS NULL OR site_id = $1)
              AND ($2::text IS NULL OR LOWER(study_arm) = LOWER($2))
              AND ($3::text IS NULL OR status = $3)
            ORDER BY screening_number
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(site_id)
        .bind(study_arm)
        .bind(status_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM subjects
            WHERE ($1::uuid IS NULL OR site_id = $1)
              AND ($2::text IS NULL OR LOWER(study_arm) = LOWER($2))
              AND ($3::text IS NULL OR status = $3)
            "#,
        )
        .bind(site_id)
        .bind(study_arm)
        .bind(status_str)
        .fetch_one(&self.pool)
        .await?;

        let subjects = rows
            .into_iter()
            .map(row_to_subject)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((subjects, total as u64))
    }
}
