use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{CatalogStore, StorageError, StorageResult};
use trialvault_core::model::{
    AssetModality, NewProcedure, NewStudyEvent, Procedure, StudyEvent,
};

/// PostgreSQL implementation of the study event / procedure catalog
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for study events and procedures
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS study_events (
                id UUID PRIMARY KEY,
                trial_id UUID NOT NULL REFERENCES trials(id),
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE (trial_id, code)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS procedures (
                id UUID PRIMARY KEY,
                trial_id UUID NOT NULL REFERENCES trials(id),
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                modality TEXT NOT NULL,
                UNIQUE (trial_id, code)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_event(row: sqlx::postgres::PgRow) -> StudyEvent {
    StudyEvent {
        id: row.get("id"),
        trial_id: row.get("trial_id"),
        code: row.get("code"),
        name: row.get("name"),
        sort_order: row.get("sort_order"),
    }
}

fn row_to_procedure(row: sqlx::postgres::PgRow) -> StorageResult<Procedure> {
    let modality: String = row.get("modality");
    Ok(Procedure {
        id: row.get("id"),
        trial_id: row.get("trial_id"),
        code: row.get("code"),
        name: row.get("name"),
        modality: AssetModality::parse(&modality)
            .ok_or_else(|| StorageError::Internal(format!("unknown modality: {}", modality)))?,
    })
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn create_event(&self, new: &NewStudyEvent) -> StorageResult<StudyEvent> {
        let event = StudyEvent {
            id: Uuid::new_v4(),
            trial_id: new.trial_id,
            code: new.code.clone(),
            name: new.name.clone(),
            sort_order: new.sort_order,
        };

        sqlx::query(
            r#"
            INSERT INTO study_events (id, trial_id, code, name, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id)
        .bind(event.trial_id)
        .bind(&event.code)
        .bind(&event.name)
        .bind(event.sort_order)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return StorageError::TrialNotFound(new.trial_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> StorageResult<StudyEvent> {
        let row = sqlx::query(
            r#"
            SELECT id, trial_id, code, name, sort_order
            FROM study_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::EventNotFound(id))?;

        Ok(row_to_event(row))
    }

    async fn list_events(&self, trial_id: Option<Uuid>) -> StorageResult<Vec<StudyEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, trial_id, code, name, sort_order
            FROM study_events
            WHERE ($1::uuid IS NULL OR trial_id = $1)
            ORDER BY sort_order, name
            "#,
        )
        .bind(trial_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_event).collect())
    }

    async fn create_procedure(&self, new: &NewProcedure) -> StorageResult<Procedure> {
        let procedure = Procedure {
            id: Uuid::new_v4(),
            trial_id: new.trial_id,
            code: new.code.clone(),
            name: new.name.clone(),
            modality: new.modality,
        };

        sqlx::query(
            r#"
            INSERT INTO procedures (id, trial_id, code, name, modality)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(procedure.id)
        .bind(procedure.trial_id)
        .bind(&procedure.code)
        .bind(&procedure.name)
        .bind(procedure.modality.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return StorageError::TrialNotFound(new.trial_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(procedure)
    }

    async fn get_procedure(&self, id: Uuid) -> StorageResult<Procedure> {
        let row = sqlx::query(
            r#"
            SELECT id, trial_id, code, name, modality
            FROM procedures
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::ProcedureNotFound(id))?;

        row_to_procedure(row)
    }

    async fn list_procedures(
        &self,
        trial_id: Option<Uuid>,
        modality: Option<AssetModality>,
    ) -> StorageResult<Vec<Procedure>> {
        let modality_str = modality.map(|m| m.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, trial_id, code, name, modality
            FROM procedures
            WHERE ($1::uuid IS NULL OR trial_id = $1)
              AND ($2::text IS NULL OR modality = $2)
            ORDER BY name
            "#,
        )
        .bind(trial_id)
        .bind(modality_str)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_procedure).collect()
    }
}
