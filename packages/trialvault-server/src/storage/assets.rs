use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{AssetStore, StorageError, StorageResult};
use trialvault_core::filter::{AssetFilter, Sort, SortDirection, SortField};
use trialvault_core::model::{Asset, AssetModality, AssetRecord, NewAsset, ReviewStatus};

/// PostgreSQL implementation of AssetStore
pub struct PostgresAssetStore {
    pool: PgPool,
}

/// Joined SELECT producing the denormalized asset record. The review columns
/// come from the latest review per asset; assets with none are pending.
const RECORD_SELECT: &str = r#"
SELECT a.id AS asset_id,
       t.id AS trial_id, t.protocol_code, t.title AS trial_title,
       st.id AS site_id, st.site_number, st.name AS site_name, st.country AS site_country,
       su.id AS subject_id, su.screening_number, su.study_arm,
       e.id AS event_id, e.name AS event_name,
       p.id AS procedure_id, p.name AS procedure_name, p.modality,
       a.file_name, a.content_type, a.size_bytes, a.duration_seconds,
       a.uploaded_by, a.uploaded_at,
       COALESCE(r.status, 'pending') AS review_status, r.reviewer
"#;

const RECORD_FROM: &str = r#"
FROM assets a
JOIN subjects su ON su.id = a.subject_id
JOIN sites st ON st.id = su.site_id
JOIN trials t ON t.id = st.trial_id
JOIN study_events e ON e.id = a.event_id
JOIN procedures p ON p.id = a.procedure_id
LEFT JOIN (
    SELECT DISTINCT ON (asset_id) asset_id, status, reviewer
    FROM reviews
    ORDER BY asset_id, reviewed_at DESC
) r ON r.asset_id = a.id
"#;

/// Filter conditions bound as optional parameters, so one static statement
/// covers every filter combination. Duration bounds intentionally fail on
/// NULL durations, matching the in-memory predicate.
const RECORD_WHERE: &str = r#"
WHERE ($1::uuid IS NULL OR t.id = $1)
  AND ($2::uuid IS NULL OR st.id = $2)
  AND ($3::uuid IS NULL OR su.id = $3)
  AND ($4::uuid IS NULL OR a.event_id = $4)
  AND ($5::uuid IS NULL OR a.procedure_id = $5)
  AND ($6::text IS NULL OR COALESCE(r.status, 'pending') = $6)
  AND ($7::text IS NULL OR p.modality = $7)
  AND ($8::text IS NULL OR LOWER(su.study_arm) = LOWER($8))
  AND ($9::text IS NULL OR UPPER(st.country) = UPPER($9))
  AND ($10::timestamptz IS NULL OR a.uploaded_at >= $10)
  AND ($11::timestamptz IS NULL OR a.uploaded_at <= $11)
  AND ($12::float8 IS NULL OR a.duration_seconds >= $12)
  AND ($13::float8 IS NULL OR a.duration_seconds <= $13)
  AND ($14::text IS NULL
       OR a.file_name ILIKE '%' || $14 || '%'
       OR su.screening_number ILIKE '%' || $14 || '%')
"#;

fn order_clause(sort: Sort) -> String {
    let column = match sort.field {
        SortField::UploadedAt => "a.uploaded_at",
        SortField::SizeBytes => "a.size_bytes",
        SortField::DurationSeconds => "a.duration_seconds",
        SortField::FileName => "a.file_name",
    };
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    // Secondary key keeps pages stable when the sort column ties
    format!("ORDER BY {} {}, a.id", column, direction)
}

/// Binds $1..$14 in RECORD_WHERE order
fn bind_filter<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    filter: &'q AssetFilter,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    // Empty search strings behave like no search at all
    let search = filter
        .search
        .as_deref()
        .filter(|s| !s.is_empty());

    query
        .bind(filter.trial_id)
        .bind(filter.site_id)
        .bind(filter.subject_id)
        .bind(filter.event_id)
        .bind(filter.procedure_id)
        .bind(filter.review_status.map(|s| s.as_str()))
        .bind(filter.modality.map(|m| m.as_str()))
        .bind(filter.study_arm.as_deref())
        .bind(filter.country.as_deref())
        .bind(filter.uploaded_from)
        .bind(filter.uploaded_to)
        .bind(filter.min_duration_seconds)
        .bind(filter.max_duration_seconds)
        .bind(search)
}

fn row_to_record(row: sqlx::postgres::PgRow) -> StorageResult<AssetRecord> {
    let modality: String = row.get("modality");
    let review_status: String = row.get("review_status");
    Ok(AssetRecord {
        asset_id: row.get("asset_id"),
        trial_id: row.get("trial_id"),
        protocol_code: row.get("protocol_code"),
        trial_title: row.get("trial_title"),
        site_id: row.get("site_id"),
        site_number: row.get("site_number"),
        site_name: row.get("site_name"),
        site_country: row.get("site_country"),
        subject_id: row.get("subject_id"),
        screening_number: row.get("screening_number"),
        study_arm: row.get("study_arm"),
        event_id: row.get("event_id"),
        event_name: row.get("event_name"),
        procedure_id: row.get("procedure_id"),
        procedure_name: row.get("procedure_name"),
        modality: AssetModality::parse(&modality)
            .ok_or_else(|| StorageError::Internal(format!("unknown modality: {}", modality)))?,
        file_name: row.get("file_name"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        duration_seconds: row.get("duration_seconds"),
        uploaded_by: row.get("uploaded_by"),
        uploaded_at: row.get("uploaded_at"),
        review_status: ReviewStatus::parse(&review_status).ok_or_else(|| {
            StorageError::Internal(format!("unknown review status: {}", review_status))
        })?,
        reviewer: row.get("reviewer"),
    })
}

impl PostgresAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for assets
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id UUID PRIMARY KEY,
                subject_id UUID NOT NULL REFERENCES subjects(id),
                event_id UUID NOT NULL REFERENCES study_events(id),
                procedure_id UUID NOT NULL REFERENCES procedures(id),
                file_name TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes BIGINT NOT NULL,
                duration_seconds DOUBLE PRECISION,
                uploaded_by TEXT NOT NULL,
                uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_assets_subject ON assets(subject_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_assets_uploaded_at ON assets(uploaded_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AssetStore for PostgresAssetStore {
    async fn create_asset(&self, new: &NewAsset) -> StorageResult<Asset> {
        let asset = Asset {
            id: Uuid::new_v4(),
            subject_id: new.subject_id,
            event_id: new.event_id,
            procedure_id: new.procedure_id,
            file_name: new.file_name.clone(),
            content_type: new.content_type.clone(),
            size_bytes: new.size_bytes,
            duration_seconds: new.duration_seconds,
            uploaded_by: new.uploaded_by.clone(),
            uploaded_at: new.uploaded_at.unwrap_or_else(Utc::now),
        };

        sqlx::query(
            r#"
            INSERT INTO assets
                (id, subject_id, event_id, procedure_id, file_name, content_type,
                 size_bytes, duration_seconds, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(asset.id)
        .bind(asset.subject_id)
        .bind(asset.event_id)
        .bind(asset.procedure_id)
        .bind(&asset.file_name)
        .bind(&asset.content_type)
        .bind(asset.size_bytes)
        .bind(asset.duration_seconds)
        .bind(&asset.uploaded_by)
        .bind(asset.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    // One of subject/event/procedure does not exist; report
                    // the subject since it is the anchoring reference
                    return StorageError::SubjectNotFound(new.subject_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(asset)
    }

    async fn get_record(&self, id: Uuid) -> StorageResult<AssetRecord> {
        let sql = format!("{}{}WHERE a.id = $1", RECORD_SELECT, RECORD_FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::AssetNotFound(id))?;

        row_to_record(row)
    }

    async fn list_records(
        &self,
        filter: &AssetFilter,
        sort: Sort,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<AssetRecord>, u64)> {
        let sql = format!(
            "{}{}{}{} LIMIT $15 OFFSET $16",
            RECORD_SELECT,
            RECORD_FROM,
            RECORD_WHERE,
            order_clause(sort)
        );
        let rows = bind_filter(sqlx::query(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) {}{}", RECORD_FROM, RECORD_WHERE);
        let count_row = bind_filter(sqlx::query(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = count_row.get(0);

        let records = rows
            .into_iter()
            .map(row_to_record)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok((records, total as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_whitelists_columns() {
        let sort = Sort {
            field: SortField::SizeBytes,
            direction: SortDirection::Asc,
        };
        assert_eq!(order_clause(sort), "ORDER BY a.size_bytes ASC, a.id");

        let default = Sort::default();
        assert_eq!(order_clause(default), "ORDER BY a.uploaded_at DESC, a.id");
    }
}
