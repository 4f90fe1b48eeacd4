use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::storage::traits::{SiteStore, StorageError, StorageResult};
use trialvault_core::model::{NewSite, Site};

/// PostgreSQL implementation of SiteStore
pub struct PostgresSiteStore {
    pool: PgPool,
}

impl PostgresSiteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize database schema for sites
    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sites (
                id UUID PRIMARY KEY,
                trial_id UUID NOT NULL REFERENCES trials(id),
                site_number TEXT NOT NULL,
                name TEXT NOT NULL,
                city TEXT NOT NULL,
                country TEXT NOT NULL,
                activated_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (trial_id, site_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sites_trial ON sites(trial_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_site(row: sqlx::postgres::PgRow) -> Site {
    Site {
        id: row.get("id"),
        trial_id: row.get("trial_id"),
        site_number: row.get("site_number"),
        name: row.get("name"),
        city: row.get("city"),
        country: row.get("country"),
        activated_at: row.get("activated_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl SiteStore for PostgresSiteStore {
    async fn create_site(&self, new: &NewSite) -> StorageResult<Site> {
        let site = Site {
            id: Uuid::new_v4(),
            trial_id: new.trial_id,
            site_number: new.site_number.clone(),
            name: new.name.clone(),
            city: new.city.clone(),
            // Stored uppercase so country filters and grouping agree
            country: new.country.to_uppercase(),
            activated_at: new.activated_at,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sites (id, trial_id, site_number, name, city, country, activated_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(site.id)
        .bind(site.trial_id)
        .bind(&site.site_number)
        .bind(&site.name)
        .bind(&site.city)
        .bind(&site.country)
        .bind(site.activated_at)
        .bind(site.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StorageError::DuplicateSiteNumber(new.site_number.clone());
                }
                if db_err.is_foreign_key_violation() {
                    return StorageError::TrialNotFound(new.trial_id);
                }
            }
            StorageError::Database(e)
        })?;

        Ok(site)
    }

    async fn get_site(&self, id: Uuid) -> StorageResult<Site> {
        let row = sqlx::query(
            r#"
            SELECT id, trial_id, site_number, name, city, country, activated_at, created_at
            FROM sites
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::SiteNotFound(id))?;

        Ok(row_to_site(row))
    }

    async fn list_sites(
        &self,
        trial_id: Option<Uuid>,
        country: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> StorageResult<(Vec<Site>, u64)> {
        let rows = sqlx::query(
            r#"
            SELECT id, trial_id, site_number, name, city, country, activated_at, created_at
            FROM sites
            WHERE ($1::uuid IS NULL OR trial_id = $1)
              AND ($2::text IS NULL OR UPPER(country) = UPPER($2))
            ORDER BY site_number
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(trial_id)
        .bind(country)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sites
            WHERE ($1::uuid IS NULL OR trial_id = $1)
              AND ($2::text IS NULL OR UPPER(country) = UPPER($2))
            "#,
        )
        .bind(trial_id)
        .bind(country)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(row_to_site).collect(), total as u64))
    }
}
