//! Typed async client for the TrialVault REST API. Wraps the paginated
//! `{success, data, meta, links}` envelope and exposes one method per
//! endpoint, plus a sequential page walker for full exports.

pub mod error;
pub mod query;
pub mod types;

pub use error::{ClientError, Result};
pub use query::AssetQuery;
pub use types::{HealthInfo, Page, SiteCoordinates, SiteMapPoint};

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use trialvault_core::aggregate::{GroupKey, GroupSummary, HistogramBucket, OverviewStats};
use trialvault_core::envelope::{Envelope, ErrorEnvelope};
use trialvault_core::export::ExportFormat;
use trialvault_core::model::{
    AssetRecord, NewAsset, NewReview, NewSite, NewSubject, NewTrial, Review, Site, Subject,
    SubjectStatus, Trial, TrialStatus,
};
use trialvault_core::page::MAX_PER_PAGE;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sequential page walks stop after this many pages regardless of what the
/// server reports, so a bad `total` can never loop forever.
const MAX_FETCH_ALL_PAGES: u32 = 1000;

pub struct TrialVaultClient {
    client: Client,
    base_url: String,
}

impl TrialVaultClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.is_empty() || !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
        {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()))
        } else {
            match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => Err(ClientError::Api {
                    status: status.as_u16(),
                    code: envelope.code,
                    message: envelope.error,
                }),
                Err(_) => Err(ClientError::Api {
                    status: status.as_u16(),
                    code: "UNKNOWN".to_string(),
                    message: "Unexpected error response".to_string(),
                }),
            }
        }
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Envelope<T>> {
        let response = self
            .client
            .get(self.url(path))
            .query(params)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        Ok(self.get_envelope::<T>(path, params).await?.data)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Page<T>> {
        let envelope = self.get_envelope::<Vec<T>>(path, params).await?;
        let meta = envelope
            .meta
            .ok_or_else(|| ClientError::Decode("Missing pagination meta".to_string()))?;
        Ok(Page {
            data: envelope.data,
            meta,
            links: envelope.links,
        })
    }

    async fn post_data<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let envelope: Envelope<T> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthInfo> {
        let response = self.client.get(self.url("/health")).send().await?;
        Self::decode(response).await
    }

    /// `GET /api/trials`
    pub async fn list_trials(
        &self,
        status: Option<TrialStatus>,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Trial>> {
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ];
        if let Some(status) = status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        self.get_page("/api/trials", &params).await
    }

    /// `POST /api/trials`
    pub async fn create_trial(&self, new: &NewTrial) -> Result<Trial> {
        self.post_data("/api/trials", new).await
    }

    /// `GET /api/trials/{id}`
    pub async fn get_trial(&self, trial_id: Uuid) -> Result<Trial> {
        self.get_data(&format!("/api/trials/{}", trial_id), &[]).await
    }

    /// `GET /api/sites`
    pub async fn list_sites(
        &self,
        trial_id: Option<Uuid>,
        country: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Site>> {
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ];
        if let Some(id) = trial_id {
            params.push(("trial_id".to_string(), id.to_string()));
        }
        if let Some(country) = country {
            params.push(("country".to_string(), country.to_string()));
        }
        self.get_page("/api/sites", &params).await
    }

    /// `POST /api/sites`
    pub async fn create_site(&self, new: &NewSite) -> Result<Site> {
        self.post_data("/api/sites", new).await
    }

    /// `GET /api/sites/{id}/coordinates`
    pub async fn site_coordinates(&self, site_id: Uuid) -> Result<SiteCoordinates> {
        self.get_data(&format!("/api/sites/{}/coordinates", site_id), &[])
            .await
    }

    /// `GET /api/subjects`
    pub async fn list_subjects(
        &self,
        site_id: Option<Uuid>,
        status: Option<SubjectStatus>,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Subject>> {
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ];
        if let Some(id) = site_id {
            params.push(("site_id".to_string(), id.to_string()));
        }
        if let Some(status) = status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        self.get_page("/api/subjects", &params).await
    }

    /// `POST /api/subjects`
    pub async fn create_subject(&self, new: &NewSubject) -> Result<Subject> {
        self.post_data("/api/subjects", new).await
    }

    /// `GET /api/assets`
    pub async fn list_assets(&self, query: &AssetQuery) -> Result<Page<AssetRecord>> {
        self.get_page("/api/assets", &query.to_params()).await
    }

    /// `GET /api/assets/{id}`
    pub async fn get_asset(&self, asset_id: Uuid) -> Result<AssetRecord> {
        self.get_data(&format!("/api/assets/{}", asset_id), &[]).await
    }

    /// `POST /api/assets`
    pub async fn create_asset(&self, new: &NewAsset) -> Result<AssetRecord> {
        // The create endpoint returns the bare asset; re-fetch the record
        // so callers get the denormalized projection in one call
        let asset: trialvault_core::model::Asset = self.post_data("/api/assets", new).await?;
        self.get_asset(asset.id).await
    }

    /// Walk the asset list page by page and collect every record the filter
    /// matches. Pages are fetched sequentially.
    pub async fn fetch_all_assets(&self, query: &AssetQuery) -> Result<Vec<AssetRecord>> {
        let mut all = Vec::new();
        let per_page = query.per_page.unwrap_or(MAX_PER_PAGE);
        let mut page = 1;

        loop {
            let paged = self
                .list_assets(&query.clone().page(page).per_page(per_page))
                .await?;
            let total_pages = paged.meta.total_pages;
            all.extend(paged.data);

            if page >= total_pages || page >= MAX_FETCH_ALL_PAGES {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    /// `POST /api/assets/{id}/reviews`
    pub async fn create_review(&self, asset_id: Uuid, new: &NewReview) -> Result<Review> {
        self.post_data(&format!("/api/assets/{}/reviews", asset_id), new)
            .await
    }

    /// `GET /api/assets/{id}/reviews`
    pub async fn list_asset_reviews(&self, asset_id: Uuid) -> Result<Vec<Review>> {
        self.get_data(&format!("/api/assets/{}/reviews", asset_id), &[])
            .await
    }

    /// `GET /api/stats/overview`
    pub async fn overview(&self, query: &AssetQuery) -> Result<OverviewStats> {
        self.get_data("/api/stats/overview", &query.to_params()).await
    }

    /// `GET /api/stats/assets?group_by=...`
    pub async fn grouped_stats(
        &self,
        group_by: GroupKey,
        query: &AssetQuery,
    ) -> Result<Vec<GroupSummary>> {
        let mut params = query.to_params();
        params.push(("group_by".to_string(), group_by.as_str().to_string()));
        self.get_data("/api/stats/assets", &params).await
    }

    /// `GET /api/stats/duration-histogram`
    pub async fn duration_histogram(
        &self,
        bucket_seconds: f64,
        query: &AssetQuery,
    ) -> Result<Vec<HistogramBucket>> {
        let mut params = query.to_params();
        params.push(("bucket_seconds".to_string(), bucket_seconds.to_string()));
        self.get_data("/api/stats/duration-histogram", &params).await
    }

    /// `GET /api/stats/site-map`
    pub async fn site_map(&self, trial_id: Option<Uuid>) -> Result<Vec<SiteMapPoint>> {
        let mut params = Vec::new();
        if let Some(id) = trial_id {
            params.push(("trial_id".to_string(), id.to_string()));
        }
        self.get_data("/api/stats/site-map", &params).await
    }

    /// `GET /api/export/assets` - returns the raw file bytes
    pub async fn export_assets(
        &self,
        format: ExportFormat,
        query: &AssetQuery,
    ) -> Result<Vec<u8>> {
        let mut params = query.to_params();
        params.push(("format".to_string(), format.extension().to_string()));

        let response = self
            .client
            .get(self.url("/api/export/assets"))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => Err(ClientError::Api {
                    status: status.as_u16(),
                    code: envelope.code,
                    message: envelope.error,
                }),
                Err(_) => Err(ClientError::Api {
                    status: status.as_u16(),
                    code: "UNKNOWN".to_string(),
                    message: "Unexpected error response".to_string(),
                }),
            };
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = TrialVaultClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }

    #[test]
    fn test_base_url_must_be_http() {
        assert!(matches!(
            TrialVaultClient::new("localhost:8080"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            TrialVaultClient::new(""),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }
}
