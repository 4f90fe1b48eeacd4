use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::envelope::Envelope;
use trialvault_core::filter::{AssetFilter, Sort, SortDirection, SortField};
use trialvault_core::model::{Asset, AssetModality, AssetRecord, NewAsset, ReviewStatus};
use trialvault_core::page::{PageLinks, PageMeta, PageParams};

/// Maximum lengths for input validation
pub const MAX_NAME_LENGTH: usize = 512;
pub const MAX_FILE_NAME_LENGTH: usize = 1024;
pub const MAX_SEARCH_LENGTH: usize = 256;
pub const MAX_USER_LENGTH: usize = 256;

/// Asset record filter parameters, shared by the list, stats and export
/// endpoints. Enum-valued parameters arrive as strings and are validated
/// here so bad values produce an error envelope instead of a bare 400.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub trial_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub procedure_id: Option<Uuid>,
    pub review_status: Option<String>,
    pub modality: Option<String>,
    pub study_arm: Option<String>,
    pub country: Option<String>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
    pub min_duration_seconds: Option<f64>,
    pub max_duration_seconds: Option<f64>,
    pub search: Option<String>,
}

impl FilterQuery {
    pub fn to_filter(&self) -> Result<AssetFilter, ApiError> {
        let review_status = self
            .review_status
            .as_deref()
            .map(|s| {
                ReviewStatus::parse(s)
                    .ok_or_else(|| ApiError::bad_request(format!("Unknown review status: {}", s)))
            })
            .transpose()?;

        let modality = self
            .modality
            .as_deref()
            .map(|s| {
                AssetModality::parse(s)
                    .ok_or_else(|| ApiError::bad_request(format!("Unknown modality: {}", s)))
            })
            .transpose()?;

        if let Some(ref search) = self.search {
            if search.len() > MAX_SEARCH_LENGTH {
                return Err(ApiError::bad_request("Search string too long"));
            }
        }

        if let (Some(from), Some(to)) = (self.uploaded_from, self.uploaded_to) {
            if from > to {
                return Err(ApiError::bad_request(
                    "uploaded_from must not be after uploaded_to",
                ));
            }
        }

        Ok(AssetFilter {
            trial_id: self.trial_id,
            site_id: self.site_id,
            subject_id: self.subject_id,
            event_id: self.event_id,
            procedure_id: self.procedure_id,
            review_status,
            modality,
            study_arm: self.study_arm.clone(),
            country: self.country.clone(),
            uploaded_from: self.uploaded_from,
            uploaded_to: self.uploaded_to,
            min_duration_seconds: self.min_duration_seconds,
            max_duration_seconds: self.max_duration_seconds,
            search: self.search.clone().filter(|s| !s.is_empty()),
        })
    }

    /// Encoded filter parameters carried on pagination links
    pub fn query_fragment(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut push = |key: &str, value: &str| {
            parts.push(format!("{}={}", key, percent_encode(value)));
        };

        if let Some(id) = self.trial_id {
            push("trial_id", &id.to_string());
        }
        if let Some(id) = self.site_id {
            push("site_id", &id.to_string());
        }
        if let Some(id) = self.subject_id {
            push("subject_id", &id.to_string());
        }
        if let Some(id) = self.event_id {
            push("event_id", &id.to_string());
        }
        if let Some(id) = self.procedure_id {
            push("procedure_id", &id.to_string());
        }
        if let Some(ref v) = self.review_status {
            push("review_status", v);
        }
        if let Some(ref v) = self.modality {
            push("modality", v);
        }
        if let Some(ref v) = self.study_arm {
            push("study_arm", v);
        }
        if let Some(ref v) = self.country {
            push("country", v);
        }
        if let Some(ts) = self.uploaded_from {
            push("uploaded_from", &ts.to_rfc3339());
        }
        if let Some(ts) = self.uploaded_to {
            push("uploaded_to", &ts.to_rfc3339());
        }
        if let Some(v) = self.min_duration_seconds {
            push("min_duration_seconds", &v.to_string());
        }
        if let Some(v) = self.max_duration_seconds {
            push("max_duration_seconds", &v.to_string());
        }
        if let Some(ref v) = self.search {
            if !v.is_empty() {
                push("search", v);
            }
        }
        parts.join("&")
    }
}

/// Sort and pagination parameters for the asset list
#[derive(Debug, Deserialize)]
pub struct PageSortQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    trialvault_core::page::DEFAULT_PER_PAGE
}

impl PageSortQuery {
    pub fn to_sort(&self) -> Result<Sort, ApiError> {
        let field = match self.sort.as_deref() {
            Some(s) => SortField::parse(s).map_err(|e| ApiError::bad_request(e.to_string()))?,
            None => SortField::default(),
        };
        let direction = match self.order.as_deref() {
            Some(s) => SortDirection::parse(s)
                .map_err(|_| ApiError::bad_request(format!("Unknown sort order: {}", s)))?,
            None => SortDirection::default(),
        };
        Ok(Sort { field, direction })
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.per_page)
    }

    /// Sort parameters carried on pagination links (page/per_page are
    /// rewritten per link)
    pub fn sort_fragment(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ref v) = self.sort {
            parts.push(format!("sort={}", percent_encode(v)));
        }
        if let Some(ref v) = self.order {
            parts.push(format!("order={}", percent_encode(v)));
        }
        parts.join("&")
    }
}

/// Minimal percent-encoding for link query values
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn join_fragments(a: String, b: String) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b,
        (_, true) => a,
        _ => format!("{}&{}", a, b),
    }
}

/// List asset records with filters, sorting and pagination
pub async fn list_assets(
    State(state): State<Arc<ServerState>>,
    Query(filter_query): Query<FilterQuery>,
    Query(page_query): Query<PageSortQuery>,
) -> Result<Json<Envelope<Vec<AssetRecord>>>, ApiError> {
    let filter = filter_query.to_filter()?;
    let sort = page_query.to_sort()?;
    let params = page_query.page_params();

    let (records, total) = state
        .asset_store
        .list_records(
            &filter,
            sort,
            params.limit() as i64,
            params.offset() as i64,
        )
        .await?;

    let meta = PageMeta::new(params, total);
    let extra = join_fragments(filter_query.query_fragment(), page_query.sort_fragment());
    let links = PageLinks::build("/api/assets", &extra, &meta);

    Ok(Json(Envelope::paginated(records, meta, links)))
}

/// Get the denormalized record for a single asset
pub async fn get_asset(
    State(state): State<Arc<ServerState>>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<Envelope<AssetRecord>>, ApiError> {
    let record = state.asset_store.get_record(asset_id).await?;
    Ok(Json(Envelope::new(record)))
}

fn validate_new_asset(new: &NewAsset) -> Result<(), ApiError> {
    if new.file_name.is_empty() || new.file_name.len() > MAX_FILE_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid file name"));
    }
    if new.content_type.is_empty() || new.content_type.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid content type"));
    }
    if new.uploaded_by.is_empty() || new.uploaded_by.len() > MAX_USER_LENGTH {
        return Err(ApiError::bad_request("Invalid uploader"));
    }
    if new.size_bytes < 0 {
        return Err(ApiError::bad_request("size_bytes must not be negative"));
    }
    if let Some(duration) = new.duration_seconds {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ApiError::bad_request("duration_seconds must not be negative"));
        }
    }
    Ok(())
}

/// Register uploaded asset metadata
pub async fn create_asset(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewAsset>,
) -> Result<(StatusCode, Json<Envelope<Asset>>), ApiError> {
    validate_new_asset(&new)?;
    let asset = state.asset_store.create_asset(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(asset))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("plain-value_1.0~x"), "plain-value_1.0~x");
        assert_eq!(percent_encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(percent_encode("50%"), "50%25");
    }

    #[test]
    fn test_filter_query_rejects_unknown_enums() {
        let query = FilterQuery {
            review_status: Some("finished".to_string()),
            ..Default::default()
        };
        assert!(query.to_filter().is_err());

        let query = FilterQuery {
            modality: Some("hologram".to_string()),
            ..Default::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_filter_query_rejects_inverted_date_range() {
        let query = FilterQuery {
            uploaded_from: Some(Utc::now()),
            uploaded_to: Some(Utc::now() - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_query_fragment_round_trips_set_fields() {
        let id = Uuid::new_v4();
        let query = FilterQuery {
            trial_id: Some(id),
            country: Some("DE".to_string()),
            search: Some("gait video".to_string()),
            ..Default::default()
        };
        let fragment = query.query_fragment();
        assert!(fragment.contains(&format!("trial_id={}", id)));
        assert!(fragment.contains("country=DE"));
        assert!(fragment.contains("search=gait%20video"));
    }

    #[test]
    fn test_empty_fragment_for_empty_filter() {
        assert_eq!(FilterQuery::default().query_fragment(), "");
    }
}
