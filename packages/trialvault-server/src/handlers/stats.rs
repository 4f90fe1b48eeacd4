use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::handlers::assets::FilterQuery;
use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::aggregate::{
    duration_histogram, group_assets, overview, GroupKey, GroupSummary, HistogramBucket,
    OverviewStats,
};
use trialvault_core::envelope::Envelope;
use trialvault_core::filter::{AssetFilter, Sort};
use trialvault_core::model::{AssetRecord, Coordinates, Site};

/// Fetch the filtered record set that stats and exports aggregate over,
/// capped at MAX_EXPORT_ROWS.
pub(crate) async fn fetch_filtered(
    state: &ServerState,
    filter: &AssetFilter,
) -> Result<Vec<AssetRecord>, ApiError> {
    let (records, total) = state
        .asset_store
        .list_records(filter, Sort::default(), state.config.max_export_rows, 0)
        .await?;

    if total > records.len() as u64 {
        warn!(
            "Record fetch truncated to {} of {} matching rows",
            records.len(),
            total
        );
    }
    Ok(records)
}

/// Query params for grouped stats
#[derive(Debug, Deserialize)]
pub struct GroupByQuery {
    pub group_by: Option<String>,
}

/// Query params for the duration histogram
#[derive(Debug, Deserialize)]
pub struct HistogramQuery {
    pub bucket_seconds: Option<f64>,
}

/// Query params for the site map
#[derive(Debug, Deserialize)]
pub struct SiteMapQuery {
    pub trial_id: Option<Uuid>,
}

/// One entry of the dashboard site map
#[derive(Debug, Serialize)]
pub struct SiteMapEntry {
    pub site: Site,
    pub coordinates: Option<Coordinates>,
}

/// Headline totals for the filtered record set
pub async fn stats_overview(
    State(state): State<Arc<ServerState>>,
    Query(filter_query): Query<FilterQuery>,
) -> Result<Json<Envelope<OverviewStats>>, ApiError> {
    let filter = filter_query.to_filter()?;
    let records = fetch_filtered(&state, &filter).await?;
    Ok(Json(Envelope::new(overview(&records))))
}

/// Grouped rollups of the filtered record set
pub async fn stats_grouped(
    State(state): State<Arc<ServerState>>,
    Query(filter_query): Query<FilterQuery>,
    Query(group_query): Query<GroupByQuery>,
) -> Result<Json<Envelope<Vec<GroupSummary>>>, ApiError> {
    let group_by = group_query
        .group_by
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing required parameter: group_by"))?;
    let key = GroupKey::parse(group_by)?;

    let filter = filter_query.to_filter()?;
    let records = fetch_filtered(&state, &filter).await?;
    Ok(Json(Envelope::new(group_assets(&records, key))))
}

/// Duration histogram of the filtered record set
pub async fn stats_duration_histogram(
    State(state): State<Arc<ServerState>>,
    Query(filter_query): Query<FilterQuery>,
    Query(histogram_query): Query<HistogramQuery>,
) -> Result<Json<Envelope<Vec<HistogramBucket>>>, ApiError> {
    let bucket_seconds = histogram_query.bucket_seconds.unwrap_or(30.0);
    let filter = filter_query.to_filter()?;
    let records = fetch_filtered(&state, &filter).await?;
    let buckets = duration_histogram(&records, bucket_seconds)?;
    Ok(Json(Envelope::new(buckets)))
}

/// Sites with resolved coordinates for the dashboard map. Geocoding
/// failures skip the coordinates rather than failing the whole response.
pub async fn stats_site_map(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SiteMapQuery>,
) -> Result<Json<Envelope<Vec<SiteMapEntry>>>, ApiError> {
    let (sites, _) = state
        .site_store
        .list_sites(query.trial_id, None, state.config.max_export_rows, 0)
        .await?;

    let mut entries = Vec::with_capacity(sites.len());
    for site in sites {
        let coordinates = if state.geocoder.is_enabled() {
            match state.geocoder.lookup(&site.city, &site.country).await {
                Ok(coords) => coords,
                Err(e) => {
                    warn!("Geocoding failed for site {}: {}", site.site_number, e);
                    None
                }
            }
        } else {
            None
        };
        entries.push(SiteMapEntry { site, coordinates });
    }

    Ok(Json(Envelope::new(entries)))
}
