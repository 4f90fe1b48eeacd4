use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::assets::MAX_NAME_LENGTH;
use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::envelope::Envelope;
use trialvault_core::model::{Coordinates, NewSite, Site};
use trialvault_core::page::{PageLinks, PageMeta, PageParams};

/// Query params for listing sites
#[derive(Debug, Deserialize)]
pub struct ListSitesQuery {
    pub trial_id: Option<Uuid>,
    pub country: Option<String>,
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

/// Site plus resolved coordinates
#[derive(Debug, Serialize)]
pub struct SiteCoordinatesResponse {
    pub site_id: Uuid,
    pub city: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

/// List sites, optionally filtered by trial and country
pub async fn list_sites(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListSitesQuery>,
) -> Result<Json<Envelope<Vec<Site>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let (sites, total) = state
        .site_store
        .list_sites(
            query.trial_id,
            query.country.as_deref(),
            params.limit() as i64,
            params.offset() as i64,
        )
        .await?;

    let meta = PageMeta::new(params, total);
    let mut extra_parts = Vec::new();
    if let Some(id) = query.trial_id {
        extra_parts.push(format!("trial_id={}", id));
    }
    if let Some(ref country) = query.country {
        extra_parts.push(format!(
            "country={}",
            crate::handlers::assets::percent_encode(country)
        ));
    }
    let links = PageLinks::build("/api/sites", &extra_parts.join("&"), &meta);

    Ok(Json(Envelope::paginated(sites, meta, links)))
}

/// Get a site by ID
pub async fn get_site(
    State(state): State<Arc<ServerState>>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<Envelope<Site>>, ApiError> {
    let site = state.site_store.get_site(site_id).await?;
    Ok(Json(Envelope::new(site)))
}

/// Resolve a site's coordinates through the geocoding cache
pub async fn site_coordinates(
    State(state): State<Arc<ServerState>>,
    Path(site_id): Path<Uuid>,
) -> Result<Json<Envelope<SiteCoordinatesResponse>>, ApiError> {
    let site = state.site_store.get_site(site_id).await?;
    let coordinates = state.geocoder.lookup(&site.city, &site.country).await?;

    Ok(Json(Envelope::new(SiteCoordinatesResponse {
        site_id: site.id,
        city: site.city,
        country: site.country,
        coordinates,
    })))
}

fn validate_new_site(new: &NewSite) -> Result<(), ApiError> {
    if new.site_number.is_empty() || new.site_number.len() > 32 {
        return Err(ApiError::bad_request("Invalid site number"));
    }
    if new.name.is_empty() || new.name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid site name"));
    }
    if new.city.is_empty() || new.city.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid city"));
    }
    if new.country.len() != 2 || !new.country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::bad_request(
            "Country must be an ISO 3166-1 alpha-2 code",
        ));
    }
    Ok(())
}

/// Register a new site
pub async fn create_site(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewSite>,
) -> Result<(StatusCode, Json<Envelope<Site>>), ApiError> {
    validate_new_site(&new)?;
    let site = state.site_store.create_site(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(site))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_site() -> NewSite {
        NewSite {
            trial_id: Uuid::new_v4(),
            site_number: "101".to_string(),
            name: "University Hospital".to_string(),
            city: "Berlin".to_string(),
            country: "DE".to_string(),
            activated_at: None,
        }
    }

    #[test]
    fn test_valid_site_passes() {
        assert!(validate_new_site(&new_site()).is_ok());
    }

    #[test]
    fn test_country_must_be_alpha2() {
        let mut site = new_site();
        site.country = "DEU".to_string();
        assert!(validate_new_site(&site).is_err());
        site.country = "D1".to_string();
        assert!(validate_new_site(&site).is_err());
    }
}
