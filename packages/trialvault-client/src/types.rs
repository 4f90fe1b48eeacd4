use serde::{Deserialize, Serialize};
use uuid::Uuid;

use trialvault_core::model::{Coordinates, Site};
use trialvault_core::page::{PageLinks, PageMeta};

/// One page of a listed resource
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub links: Option<PageLinks>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Response of `GET /api/sites/{id}/coordinates`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCoordinates {
    pub site_id: Uuid,
    pub city: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

/// One entry of `GET /api/stats/site-map`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMapPoint {
    pub site: Site,
    pub coordinates: Option<Coordinates>,
}
