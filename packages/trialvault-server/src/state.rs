use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::geo::Geocoder;
use crate::storage::{
    AssetStore, CatalogStore, ReviewStore, SiteStore, SubjectStore, TrialStore,
};

/// Main server state shared across all handlers
pub struct ServerState {
    pub config: ServerConfig,
    pub trial_store: Arc<dyn TrialStore>,
    pub site_store: Arc<dyn SiteStore>,
    pub subject_store: Arc<dyn SubjectStore>,
    pub catalog_store: Arc<dyn CatalogStore>,
    pub asset_store: Arc<dyn AssetStore>,
    pub review_store: Arc<dyn ReviewStore>,
    pub geocoder: Arc<Geocoder>,
    pub start_time: Instant,
    pub db_pool: PgPool,
}

impl ServerState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ServerConfig,
        trial_store: Arc<dyn TrialStore>,
        site_store: Arc<dyn SiteStore>,
        subject_store: Arc<dyn SubjectStore>,
        catalog_store: Arc<dyn CatalogStore>,
        asset_store: Arc<dyn AssetStore>,
        review_store: Arc<dyn ReviewStore>,
        geocoder: Arc<Geocoder>,
        db_pool: PgPool,
    ) -> Self {
        Self {
            config,
            trial_store,
            site_store,
            subject_store,
            catalog_store,
            asset_store,
            review_store,
            geocoder,
            start_time: Instant::now(),
            db_pool,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
