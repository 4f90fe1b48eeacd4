pub mod assets;
pub mod catalog;
pub mod error;
pub mod export;
pub mod health;
pub mod reviews;
pub mod sites;
pub mod stats;
pub mod subjects;
pub mod trials;

pub use assets::{create_asset, get_asset, list_assets};
pub use catalog::{create_event, create_procedure, list_events, list_procedures};
pub use error::ApiError;
pub use export::export_asset_records;
pub use health::{health_check, server_info};
pub use reviews::{create_review, list_asset_reviews, list_reviews};
pub use sites::{create_site, get_site, list_sites, site_coordinates};
pub use stats::{stats_duration_histogram, stats_grouped, stats_overview, stats_site_map};
pub use subjects::{create_subject, get_subject, list_subjects};
pub use trials::{create_trial, get_trial, list_trials};
