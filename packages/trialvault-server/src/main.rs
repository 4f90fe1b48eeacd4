use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trialvault_server::{
    cli::{run_export, run_stats, Cli, Commands},
    config::ServerConfig,
    geo::Geocoder,
    handlers::{
        create_asset, create_event, create_procedure, create_review, create_site, create_subject,
        create_trial, export_asset_records, get_asset, get_site, get_subject, get_trial,
        health_check, list_asset_reviews, list_assets, list_events, list_procedures, list_reviews,
        list_sites, list_subjects, list_trials, server_info, site_coordinates,
        stats_duration_histogram, stats_grouped, stats_overview, stats_site_map,
    },
    state::ServerState,
    storage::{
        PostgresAssetStore, PostgresCatalogStore, PostgresReviewStore, PostgresSiteStore,
        PostgresSubjectStore, PostgresTrialStore,
    },
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// Asset metadata and review payloads are small; keep request bodies tight
const MAX_API_BODY_SIZE: usize = 1024 * 1024; // 1MB

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trialvault_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    // Initialize storage layers in foreign-key order
    let trial_store = PostgresTrialStore::new(pool.clone());
    trial_store.initialize().await?;

    let site_store = PostgresSiteStore::new(pool.clone());
    site_store.initialize().await?;

    let subject_store = PostgresSubjectStore::new(pool.clone());
    subject_store.initialize().await?;

    let catalog_store = PostgresCatalogStore::new(pool.clone());
    catalog_store.initialize().await?;

    let asset_store = PostgresAssetStore::new(pool.clone());
    asset_store.initialize().await?;

    let review_store = PostgresReviewStore::new(pool.clone());
    review_store.initialize().await?;

    let trial_store: Arc<dyn trialvault_server::storage::TrialStore> = Arc::new(trial_store);
    let asset_store: Arc<dyn trialvault_server::storage::AssetStore> = Arc::new(asset_store);

    // Handle CLI commands
    match cli.command {
        Some(Commands::Export {
            format,
            output,
            trial,
        }) => {
            return run_export(&config, trial_store, asset_store, format, output, trial)
                .await
                .map_err(|e| e.into());
        }
        Some(Commands::Stats { trial }) => {
            return run_stats(&config, trial_store, asset_store, trial)
                .await
                .map_err(|e| e.into());
        }
        Some(Commands::Serve) | None => {
            // Continue to run server
        }
    }

    // Server mode
    info!("Starting TrialVault Server v{}", VERSION);
    info!("Configuration loaded:");
    info!("   Port: {}", config.port);
    info!("   Bind address: {}", config.bind_addr);
    info!("   Max export rows: {}", config.max_export_rows);
    info!("   Geocoding enabled: {}", config.enable_geocoding);
    info!("Database connected and schema initialized");

    let geocoder = Arc::new(Geocoder::new(&config)?);

    // Create server state
    let state = Arc::new(ServerState::new(
        config.clone(),
        trial_store,
        Arc::new(site_store),
        Arc::new(subject_store),
        Arc::new(catalog_store),
        asset_store,
        Arc::new(review_store),
        geocoder,
        pool.clone(),
    ));

    // Spawn background task to prune expired geocode cache entries
    {
        let geocoder = state.geocoder.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(600));
            loop {
                interval.tick().await;
                let removed = geocoder.prune_expired();
                if removed > 0 {
                    info!("Pruned {} expired geocode cache entries", removed);
                }
            }
        });
    }

    // Build router
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info));

    let api_routes = Router::new()
        .route("/api/trials", get(list_trials).post(create_trial))
        .route("/api/trials/{trial_id}", get(get_trial))
        .route("/api/sites", get(list_sites).post(create_site))
        .route("/api/sites/{site_id}", get(get_site))
        .route("/api/sites/{site_id}/coordinates", get(site_coordinates))
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route("/api/subjects/{subject_id}", get(get_subject))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/procedures", get(list_procedures).post(create_procedure))
        .route("/api/assets", get(list_assets).post(create_asset))
        .route("/api/assets/{asset_id}", get(get_asset))
        .route(
            "/api/assets/{asset_id}/reviews",
            get(list_asset_reviews).post(create_review),
        )
        .route("/api/reviews", get(list_reviews))
        .route("/api/stats/overview", get(stats_overview))
        .route("/api/stats/assets", get(stats_grouped))
        .route("/api/stats/duration-histogram", get(stats_duration_histogram))
        .route("/api/stats/site-map", get(stats_site_map))
        .route("/api/export/assets", get(export_asset_records));

    // CORS configuration - configurable via CORS_ORIGINS env var
    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    info!("   CORS origins: {:?}", config.cors_origins);
    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(RequestBodyLimitLayer::new(MAX_API_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state.clone());

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Listening on http://{}", addr);
    info!("Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
