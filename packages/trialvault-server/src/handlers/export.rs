use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::handlers::assets::FilterQuery;
use crate::handlers::error::ApiError;
use crate::handlers::stats::fetch_filtered;
use crate::state::ServerState;
use trialvault_core::export::{export_assets, ExportFormat};

/// Query params for the export endpoint
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Generate a downloadable asset listing in the requested format
pub async fn export_asset_records(
    State(state): State<Arc<ServerState>>,
    Query(filter_query): Query<FilterQuery>,
    Query(export_query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = match export_query.format.as_deref() {
        Some(s) => ExportFormat::parse(s)?,
        None => ExportFormat::Csv,
    };

    let filter = filter_query.to_filter()?;
    let records = fetch_filtered(&state, &filter).await?;
    let bytes = export_assets(&records, format)?;

    let filename = format!(
        "trialvault-assets-{}.{}",
        chrono::Utc::now().format("%Y%m%d"),
        format.extension()
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}
