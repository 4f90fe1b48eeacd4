use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::assets::MAX_NAME_LENGTH;
use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::envelope::Envelope;
use trialvault_core::model::{NewTrial, Trial, TrialStatus};
use trialvault_core::page::{PageLinks, PageMeta, PageParams};

const MAX_PROTOCOL_CODE_LENGTH: usize = 64;

/// Query params for listing trials
#[derive(Debug, Deserialize)]
pub struct ListTrialsQuery {
    pub status: Option<String>,
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

/// List trials, optionally filtered by status
pub async fn list_trials(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListTrialsQuery>,
) -> Result<Json<Envelope<Vec<Trial>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            TrialStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown trial status: {}", s)))
        })
        .transpose()?;

    let params = PageParams::new(query.page, query.per_page);
    let (trials, total) = state
        .trial_store
        .list_trials(status, params.limit() as i64, params.offset() as i64)
        .await?;

    let meta = PageMeta::new(params, total);
    let extra = status
        .map(|s| format!("status={}", s.as_str()))
        .unwrap_or_default();
    let links = PageLinks::build("/api/trials", &extra, &meta);

    Ok(Json(Envelope::paginated(trials, meta, links)))
}

/// Get a trial by ID
pub async fn get_trial(
    State(state): State<Arc<ServerState>>,
    Path(trial_id): Path<Uuid>,
) -> Result<Json<Envelope<Trial>>, ApiError> {
    let trial = state.trial_store.get_trial(trial_id).await?;
    Ok(Json(Envelope::new(trial)))
}

fn validate_new_trial(new: &NewTrial) -> Result<(), ApiError> {
    if new.protocol_code.is_empty() || new.protocol_code.len() > MAX_PROTOCOL_CODE_LENGTH {
        return Err(ApiError::bad_request("Invalid protocol code"));
    }
    if new.title.is_empty() || new.title.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid title"));
    }
    if new.sponsor.is_empty() || new.sponsor.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid sponsor"));
    }
    Ok(())
}

/// Register a new trial
pub async fn create_trial(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewTrial>,
) -> Result<(StatusCode, Json<Envelope<Trial>>), ApiError> {
    validate_new_trial(&new)?;
    let trial = state.trial_store.create_trial(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(trial))))
}
