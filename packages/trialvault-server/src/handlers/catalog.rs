use axum::{
    extract::{Query, State},
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
use trialvault_core::model::{
    AssetModality, NewProcedure, NewStudyEvent, Procedure, StudyEvent,
};

const MAX_CODE_LENGTH: usize = 64;

/// Query params for listing study events
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub trial_id: Option<Uuid>,
}

/// Query params for listing procedures
#[derive(Debug, Deserialize)]
pub struct ListProceduresQuery {
    pub trial_id: Option<Uuid>,
    pub modality: Option<String>,
}

/// List study events for a trial in calendar order
pub async fn list_events(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Envelope<Vec<StudyEvent>>>, ApiError> {
    let events = state.catalog_store.list_events(query.trial_id).await?;
    Ok(Json(Envelope::new(events)))
}

fn validate_code_and_name(code: &str, name: &str) -> Result<(), ApiError> {
    if code.is_empty() || code.len() > MAX_CODE_LENGTH {
        return Err(ApiError::bad_request("Invalid code"));
    }
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(ApiError::bad_request("Invalid name"));
    }
    Ok(())
}

/// Add a study event to a trial calendar
pub async fn create_event(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewStudyEvent>,
) -> Result<(StatusCode, Json<Envelope<StudyEvent>>), ApiError> {
    validate_code_and_name(&new.code, &new.name)?;
    let event = state.catalog_store.create_event(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(event))))
}

/// List procedure definitions, optionally narrowed by modality
pub async fn list_procedures(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListProceduresQuery>,
) -> Result<Json<Envelope<Vec<Procedure>>>, ApiError> {
    let modality = query
        .modality
        .as_deref()
        .map(|s| {
            AssetModality::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown modality: {}", s)))
        })
        .transpose()?;

    let procedures = state
        .catalog_store
        .list_procedures(query.trial_id, modality)
        .await?;
    Ok(Json(Envelope::new(procedures)))
}

/// Add a procedure definition
pub async fn create_procedure(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewProcedure>,
) -> Result<(StatusCode, Json<Envelope<Procedure>>), ApiError> {
    validate_code_and_name(&new.code, &new.name)?;
    let procedure = state.catalog_store.create_procedure(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(procedure))))
}
