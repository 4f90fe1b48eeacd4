use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::assets::percent_encode;
use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::envelope::Envelope;
use trialvault_core::model::{NewSubject, Subject, SubjectStatus};
use trialvault_core::page::{PageLinks, PageMeta, PageParams};

const MAX_SCREENING_NUMBER_LENGTH: usize = 64;
const MAX_STUDY_ARM_LENGTH: usize = 128;

/// Query params for listing subjects
#[derive(Debug, Deserialize)]
pub struct ListSubjectsQuery {
    pub site_id: Option<Uuid>,
    pub study_arm: Option<String>,
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

/// List subjects filtered by site, study arm and status
pub async fn list_subjects(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListSubjectsQuery>,
) -> Result<Json<Envelope<Vec<Subject>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            SubjectStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown subject status: {}", s)))
        })
        .transpose()?;

    let params = PageParams::new(query.page, query.per_page);
    let (subjects, total) = state
        .subject_store
        .list_subjects(
            query.site_id,
            query.study_arm.as_deref(),
            status,
            params.limit() as i64,
            params.offset() as i64,
        )
        .await?;

    let meta = PageMeta::new(params, total);
    let mut extra_parts = Vec::new();
    if let Some(id) = query.site_id {
        extra_parts.push(format!("site_id={}", id));
    }
    if let Some(ref arm) = query.study_arm {
        extra_parts.push(format!("study_arm={}", percent_encode(arm)));
    }
    if let Some(status) = status {
        extra_parts.push(format!("status={}", status.as_str()));
    }
    let links = PageLinks::build("/api/subjects", &extra_parts.join("&"), &meta);

    Ok(Json(Envelope::paginated(subjects, meta, links)))
}

/// Get a subject by ID
pub async fn get_subject(
    State(state): State<Arc<ServerState>>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Envelope<Subject>>, ApiError> {
    let subject = state.subject_store.get_subject(subject_id).await?;
    Ok(Json(Envelope::new(subject)))
}

fn validate_new_subject(new: &NewSubject) -> Result<(), ApiError> {
    if new.screening_number.is_empty() || new.screening_number.len() > MAX_SCREENING_NUMBER_LENGTH {
        return Err(ApiError::bad_request("Invalid screening number"));
    }
    if new.study_arm.is_empty() || new.study_arm.len() > MAX_STUDY_ARM_LENGTH {
        return Err(ApiError::bad_request("Invalid study arm"));
    }
    Ok(())
}

/// Register a new subject
pub async fn create_subject(
    State(state): State<Arc<ServerState>>,
    Json(new): Json<NewSubject>,
) -> Result<(StatusCode, Json<Envelope<Subject>>), ApiError> {
    validate_new_subject(&new)?;
    let subject = state.subject_store.create_subject(&new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(subject))))
}
