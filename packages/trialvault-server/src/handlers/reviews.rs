use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::assets::{percent_encode, MAX_USER_LENGTH};
use crate::handlers::error::ApiError;
use crate::state::ServerState;
use trialvault_core::envelope::Envelope;
use trialvault_core::model::{NewReview, Review, ReviewStatus};
use trialvault_core::page::{PageLinks, PageMeta, PageParams};

const MAX_COMMENT_LENGTH: usize = 4096;

/// Query params for listing reviews across assets
#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    pub status: Option<String>,
    pub reviewer: Option<String>,
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

fn validate_new_review(new: &NewReview) -> Result<(), ApiError> {
    if new.reviewer.is_empty() || new.reviewer.len() > MAX_USER_LENGTH {
        return Err(ApiError::bad_request("Invalid reviewer"));
    }
    if new.status == ReviewStatus::Pending {
        return Err(ApiError::bad_request(
            "A review verdict cannot be 'pending'",
        ));
    }
    if let Some(ref comment) = new.comment {
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(ApiError::bad_request("Comment too long"));
        }
    }
    Ok(())
}

/// Record a review verdict for an asset
pub async fn create_review(
    State(state): State<Arc<ServerState>>,
    Path(asset_id): Path<Uuid>,
    Json(new): Json<NewReview>,
) -> Result<(StatusCode, Json<Envelope<Review>>), ApiError> {
    validate_new_review(&new)?;
    let review = state.review_store.create_review(asset_id, &new).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(review))))
}

/// Full review history of an asset, newest first
pub async fn list_asset_reviews(
    State(state): State<Arc<ServerState>>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<Review>>>, ApiError> {
    // 404 for unknown assets rather than an empty history
    state.asset_store.get_record(asset_id).await?;
    let reviews = state.review_store.list_for_asset(asset_id).await?;
    Ok(Json(Envelope::new(reviews)))
}

/// List reviews across assets, filtered by status and reviewer
pub async fn list_reviews(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<Envelope<Vec<Review>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            ReviewStatus::parse(s)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown review status: {}", s)))
        })
        .transpose()?;

    let params = PageParams::new(query.page, query.per_page);
    let (reviews, total) = state
        .review_store
        .list_reviews(
            status,
            query.reviewer.as_deref(),
            params.limit() as i64,
            params.offset() as i64,
        )
        .await?;

    let meta = PageMeta::new(params, total);
    let mut extra_parts = Vec::new();
    if let Some(status) = status {
        extra_parts.push(format!("status={}", status.as_str()));
    }
    if let Some(ref reviewer) = query.reviewer {
        extra_parts.push(format!("reviewer={}", percent_encode(reviewer)));
    }
    let links = PageLinks::build("/api/reviews", &extra_parts.join("&"), &meta);

    Ok(Json(Envelope::paginated(reviews, meta, links)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_verdict_is_rejected() {
        let new = NewReview {
            reviewer: "reviewer@cro.example".to_string(),
            status: ReviewStatus::Pending,
            comment: None,
        };
        assert!(validate_new_review(&new).is_err());
    }

    #[test]
    fn test_approved_verdict_passes() {
        let new = NewReview {
            reviewer: "reviewer@cro.example".to_string(),
            status: ReviewStatus::Approved,
            comment: Some("Clear footage".to_string()),
        };
        assert!(validate_new_review(&new).is_ok());
    }
}
