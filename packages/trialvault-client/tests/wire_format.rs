//! Wire-contract tests: the client must decode the exact JSON shapes the
//! server emits.

use trialvault_core::envelope::{Envelope, ErrorEnvelope};
use trialvault_core::model::{AssetRecord, ReviewStatus, Trial, TrialPhase, TrialStatus};

#[test]
fn decodes_paginated_trial_envelope() {
    let body = r#"{
        "success": true,
        "data": [{
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "protocol_code": "ONC-301",
            "title": "Phase III oncology study",
            "sponsor": "Helix Therapeutics",
            "phase": "phase3",
            "status": "recruiting",
            "created_at": "2026-01-15T10:00:00Z"
        }],
        "meta": { "page": 1, "per_page": 25, "total": 1, "total_pages": 1 },
        "links": { "self": "/api/trials?page=1&per_page=25" }
    }"#;

    let envelope: Envelope<Vec<Trial>> = serde_json::from_str(body).unwrap();
    assert!(envelope.success);
    assert_eq!(envelope.data.len(), 1);
    assert_eq!(envelope.data[0].phase, TrialPhase::Phase3);
    assert_eq!(envelope.data[0].status, TrialStatus::Recruiting);

    let meta = envelope.meta.unwrap();
    assert_eq!(meta.total, 1);
    let links = envelope.links.unwrap();
    assert!(links.next.is_none());
    assert!(links.prev.is_none());
}

#[test]
fn decodes_asset_record_with_nullable_fields() {
    let body = r#"{
        "success": true,
        "data": {
            "asset_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "trial_id": "7c9e6679-7425-40de-944b-e07fc1f90ae8",
            "protocol_code": "ONC-301",
            "trial_title": "Phase III oncology study",
            "site_id": "7c9e6679-7425-40de-944b-e07fc1f90ae9",
            "site_number": "101",
            "site_name": "University Hospital",
            "site_country": "DE",
            "subject_id": "7c9e6679-7425-40de-944b-e07fc1f90aea",
            "screening_number": "SCR-0042",
            "study_arm": "Treatment",
            "event_id": "7c9e6679-7425-40de-944b-e07fc1f90aeb",
            "event_name": "Baseline",
            "procedure_id": "7c9e6679-7425-40de-944b-e07fc1f90aec",
            "procedure_name": "Gait video",
            "modality": "video",
            "file_name": "gait_baseline.mp4",
            "content_type": "video/mp4",
            "size_bytes": 52428800,
            "duration_seconds": null,
            "uploaded_by": "coordinator@site101.example",
            "uploaded_at": "2026-03-14T09:30:00Z",
            "review_status": "pending",
            "reviewer": null
        }
    }"#;

    let envelope: Envelope<AssetRecord> = serde_json::from_str(body).unwrap();
    let record = envelope.data;
    assert_eq!(record.review_status, ReviewStatus::Pending);
    assert!(record.duration_seconds.is_none());
    assert!(record.reviewer.is_none());
    assert!(envelope.meta.is_none());
}

#[test]
fn decodes_error_envelope() {
    let body = r#"{ "success": false, "error": "Trial not found", "code": "NOT_FOUND" }"#;
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
    assert!(!envelope.success);
    assert_eq!(envelope.code, "NOT_FOUND");
}
