use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clinical development phase of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
}

impl TrialPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialPhase::Phase1 => "phase1",
            TrialPhase::Phase2 => "phase2",
            TrialPhase::Phase3 => "phase3",
            TrialPhase::Phase4 => "phase4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrialPhase::Phase1 => "Phase I",
            TrialPhase::Phase2 => "Phase II",
            TrialPhase::Phase3 => "Phase III",
            TrialPhase::Phase4 => "Phase IV",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "phase1" => Some(TrialPhase::Phase1),
            "phase2" => Some(TrialPhase::Phase2),
            "phase3" => Some(TrialPhase::Phase3),
            "phase4" => Some(TrialPhase::Phase4),
            _ => None,
        }
    }
}

/// Recruitment status of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Recruiting,
    Active,
    Closed,
}

impl TrialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::Recruiting => "recruiting",
            TrialStatus::Active => "active",
            TrialStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recruiting" => Some(TrialStatus::Recruiting),
            "active" => Some(TrialStatus::Active),
            "closed" => Some(TrialStatus::Closed),
            _ => None,
        }
    }
}

/// Enrollment status of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    Screening,
    Enrolled,
    Withdrawn,
    Completed,
}

impl SubjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Screening => "screening",
            SubjectStatus::Enrolled => "enrolled",
            SubjectStatus::Withdrawn => "withdrawn",
            SubjectStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "screening" => Some(SubjectStatus::Screening),
            "enrolled" => Some(SubjectStatus::Enrolled),
            "withdrawn" => Some(SubjectStatus::Withdrawn),
            "completed" => Some(SubjectStatus::Completed),
            _ => None,
        }
    }
}

/// Media kind of an uploaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetModality {
    Video,
    Image,
    Audio,
    Document,
}

impl AssetModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetModality::Video => "video",
            AssetModality::Image => "image",
            AssetModality::Audio => "audio",
            AssetModality::Document => "document",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetModality::Video => "Video",
            AssetModality::Image => "Image",
            AssetModality::Audio => "Audio",
            AssetModality::Document => "Document",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(AssetModality::Video),
            "image" => Some(AssetModality::Image),
            "audio" => Some(AssetModality::Audio),
            "document" => Some(AssetModality::Document),
            _ => None,
        }
    }
}

/// Review outcome for an asset. Assets with no review yet report `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    /// Reviewer raised a data query; the site must respond before re-review
    Query,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Query => "query",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            "query" => Some(ReviewStatus::Query),
            _ => None,
        }
    }

    /// True once a reviewer has acted on the asset
    pub fn is_reviewed(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

/// A clinical trial (protocol)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub protocol_code: String,
    pub title: String,
    pub sponsor: String,
    pub phase: TrialPhase,
    pub status: TrialStatus,
    pub created_at: DateTime<Utc>,
}

/// An investigational site participating in a trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub trial_id: Uuid,
    pub site_number: String,
    pub name: String,
    pub city: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An enrolled (or screening) participant at a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub site_id: Uuid,
    pub screening_number: String,
    pub study_arm: String,
    pub status: SubjectStatus,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled visit/event in the trial calendar (e.g. Baseline, Week 4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyEvent {
    pub id: Uuid,
    pub trial_id: Uuid,
    pub code: String,
    pub name: String,
    pub sort_order: i32,
}

/// A data-collection procedure performed at a study event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub id: Uuid,
    pub trial_id: Uuid,
    pub code: String,
    pub name: String,
    pub modality: AssetModality,
}

/// An uploaded media file tied to a subject, event and procedure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub event_id: Uuid,
    pub procedure_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration_seconds: Option<f64>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A review verdict recorded against an asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub reviewer: String,
    pub status: ReviewStatus,
    pub comment: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Geographic coordinates of a site, resolved via geocoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The denormalized read model served by the asset list, stats and export
/// endpoints: one asset joined with its subject, site, trial, event,
/// procedure and latest review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_id: Uuid,
    pub trial_id: Uuid,
    pub protocol_code: String,
    pub trial_title: String,
    pub site_id: Uuid,
    pub site_number: String,
    pub site_name: String,
    pub site_country: String,
    pub subject_id: Uuid,
    pub screening_number: String,
    pub study_arm: String,
    pub event_id: Uuid,
    pub event_name: String,
    pub procedure_id: Uuid,
    pub procedure_name: String,
    pub modality: AssetModality,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration_seconds: Option<f64>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub review_status: ReviewStatus,
    pub reviewer: Option<String>,
}

/// Request payload for registering a trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrial {
    pub protocol_code: String,
    pub title: String,
    pub sponsor: String,
    pub phase: TrialPhase,
    pub status: TrialStatus,
}

/// Request payload for registering a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSite {
    pub trial_id: Uuid,
    pub site_number: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Request payload for registering a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
    pub site_id: Uuid,
    pub screening_number: String,
    pub study_arm: String,
    pub status: SubjectStatus,
    pub enrolled_at: Option<DateTime<Utc>>,
}

/// Request payload for adding a study event to a trial calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudyEvent {
    pub trial_id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// Request payload for adding a procedure definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcedure {
    pub trial_id: Uuid,
    pub code: String,
    pub name: String,
    pub modality: AssetModality,
}

/// Request payload for registering an uploaded asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
    pub subject_id: Uuid,
    pub event_id: Uuid,
    pub procedure_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration_seconds: Option<f64>,
    pub uploaded_by: String,
    /// Defaults to the server clock when absent
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Request payload for recording a review verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub reviewer: String,
    pub status: ReviewStatus,
    pub comment: Option<String>,
}

/// Render a byte count as a human-readable size ("1.5 MB")
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Render a duration in seconds as "mm:ss", or "h:mm:ss" past one hour
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Month bucket key ("2026-08") used by month-grouped aggregation
pub fn month_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_round_trip() {
        for status in [
            ReviewStatus::Pending,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
            ReviewStatus::Query,
        ] {
            assert_eq!(ReviewStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReviewStatus::parse("bogus"), None);
    }

    #[test]
    fn test_review_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&ReviewStatus::Query).unwrap();
        assert_eq!(json, "\"query\"");
        let back: ReviewStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(back, ReviewStatus::Approved);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3_221_225_472), "3.0 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(59.6), "1:00");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_month_key() {
        let ts = chrono::DateTime::parse_from_rfc3339("2026-08-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(month_key(&ts), "2026-08");
    }
}
