use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{AssetModality, AssetRecord, ReviewStatus};

/// Criteria for narrowing the asset record list. Every field is optional;
/// an empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    pub trial_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub procedure_id: Option<Uuid>,
    pub review_status: Option<ReviewStatus>,
    pub modality: Option<AssetModality>,
    pub study_arm: Option<String>,
    /// ISO 3166-1 alpha-2, matched case-insensitively
    pub country: Option<String>,
    /// Inclusive lower bound on uploaded_at
    pub uploaded_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on uploaded_at
    pub uploaded_to: Option<DateTime<Utc>>,
    pub min_duration_seconds: Option<f64>,
    pub max_duration_seconds: Option<f64>,
    /// Case-insensitive substring over file name and screening number
    pub search: Option<String>,
}

impl AssetFilter {
    pub fn is_empty(&self) -> bool {
        self.trial_id.is_none()
            && self.site_id.is_none()
            && self.subject_id.is_none()
            && self.event_id.is_none()
            && self.procedure_id.is_none()
            && self.review_status.is_none()
            && self.modality.is_none()
            && self.study_arm.is_none()
            && self.country.is_none()
            && self.uploaded_from.is_none()
            && self.uploaded_to.is_none()
            && self.min_duration_seconds.is_none()
            && self.max_duration_seconds.is_none()
            && self.search.as_deref().map_or(true, |s| s.is_empty())
    }

    /// Pure predicate over a single record
    pub fn matches(&self, record: &AssetRecord) -> bool {
        if let Some(id) = self.trial_id {
            if record.trial_id != id {
                return false;
            }
        }
        if let Some(id) = self.site_id {
            if record.site_id != id {
                return false;
            }
        }
        if let Some(id) = self.subject_id {
            if record.subject_id != id {
                return false;
            }
        }
        if let Some(id) = self.event_id {
            if record.event_id != id {
                return false;
            }
        }
        if let Some(id) = self.procedure_id {
            if record.procedure_id != id {
                return false;
            }
        }
        if let Some(status) = self.review_status {
            if record.review_status != status {
                return false;
            }
        }
        if let Some(modality) = self.modality {
            if record.modality != modality {
                return false;
            }
        }
        if let Some(ref arm) = self.study_arm {
            if !record.study_arm.eq_ignore_ascii_case(arm) {
                return false;
            }
        }
        if let Some(ref country) = self.country {
            if !record.site_country.eq_ignore_ascii_case(country) {
                return false;
            }
        }
        if let Some(from) = self.uploaded_from {
            if record.uploaded_at < from {
                return false;
            }
        }
        if let Some(to) = self.uploaded_to {
            if record.uploaded_at > to {
                return false;
            }
        }
        if self.min_duration_seconds.is_some() || self.max_duration_seconds.is_some() {
            // Duration bounds never match assets without a duration
            let Some(duration) = record.duration_seconds else {
                return false;
            };
            if let Some(min) = self.min_duration_seconds {
                if duration < min {
                    return false;
                }
            }
            if let Some(max) = self.max_duration_seconds {
                if duration > max {
                    return false;
                }
            }
        }
        if let Some(ref search) = self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let in_file = record.file_name.to_lowercase().contains(&needle);
                let in_subject = record.screening_number.to_lowercase().contains(&needle);
                if !in_file && !in_subject {
                    return false;
                }
            }
        }
        true
    }

    /// Linear scan over an already-fetched slice
    pub fn apply<'a>(&self, records: &'a [AssetRecord]) -> Vec<&'a AssetRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sortable columns of the asset record list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    UploadedAt,
    SizeBytes,
    DurationSeconds,
    FileName,
}

impl SortField {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "uploaded_at" => Ok(SortField::UploadedAt),
            "size_bytes" => Ok(SortField::SizeBytes),
            "duration_seconds" => Ok(SortField::DurationSeconds),
            "file_name" => Ok(SortField::FileName),
            other => Err(CoreError::UnknownSortField(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::UploadedAt => "uploaded_at",
            SortField::SizeBytes => "size_bytes",
            SortField::DurationSeconds => "duration_seconds",
            SortField::FileName => "file_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::UnknownSortField(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort order applied to the asset record list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> AssetRecord {
        AssetRecord {
            asset_id: Uuid::new_v4(),
            trial_id: Uuid::new_v4(),
            protocol_code: "ONC-301".to_string(),
            trial_title: "Phase III oncology study".to_string(),
            site_id: Uuid::new_v4(),
            site_number: "101".to_string(),
            site_name: "University Hospital".to_string(),
            site_country: "DE".to_string(),
            subject_id: Uuid::new_v4(),
            screening_number: "SCR-0042".to_string(),
            study_arm: "Treatment".to_string(),
            event_id: Uuid::new_v4(),
            event_name: "Baseline".to_string(),
            procedure_id: Uuid::new_v4(),
            procedure_name: "Gait video".to_string(),
            modality: AssetModality::Video,
            file_name: "gait_baseline.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            size_bytes: 52_428_800,
            duration_seconds: Some(93.5),
            uploaded_by: "coordinator@site101.example".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            review_status: ReviewStatus::Pending,
            reviewer: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = AssetFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&record()));
    }

    #[test]
    fn test_id_filters() {
        let r = record();
        let mut filter = AssetFilter {
            trial_id: Some(r.trial_id),
            ..Default::default()
        };
        assert!(filter.matches(&r));
        filter.trial_id = Some(Uuid::new_v4());
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_country_is_case_insensitive() {
        let filter = AssetFilter {
            country: Some("de".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record()));
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let r = record();
        let filter = AssetFilter {
            uploaded_from: Some(r.uploaded_at),
            uploaded_to: Some(r.uploaded_at),
            ..Default::default()
        };
        assert!(filter.matches(&r));

        let filter = AssetFilter {
            uploaded_from: Some(r.uploaded_at + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_duration_bounds_exclude_missing_durations() {
        let mut r = record();
        r.duration_seconds = None;
        let filter = AssetFilter {
            min_duration_seconds: Some(10.0),
            ..Default::default()
        };
        assert!(!filter.matches(&r));

        r.duration_seconds = Some(93.5);
        assert!(filter.matches(&r));

        let filter = AssetFilter {
            max_duration_seconds: Some(60.0),
            ..Default::default()
        };
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_search_covers_file_name_and_screening_number() {
        let filter = AssetFilter {
            search: Some("GAIT".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record()));

        let filter = AssetFilter {
            search: Some("scr-0042".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record()));

        let filter = AssetFilter {
            search: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&record()));

        // Empty search string is a no-op, not a reject-all
        let filter = AssetFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.matches(&record()));
    }

    #[test]
    fn test_apply_is_a_linear_scan() {
        let mut approved = record();
        approved.review_status = ReviewStatus::Approved;
        let records = vec![record(), approved, record()];
        let filter = AssetFilter {
            review_status: Some(ReviewStatus::Approved),
            ..Default::default()
        };
        assert_eq!(filter.apply(&records).len(), 1);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(SortField::parse("size_bytes").unwrap(), SortField::SizeBytes);
        assert!(SortField::parse("nope").is_err());
        assert_eq!(SortDirection::parse("asc").unwrap(), SortDirection::Asc);
    }
}
