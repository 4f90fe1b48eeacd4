use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{month_key, AssetRecord, ReviewStatus};

/// Dimension to group asset records by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Site,
    Country,
    StudyArm,
    Event,
    Procedure,
    ReviewStatus,
    Modality,
    /// Upload month ("2026-08")
    Month,
}

impl GroupKey {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "site" => Ok(GroupKey::Site),
            "country" => Ok(GroupKey::Country),
            "study_arm" => Ok(GroupKey::StudyArm),
            "event" => Ok(GroupKey::Event),
            "procedure" => Ok(GroupKey::Procedure),
            "review_status" => Ok(GroupKey::ReviewStatus),
            "modality" => Ok(GroupKey::Modality),
            "month" => Ok(GroupKey::Month),
            other => Err(CoreError::UnknownGroupKey(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Site => "site",
            GroupKey::Country => "country",
            GroupKey::StudyArm => "study_arm",
            GroupKey::Event => "event",
            GroupKey::Procedure => "procedure",
            GroupKey::ReviewStatus => "review_status",
            GroupKey::Modality => "modality",
            GroupKey::Month => "month",
        }
    }

    fn key_of(&self, record: &AssetRecord) -> String {
        match self {
            GroupKey::Site => format!("{} ({})", record.site_name, record.site_number),
            GroupKey::Country => record.site_country.to_uppercase(),
            GroupKey::StudyArm => record.study_arm.clone(),
            GroupKey::Event => record.event_name.clone(),
            GroupKey::Procedure => record.procedure_name.clone(),
            GroupKey::ReviewStatus => record.review_status.as_str().to_string(),
            GroupKey::Modality => record.modality.as_str().to_string(),
            GroupKey::Month => month_key(&record.uploaded_at),
        }
    }
}

/// Per-group rollup of the asset list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub asset_count: u64,
    pub total_bytes: i64,
    pub total_duration_seconds: f64,
    /// Assets whose latest review is not pending
    pub reviewed_count: u64,
}

/// Group records by the given dimension, summing sizes and durations.
/// Output is sorted by descending asset count, then key, and the counts
/// across all groups always add up to the input length.
pub fn group_assets(records: &[AssetRecord], key: GroupKey) -> Vec<GroupSummary> {
    let mut groups: HashMap<String, GroupSummary> = HashMap::new();
    for record in records {
        let entry = groups
            .entry(key.key_of(record))
            .or_insert_with_key(|k| GroupSummary {
                key: k.clone(),
                asset_count: 0,
                total_bytes: 0,
                total_duration_seconds: 0.0,
                reviewed_count: 0,
            });
        entry.asset_count += 1;
        entry.total_bytes += record.size_bytes;
        entry.total_duration_seconds += record.duration_seconds.unwrap_or(0.0);
        if record.review_status.is_reviewed() {
            entry.reviewed_count += 1;
        }
    }
    let mut out: Vec<GroupSummary> = groups.into_values().collect();
    out.sort_by(|a, b| {
        b.asset_count
            .cmp(&a.asset_count)
            .then_with(|| a.key.cmp(&b.key))
    });
    out
}

/// One fixed-width duration bucket, [lower, upper)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Bucket asset durations into fixed-width bins starting at zero. Records
/// without a duration are excluded; trailing empty buckets are trimmed.
pub fn duration_histogram(
    records: &[AssetRecord],
    bucket_seconds: f64,
) -> Result<Vec<HistogramBucket>, CoreError> {
    if !(bucket_seconds > 0.0) {
        return Err(CoreError::InvalidBucketWidth(bucket_seconds));
    }

    let mut counts: Vec<u64> = Vec::new();
    for record in records {
        let Some(duration) = record.duration_seconds else {
            continue;
        };
        if duration < 0.0 {
            continue;
        }
        let index = (duration / bucket_seconds).floor() as usize;
        if counts.len() <= index {
            counts.resize(index + 1, 0);
        }
        counts[index] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: i as f64 * bucket_seconds,
            upper: (i + 1) as f64 * bucket_seconds,
            count,
        })
        .collect())
}

/// Counts of assets per review status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub query: u64,
}

impl ReviewStatusCounts {
    pub fn add(&mut self, status: ReviewStatus) {
        match status {
            ReviewStatus::Pending => self.pending += 1,
            ReviewStatus::Approved => self.approved += 1,
            ReviewStatus::Rejected => self.rejected += 1,
            ReviewStatus::Query => self.query += 1,
        }
    }
}

/// Dashboard headline numbers for a record set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub asset_count: u64,
    pub total_bytes: i64,
    pub total_duration_seconds: f64,
    pub subject_count: u64,
    pub site_count: u64,
    pub review_counts: ReviewStatusCounts,
}

/// Single pass over the records: totals plus distinct subject/site counts.
pub fn overview(records: &[AssetRecord]) -> OverviewStats {
    let mut stats = OverviewStats::default();
    let mut subjects = HashSet::new();
    let mut sites = HashSet::new();
    for record in records {
        stats.asset_count += 1;
        stats.total_bytes += record.size_bytes;
        stats.total_duration_seconds += record.duration_seconds.unwrap_or(0.0);
        stats.review_counts.add(record.review_status);
        subjects.insert(record.subject_id);
        sites.insert(record.site_id);
    }
    stats.subject_count = subjects.len() as u64;
    stats.site_count = sites.len() as u64;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetModality;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record(country: &str, bytes: i64, duration: Option<f64>) -> AssetRecord {
        AssetRecord {
            asset_id: Uuid::new_v4(),
            trial_id: Uuid::new_v4(),
            protocol_code: "ONC-301".to_string(),
            trial_title: "Oncology study".to_string(),
            site_id: Uuid::new_v4(),
            site_number: "101".to_string(),
            site_name: "University Hospital".to_string(),
            site_country: country.to_string(),
            subject_id: Uuid::new_v4(),
            screening_number: "SCR-0001".to_string(),
            study_arm: "Treatment".to_string(),
            event_id: Uuid::new_v4(),
            event_name: "Baseline".to_string(),
            procedure_id: Uuid::new_v4(),
            procedure_name: "Gait video".to_string(),
            modality: AssetModality::Video,
            file_name: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            size_bytes: bytes,
            duration_seconds: duration,
            uploaded_by: "uploader@example.org".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
            review_status: ReviewStatus::Pending,
            reviewer: None,
        }
    }

    #[test]
    fn test_group_counts_cover_every_input_row() {
        let records = vec![
            record("DE", 100, Some(10.0)),
            record("DE", 200, Some(20.0)),
            record("US", 300, None),
        ];
        let groups = group_assets(&records, GroupKey::Country);
        let total: u64 = groups.iter().map(|g| g.asset_count).sum();
        assert_eq!(total, records.len() as u64);

        // DE has more assets, so it sorts first
        assert_eq!(groups[0].key, "DE");
        assert_eq!(groups[0].total_bytes, 300);
        assert_eq!(groups[0].total_duration_seconds, 30.0);
        assert_eq!(groups[1].key, "US");
    }

    #[test]
    fn test_group_reviewed_count() {
        let mut reviewed = record("DE", 100, None);
        reviewed.review_status = ReviewStatus::Approved;
        let groups = group_assets(&[reviewed, record("DE", 50, None)], GroupKey::Country);
        assert_eq!(groups[0].reviewed_count, 1);
        assert_eq!(groups[0].asset_count, 2);
    }

    #[test]
    fn test_ties_sort_by_key() {
        let records = vec![record("US", 1, None), record("DE", 1, None)];
        let groups = group_assets(&records, GroupKey::Country);
        assert_eq!(groups[0].key, "DE");
        assert_eq!(groups[1].key, "US");
    }

    #[test]
    fn test_group_key_parse() {
        assert_eq!(GroupKey::parse("month").unwrap(), GroupKey::Month);
        assert!(GroupKey::parse("per_site").is_err());
    }

    #[test]
    fn test_histogram_buckets() {
        let records = vec![
            record("DE", 0, Some(5.0)),
            record("DE", 0, Some(29.9)),
            record("DE", 0, Some(30.0)),
            record("DE", 0, Some(95.0)),
            record("DE", 0, None),
        ];
        let buckets = duration_histogram(&records, 30.0).unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].count, 2);
        // 30.0 lands in the second bucket: bounds are [lower, upper)
        assert_eq!(buckets[1].count, 1);
        assert_eq!(buckets[2].count, 0);
        assert_eq!(buckets[3].count, 1);
        assert_eq!(buckets[3].lower, 90.0);
        assert_eq!(buckets[3].upper, 120.0);
    }

    #[test]
    fn test_histogram_rejects_bad_width() {
        assert!(duration_histogram(&[], 0.0).is_err());
        assert!(duration_histogram(&[], -5.0).is_err());
    }

    #[test]
    fn test_histogram_empty_input() {
        assert!(duration_histogram(&[], 10.0).unwrap().is_empty());
        // Records with no duration produce no buckets either
        let records = vec![record("DE", 0, None)];
        assert!(duration_histogram(&records, 10.0).unwrap().is_empty());
    }

    #[test]
    fn test_overview_distinct_counts() {
        let mut a = record("DE", 100, Some(10.0));
        let mut b = record("DE", 200, Some(5.0));
        // Same subject and site for both
        b.subject_id = a.subject_id;
        b.site_id = a.site_id;
        a.review_status = ReviewStatus::Approved;

        let stats = overview(&[a, b]);
        assert_eq!(stats.asset_count, 2);
        assert_eq!(stats.total_bytes, 300);
        assert_eq!(stats.total_duration_seconds, 15.0);
        assert_eq!(stats.subject_count, 1);
        assert_eq!(stats.site_count, 1);
        assert_eq!(stats.review_counts.approved, 1);
        assert_eq!(stats.review_counts.pending, 1);
    }
}
