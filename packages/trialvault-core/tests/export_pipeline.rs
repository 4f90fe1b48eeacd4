//! End-to-end pipeline over an in-memory record set: filter, aggregate,
//! then export, checking the row-correspondence invariants along the way.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use trialvault_core::aggregate::{duration_histogram, group_assets, overview, GroupKey};
use trialvault_core::export::{export_assets, ExportFormat, ASSET_COLUMNS};
use trialvault_core::filter::AssetFilter;
use trialvault_core::model::{AssetModality, AssetRecord, ReviewStatus};

struct SiteSeed {
    site_id: Uuid,
    number: &'static str,
    name: &'static str,
    country: &'static str,
}

fn build_records() -> Vec<AssetRecord> {
    let trial_id = Uuid::new_v4();
    let event_id = Uuid::new_v4();
    let procedure_id = Uuid::new_v4();

    let sites = [
        SiteSeed {
            site_id: Uuid::new_v4(),
            number: "101",
            name: "University Hospital",
            country: "DE",
        },
        SiteSeed {
            site_id: Uuid::new_v4(),
            number: "201",
            name: "City Clinic",
            country: "US",
        },
    ];

    let mut records = Vec::new();
    for (i, site) in sites.iter().enumerate() {
        for j in 0..3 {
            let n = i * 3 + j;
            records.push(AssetRecord {
                asset_id: Uuid::new_v4(),
                trial_id,
                protocol_code: "ONC-301".to_string(),
                trial_title: "Phase III oncology study".to_string(),
                site_id: site.site_id,
                site_number: site.number.to_string(),
                site_name: site.name.to_string(),
                site_country: site.country.to_string(),
                subject_id: Uuid::new_v4(),
                screening_number: format!("SCR-{:04}", n),
                study_arm: if n % 2 == 0 { "Treatment" } else { "Placebo" }.to_string(),
                event_id,
                event_name: "Baseline".to_string(),
                procedure_id,
                procedure_name: "Gait video".to_string(),
                modality: AssetModality::Video,
                file_name: format!("gait_{:02}.mp4", n),
                content_type: "video/mp4".to_string(),
                size_bytes: 10_000_000 + n as i64 * 1_000_000,
                duration_seconds: if n == 5 { None } else { Some(30.0 * (n as f64 + 1.0)) },
                uploaded_by: "coordinator@example.org".to_string(),
                uploaded_at: Utc.with_ymd_and_hms(2026, 3, 1 + n as u32, 9, 0, 0).unwrap(),
                review_status: if n % 3 == 0 {
                    ReviewStatus::Approved
                } else {
                    ReviewStatus::Pending
                },
                reviewer: (n % 3 == 0).then(|| "reviewer@cro.example".to_string()),
            });
        }
    }
    records
}

#[test]
fn filter_then_group_preserves_row_correspondence() {
    let records = build_records();

    let filter = AssetFilter {
        country: Some("de".to_string()),
        ..Default::default()
    };
    let filtered: Vec<AssetRecord> = filter.apply(&records).into_iter().cloned().collect();
    assert_eq!(filtered.len(), 3);

    let groups = group_assets(&filtered, GroupKey::StudyArm);
    let grouped_total: u64 = groups.iter().map(|g| g.asset_count).sum();
    assert_eq!(grouped_total, filtered.len() as u64);
}

#[test]
fn overview_matches_manual_totals() {
    let records = build_records();
    let stats = overview(&records);

    assert_eq!(stats.asset_count, 6);
    assert_eq!(stats.site_count, 2);
    assert_eq!(stats.subject_count, 6);
    assert_eq!(stats.review_counts.approved, 2);
    assert_eq!(stats.review_counts.pending, 4);

    let manual_bytes: i64 = records.iter().map(|r| r.size_bytes).sum();
    assert_eq!(stats.total_bytes, manual_bytes);
}

#[test]
fn histogram_skips_missing_durations() {
    let records = build_records();
    let buckets = duration_histogram(&records, 60.0).unwrap();
    let counted: u64 = buckets.iter().map(|b| b.count).sum();
    let with_duration = records.iter().filter(|r| r.duration_seconds.is_some()).count();
    assert_eq!(counted, with_duration as u64);
}

#[test]
fn csv_export_is_one_row_per_record() {
    let records = build_records();
    let bytes = export_assets(&records, ExportFormat::Csv).unwrap();

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), ASSET_COLUMNS.len());

    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), records.len());
    assert_eq!(&rows[0][0], "ONC-301");
}

#[test]
fn json_export_round_trips() {
    let records = build_records();
    let bytes = export_assets(&records, ExportFormat::Json).unwrap();
    let back: Vec<AssetRecord> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back.len(), records.len());
    assert_eq!(back[0].asset_id, records[0].asset_id);
}

#[test]
fn html_export_renders_every_file_name() {
    let records = build_records();
    let bytes = export_assets(&records, ExportFormat::Html).unwrap();
    let html = String::from_utf8(bytes).unwrap();
    for record in &records {
        assert!(html.contains(&record.file_name));
    }
}
