use crate::error::{CoreError, Result};
use crate::model::AssetRecord;

/// Fixed column set of the asset CSV download
pub const ASSET_COLUMNS: [&str; 17] = [
    "protocol_code",
    "trial_title",
    "site_number",
    "site_name",
    "country",
    "screening_number",
    "study_arm",
    "event",
    "procedure",
    "file_name",
    "content_type",
    "size_bytes",
    "duration_seconds",
    "uploaded_by",
    "uploaded_at",
    "review_status",
    "reviewer",
];

/// Write records as CSV, one row per record. Quoting and escaping are
/// handled by the writer.
pub fn write_csv(records: &[AssetRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ASSET_COLUMNS)?;

    for record in records {
        let size_bytes = record.size_bytes.to_string();
        let duration = record
            .duration_seconds
            .map(|d| format!("{:.1}", d))
            .unwrap_or_default();
        let uploaded_at = record.uploaded_at.to_rfc3339();

        writer.write_record([
            record.protocol_code.as_str(),
            record.trial_title.as_str(),
            record.site_number.as_str(),
            record.site_name.as_str(),
            record.site_country.as_str(),
            record.screening_number.as_str(),
            record.study_arm.as_str(),
            record.event_name.as_str(),
            record.procedure_name.as_str(),
            record.file_name.as_str(),
            record.content_type.as_str(),
            size_bytes.as_str(),
            duration.as_str(),
            record.uploaded_by.as_str(),
            uploaded_at.as_str(),
            record.review_status.as_str(),
            record.reviewer.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::ExportFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetModality, ReviewStatus};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record_with_file_name(file_name: &str) -> AssetRecord {
        AssetRecord {
            asset_id: Uuid::new_v4(),
            trial_id: Uuid::new_v4(),
            protocol_code: "ONC-301".to_string(),
            trial_title: "Oncology study".to_string(),
            site_id: Uuid::new_v4(),
            site_number: "101".to_string(),
            site_name: "University Hospital".to_string(),
            site_country: "DE".to_string(),
            subject_id: Uuid::new_v4(),
            screening_number: "SCR-0001".to_string(),
            study_arm: "Treatment".to_string(),
            event_id: Uuid::new_v4(),
            event_name: "Baseline".to_string(),
            procedure_id: Uuid::new_v4(),
            procedure_name: "Gait video".to_string(),
            modality: AssetModality::Video,
            file_name: file_name.to_string(),
            content_type: "video/mp4".to_string(),
            size_bytes: 1024,
            duration_seconds: Some(12.34),
            uploaded_by: "uploader@example.org".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
            review_status: ReviewStatus::Pending,
            reviewer: None,
        }
    }

    #[test]
    fn test_header_row_matches_column_set() {
        let bytes = write_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(text.lines().next().unwrap(), ASSET_COLUMNS.join(","));
    }

    #[test]
    fn test_one_row_per_record() {
        let records = vec![
            record_with_file_name("a.mp4"),
            record_with_file_name("b.mp4"),
        ];
        let bytes = write_csv(&records).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1 + records.len());
    }

    #[test]
    fn test_escaping_of_commas_quotes_and_newlines() {
        let tricky = "visit 1, \"final\"\ntake2.mp4";
        let bytes = write_csv(&[record_with_file_name(tricky)]).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[9], tricky);
    }

    #[test]
    fn test_missing_duration_is_an_empty_cell() {
        let mut record = record_with_file_name("a.mp4");
        record.duration_seconds = None;
        let bytes = write_csv(&[record]).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[12], "");
    }
}
