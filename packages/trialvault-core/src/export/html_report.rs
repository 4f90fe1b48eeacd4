use serde::Serialize;
use tera::{Context, Tera};

use crate::aggregate::{group_assets, overview, GroupKey};
use crate::error::Result;
use crate::model::{format_bytes, format_duration, AssetRecord};

/// Pre-formatted table row handed to the template
#[derive(Debug, Serialize)]
struct ReportRow {
    protocol_code: String,
    site: String,
    country: String,
    screening_number: String,
    event: String,
    procedure: String,
    file_name: String,
    size: String,
    duration: String,
    uploaded_at: String,
    review_status: String,
}

/// Render the HTML summary report: headline metrics, per-country and
/// per-review-status rollups, then the asset table itself.
pub fn write_html_report(records: &[AssetRecord]) -> Result<Vec<u8>> {
    let mut tera = Tera::default();
    tera.add_raw_template("report.html", REPORT_TEMPLATE)?;

    let stats = overview(records);
    let rows: Vec<ReportRow> = records
        .iter()
        .map(|r| ReportRow {
            protocol_code: r.protocol_code.clone(),
            site: format!("{} ({})", r.site_name, r.site_number),
            country: r.site_country.to_uppercase(),
            screening_number: r.screening_number.clone(),
            event: r.event_name.clone(),
            procedure: r.procedure_name.clone(),
            file_name: r.file_name.clone(),
            size: format_bytes(r.size_bytes),
            duration: r
                .duration_seconds
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
            uploaded_at: r.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
            review_status: r.review_status.as_str().to_string(),
        })
        .collect();

    let mut context = Context::new();
    context.insert(
        "generated_at",
        &chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    context.insert("asset_count", &stats.asset_count);
    context.insert("subject_count", &stats.subject_count);
    context.insert("site_count", &stats.site_count);
    context.insert("total_size", &format_bytes(stats.total_bytes));
    context.insert(
        "total_duration",
        &format_duration(stats.total_duration_seconds),
    );
    context.insert("review_counts", &stats.review_counts);
    context.insert("by_country", &group_assets(records, GroupKey::Country));
    context.insert(
        "by_review_status",
        &group_assets(records, GroupKey::ReviewStatus),
    );
    context.insert("rows", &rows);

    let html = tera.render("report.html", &context)?;
    Ok(html.into_bytes())
}

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Asset Report</title>
<style>
  body { font-family: -apple-system, Helvetica, Arial, sans-serif; margin: 2em; color: #1a1a2e; }
  h1 { font-size: 1.6em; }
  h2 { font-size: 1.2em; margin-top: 1.8em; }
  .meta { color: #666; font-size: 0.9em; }
  table { border-collapse: collapse; margin-top: 0.8em; width: 100%; }
  th, td { border: 1px solid #d0d0d8; padding: 6px 10px; text-align: left; font-size: 0.85em; }
  th { background: #f2f2f7; }
  td.num { text-align: right; }
</style>
</head>
<body>
<h1>Clinical Trial Asset Report</h1>
<p class="meta">Generated {{ generated_at }}</p>

<h2>Overview</h2>
<table>
  <tr><th>Assets</th><th>Subjects</th><th>Sites</th><th>Total size</th><th>Total duration</th></tr>
  <tr>
    <td class="num">{{ asset_count }}</td>
    <td class="num">{{ subject_count }}</td>
    <td class="num">{{ site_count }}</td>
    <td class="num">{{ total_size }}</td>
    <td class="num">{{ total_duration }}</td>
  </tr>
</table>

<h2>Review progress</h2>
<table>
  <tr><th>Pending</th><th>Approved</th><th>Rejected</th><th>Query</th></tr>
  <tr>
    <td class="num">{{ review_counts.pending }}</td>
    <td class="num">{{ review_counts.approved }}</td>
    <td class="num">{{ review_counts.rejected }}</td>
    <td class="num">{{ review_counts.query }}</td>
  </tr>
</table>

<h2>Assets by country</h2>
<table>
  <tr><th>Country</th><th>Assets</th><th>Reviewed</th></tr>
  {% for group in by_country %}
  <tr><td>{{ group.key }}</td><td class="num">{{ group.asset_count }}</td><td class="num">{{ group.reviewed_count }}</td></tr>
  {% endfor %}
</table>

<h2>Assets by review status</h2>
<table>
  <tr><th>Status</th><th>Assets</th></tr>
  {% for group in by_review_status %}
  <tr><td>{{ group.key }}</td><td class="num">{{ group.asset_count }}</td></tr>
  {% endfor %}
</table>

<h2>Assets</h2>
<table>
  <tr>
    <th>Protocol</th><th>Site</th><th>Country</th><th>Subject</th><th>Event</th>
    <th>Procedure</th><th>File</th><th>Size</th><th>Duration</th><th>Uploaded</th><th>Review</th>
  </tr>
  {% for row in rows %}
  <tr>
    <td>{{ row.protocol_code }}</td>
    <td>{{ row.site }}</td>
    <td>{{ row.country }}</td>
    <td>{{ row.screening_number }}</td>
    <td>{{ row.event }}</td>
    <td>{{ row.procedure }}</td>
    <td>{{ row.file_name }}</td>
    <td class="num">{{ row.size }}</td>
    <td class="num">{{ row.duration }}</td>
    <td>{{ row.uploaded_at }}</td>
    <td>{{ row.review_status }}</td>
  </tr>
  {% endfor %}
</table>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetModality, ReviewStatus};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record() -> AssetRecord {
        AssetRecord {
            asset_id: Uuid::new_v4(),
            trial_id: Uuid::new_v4(),
            protocol_code: "ONC-301".to_string(),
            trial_title: "Oncology study".to_string(),
            site_id: Uuid::new_v4(),
            site_number: "101".to_string(),
            site_name: "University Hospital".to_string(),
            site_country: "de".to_string(),
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
            size_bytes: 1_572_864,
            duration_seconds: Some(65.0),
            uploaded_by: "uploader@example.org".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap(),
            review_status: ReviewStatus::Approved,
            reviewer: Some("reviewer@cro.example".to_string()),
        }
    }

    #[test]
    fn test_report_contains_overview_and_rows() {
        let bytes = write_html_report(&[record()]).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("Clinical Trial Asset Report"));
        assert!(html.contains("1.5 MB"));
        assert!(html.contains("1:05"));
        assert!(html.contains("clip.mp4"));
        assert!(html.contains("DE"));
    }

    #[test]
    fn test_file_names_are_html_escaped() {
        let mut r = record();
        r.file_name = "<script>alert(1)</script>.mp4".to_string();
        let bytes = write_html_report(&[r]).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_record_set_renders() {
        let bytes = write_html_report(&[]).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("Generated "));
    }
}
