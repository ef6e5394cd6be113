//! Machine-readable report output.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use sentinel_core::error::Result;
use sentinel_core::models::MessageRecord;
use sentinel_data::aggregator::ThreatSummary;

use crate::report::SessionReport;

/// Serialised form of one session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub file_name: &'a str,
    pub analyzed: bool,
    pub generated_at: String,
    pub summary: &'a ThreatSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<&'a str>,
    pub messages: &'a [MessageRecord],
}

impl<'a> JsonReport<'a> {
    pub fn from_report(report: &'a SessionReport<'a>, generated_at: DateTime<Utc>) -> Self {
        Self {
            file_name: report.file_name,
            analyzed: report.analyzed,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            summary: &report.summary,
            last_error: report.last_error,
            messages: report.messages,
        }
    }
}

/// Render reports as pretty JSON, stamped with the current time.
///
/// A single report becomes one object; several become an array of objects.
pub fn render_json(reports: &[SessionReport<'_>]) -> Result<String> {
    render_json_at(reports, Utc::now())
}

pub fn render_json_at(reports: &[SessionReport<'_>], generated_at: DateTime<Utc>) -> Result<String> {
    let docs: Vec<JsonReport<'_>> = reports
        .iter()
        .map(|r| JsonReport::from_report(r, generated_at))
        .collect();

    let text = match docs.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sentinel_core::models::{ThreatAssessment, ThreatLevel};
    use serde_json::Value;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 12, 9, 30, 0).unwrap()
    }

    fn messages() -> Vec<MessageRecord> {
        let mut flagged = MessageRecord::new("msg-2", "12/03/24, 09:15:40", "Unknown", "Pay now");
        flagged.assessment = Some(ThreatAssessment {
            is_threat: true,
            threat_level: ThreatLevel::High,
            threat_type: "Delivery Scam".into(),
            explanation: "Fee request".into(),
        });
        vec![
            MessageRecord::new("msg-0", "12/03/24, 09:14:02", "Mum", "Lunch?"),
            flagged,
        ]
    }

    #[test]
    fn test_single_report_is_object() {
        let msgs = messages();
        let reports = vec![SessionReport::new("family.txt", &msgs, true)];
        let value: Value = serde_json::from_str(&render_json_at(&reports, stamp()).unwrap()).unwrap();

        assert_eq!(value["fileName"], "family.txt");
        assert_eq!(value["analyzed"], true);
        assert_eq!(value["generatedAt"], "2024-03-12T09:30:00Z");
        assert_eq!(value["summary"]["threatCount"], 1);
        assert!(value.get("lastError").is_none());

        let first = &value["messages"][0];
        assert_eq!(first["id"], "msg-0");
        assert!(first.get("threatLevel").is_none());

        let second = &value["messages"][1];
        assert_eq!(second["threatLevel"], "HIGH");
        assert_eq!(second["isThreat"], true);
        assert_eq!(second["threatType"], "Delivery Scam");
    }

    #[test]
    fn test_multiple_reports_are_array() {
        let msgs = messages();
        let reports = vec![
            SessionReport::new("a.txt", &msgs, false),
            SessionReport::new("b.txt", &msgs[..1], false).with_last_error(Some("boom")),
        ];
        let value: Value = serde_json::from_str(&render_json_at(&reports, stamp()).unwrap()).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1]["fileName"], "b.txt");
        assert_eq!(arr[1]["lastError"], "boom");
    }

    #[test]
    fn test_render_json_uses_current_time() {
        let reports = vec![SessionReport::new("a.txt", &[], false)];
        let value: Value = serde_json::from_str(&render_json(&reports).unwrap()).unwrap();
        let stamp = value["generatedAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
