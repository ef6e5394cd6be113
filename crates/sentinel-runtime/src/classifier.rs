//! The classification seam and the merge of verdicts back into records.

use sentinel_core::error::Result;
use sentinel_core::models::{ClassificationResult, MessageRecord};
use std::collections::HashMap;
use tracing::debug;

/// Anything able to judge a batch of messages.
///
/// Implementations return one verdict per message they could judge; results
/// may be partial, reordered or empty. Failure to reach a verdict at all is an
/// error.
#[allow(async_fn_in_trait)]
pub trait ThreatClassifier {
    async fn classify(&self, batch: &[MessageRecord]) -> Result<Vec<ClassificationResult>>;
}

/// Attach verdicts to the records they name.
///
/// A record is annotated when its `id` equals some result's `message_id`.
/// Records without a verdict are left untouched; verdicts naming unknown ids
/// are ignored. When a record is named twice the later verdict wins.
///
/// Returns the number of records annotated.
pub fn apply_results(records: &mut [MessageRecord], results: &[ClassificationResult]) -> usize {
    let by_id: HashMap<&str, &ClassificationResult> = results
        .iter()
        .map(|r| (r.message_id.as_str(), r))
        .collect();

    let mut applied = 0;
    for record in records.iter_mut() {
        if let Some(result) = by_id.get(record.id.as_str()) {
            record.assessment = Some(result.to_assessment());
            applied += 1;
        }
    }

    let unknown = by_id.len().saturating_sub(applied);
    if unknown > 0 {
        debug!(unknown, "ignoring verdicts for unknown message ids");
    }

    applied
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::models::ThreatLevel;

    fn records(n: usize) -> Vec<MessageRecord> {
        (0..n)
            .map(|i| MessageRecord::new(format!("msg-{i}"), "1/1/24, 10:00", "A", "hi"))
            .collect()
    }

    fn result(id: &str, level: ThreatLevel) -> ClassificationResult {
        ClassificationResult {
            message_id: id.to_string(),
            is_threat: level != ThreatLevel::Safe,
            threat_level: level,
            threat_type: "Phishing".to_string(),
            explanation: "link to a fake bank".to_string(),
        }
    }

    #[test]
    fn test_apply_matches_by_id() {
        let mut recs = records(3);
        let applied = apply_results(&mut recs, &[result("msg-2", ThreatLevel::High)]);
        assert_eq!(applied, 1);
        assert!(recs[0].assessment.is_none());
        assert!(recs[1].assessment.is_none());
        assert_eq!(recs[2].threat_level(), Some(ThreatLevel::High));
    }

    #[test]
    fn test_apply_ignores_unknown_ids() {
        let mut recs = records(2);
        let applied = apply_results(&mut recs, &[result("msg-99", ThreatLevel::Critical)]);
        assert_eq!(applied, 0);
        assert!(recs.iter().all(|r| !r.is_classified()));
    }

    #[test]
    fn test_apply_order_independent() {
        let mut recs = records(3);
        apply_results(
            &mut recs,
            &[
                result("msg-2", ThreatLevel::Low),
                result("msg-0", ThreatLevel::Safe),
                result("msg-1", ThreatLevel::Medium),
            ],
        );
        assert_eq!(recs[0].threat_level(), Some(ThreatLevel::Safe));
        assert_eq!(recs[1].threat_level(), Some(ThreatLevel::Medium));
        assert_eq!(recs[2].threat_level(), Some(ThreatLevel::Low));
    }

    #[test]
    fn test_apply_later_duplicate_wins() {
        let mut recs = records(1);
        apply_results(
            &mut recs,
            &[result("msg-0", ThreatLevel::Low), result("msg-0", ThreatLevel::High)],
        );
        assert_eq!(recs[0].threat_level(), Some(ThreatLevel::High));
    }

    #[test]
    fn test_apply_empty_results_leaves_records() {
        let mut recs = records(2);
        let before = recs.clone();
        assert_eq!(apply_results(&mut recs, &[]), 0);
        assert_eq!(recs, before);
    }
}
