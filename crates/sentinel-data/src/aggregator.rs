//! Threat statistics over an annotated message sequence.
//!
//! Produces the aggregate counts shown next to the message cards: how many
//! messages there are, how many were flagged, and how the verdicts break down
//! by severity, threat type and sender.

use std::collections::BTreeMap;

use sentinel_core::models::{MessageRecord, ThreatLevel};
use serde::Serialize;

// ── SenderStats ───────────────────────────────────────────────────────────────

/// Per-sender message and threat counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderStats {
    pub messages: usize,
    pub threats: usize,
}

// ── ThreatSummary ─────────────────────────────────────────────────────────────

/// Aggregate view of a session's messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSummary {
    /// Number of parsed messages.
    pub total_messages: usize,
    /// Messages flagged as a threat with a level above SAFE.
    pub threat_count: usize,
    /// Messages that received a verdict.
    pub classified: usize,
    /// Messages with no verdict yet.
    pub unclassified: usize,
    /// Verdict counts per level, classified messages only.
    pub by_level: BTreeMap<ThreatLevel, usize>,
    /// Threat counts per threat type label, threats only.
    pub by_type: BTreeMap<String, usize>,
    /// Message and threat counts per sender.
    pub by_sender: BTreeMap<String, SenderStats>,
    /// Most severe level among counted threats.
    pub highest_level: Option<ThreatLevel>,
}

impl ThreatSummary {
    /// Accumulate a single message into the running totals.
    fn add_message(&mut self, message: &MessageRecord) {
        self.total_messages += 1;

        let sender = self.by_sender.entry(message.sender.clone()).or_default();
        sender.messages += 1;

        let Some(assessment) = &message.assessment else {
            self.unclassified += 1;
            return;
        };

        self.classified += 1;
        *self.by_level.entry(assessment.threat_level).or_default() += 1;

        if assessment.counts_as_threat() {
            self.threat_count += 1;
            sender.threats += 1;

            let label = assessment.threat_type.trim();
            let label = if label.is_empty() { "Unspecified" } else { label };
            *self.by_type.entry(label.to_string()).or_default() += 1;

            self.highest_level = self.highest_level.max(Some(assessment.threat_level));
        }
    }

    /// Number of verdicts at `level`.
    pub fn level_count(&self, level: ThreatLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }

    /// Senders with at least one threat, most threats first (ties by name).
    pub fn top_threat_senders(&self, limit: usize) -> Vec<(&str, &SenderStats)> {
        let mut senders: Vec<(&str, &SenderStats)> = self
            .by_sender
            .iter()
            .filter(|(_, s)| s.threats > 0)
            .map(|(name, s)| (name.as_str(), s))
            .collect();
        senders.sort_by(|a, b| b.1.threats.cmp(&a.1.threats).then(a.0.cmp(b.0)));
        senders.truncate(limit);
        senders
    }
}

// ── ThreatAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that summarises annotated messages.
pub struct ThreatAggregator;

impl ThreatAggregator {
    /// Build a [`ThreatSummary`] for `messages`.
    pub fn summarize(messages: &[MessageRecord]) -> ThreatSummary {
        let mut summary = ThreatSummary::default();
        for message in messages {
            summary.add_message(message);
        }
        summary
    }

    /// Count messages flagged as a threat with a level other than SAFE.
    /// Unclassified messages never count.
    pub fn threat_count(messages: &[MessageRecord]) -> usize {
        messages.iter().filter(|m| m.is_threat()).count()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
