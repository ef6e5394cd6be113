use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity assigned to a message by the classifier.
///
/// Variants are declared in ascending severity so the derived `Ord` can be
/// used to sort or pick the worst level in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Every level, least severe first.
    pub const ALL: [ThreatLevel; 5] = [
        ThreatLevel::Safe,
        ThreatLevel::Low,
        ThreatLevel::Medium,
        ThreatLevel::High,
        ThreatLevel::Critical,
    ];

    /// The wire spelling (`"SAFE"`, `"LOW"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Safe => "SAFE",
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }

    /// Parse a level name, ignoring ASCII case. Returns `None` for anything
    /// outside the five known levels.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict attached to a [`MessageRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessment {
    pub is_threat: bool,
    pub threat_level: ThreatLevel,
    pub threat_type: String,
    pub explanation: String,
}

impl ThreatAssessment {
    /// A message counts as a threat only when flagged *and* rated above SAFE.
    pub fn counts_as_threat(&self) -> bool {
        self.is_threat && self.threat_level != ThreatLevel::Safe
    }
}

/// One chat message reconstructed from a transcript export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// `msg-<line index>` of the header line that opened this message.
    pub id: String,
    /// Date/time text exactly as it appeared in the export.
    pub timestamp: String,
    /// Display name of the author, trimmed.
    pub sender: String,
    /// Message body; continuation lines are joined with `\n`.
    pub content: String,
    /// Verdict from the classifier. `None` means not classified yet, which is
    /// distinct from a SAFE verdict.
    #[serde(flatten)]
    pub assessment: Option<ThreatAssessment>,
}

impl MessageRecord {
    pub fn new(
        id: impl Into<String>,
        timestamp: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            sender: sender.into(),
            content: content.into(),
            assessment: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.assessment.is_some()
    }

    /// `true` when the attached assessment flags a non-SAFE threat.
    pub fn is_threat(&self) -> bool {
        self.assessment
            .as_ref()
            .map(ThreatAssessment::counts_as_threat)
            .unwrap_or(false)
    }

    pub fn threat_level(&self) -> Option<ThreatLevel> {
        self.assessment.as_ref().map(|a| a.threat_level)
    }
}

/// A single message as submitted to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationItem {
    pub id: String,
    pub sender: String,
    #[serde(rename = "text")]
    pub content: String,
}

impl From<&MessageRecord> for ClassificationItem {
    fn from(record: &MessageRecord) -> Self {
        Self {
            id: record.id.clone(),
            sender: record.sender.clone(),
            content: record.content.clone(),
        }
    }
}

/// A single verdict returned by the classifier, matched back to a record by
/// `message_id == MessageRecord::id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub message_id: String,
    pub is_threat: bool,
    pub threat_level: ThreatLevel,
    pub threat_type: String,
    pub explanation: String,
}

impl ClassificationResult {
    pub fn to_assessment(&self) -> ThreatAssessment {
        ThreatAssessment {
            is_threat: self.is_threat,
            threat_level: self.threat_level,
            threat_type: self.threat_type.clone(),
            explanation: self.explanation.clone(),
        }
    }
}
