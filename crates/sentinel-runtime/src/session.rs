//! Scan session state.
//!
//! A [`ScanSession`] owns one parsed transcript and moves through
//! `Loaded → Analyzing → Analyzed`. A failed or aborted analysis returns it to
//! `Loaded` with the messages exactly as they were, so the caller can retry
//! without re-reading the file.

use serde::Serialize;
use tracing::{debug, info, warn};

use sentinel_core::error::{Result, SentinelError};
use sentinel_core::formatting::pluralize;
use sentinel_core::models::{ClassificationResult, MessageRecord};
use sentinel_core::settings::SkippedLinePolicy;
use sentinel_data::aggregator::{ThreatAggregator, ThreatSummary};
use sentinel_data::parser::TranscriptParser;

use crate::classifier::{apply_results, ThreatClassifier};

// ── SessionState ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Messages parsed, no verdicts attached.
    Loaded,
    /// A classification run is in flight.
    Analyzing,
    /// Every submitted batch was classified and merged.
    Analyzed,
}

// ── ScanSession ───────────────────────────────────────────────────────────────

/// One transcript under inspection.
#[derive(Debug, Clone)]
pub struct ScanSession {
    file_name: String,
    messages: Vec<MessageRecord>,
    dropped_lines: Vec<usize>,
    state: SessionState,
    threat_count: usize,
    last_error: Option<String>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            messages: Vec::new(),
            dropped_lines: Vec::new(),
            state: SessionState::Loaded,
            threat_count: 0,
            last_error: None,
        }
    }
}

impl ScanSession {
    /// Parse `raw_text` into a fresh session, warning about dropped lines.
    pub fn load(file_name: &str, raw_text: &str) -> Self {
        Self::load_with_policy(file_name, raw_text, SkippedLinePolicy::Warn)
    }

    /// Parse `raw_text` into a fresh session.
    pub fn load_with_policy(file_name: &str, raw_text: &str, policy: SkippedLinePolicy) -> Self {
        let report = TranscriptParser::new().parse_report(raw_text);

        if report.dropped_count() > 0 && policy == SkippedLinePolicy::Warn {
            warn!(
                file = file_name,
                "{} could not be parsed",
                pluralize(report.dropped_count(), "line")
            );
        }

        info!(
            file = file_name,
            messages = report.messages.len(),
            "transcript loaded"
        );

        Self {
            file_name: file_name.to_string(),
            messages: report.messages,
            dropped_lines: report.dropped_lines,
            ..Self::default()
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_analyzed(&self) -> bool {
        self.state == SessionState::Analyzed
    }

    /// Threats found by the last successful analysis; zero before that.
    pub fn threat_count(&self) -> usize {
        self.threat_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Line indices discarded because they preceded the first header.
    pub fn dropped_lines(&self) -> &[usize] {
        &self.dropped_lines
    }

    pub fn summary(&self) -> ThreatSummary {
        ThreatAggregator::summarize(&self.messages)
    }

    // ── Analysis ──────────────────────────────────────────────────────────

    /// Classify every message in batches of `batch_size`.
    pub async fn analyze<C: ThreatClassifier>(
        &mut self,
        classifier: &C,
        batch_size: usize,
    ) -> Result<()> {
        self.analyze_with_limit(classifier, batch_size, None).await
    }

    /// Classify the first `limit` messages (all when `None`) in batches of
    /// `batch_size`.
    ///
    /// Does nothing when the session is already analyzed or an analysis is
    /// in flight. Verdicts are merged only after every batch succeeded; on
    /// failure the session returns to [`SessionState::Loaded`] untouched apart
    /// from [`last_error`](Self::last_error), and the error is returned.
    pub async fn analyze_with_limit<C: ThreatClassifier>(
        &mut self,
        classifier: &C,
        batch_size: usize,
        limit: Option<usize>,
    ) -> Result<()> {
        if matches!(self.state, SessionState::Analyzed | SessionState::Analyzing) {
            debug!(state = ?self.state, "analysis already done or running");
            return Ok(());
        }
        if batch_size == 0 {
            return Err(SentinelError::InvalidBatchSize(batch_size));
        }

        self.state = SessionState::Analyzing;
        self.last_error = None;

        let outcome = self.collect_results(classifier, batch_size, limit).await;
        match outcome {
            Ok(results) => {
                let applied = apply_results(&mut self.messages, &results);
                self.threat_count = ThreatAggregator::threat_count(&self.messages);
                self.state = SessionState::Analyzed;
                info!(
                    file = %self.file_name,
                    classified = applied,
                    threats = self.threat_count,
                    "analysis complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!(file = %self.file_name, error = %e, "analysis failed");
                self.state = SessionState::Loaded;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Return an interrupted analysis to `Loaded`. A no-op in any other state.
    pub fn abort(&mut self) {
        if self.state == SessionState::Analyzing {
            self.state = SessionState::Loaded;
            self.last_error = Some("Analysis cancelled".to_string());
        }
    }

    /// Discard everything and return to an empty `Loaded` session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    async fn collect_results<C: ThreatClassifier>(
        &self,
        classifier: &C,
        batch_size: usize,
        limit: Option<usize>,
    ) -> Result<Vec<ClassificationResult>> {
        let submit = limit.unwrap_or(self.messages.len()).min(self.messages.len());
        let mut results = Vec::with_capacity(submit);

        for (index, batch) in self.messages[..submit].chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "submitting batch");
            results.extend(classifier.classify(batch).await?);
        }

        Ok(results)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
