//! Scan orchestrator.
//!
//! Turns loaded transcripts into [`ScanSession`]s and runs classification
//! over them one after another, stopping cleanly when the shutdown future
//! resolves (Ctrl+C in the binary).

use std::future::Future;

use sentinel_core::settings::{Settings, SkippedLinePolicy, DEFAULT_BATCH_SIZE};
use sentinel_data::reader::Transcript;

use crate::classifier::ThreatClassifier;
use crate::session::ScanSession;

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs that shape a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Messages per classification request.
    pub batch_size: usize,
    /// Only the first N messages of each session are submitted.
    pub max_messages: Option<usize>,
    /// Diagnostics for lines before the first header.
    pub skipped_lines: SkippedLinePolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_messages: None,
            skipped_lines: SkippedLinePolicy::Warn,
        }
    }
}

impl From<&Settings> for ScanOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size(),
            max_messages: settings.max_messages,
            skipped_lines: settings.skipped_lines,
        }
    }
}

/// What happened across all sessions of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Sessions that finished analysis.
    pub analyzed: usize,
    /// `(file name, error message)` for each session whose analysis failed.
    pub failures: Vec<(String, String)>,
    /// The run was interrupted before every session was attempted.
    pub cancelled: bool,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

// ── ScanOrchestrator ──────────────────────────────────────────────────────────

/// Sequential scan coordinator.
pub struct ScanOrchestrator {
    options: ScanOptions,
}

impl ScanOrchestrator {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Parse every transcript into its own session, in input order.
    pub fn load_sessions(&self, transcripts: &[Transcript]) -> Vec<ScanSession> {
        transcripts
            .iter()
            .map(|t| ScanSession::load_with_policy(&t.file_name, &t.text, self.options.skipped_lines))
            .collect()
    }

    /// Classify each session in turn until done or `shutdown` resolves.
    ///
    /// A failing session is recorded and the run moves on to the next one.
    /// On shutdown the in-flight session is aborted back to `Loaded` and the
    /// remaining sessions are left untouched.
    pub async fn run<C, F>(
        &self,
        classifier: &C,
        sessions: &mut [ScanSession],
        shutdown: F,
    ) -> ScanReport
    where
        C: ThreatClassifier,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut report = ScanReport::default();

        for session in sessions.iter_mut() {
            let outcome = tokio::select! {
                res = session.analyze_with_limit(
                    classifier,
                    self.options.batch_size,
                    self.options.max_messages,
                ) => Some(res),
                _ = &mut shutdown => None,
            };

            match outcome {
                Some(Ok(())) => report.analyzed += 1,
                Some(Err(e)) => {
                    report
                        .failures
                        .push((session.file_name().to_string(), e.to_string()));
                }
                None => {
                    tracing::info!(file = session.file_name(), "scan interrupted");
                    session.abort();
                    report.cancelled = true;
                    break;
                }
            }
        }

        tracing::debug!(
            analyzed = report.analyzed,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "scan run finished"
        );
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
