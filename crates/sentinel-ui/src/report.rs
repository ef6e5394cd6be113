//! Whole-session text report.
//!
//! [`SessionReport`] is the read-only view the renderers work from; the
//! binary builds one per scanned transcript.

use sentinel_core::models::MessageRecord;
use sentinel_data::aggregator::{ThreatAggregator, ThreatSummary};

use crate::components::card::MessageCard;
use crate::components::header::Header;
use crate::components::summary::SummaryPanel;
use crate::themes::Theme;

/// Everything a renderer needs to know about one session.
#[derive(Debug, Clone)]
pub struct SessionReport<'a> {
    pub file_name: &'a str,
    pub analyzed: bool,
    pub messages: &'a [MessageRecord],
    pub summary: ThreatSummary,
    pub skipped_lines: usize,
    pub last_error: Option<&'a str>,
}

impl<'a> SessionReport<'a> {
    pub fn new(file_name: &'a str, messages: &'a [MessageRecord], analyzed: bool) -> Self {
        Self {
            file_name,
            analyzed,
            messages,
            summary: ThreatAggregator::summarize(messages),
            skipped_lines: 0,
            last_error: None,
        }
    }

    pub fn with_skipped_lines(mut self, skipped_lines: usize) -> Self {
        self.skipped_lines = skipped_lines;
        self
    }

    pub fn with_last_error(mut self, last_error: Option<&'a str>) -> Self {
        self.last_error = last_error;
        self
    }
}

/// Renders [`SessionReport`]s as themed terminal text.
pub struct TextRenderer<'a> {
    theme: &'a Theme,
    width: usize,
    threats_only: bool,
}

impl<'a> TextRenderer<'a> {
    pub fn new(theme: &'a Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            threats_only: false,
        }
    }

    /// Only print cards for messages counted as threats.
    pub fn threats_only(mut self, threats_only: bool) -> Self {
        self.threats_only = threats_only;
        self
    }

    pub fn render_lines(&self, report: &SessionReport<'_>) -> Vec<String> {
        let mut lines =
            Header::new(report.file_name, report.messages.len(), self.width, self.theme).to_lines();

        lines.extend(
            SummaryPanel {
                summary: &report.summary,
                analyzed: report.analyzed,
                skipped_lines: report.skipped_lines,
                last_error: report.last_error,
                width: self.width,
                theme: self.theme,
            }
            .to_lines(),
        );

        if report.messages.is_empty() {
            lines.push(self.theme.dim.paint("No messages found in this transcript."));
            lines.push(String::new());
            return lines;
        }

        let mut shown = 0;
        for message in report.messages {
            if self.threats_only && !message.is_threat() {
                continue;
            }
            lines.extend(MessageCard::new(message, self.width, self.theme).to_lines());
            shown += 1;
        }

        if shown == 0 {
            lines.push(self.theme.success.paint("No threats detected."));
            lines.push(String::new());
        }

        lines
    }

    pub fn render(&self, report: &SessionReport<'_>) -> String {
        let mut out = self.render_lines(report).join("\n");
        out.push('\n');
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
