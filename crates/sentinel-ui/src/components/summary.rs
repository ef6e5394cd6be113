use crate::themes::Theme;
use sentinel_core::formatting::{format_count, percentage, pluralize, truncate_to_width};
use sentinel_core::models::ThreatLevel;
use sentinel_data::aggregator::ThreatSummary;

/// Width of the label column.
const LABEL_WIDTH: usize = 11;

/// Senders listed in the panel.
const TOP_SENDERS: usize = 3;

/// Aggregate panel printed between the header and the message cards.
pub struct SummaryPanel<'a> {
    pub summary: &'a ThreatSummary,
    /// Whether classification has completed for this session.
    pub analyzed: bool,
    /// Lines dropped before the first message header.
    pub skipped_lines: usize,
    /// Message of the last failed analysis, if any.
    pub last_error: Option<&'a str>,
    pub width: usize,
    pub theme: &'a Theme,
}

impl<'a> SummaryPanel<'a> {
    pub fn to_lines(&self) -> Vec<String> {
        let t = self.theme;
        let s = self.summary;
        let mut lines = Vec::new();

        let status = if self.analyzed {
            t.success.paint("Analyzed")
        } else {
            t.warning.paint("Not analyzed (run with --analyze)")
        };
        lines.push(self.row("Status", status));
        lines.push(self.row("Messages", t.value.paint(&format_count(s.total_messages))));

        if self.analyzed || s.classified > 0 {
            let threat_style = if s.threat_count == 0 {
                t.success
            } else {
                t.level_style(s.highest_level)
            };
            let threats = format!(
                "{} ({:.1}%)",
                format_count(s.threat_count),
                percentage(s.threat_count, s.total_messages, 1)
            );
            lines.push(self.row("Threats", threat_style.paint(&threats)));

            if s.unclassified > 0 {
                lines.push(self.row(
                    "Classified",
                    t.text.paint(&format!(
                        "{}/{}",
                        format_count(s.classified),
                        format_count(s.total_messages)
                    )),
                ));
            }

            let levels: Vec<String> = ThreatLevel::ALL
                .iter()
                .rev()
                .map(|&level| {
                    t.level_style(Some(level))
                        .paint(&format!("{} {}", level, s.level_count(level)))
                })
                .collect();
            lines.push(self.row("Levels", levels.join(t.dim.paint(" · ").as_str())));
        }

        if !s.by_type.is_empty() {
            let mut types: Vec<(&String, &usize)> = s.by_type.iter().collect();
            types.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            let text = types
                .iter()
                .map(|(name, count)| format!("{} ({})", name, count))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(self.row("Types", t.text.paint(&self.fit(&text))));
        }

        let senders = s.top_threat_senders(TOP_SENDERS);
        if !senders.is_empty() {
            let text = senders
                .iter()
                .map(|(name, stats)| format!("{} ({})", name, stats.threats))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(self.row("Senders", t.text.paint(&self.fit(&text))));
        }

        if self.skipped_lines > 0 {
            let text = format!(
                "{} before the first message",
                pluralize(self.skipped_lines, "line")
            );
            lines.push(self.row("Skipped", t.dim.paint(&text)));
        }

        if let Some(err) = self.last_error {
            lines.push(self.row("Error", t.error.paint(&self.fit(err))));
        }

        lines.push(t.separator.paint(&"-".repeat(self.width)));
        lines.push(String::new());
        lines
    }

    fn row(&self, label: &str, value: String) -> String {
        format!(
            "{}{}",
            self.theme.label.paint(&format!("{:<width$}", label, width = LABEL_WIDTH)),
            value
        )
    }

    /// Clip a value to the room left after the label column.
    fn fit(&self, text: &str) -> String {
        truncate_to_width(text, self.width.saturating_sub(LABEL_WIDTH))
    }
}
