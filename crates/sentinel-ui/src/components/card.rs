use crate::themes::Theme;
use sentinel_core::formatting::{truncate_to_width, wrap_text};
use sentinel_core::models::MessageRecord;

/// Badge text for a message without a verdict.
pub const UNRATED: &str = "UNRATED";

const BADGE_WIDTH: usize = 8;
const BODY_INDENT: &str = "  ";
const NOTE_MARK: &str = "↳ ";

/// One message rendered as a badge line, its wrapped body and, when the
/// classifier had something to say, a wrapped verdict note.
pub struct MessageCard<'a> {
    pub message: &'a MessageRecord,
    pub width: usize,
    pub theme: &'a Theme,
}

impl<'a> MessageCard<'a> {
    pub fn new(message: &'a MessageRecord, width: usize, theme: &'a Theme) -> Self {
        Self {
            message,
            width,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<String> {
        let t = self.theme;
        let m = self.message;
        let level = m.threat_level();
        let badge_text = level.map(|l| l.as_str()).unwrap_or(UNRATED);

        let mut lines = vec![format!(
            "{} {} {}",
            t.level_style(level)
                .paint(&format!("{:<width$}", badge_text, width = BADGE_WIDTH)),
            t.timestamp.paint(&m.timestamp),
            t.sender.paint(&truncate_to_width(&m.sender, self.width / 3)),
        )];

        let body_style = if m.is_classified() { t.text } else { t.unclassified };
        let body_width = self.width.saturating_sub(BODY_INDENT.len());
        for line in wrap_text(&m.content, body_width) {
            lines.push(format!("{}{}", BODY_INDENT, body_style.paint(&line)));
        }

        if let Some(note) = self.note() {
            let note_width = body_width.saturating_sub(NOTE_MARK.chars().count());
            let style = if m.is_threat() { t.level_style(level) } else { t.dim };
            for (i, line) in wrap_text(&note, note_width).into_iter().enumerate() {
                let lead = if i == 0 { NOTE_MARK } else { "  " };
                lines.push(format!("{}{}{}", BODY_INDENT, t.dim.paint(lead), style.paint(&line)));
            }
        }

        lines.push(String::new());
        lines
    }

    /// `"<type>: <explanation>"` for threats, the bare explanation otherwise.
    fn note(&self) -> Option<String> {
        let a = self.message.assessment.as_ref()?;
        let explanation = a.explanation.trim();
        if a.counts_as_threat() {
            let kind = a.threat_type.trim();
            return Some(match (kind.is_empty(), explanation.is_empty()) {
                (true, true) => "Flagged without explanation".to_string(),
                (true, false) => explanation.to_string(),
                (false, true) => kind.to_string(),
                (false, false) => format!("{}: {}", kind, explanation),
            });
        }
        (!explanation.is_empty()).then(|| explanation.to_string())
    }
}
