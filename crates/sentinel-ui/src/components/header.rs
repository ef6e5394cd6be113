use crate::themes::Theme;
use sentinel_core::formatting::{pluralize, truncate_to_width};

/// Decoration placed either side of the report title.
pub const SHIELD: &str = "◆";

/// Report header rendering four lines:
///
/// 1. Application title between shield marks.
/// 2. A `=` separator spanning the report width.
/// 3. `[ file name | N messages ]`.
/// 4. An empty line.
pub struct Header<'a> {
    /// Transcript file name.
    pub file_name: &'a str,
    /// Number of parsed messages.
    pub message_count: usize,
    /// Report width in columns.
    pub width: usize,
    /// Theme providing colour styles for each part of the header.
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(file_name: &'a str, message_count: usize, width: usize, theme: &'a Theme) -> Self {
        Self {
            file_name,
            message_count,
            width,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<String> {
        let t = self.theme;
        let name_room = self.width.saturating_sub(24).max(8);

        vec![
            format!(
                "{} {} {}",
                t.header_accent.paint(SHIELD),
                t.header.paint("SENTINELCHAT THREAT REPORT"),
                t.header_accent.paint(SHIELD)
            ),
            t.separator.paint(&"=".repeat(self.width)),
            format!(
                "{}{}{}{}{}",
                t.label.paint("[ "),
                t.value.paint(&truncate_to_width(self.file_name, name_room)),
                t.label.paint(" | "),
                t.value.paint(&pluralize(self.message_count, "message")),
                t.label.paint(" ]"),
            ),
            String::new(),
        ]
    }
}
