//! Line parser for exported chat transcripts.
//!
//! Exports put one message header per line, e.g.
//!
//! ```text
//! [01/02/23, 10:00:00] Alice: Hello
//! 01/02/23, 10:00 - Bob: Hi!
//! 1/2/2023, 9:41 PM - Carol: see you
//! ```
//!
//! and any following line that is not itself a header continues the previous
//! message. Parsing is a two-state machine (no record open / record open)
//! driven by a single compiled pattern. The pattern's three capture groups are
//! the only coupling to the export format:
//!
//! | group | meaning                                            |
//! |-------|----------------------------------------------------|
//! | 1     | date and time, kept verbatim                       |
//! | 2     | sender display name (no colons), trimmed later     |
//! | 3     | first line of the body, trimmed later              |
//!
//! Supporting another export variant means extending [`HEADER_PATTERN`] while
//! keeping those groups.

use std::sync::OnceLock;

use regex::Regex;
use sentinel_core::models::MessageRecord;
use tracing::debug;

/// Header line pattern. Matching is case-insensitive so `am`/`PM` both work.
///
/// Shape: optional `[`, `D/M/YY[YY]`, optional comma, whitespace,
/// `H:MM[:SS]` with an optional AM/PM marker, optional `]`, whitespace,
/// optional `-`, optional whitespace, sender, `: `, body.
pub const HEADER_PATTERN: &str = r"(?i)^\[?(\d{1,2}/\d{1,2}/\d{2,4},?\s\d{1,2}:\d{2}(?::\d{2})?(?:\s?[ap]\.?m\.?)?)\]?\s-?\s?([^:]+):\s(.+)$";

/// Invisible marks some exporters put in front of a header line.
const LEADING_MARKS: &[char] = &['\u{feff}', '\u{200e}', '\u{200f}'];

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEADER_PATTERN).expect("regex is valid"))
}

/// Outcome of a parse, with diagnostics about lines that could not be placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Parsed messages in transcript order.
    pub messages: Vec<MessageRecord>,
    /// Zero-based indices of non-blank lines dropped because they came before
    /// the first recognised header.
    pub dropped_lines: Vec<usize>,
    /// Number of physical lines in the input.
    pub line_count: usize,
}

impl ParseReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped_lines.len()
    }
}

enum ParserState {
    NoOpenRecord,
    RecordOpen(MessageRecord),
}

/// Reconstructs [`MessageRecord`]s from transcript text.
///
/// Stateless between calls: every call to [`parse`](Self::parse) starts from
/// scratch, so the same input always yields the same records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptParser;

impl TranscriptParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw_text` into messages. Never fails; unrecognised input just
    /// yields fewer (possibly zero) records.
    ///
    /// Record ids are `msg-<line index>` of the opening header line, so they
    /// are unique and deterministic but not contiguous when messages span
    /// several lines.
    pub fn parse(&self, raw_text: &str) -> Vec<MessageRecord> {
        self.parse_report(raw_text).messages
    }

    /// Same as [`parse`](Self::parse), but also reports which lines were
    /// dropped for lack of a preceding header.
    pub fn parse_report(&self, raw_text: &str) -> ParseReport {
        let re = header_regex();
        let mut report = ParseReport::default();
        let mut state = ParserState::NoOpenRecord;

        for (index, line) in raw_text.split('\n').enumerate() {
            report.line_count += 1;

            if let Some(record) = match_header(re, index, line) {
                if let ParserState::RecordOpen(previous) = state {
                    report.messages.push(previous);
                }
                state = ParserState::RecordOpen(record);
                continue;
            }

            let trimmed = line.trim();
            match &mut state {
                ParserState::RecordOpen(current) => {
                    if !trimmed.is_empty() {
                        current.content.push('\n');
                        current.content.push_str(trimmed);
                    }
                }
                ParserState::NoOpenRecord => {
                    if !trimmed.is_empty() {
                        report.dropped_lines.push(index);
                    }
                }
            }
        }

        if let ParserState::RecordOpen(last) = state {
            report.messages.push(last);
        }

        debug!(
            "Parsed {} messages from {} lines ({} dropped)",
            report.messages.len(),
            report.line_count,
            report.dropped_lines.len()
        );

        report
    }
}

/// Try to read `line` as a message header.
fn match_header(re: &Regex, index: usize, line: &str) -> Option<MessageRecord> {
    let candidate = line.trim_start_matches(LEADING_MARKS);
    let caps = re.captures(candidate)?;
    Some(MessageRecord::new(
        format!("msg-{}", index),
        &caps[1],
        caps[2].trim(),
        caps[3].trim(),
    ))
}

/// Convenience wrapper around [`TranscriptParser::parse`].
pub fn parse_transcript(raw_text: &str) -> Vec<MessageRecord> {
    TranscriptParser::new().parse(raw_text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
