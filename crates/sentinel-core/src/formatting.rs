use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format an integer count with thousands separators.
///
/// # Examples
///
/// ```
/// use sentinel_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

/// Format `count` followed by `noun`, pluralised with a trailing `s` when the
/// count is not exactly one.
///
/// # Examples
///
/// ```
/// use sentinel_core::formatting::pluralize;
///
/// assert_eq!(pluralize(1, "message"), "1 message");
/// assert_eq!(pluralize(0, "threat"), "0 threats");
/// assert_eq!(pluralize(2500, "line"), "2,500 lines");
/// ```
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", format_count(count), noun)
    } else {
        format!("{} {}s", format_count(count), noun)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use sentinel_core::formatting::percentage;
///
/// assert!((percentage(3, 10, 1) - 30.0).abs() < 1e-9);
/// assert_eq!(percentage(0, 0, 2), 0.0);
/// ```
pub fn percentage(part: usize, whole: usize, decimal_places: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = (part as f64 / whole as f64) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Shorten `text` to at most `max_width` terminal columns, appending `…` when
/// anything was cut. Only the first line of `text` is considered.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let was_multiline = text.lines().nth(1).is_some();

    if first_line.width() <= max_width && !was_multiline {
        return first_line.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in first_line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Greedy word wrap measured in terminal columns.
///
/// Existing newlines are kept as hard breaks. Words wider than `width` are
/// split at character boundaries. A `width` of zero disables wrapping.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.width();

            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }

            if word_width > width {
                for ch in word.chars() {
                    let w = ch.width().unwrap_or(0);
                    if current_width + w > width {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0;
                    }
                    current.push(ch);
                    current_width += w;
                }
                continue;
            }

            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        }

        lines.push(current);
    }
    lines
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
