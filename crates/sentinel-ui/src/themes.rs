use colored::{Color, ColoredString, Colorize};
use sentinel_core::models::ThreatLevel;

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Anything else is `Unknown`.
pub fn detect_background() -> BackgroundType {
    background_from(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from(colorfgbg: Option<&str>) -> BackgroundType {
    colorfgbg
        .and_then(|val| val.split(';').next_back())
        .and_then(|bg| bg.parse::<u8>().ok())
        .map(|bg| {
            if bg <= 6 {
                BackgroundType::Dark
            } else {
                BackgroundType::Light
            }
        })
        .unwrap_or(BackgroundType::Unknown)
}

/// `true` when the `NO_COLOR` convention asks for uncolored output.
pub fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

// ── Style ─────────────────────────────────────────────────────────────────────

/// Foreground, background and emphasis applied to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dimmed: bool,
}

impl Style {
    /// No styling at all.
    pub const PLAIN: Style = Style {
        fg: None,
        bg: None,
        bold: false,
        dimmed: false,
    };

    pub const fn fg(color: Color) -> Self {
        Style {
            fg: Some(color),
            ..Self::PLAIN
        }
    }

    pub const fn on(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn dimmed(mut self) -> Self {
        self.dimmed = true;
        self
    }

    /// Render `text` with this style as ANSI-escaped output.
    pub fn paint(&self, text: &str) -> String {
        if *self == Self::PLAIN {
            return text.to_string();
        }
        let mut s: ColoredString = text.normal();
        if let Some(fg) = self.fg {
            s = s.color(fg);
        }
        if let Some(bg) = self.bg {
            s = s.on_color(bg);
        }
        if self.bold {
            s = s.bold();
        }
        if self.dimmed {
            s = s.dimmed();
        }
        s.to_string()
    }
}

// ── Theme ─────────────────────────────────────────────────────────────────────

/// Every style used by the report renderers.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,

    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,
    pub sender: Style,
    pub timestamp: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Threat levels ────────────────────────────────────────────────────────
    pub level_safe: Style,
    pub level_low: Style,
    pub level_medium: Style,
    pub level_high: Style,
    pub level_critical: Style,
    pub unclassified: Style,
}

impl Theme {
    /// Theme for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            name: "dark",
            header: Style::fg(Color::BrightCyan).bold(),
            header_accent: Style::fg(Color::Cyan),
            separator: Style::fg(Color::BrightBlack),
            text: Style::fg(Color::White),
            dim: Style::fg(Color::BrightBlack),
            label: Style::fg(Color::BrightBlack),
            value: Style::fg(Color::BrightWhite).bold(),
            sender: Style::fg(Color::BrightWhite).bold(),
            timestamp: Style::fg(Color::BrightBlack),
            success: Style::fg(Color::Green),
            warning: Style::fg(Color::Yellow),
            error: Style::fg(Color::Red).bold(),
            level_safe: Style::fg(Color::Green),
            level_low: Style::fg(Color::Blue),
            level_medium: Style::fg(Color::Yellow),
            level_high: Style::fg(Color::Red),
            level_critical: Style::fg(Color::BrightWhite).on(Color::Red).bold(),
            unclassified: Style::fg(Color::BrightBlack).dimmed(),
        }
    }

    /// Theme for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            name: "light",
            header: Style::fg(Color::Blue).bold(),
            header_accent: Style::fg(Color::Blue),
            separator: Style::fg(Color::BrightBlack),
            text: Style::fg(Color::Black),
            dim: Style::fg(Color::BrightBlack),
            label: Style::fg(Color::BrightBlack),
            value: Style::fg(Color::Black).bold(),
            sender: Style::fg(Color::Black).bold(),
            timestamp: Style::fg(Color::BrightBlack),
            success: Style::fg(Color::Green),
            warning: Style::fg(Color::Magenta),
            error: Style::fg(Color::Red).bold(),
            level_safe: Style::fg(Color::Green),
            level_low: Style::fg(Color::Blue),
            level_medium: Style::fg(Color::Magenta),
            level_high: Style::fg(Color::Red),
            level_critical: Style::fg(Color::White).on(Color::Red).bold(),
            unclassified: Style::fg(Color::BrightBlack).dimmed(),
        }
    }

    /// Uncolored theme for pipes, logs and `NO_COLOR`.
    pub fn plain() -> Self {
        Self {
            name: "plain",
            header: Style::PLAIN,
            header_accent: Style::PLAIN,
            separator: Style::PLAIN,
            text: Style::PLAIN,
            dim: Style::PLAIN,
            label: Style::PLAIN,
            value: Style::PLAIN,
            sender: Style::PLAIN,
            timestamp: Style::PLAIN,
            success: Style::PLAIN,
            warning: Style::PLAIN,
            error: Style::PLAIN,
            level_safe: Style::PLAIN,
            level_low: Style::PLAIN,
            level_medium: Style::PLAIN,
            level_high: Style::PLAIN,
            level_critical: Style::PLAIN,
            unclassified: Style::PLAIN,
        }
    }

    /// Choose a theme from `NO_COLOR` and the detected terminal background.
    pub fn auto_detect() -> Self {
        if no_color_requested() {
            return Self::plain();
        }
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names fall back to `auto_detect`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "plain" => Self::plain(),
            _ => Self::auto_detect(),
        }
    }

    /// Style for a verdict level; `None` is an unclassified message.
    pub fn level_style(&self, level: Option<ThreatLevel>) -> Style {
        match level {
            Some(ThreatLevel::Safe) => self.level_safe,
            Some(ThreatLevel::Low) => self.level_low,
            Some(ThreatLevel::Medium) => self.level_medium,
            Some(ThreatLevel::High) => self.level_high,
            Some(ThreatLevel::Critical) => self.level_critical,
            None => self.unclassified,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_from_colorfgbg() {
        assert_eq!(background_from(Some("15;0")), BackgroundType::Dark);
        assert_eq!(background_from(Some("0;15")), BackgroundType::Light);
        assert_eq!(background_from(Some("0;default")), BackgroundType::Unknown);
        assert_eq!(background_from(None), BackgroundType::Unknown);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").name, "dark");
        assert_eq!(Theme::from_name("light").name, "light");
        assert_eq!(Theme::from_name("plain").name, "plain");
    }

    #[test]
    fn test_severity_colors() {
        let t = Theme::dark();
        assert_eq!(t.level_style(Some(ThreatLevel::Safe)).fg, Some(Color::Green));
        assert_eq!(t.level_style(Some(ThreatLevel::Low)).fg, Some(Color::Blue));
        assert_eq!(t.level_style(Some(ThreatLevel::Medium)).fg, Some(Color::Yellow));
        assert_eq!(t.level_style(Some(ThreatLevel::High)).fg, Some(Color::Red));

        let critical = t.level_style(Some(ThreatLevel::Critical));
        assert_eq!(critical.bg, Some(Color::Red));
        assert!(critical.bold);
        assert!(t.level_style(None).dimmed);
    }

    #[test]
    fn test_plain_style_paints_nothing() {
        let t = Theme::plain();
        assert_eq!(t.level_style(Some(ThreatLevel::Critical)).paint("CRITICAL"), "CRITICAL");
        assert_eq!(Style::PLAIN.paint("x"), "x");
    }

    #[test]
    fn test_style_builders() {
        let s = Style::fg(Color::Red).on(Color::White).bold().dimmed();
        assert_eq!(s.fg, Some(Color::Red));
        assert_eq!(s.bg, Some(Color::White));
        assert!(s.bold && s.dimmed);
    }

    #[test]
    fn test_painted_text_keeps_content() {
        let painted = Style::fg(Color::Green).paint("SAFE");
        assert!(painted.contains("SAFE"));
    }
}
